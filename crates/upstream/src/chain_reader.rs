//! Default ChainReader adapter.

use async_trait::async_trait;

use tally_core::error::DomainResult;
use tally_core::models::MintParams;
use tally_core::ports::ChainReader;

/// Chain reader that returns empty mint parameters.
///
/// The on-chain parameter read belongs to an external collaborator; this
/// adapter keeps the seam wired until one is plugged in. Records minted
/// through it carry zero amounts, which downstream readers treat as
/// "parameters unknown".
#[derive(Debug, Default, Clone)]
pub struct StaticChainReader;

#[async_trait]
impl ChainReader for StaticChainReader {
    async fn mint_params(&self, _token_id: u64, _network_id: u64) -> DomainResult<MintParams> {
        Ok(MintParams::default())
    }
}
