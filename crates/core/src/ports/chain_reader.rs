//! Port trait for reading mint-time NFT parameters from the chain.

use async_trait::async_trait;

use crate::error::DomainResult;
use crate::models::MintParams;

/// Port trait for the external chain-reader collaborator.
///
/// A freshly minted NFT carries parameters (LP and USTC+ amounts) that are
/// only available on chain; the transfer processor reads them through this
/// seam before inserting the record.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Read the mint-time parameters of a token.
    async fn mint_params(&self, token_id: u64, network_id: u64) -> DomainResult<MintParams>;
}
