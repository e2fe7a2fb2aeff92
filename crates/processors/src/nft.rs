//! Processor for the NFT transfer stream.

use std::sync::Arc;

use tracing::debug;

use tally_core::error::DomainResult;
use tally_core::models::NftRecord;
use tally_core::ports::{ChainReader, ItemOutcome, Repositories, TransferEvent};

use crate::utils::{is_burn, network_id_from_event_id, parse_token_id};

/// Maintains NFT ownership records from transfer events.
///
/// A transfer is a mint (unknown token, non-burn destination), an owner
/// change, or a burn (destination is the burn sentinel, record deleted).
pub struct TransferProcessor {
    repositories: Arc<dyn Repositories>,
    chain_reader: Arc<dyn ChainReader>,
}

impl TransferProcessor {
    pub fn new(repositories: Arc<dyn Repositories>, chain_reader: Arc<dyn ChainReader>) -> Self {
        Self {
            repositories,
            chain_reader,
        }
    }

    pub async fn apply(&self, event: &TransferEvent) -> ItemOutcome {
        match self.try_apply(event).await {
            Ok(outcome) => outcome,
            Err(e) => ItemOutcome::Failed(e),
        }
    }

    async fn try_apply(&self, event: &TransferEvent) -> DomainResult<ItemOutcome> {
        let network_id = network_id_from_event_id(&event.id)?;
        let token_id = parse_token_id(&event.token_id)?;
        let nfts = self.repositories.nfts();

        let Some(existing) = nfts.get(token_id, network_id).await? else {
            if is_burn(&event.to) {
                // Burn of a token we never tracked; nothing to remove.
                return Ok(ItemOutcome::Noop);
            }
            let params = self.chain_reader.mint_params(token_id, network_id).await?;
            let record = NftRecord {
                token_id,
                network_id,
                owner: event.to.clone(),
                params,
            };
            nfts.insert(&record).await?;
            debug!(token = token_id, network = network_id, "NFT minted");
            return Ok(ItemOutcome::Applied);
        };

        if is_burn(&event.to) {
            nfts.delete(token_id, network_id).await?;
            debug!(token = token_id, network = network_id, "NFT burned");
            return Ok(ItemOutcome::Applied);
        }

        if existing.owner == event.to {
            return Ok(ItemOutcome::AlreadyApplied);
        }

        nfts.update_owner(token_id, network_id, &event.to).await?;

        Ok(ItemOutcome::Applied)
    }
}

// =============================================================================
// Tests
// =============================================================================
