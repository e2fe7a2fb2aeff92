//! Processors for the two minting streams.
//!
//! The minting lifecycle per `(txid, network_id)` is
//! `Unseen -> Started -> Completed`: StartMinting creates the record,
//! EndMinting marks it completed. Both absorb replays.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use tally_core::error::{DomainError, DomainResult};
use tally_core::models::MintingRecord;
use tally_core::ports::{EndMintingEvent, ItemOutcome, Repositories, StartMintingEvent};

use crate::utils::{network_id_from_event_id, parse_token_id, scaled_amount, stablecoin_decimals};

// =============================================================================
// StartMinting
// =============================================================================

/// Creates the minting record for an accepted deposit.
pub struct StartMintingProcessor {
    repositories: Arc<dyn Repositories>,
}

impl StartMintingProcessor {
    pub fn new(repositories: Arc<dyn Repositories>) -> Self {
        Self { repositories }
    }

    pub async fn apply(&self, event: &StartMintingEvent) -> ItemOutcome {
        match self.try_apply(event).await {
            Ok(outcome) => outcome,
            Err(e) => ItemOutcome::Failed(e),
        }
    }

    async fn try_apply(&self, event: &StartMintingEvent) -> DomainResult<ItemOutcome> {
        let network_id = network_id_from_event_id(&event.id)?;
        let mintings = self.repositories.mintings();

        if mintings.get_by_txid(&event.txid, network_id).await?.is_some() {
            debug!(txid = %event.txid, network = network_id, "Minting already recorded");
            return Ok(ItemOutcome::AlreadyApplied);
        }

        let record = MintingRecord {
            wallet_address: event.creator.clone(),
            network_id,
            txid: event.txid.clone(),
            timestamp: event.db_write_timestamp.and_utc().timestamp(),
            deposit_amount: scaled_amount(&event.usdc_amount, stablecoin_decimals(network_id))?,
            ustc_amount: Decimal::ZERO,
            order_completed: false,
            order_id: 0,
            nft_id: parse_token_id(&event.deposit_id)?,
            manual: false,
            deposit_status: -1,
            mint_completed: false,
        };
        mintings.insert(&record).await?;

        Ok(ItemOutcome::Applied)
    }
}

// =============================================================================
// EndMinting
// =============================================================================

/// Marks a minting record completed once the mint finalizes on chain.
pub struct EndMintingProcessor {
    repositories: Arc<dyn Repositories>,
}

impl EndMintingProcessor {
    pub fn new(repositories: Arc<dyn Repositories>) -> Self {
        Self { repositories }
    }

    pub async fn apply(&self, event: &EndMintingEvent) -> ItemOutcome {
        match self.try_apply(event).await {
            Ok(outcome) => outcome,
            Err(e) => ItemOutcome::Failed(e),
        }
    }

    async fn try_apply(&self, event: &EndMintingEvent) -> DomainResult<ItemOutcome> {
        let network_id = network_id_from_event_id(&event.id)?;
        let nft_id = parse_token_id(&event.deposit_id_is_token_id)?;
        let mintings = self.repositories.mintings();

        let Some(record) = mintings.get_by_nft(nft_id, network_id).await? else {
            // The matching StartMinting has not been seen; the streams are
            // not causally ordered, so this is reported rather than buffered.
            return Err(DomainError::MissingMintingRecord { nft_id, network_id });
        };
        if record.mint_completed {
            debug!(nft = nft_id, network = network_id, "Mint already completed");
            return Ok(ItemOutcome::AlreadyApplied);
        }

        mintings.set_mint_completed(&record.txid, network_id).await?;

        Ok(ItemOutcome::Applied)
    }
}

// =============================================================================
// Tests
// =============================================================================
