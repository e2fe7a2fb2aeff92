//! Stream processors for the tally reconciler.
//!
//! Implements the `EventProcessors` port from `tally-core`: one processor
//! per upstream stream, each applying a single event to the domain store
//! idempotently and reporting an explicit outcome.
//!
//! - [`StartMintingProcessor`] - deposit accepted, minting record created
//! - [`EndMintingProcessor`] - mint finalized, record marked completed
//! - [`TransferProcessor`] - NFT minted, transferred or burned
//!
//! [`ProcessorSet`] bundles the three behind the port for the ingest
//! service.

mod minting;
mod nft;
mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use minting::{EndMintingProcessor, StartMintingProcessor};
pub use nft::TransferProcessor;
pub use utils::BURN_ADDRESS;

use std::sync::Arc;

use async_trait::async_trait;

use tally_core::ports::{
    ChainReader, EndMintingEvent, EventProcessors, ItemOutcome, Repositories, StartMintingEvent,
    TransferEvent,
};

/// The three stream processors bundled behind the `EventProcessors` port.
pub struct ProcessorSet {
    start_minting: StartMintingProcessor,
    end_minting: EndMintingProcessor,
    transfer: TransferProcessor,
}

impl ProcessorSet {
    pub fn new(repositories: Arc<dyn Repositories>, chain_reader: Arc<dyn ChainReader>) -> Self {
        Self {
            start_minting: StartMintingProcessor::new(repositories.clone()),
            end_minting: EndMintingProcessor::new(repositories.clone()),
            transfer: TransferProcessor::new(repositories, chain_reader),
        }
    }
}

#[async_trait]
impl EventProcessors for ProcessorSet {
    async fn apply_start_minting(&self, event: &StartMintingEvent) -> ItemOutcome {
        self.start_minting.apply(event).await
    }

    async fn apply_end_minting(&self, event: &EndMintingEvent) -> ItemOutcome {
        self.end_minting.apply(event).await
    }

    async fn apply_transfer(&self, event: &TransferEvent) -> ItemOutcome {
        self.transfer.apply(event).await
    }
}
