//! Port traits defining the boundaries of the domain layer.
//!
//! Adapters in the infrastructure crates implement these traits; the
//! ingest service only ever sees the traits.

mod chain_reader;
mod event_source;
mod processor;
mod repository;

pub use chain_reader::ChainReader;
pub use event_source::{
    EndMintingEvent, EventBatches, EventSource, StartMintingEvent, StreamEvent, StreamWatermarks,
    TransferEvent,
};
pub use processor::{EventProcessors, ItemOutcome, StreamReport};
pub use repository::{CheckpointRepository, MintingRepository, NftRepository, Repositories};
