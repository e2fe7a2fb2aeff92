//! Port trait for the stream processors.
//!
//! One operation per stream, each applying a single event to the domain
//! store and reporting an explicit outcome. Implementations live in
//! `tally-processors`.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::models::StreamKind;

use super::event_source::{EndMintingEvent, StartMintingEvent, TransferEvent};

// =============================================================================
// Outcomes
// =============================================================================

/// Result of applying one event.
///
/// Failures are values rather than errors so a stream's fold can keep
/// going and report every item; the cycle decides what to do with them.
#[derive(Debug)]
pub enum ItemOutcome {
    /// The event mutated the domain store.
    Applied,
    /// The event was seen before; the store already reflects it.
    AlreadyApplied,
    /// The event needs no action (e.g. burn of a never-seen token).
    Noop,
    /// The event could not be applied; logged for manual follow-up.
    Failed(DomainError),
}

impl ItemOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ItemOutcome::Failed(_))
    }
}

/// Per-item outcomes of folding one stream's batch, in fetch order.
#[derive(Debug)]
pub struct StreamReport {
    pub stream: StreamKind,
    pub outcomes: Vec<ItemOutcome>,
}

impl StreamReport {
    pub fn new(stream: StreamKind) -> Self {
        Self {
            stream,
            outcomes: Vec::new(),
        }
    }

    /// Number of events that mutated the store.
    pub fn applied(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ItemOutcome::Applied))
            .count()
    }

    /// Number of events that failed.
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

// =============================================================================
// Port Trait
// =============================================================================

/// Port trait over the three stream processors.
///
/// Every operation must be idempotent under replay of the same event:
/// batches are re-fetched whenever a checkpoint fails to persist.
#[async_trait]
pub trait EventProcessors: Send + Sync {
    /// Apply one `StartMinting` event (create the minting record).
    async fn apply_start_minting(&self, event: &StartMintingEvent) -> ItemOutcome;

    /// Apply one `EndMinting` event (mark the minting record completed).
    async fn apply_end_minting(&self, event: &EndMintingEvent) -> ItemOutcome;

    /// Apply one `Transfer` event (mint, owner change or burn).
    async fn apply_transfer(&self, event: &TransferEvent) -> ItemOutcome;
}
