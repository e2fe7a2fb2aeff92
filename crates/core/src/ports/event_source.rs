//! Port trait for the upstream event source.
//!
//! This trait defines the interface for fetching the three event streams
//! from the upstream indexing GraphQL service. Implementations live in the
//! infrastructure layer (e.g., `tally-upstream`).

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::UpstreamResult;
use crate::models::{StreamKind, Watermark};

// =============================================================================
// Raw Events
// =============================================================================

/// Common view over the three raw event shapes, used by the watermark logic.
pub trait StreamEvent {
    /// Upstream composite id (`"<network>-<sequence>"`).
    fn event_id(&self) -> &str;

    /// Upstream write timestamp the watermark is derived from.
    fn write_timestamp(&self) -> NaiveDateTime;
}

/// Raw `LpManager_StartMinting` event as returned by the upstream service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartMintingEvent {
    /// Composite id, `"<network>-<sequence>"`.
    pub id: String,
    /// Deposit transaction hash.
    pub txid: String,
    /// Raw stablecoin amount as a decimal integer string.
    #[serde(rename = "usdcAmount")]
    pub usdc_amount: String,
    /// Deposit id; doubles as the token id of the NFT being minted.
    #[serde(rename = "depositId")]
    pub deposit_id: String,
    /// Upstream write timestamp (local time, microseconds, no zone).
    pub db_write_timestamp: NaiveDateTime,
    /// Depositor wallet address.
    pub creator: String,
}

/// Raw `LpManager_EndMinting` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndMintingEvent {
    /// Composite id, `"<network>-<sequence>"`.
    pub id: String,
    /// Deposit id of the finalized mint, equal to the NFT token id.
    #[serde(rename = "depositIdIsTokenId")]
    pub deposit_id_is_token_id: String,
    /// Upstream write timestamp.
    pub db_write_timestamp: NaiveDateTime,
    /// Depositor wallet address.
    pub creator: String,
    /// USTC+ amount attached to the finalized mint.
    #[serde(rename = "_ustcPlusAmount")]
    pub ustc_plus_amount: String,
}

/// Raw `LpNft_Transfer` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferEvent {
    /// Upstream write timestamp.
    pub db_write_timestamp: NaiveDateTime,
    /// Sender address (zero address on mint).
    pub from: String,
    /// Composite id, `"<network>-<sequence>"`.
    pub id: String,
    /// Recipient address (burn sentinel on burn).
    pub to: String,
    /// Transferred token id.
    #[serde(rename = "tokenId")]
    pub token_id: String,
}

macro_rules! impl_stream_event {
    ($($ty:ty),+) => {
        $(impl StreamEvent for $ty {
            fn event_id(&self) -> &str {
                &self.id
            }

            fn write_timestamp(&self) -> NaiveDateTime {
                self.db_write_timestamp
            }
        })+
    };
}

impl_stream_event!(StartMintingEvent, EndMintingEvent, TransferEvent);

// =============================================================================
// Watermarks & Batches
// =============================================================================

/// The in-memory watermark of every stream, passed explicitly into each
/// fetch so no process-wide mutable state exists.
#[derive(Debug, Clone)]
pub struct StreamWatermarks {
    pub start_minting: Watermark,
    pub end_minting: Watermark,
    pub transfer: Watermark,
}

impl Default for StreamWatermarks {
    fn default() -> Self {
        Self {
            start_minting: Watermark::initial(),
            end_minting: Watermark::initial(),
            transfer: Watermark::initial(),
        }
    }
}

impl StreamWatermarks {
    pub fn get(&self, stream: StreamKind) -> &Watermark {
        match stream {
            StreamKind::StartMinting => &self.start_minting,
            StreamKind::EndMinting => &self.end_minting,
            StreamKind::NftTransfer => &self.transfer,
        }
    }

    pub fn get_mut(&mut self, stream: StreamKind) -> &mut Watermark {
        match stream {
            StreamKind::StartMinting => &mut self.start_minting,
            StreamKind::EndMinting => &mut self.end_minting,
            StreamKind::NftTransfer => &mut self.transfer,
        }
    }
}

/// One cycle's fetch result: the three batches, each ascending in
/// `(db_write_timestamp, id)`.
#[derive(Debug, Clone, Default)]
pub struct EventBatches {
    pub start_minting: Vec<StartMintingEvent>,
    pub end_minting: Vec<EndMintingEvent>,
    pub transfers: Vec<TransferEvent>,
}

impl EventBatches {
    pub fn is_empty(&self) -> bool {
        self.start_minting.is_empty() && self.end_minting.is_empty() && self.transfers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.start_minting.len() + self.end_minting.len() + self.transfers.len()
    }
}

// =============================================================================
// Port Trait
// =============================================================================

/// Port trait for the upstream event source.
///
/// A fetch either yields all three batches or fails as a whole; partial
/// results are never surfaced, so an aborted cycle mutates nothing.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch events strictly newer than each stream's watermark.
    async fn fetch(&self, watermarks: &StreamWatermarks) -> UpstreamResult<EventBatches>;
}
