//! Domain models for the reconciliation layer.
//!
//! These models are storage-agnostic and represent the canonical
//! form of reconciled on-chain data within the domain layer.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Timestamp every stream starts from when no checkpoint exists yet.
///
/// Matches the deployment epoch of the upstream indexing service; events
/// written before this instant predate the system and are never fetched.
pub const DEFAULT_WATERMARK: &str = "2024-09-04T13:39:30.681834";

// =============================================================================
// Event Streams
// =============================================================================

/// The three upstream event streams this service reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// LP manager `StartMinting` events (deposit accepted, mint pending).
    StartMinting,
    /// LP manager `EndMinting` events (mint finalized on chain).
    EndMinting,
    /// LP NFT `Transfer` events (mint, ownership change, burn).
    NftTransfer,
}

impl StreamKind {
    /// All streams, in the order they are fetched and folded.
    pub const ALL: [StreamKind; 3] = [
        StreamKind::StartMinting,
        StreamKind::EndMinting,
        StreamKind::NftTransfer,
    ];

    /// Stable identifier used as the checkpoint key and in metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::StartMinting => "LpManager_StartMinting",
            StreamKind::EndMinting => "LpManager_EndMinting",
            StreamKind::NftTransfer => "LpNft_Transfer",
        }
    }

    /// Parse the stable identifier back into a stream kind.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LpManager_StartMinting" => Some(StreamKind::StartMinting),
            "LpManager_EndMinting" => Some(StreamKind::EndMinting),
            "LpNft_Transfer" => Some(StreamKind::NftTransfer),
            _ => None,
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Checkpoints
// =============================================================================

/// Per-stream ingestion progress marker.
///
/// A watermark is a `(timestamp, last_event_id)` pair rather than a bare
/// timestamp: batch limits can truncate a run of events sharing one
/// `db_write_timestamp`, and the id component lets the next fetch resume
/// inside that run instead of skipping its tail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
    /// `db_write_timestamp` of the last applied event (upstream local time,
    /// microsecond precision, no zone).
    pub timestamp: NaiveDateTime,
    /// Upstream id of the last applied event; empty until the first event.
    pub last_event_id: String,
}

impl Watermark {
    /// The watermark a stream starts from when no checkpoint exists.
    pub fn initial() -> Self {
        // The literal is a compile-time constant; parsing cannot fail.
        let timestamp = DEFAULT_WATERMARK
            .parse::<NaiveDateTime>()
            .expect("default watermark literal is valid");
        Self {
            timestamp,
            last_event_id: String::new(),
        }
    }

    /// Strict ordering on `(timestamp, id)`, mirroring the fetch order.
    pub fn precedes(&self, other: &Watermark) -> bool {
        (self.timestamp, &self.last_event_id) < (other.timestamp, &other.last_event_id)
    }
}

/// Durable checkpoint row for one stream.
///
/// The watermark must never move backwards over the row's lifetime; the
/// store performs a plain replace and relies on callers honoring this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Stream this checkpoint belongs to (unique key).
    pub stream: StreamKind,
    /// High-water mark of applied events.
    pub watermark: Watermark,
    /// Last persistence timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Checkpoint written on a stream's first run.
    pub fn initial(stream: StreamKind) -> Self {
        Self {
            stream,
            watermark: Watermark::initial(),
            updated_at: Utc::now(),
        }
    }
}

// =============================================================================
// Minting Records
// =============================================================================

/// Reconciled record of one LP minting flow, keyed by `(txid, network_id)`.
///
/// Ingestion owns `deposit_amount`, `nft_id` and `mint_completed`; the
/// fulfillment consumer owns `order_completed`, `order_id`, `ustc_amount`
/// and `deposit_status`, which ingestion never rewrites after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MintingRecord {
    /// Depositor wallet address.
    pub wallet_address: String,
    /// Chain the deposit happened on.
    pub network_id: u64,
    /// Deposit transaction hash.
    pub txid: String,
    /// Event time as unix seconds.
    pub timestamp: i64,
    /// Deposited stablecoin amount in whole units (exact decimal).
    pub deposit_amount: Decimal,
    /// USTC leg amount, filled in by the fulfillment consumer.
    pub ustc_amount: Decimal,
    /// Whether the fulfillment order completed (consumer-owned).
    pub order_completed: bool,
    /// Fulfillment order id (consumer-owned).
    pub order_id: i64,
    /// NFT the deposit mints (`deposit_id` doubles as the token id).
    pub nft_id: u64,
    /// Manually created by an operator rather than ingested.
    pub manual: bool,
    /// Fulfillment deposit status (consumer-owned, -1 = unset).
    pub deposit_status: i32,
    /// Set true by the EndMinting stream once the mint finalizes.
    pub mint_completed: bool,
}

// =============================================================================
// NFT Records
// =============================================================================

/// Mint-time parameters of an LP NFT, read from the chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MintParams {
    /// LP token amount locked behind the NFT.
    pub lp_amount: Decimal,
    /// USTC+ amount locked behind the NFT.
    pub ustc_plus_amount: Decimal,
}

/// Current ownership of one LP NFT, keyed by `(token_id, network_id)`.
///
/// Created on the first observed non-burn transfer, owner updated on later
/// transfers, deleted on burn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftRecord {
    /// On-chain token id.
    pub token_id: u64,
    /// Chain the token lives on.
    pub network_id: u64,
    /// Current owner address.
    pub owner: String,
    /// Mint-time parameters, immutable after creation.
    pub params: MintParams,
}

// =============================================================================
// Tests
// =============================================================================
