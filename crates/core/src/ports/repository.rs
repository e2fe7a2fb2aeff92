//! Port traits for data repositories.
//!
//! These traits define the storage interface used by the domain layer.
//! Implementations live in the infrastructure layer (e.g., `tally-storage`).

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::models::{Checkpoint, MintingRecord, NftRecord, StreamKind};

// =============================================================================
// Repository Traits
// =============================================================================

/// Repository for per-stream ingestion checkpoints.
#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    /// Get the checkpoint for a stream, if one exists.
    async fn get(&self, stream: StreamKind) -> StorageResult<Option<Checkpoint>>;

    /// Insert the initial checkpoint for a stream.
    ///
    /// Fails with [`StorageError::AlreadyExists`] if the stream already has
    /// one; callers must `get` first.
    ///
    /// [`StorageError::AlreadyExists`]: crate::error::StorageError::AlreadyExists
    async fn create(&self, stream: StreamKind) -> StorageResult<Checkpoint>;

    /// Replace a stream's checkpoint.
    ///
    /// The store does not enforce watermark monotonicity; callers must only
    /// pass a watermark at or past the stored one. A single writer is
    /// assumed, so this is a caller contract rather than a stored guarantee.
    async fn update(&self, checkpoint: &Checkpoint) -> StorageResult<()>;
}

/// Repository for minting records.
#[async_trait]
pub trait MintingRepository: Send + Sync {
    /// Insert a new minting record.
    ///
    /// A duplicate `(txid, network_id)` surfaces as
    /// [`StorageError::ConstraintViolation`].
    ///
    /// [`StorageError::ConstraintViolation`]: crate::error::StorageError::ConstraintViolation
    async fn insert(&self, record: &MintingRecord) -> StorageResult<()>;

    /// Get a record by its `(txid, network_id)` identity.
    async fn get_by_txid(&self, txid: &str, network_id: u64)
        -> StorageResult<Option<MintingRecord>>;

    /// Get a record by the NFT it mints.
    async fn get_by_nft(&self, nft_id: u64, network_id: u64)
        -> StorageResult<Option<MintingRecord>>;

    /// List all records for a wallet.
    async fn list_by_wallet(&self, wallet_address: &str) -> StorageResult<Vec<MintingRecord>>;

    /// Set `mint_completed` to true on one record.
    ///
    /// Touches only that column so consumer-owned fields are never
    /// clobbered by a whole-row write.
    async fn set_mint_completed(&self, txid: &str, network_id: u64) -> StorageResult<()>;
}

/// Repository for NFT ownership records.
#[async_trait]
pub trait NftRepository: Send + Sync {
    /// Insert a newly minted NFT record.
    async fn insert(&self, record: &NftRecord) -> StorageResult<()>;

    /// Get a record by its `(token_id, network_id)` identity.
    async fn get(&self, token_id: u64, network_id: u64) -> StorageResult<Option<NftRecord>>;

    /// Update the owner of an existing record, leaving every other column
    /// untouched.
    async fn update_owner(&self, token_id: u64, network_id: u64, owner: &str)
        -> StorageResult<()>;

    /// Delete a record (token burned).
    async fn delete(&self, token_id: u64, network_id: u64) -> StorageResult<()>;
}

// =============================================================================
// Composite Repository
// =============================================================================

/// Combined repository access for the ingestion engine.
pub trait Repositories: Send + Sync {
    /// Access the checkpoint repository.
    fn checkpoints(&self) -> &dyn CheckpointRepository;

    /// Access the minting record repository.
    fn mintings(&self) -> &dyn MintingRepository;

    /// Access the NFT record repository.
    fn nfts(&self) -> &dyn NftRepository;
}
