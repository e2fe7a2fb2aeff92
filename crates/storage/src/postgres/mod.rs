//! PostgreSQL storage adapter.
//!
//! This module implements the repository traits defined in `tally-core`
//! using PostgreSQL as the backing store.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool and migrations
//! - [`PgRepositories`] - Composite repository implementing `Repositories`
//! - Individual repos: [`PgCheckpointRepository`], [`PgMintingRepository`],
//!   [`PgNftRepository`]

mod checkpoint_repo;
mod database;
mod helpers;
mod minting_repo;
mod nft_repo;

pub use checkpoint_repo::PgCheckpointRepository;
pub use database::{Database, DatabaseConfig};
pub use minting_repo::PgMintingRepository;
pub use nft_repo::PgNftRepository;

use std::sync::Arc;

use tally_core::ports::{CheckpointRepository, MintingRepository, NftRepository, Repositories};

// =============================================================================
// Composite Repository
// =============================================================================

/// Aggregated PostgreSQL repositories implementing the `Repositories` trait.
pub struct PgRepositories {
    _db: Arc<Database>,
    checkpoints: PgCheckpointRepository,
    mintings: PgMintingRepository,
    nfts: PgNftRepository,
}

impl PgRepositories {
    /// Create a new repository aggregate from a database connection.
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            checkpoints: PgCheckpointRepository::new(&db),
            mintings: PgMintingRepository::new(&db),
            nfts: PgNftRepository::new(&db),
            _db: db,
        }
    }
}

impl Repositories for PgRepositories {
    fn checkpoints(&self) -> &dyn CheckpointRepository {
        &self.checkpoints
    }

    fn mintings(&self) -> &dyn MintingRepository {
        &self.mintings
    }

    fn nfts(&self) -> &dyn NftRepository {
        &self.nfts
    }
}
