//! Core domain layer for the tally reconciler.
//!
//! This crate contains the domain models, port traits (interfaces), and
//! business logic services for the on-chain event reconciler. It follows
//! hexagonal architecture principles - this is the innermost layer with
//! no dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      tally (binary)                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │      tally-upstream          │       tally-processors       │
//! │   (GraphQL event source)     │     (stream processors)      │
//! ├──────────────────────────────┴──────────────────────────────┤
//! │                       tally-storage                         │
//! │                       (PostgreSQL)                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      tally-core  ← YOU ARE HERE             │
//! │                 (models, ports, services)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Domain models (Checkpoint, MintingRecord, NftRecord)
//! - [`ports`] - Interface traits for adapters to implement
//! - [`services`] - Core business logic (IngestService)
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metrics definitions
//!
//! # Key Concepts
//!
//! ## Ports
//!
//! Ports define interfaces that external adapters must implement:
//!
//! - [`ports::EventSource`] - Fetch the three event streams past their
//!   watermarks
//! - [`ports::Repositories`] - Persist and query reconciled records
//! - [`ports::EventProcessors`] - Apply one event idempotently
//! - [`ports::ChainReader`] - Read mint-time NFT parameters
//!
//! ## Ingest Lifecycle
//!
//! 1. Load or create each stream's checkpoint
//! 2. On a fixed tick, fetch all three streams in one query
//! 3. Fold each batch through its processor in fetch order
//! 4. Persist the new checkpoint, then advance the in-memory watermark

pub mod error;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod services;
