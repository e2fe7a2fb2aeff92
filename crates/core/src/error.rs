//! Error types for the reconciliation domain layer.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`DomainError`] - Business logic errors
//! - [`StorageError`] - Database/repository errors
//! - [`UpstreamError`] - GraphQL event-source errors
//! - [`IngestError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::models::StreamKind;

// =============================================================================
// Domain Errors
// =============================================================================

/// Business logic and domain rule violations.
///
/// These errors represent problems applying a fetched event to the domain
/// store, such as malformed event fields or a missing dependency record.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The composite event id could not be split into network id and sequence.
    #[error("Malformed composite event id: {0}")]
    InvalidEventId(String),

    /// The raw integer amount could not be parsed or scaled.
    #[error("Malformed amount: {0}")]
    InvalidAmount(String),

    /// The token id field is not a valid integer.
    #[error("Malformed token id: {0}")]
    InvalidTokenId(String),

    /// An EndMinting event arrived before its matching StartMinting record.
    #[error("No minting record for nft {nft_id} on network {network_id}")]
    MissingMintingRecord { nft_id: u64, network_id: u64 },

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Database and repository errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to establish database connection.
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// Query execution failed.
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A record with the same identity already exists.
    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    /// Database constraint was violated (unique key, etc.).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Database migration failed.
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// Data serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// Upstream Errors
// =============================================================================

/// Errors from the upstream indexing GraphQL service.
///
/// Any of these aborts the whole cycle: no result set is partially applied.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// HTTP transport failure or unexpected status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The upstream answered with GraphQL-level errors.
    #[error("Upstream returned errors: {0}")]
    Graphql(String),

    /// The response body could not be decoded.
    #[error("Response decode error: {0}")]
    Decode(String),

    /// The upstream call exceeded the cycle's fetch timeout.
    #[error("Upstream call timed out after {0}s")]
    Timeout(u64),
}

// =============================================================================
// Ingest Errors
// =============================================================================

/// Top-level ingestion orchestration errors.
///
/// This is the main error type returned by [`crate::services::IngestService`].
#[derive(Debug, Error)]
pub enum IngestError {
    /// Domain logic error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Storage/database error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Upstream event-source error.
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stream's checkpoint could not be established on startup.
    ///
    /// This is fatal: running with undefined watermark state would
    /// reprocess or skip events.
    #[error("Failed to initialize checkpoint for stream {stream}: {message}")]
    CheckpointInit {
        /// Stream whose checkpoint could not be loaded or created.
        stream: StreamKind,
        /// Underlying failure.
        message: String,
    },

    /// Graceful shutdown was requested.
    ///
    /// This is not really an error but uses the error type for control flow.
    #[error("Ingest shutdown requested")]
    ShutdownRequested,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;
