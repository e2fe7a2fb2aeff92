//! Upstream adapters for the tally reconciler.
//!
//! Implements the `EventSource` port against the upstream indexing
//! GraphQL service, and ships the default `ChainReader` adapter.

mod chain_reader;
mod client;

pub use chain_reader::StaticChainReader;
pub use client::{GraphqlEventSource, UpstreamConfig};
