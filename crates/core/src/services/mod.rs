//! Domain services.

mod ingest;

pub use ingest::{CycleReport, IngestConfig, IngestService};
