//! Daemon wiring for the threshold engine: configuration loading, the
//! stdin ingestion loop, the outbound writer and the stats reporter.

pub mod config;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod reporter;
pub mod thresholds;

pub use config::{load, ConfigError, ServerConfig};
pub use pipeline::{IngestSummary, Pipeline};
