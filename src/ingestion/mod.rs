//! Ingestion entrypoints and implementations.
//!
//! - [`ebas`]: the EBAS text parser (pure; works on `&str` / `&[u8]`), plus reader/path helpers
//! - [`unified`]: [`ingest_from_path`] with format inference and observer reporting
//! - [`observability`]: observer trait and the stock stderr/file/composite observers

pub mod ebas;
pub mod observability;
pub mod unified;

pub use ebas::{parse_ebas_bytes, parse_ebas_str, parse_ebas_str_with, ParseOptions, RaggedRowPolicy};
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    StdErrObserver,
};
pub use unified::{discover_inputs, ingest_from_path, severity_for_error, IngestionFormat, IngestionOptions, IngestionRequest};
