//! `ebas-charts` parses EBAS particle-measurement text files into an in-memory [`types::DataSet`]
//! and shapes the data into chart-ready payloads with summary statistics.
//!
//! The pipeline is:
//!
//! 1. **Parse**: [`ingestion::parse_ebas_str`] (or [`ingestion::ingest_from_path`] for files on
//!    disk) finds the `starttime … endtime …` header, reads every data line and derives a timestamp
//!    per row from the fractional-day `starttime`.
//! 2. **Match**: each [`catalog::ChartSpec`] selects dataset columns by case-insensitive regex,
//!    with an optional exclusion pattern.
//! 3. **Summarize**: [`processing::summarize`] pools every finite value of the matched columns into
//!    min/max/mean/std and the 5th/95th percentiles.
//! 4. **Build**: [`processing::build_chart_data`] emits a heatmap cell list or line series per
//!    chart, keyed by `"{chart_id}_{render_id}"`.
//!
//! ## Input format
//!
//! - Metadata lines before the header are ignored.
//! - The header is the first line starting with `starttime` that also contains `endtime`.
//! - Data lines are whitespace-delimited; blank lines and `#` comments are skipped.
//! - Tokens that are not finite numbers (`-`, `NaN`, `inf`, `1e999`) are missing values, stored as
//!   [`types::Value::Null`].
//! - `starttime`/`endtime` keep their raw text; the timestamp is derived separately.
//!
//! ## Quick example: parse + chart
//!
//! ```rust
//! use ebas_charts::catalog::default_catalog;
//! use ebas_charts::ingestion::parse_ebas_str;
//! use ebas_charts::processing::build_chart_data;
//!
//! let text = "\
//! Some metadata line
//! starttime endtime bin_1 bin_2 RH_inlet
//! 0.0 0.04 1.5 2.5 35.1
//! 0.5 0.54 1.7 - 36.0
//! ";
//! let ds = parse_ebas_str(text).unwrap();
//! assert_eq!(ds.row_count(), 2);
//! assert_eq!(ds.time_labels(), vec!["2024-01-01 00:00", "2024-01-01 12:00"]);
//!
//! let charts = build_chart_data(&ds, &default_catalog(), "upload").unwrap();
//! let bins = charts.get("chart_bins_upload").unwrap();
//! assert_eq!(bins.columns, vec!["bin_1", "bin_2"]);
//! // The missing bin_2 value in row 1 becomes a zero cell.
//! assert_eq!(bins.data.as_heatmap().unwrap().len(), 4);
//! ```
//!
//! ## Files on disk
//!
//! ```no_run
//! use ebas_charts::catalog::default_catalog;
//! use ebas_charts::ingestion::{ingest_from_path, IngestionOptions};
//! use ebas_charts::report::analyze;
//!
//! # fn main() -> Result<(), ebas_charts::EbasError> {
//! let ds = ingest_from_path("station_2024.nas", &IngestionOptions::default())?;
//! let bundle = analyze(&ds, &default_catalog(), "station_2024", Some("station_2024.nas"))?;
//! println!("{}", bundle.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: EBAS parser, path-based entrypoint, input discovery and observers
//! - [`types`]: schema + in-memory dataset types
//! - [`catalog`]: chart specifications and the stock catalog
//! - [`processing`]: column matching, statistics and chart payloads
//! - [`report`]: per-file analysis bundle
//! - [`export`]: JSON records and CSV export
//! - [`execution`]: parallel batch processing of many files
//! - [`error`]: error types used across the crate

pub mod catalog;
pub mod error;
pub mod execution;
pub mod export;
pub mod ingestion;
pub mod processing;
pub mod report;
pub mod types;

pub use error::{EbasError, EbasResult, ParseError};
