//! Dataset-to-chart transformations.
//!
//! The processing layer operates on [`crate::types::DataSet`] values produced by ingestion and
//! never mutates them:
//!
//! - [`matcher`]: select dataset columns for a [`crate::catalog::ChartSpec`]
//! - [`statistics`]: pooled summary statistics over selected columns
//! - [`chart_data`]: build heatmap/line payloads for a whole catalog
//!
//! ## Example: parse → match → summarize → build
//!
//! ```rust
//! use ebas_charts::catalog::{ChartKind, ChartSpec};
//! use ebas_charts::ingestion::parse_ebas_str;
//! use ebas_charts::processing::{build_chart_data, match_columns, summarize};
//!
//! let ds = parse_ebas_str(
//!     "starttime endtime bin_1 bin_2 flag_bin_1\n0.0 0.04 1.5 2.5 0\n0.04 0.08 1.7 2.9 1\n",
//! )
//! .unwrap();
//! let spec = ChartSpec::new("chart_bins", "Bins", ChartKind::Heatmap, r"^bin_\d+$").with_exclude("flag_");
//!
//! let columns = match_columns(&ds, &spec).unwrap();
//! assert_eq!(columns, vec!["bin_1", "bin_2"]);
//!
//! let stats = summarize(&ds, &columns);
//! assert_eq!(stats.max, 2.9);
//!
//! let charts = build_chart_data(&ds, &[spec], "upload-1").unwrap();
//! let cells = charts.get("chart_bins_upload_1").unwrap().data.as_heatmap().unwrap();
//! assert_eq!(cells.len(), 4);
//! ```

pub mod chart_data;
pub mod matcher;
pub mod statistics;

pub use chart_data::{
    build_chart_data, build_payload, sanitize_render_id, ChartData, ChartDataMap, ChartPayload, HeatmapCell, LineSeries,
};
pub use matcher::{match_columns, ColumnMatcher};
pub use statistics::{summarize, StatisticsSummary};
