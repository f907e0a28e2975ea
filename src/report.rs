//! Per-file analysis bundle: everything a presentation layer stores or renders for one upload.

use serde::Serialize;

use crate::catalog::ChartSpec;
use crate::error::EbasResult;
use crate::export::to_json_records;
use crate::processing::{build_chart_data, ChartDataMap};
use crate::types::DataSet;

/// Headline facts about a parsed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub rows: usize,
    /// Columns read from the file header. The derived `datetime` is not a dataset column and is
    /// not counted, although each entry of [`AnalysisBundle::records`] carries it as an extra key.
    pub columns: usize,
    /// See [`DataSet::time_period`].
    pub time_period: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
}

impl AnalysisSummary {
    pub fn from_dataset(dataset: &DataSet, original_filename: Option<&str>) -> Self {
        Self {
            rows: dataset.row_count(),
            columns: dataset.column_count(),
            time_period: dataset.time_period(),
            original_filename: original_filename.map(str::to_owned),
        }
    }
}

/// Dataset records, row labels, chart payloads and summary for one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisBundle {
    /// Output of [`to_json_records`].
    pub records: serde_json::Value,
    pub time_labels: Vec<String>,
    pub charts: ChartDataMap,
    pub summary: AnalysisSummary,
}

impl AnalysisBundle {
    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> EbasResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Run the chart pipeline over `dataset` and collect the results with their context.
pub fn analyze(
    dataset: &DataSet,
    catalog: &[ChartSpec],
    render_id: &str,
    original_filename: Option<&str>,
) -> EbasResult<AnalysisBundle> {
    Ok(AnalysisBundle {
        records: to_json_records(dataset)?,
        time_labels: dataset.time_labels(),
        charts: build_chart_data(dataset, catalog, render_id)?,
        summary: AnalysisSummary::from_dataset(dataset, original_filename),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;
    use crate::ingestion::parse_ebas_str;

    const FILE: &str = "\
starttime endtime bin_1 bin_2 flag_bin_1 flag_bin_2 RH_inlet P_sys flag_P_sys
0.0 0.04 1.5 2.5 0 0 35.1 101325 0
0.5 0.54 1.7 2.9 1 0 36.0 101300 0
";

    #[test]
    fn bundle_against_default_catalog() {
        let ds = parse_ebas_str(FILE).unwrap();
        let bundle = analyze(&ds, &default_catalog(), "a-b", Some("station.nas")).unwrap();

        assert_eq!(
            bundle.charts.keys().collect::<Vec<_>>(),
            vec![
                "chart_bins_a_b",
                "chart_flag_bins_a_b",
                "chart_rh_a_b",
                "chart_met_a_b",
                "chart_flags_met_a_b",
            ]
        );
        assert_eq!(bundle.time_labels, vec!["2024-01-01 00:00", "2024-01-01 12:00"]);
        assert_eq!(
            bundle.summary,
            AnalysisSummary {
                rows: 2,
                columns: 9,
                time_period: "2024-01-01 00:00 to 2024-01-01 12:00".to_string(),
                original_filename: Some("station.nas".to_string()),
            }
        );
        assert_eq!(bundle.records.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn column_count_excludes_derived_datetime() {
        let ds = parse_ebas_str(FILE).unwrap();
        let bundle = analyze(&ds, &default_catalog(), "x", None).unwrap();
        let first = bundle.records[0].as_object().unwrap();
        assert_eq!(bundle.summary.columns, 9);
        assert_eq!(first.len(), bundle.summary.columns + 1);
        assert!(first.contains_key(crate::export::DATETIME_KEY));
    }

    #[test]
    fn bundle_serializes() {
        let ds = parse_ebas_str(FILE).unwrap();
        let bundle = analyze(&ds, &default_catalog(), "x", None).unwrap();
        let json: serde_json::Value = serde_json::from_str(&bundle.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["summary"]["rows"], 2);
        assert!(json["summary"].get("original_filename").is_none());
        assert_eq!(json["charts"]["chart_met_x"]["columns"], serde_json::json!(["P_sys"]));
    }
}
