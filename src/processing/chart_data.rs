//! Chart payload construction.
//!
//! [`build_chart_data`] runs every [`ChartSpec`] of a catalog against a [`DataSet`] and returns
//! renderer-ready payloads keyed by `"{spec.id}_{render_id}"`. Missing values stay missing up to
//! this point and are written as `0` only in the emitted heatmap cells and line series.

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::catalog::{ChartKind, ChartSpec};
use crate::error::EbasResult;
use crate::types::{DataSet, Value};

use super::matcher::ColumnMatcher;
use super::statistics::{summarize, StatisticsSummary};

/// One `(row_index, column_index, value)` cell; serialized as a 3-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatmapCell(pub usize, pub usize, pub f64);

/// Line-chart body: shared x axis plus one y series per matched column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    /// Row indices `0..rows`.
    pub x_data: Vec<usize>,
    /// Column name to values in row order.
    pub y_data: BTreeMap<String, Vec<f64>>,
}

/// Kind-specific chart body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartData {
    Heatmap(Vec<HeatmapCell>),
    Line(LineSeries),
}

impl ChartData {
    /// Heatmap cells, if this is a heatmap body.
    pub fn as_heatmap(&self) -> Option<&[HeatmapCell]> {
        match self {
            ChartData::Heatmap(cells) => Some(cells),
            ChartData::Line(_) => None,
        }
    }

    /// Line series, if this is a line body.
    pub fn as_line(&self) -> Option<&LineSeries> {
        match self {
            ChartData::Line(series) => Some(series),
            ChartData::Heatmap(_) => None,
        }
    }
}

/// Everything a renderer needs for one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPayload {
    #[serde(rename = "config")]
    pub spec: ChartSpec,
    /// Matched columns, sorted.
    pub columns: Vec<String>,
    pub stats: StatisticsSummary,
    pub data: ChartData,
    /// Unsanitized spec id.
    pub original_id: String,
}

/// Chart payloads in catalog order, keyed by namespaced chart id.
///
/// Serializes as a JSON object whose keys keep catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartDataMap {
    entries: Vec<(String, ChartPayload)>,
}

impl ChartDataMap {
    /// Payload for a namespaced key.
    pub fn get(&self, key: &str) -> Option<&ChartPayload> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, p)| p)
    }

    /// Payload for an unsanitized spec id.
    pub fn by_original_id(&self, id: &str) -> Option<&ChartPayload> {
        self.entries.iter().map(|(_, p)| p).find(|p| p.original_id == id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChartPayload)> {
        self.entries.iter().map(|(k, p)| (k.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for ChartDataMap {
    type Item = (String, ChartPayload);
    type IntoIter = std::vec::IntoIter<(String, ChartPayload)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for ChartDataMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, payload) in &self.entries {
            map.serialize_entry(key, payload)?;
        }
        map.end()
    }
}

/// Make a caller-supplied id safe for use inside identifiers: anything other than ASCII
/// alphanumerics and `_` becomes `_`.
pub fn sanitize_render_id(render_id: &str) -> String {
    render_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Build payloads for every spec of `catalog` that matches at least one column.
///
/// Specs matching nothing are omitted. Fails only if a spec carries an invalid pattern.
///
/// # Examples
///
/// ```rust
/// use ebas_charts::catalog::{ChartKind, ChartSpec};
/// use ebas_charts::ingestion::parse_ebas_str;
/// use ebas_charts::processing::build_chart_data;
///
/// let ds = parse_ebas_str("starttime endtime bin_1 bin_2\n0.0 0.04 1.5 2.5\n").unwrap();
/// let catalog = vec![
///     ChartSpec::new("chart_bins", "Bins", ChartKind::Heatmap, r"^bin_\d+$"),
///     ChartSpec::new("chart_rh", "RH", ChartKind::Line, "RH"),
/// ];
/// let charts = build_chart_data(&ds, &catalog, "ab-12").unwrap();
/// assert_eq!(charts.keys().collect::<Vec<_>>(), vec!["chart_bins_ab_12"]);
/// ```
pub fn build_chart_data(dataset: &DataSet, catalog: &[ChartSpec], render_id: &str) -> EbasResult<ChartDataMap> {
    let suffix = sanitize_render_id(render_id);
    let mut entries = Vec::new();

    for spec in catalog {
        let columns = ColumnMatcher::for_spec(spec)?.select(dataset.column_names());
        if columns.is_empty() {
            continue;
        }
        let payload = build_payload(dataset, spec, columns);
        entries.push((format!("{}_{suffix}", spec.id), payload));
    }

    Ok(ChartDataMap { entries })
}

/// Payload for one spec whose matched columns are already known.
pub fn build_payload(dataset: &DataSet, spec: &ChartSpec, columns: Vec<String>) -> ChartPayload {
    let stats = summarize(dataset, &columns);
    let data = match spec.kind {
        ChartKind::Heatmap => ChartData::Heatmap(heatmap_cells(dataset, &columns)),
        ChartKind::Line => ChartData::Line(line_series(dataset, &columns)),
    };
    ChartPayload {
        spec: spec.clone(),
        columns,
        stats,
        data,
        original_id: spec.id.clone(),
    }
}

/// Dense grid: exactly `rows * columns.len()` cells, row-major.
fn heatmap_cells(dataset: &DataSet, columns: &[String]) -> Vec<HeatmapCell> {
    let idxs: Vec<Option<usize>> = columns.iter().map(|c| dataset.schema().index_of(c)).collect();
    let mut cells = Vec::with_capacity(dataset.row_count() * columns.len());
    for (i, row) in dataset.rows().iter().enumerate() {
        for (j, idx) in idxs.iter().enumerate() {
            cells.push(HeatmapCell(i, j, value_or_zero(row, *idx)));
        }
    }
    cells
}

fn line_series(dataset: &DataSet, columns: &[String]) -> LineSeries {
    let y_data: BTreeMap<String, Vec<f64>> = columns
        .iter()
        .map(|c| {
            let idx = dataset.schema().index_of(c);
            let values: Vec<f64> = dataset.rows().iter().map(|row| value_or_zero(row, idx)).collect();
            (c.clone(), values)
        })
        .collect();
    LineSeries {
        x_data: (0..dataset.row_count()).collect(),
        y_data,
    }
}

fn value_or_zero(row: &[Value], idx: Option<usize>) -> f64 {
    idx.and_then(|i| row.get(i)).and_then(Value::as_f64).unwrap_or(0.0)
}
