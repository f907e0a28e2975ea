//! Core data model types.
//!
//! The parser produces an immutable, in-memory [`DataSet`] described by a [`Schema`] (a list of
//! typed [`Field`]s). Every dataset also carries one derived timestamp per row.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

/// Name of the column holding each sample's start, as a fractional day of year.
pub const START_TIME: &str = "starttime";
/// Name of the column holding each sample's end, as a fractional day of year.
pub const END_TIME: &str = "endtime";
/// Year whose January 1st is used as the timestamp reference when none is configured.
pub const DEFAULT_EPOCH_YEAR: i32 = 2024;

/// Display format for timestamps at minute resolution.
pub const TIME_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Numeric measurement; unparseable tokens become [`Value::Null`].
    Float64,
    /// Raw token kept verbatim (used for `starttime` / `endtime`).
    Utf8,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Field for an EBAS header token: time columns are raw text, everything else is numeric.
    pub fn for_header_token(name: &str) -> Self {
        let data_type = if is_time_column(name) {
            DataType::Utf8
        } else {
            DataType::Float64
        };
        Self::new(name, data_type)
    }
}

/// Returns `true` for the two raw time columns.
pub fn is_time_column(name: &str) -> bool {
    name == START_TIME || name == END_TIME
}

/// Ordered list of fields describing the shape of every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Build a schema from EBAS header tokens, in order.
    pub fn from_header<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(tokens.into_iter().map(Field::for_header_token).collect())
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A single value in a [`DataSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value (unparseable or absent token).
    Null,
    /// Finite 64-bit float.
    Float64(f64),
    /// Raw token, kept as it appeared in the file.
    Utf8(String),
}

impl Value {
    /// Numeric view of the value.
    ///
    /// Raw text is parsed on demand; anything that is not a finite number is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Null => None,
            Value::Float64(v) => Some(*v),
            Value::Utf8(s) => parse_finite(s),
        }
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Parse a token as a finite `f64`; `nan`, `inf` and garbage all yield `None`.
pub(crate) fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// In-memory tabular dataset parsed from one EBAS file.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields, and in file
/// order. The dataset is immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    schema: Schema,
    rows: Vec<Vec<Value>>,
    timestamps: Vec<Option<NaiveDateTime>>,
}

impl DataSet {
    /// Create a dataset, deriving timestamps against January 1st of [`DEFAULT_EPOCH_YEAR`].
    ///
    /// # Panics
    ///
    /// Panics if any row has a different length than the schema field count.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self::with_epoch_year(schema, rows, DEFAULT_EPOCH_YEAR)
    }

    /// Create a dataset, deriving timestamps against January 1st of `epoch_year`.
    ///
    /// # Panics
    ///
    /// Panics if any row has a different length than the schema field count.
    pub fn with_epoch_year(schema: Schema, rows: Vec<Vec<Value>>, epoch_year: i32) -> Self {
        let expected_len = schema.len();
        for row in &rows {
            assert!(
                row.len() == expected_len,
                "row length {} does not match schema length {}",
                row.len(),
                expected_len
            );
        }

        let epoch = epoch_start(epoch_year);
        let start_idx = schema.index_of(START_TIME);
        let timestamps = rows
            .iter()
            .map(|row| {
                let raw = start_idx.and_then(|idx| row.get(idx))?;
                derive_timestamp(raw, epoch?)
            })
            .collect();

        Self {
            schema,
            rows,
            timestamps,
        }
    }

    /// Schema describing row shape.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Row-major value storage.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Derived timestamps, one per row; `None` where the row's `starttime` is unusable.
    pub fn timestamps(&self) -> &[Option<NaiveDateTime>] {
        &self.timestamps
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the dataset.
    pub fn column_count(&self) -> usize {
        self.schema.len()
    }

    /// Iterate column names in file order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.schema.field_names()
    }

    /// Numeric values of `column` in row order, or `None` if the column does not exist.
    pub fn column_f64(&self, column: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.schema.index_of(column)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).and_then(Value::as_f64))
                .collect(),
        )
    }

    /// One human-readable label per row: the timestamp at minute resolution, or `Sample {i}`.
    pub fn time_labels(&self) -> Vec<String> {
        self.timestamps
            .iter()
            .enumerate()
            .map(|(i, ts)| match ts {
                Some(ts) => ts.format(TIME_LABEL_FORMAT).to_string(),
                None => format!("Sample {i}"),
            })
            .collect()
    }

    /// Label for the period covered by the data.
    ///
    /// Uses the earliest and latest resolvable timestamps (`"<start> to <end>"`); falls back to
    /// the row count when no timestamp could be derived.
    pub fn time_period(&self) -> String {
        let resolved = self.timestamps.iter().flatten();
        let start = resolved.clone().min();
        let end = resolved.max();
        match (start, end) {
            (Some(start), Some(end)) => format!(
                "{} to {}",
                start.format(TIME_LABEL_FORMAT),
                end.format(TIME_LABEL_FORMAT)
            ),
            _ => format!("{} time points", self.row_count()),
        }
    }
}

fn epoch_start(year: i32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)
}

/// `epoch + starttime * 24h`, or `None` if the value is not a usable number.
fn derive_timestamp(raw: &Value, epoch: NaiveDateTime) -> Option<NaiveDateTime> {
    let days = raw.as_f64()?;
    let micros = (days * 24.0 * 3_600_000_000.0).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    epoch.checked_add_signed(TimeDelta::microseconds(micros as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(s: &str) -> Value {
        Value::Utf8(s.to_string())
    }

    fn sample_dataset() -> DataSet {
        let schema = Schema::from_header(["starttime", "endtime", "bin_1"]);
        DataSet::new(
            schema,
            vec![
                vec![raw("1.0"), raw("1.5"), Value::Float64(3.0)],
                vec![raw("bogus"), raw("2.0"), Value::Null],
                vec![raw("0.5"), raw("1.0"), Value::Float64(4.0)],
            ],
        )
    }

    #[test]
    fn header_tokens_get_time_and_numeric_types() {
        let schema = Schema::from_header(["starttime", "endtime", "bin_1"]);
        assert_eq!(schema.fields[0].data_type, DataType::Utf8);
        assert_eq!(schema.fields[1].data_type, DataType::Utf8);
        assert_eq!(schema.fields[2].data_type, DataType::Float64);
        assert_eq!(schema.index_of("bin_1"), Some(2));
        assert_eq!(schema.index_of("missing"), None);
    }

    #[test]
    fn one_day_maps_to_epoch_plus_24_hours() {
        let ds = sample_dataset();
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(ds.timestamps()[0], Some(expected));
        assert_eq!(ds.timestamps().len(), ds.row_count());
    }

    #[test]
    fn unparseable_starttime_is_undetermined() {
        let ds = sample_dataset();
        assert_eq!(ds.timestamps()[1], None);
    }

    #[test]
    fn time_labels_fall_back_to_sample_index() {
        let ds = sample_dataset();
        assert_eq!(
            ds.time_labels(),
            vec!["2024-01-02 00:00", "Sample 1", "2024-01-01 12:00"]
        );
    }

    #[test]
    fn time_period_uses_earliest_and_latest() {
        let ds = sample_dataset();
        assert_eq!(ds.time_period(), "2024-01-01 12:00 to 2024-01-02 00:00");
    }

    #[test]
    fn time_period_falls_back_to_row_count() {
        let schema = Schema::from_header(["starttime", "endtime"]);
        let ds = DataSet::new(schema, vec![vec![raw("x"), raw("y")], vec![raw("-"), raw("-")]]);
        assert_eq!(ds.time_period(), "2 time points");
    }

    #[test]
    fn configurable_epoch_year() {
        let schema = Schema::from_header(["starttime", "endtime"]);
        let ds = DataSet::with_epoch_year(schema, vec![vec![raw("0.0"), raw("0.04")]], 2019);
        assert_eq!(ds.time_labels(), vec!["2019-01-01 00:00"]);
    }

    #[test]
    fn non_finite_values_are_not_numbers() {
        assert_eq!(raw("nan").as_f64(), None);
        assert_eq!(raw("inf").as_f64(), None);
        assert_eq!(raw(" 2.5 ").as_f64(), Some(2.5));
        assert!(Value::Null.is_null());
    }

    #[test]
    fn column_f64_reads_numeric_view() {
        let ds = sample_dataset();
        assert_eq!(ds.column_f64("bin_1"), Some(vec![Some(3.0), None, Some(4.0)]));
        assert_eq!(ds.column_f64("starttime"), Some(vec![Some(1.0), None, Some(0.5)]));
        assert_eq!(ds.column_f64("nope"), None);
    }

    #[test]
    #[should_panic(expected = "row length")]
    fn new_panics_on_wrong_row_arity() {
        let schema = Schema::from_header(["starttime", "endtime"]);
        let _ = DataSet::new(schema, vec![vec![raw("0.0")]]);
    }
}
