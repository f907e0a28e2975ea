//! Dataset export.
//!
//! - [`to_json_records`]: one JSON object per row, plus the derived `datetime`
//! - [`write_csv`]: comma-separated copy of the parsed table

use std::io::Write;
use std::path::Path;

use serde_json::{Map, Number};

use crate::error::EbasResult;
use crate::types::{DataSet, Value};

/// Key under which [`to_json_records`] stores each row's derived timestamp.
pub const DATETIME_KEY: &str = "datetime";

/// Convert every row into a JSON object keyed by column name.
///
/// Missing values become `null`; `starttime`/`endtime` stay strings; `datetime` holds the derived
/// timestamp as ISO-8601 or `null`.
pub fn to_json_records(dataset: &DataSet) -> EbasResult<serde_json::Value> {
    let names: Vec<&str> = dataset.column_names().collect();
    let mut records = Vec::with_capacity(dataset.row_count());

    for (row, ts) in dataset.rows().iter().zip(dataset.timestamps()) {
        let mut obj = Map::with_capacity(names.len() + 1);
        for (name, value) in names.iter().zip(row) {
            obj.insert((*name).to_owned(), json_value(value));
        }
        obj.insert(DATETIME_KEY.to_owned(), serde_json::to_value(ts)?);
        records.push(serde_json::Value::Object(obj));
    }

    Ok(serde_json::Value::Array(records))
}

fn json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Float64(v) => Number::from_f64(*v).map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::Utf8(s) => serde_json::Value::String(s.clone()),
    }
}

/// Write the dataset as CSV with a header row; missing values are empty fields.
pub fn write_csv<W: Write>(dataset: &DataSet, writer: W) -> EbasResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(dataset.column_names())?;
    for row in dataset.rows() {
        wtr.write_record(row.iter().map(|v| match v {
            Value::Null => String::new(),
            Value::Float64(x) => x.to_string(),
            Value::Utf8(s) => s.clone(),
        }))?;
    }
    wtr.flush()?;
    Ok(())
}

/// [`write_csv`] into a newly created file at `path`.
pub fn write_csv_to_path(dataset: &DataSet, path: impl AsRef<Path>) -> EbasResult<()> {
    let file = std::fs::File::create(path)?;
    write_csv(dataset, std::io::BufWriter::new(file))
}
