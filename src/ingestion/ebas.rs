//! EBAS text ingestion.
//!
//! An EBAS data file is free-form metadata followed by a whitespace-delimited table. The table
//! header is the first line whose trimmed content starts with `starttime` and which also
//! contains `endtime`; every later non-blank line not starting with `#` is a data row.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::error::{EbasResult, ParseError};
use crate::types::{DEFAULT_EPOCH_YEAR, DataSet, DataType, END_TIME, Schema, START_TIME, Value, parse_finite};

/// What to do with a data row whose token count differs from the header width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RaggedRowPolicy {
    /// Map tokens positionally: pad short rows with missing values, drop surplus tokens.
    #[default]
    Pad,
    /// Drop the row.
    Skip,
}

/// Options controlling EBAS parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Year whose January 1st is the reference for `starttime` day fractions.
    pub epoch_year: i32,
    /// Handling of rows that do not match the header width.
    pub ragged_rows: RaggedRowPolicy,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            epoch_year: DEFAULT_EPOCH_YEAR,
            ragged_rows: RaggedRowPolicy::default(),
        }
    }
}

/// Parse EBAS file content with default [`ParseOptions`].
///
/// # Examples
///
/// ```rust
/// use ebas_charts::ingestion::ebas::parse_ebas_str;
///
/// let content = "\
/// starttime endtime bin_1 bin_2 flag_bin_1
/// 0.0 0.04 1.5 2.5 0
/// 0.04 0.08 1.7 2.9 1
/// ";
/// let ds = parse_ebas_str(content).unwrap();
/// assert_eq!(ds.row_count(), 2);
/// assert_eq!(ds.column_count(), 5);
/// ```
pub fn parse_ebas_str(content: &str) -> Result<DataSet, ParseError> {
    parse_ebas_str_with(content, &ParseOptions::default())
}

/// Parse EBAS file content into a [`DataSet`].
///
/// Rules:
///
/// - Header tokens become the columns, in order. `starttime`/`endtime` keep their raw tokens;
///   every other column is numeric, and tokens that are not finite numbers become
///   [`Value::Null`].
/// - Lines are trimmed before the blank/comment check, so an indented `   # note` line is a
///   comment and not a data row. Row counts can therefore be lower than for tools that only test
///   the raw line for a leading `#`.
/// - Timestamps are derived from `starttime`; an unusable `starttime` gives an undetermined
///   timestamp for that row only.
/// - Fails with [`ParseError::NoHeader`] or [`ParseError::NoDataRows`]; never returns an empty
///   dataset.
pub fn parse_ebas_str_with(content: &str, options: &ParseOptions) -> Result<DataSet, ParseError> {
    let mut lines = content.lines();

    let header = lines
        .by_ref()
        .map(str::trim)
        .find(|line| line.starts_with(START_TIME) && line.contains(END_TIME))
        .ok_or(ParseError::NoHeader)?;
    let schema = Schema::from_header(unique_column_names(header.split_whitespace()).iter().map(String::as_str));
    let width = schema.len();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for line in lines.map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != width && options.ragged_rows == RaggedRowPolicy::Skip {
            continue;
        }

        let row = schema
            .fields
            .iter()
            .enumerate()
            .map(|(idx, field)| match tokens.get(idx) {
                None => Value::Null,
                Some(raw) => match field.data_type {
                    DataType::Utf8 => Value::Utf8((*raw).to_owned()),
                    DataType::Float64 => parse_finite(raw).map(Value::Float64).unwrap_or(Value::Null),
                },
            })
            .collect();
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(ParseError::NoDataRows);
    }

    Ok(DataSet::with_epoch_year(schema, rows, options.epoch_year))
}

/// Parse raw bytes; invalid UTF-8 sequences are replaced rather than rejected.
pub fn parse_ebas_bytes(bytes: &[u8], options: &ParseOptions) -> Result<DataSet, ParseError> {
    parse_ebas_str_with(&String::from_utf8_lossy(bytes), options)
}

/// Read everything from `reader` and parse it.
pub fn ingest_ebas_from_reader<R: Read>(mut reader: R, options: &ParseOptions) -> EbasResult<DataSet> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(parse_ebas_bytes(&buf, options)?)
}

/// Read and parse an EBAS file from disk.
pub fn ingest_ebas_from_path(path: impl AsRef<Path>, options: &ParseOptions) -> EbasResult<DataSet> {
    let bytes = std::fs::read(path)?;
    Ok(parse_ebas_bytes(&bytes, options)?)
}

/// Suffix repeated header tokens (`x`, `x.1`, `x.2`, ...) so column names stay unique.
fn unique_column_names<'a>(tokens: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for token in tokens {
        let mut name = token.to_owned();
        let mut n = 0usize;
        while seen.contains(&name) {
            n += 1;
            name = format!("{token}.{n}");
        }
        seen.insert(name.clone());
        out.push(name);
    }
    out
}
