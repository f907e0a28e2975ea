use thiserror::Error;

/// Convenience result type used across the crate.
pub type EbasResult<T> = Result<T, EbasError>;

/// Reasons an EBAS file cannot be turned into a [`crate::types::DataSet`].
///
/// Both are fatal for the file being parsed; no partial dataset is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No line starts with `starttime` and also contains `endtime`.
    #[error("no header found")]
    NoHeader,
    /// A header was found but no data lines follow it.
    #[error("no data rows")]
    NoDataRows,
}

/// Error type returned by ingestion, chart building and export functions.
#[derive(Debug, Error)]
pub enum EbasError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV export error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file content is not a recognizable EBAS data file.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A chart spec carries a pattern that is not a valid regular expression.
    #[error("invalid pattern for chart '{chart_id}': {message} (pattern='{pattern}')")]
    InvalidPattern {
        chart_id: String,
        pattern: String,
        message: String,
    },

    /// The input cannot be routed to a parser (unknown extension, etc.).
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },
}

impl EbasError {
    /// Returns the [`ParseError`] if this error came from the EBAS parser.
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            EbasError::Parse(e) => Some(e),
            _ => None,
        }
    }
}
