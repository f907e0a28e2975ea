//! Path-based ingestion entrypoint.
//!
//! [`ingest_from_path`] reads one file from disk, parses it into a [`crate::types::DataSet`] and
//! reports the outcome to an optional [`IngestionObserver`]. The parser itself never touches the
//! file system; this module is the thin I/O layer in front of it.

use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::error::{EbasError, EbasResult};
use crate::types::DataSet;

use super::ebas::{self, ParseOptions};
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};

/// Supported ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    /// EBAS whitespace-delimited text (NASA-Ames style `.nas`, plain `.txt`, or `.csv` exports).
    Ebas,
}

impl IngestionFormat {
    /// File extensions accepted for ingestion (lower-case, without the dot).
    pub const EXTENSIONS: [&'static str; 3] = ["nas", "txt", "csv"];

    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
            .then_some(Self::Ebas)
    }
}

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, infer the format from the file extension.
    pub format: Option<IngestionFormat>,
    /// Parser options.
    pub parse: ParseOptions,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("parse", &self.parse)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            parse: ParseOptions::default(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Ingest one EBAS file from disk.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` with row/column counts
/// - `on_failure` with a computed severity
/// - `on_alert` when that severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use ebas_charts::ingestion::{ingest_from_path, IngestionOptions, StdErrObserver};
///
/// # fn main() -> Result<(), ebas_charts::EbasError> {
/// let opts = IngestionOptions {
///     observer: Some(Arc::new(StdErrObserver)),
///     ..Default::default()
/// };
/// let ds = ingest_from_path("station_2024.nas", &opts)?;
/// println!("rows={} period={}", ds.row_count(), ds.time_period());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(path: impl AsRef<Path>, options: &IngestionOptions) -> EbasResult<DataSet> {
    let path = path.as_ref();
    let format = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    let ctx = IngestionContext {
        path: path.to_path_buf(),
        format,
    };

    let result = match format {
        IngestionFormat::Ebas => ebas::ingest_ebas_from_path(path, &options.parse),
    };

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(ds) => obs.on_success(
                &ctx,
                IngestionStats {
                    rows: ds.row_count(),
                    columns: ds.column_count(),
                    undetermined_timestamps: ds.timestamps().iter().filter(|ts| ts.is_none()).count(),
                },
            ),
            Err(e) => {
                let sev = severity_for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

/// Severity an ingestion error is reported with.
pub fn severity_for_error(e: &EbasError) -> IngestionSeverity {
    match e {
        EbasError::Io(_) => IngestionSeverity::Critical,
        EbasError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        EbasError::Json(err) => {
            if error_chain_contains_io(err) {
                IngestionSeverity::Critical
            } else {
                IngestionSeverity::Error
            }
        }
        EbasError::Parse(_) | EbasError::UnsupportedFormat { .. } | EbasError::InvalidPattern { .. } => {
            IngestionSeverity::Error
        }
    }
}

fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}

fn infer_format_from_path(path: &Path) -> EbasResult<IngestionFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| EbasError::UnsupportedFormat {
            message: format!("path has no extension ({})", path.display()),
        })?;

    IngestionFormat::from_extension(ext).ok_or_else(|| EbasError::UnsupportedFormat {
        message: format!(
            "extension '{ext}' is not one of {:?} ({})",
            IngestionFormat::EXTENSIONS,
            path.display()
        ),
    })
}

/// Recursively list files under `dir` whose extension is accepted for ingestion.
///
/// Results are sorted so batch runs are reproducible.
pub fn discover_inputs(dir: impl AsRef<Path>) -> EbasResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let accepted = entry
            .path()
            .extension()
            .and_then(|s| s.to_str())
            .and_then(IngestionFormat::from_extension)
            .is_some();
        if accepted {
            out.push(entry.into_path());
        }
    }
    out.sort();
    Ok(out)
}

/// Owned description of one ingestion job, e.g. for [`crate::execution::ExecutionEngine`].
#[derive(Clone)]
pub struct IngestionRequest {
    /// Path to the input file.
    pub path: PathBuf,
    /// Options controlling ingestion.
    pub options: IngestionOptions,
}

impl fmt::Debug for IngestionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionRequest")
            .field("path", &self.path)
            .field("options", &self.options)
            .finish()
    }
}

impl IngestionRequest {
    /// Request with default options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: IngestionOptions::default(),
        }
    }

    /// Execute the request by calling [`ingest_from_path`].
    pub fn run(&self) -> EbasResult<DataSet> {
        ingest_from_path(&self.path, &self.options)
    }

    /// File name component of the path, used as the original-file label in reports.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
