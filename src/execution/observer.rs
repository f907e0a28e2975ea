use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Events emitted by the [`super::ExecutionEngine`] during a batch run.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted { files: usize },
    ThrottleWaited { duration: Duration },
    FileStarted { index: usize, path: PathBuf },
    /// `rows` is `None` when the file failed.
    FileFinished { index: usize, path: PathBuf, rows: Option<usize>, charts: usize },
    RunFinished {
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Prints every execution event to stderr.
#[derive(Default)]
pub struct StdErrExecutionObserver;

impl ExecutionObserver for StdErrExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::FileFinished {
                index,
                path,
                rows: Some(rows),
                charts,
            } => eprintln!("[batch][ok] #{index} path={} rows={rows} charts={charts}", path.display()),
            ExecutionEvent::FileFinished { index, path, rows: None, .. } => {
                eprintln!("[batch][fail] #{index} path={}", path.display())
            }
            ExecutionEvent::RunFinished { metrics, .. } => eprintln!("[batch][done] {metrics}"),
            other => eprintln!("[batch] {other:?}"),
        }
    }
}

/// Live counters for a batch run; callers can snapshot them at any time.
#[derive(Default)]
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    files_started: AtomicU64,
    files_succeeded: AtomicU64,
    files_failed: AtomicU64,
    rows_parsed: AtomicU64,
    charts_built: AtomicU64,
    throttle_wait_ns: AtomicU64,

    active_files: AtomicUsize,
    max_active_files: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_run(&self) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);
        for counter in [
            &self.elapsed_ns,
            &self.files_started,
            &self.files_succeeded,
            &self.files_failed,
            &self.rows_parsed,
            &self.charts_built,
            &self.throttle_wait_ns,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
        self.active_files.store(0, Ordering::SeqCst);
        self.max_active_files.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns.store(saturating_nanos(elapsed), Ordering::SeqCst);
    }

    pub fn on_file_start(&self) {
        let _ = self.files_started.fetch_add(1, Ordering::SeqCst);
        let now = self.active_files.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.max_active_files.fetch_max(now, Ordering::SeqCst);
    }

    /// Record a finished file: `Some((rows, charts))` on success.
    pub fn on_file_end(&self, outcome: Option<(usize, usize)>) {
        match outcome {
            Some((rows, charts)) => {
                let _ = self.files_succeeded.fetch_add(1, Ordering::SeqCst);
                let _ = self.rows_parsed.fetch_add(rows as u64, Ordering::SeqCst);
                let _ = self.charts_built.fetch_add(charts as u64, Ordering::SeqCst);
            }
            None => {
                let _ = self.files_failed.fetch_add(1, Ordering::SeqCst);
            }
        }
        let _ = self.active_files.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn on_throttle_wait(&self, d: Duration) {
        let _ = self.throttle_wait_ns.fetch_add(saturating_nanos(d), Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
            files_started: self.files_started.load(Ordering::SeqCst),
            files_succeeded: self.files_succeeded.load(Ordering::SeqCst),
            files_failed: self.files_failed.load(Ordering::SeqCst),
            rows_parsed: self.rows_parsed.load(Ordering::SeqCst),
            charts_built: self.charts_built.load(Ordering::SeqCst),
            throttle_wait: Duration::from_nanos(self.throttle_wait_ns.load(Ordering::SeqCst)),
            max_active_files: self.max_active_files.load(Ordering::SeqCst),
        }
    }
}

fn saturating_nanos(d: Duration) -> u64 {
    d.as_nanos().min(u64::MAX as u128) as u64
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub files_started: u64,
    pub files_succeeded: u64,
    pub files_failed: u64,
    pub rows_parsed: u64,
    pub charts_built: u64,
    pub throttle_wait: Duration,
    pub max_active_files: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, files={}/{} (failed={}), rows={}, charts={}, max_active_files={}, throttle_wait={:?}, elapsed={:?}",
            self.run_id,
            self.files_succeeded,
            self.files_started,
            self.files_failed,
            self.rows_parsed,
            self.charts_built,
            self.max_active_files,
            self.throttle_wait,
            self.elapsed
        )
    }
}
