//! Parallel batch execution over many input files.
//!
//! Each file is parsed and charted independently; nothing is shared between files, so the
//! engine only has to schedule work. It provides:
//!
//! - a dedicated rayon pool (`num_threads`)
//! - a throttle on files held in memory at once (`max_in_flight_files`)
//! - live metrics and observer events for monitoring
//!
//! Results come back in request order and one failing file never affects the others.

mod observer;
mod semaphore;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::catalog::ChartSpec;
use crate::error::EbasResult;
use crate::ingestion::IngestionRequest;
use crate::report::{analyze, AnalysisBundle};
use crate::types::DataSet;

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, StdErrExecutionObserver,
};

use semaphore::Semaphore;

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads. If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Upper bound on files being processed concurrently.
    pub max_in_flight_files: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            num_threads: Some(n),
            max_in_flight_files: n.max(1),
        }
    }
}

/// Result for one request of a batch.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    /// Input path of the request.
    pub path: PathBuf,
    pub result: EbasResult<T>,
}

/// Runs ingestion + chart building for many files on a bounded thread pool.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// # Panics
    ///
    /// Panics if `max_in_flight_files == 0`, `num_threads == Some(0)`, or the thread pool
    /// cannot be created.
    pub fn new(opts: ExecutionOptions) -> Self {
        assert!(opts.max_in_flight_files > 0, "max_in_flight_files must be > 0");
        if let Some(n) = opts.num_threads {
            assert!(n > 0, "num_threads must be > 0 when set");
        }

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|i| format!("ebas-batch-{i}"))
            .build()
            .expect("failed to build rayon thread pool");

        Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        }
    }

    /// Attach an observer for execution events.
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Handle to live execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Parse every request; one outcome per request, in request order.
    pub fn ingest_batch(&self, requests: &[IngestionRequest]) -> Vec<BatchOutcome<DataSet>> {
        self.run(requests, |_, req| {
            let ds = req.run()?;
            let rows = ds.row_count();
            Ok((ds, rows, 0))
        })
    }

    /// Parse every request and build its [`AnalysisBundle`] against `catalog`.
    ///
    /// The render id of each bundle is the file stem of its path. When several requests share a
    /// stem (same file name in different directories), each of them gets `{stem}_{index}` instead,
    /// so chart keys stay unique across the batch.
    pub fn analyze_batch(&self, requests: &[IngestionRequest], catalog: &[ChartSpec]) -> Vec<BatchOutcome<AnalysisBundle>> {
        let render_ids = batch_render_ids(requests);
        self.run(requests, |index, req| {
            let ds = req.run()?;
            let file_name = req.file_name();
            let bundle = analyze(&ds, catalog, &render_ids[index], Some(file_name.as_str()))?;
            let (rows, charts) = (bundle.summary.rows, bundle.charts.len());
            Ok((bundle, rows, charts))
        })
    }

    /// `job` receives the request index and returns the output plus `(rows, charts)` for metrics.
    fn run<T, F>(&self, requests: &[IngestionRequest], job: F) -> Vec<BatchOutcome<T>>
    where
        T: Send,
        F: Fn(usize, &IngestionRequest) -> EbasResult<(T, usize, usize)> + Send + Sync,
    {
        self.pool.install(|| {
            let start = Instant::now();
            self.metrics.begin_run();
            self.emit(ExecutionEvent::RunStarted { files: requests.len() });

            let sem = Semaphore::new(self.opts.max_in_flight_files);
            let out: Vec<BatchOutcome<T>> = requests
                .par_iter()
                .enumerate()
                .map(|(index, req)| {
                    let (_permit, waited) = sem.acquire();
                    if waited > Duration::ZERO {
                        self.metrics.on_throttle_wait(waited);
                        self.emit(ExecutionEvent::ThrottleWaited { duration: waited });
                    }

                    self.metrics.on_file_start();
                    self.emit(ExecutionEvent::FileStarted {
                        index,
                        path: req.path.clone(),
                    });

                    let result = job(index, req);
                    let counts = result.as_ref().ok().map(|(_, rows, charts)| (*rows, *charts));
                    self.emit(ExecutionEvent::FileFinished {
                        index,
                        path: req.path.clone(),
                        rows: counts.map(|(rows, _)| rows),
                        charts: counts.map_or(0, |(_, charts)| charts),
                    });
                    self.metrics.on_file_end(counts);

                    BatchOutcome {
                        path: req.path.clone(),
                        result: result.map(|(value, _, _)| value),
                    }
                })
                .collect();

            self.metrics.end_run(start.elapsed());
            self.emit(ExecutionEvent::RunFinished {
                elapsed: start.elapsed(),
                metrics: self.metrics.snapshot(),
            });
            out
        })
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

/// File stems, suffixed with the request index where a stem occurs more than once.
fn batch_render_ids(requests: &[IngestionRequest]) -> Vec<String> {
    let stems: Vec<String> = requests
        .iter()
        .map(|req| {
            req.path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for stem in &stems {
        *counts.entry(stem.as_str()).or_default() += 1;
    }

    stems
        .iter()
        .enumerate()
        .map(|(index, stem)| {
            if counts[stem.as_str()] > 1 {
                format!("{stem}_{index}")
            } else {
                stem.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ExecutionEngine, ExecutionOptions};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    use crate::catalog::default_catalog;
    use crate::execution::{ExecutionEvent, ExecutionObserver};
    use crate::ingestion::IngestionRequest;

    fn write_inputs(n: usize) -> (PathBuf, Vec<IngestionRequest>) {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let dir = std::env::temp_dir().join(format!("ebas-charts-exec-{nanos}"));
        std::fs::create_dir_all(&dir).unwrap();
        let mut reqs = Vec::new();
        for i in 0..n {
            let path = dir.join(format!("station_{i}.nas"));
            let body = if i % 3 == 2 {
                "no table in this file\n".to_string()
            } else {
                format!("starttime endtime bin_1 bin_2\n0.0 0.04 {i} 1\n0.04 0.08 2 {i}\n")
            };
            std::fs::write(&path, body).unwrap();
            reqs.push(IngestionRequest::new(path));
        }
        (dir, reqs)
    }

    struct ConcurrencyObserver {
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl ExecutionObserver for ConcurrencyObserver {
        fn on_event(&self, event: &ExecutionEvent) {
            match event {
                ExecutionEvent::FileStarted { .. } => {
                    let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                    self.max_active.fetch_max(now, Ordering::SeqCst);
                }
                ExecutionEvent::FileFinished { .. } => {
                    self.active.fetch_sub(1, Ordering::SeqCst);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn analyze_batch_keeps_request_order_and_isolates_failures() {
        let (dir, reqs) = write_inputs(6);
        let engine = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(3),
            max_in_flight_files: 3,
        });

        let out = engine.analyze_batch(&reqs, &default_catalog());
        assert_eq!(out.len(), 6);
        for (i, outcome) in out.iter().enumerate() {
            assert_eq!(outcome.path, reqs[i].path);
            if i % 3 == 2 {
                assert!(outcome.result.is_err());
            } else {
                let bundle = outcome.result.as_ref().unwrap();
                assert_eq!(bundle.summary.rows, 2);
                assert!(bundle.charts.get(&format!("chart_bins_station_{i}")).is_some());
            }
        }

        let snap = engine.metrics().snapshot();
        assert_eq!(snap.files_started, 6);
        assert_eq!(snap.files_succeeded, 4);
        assert_eq!(snap.files_failed, 2);
        assert_eq!(snap.rows_parsed, 8);
        assert_eq!(snap.charts_built, 4);
        assert!(snap.elapsed.is_some());

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn shared_stems_get_distinct_chart_keys() {
        let (dir, _) = write_inputs(1);
        for sub in ["north", "south"] {
            std::fs::create_dir_all(dir.join(sub)).unwrap();
            std::fs::copy(dir.join("station_0.nas"), dir.join(sub).join("station_0.nas")).unwrap();
        }
        let reqs = vec![
            IngestionRequest::new(dir.join("north").join("station_0.nas")),
            IngestionRequest::new(dir.join("station_0.nas")),
            IngestionRequest::new(dir.join("south").join("station_0.nas")),
        ];
        assert_eq!(
            super::batch_render_ids(&reqs),
            vec!["station_0_0", "station_0_1", "station_0_2"]
        );

        let engine = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(2),
            max_in_flight_files: 2,
        });
        let out = engine.analyze_batch(&reqs, &default_catalog());
        let keys: Vec<String> = out
            .iter()
            .map(|o| o.result.as_ref().unwrap().charts.keys().next().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["chart_bins_station_0_0", "chart_bins_station_0_1", "chart_bins_station_0_2"]);

        // Unique stems are left alone.
        let single = vec![IngestionRequest::new(dir.join("station_0.nas"))];
        assert_eq!(super::batch_render_ids(&single), vec!["station_0"]);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn max_in_flight_files_throttles_concurrency() {
        let (dir, reqs) = write_inputs(12);
        let observer = Arc::new(ConcurrencyObserver {
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        });
        let obs_trait: Arc<dyn ExecutionObserver> = observer.clone();
        let engine = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(4),
            max_in_flight_files: 1,
        })
        .with_observer(obs_trait);

        let out = engine.ingest_batch(&reqs);
        assert_eq!(out.len(), 12);
        assert_eq!(observer.max_active.load(Ordering::SeqCst), 1);
        assert_eq!(engine.metrics().snapshot().max_active_files, 1);

        std::fs::remove_dir_all(dir).unwrap();
    }
}
