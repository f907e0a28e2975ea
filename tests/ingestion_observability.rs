use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use ebas_charts::ingestion::{
    ingest_from_path, CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionOptions,
    IngestionSeverity, IngestionStats,
};
use ebas_charts::EbasError;

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<IngestionStats>>,
    failures: Mutex<Vec<IngestionSeverity>>,
    alerts: Mutex<Vec<IngestionSeverity>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_success(&self, _ctx: &IngestionContext, stats: IngestionStats) {
        self.successes.lock().unwrap().push(stats);
    }

    fn on_failure(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &EbasError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &EbasError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn opts_with(obs: Arc<dyn IngestionObserver>, alert_at_or_above: IngestionSeverity) -> IngestionOptions {
    IngestionOptions {
        observer: Some(obs),
        alert_at_or_above,
        ..Default::default()
    }
}

fn tmp_log() -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    std::env::temp_dir().join(format!("ebas-charts-observer-{nanos}.log"))
}

#[test]
fn observer_receives_stats_on_success() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = opts_with(obs.clone(), IngestionSeverity::Critical);

    ingest_from_path("tests/fixtures/sample.nas", &opts).unwrap();

    let successes = obs.successes.lock().unwrap().clone();
    assert_eq!(
        successes,
        vec![IngestionStats {
            rows: 4,
            columns: 9,
            undetermined_timestamps: 0,
        }]
    );
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn observer_receives_failure_and_alert_on_critical_io_error() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = opts_with(obs.clone(), IngestionSeverity::Critical);

    // Missing file -> Io error -> Critical
    let _ = ingest_from_path("tests/fixtures/does_not_exist.nas", &opts).unwrap_err();

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![IngestionSeverity::Critical]);
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![IngestionSeverity::Critical]);
}

#[test]
fn parse_error_is_reported_without_alert() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = opts_with(obs.clone(), IngestionSeverity::Critical);

    let _ = ingest_from_path("tests/fixtures/no_header.nas", &opts).unwrap_err();

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![IngestionSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn lower_threshold_alerts_on_parse_errors() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = opts_with(obs.clone(), IngestionSeverity::Error);

    let _ = ingest_from_path("tests/fixtures/header_only.nas", &opts).unwrap_err();

    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![IngestionSeverity::Error]);
}

#[test]
fn composite_fans_out_and_file_observer_appends() {
    let log = tmp_log();
    let recorder = Arc::new(RecordingObserver::default());
    let file_obs = Arc::new(FileObserver::new(&log));
    assert_eq!(file_obs.path(), log.as_path());

    let observers: Vec<Arc<dyn IngestionObserver>> = vec![recorder.clone(), file_obs];
    let composite = Arc::new(CompositeObserver::new(observers));
    let opts = opts_with(composite, IngestionSeverity::Critical);

    ingest_from_path("tests/fixtures/sample.nas", &opts).unwrap();
    let _ = ingest_from_path("tests/fixtures/does_not_exist.nas", &opts).unwrap_err();

    assert_eq!(recorder.successes.lock().unwrap().len(), 1);
    assert_eq!(recorder.alerts.lock().unwrap().len(), 1);

    let text = std::fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    // success, failure, alert
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("ok format=Ebas"));
    assert!(lines[0].contains("rows=4 columns=9"));
    assert!(lines[1].contains("fail severity=Critical"));
    assert!(lines[2].contains("ALERT fail severity=Critical"));

    std::fs::remove_file(log).unwrap();
}

#[test]
fn undetermined_timestamps_are_counted() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = opts_with(obs.clone(), IngestionSeverity::Critical);

    let path = tmp_log().with_extension("txt");
    std::fs::write(&path, "starttime endtime x\n- 1 2\n0.5 1 3\nbad 1 4\n").unwrap();
    ingest_from_path(&path, &opts).unwrap();

    assert_eq!(obs.successes.lock().unwrap()[0].undetermined_timestamps, 2);
    std::fs::remove_file(path).unwrap();
}
