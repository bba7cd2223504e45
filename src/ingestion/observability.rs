use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{error, info, warn};

use crate::error::{EngineError, ErrorKind};
use crate::types::LoadStats;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (the file's unit failed).
    Error,
    /// Critical error (connection, pool or I/O failures).
    Critical,
}

impl IngestionSeverity {
    /// Severity of a failed unit.
    pub fn for_error(e: &EngineError) -> Self {
        match e {
            EngineError::Io(_) => IngestionSeverity::Critical,
            EngineError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
                _ => IngestionSeverity::Error,
            },
            EngineError::Store(source) | EngineError::Load { source, .. }
                if source.is_connection_failure() =>
            {
                IngestionSeverity::Critical
            }
            e if e.kind() == ErrorKind::Ingestion => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        }
    }
}

/// Which file a callback is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionContext {
    /// Identifying name of the uploaded file.
    pub file_name: String,
    /// Target derived from the file name.
    pub target: String,
}

/// Observer interface for per-file ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when a file's rows were all loaded.
    fn on_success(&self, _ctx: &IngestionContext, _stats: LoadStats) {}

    /// Called when a file's unit fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &EngineError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &EngineError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: LoadStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &EngineError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &EngineError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Emits ingestion events as `tracing` events.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: LoadStats) {
        info!(file = %ctx.file_name, table = %ctx.target, rows = stats.rows, "file ingested");
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &EngineError) {
        warn!(
            file = %ctx.file_name,
            table = %ctx.target,
            severity = ?severity,
            error = %error,
            "file ingestion failed"
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &EngineError) {
        error!(
            file = %ctx.file_name,
            table = %ctx.target,
            severity = ?severity,
            error = %error,
            "ALERT: file ingestion failed"
        );
    }
}

/// Appends ingestion events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: LoadStats) {
        self.append_line(&format!(
            "{} ok file={} table={} rows={}",
            unix_ts(),
            ctx.file_name,
            ctx.target,
            stats.rows
        ));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &EngineError) {
        self.append_line(&format!(
            "{} fail severity={:?} file={} table={} err={}",
            unix_ts(),
            severity,
            ctx.file_name,
            ctx.target,
            error
        ));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &EngineError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} file={} table={} err={}",
            unix_ts(),
            severity,
            ctx.file_name,
            ctx.target,
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
