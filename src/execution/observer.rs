use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

/// Execution events emitted by the engine.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted { files: usize },
    ThrottleWaited { duration: Duration },
    FileStarted { file_name: String },
    FileFinished { file_name: String, rows: usize },
    FileFailed { file_name: String, error: String },
    RunFinished {
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Forwards execution events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingExecutionObserver;

impl ExecutionObserver for TracingExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::RunStarted { files } => info!(files, "ingestion run started"),
            ExecutionEvent::ThrottleWaited { duration } => debug!(?duration, "throttled"),
            ExecutionEvent::FileStarted { file_name } => debug!(file = %file_name, "file started"),
            ExecutionEvent::FileFinished { file_name, rows } => {
                debug!(file = %file_name, rows, "file finished")
            }
            ExecutionEvent::FileFailed { file_name, error } => {
                warn!(file = %file_name, error = %error, "file failed")
            }
            ExecutionEvent::RunFinished { elapsed, metrics } => {
                info!(?elapsed, %metrics, "ingestion run finished")
            }
        }
    }
}

/// Real-time metrics for ingestion runs.
///
/// The engine keeps one instance that accumulates over every run it executes, and a fresh
/// instance per run whose snapshot is published in [`ExecutionEvent::RunFinished`]. Counters
/// are never reset, so runs that overlap on the same engine keep them consistent.
#[derive(Debug, Default)]
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    files_started: AtomicU64,
    files_loaded: AtomicU64,
    files_failed: AtomicU64,
    rows_written: AtomicU64,
    throttle_wait_ns: AtomicU64,

    active_files: AtomicUsize,
    max_active_files: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh counters for the run numbered `run_id`.
    pub fn for_run(run_id: u64) -> Self {
        Self {
            run_id: AtomicU64::new(run_id),
            ..Self::default()
        }
    }

    /// Count a new run and return its id.
    pub fn begin_run(&self) -> u64 {
        self.run_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Record the duration of the most recently finished run.
    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns.store(saturating_nanos(elapsed), Ordering::SeqCst);
    }

    pub fn on_file_start(&self) {
        self.files_started.fetch_add(1, Ordering::SeqCst);
        let now = self.active_files.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_files.fetch_max(now, Ordering::SeqCst);
    }

    /// `rows` is the number of rows the file wrote, including rows left by a failed load.
    pub fn on_file_end(&self, ok: bool, rows: usize) {
        if ok {
            self.files_loaded.fetch_add(1, Ordering::SeqCst);
        } else {
            self.files_failed.fetch_add(1, Ordering::SeqCst);
        }
        self.rows_written.fetch_add(rows as u64, Ordering::SeqCst);
        self.active_files.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn on_throttle_wait(&self, d: Duration) {
        self.throttle_wait_ns.fetch_add(saturating_nanos(d), Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
            files_started: self.files_started.load(Ordering::SeqCst),
            files_loaded: self.files_loaded.load(Ordering::SeqCst),
            files_failed: self.files_failed.load(Ordering::SeqCst),
            rows_written: self.rows_written.load(Ordering::SeqCst),
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
    pub files_loaded: u64,
    pub files_failed: u64,
    pub rows_written: u64,
    pub throttle_wait: Duration,
    pub max_active_files: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, files={}/{} (failed {}), rows_written={}, max_active_files={}, throttle_wait={:?}, elapsed={:?}",
            self.run_id,
            self.files_loaded,
            self.files_started,
            self.files_failed,
            self.rows_written,
            self.max_active_files,
            self.throttle_wait,
            self.elapsed
        )
    }
}
