//! Concurrent multi-file ingestion with configurable parallelism.
//!
//! This module sits "above" [`crate::ingestion`] and provides:
//!
//! - Parallel execution of one [`ingest_file`] unit per file on a dedicated worker pool
//! - Resource limits / throttling (files loading at once)
//! - Real-time metrics + observer hooks for monitoring
//!
//! Units are independent: a failing file never stops the others, and its failure is reported
//! in the returned [`IngestionReport`] rather than failing the call.

mod observer;
mod semaphore;

use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use crate::error::{EngineError, EngineResult};
use crate::ingestion::{ingest_file, target_name, IngestionOptions};
use crate::store::Store;
use crate::types::{FileOutcome, IngestionReport, UploadedFile};

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, TracingExecutionObserver,
};

use semaphore::Semaphore;

/// Configuration for the [`IngestionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Upper bound on files loading at once.
    ///
    /// This is an additional throttle on top of `num_threads`, typically set to the store's
    /// connection pool size. Zero is treated as one.
    pub max_in_flight_files: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = available_threads();
        Self {
            num_threads: Some(n),
            max_in_flight_files: n,
        }
    }
}

fn available_threads() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Runs ingestion requests against a shared store.
pub struct IngestionEngine {
    store: Arc<dyn Store>,
    pool: ThreadPool,
    opts: ExecutionOptions,
    ingestion: IngestionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl IngestionEngine {
    /// Create a new engine bound to `store`.
    ///
    /// Fails only if the worker pool cannot be started.
    pub fn new(
        store: Arc<dyn Store>,
        opts: ExecutionOptions,
        ingestion: IngestionOptions,
    ) -> EngineResult<Self> {
        let n_threads = opts.num_threads.unwrap_or_else(available_threads).max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|i| format!("tabload-ingest-{i}"))
            .build()?;

        Ok(Self {
            store,
            pool,
            opts,
            ingestion,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to execution metrics accumulated over every run of this engine.
    ///
    /// Per-run figures are published in [`ExecutionEvent::RunFinished`].
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// The store this engine writes to.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Per-file options used for every unit.
    pub fn ingestion_options(&self) -> &IngestionOptions {
        &self.ingestion
    }

    /// Ingest every file, each into the target derived from its name.
    ///
    /// Returns [`EngineError::NoFiles`] when `files` is empty. Otherwise always returns a
    /// report with one outcome per file, in input order, whatever the individual outcomes.
    pub fn ingest(&self, files: &[UploadedFile]) -> EngineResult<IngestionReport> {
        if files.is_empty() {
            return Err(EngineError::NoFiles);
        }
        Ok(self.pool.install(|| self.ingest_impl(files)))
    }

    fn ingest_impl(&self, files: &[UploadedFile]) -> IngestionReport {
        let start = Instant::now();
        let run = ExecutionMetrics::for_run(self.metrics.begin_run());
        let counters = [&run, self.metrics.as_ref()];
        self.emit(ExecutionEvent::RunStarted { files: files.len() });

        let sem = Semaphore::new(self.opts.max_in_flight_files);

        let outcomes: Vec<FileOutcome> = files
            .par_iter()
            .map(|file| {
                let permit = sem.acquire();
                let waited = permit.waited();
                if waited > Duration::ZERO {
                    counters.iter().for_each(|m| m.on_throttle_wait(waited));
                    self.emit(ExecutionEvent::ThrottleWaited { duration: waited });
                }

                counters.iter().for_each(|m| m.on_file_start());
                self.emit(ExecutionEvent::FileStarted {
                    file_name: file.name.clone(),
                });

                let result = ingest_file(self.store.as_ref(), file, &self.ingestion);

                match &result {
                    Ok(stats) => {
                        counters.iter().for_each(|m| m.on_file_end(true, stats.rows));
                        self.emit(ExecutionEvent::FileFinished {
                            file_name: file.name.clone(),
                            rows: stats.rows,
                        });
                    }
                    Err(e) => {
                        let rows = rows_left_behind(e);
                        counters.iter().for_each(|m| m.on_file_end(false, rows));
                        self.emit(ExecutionEvent::FileFailed {
                            file_name: file.name.clone(),
                            error: e.to_string(),
                        });
                    }
                }
                drop(permit);

                FileOutcome {
                    file_name: file.name.clone(),
                    target: target_name(&file.name, &self.ingestion.extensions),
                    result,
                }
            })
            .collect();

        let elapsed = start.elapsed();
        counters.iter().for_each(|m| m.end_run(elapsed));
        self.emit(ExecutionEvent::RunFinished {
            elapsed,
            metrics: run.snapshot(),
        });

        IngestionReport { outcomes }
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

fn rows_left_behind(e: &EngineError) -> usize {
    match e {
        EngineError::Load { rows_written, .. } => *rows_written,
        _ => 0,
    }
}
