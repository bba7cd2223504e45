//! Transport-facing facade over the engine.
//!
//! [`TableService`] exposes the four operations a transport (HTTP handler, CLI) needs, taking
//! inputs in their raw transport shape: target lists arrive as one comma-separated string.
//! Every result type serializes with `serde`; [`to_json`] renders one.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::execution::{ExecutionOptions, IngestionEngine};
use crate::ingestion::IngestionOptions;
use crate::introspection;
use crate::store::Store;
use crate::types::{ColumnMap, ErrorSummary, IngestionSummary, TypeMap, UploadedFile};

/// Split a comma-separated target list, trimming entries and dropping empty ones.
///
/// ```rust
/// use tabload::service::parse_target_list;
///
/// assert_eq!(parse_target_list(" orders, ,people,"), vec!["orders", "people"]);
/// assert!(parse_target_list(" , ").is_empty());
/// ```
pub fn parse_target_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Engine facade shared by transports.
pub struct TableService {
    engine: IngestionEngine,
}

impl TableService {
    pub fn new(engine: IngestionEngine) -> Self {
        Self { engine }
    }

    /// Service with default execution and ingestion options.
    pub fn with_defaults(store: Arc<dyn Store>) -> EngineResult<Self> {
        Ok(Self::new(IngestionEngine::new(
            store,
            ExecutionOptions::default(),
            IngestionOptions::default(),
        )?))
    }

    pub fn engine(&self) -> &IngestionEngine {
        &self.engine
    }

    fn store(&self) -> &dyn Store {
        self.engine.store().as_ref()
    }

    /// Ingest uploaded files. Per-file failures are reported in the summary, not as an error.
    pub fn ingest(&self, files: &[UploadedFile]) -> EngineResult<IngestionSummary> {
        let report = self.engine.ingest(files)?;
        debug!(loaded = report.loaded(), failed = report.failed(), "ingest request done");
        Ok(report.summary())
    }

    /// Column names per target, from a comma-separated list.
    pub fn list_columns(&self, targets: &str) -> EngineResult<ColumnMap> {
        introspection::columns_for(self.store(), &parse_target_list(targets))
    }

    /// Sampled column types per target, from a comma-separated list.
    pub fn infer_types(&self, targets: &str) -> EngineResult<TypeMap> {
        introspection::types_for(self.store(), &parse_target_list(targets))
    }

    /// Up to ten raw values of one column.
    pub fn sample_column(&self, target: &str, column: &str) -> EngineResult<Vec<Option<String>>> {
        introspection::sample_column(
            self.store(),
            target.trim(),
            column.trim(),
            self.engine.ingestion_options().identifiers,
        )
    }
}

/// Error body for transports: `{"error": {"kind": ..., "message": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorSummary,
}

impl From<&EngineError> for ErrorResponse {
    fn from(e: &EngineError) -> Self {
        Self {
            error: ErrorSummary::from(e),
        }
    }
}

/// Pretty JSON for any response body.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}
