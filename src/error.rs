use thiserror::Error;

use crate::store::StoreError;

/// Convenience result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Coarse classification of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or empty input text.
    Parse,
    /// Provisioning or loading failed in the backing store.
    Storage,
    /// Invalid or missing caller-supplied identifiers.
    Query,
    /// The ingestion call itself could not be dispatched.
    Ingestion,
}

/// Error type returned by ingestion and introspection.
///
/// This is a single error enum shared across parsing, provisioning, loading and the
/// introspection family. Use [`EngineError::kind`] to branch on the broad category.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The delimited text could not be decoded (bad UTF-8, unbalanced quotes, I/O).
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The file has a header but no data lines.
    #[error("no data rows found in '{file}'")]
    EmptyFile { file: String },

    /// Backing store failure outside of a row loop.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A row insert failed. Rows written before the failure stay in the target.
    #[error("loading '{target}' failed after {rows_written} row(s): {source}")]
    Load {
        target: String,
        rows_written: usize,
        #[source]
        source: StoreError,
    },

    /// The target already exists with a different column set.
    #[error("target '{target}' already has columns {existing:?}, file header is {incoming:?}")]
    SchemaConflict {
        target: String,
        existing: Vec<String>,
        incoming: Vec<String>,
    },

    /// An introspection call was made with no target names.
    #[error("no target names provided")]
    NoTargets,

    /// A target or column name is not usable as an identifier.
    #[error("invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },

    /// The named target does not exist.
    #[error("unknown target '{target}'")]
    UnknownTarget { target: String },

    /// The named column does not exist on the target.
    #[error("unknown column '{column}' on target '{target}'")]
    UnknownColumn { target: String, column: String },

    /// `ingest` was called with no files.
    #[error("no files received for ingestion")]
    NoFiles,

    /// Underlying I/O error while collecting input files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A glob pattern passed as an input could not be compiled.
    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// The ingestion worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl EngineError {
    /// Broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Csv(_) | EngineError::EmptyFile { .. } => ErrorKind::Parse,
            EngineError::Store(_) | EngineError::Load { .. } | EngineError::SchemaConflict { .. } => {
                ErrorKind::Storage
            }
            EngineError::NoTargets
            | EngineError::InvalidIdentifier { .. }
            | EngineError::UnknownTarget { .. }
            | EngineError::UnknownColumn { .. } => ErrorKind::Query,
            EngineError::NoFiles
            | EngineError::Io(_)
            | EngineError::Pattern(_)
            | EngineError::ThreadPool(_) => ErrorKind::Ingestion,
        }
    }

    pub(crate) fn invalid_identifier(name: &str, reason: impl Into<String>) -> Self {
        EngineError::InvalidIdentifier {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }
}
