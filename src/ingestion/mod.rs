//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`crate::execution::IngestionEngine::ingest`], which runs one
//! [`ingest_file`] unit per file on a worker pool. A unit:
//!
//! - derives the target name from the file name ([`target_name`])
//! - parses the delimited text into records ([`csv`])
//! - provisions the target from the first record's field names ([`provision`])
//! - appends one row per record ([`load`])
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]

pub mod csv;
pub mod files;
pub mod load;
pub mod observability;
pub mod provision;
pub mod unified;

pub use csv::{read_records, CsvOptions, RecordReader};
pub use files::{collect_files, load_files};
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity,
    TracingObserver,
};
pub use unified::{ingest_file, target_name, CollisionPolicy, IngestionOptions};
