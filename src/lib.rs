//! `tabload` ingests delimited text files with unknown schemas into a relational store and
//! answers introspection queries over what was loaded.
//!
//! Each uploaded file becomes a target table named after the file (extension stripped). The
//! first file seen for a name decides its columns: one generic text column per header field,
//! in header order. Types are never stored; they are re-derived on demand by sampling values.
//!
//! ## Quick example: ingest and introspect
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tabload::execution::{ExecutionOptions, IngestionEngine};
//! use tabload::ingestion::IngestionOptions;
//! use tabload::introspection::{sample_column, types_for};
//! use tabload::store::{IdentifierPolicy, SqliteStore, Store};
//! use tabload::types::{InferredType, UploadedFile};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory()?);
//! let engine = IngestionEngine::new(
//!     Arc::clone(&store),
//!     ExecutionOptions::default(),
//!     IngestionOptions::default(),
//! )?;
//!
//! let report = engine.ingest(&[
//!     UploadedFile::new("orders.csv", "id,amount,note\n1,10.50,first\n2,7,\n"),
//!     UploadedFile::new("empty.csv", "id\n"),
//! ])?;
//! assert_eq!(report.loaded(), 1);
//! assert_eq!(report.failed(), 1);
//!
//! let types = types_for(store.as_ref(), &["orders"])?;
//! assert_eq!(types["orders"].get("id"), Some(InferredType::Integer));
//! assert_eq!(types["orders"].get("amount"), Some(InferredType::Decimal));
//! assert_eq!(types["orders"].get("note"), Some(InferredType::Text));
//!
//! let ids = sample_column(store.as_ref(), "orders", "id", IdentifierPolicy::Quoted)?;
//! assert_eq!(ids.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: record parsing, provisioning, loading and the per-file unit
//! - [`execution`]: concurrent multi-file ingestion with throttling and metrics
//! - [`introspection`]: column lists, sampled types and raw samples
//! - [`service`]: transport facade taking comma-separated target lists
//! - [`store`]: the backing store seam and its SQLite / PostgreSQL backends
//! - [`config`] and [`logging`]: process configuration and `tracing` setup
//! - [`types`] and [`error`]: shared data model and the crate-wide error type

pub mod config;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod introspection;
pub mod logging;
pub mod service;
pub mod store;
pub mod types;

pub use error::{EngineError, EngineResult, ErrorKind};
