//! Read-side introspection over loaded targets.
//!
//! Nothing here trusts stored metadata beyond column names: types are re-derived on every
//! call by sampling stored values.
//!
//! - [`columns_for()`]: column names per target, in definition order
//! - [`types_for()`]: sampled [`crate::types::InferredType`] per target column
//! - [`sample_column()`]: up to [`SAMPLE_LIMIT`] raw values of one column
//!
//! ## Example
//!
//! ```rust
//! use tabload::ingestion::{ingest_file, IngestionOptions};
//! use tabload::introspection::{columns_for, types_for};
//! use tabload::store::SqliteStore;
//! use tabload::types::{InferredType, UploadedFile};
//!
//! let store = SqliteStore::in_memory().unwrap();
//! let file = UploadedFile::new("orders.csv", "id,amount\n1,10.50\n2,7\n");
//! ingest_file(&store, &file, &IngestionOptions::default()).unwrap();
//!
//! let columns = columns_for(&store, &["orders"]).unwrap();
//! assert_eq!(columns["orders"], vec!["id", "amount"]);
//!
//! let types = types_for(&store, &["orders"]).unwrap();
//! assert_eq!(types["orders"].get("id"), Some(InferredType::Integer));
//! ```

pub mod columns;
pub mod infer;
pub mod sample;

pub use columns::columns_for;
pub use infer::{classify, types_for};
pub use sample::{sample_column, SAMPLE_LIMIT};
