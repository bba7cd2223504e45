//! Backing-store access.
//!
//! Everything the engine needs from a relational store goes through the narrow [`Store`]
//! trait: execute one statement with positional text parameters (`$1`, `$2`, ...) and get the
//! result rows back. Values cross this boundary as text (`Option<String>`), which matches how
//! targets are provisioned (every column is a variable-length text column).
//!
//! Backends:
//!
//! - [`SqliteStore`]: in-memory or file database via `rusqlite`
//! - `PostgresStore`: PostgreSQL via the `postgres` crate (Cargo feature `postgres`)
//!
//! Use [`open`] to build a shared handle from a [`crate::config::StoreConfig`].

mod ident;
#[cfg(feature = "postgres")]
mod pg;
mod sqlite;

use std::sync::Arc;

use thiserror::Error;

use crate::config::{Backend, StoreConfig};

pub use ident::{quote_ident, IdentifierPolicy, MAX_IDENTIFIER_LEN};
#[cfg(feature = "postgres")]
pub use pg::PostgresStore;
pub use sqlite::SqliteStore;

/// Convenience result type for store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a [`Store`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite backend error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    /// PostgreSQL backend error (feature-gated behind `postgres`).
    #[error("postgres error: {0}")]
    Postgres(#[from] ::postgres::Error),

    /// A connection lock was poisoned by a panicking holder.
    #[error("store connection lock poisoned")]
    Poisoned,

    /// The configured backend was not compiled in.
    #[error("store backend '{0}' not enabled (enable cargo feature '{0}')")]
    BackendDisabled(&'static str),

    /// Backend-specific failure without a richer error type.
    #[error("backend error: {message}")]
    Backend { message: String },
}

impl StoreError {
    /// Whether this error points at the connection itself rather than one statement.
    pub fn is_connection_failure(&self) -> bool {
        match self {
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::CannotOpen
                    | rusqlite::ErrorCode::NotADatabase
                    | rusqlite::ErrorCode::DatabaseCorrupt
                    | rusqlite::ErrorCode::SystemIoFailure
            ),
            StoreError::Sqlite(_) => false,
            #[cfg(feature = "postgres")]
            StoreError::Postgres(e) => e.is_closed(),
            StoreError::Poisoned | StoreError::BackendDisabled(_) => true,
            StoreError::Backend { .. } => false,
        }
    }
}

/// SQL dialect spoken by a [`Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Catalog query listing `(table_name, column_name)` for `target_count` targets.
    ///
    /// Targets are bound as `$1..$n` and matched the way the dialect resolves table names
    /// (case-insensitively on SQLite). Rows come back ordered by stored target name, then by
    /// the column's definition ordinal.
    pub fn catalog_query(&self, target_count: usize) -> String {
        let placeholders = placeholders(target_count);
        match self {
            Dialect::Sqlite => format!(
                "SELECT m.name AS table_name, p.name AS column_name \
                 FROM sqlite_master AS m JOIN pragma_table_info(m.name) AS p \
                 WHERE m.type = 'table' AND m.name COLLATE NOCASE IN ({placeholders}) \
                 ORDER BY m.name, p.cid"
            ),
            Dialect::Postgres => format!(
                "SELECT table_name::text AS table_name, column_name::text AS column_name \
                 FROM information_schema.columns \
                 WHERE table_schema = current_schema() AND table_name::text IN ({placeholders}) \
                 ORDER BY table_name, ordinal_position"
            ),
        }
    }

    /// Whether `requested` names the stored table `stored`.
    ///
    /// SQLite folds ASCII case in table names; quoted PostgreSQL identifiers are exact.
    pub fn same_identifier(&self, requested: &str, stored: &str) -> bool {
        match self {
            Dialect::Sqlite => requested.eq_ignore_ascii_case(stored),
            Dialect::Postgres => requested == stored,
        }
    }
}

/// `$1, $2, ..., $n`.
pub fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("${i}")).collect::<Vec<_>>().join(", ")
}

/// One result row: ordered `(column name, text value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, Option<String>)>,
}

impl Row {
    pub fn new(fields: Vec<(String, Option<String>)>) -> Self {
        Self { fields }
    }

    /// Value of the named column. `None` when the column is absent or null.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Value at `idx`, in select-list order.
    pub fn get_idx(&self, idx: usize) -> Option<&str> {
        self.fields.get(idx).and_then(|(_, v)| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_values(self) -> Vec<Option<String>> {
        self.fields.into_iter().map(|(_, v)| v).collect()
    }
}

/// Connection-pool-like handle to the backing store.
///
/// Implementations manage their own internal concurrency; the engine shares one handle
/// (typically `Arc<dyn Store>`) across every component and worker.
pub trait Store: Send + Sync {
    /// Dialect used to build catalog queries.
    fn dialect(&self) -> Dialect;

    /// Execute one statement, binding `params` positionally to `$1..$n`.
    ///
    /// Statements that produce no result set return an empty vector.
    fn execute(&self, sql: &str, params: &[Option<&str>]) -> StoreResult<Vec<Row>>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn execute(&self, sql: &str, params: &[Option<&str>]) -> StoreResult<Vec<Row>> {
        (**self).execute(sql, params)
    }
}

/// Open the store described by `config`.
pub fn open(config: &StoreConfig) -> StoreResult<Arc<dyn Store>> {
    match &config.backend {
        Backend::Sqlite { path } => {
            let store = if path == ":memory:" {
                SqliteStore::in_memory()?
            } else {
                SqliteStore::open(path)?
            };
            Ok(Arc::new(store))
        }
        #[cfg(feature = "postgres")]
        Backend::Postgres(pg) => Ok(Arc::new(PostgresStore::connect(
            &pg.connection_string(),
            config.pool_size,
        )?)),
        #[cfg(not(feature = "postgres"))]
        Backend::Postgres(_) => Err(StoreError::BackendDisabled("postgres")),
    }
}
