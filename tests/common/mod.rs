#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tabload::execution::{ExecutionOptions, IngestionEngine};
use tabload::ingestion::IngestionOptions;
use tabload::store::{Dialect, Row, SqliteStore, Store, StoreError, StoreResult};

pub fn sqlite() -> Arc<dyn Store> {
    Arc::new(SqliteStore::in_memory().unwrap())
}

pub fn engine(store: Arc<dyn Store>, opts: IngestionOptions) -> IngestionEngine {
    IngestionEngine::new(
        store,
        ExecutionOptions {
            num_threads: Some(4),
            max_in_flight_files: 4,
        },
        opts,
    )
    .unwrap()
}

pub fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// All rows of `target` as text, ordered by insertion.
pub fn dump(store: &dyn Store, target: &str) -> Vec<Vec<Option<String>>> {
    store
        .execute(&format!("SELECT * FROM \"{target}\" ORDER BY rowid"), &[])
        .unwrap()
        .into_iter()
        .map(Row::into_values)
        .collect()
}

/// Wraps a store, recording every statement and optionally failing some of them.
pub struct ScriptedStore {
    inner: Arc<dyn Store>,
    statements: Mutex<Vec<String>>,
    inserts_seen: AtomicUsize,
    /// Fail the insert with this zero-based index (counted across all targets).
    pub fail_insert_at: Option<usize>,
    /// Fail every `CREATE TABLE` statement.
    pub fail_create: bool,
}

impl ScriptedStore {
    pub fn new(inner: Arc<dyn Store>) -> Self {
        Self {
            inner,
            statements: Mutex::new(Vec::new()),
            inserts_seen: AtomicUsize::new(0),
            fail_insert_at: None,
            fail_create: false,
        }
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    pub fn count_starting_with(&self, prefix: &str) -> usize {
        self.statements()
            .iter()
            .filter(|s| s.starts_with(prefix))
            .count()
    }
}

impl Store for ScriptedStore {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    fn execute(&self, sql: &str, params: &[Option<&str>]) -> StoreResult<Vec<Row>> {
        self.statements.lock().unwrap().push(sql.to_string());
        if self.fail_create && sql.starts_with("CREATE TABLE") {
            return Err(StoreError::Backend {
                message: "permission denied".into(),
            });
        }
        if sql.starts_with("INSERT") {
            let idx = self.inserts_seen.fetch_add(1, Ordering::SeqCst);
            if self.fail_insert_at == Some(idx) {
                return Err(StoreError::Backend {
                    message: "value too long for type character varying(255)".into(),
                });
            }
        }
        self.inner.execute(sql, params)
    }
}
