//! SQLite backend.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

use super::{Dialect, Row, Store, StoreError, StoreResult};

/// SQLite-backed [`Store`].
///
/// One connection behind a mutex; statements from concurrent callers are serialized.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a private in-memory database.
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch("PRAGMA busy_timeout=5000;")?;
        Ok(())
    }
}

impl Store for SqliteStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&self, sql: &str, params: &[Option<&str>]) -> StoreResult<Vec<Row>> {
        debug!(sql, params = params.len(), "sqlite execute");
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let mut stmt = conn.prepare(sql)?;

        if stmt.column_count() == 0 {
            stmt.execute(params_from_iter(params.iter()))?;
            return Ok(Vec::new());
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut fields = Vec::with_capacity(columns.len());
            for (idx, name) in columns.iter().enumerate() {
                fields.push((name.clone(), value_to_text(row.get_ref(idx)?)));
            }
            out.push(Row::new(fields));
        }
        Ok(out)
    }
}

fn value_to_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(b) | ValueRef::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
    }
}
