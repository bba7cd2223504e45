//! PostgreSQL backend (feature `postgres`).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};

use postgres::types::ToSql;
use postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::{debug, info};

use super::{Dialect, Row, Store, StoreError, StoreResult};

/// PostgreSQL-backed [`Store`].
///
/// Holds a fixed set of connections, each behind its own mutex. A call takes the first idle
/// connection starting from a rotating offset, and waits on that offset's connection when
/// all are busy.
pub struct PostgresStore {
    clients: Vec<Mutex<Client>>,
    next: AtomicUsize,
}

impl PostgresStore {
    /// Open `size` connections (at least one) to `dsn`.
    pub fn connect(dsn: &str, size: usize) -> StoreResult<Self> {
        let size = size.max(1);
        let mut clients = Vec::with_capacity(size);
        for _ in 0..size {
            clients.push(Mutex::new(Client::connect(dsn, NoTls)?));
        }
        info!(connections = size, "postgres store connected");
        Ok(Self {
            clients,
            next: AtomicUsize::new(0),
        })
    }

    fn checkout(&self) -> StoreResult<MutexGuard<'_, Client>> {
        let n = self.clients.len();
        let start = self.next.fetch_add(1, Ordering::Relaxed) % n;
        for i in 0..n {
            match self.clients[(start + i) % n].try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(_)) => return Err(StoreError::Poisoned),
            }
        }
        self.clients[start].lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Store for PostgresStore {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn execute(&self, sql: &str, params: &[Option<&str>]) -> StoreResult<Vec<Row>> {
        debug!(sql, params = params.len(), "postgres execute");
        let mut client = self.checkout()?;

        // Without parameters the simple protocol returns every value as text already.
        if params.is_empty() {
            let mut out = Vec::new();
            for msg in client.simple_query(sql)? {
                if let SimpleQueryMessage::Row(row) = msg {
                    let fields = row
                        .columns()
                        .iter()
                        .enumerate()
                        .map(|(idx, col)| (col.name().to_owned(), row.get(idx).map(str::to_owned)))
                        .collect();
                    out.push(Row::new(fields));
                }
            }
            return Ok(out);
        }

        let bound: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        let rows = client.query(sql, &bound)?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let mut fields = Vec::with_capacity(row.len());
            for (idx, col) in row.columns().iter().enumerate() {
                let value: Option<String> = row.try_get(idx)?;
                fields.push((col.name().to_owned(), value));
            }
            out.push(Row::new(fields));
        }
        Ok(out)
    }
}
