//! Process configuration for the backing store.
//!
//! Values come from environment variables; every variable has a default so an empty
//! environment yields an in-memory SQLite store.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `DB_BACKEND` | `sqlite` | `sqlite` or `postgres` |
//! | `DB_PATH` | `:memory:` | SQLite database file |
//! | `DB_HOST` | `localhost` | PostgreSQL host |
//! | `DB_PORT` | `5432` | PostgreSQL port |
//! | `DB_NAME` | `sample` | PostgreSQL database |
//! | `DB_USER` | `postgres` | PostgreSQL user |
//! | `DB_PASSWORD` | empty | PostgreSQL password |
//! | `DB_POOL_SIZE` | `4` | connections held by the store |

use std::fmt;

use thiserror::Error;

/// Configuration errors (unknown backend, unparsable number).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown DB_BACKEND '{0}' (expected 'sqlite' or 'postgres')")]
    UnknownBackend(String),
    #[error("invalid value for {var}: '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

/// PostgreSQL connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl PostgresConfig {
    /// Key/value connection string understood by the `postgres` crate.
    pub fn connection_string(&self) -> String {
        let mut s = format!(
            "host={} port={} dbname={} user={}",
            self.host, self.port, self.database, self.user
        );
        if !self.password.is_empty() {
            let escaped = self.password.replace('\\', "\\\\").replace('\'', "\\'");
            s.push_str(&format!(" password='{escaped}'"));
        }
        s
    }
}

impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password_set", &!self.password.is_empty())
            .finish()
    }
}

/// Which backend to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// SQLite file, or `:memory:`.
    Sqlite { path: String },
    /// PostgreSQL server (requires the `postgres` feature at open time).
    Postgres(PostgresConfig),
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: Backend,
    /// Connections held by the store (ignored by SQLite).
    pub pool_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite {
                path: ":memory:".to_string(),
            },
            pool_size: 4,
        }
    }
}

impl StoreConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup` (returns `None` for unset variables).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let pool_size = parse_number::<usize>("DB_POOL_SIZE", &get("DB_POOL_SIZE", "4"))?;
        let backend = match get("DB_BACKEND", "sqlite").to_ascii_lowercase().as_str() {
            "sqlite" => Backend::Sqlite {
                path: get("DB_PATH", ":memory:"),
            },
            "postgres" | "postgresql" => Backend::Postgres(PostgresConfig {
                host: get("DB_HOST", "localhost"),
                port: parse_number::<u16>("DB_PORT", &get("DB_PORT", "5432"))?,
                database: get("DB_NAME", "sample"),
                user: get("DB_USER", "postgres"),
                password: get("DB_PASSWORD", ""),
            }),
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        Ok(Self { backend, pool_size })
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })
}
