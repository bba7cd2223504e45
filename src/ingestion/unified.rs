//! One ingestion unit: a single uploaded file, end to end.
//!
//! [`ingest_file`] derives the target name, parses the file, provisions the target from the
//! first record's field names and loads every record. Multi-file, concurrent ingestion lives
//! in [`crate::execution::IngestionEngine`], which runs one of these units per file.
//!
//! If an [`IngestionObserver`] is configured, success/failure/alerts are reported to it.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::store::{IdentifierPolicy, Store};
use crate::types::{LoadStats, Schema, UploadedFile};

use super::csv::{read_records, CsvOptions};
use super::load::load_records;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity};
use super::provision::{ensure_target, stored_columns};

/// What to do when a target already exists with a different column set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Fail the file's unit with [`EngineError::SchemaConflict`] before writing any row.
    #[default]
    Reject,
    /// Keep the existing columns. Rows are matched by field name: fields the target lacks
    /// are dropped and columns the file lacks are written as null.
    FirstWins,
}

/// Options controlling a file's ingestion unit.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// File extensions stripped from file names to form target names (case-insensitive).
    pub extensions: Vec<String>,
    /// CSV dialect.
    pub csv: CsvOptions,
    /// Which target/column names are accepted.
    pub identifiers: IdentifierPolicy,
    /// Behavior when the target exists with other columns.
    pub collisions: CollisionPolicy,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("extensions", &self.extensions)
            .field("csv", &self.csv)
            .field("identifiers", &self.identifiers)
            .field("collisions", &self.collisions)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["csv".to_string()],
            csv: CsvOptions::default(),
            identifiers: IdentifierPolicy::default(),
            collisions: CollisionPolicy::default(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Target name for a file: its base name with a recognized extension removed.
///
/// Names without a recognized extension are used as-is.
pub fn target_name(file_name: &str, extensions: &[String]) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    match base.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) =>
        {
            stem.to_string()
        }
        _ => base.to_string(),
    }
}

/// Ingest one file into the target derived from its name.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row count stats
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Example
///
/// ```rust
/// use tabload::ingestion::{ingest_file, IngestionOptions};
/// use tabload::store::SqliteStore;
/// use tabload::types::UploadedFile;
///
/// let store = SqliteStore::in_memory().unwrap();
/// let file = UploadedFile::new("people.csv", "id,name\n1,Ada\n2,Grace\n");
/// let stats = ingest_file(&store, &file, &IngestionOptions::default()).unwrap();
/// assert_eq!(stats.rows, 2);
/// ```
pub fn ingest_file(
    store: &dyn Store,
    file: &UploadedFile,
    options: &IngestionOptions,
) -> EngineResult<LoadStats> {
    let ctx = IngestionContext {
        file_name: file.name.clone(),
        target: target_name(&file.name, &options.extensions),
    };

    let result = run_unit(store, file, &ctx.target, options);

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(stats) => obs.on_success(&ctx, *stats),
            Err(e) => {
                let sev = IngestionSeverity::for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

fn run_unit(
    store: &dyn Store,
    file: &UploadedFile,
    target: &str,
    options: &IngestionOptions,
) -> EngineResult<LoadStats> {
    options.identifiers.check(target)?;

    let records = read_records(&file.content, &options.csv)?;
    let Some(first) = records.first() else {
        return Err(EngineError::EmptyFile {
            file: file.name.clone(),
        });
    };

    let columns: Vec<String> = first.field_names().map(str::to_owned).collect();
    options.identifiers.check_all(columns.iter().map(String::as_str))?;

    ensure_target(store, &Schema::text_columns(target, &columns))?;

    let existing = stored_columns(store, target)?.ok_or_else(|| EngineError::UnknownTarget {
        target: target.to_owned(),
    })?;

    let load_columns = if existing == columns {
        columns
    } else {
        match options.collisions {
            CollisionPolicy::Reject => {
                return Err(EngineError::SchemaConflict {
                    target: target.to_owned(),
                    existing,
                    incoming: columns,
                });
            }
            CollisionPolicy::FirstWins => {
                let dropped: Vec<&str> = columns
                    .iter()
                    .filter(|c| !existing.contains(c))
                    .map(String::as_str)
                    .collect();
                if !dropped.is_empty() {
                    warn!(file = %file.name, table = target, ?dropped, "fields unknown to target dropped");
                }
                existing
            }
        }
    };

    load_records(store, target, &load_columns, &records)
}

#[cfg(test)]
mod tests {
    use super::target_name;

    fn exts() -> Vec<String> {
        vec!["csv".to_string(), "tsv".to_string()]
    }

    #[test]
    fn strips_recognized_extension_case_insensitively() {
        assert_eq!(target_name("orders.csv", &exts()), "orders");
        assert_eq!(target_name("Orders.CSV", &exts()), "Orders");
        assert_eq!(target_name("data.tsv", &exts()), "data");
    }

    #[test]
    fn keeps_unrecognized_extensions_and_inner_dots() {
        assert_eq!(target_name("orders.txt", &exts()), "orders.txt");
        assert_eq!(target_name("sales.2024.csv", &exts()), "sales.2024");
        assert_eq!(target_name("noext", &exts()), "noext");
        assert_eq!(target_name(".csv", &exts()), ".csv");
    }

    #[test]
    fn drops_directory_components() {
        assert_eq!(target_name("uploads/orders.csv", &exts()), "orders");
        assert_eq!(target_name("C:\\tmp\\orders.csv", &exts()), "orders");
    }
}
