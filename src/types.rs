//! Core data model types.
//!
//! An [`UploadedFile`] is parsed into [`Record`]s, a [`Schema`] is derived from the first
//! record's field names and provisioned as a target table, and the records are loaded into it.
//! Introspection later reports columns ([`ColumnMap`]) and sampled [`InferredType`]s
//! ([`TypeMap`]).

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, Serializer};

use crate::error::{EngineError, EngineResult, ErrorKind};

/// One file handed to the engine: its identifying name and raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Identifying name, e.g. `orders.csv`. The target name is derived from it.
    pub name: String,
    /// Raw file content.
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Create a new uploaded file.
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("content_len", &self.content.len())
            .finish()
    }
}

/// One parsed data line: ordered field name -> raw text value.
///
/// Inserting a name that is already present overwrites the value in place, so duplicate
/// header names collapse to one field holding the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, Option<String>)>,
}

impl Record {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            fields: Vec::with_capacity(n),
        }
    }

    /// Set `name` to `value`, keeping the position of an existing field.
    pub fn insert(&mut self, name: &str, value: Option<String>) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name.to_owned(), value)),
        }
    }

    /// Value for `name`. Outer `None` means the field is absent, inner `None` means null.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_deref())
    }

    /// Field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Values for `columns`, in that order. Absent fields become null.
    pub fn values_for<'a>(&'a self, columns: &[String]) -> Vec<Option<&'a str>> {
        columns.iter().map(|c| self.get(c).flatten()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Declared storage type of a provisioned column.
///
/// Provisioning never infers types: every column is declared variable-length text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// `VARCHAR(n)`.
    Varchar(u32),
}

impl ColumnType {
    /// Column type used for every provisioned column.
    pub const DEFAULT: ColumnType = ColumnType::Varchar(255);

    /// SQL spelling of the type.
    pub fn sql(&self) -> String {
        match self {
            ColumnType::Varchar(n) => format!("VARCHAR({n})"),
        }
    }
}

/// A single named column in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Column name.
    pub name: String,
    /// Declared type.
    pub column_type: ColumnType,
}

impl Field {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Ordered columns of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Target (table) name.
    pub target: String,
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(target: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            target: target.into(),
            fields,
        }
    }

    /// Schema with every column declared as [`ColumnType::DEFAULT`].
    pub fn text_columns(target: impl Into<String>, columns: &[String]) -> Self {
        Self::new(
            target,
            columns
                .iter()
                .map(|c| Field::new(c.clone(), ColumnType::DEFAULT))
                .collect(),
        )
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn column_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

/// Best-effort classification of a column, derived by sampling one stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InferredType {
    Integer,
    Decimal,
    Text,
}

impl fmt::Display for InferredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InferredType::Integer => "integer",
            InferredType::Decimal => "decimal",
            InferredType::Text => "text",
        };
        f.write_str(s)
    }
}

/// Target name -> column names in definition order.
pub type ColumnMap = BTreeMap<String, Vec<String>>;

/// Target name -> column -> inferred type.
pub type TypeMap = BTreeMap<String, TypedColumns>;

/// Column -> [`InferredType`] for one target, in column definition order.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypedColumns {
    columns: Vec<(String, InferredType)>,
}

impl TypedColumns {
    pub fn push(&mut self, column: impl Into<String>, ty: InferredType) {
        self.columns.push((column.into(), ty));
    }

    pub fn get(&self, column: &str) -> Option<InferredType> {
        self.columns.iter().find(|(c, _)| c == column).map(|(_, t)| *t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, InferredType)> {
        self.columns.iter().map(|(c, t)| (c.as_str(), *t))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for TypedColumns {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.columns.iter().map(|(c, t)| (c, t)))
    }
}

/// Stats for one successfully loaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    /// Records written as rows.
    pub rows: usize,
}

/// Result of one file's ingestion unit.
#[derive(Debug)]
pub struct FileOutcome {
    /// Identifying name of the file.
    pub file_name: String,
    /// Target name derived from the file name.
    pub target: String,
    /// Rows written, or why the unit failed.
    pub result: EngineResult<LoadStats>,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&EngineError> {
        self.result.as_ref().err()
    }
}

/// Per-file outcomes of one `ingest` call, in input order.
#[derive(Debug, Default)]
pub struct IngestionReport {
    pub outcomes: Vec<FileOutcome>,
}

impl IngestionReport {
    /// Number of files loaded without error.
    pub fn loaded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    /// Number of files whose unit failed.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.loaded()
    }

    /// Total rows written by successful units.
    pub fn rows_written(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|s| s.rows)
            .sum()
    }

    /// Outcome for `file_name`, if it was part of the call.
    pub fn outcome(&self, file_name: &str) -> Option<&FileOutcome> {
        self.outcomes.iter().find(|o| o.file_name == file_name)
    }

    /// Serializable view for transport responses.
    pub fn summary(&self) -> IngestionSummary {
        IngestionSummary {
            loaded: self.loaded(),
            failed: self.failed(),
            files: self
                .outcomes
                .iter()
                .map(|o| match &o.result {
                    Ok(stats) => FileSummary {
                        file: o.file_name.clone(),
                        target: o.target.clone(),
                        status: FileStatus::Loaded,
                        rows: Some(stats.rows),
                        error: None,
                    },
                    Err(e) => FileSummary {
                        file: o.file_name.clone(),
                        target: o.target.clone(),
                        status: FileStatus::Failed,
                        rows: match e {
                            EngineError::Load { rows_written, .. } => Some(*rows_written),
                            _ => None,
                        },
                        error: Some(ErrorSummary::from(e)),
                    },
                })
                .collect(),
        }
    }
}

/// Serializable summary of an [`IngestionReport`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IngestionSummary {
    pub loaded: usize,
    pub failed: usize,
    pub files: Vec<FileSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Loaded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileSummary {
    pub file: String,
    pub target: String,
    pub status: FileStatus,
    /// Rows written; for a failed load, the rows written before the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ErrorSummary {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&EngineError> for ErrorSummary {
    fn from(e: &EngineError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}
