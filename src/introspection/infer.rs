//! Type inference by sampling stored values.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::EngineResult;
use crate::store::{quote_ident, Store};
use crate::types::{InferredType, TypeMap, TypedColumns};

use super::columns_for;

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid integer regex"));
static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]+$").expect("valid decimal regex"));

/// Classify one sampled value.
///
/// - `^[0-9]+$` -> [`InferredType::Integer`]
/// - `^[0-9]+\.[0-9]+$` -> [`InferredType::Decimal`]
/// - anything else, including no value at all -> [`InferredType::Text`]
pub fn classify(value: Option<&str>) -> InferredType {
    match value {
        Some(v) if INTEGER.is_match(v) => InferredType::Integer,
        Some(v) if DECIMAL.is_match(v) => InferredType::Decimal,
        _ => InferredType::Text,
    }
}

/// Inferred type of every column of every target in `targets`.
///
/// Columns are discovered through the catalog (see [`columns_for`]); each column then costs
/// one sample query selecting a single non-null value cast to text. Nothing is cached, so the
/// result always reflects the current data.
pub fn types_for<S: AsRef<str>>(store: &dyn Store, targets: &[S]) -> EngineResult<TypeMap> {
    let columns = columns_for(store, targets)?;

    let mut out = TypeMap::new();
    for (target, cols) in columns {
        let mut typed = TypedColumns::default();
        for column in cols {
            let sampled = sample_one(store, &target, &column)?;
            let ty = classify(sampled.as_deref());
            debug!(table = %target, column = %column, inferred = %ty, "column classified");
            typed.push(column, ty);
        }
        out.insert(target, typed);
    }
    Ok(out)
}

fn sample_one(store: &dyn Store, target: &str, column: &str) -> EngineResult<Option<String>> {
    let col = quote_ident(column);
    let sql = format!(
        "SELECT CAST({col} AS TEXT) AS value FROM {} WHERE {col} IS NOT NULL LIMIT 1",
        quote_ident(target)
    );
    let rows = store.execute(&sql, &[])?;
    Ok(rows.first().and_then(|r| r.get("value")).map(str::to_owned))
}
