//! Raw value sampling for a single column.

use crate::error::{EngineError, EngineResult};
use crate::store::{quote_ident, IdentifierPolicy, Store};

use super::columns_for;

/// Maximum number of values returned by [`sample_column`].
pub const SAMPLE_LIMIT: usize = 10;

/// Up to [`SAMPLE_LIMIT`] stored values of `target.column`, nulls included.
///
/// Both names must pass `policy`, the same check applied to them at ingestion time.
///
/// No ordering clause is applied: rows come back in the store's default order. Both names
/// are validated and looked up in the catalog first, so a typo surfaces as
/// [`EngineError::UnknownTarget`] / [`EngineError::UnknownColumn`].
pub fn sample_column(
    store: &dyn Store,
    target: &str,
    column: &str,
    policy: IdentifierPolicy,
) -> EngineResult<Vec<Option<String>>> {
    policy.check(target)?;
    policy.check(column)?;

    let known = columns_for(store, &[target])?;
    let Some(columns) = known.get(target) else {
        return Err(EngineError::UnknownTarget {
            target: target.to_owned(),
        });
    };
    if !columns.iter().any(|c| c == column) {
        return Err(EngineError::UnknownColumn {
            target: target.to_owned(),
            column: column.to_owned(),
        });
    }

    let sql = format!(
        "SELECT CAST({} AS TEXT) AS value FROM {} LIMIT {SAMPLE_LIMIT}",
        quote_ident(column),
        quote_ident(target)
    );
    let rows = store.execute(&sql, &[])?;
    Ok(rows
        .into_iter()
        .map(|r| r.into_values().into_iter().next().flatten())
        .collect())
}
