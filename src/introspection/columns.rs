//! Column listing from the store catalog.

use std::collections::BTreeSet;

use crate::error::{EngineError, EngineResult};
use crate::store::Store;
use crate::types::ColumnMap;

/// Column names for each of `targets`, grouped by target, in column definition order.
///
/// Duplicate target names are queried once. Results are keyed by the requested name, so a
/// case variant of a stored SQLite table reports that table's columns. Targets the catalog
/// does not know are absent from the result rather than an error.
pub fn columns_for<S: AsRef<str>>(store: &dyn Store, targets: &[S]) -> EngineResult<ColumnMap> {
    let unique: BTreeSet<&str> = targets.iter().map(|t| t.as_ref()).collect();
    if unique.is_empty() {
        return Err(EngineError::NoTargets);
    }

    let dialect = store.dialect();
    let params: Vec<Option<&str>> = unique.iter().map(|t| Some(*t)).collect();
    let rows = store.execute(&dialect.catalog_query(params.len()), &params)?;

    let mut out = ColumnMap::new();
    for row in &rows {
        let (Some(table), Some(column)) = (row.get("table_name"), row.get("column_name")) else {
            continue;
        };
        for requested in unique.iter().filter(|t| dialect.same_identifier(t, table)) {
            out.entry((*requested).to_owned())
                .or_default()
                .push(column.to_owned());
        }
    }
    Ok(out)
}
