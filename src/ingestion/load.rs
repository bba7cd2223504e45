//! Row-at-a-time loading of parsed records.

use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::store::{placeholders, quote_ident, Store};
use crate::types::{LoadStats, Record};

/// Append one row per record to `target`.
///
/// Values are taken in `columns` order; a field the record lacks is written as null. Rows
/// are inserted one at a time with no surrounding transaction: the first failing insert stops
/// the loop and rows already written stay in place ([`EngineError::Load`] reports how many).
pub fn load_records<'a, I>(
    store: &dyn Store,
    target: &str,
    columns: &[String],
    records: I,
) -> EngineResult<LoadStats>
where
    I: IntoIterator<Item = &'a Record>,
{
    let sql = insert_statement(target, columns);
    debug!(table = target, sql = %sql, "loading rows");

    let mut rows = 0usize;
    for record in records {
        let values = record.values_for(columns);
        store
            .execute(&sql, &values)
            .map_err(|source| EngineError::Load {
                target: target.to_owned(),
                rows_written: rows,
                source,
            })?;
        rows += 1;
    }

    info!(table = target, rows, "rows inserted");
    Ok(LoadStats { rows })
}

fn insert_statement(target: &str, columns: &[String]) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({column_list}) VALUES ({})",
        quote_ident(target),
        placeholders(columns.len())
    )
}
