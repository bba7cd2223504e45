//! Idempotent target provisioning.

use tracing::{debug, info};

use crate::error::EngineResult;
use crate::introspection::columns_for;
use crate::store::{quote_ident, Store};
use crate::types::Schema;

/// Make sure a target matching `schema` exists.
///
/// Issues `CREATE TABLE IF NOT EXISTS`; an existing target is left untouched (no column is
/// added, widened or dropped). If the create fails but the target exists afterwards, another
/// caller won a concurrent create and this call succeeds.
pub fn ensure_target(store: &dyn Store, schema: &Schema) -> EngineResult<()> {
    let sql = create_statement(schema);
    match store.execute(&sql, &[]) {
        Ok(_) => {
            info!(table = %schema.target, columns = schema.fields.len(), "target ready");
            Ok(())
        }
        Err(e) => match stored_columns(store, &schema.target) {
            Ok(Some(_)) => {
                debug!(table = %schema.target, error = %e, "create lost a race; target exists");
                Ok(())
            }
            _ => Err(e.into()),
        },
    }
}

/// Columns currently stored for `target`, or `None` if the target does not exist.
pub fn stored_columns(store: &dyn Store, target: &str) -> EngineResult<Option<Vec<String>>> {
    let mut map = columns_for(store, &[target])?;
    Ok(map.remove(target))
}

fn create_statement(schema: &Schema) -> String {
    let defs = schema
        .fields
        .iter()
        .map(|f| format!("{} {}", quote_ident(&f.name), f.column_type.sql()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({defs})",
        quote_ident(&schema.target)
    )
}
