//! Identifier handling for generated statements.
//!
//! Target and column names come straight from uploaded file names and header lines, so they
//! are always quoted, and checked against an [`IdentifierPolicy`] before use.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{EngineError, EngineResult};

/// Longest identifier accepted (PostgreSQL truncates beyond `NAMEDATALEN - 1`).
pub const MAX_IDENTIFIER_LEN: usize = 63;

static STRICT_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Which target/column names are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierPolicy {
    /// Any non-empty name without control characters, up to [`MAX_IDENTIFIER_LEN`] bytes.
    #[default]
    Quoted,
    /// Only `[A-Za-z_][A-Za-z0-9_]*`, up to [`MAX_IDENTIFIER_LEN`] bytes.
    Strict,
}

impl IdentifierPolicy {
    /// Check `name`, returning [`EngineError::InvalidIdentifier`] when it is not accepted.
    pub fn check(&self, name: &str) -> EngineResult<()> {
        if name.is_empty() {
            return Err(EngineError::invalid_identifier(name, "empty"));
        }
        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(EngineError::invalid_identifier(
                name,
                format!("longer than {MAX_IDENTIFIER_LEN} bytes"),
            ));
        }
        if name.chars().any(char::is_control) {
            return Err(EngineError::invalid_identifier(name, "contains control characters"));
        }
        if *self == IdentifierPolicy::Strict && !STRICT_IDENT.is_match(name) {
            return Err(EngineError::invalid_identifier(
                name,
                "only letters, digits and '_' allowed, not starting with a digit",
            ));
        }
        Ok(())
    }

    /// Check every name in `names`.
    pub fn check_all<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> EngineResult<()> {
        names.into_iter().try_for_each(|n| self.check(n))
    }
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
