//! SQL dialect support.
//!
//! The generated script is executed by a separate database tool, so the
//! dialect only decides spelling: conflict clauses, foreign-key toggles and
//! identifier quoting.

mod sqlite;

use std::sync::LazyLock;

use regex::Regex;

pub use sqlite::SqliteDialect;

use crate::insert::ConflictPolicy;

static PLAIN_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid identifier regex"));

/// Returns `true` if `name` can be emitted without quoting.
#[must_use]
pub fn is_plain_identifier(name: &str) -> bool {
    PLAIN_IDENTIFIER.is_match(name)
}

/// Trait for SQL dialect-specific behavior.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Returns the statement prefix up to and including `INTO`.
    fn insert_prefix(&self, policy: ConflictPolicy) -> &'static str;

    /// Statement that disables foreign-key enforcement.
    fn disable_foreign_keys(&self) -> &'static str;

    /// Statement that re-enables foreign-key enforcement.
    fn enable_foreign_keys(&self) -> &'static str;

    /// Quotes an identifier unless it is a plain identifier.
    ///
    /// Embedded quote characters are doubled.
    fn quote_identifier(&self, name: &str) -> String {
        if is_plain_identifier(name) {
            return String::from(name);
        }
        let quote = self.identifier_quote();
        let doubled = format!("{quote}{quote}");
        let escaped = name.replace(quote, &doubled);
        format!("{quote}{escaped}{quote}")
    }
}
