//! SQLite dialect implementation.

use super::Dialect;
use crate::insert::ConflictPolicy;

/// SQLite dialect, as understood by Cloudflare D1.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn insert_prefix(&self, policy: ConflictPolicy) -> &'static str {
        match policy {
            ConflictPolicy::Strict => "INSERT INTO",
            ConflictPolicy::Replace => "INSERT OR REPLACE INTO",
            ConflictPolicy::Ignore => "INSERT OR IGNORE INTO",
        }
    }

    fn disable_foreign_keys(&self) -> &'static str {
        "PRAGMA foreign_keys = OFF;"
    }

    fn enable_foreign_keys(&self) -> &'static str {
        "PRAGMA foreign_keys = ON;"
    }
}
