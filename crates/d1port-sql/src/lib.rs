//! # d1port-sql
//!
//! SQL text generation for `d1port`: inline literal encoding, single-row
//! INSERT statements with an explicit conflict policy, and the dialect hooks
//! that bracket an import script.
//!
//! ## Example
//!
//! ```rust
//! use d1port_sql::{ConflictPolicy, Insert, LiteralStyle, SqliteDialect, ToSqlValue};
//!
//! let sql = Insert::new()
//!     .into_table("users")
//!     .on_conflict(ConflictPolicy::Ignore)
//!     .columns(&["id", "name"])
//!     .values(vec![1_i64.to_sql_value(), "it's me".to_sql_value()])
//!     .to_sql_inline(&SqliteDialect::new(), LiteralStyle::default());
//!
//! assert_eq!(sql, "INSERT OR IGNORE INTO users (id, name) VALUES (1, 'it''s me');");
//! ```

pub mod dialect;
pub mod insert;
pub mod value;

pub use dialect::{Dialect, SqliteDialect};
pub use insert::{ConflictPolicy, Insert};
pub use value::{LiteralStyle, SqlValue, ToSqlValue};
