//! Legacy JSON export to SQL import script.
//!
//! `d1port` reads one JSON export per table, maps each row onto the
//! destination schema and writes a single SQL script of INSERT statements
//! that can be replayed against a D1/SQLite database.
//!
//! # Architecture
//!
//! - **Reader** - Locates and parses per-table exports
//! - **Mapper** - Pairs source keys with destination columns
//! - **Transformer** - Applies value rules and resolves literal types
//! - **Emitter** - Writes the script
//! - **Pipeline** - Drives the above table by table
//!
//! The static side (tables, order, mappings, rules and policies) is a
//! [`MigrationConfig`](config::MigrationConfig), validated once when it is
//! built.
//!
//! # Example
//!
//! ```rust
//! use d1port::prelude::*;
//!
//! let config = MigrationConfig::builder()
//!     .table(TableSpec::new("users").rename("preferred_language", "language_preference"))
//!     .rule("users", ValueRule::locale("language_preference"))
//!     .build()
//!     .unwrap();
//! let source = MemorySource::new().with(
//!     "users",
//!     r#"[{"id": 1, "preferred_language": "en-US"}]"#,
//! );
//!
//! let mut sql = Vec::new();
//! let summary = Pipeline::new(&config, &source, SqliteDialect::new())
//!     .run(&mut sql)
//!     .unwrap();
//!
//! assert_eq!(summary.total_rows(), 1);
//! assert!(String::from_utf8(sql).unwrap().contains(
//!     "INSERT OR IGNORE INTO users (id, language_preference) VALUES (1, 'en');"
//! ));
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Write the import script for a directory of {table}_raw.json files
//! d1port generate --input-dir exports --output import.sql
//!
//! # Show the resolved table order, mappings and rules
//! d1port plan
//! ```

pub mod config;
pub mod emitter;
pub mod error;
pub mod mapper;
pub mod order;
pub mod pipeline;
pub mod plan;
pub mod profile;
pub mod reader;
pub mod row;
pub mod transform;

/// Prelude for convenient imports.
pub mod prelude {
    pub use d1port_sql::{ConflictPolicy, LiteralStyle, SqliteDialect};

    pub use crate::config::{
        ColumnLayout, Header, MigrationConfig, MigrationConfigBuilder, OrderMode, TableSpec,
    };
    pub use crate::error::{ConfigError, ExportError, PortError, Result, SkipReason};
    pub use crate::mapper::{ColumnPlan, SchemaMapper};
    pub use crate::order::EmissionOrder;
    pub use crate::pipeline::{Pipeline, RunSummary, TableOutcome, TableReport};
    pub use crate::plan::PlanReport;
    pub use crate::reader::{DirectorySource, ExportNaming, ExportSource, MemorySource};
    pub use crate::row::{RawValue, Row};
    pub use crate::transform::{LocalePolicy, ValueRule, ValueRules, ValueTransformer};
}
