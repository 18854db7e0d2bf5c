//! Error types for the export-to-SQL pipeline.

use std::path::PathBuf;

use serde::Serialize;

/// Errors that abort a run.
///
/// Per-table export problems are not in this list: they are reported as
/// [`ExportError`] and the run moves on to the next table.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The static configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// IO error while writing the generated SQL.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (plan or summary output).
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Problems found while validating a [`MigrationConfig`](crate::config::MigrationConfig).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The same table is configured twice.
    #[error("Table '{0}' is configured more than once")]
    DuplicateTable(String),

    /// A table or column name cannot be emitted as a bare identifier.
    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),

    /// A foreign key points at a table that is not configured.
    #[error("Table '{table}' references unknown table '{references}'")]
    UnknownReference {
        /// The referencing table.
        table: String,
        /// The missing referenced table.
        references: String,
    },

    /// A referenced table is emitted after the table that references it.
    #[error("Table '{table}' is emitted before '{references}', which it references")]
    OrderViolation {
        /// The referencing table.
        table: String,
        /// The referenced table that comes too late.
        references: String,
    },

    /// The foreign-key graph contains a cycle.
    #[error("Circular foreign-key dependency between: {}", .0.join(", "))]
    CircularDependency(Vec<String>),

    /// Two source columns map onto the same destination column.
    #[error("Table '{table}' maps more than one source column onto '{column}'")]
    DuplicateDestination {
        /// Table name.
        table: String,
        /// Destination column name.
        column: String,
    },

    /// An asserted destination column is also marked as dropped.
    #[error("Table '{table}' asserts column '{column}' but also drops it")]
    AssertedColumnDropped {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// A value rule targets a table that is not configured.
    #[error("Value rule targets unknown table '{0}'")]
    UnknownRuleTable(String),

    /// The export file-name template has no `{table}` placeholder.
    #[error("Export naming template '{0}' must contain '{{table}}'")]
    InvalidNaming(String),
}

/// Why a single table's export could not be turned into rows.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The export file does not exist.
    #[error("export file not found: {}", path.display())]
    Missing {
        /// Path that was probed.
        path: PathBuf,
    },

    /// The export file exists but cannot be read.
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        /// Path that was read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The export parsed but holds no rows.
    #[error("export contains no rows")]
    Empty,

    /// The upstream extraction recorded a failure instead of data.
    #[error("export is marked as failed: {0}")]
    MarkedFailure(String),

    /// Malformed JSON or an unexpected shape.
    #[error("failed to parse export: {0}")]
    Parse(String),
}

impl ExportError {
    /// Creates a parse error from any displayable cause.
    pub fn parse(cause: impl std::fmt::Display) -> Self {
        Self::Parse(cause.to_string())
    }

    /// Returns the coarse category used in run summaries.
    #[must_use]
    pub const fn kind(&self) -> SkipReason {
        match self {
            Self::Missing { .. } => SkipReason::MissingArtifact,
            Self::Empty => SkipReason::EmptyResult,
            Self::MarkedFailure(_) => SkipReason::MarkedFailure,
            Self::Unreadable { .. } | Self::Parse(_) => SkipReason::ParseFailure,
        }
    }
}

/// Category of a skipped table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No export file.
    MissingArtifact,
    /// Export holds zero rows.
    EmptyResult,
    /// Export records an upstream failure.
    MarkedFailure,
    /// Export could not be read or parsed.
    ParseFailure,
    /// Every column of the table is dropped by the mapping.
    NoColumns,
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PortError>;
