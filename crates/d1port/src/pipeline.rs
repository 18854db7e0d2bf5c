//! The export-to-SQL pipeline.
//!
//! Tables are processed one at a time in emission order. A problem with one
//! table's export is logged and recorded in the [`RunSummary`]; it never
//! stops the run. Only a failing output sink aborts.

use std::collections::BTreeSet;
use std::io::Write;

use d1port_sql::Dialect;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{MigrationConfig, TableSpec};
use crate::emitter::SqlEmitter;
use crate::error::{ExportError, Result, SkipReason};
use crate::mapper::SchemaMapper;
use crate::reader::ExportSource;
use crate::transform::ValueTransformer;

/// What happened to one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableOutcome {
    /// Statements were emitted.
    Imported {
        /// Number of INSERT statements.
        rows: usize,
    },
    /// No statements were emitted.
    Skipped {
        /// Category.
        reason: SkipReason,
        /// Human-readable detail.
        detail: String,
    },
}

/// Outcome for a named table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    /// Table name.
    pub table: String,
    /// Outcome.
    #[serde(flatten)]
    pub outcome: TableOutcome,
}

impl TableReport {
    fn imported(table: &str, rows: usize) -> Self {
        Self {
            table: table.to_string(),
            outcome: TableOutcome::Imported { rows },
        }
    }

    fn skipped(table: &str, reason: SkipReason, detail: impl Into<String>) -> Self {
        Self {
            table: table.to_string(),
            outcome: TableOutcome::Skipped {
                reason,
                detail: detail.into(),
            },
        }
    }
}

/// Per-table outcomes of a run, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// One report per configured table.
    pub tables: Vec<TableReport>,
}

impl RunSummary {
    /// Total INSERT statements emitted.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.tables
            .iter()
            .map(|r| match r.outcome {
                TableOutcome::Imported { rows } => rows,
                TableOutcome::Skipped { .. } => 0,
            })
            .sum()
    }

    /// Reports of imported tables.
    pub fn imported(&self) -> impl Iterator<Item = &TableReport> {
        self.tables
            .iter()
            .filter(|r| matches!(r.outcome, TableOutcome::Imported { .. }))
    }

    /// Reports of skipped tables.
    pub fn skipped(&self) -> impl Iterator<Item = &TableReport> {
        self.tables
            .iter()
            .filter(|r| matches!(r.outcome, TableOutcome::Skipped { .. }))
    }

    /// Looks up the report for `table`.
    #[must_use]
    pub fn report(&self, table: &str) -> Option<&TableReport> {
        self.tables.iter().find(|r| r.table == table)
    }
}

/// Runs a configuration against an export source.
pub struct Pipeline<'a, S: ExportSource, D: Dialect> {
    config: &'a MigrationConfig,
    source: &'a S,
    dialect: D,
}

impl<'a, S: ExportSource, D: Dialect + Clone> Pipeline<'a, S, D> {
    /// Creates a pipeline.
    pub const fn new(config: &'a MigrationConfig, source: &'a S, dialect: D) -> Self {
        Self {
            config,
            source,
            dialect,
        }
    }

    /// Writes the import script to `out`.
    pub fn run<W: Write>(&self, out: W) -> Result<RunSummary> {
        let config = self.config;
        let mut emitter = SqlEmitter::new(
            out,
            self.dialect.clone(),
            config.conflict_policy(),
            config.literal_style(),
        );
        let mut summary = RunSummary::default();

        info!(
            dialect = self.dialect.name(),
            tables = config.tables().len(),
            policy = %config.conflict_policy(),
            locale = %config.locale_policy(),
            "Generating import script"
        );

        emitter.header(config.header())?;
        emitter.begin(config.pre_statements())?;

        for table in config.tables() {
            let report = self.table(table, &mut emitter)?;
            summary.tables.push(report);
        }

        emitter.finish()?;

        info!(
            imported = summary.imported().count(),
            skipped = summary.skipped().count(),
            rows = summary.total_rows(),
            "Import script complete"
        );
        Ok(summary)
    }

    fn table<W: Write>(
        &self,
        table: &TableSpec,
        emitter: &mut SqlEmitter<W, D>,
    ) -> Result<TableReport> {
        let name = table.name();

        let rows = match self.source.load(name) {
            Ok(rows) => rows,
            Err(e) => {
                log_skip(name, &e);
                emitter.skipped(name, &e)?;
                return Ok(TableReport::skipped(name, e.kind(), e.to_string()));
            }
        };
        let Some(first) = rows.first() else {
            let e = ExportError::Empty;
            log_skip(name, &e);
            return Ok(TableReport::skipped(name, e.kind(), e.to_string()));
        };

        let plan = SchemaMapper::new(self.config.layout()).plan(table, first);
        if plan.is_empty() {
            warn!(table = %name, "Skipping table: every column is dropped");
            return Ok(TableReport::skipped(
                name,
                SkipReason::NoColumns,
                "every column is dropped",
            ));
        }

        let transformer = ValueTransformer::new(self.config.rules(), self.config.locale_policy());
        let columns: Vec<&str> = plan.destinations().collect();

        let mut unplanned = BTreeSet::new();
        emitter.table_header(name, rows.len())?;
        for row in &rows {
            unplanned.extend(plan.unplanned(table.mapping(), row));
            let values = plan
                .values(row)
                .map(|(column, value)| transformer.transform(name, column, value))
                .collect();
            emitter.insert(name, &columns, values)?;
        }
        emitter.end_table()?;

        if !unplanned.is_empty() {
            let columns: Vec<&str> = unplanned.into_iter().collect();
            warn!(
                table = %name,
                columns = %columns.join(", "),
                "Keys absent from the first row are not emitted"
            );
        }
        info!(table = %name, rows = rows.len(), "Imported table");
        Ok(TableReport::imported(name, rows.len()))
    }
}

fn log_skip(table: &str, error: &ExportError) {
    match error {
        ExportError::Missing { .. } | ExportError::Empty => {
            warn!(table = %table, "Skipping table: {error}");
        }
        ExportError::MarkedFailure(_) => {
            warn!(table = %table, "Skipping table, export recorded a failure: {error}");
        }
        ExportError::Unreadable { .. } | ExportError::Parse(_) => {
            warn!(table = %table, "Error processing table: {error}");
        }
    }
    debug!(table = %table, reason = ?error.kind(), "Table skipped");
}
