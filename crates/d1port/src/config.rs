//! Static migration configuration.
//!
//! Everything the pipeline needs to know about the two schemas lives here:
//! the tables in emission order, their column mappings, asserted column
//! lists, foreign keys, value rules and the named policies that the legacy
//! import scripts disagreed on. A [`MigrationConfig`] is validated once by
//! its builder and is immutable afterwards.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use d1port_sql::dialect::is_plain_identifier;
use d1port_sql::{ConflictPolicy, LiteralStyle};
use serde::Serialize;

use crate::error::ConfigError;
use crate::order::EmissionOrder;
use crate::transform::{LocalePolicy, ValueRule, ValueRules};

/// A foreign key from a column of one table to another table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Referencing column.
    pub column: String,
    /// Referenced table.
    pub references: String,
}

/// How a single source column is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnAction<'a> {
    /// Emitted under its own name.
    Keep,
    /// Emitted under a different name.
    Rename(&'a str),
    /// Not emitted.
    Drop,
}

/// Per-table source-to-destination column mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    renames: BTreeMap<String, String>,
    drops: BTreeSet<String>,
}

impl ColumnMapping {
    /// Creates a pass-through mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves what happens to `source`.
    #[must_use]
    pub fn resolve(&self, source: &str) -> ColumnAction<'_> {
        if self.drops.contains(source) {
            ColumnAction::Drop
        } else if let Some(destination) = self.renames.get(source) {
            ColumnAction::Rename(destination)
        } else {
            ColumnAction::Keep
        }
    }

    /// Returns the source column whose values land in `destination`.
    #[must_use]
    pub fn source_for<'a>(&'a self, destination: &'a str) -> &'a str {
        self.renames
            .iter()
            .find(|(_, to)| *to == destination)
            .map_or(destination, |(from, _)| from.as_str())
    }

    /// Returns the renames, source to destination.
    #[must_use]
    pub const fn renames(&self) -> &BTreeMap<String, String> {
        &self.renames
    }

    /// Returns the dropped source columns.
    #[must_use]
    pub const fn drops(&self) -> &BTreeSet<String> {
        &self.drops
    }
}

/// Static description of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    name: String,
    mapping: ColumnMapping,
    columns: Option<Vec<String>>,
    foreign_keys: Vec<ForeignKey>,
}

impl TableSpec {
    /// Creates a table with pass-through columns and no foreign keys.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mapping: ColumnMapping::new(),
            columns: None,
            foreign_keys: Vec::new(),
        }
    }

    /// Renames a source column.
    #[must_use]
    pub fn rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.mapping.renames.insert(from.into(), to.into());
        self
    }

    /// Drops a source column.
    #[must_use]
    pub fn drop_column(mut self, column: impl Into<String>) -> Self {
        self.mapping.drops.insert(column.into());
        self
    }

    /// Drops several source columns.
    #[must_use]
    pub fn drop_columns(mut self, columns: &[&str]) -> Self {
        self.mapping
            .drops
            .extend(columns.iter().map(|c| String::from(*c)));
        self
    }

    /// Asserts the destination column list, in emission order.
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| String::from(*c)).collect());
        self
    }

    /// Declares a foreign key from `column` to `table`.
    #[must_use]
    pub fn references(mut self, column: impl Into<String>, table: impl Into<String>) -> Self {
        self.foreign_keys.push(ForeignKey {
            column: column.into(),
            references: table.into(),
        });
        self
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the column mapping.
    #[must_use]
    pub const fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Returns the asserted destination columns, if any.
    #[must_use]
    pub fn asserted_columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    /// Returns the declared foreign keys.
    #[must_use]
    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// Returns the tables this table depends on, excluding itself.
    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        self.foreign_keys
            .iter()
            .map(|fk| fk.references.as_str())
            .filter(move |target| *target != self.name)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_identifier(&self.name)?;

        let mut destinations = BTreeSet::new();
        for (from, to) in &self.mapping.renames {
            check_identifier(to)?;
            if self.mapping.drops.contains(from) {
                continue;
            }
            if !destinations.insert(to.as_str()) {
                return Err(ConfigError::DuplicateDestination {
                    table: self.name.clone(),
                    column: to.clone(),
                });
            }
        }

        if let Some(columns) = &self.columns {
            let mut seen = BTreeSet::new();
            for column in columns {
                check_identifier(column)?;
                if !seen.insert(column.as_str()) {
                    return Err(ConfigError::DuplicateDestination {
                        table: self.name.clone(),
                        column: column.clone(),
                    });
                }
                if self.mapping.drops.contains(self.mapping.source_for(column)) {
                    return Err(ConfigError::AssertedColumnDropped {
                        table: self.name.clone(),
                        column: column.clone(),
                    });
                }
            }
        }

        for fk in &self.foreign_keys {
            check_identifier(&fk.column)?;
        }
        Ok(())
    }
}

fn check_identifier(name: &str) -> Result<(), ConfigError> {
    if is_plain_identifier(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier(name.to_string()))
    }
}

/// Where a table's destination column list comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLayout {
    /// The first exported row defines the columns.
    #[default]
    Inferred,
    /// Asserted column lists are authoritative where a table declares one.
    Asserted,
}

/// How the builder arrives at the emission order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderMode {
    /// Keep the declared order and reject it if it violates a foreign key.
    #[default]
    Declared,
    /// Reorder tables topologically.
    Sorted,
}

/// Comment block written at the top of the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Comment lines, without the leading `-- `.
    pub lines: Vec<String>,
    /// Generation timestamp, if it should be recorded.
    pub generated_at: Option<DateTime<Utc>>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            lines: vec![
                String::from("COMPLETE DATABASE IMPORT"),
                String::from("Generated from legacy JSON exports"),
            ],
            generated_at: None,
        }
    }
}

/// The validated configuration for one run.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    tables: Vec<TableSpec>,
    order: EmissionOrder,
    rules: ValueRules,
    conflict_policy: ConflictPolicy,
    locale_policy: LocalePolicy,
    layout: ColumnLayout,
    literal_style: LiteralStyle,
    header: Header,
    pre_statements: Vec<String>,
}

impl MigrationConfig {
    /// Starts building a configuration.
    #[must_use]
    pub fn builder() -> MigrationConfigBuilder {
        MigrationConfigBuilder::default()
    }

    /// Returns the tables in emission order.
    #[must_use]
    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Returns the emission order.
    #[must_use]
    pub const fn order(&self) -> &EmissionOrder {
        &self.order
    }

    /// Returns the value rules.
    #[must_use]
    pub const fn rules(&self) -> &ValueRules {
        &self.rules
    }

    /// Returns the statement form.
    #[must_use]
    pub const fn conflict_policy(&self) -> ConflictPolicy {
        self.conflict_policy
    }

    /// Returns the locale fallback policy.
    #[must_use]
    pub const fn locale_policy(&self) -> &LocalePolicy {
        &self.locale_policy
    }

    /// Returns the column layout.
    #[must_use]
    pub const fn layout(&self) -> ColumnLayout {
        self.layout
    }

    /// Returns the literal style.
    #[must_use]
    pub const fn literal_style(&self) -> LiteralStyle {
        self.literal_style
    }

    /// Returns the header.
    #[must_use]
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// Returns statements emitted right after foreign keys are disabled.
    #[must_use]
    pub fn pre_statements(&self) -> &[String] {
        &self.pre_statements
    }
}

/// Builder for [`MigrationConfig`].
#[derive(Debug, Clone, Default)]
pub struct MigrationConfigBuilder {
    tables: Vec<TableSpec>,
    rules: ValueRules,
    conflict_policy: ConflictPolicy,
    locale_policy: LocalePolicy,
    layout: ColumnLayout,
    literal_style: LiteralStyle,
    header: Header,
    pre_statements: Vec<String>,
    order_mode: OrderMode,
}

impl MigrationConfigBuilder {
    /// Appends a table.
    #[must_use]
    pub fn table(mut self, table: TableSpec) -> Self {
        self.tables.push(table);
        self
    }

    /// Adds a value rule for `table`.
    #[must_use]
    pub fn rule(mut self, table: impl Into<String>, rule: ValueRule) -> Self {
        self.rules.add(table, rule);
        self
    }

    /// Sets the statement form.
    #[must_use]
    pub const fn conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Sets the locale fallback policy.
    #[must_use]
    pub fn locale_policy(mut self, policy: LocalePolicy) -> Self {
        self.locale_policy = policy;
        self
    }

    /// Sets the column layout.
    #[must_use]
    pub const fn layout(mut self, layout: ColumnLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the literal style.
    #[must_use]
    pub const fn literal_style(mut self, style: LiteralStyle) -> Self {
        self.literal_style = style;
        self
    }

    /// Replaces the header comment lines.
    #[must_use]
    pub fn header_lines(mut self, lines: &[&str]) -> Self {
        self.header.lines = lines.iter().map(|l| String::from(*l)).collect();
        self
    }

    /// Records a generation timestamp in the header.
    #[must_use]
    pub const fn generated_at(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.header.generated_at = at;
        self
    }

    /// Adds a statement emitted after foreign keys are disabled.
    #[must_use]
    pub fn pre_statement(mut self, sql: impl Into<String>) -> Self {
        self.pre_statements.push(sql.into());
        self
    }

    /// Chooses how the emission order is established.
    #[must_use]
    pub const fn order_mode(mut self, mode: OrderMode) -> Self {
        self.order_mode = mode;
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<MigrationConfig, ConfigError> {
        for table in &self.tables {
            table.validate()?;
        }

        let order = match self.order_mode {
            OrderMode::Declared => EmissionOrder::validate(&self.tables)?,
            OrderMode::Sorted => EmissionOrder::sorted(&self.tables)?,
        };

        let mut by_name: BTreeMap<String, TableSpec> = self
            .tables
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();
        let tables: Vec<TableSpec> = order
            .names()
            .iter()
            .filter_map(|name| by_name.remove(name))
            .collect();

        if let Some(unknown) = self
            .rules
            .tables()
            .find(|name| !tables.iter().any(|t| t.name == *name))
        {
            return Err(ConfigError::UnknownRuleTable(unknown.to_string()));
        }

        Ok(MigrationConfig {
            tables,
            order,
            rules: self.rules,
            conflict_policy: self.conflict_policy,
            locale_policy: self.locale_policy,
            layout: self.layout,
            literal_style: self.literal_style,
            header: self.header,
            pre_statements: self.pre_statements,
        })
    }
}
