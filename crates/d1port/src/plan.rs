//! Human- and machine-readable view of a resolved configuration.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::config::{ColumnLayout, MigrationConfig};
use crate::transform::LocalePolicy;

/// One table as it will be emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePlan {
    /// Table name.
    pub name: String,
    /// Tables this one references, excluding itself.
    pub references: Vec<String>,
    /// Source column to destination column.
    pub renames: BTreeMap<String, String>,
    /// Dropped source columns.
    pub drops: Vec<String>,
    /// Asserted destination columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    /// Value rules, rendered as text.
    pub rules: Vec<String>,
}

/// The resolved configuration, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanReport {
    /// Statement form.
    pub conflict_policy: String,
    /// Locale fallback.
    pub locale_policy: LocalePolicy,
    /// Column layout.
    pub layout: ColumnLayout,
    /// Whether backslashes in text are doubled.
    pub double_backslashes: bool,
    /// Statements emitted before the first table.
    pub pre_statements: Vec<String>,
    /// Tables in emission order.
    pub tables: Vec<TablePlan>,
}

impl PlanReport {
    /// Builds the report for `config`.
    #[must_use]
    pub fn new(config: &MigrationConfig) -> Self {
        let tables = config
            .tables()
            .iter()
            .map(|table| {
                let mut references: Vec<String> = Vec::new();
                for target in table.referenced_tables() {
                    if !references.iter().any(|r| r == target) {
                        references.push(target.to_string());
                    }
                }
                TablePlan {
                    name: table.name().to_string(),
                    references,
                    renames: table.mapping().renames().clone(),
                    drops: table.mapping().drops().iter().cloned().collect(),
                    columns: table.asserted_columns().map(<[String]>::to_vec),
                    rules: config
                        .rules()
                        .for_table(table.name())
                        .iter()
                        .map(ToString::to_string)
                        .collect(),
                }
            })
            .collect();

        Self {
            conflict_policy: config.conflict_policy().to_string(),
            locale_policy: config.locale_policy().clone(),
            layout: config.layout(),
            double_backslashes: config.literal_style().double_backslashes,
            pre_statements: config.pre_statements().to_vec(),
            tables,
        }
    }
}

impl fmt::Display for PlanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Statement form: {}", self.conflict_policy)?;
        writeln!(f, "Locale policy:  {}", self.locale_policy)?;
        let layout = match self.layout {
            ColumnLayout::Inferred => "inferred from first row",
            ColumnLayout::Asserted => "asserted column lists",
        };
        writeln!(f, "Column layout:  {layout}")?;
        writeln!(
            f,
            "Backslashes:    {}",
            if self.double_backslashes { "doubled" } else { "kept" }
        )?;
        for sql in &self.pre_statements {
            writeln!(f, "Pre-statement:  {sql}")?;
        }
        writeln!(f)?;

        for (index, table) in self.tables.iter().enumerate() {
            write!(f, "{:>2}. {}", index + 1, table.name)?;
            if !table.references.is_empty() {
                write!(f, " -> {}", table.references.join(", "))?;
            }
            writeln!(f)?;
            for (from, to) in &table.renames {
                writeln!(f, "      rename {from} -> {to}")?;
            }
            if !table.drops.is_empty() {
                writeln!(f, "      drop {}", table.drops.join(", "))?;
            }
            for rule in &table.rules {
                writeln!(f, "      {rule}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile;

    #[test]
    fn test_plan_lists_tables_in_order() {
        let config = profile::legacy_d1().build().unwrap();
        let plan = PlanReport::new(&config);

        assert_eq!(plan.tables.len(), 23);
        assert_eq!(plan.conflict_policy, "ignore");
        let users = &plan.tables[1];
        assert_eq!(users.name, "users");
        assert!(users.references.is_empty());
        assert_eq!(
            users.renames.get("preferred_language").map(String::as_str),
            Some("language_preference")
        );
        let boss = plan
            .tables
            .iter()
            .find(|t| t.name == "boss_consultant_relationships")
            .unwrap();
        assert_eq!(boss.references, vec![String::from("users")]);
    }

    #[test]
    fn test_plan_display() {
        let config = profile::legacy_d1().build().unwrap();
        let text = PlanReport::new(&config).to_string();

        assert!(text.starts_with("Statement form: ignore\n"));
        assert!(text.contains(" 1. achievements\n"));
        assert!(text.contains("      rename status -> enrollment_status\n"));
        assert!(text.contains("      drop answer_data\n"));
        assert!(text.contains("      lookup question_type: "));
    }

    #[test]
    fn test_plan_json() {
        let config = profile::legacy_d1().build().unwrap();
        let json = serde_json::to_value(PlanReport::new(&config)).unwrap();

        assert_eq!(json["layout"], "inferred");
        assert_eq!(json["locale_policy"], "passthrough");
        assert_eq!(json["tables"][0]["name"], "achievements");
    }
}
