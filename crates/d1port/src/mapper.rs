//! Schema mapper.
//!
//! Turns a table's first exported row into the ordered list of
//! `(source, destination)` column pairs used for every row of that table.

use tracing::{debug, warn};

use crate::config::{ColumnAction, ColumnLayout, ColumnMapping, TableSpec};
use crate::row::{RawValue, Row};

/// One emitted column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPair {
    /// Key read from the export row.
    pub source: String,
    /// Column written in the destination schema.
    pub destination: String,
    /// Whether an export key named like the destination may stand in for
    /// a missing source key.
    destination_fallback: bool,
}

impl ColumnPair {
    fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            destination_fallback: false,
        }
    }

    /// A pair whose destination key is only read when the mapping keeps
    /// that key as-is.
    fn mapped(source: &str, destination: &str, mapping: &ColumnMapping) -> Self {
        let mut pair = Self::new(source, destination);
        pair.destination_fallback =
            source != destination && mapping.resolve(destination) == ColumnAction::Keep;
        pair
    }

    fn reads(&self, key: &str) -> bool {
        self.source == key || (self.destination_fallback && self.destination == key)
    }
}

/// Columns emitted for one table, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPlan {
    pairs: Vec<ColumnPair>,
    ignored: Vec<String>,
}

impl ColumnPlan {
    /// Returns the column pairs.
    #[must_use]
    pub fn pairs(&self) -> &[ColumnPair] {
        &self.pairs
    }

    /// Returns the destination column names.
    pub fn destinations(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|p| p.destination.as_str())
    }

    /// Returns source keys that exist in the export but are not emitted,
    /// excluding configured drops.
    #[must_use]
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    /// Returns `true` if no column is emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Extracts the values of `row` in plan order.
    ///
    /// A renamed column is read from its source key, or from its destination
    /// key when an export already uses the new name and the mapping neither
    /// drops nor renames that key. Absent keys are `NULL`.
    pub fn values<'s, 'r>(
        &'s self,
        row: &'r Row,
    ) -> impl Iterator<Item = (&'s str, RawValue)> + 'r
    where
        's: 'r,
    {
        self.pairs.iter().map(move |pair| {
            let value = row
                .get(&pair.source)
                .or_else(|| {
                    pair.destination_fallback
                        .then(|| row.get(&pair.destination))
                        .flatten()
                })
                .cloned()
                .unwrap_or(RawValue::Null);
            (pair.destination.as_str(), value)
        })
    }

    /// Returns keys of `row` that the plan neither reads nor accounts for.
    ///
    /// Only rows after the first can carry such keys in inferred layout.
    pub fn unplanned<'r>(
        &'r self,
        mapping: &'r ColumnMapping,
        row: &'r Row,
    ) -> impl Iterator<Item = &'r str> {
        row.columns().filter(move |key| {
            mapping.resolve(key) != ColumnAction::Drop
                && !self.pairs.iter().any(|p| p.reads(key))
                && !self.ignored.iter().any(|i| i == key)
        })
    }
}

/// Plans column lists from table specs and export rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaMapper {
    layout: ColumnLayout,
}

impl SchemaMapper {
    /// Creates a mapper using `layout`.
    #[must_use]
    pub const fn new(layout: ColumnLayout) -> Self {
        Self { layout }
    }

    /// Builds the column plan for `table` from its first row.
    #[must_use]
    pub fn plan(&self, table: &TableSpec, first_row: &Row) -> ColumnPlan {
        match (self.layout, table.asserted_columns()) {
            (ColumnLayout::Asserted, Some(columns)) => asserted(table, columns, first_row),
            _ => inferred(table, first_row),
        }
    }
}

fn inferred(table: &TableSpec, first_row: &Row) -> ColumnPlan {
    let mut plan = ColumnPlan::default();

    for source in first_row.columns() {
        let destination = match table.mapping().resolve(source) {
            ColumnAction::Drop => continue,
            ColumnAction::Keep => source,
            ColumnAction::Rename(to) => to,
        };
        if plan.destinations().any(|d| d == destination) {
            warn!(
                table = %table.name(),
                column = %destination,
                source = %source,
                "Duplicate destination column, keeping first occurrence"
            );
            plan.ignored.push(source.to_string());
            continue;
        }
        plan.pairs
            .push(ColumnPair::mapped(source, destination, table.mapping()));
    }

    plan
}

fn asserted(table: &TableSpec, columns: &[String], first_row: &Row) -> ColumnPlan {
    let mapping = table.mapping();
    let pairs: Vec<ColumnPair> = columns
        .iter()
        .map(|destination| ColumnPair::mapped(mapping.source_for(destination), destination, mapping))
        .collect();

    let ignored: Vec<String> = first_row
        .columns()
        .filter(|source| mapping.resolve(source) != ColumnAction::Drop)
        .filter(|key| !pairs.iter().any(|p| p.reads(key)))
        .map(String::from)
        .collect();
    if !ignored.is_empty() {
        debug!(
            table = %table.name(),
            columns = %ignored.join(", "),
            "Export keys outside the asserted column list are ignored"
        );
    }

    ColumnPlan { pairs, ignored }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> TableSpec {
        TableSpec::new("users")
            .rename("preferred_language", "language_preference")
            .drop_column("legacy_flag")
            .columns(&["id", "email", "language_preference", "role"])
    }

    fn row() -> Row {
        Row::new()
            .with("id", 1_i64)
            .with("legacy_flag", true)
            .with("email", "a@example.com")
            .with("preferred_language", "en-US")
            .with("nickname", "al")
    }

    #[test]
    fn test_inferred_uses_first_row_order() {
        let plan = SchemaMapper::new(ColumnLayout::Inferred).plan(&users(), &row());
        let destinations: Vec<&str> = plan.destinations().collect();
        assert_eq!(
            destinations,
            vec!["id", "email", "language_preference", "nickname"]
        );
        assert!(plan.ignored().is_empty());
    }

    #[test]
    fn test_dropped_column_never_planned() {
        let plan = SchemaMapper::default().plan(&users(), &row());
        assert!(plan.pairs().iter().all(|p| p.source != "legacy_flag"));
        let values: Vec<(&str, RawValue)> = plan.values(&row()).collect();
        assert_eq!(values.len(), 4);
        assert!(values.iter().all(|(_, v)| *v != RawValue::Bool(true)));
    }

    #[test]
    fn test_renamed_value_read_from_source() {
        let plan = SchemaMapper::default().plan(&users(), &row());
        let values: Vec<(&str, RawValue)> = plan.values(&row()).collect();
        assert_eq!(values[2], ("language_preference", RawValue::from("en-US")));
    }

    #[test]
    fn test_asserted_order_and_missing_null() {
        let plan = SchemaMapper::new(ColumnLayout::Asserted).plan(&users(), &row());
        let destinations: Vec<&str> = plan.destinations().collect();
        assert_eq!(destinations, vec!["id", "email", "language_preference", "role"]);
        assert_eq!(plan.ignored(), &[String::from("nickname")]);

        let values: Vec<(&str, RawValue)> = plan.values(&row()).collect();
        assert_eq!(values[2].1, RawValue::from("en-US"));
        assert_eq!(values[3], ("role", RawValue::Null));
    }

    #[test]
    fn test_asserted_reads_already_renamed_key() {
        let first = Row::new()
            .with("id", 2_i64)
            .with("language_preference", "zh-CN");
        let plan = SchemaMapper::new(ColumnLayout::Asserted).plan(&users(), &first);
        let values: Vec<(&str, RawValue)> = plan.values(&first).collect();
        assert_eq!(values[2], ("language_preference", RawValue::from("zh-CN")));
        assert!(plan.ignored().is_empty());
    }

    #[test]
    fn test_asserted_layout_without_list_falls_back() {
        let table = TableSpec::new("levels");
        let first = Row::new().with("name", "L1").with("id", 1_i64);
        let plan = SchemaMapper::new(ColumnLayout::Asserted).plan(&table, &first);
        let destinations: Vec<&str> = plan.destinations().collect();
        assert_eq!(destinations, vec!["name", "id"]);
    }

    #[test]
    fn test_duplicate_destination_keeps_first() {
        let table = TableSpec::new("users").rename("preferred_language", "language_preference");
        let first = Row::new()
            .with("language_preference", "zh")
            .with("preferred_language", "en-US");
        let plan = SchemaMapper::default().plan(&table, &first);
        assert_eq!(
            plan.pairs(),
            &[ColumnPair::new("language_preference", "language_preference")]
        );
        assert_eq!(plan.ignored(), &[String::from("preferred_language")]);
    }

    #[test]
    fn test_dropped_destination_key_is_never_read() {
        let table = TableSpec::new("t").rename("legacy_id", "id").drop_column("id");
        let first = Row::new().with("legacy_id", 1_i64).with("id", 99_i64);
        let plan = SchemaMapper::default().plan(&table, &first);
        assert_eq!(plan.pairs(), &[ColumnPair::new("legacy_id", "id")]);

        let values: Vec<(&str, RawValue)> = plan.values(&first).collect();
        assert_eq!(values, vec![("id", RawValue::from(1_i64))]);

        let later = Row::new().with("id", 42_i64);
        let values: Vec<(&str, RawValue)> = plan.values(&later).collect();
        assert_eq!(values, vec![("id", RawValue::Null)]);
        assert_eq!(plan.unplanned(table.mapping(), &later).count(), 0);
    }

    #[test]
    fn test_renamed_destination_key_is_never_read() {
        let table = TableSpec::new("t")
            .rename("old_name", "name")
            .rename("name", "display_name")
            .columns(&["name", "display_name"]);
        let first = Row::new().with("name", "shown");
        let plan = SchemaMapper::new(ColumnLayout::Asserted).plan(&table, &first);

        let values: Vec<(&str, RawValue)> = plan.values(&first).collect();
        assert_eq!(
            values,
            vec![
                ("name", RawValue::Null),
                ("display_name", RawValue::from("shown"))
            ]
        );
    }

    #[test]
    fn test_unplanned_keys_from_later_rows() {
        let plan = SchemaMapper::default().plan(&users(), &row());
        let later = Row::new()
            .with("id", 2_i64)
            .with("legacy_flag", false)
            .with("note", "kept?")
            .with("language_preference", "fr");
        let binding = users();
        let unplanned: Vec<&str> = plan.unplanned(binding.mapping(), &later).collect();
        assert_eq!(unplanned, vec!["note"]);
        assert_eq!(plan.unplanned(users().mapping(), &row()).count(), 0);
    }

    #[test]
    fn test_all_columns_dropped() {
        let table = TableSpec::new("cohort_members").drop_columns(&["id", "active"]);
        let first = Row::new().with("id", 3_i64).with("active", true);
        assert!(SchemaMapper::default().plan(&table, &first).is_empty());
    }
}
