//! Single-row INSERT statement builder using the typestate pattern.
//!
//! Values are rendered inline through [`SqlValue::to_sql_inline`], so the
//! finished statement is self-contained text ending in `;`.

use std::fmt;
use std::marker::PhantomData;

use crate::dialect::Dialect;
use crate::value::{LiteralStyle, SqlValue, ToSqlValue};

/// What the statement does when a row collides with an existing key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConflictPolicy {
    /// Plain `INSERT`: a collision fails the statement.
    Strict,
    /// `INSERT OR REPLACE`: the incoming row overwrites the existing one.
    Replace,
    /// `INSERT OR IGNORE`: the incoming row is dropped. Safe to re-run.
    #[default]
    Ignore,
}

impl ConflictPolicy {
    /// Returns the lowercase policy name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Replace => "replace",
            Self::Ignore => "ignore",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Typestate markers

/// Marker: No table specified yet.
pub struct NoTable;
/// Marker: Table has been specified.
pub struct HasTable;
/// Marker: No values specified yet.
pub struct NoValues;
/// Marker: Values have been specified.
pub struct HasValues;

/// A single-row INSERT builder with inline literals.
pub struct Insert<Table, Values> {
    table: Option<String>,
    policy: ConflictPolicy,
    columns: Vec<String>,
    values: Vec<SqlValue>,
    _state: PhantomData<(Table, Values)>,
}

impl Insert<NoTable, NoValues> {
    /// Creates a new INSERT builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: None,
            policy: ConflictPolicy::default(),
            columns: vec![],
            values: vec![],
            _state: PhantomData,
        }
    }
}

impl Default for Insert<NoTable, NoValues> {
    fn default() -> Self {
        Self::new()
    }
}

// Transition: NoTable -> HasTable
impl<Values> Insert<NoTable, Values> {
    /// Specifies the table to insert into.
    #[must_use]
    pub fn into_table(self, table: &str) -> Insert<HasTable, Values> {
        Insert {
            table: Some(String::from(table)),
            policy: self.policy,
            columns: self.columns,
            values: self.values,
            _state: PhantomData,
        }
    }
}

impl<Table, Values> Insert<Table, Values> {
    /// Sets the conflict policy.
    #[must_use]
    pub const fn on_conflict(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }
}

// Methods available after specifying table
impl<Values> Insert<HasTable, Values> {
    /// Specifies the columns to insert into.
    #[must_use]
    pub fn columns<S: AsRef<str>>(mut self, cols: &[S]) -> Self {
        self.columns = cols.iter().map(|s| String::from(s.as_ref())).collect();
        self
    }
}

// Transition: NoValues -> HasValues
impl Insert<HasTable, NoValues> {
    /// Sets the row of values to insert.
    #[must_use]
    pub fn values<T: ToSqlValue>(self, vals: Vec<T>) -> Insert<HasTable, HasValues> {
        Insert {
            table: self.table,
            policy: self.policy,
            columns: self.columns,
            values: vals.into_iter().map(ToSqlValue::to_sql_value).collect(),
            _state: PhantomData,
        }
    }
}

impl Insert<HasTable, HasValues> {
    /// Renders the statement with every value inlined.
    #[must_use]
    pub fn to_sql_inline<D: Dialect>(&self, dialect: &D, style: LiteralStyle) -> String {
        debug_assert!(
            self.columns.is_empty() || self.columns.len() == self.values.len(),
            "column and value lists must pair up"
        );

        let mut sql = String::from(dialect.insert_prefix(self.policy));
        sql.push(' ');

        if let Some(ref table) = self.table {
            sql.push_str(&dialect.quote_identifier(table));
        }

        if !self.columns.is_empty() {
            let cols: Vec<String> = self
                .columns
                .iter()
                .map(|c| dialect.quote_identifier(c))
                .collect();
            sql.push_str(" (");
            sql.push_str(&cols.join(", "));
            sql.push(')');
        }

        let literals: Vec<String> = self.values.iter().map(|v| v.to_sql_inline(style)).collect();
        sql.push_str(" VALUES (");
        sql.push_str(&literals.join(", "));
        sql.push_str(");");
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::SqliteDialect;

    fn render(insert: &Insert<HasTable, HasValues>) -> String {
        insert.to_sql_inline(&SqliteDialect::new(), LiteralStyle::default())
    }

    #[test]
    fn test_default_policy_is_ignore() {
        let insert = Insert::new()
            .into_table("users")
            .columns(&["id", "name"])
            .values(vec![1_i64.to_sql_value(), "Alice".to_sql_value()]);

        assert_eq!(
            render(&insert),
            "INSERT OR IGNORE INTO users (id, name) VALUES (1, 'Alice');"
        );
    }

    #[test]
    fn test_strict_and_replace() {
        let strict = Insert::new()
            .into_table("levels")
            .on_conflict(ConflictPolicy::Strict)
            .columns(&["id"])
            .values(vec![7_i64]);
        assert_eq!(render(&strict), "INSERT INTO levels (id) VALUES (7);");

        let replace = Insert::new()
            .on_conflict(ConflictPolicy::Replace)
            .into_table("levels")
            .columns(&["id"])
            .values(vec![7_i64]);
        assert_eq!(
            render(&replace),
            "INSERT OR REPLACE INTO levels (id) VALUES (7);"
        );
    }

    #[test]
    fn test_owned_column_names() {
        let cols = vec![String::from("title"), String::from("active")];
        let insert = Insert::new()
            .into_table("pathways")
            .columns(&cols)
            .values(vec!["Onboarding".to_sql_value(), true.to_sql_value()]);

        assert_eq!(
            render(&insert),
            "INSERT OR IGNORE INTO pathways (title, active) VALUES ('Onboarding', 1);"
        );
    }

    #[test]
    fn test_null_and_quotes() {
        let insert = Insert::new()
            .into_table("users")
            .columns(&["name", "last_login"])
            .values(vec!["O'Neil".to_sql_value(), SqlValue::Null]);

        assert_eq!(
            render(&insert),
            "INSERT OR IGNORE INTO users (name, last_login) VALUES ('O''Neil', NULL);"
        );
    }

    #[test]
    fn test_odd_column_names_are_quoted() {
        let insert = Insert::new()
            .into_table("users")
            .columns(&["display name"])
            .values(vec!["x"]);

        assert_eq!(
            render(&insert),
            "INSERT OR IGNORE INTO users (\"display name\") VALUES ('x');"
        );
    }

    #[test]
    fn test_policy_display() {
        assert_eq!(ConflictPolicy::default().to_string(), "ignore");
        assert_eq!(ConflictPolicy::Replace.to_string(), "replace");
    }
}
