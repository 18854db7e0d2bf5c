//! Statement emitter.
//!
//! Writes the import script: a header comment block, the foreign-key
//! disable statement, one block per table, the re-enable statement and a
//! trailing row count.

use std::io::Write;

use d1port_sql::{ConflictPolicy, Dialect, Insert, LiteralStyle, SqlValue};

use crate::config::Header;
use crate::error::{ExportError, SkipReason};

/// Streams SQL text to a writer.
pub struct SqlEmitter<W: Write, D: Dialect> {
    out: W,
    dialect: D,
    policy: ConflictPolicy,
    style: LiteralStyle,
    statements: usize,
}

impl<W: Write, D: Dialect> SqlEmitter<W, D> {
    /// Creates an emitter writing to `out`.
    pub const fn new(out: W, dialect: D, policy: ConflictPolicy, style: LiteralStyle) -> Self {
        Self {
            out,
            dialect,
            policy,
            style,
            statements: 0,
        }
    }

    /// Writes the header comment block.
    pub fn header(&mut self, header: &Header) -> std::io::Result<()> {
        for line in &header.lines {
            writeln!(self.out, "-- {}", single_line(line))?;
        }
        if let Some(at) = header.generated_at {
            writeln!(self.out, "-- Date: {}", at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        writeln!(self.out)
    }

    /// Disables foreign-key checks and writes the pre-import statements.
    pub fn begin(&mut self, pre_statements: &[String]) -> std::io::Result<()> {
        writeln!(self.out, "-- Disable foreign key checks during import")?;
        writeln!(self.out, "{}", self.dialect.disable_foreign_keys())?;
        writeln!(self.out)?;
        if !pre_statements.is_empty() {
            for sql in pre_statements {
                writeln!(self.out, "{sql}")?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// Writes the comment that opens a table block.
    pub fn table_header(&mut self, table: &str, rows: usize) -> std::io::Result<()> {
        writeln!(self.out, "-- Table: {table} ({rows} rows)")
    }

    /// Writes one INSERT statement.
    pub fn insert(
        &mut self,
        table: &str,
        columns: &[&str],
        values: Vec<SqlValue>,
    ) -> std::io::Result<()> {
        let sql = Insert::new()
            .into_table(table)
            .on_conflict(self.policy)
            .columns(columns)
            .values(values)
            .to_sql_inline(&self.dialect, self.style);
        self.statements += 1;
        writeln!(self.out, "{sql}")
    }

    /// Closes a table block.
    pub fn end_table(&mut self) -> std::io::Result<()> {
        writeln!(self.out)
    }

    /// Records a parse failure in place of the table's statements.
    ///
    /// Other skip reasons are only logged.
    pub fn skipped(&mut self, table: &str, error: &ExportError) -> std::io::Result<()> {
        if error.kind() == SkipReason::ParseFailure {
            writeln!(
                self.out,
                "-- Error processing {table}: {}",
                single_line(&error.to_string())
            )?;
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// Re-enables foreign-key checks and writes the trailing count of
    /// INSERT statements.
    pub fn finish(mut self) -> std::io::Result<W> {
        writeln!(self.out, "-- Re-enable foreign key checks")?;
        writeln!(self.out, "{}", self.dialect.enable_foreign_keys())?;
        writeln!(self.out)?;
        writeln!(self.out, "-- Total rows imported: {}", self.statements)?;
        writeln!(self.out, "-- Import complete")?;
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Keeps free text inside a single `--` comment line.
fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use d1port_sql::SqliteDialect;

    use super::*;

    fn emitter(policy: ConflictPolicy) -> SqlEmitter<Vec<u8>, SqliteDialect> {
        SqlEmitter::new(Vec::new(), SqliteDialect::new(), policy, LiteralStyle::default())
    }

    fn text(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_full_script_shape() {
        let mut e = emitter(ConflictPolicy::Ignore);
        e.header(&Header::default()).unwrap();
        e.begin(&[]).unwrap();
        e.table_header("users", 1).unwrap();
        e.insert(
            "users",
            &["id", "name"],
            vec![SqlValue::Int(1), SqlValue::Text(String::from("Ann"))],
        )
        .unwrap();
        e.end_table().unwrap();
        let out = text(e.finish().unwrap());

        let expected = "\
-- COMPLETE DATABASE IMPORT
-- Generated from legacy JSON exports

-- Disable foreign key checks during import
PRAGMA foreign_keys = OFF;

-- Table: users (1 rows)
INSERT OR IGNORE INTO users (id, name) VALUES (1, 'Ann');

-- Re-enable foreign key checks
PRAGMA foreign_keys = ON;

-- Total rows imported: 1
-- Import complete
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_header_date_and_pre_statements() {
        let mut e = emitter(ConflictPolicy::Ignore);
        let header = Header {
            lines: vec![String::from("Import")],
            generated_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap()),
        };
        e.header(&header).unwrap();
        e.begin(&[String::from("DELETE FROM users WHERE id = 1;")])
            .unwrap();
        let out = text(e.finish().unwrap());

        assert!(out.contains("-- Total rows imported: 0\n"));
        assert!(out.starts_with("-- Import\n-- Date: 2025-03-01 08:30:00 UTC\n"));
        let pragma = out.find("PRAGMA foreign_keys = OFF;").unwrap();
        let delete = out.find("DELETE FROM users WHERE id = 1;").unwrap();
        assert!(pragma < delete);
    }

    #[test]
    fn test_statement_form_follows_policy() {
        let mut e = emitter(ConflictPolicy::Strict);
        e.insert("levels", &["id"], vec![SqlValue::Int(2)]).unwrap();
        let out = text(e.finish().unwrap());
        assert!(out.starts_with("INSERT INTO levels (id) VALUES (2);\n"));
    }

    #[test]
    fn test_only_parse_failures_are_commented() {
        let mut e = emitter(ConflictPolicy::Ignore);
        e.skipped("levels", &ExportError::Empty).unwrap();
        e.skipped("tests", &ExportError::parse("expected value\nat line 1"))
            .unwrap();
        let out = text(e.finish().unwrap());

        assert!(!out.contains("levels"));
        assert!(out.contains(
            "-- Error processing tests: failed to parse export: expected value at line 1\n"
        ));
    }
}
