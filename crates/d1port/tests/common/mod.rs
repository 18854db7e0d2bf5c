#![allow(dead_code)]

use std::path::Path;

use d1port::prelude::*;
use tempfile::TempDir;

/// A temporary directory of `{table}_raw.json` exports.
pub struct ExportDir {
    dir: TempDir,
}

impl ExportDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes the export for `table` using the default naming.
    pub fn write(&self, table: &str, json: &str) -> &Self {
        self.write_file(&ExportNaming::default().file_name(table), json)
    }

    pub fn write_file(&self, file_name: &str, json: &str) -> &Self {
        std::fs::write(self.dir.path().join(file_name), json)
            .unwrap_or_else(|e| panic!("Failed to write {file_name}: {e}"));
        self
    }

    pub fn source(&self) -> DirectorySource {
        DirectorySource::new(self.path(), ExportNaming::default())
    }
}

/// Runs `config` over `source` and returns the summary and the script.
pub fn generate_from<S: ExportSource>(config: &MigrationConfig, source: &S) -> (RunSummary, String) {
    let mut out = Vec::new();
    let summary = Pipeline::new(config, source, SqliteDialect::new())
        .run(&mut out)
        .expect("Pipeline failed");
    (summary, String::from_utf8(out).expect("Script is not UTF-8"))
}

/// Builds `builder` and runs it over the exports in `dir`.
pub fn generate(dir: &ExportDir, builder: MigrationConfigBuilder) -> (RunSummary, String) {
    let config = builder.build().expect("Invalid configuration");
    generate_from(&config, &dir.source())
}

/// INSERT statements in script order.
pub fn inserts(sql: &str) -> Vec<&str> {
    sql.lines().filter(|l| l.starts_with("INSERT")).collect()
}

/// INSERT statements targeting `table`.
pub fn inserts_into<'a>(sql: &'a str, table: &str) -> Vec<&'a str> {
    let marker = format!(" INTO {table} ");
    inserts(sql)
        .into_iter()
        .filter(|l| l.contains(&marker))
        .collect()
}

/// Executable statements: everything that is not blank or a comment.
pub fn statements(sql: &str) -> Vec<&str> {
    sql.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("--"))
        .collect()
}

/// Destination schema for the tables exercised by the replay tests.
pub const SCHEMA: &[&str] = &[
    "CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        email TEXT UNIQUE NOT NULL,
        name TEXT NOT NULL,
        role TEXT,
        boss_id INTEGER REFERENCES users(id),
        language_preference TEXT DEFAULT 'en'
    )",
    "CREATE TABLE levels (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        order_index INTEGER NOT NULL
    )",
    "CREATE TABLE tests (
        id INTEGER PRIMARY KEY,
        level_id INTEGER NOT NULL REFERENCES levels(id),
        title TEXT NOT NULL,
        pass_percentage INTEGER
    )",
    "CREATE TABLE questions (
        id INTEGER PRIMARY KEY,
        test_id INTEGER NOT NULL REFERENCES tests(id),
        question_text TEXT NOT NULL,
        question_type TEXT NOT NULL
            CHECK (question_type IN ('multiple_choice', 'multi_select', 'true_false', 'ordering'))
    )",
    "CREATE TABLE answer_options (
        id INTEGER PRIMARY KEY,
        question_id INTEGER NOT NULL REFERENCES questions(id),
        option_text TEXT NOT NULL,
        is_correct INTEGER NOT NULL
    )",
    "CREATE TABLE test_attempts (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id),
        test_id INTEGER NOT NULL REFERENCES tests(id),
        score REAL,
        passed INTEGER
    )",
    "CREATE TABLE user_answers (
        id INTEGER PRIMARY KEY,
        attempt_id INTEGER NOT NULL REFERENCES test_attempts(id),
        question_id INTEGER NOT NULL REFERENCES questions(id),
        answer_option_id INTEGER REFERENCES answer_options(id),
        is_correct INTEGER
    )",
];

/// Exports matching [`SCHEMA`], in the legacy shapes.
pub fn write_training_exports(dir: &ExportDir) {
    dir.write(
        "users",
        r#"[
            {"id": 1, "email": "lead@example.com", "name": "O'Neil", "role": "boss",
             "boss_id": null, "preferred_language": "en-US"},
            {"id": 2, "email": "dev@example.com", "name": "Wu", "role": "consultant",
             "boss_id": 1, "preferred_language": "zh-CN"}
        ]"#,
    )
    .write(
        "levels",
        r#"[{"results": [{"id": 1, "title": "Basics", "order_index": 1}],
             "success": true, "meta": {"duration": 0.1}}]"#,
    )
    .write(
        "tests",
        r#"[{"id": 10, "level_id": 1, "title": "Basics quiz", "pass_percentage": 80}]"#,
    )
    .write(
        "questions",
        r#"[
            {"id": 100, "test_id": 10, "question_text": "Pick all\nthat apply",
             "question_type": "multiple_response", "answer_data": {"correct": [1, 2]}},
            {"id": 101, "test_id": 10, "question_text": "Order these",
             "question_type": "ranking", "answer_data": null}
        ]"#,
    )
    .write(
        "answer_options",
        r#"[
            {"id": 1000, "question_id": 100, "option_text": "A", "is_correct": true},
            {"id": 1001, "question_id": 100, "option_text": "B", "is_correct": false}
        ]"#,
    )
    .write(
        "test_attempts",
        r#"[{"id": 5, "user_id": 2, "test_id": 10, "score": 80.0, "passed": true}]"#,
    )
    .write(
        "user_answers",
        r#"[{"id": 50, "attempt_id": 5, "question_id": 100, "answer_option_id": 1000,
             "is_correct": 1}]"#,
    );
}
