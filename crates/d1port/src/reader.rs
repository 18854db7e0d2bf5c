//! Export reader.
//!
//! Exports come in two shapes: a bare array of row objects, or the query
//! tool's wrapper `[{"results": [...], "success": true, "meta": {...}}]`.
//! Both are normalized to a `Vec<Row>`. An object carrying an `error` key
//! (or a wrapper with `"success": false`) is a recorded upstream failure.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{ConfigError, ExportError};
use crate::row::Row;

/// Placeholder replaced by the table name in an [`ExportNaming`] template.
pub const TABLE_PLACEHOLDER: &str = "{table}";

/// File-name template for per-table exports, e.g. `{table}_raw.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportNaming {
    template: String,
}

impl ExportNaming {
    /// Creates a naming template. It must contain `{table}`.
    pub fn new(template: impl Into<String>) -> Result<Self, ConfigError> {
        let template = template.into();
        if !template.contains(TABLE_PLACEHOLDER) {
            return Err(ConfigError::InvalidNaming(template));
        }
        Ok(Self { template })
    }

    /// Returns the file name for `table`.
    #[must_use]
    pub fn file_name(&self, table: &str) -> String {
        self.template.replace(TABLE_PLACEHOLDER, table)
    }

    /// Returns the raw template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }
}

impl Default for ExportNaming {
    fn default() -> Self {
        Self {
            template: String::from("{table}_raw.json"),
        }
    }
}

/// Where exports come from.
pub trait ExportSource {
    /// Loads the rows exported for `table`.
    fn load(&self, table: &str) -> Result<Vec<Row>, ExportError>;
}

/// Reads exports from files in a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    naming: ExportNaming,
}

impl DirectorySource {
    /// Creates a source rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>, naming: ExportNaming) -> Self {
        Self {
            dir: dir.into(),
            naming,
        }
    }

    /// Returns the path probed for `table`.
    #[must_use]
    pub fn path_for(&self, table: &str) -> PathBuf {
        self.dir.join(self.naming.file_name(table))
    }

    /// Returns the export directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file-name template.
    #[must_use]
    pub const fn naming(&self) -> &ExportNaming {
        &self.naming
    }
}

impl ExportSource for DirectorySource {
    fn load(&self, table: &str) -> Result<Vec<Row>, ExportError> {
        let path = self.path_for(table);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ExportError::Missing { path });
            }
            Err(source) => return Err(ExportError::Unreadable { path, source }),
        };
        parse_export(&text)
    }
}

/// Exports held in memory, keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    exports: HashMap<String, String>,
}

impl MemorySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the JSON text exported for `table`.
    #[must_use]
    pub fn with(mut self, table: impl Into<String>, json: impl Into<String>) -> Self {
        self.exports.insert(table.into(), json.into());
        self
    }
}

impl ExportSource for MemorySource {
    fn load(&self, table: &str) -> Result<Vec<Row>, ExportError> {
        let text = self.exports.get(table).ok_or_else(|| ExportError::Missing {
            path: PathBuf::from(table),
        })?;
        parse_export(text)
    }
}

/// Parses one export document into rows.
pub fn parse_export(text: &str) -> Result<Vec<Row>, ExportError> {
    let document: Value = serde_json::from_str(text).map_err(ExportError::parse)?;

    match document {
        Value::Object(object) => {
            check_failure(&object)?;
            match object.get("results") {
                Some(Value::Array(_)) => unwrap_results(object),
                _ => Err(ExportError::parse(
                    "expected an array of rows or a results wrapper",
                )),
            }
        }
        Value::Array(items) => {
            let wrapper = matches!(
                items.first(),
                Some(Value::Object(first)) if matches!(first.get("results"), Some(Value::Array(_)))
            );
            if !wrapper {
                return rows_from(items);
            }
            let Some(Value::Object(first)) = items.into_iter().next() else {
                return Err(ExportError::Empty);
            };
            check_failure(&first)?;
            unwrap_results(first)
        }
        other => Err(ExportError::parse(format!(
            "unexpected top-level JSON {}",
            json_kind(&other)
        ))),
    }
}

fn check_failure(object: &Map<String, Value>) -> Result<(), ExportError> {
    if let Some(error) = object.get("error") {
        let detail = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(ExportError::MarkedFailure(detail));
    }
    if matches!(object.get("success"), Some(Value::Bool(false))) {
        return Err(ExportError::MarkedFailure(String::from("success: false")));
    }
    Ok(())
}

fn unwrap_results(mut object: Map<String, Value>) -> Result<Vec<Row>, ExportError> {
    match object.remove("results") {
        Some(Value::Array(items)) => rows_from(items),
        _ => Err(ExportError::parse("results is not an array")),
    }
}

fn rows_from(items: Vec<Value>) -> Result<Vec<Row>, ExportError> {
    if items.is_empty() {
        return Err(ExportError::Empty);
    }
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(object) => Ok(Row::from_object(object)),
            other => Err(ExportError::parse(format!(
                "row {index} is a JSON {}, not an object",
                json_kind(&other)
            ))),
        })
        .collect()
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
