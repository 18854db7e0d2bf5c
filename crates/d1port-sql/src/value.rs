//! SQL values and inline literal encoding.
//!
//! Generated import scripts are inert text, so every value is rendered as an
//! inline literal rather than bound as a parameter. This module owns the
//! escaping rules that make that safe.

/// Options controlling how text values are rendered as SQL string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralStyle {
    /// Double embedded backslashes (`\` becomes `\\`).
    pub double_backslashes: bool,
}

impl LiteralStyle {
    /// Style used by the import scripts: quotes and backslashes are doubled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            double_backslashes: true,
        }
    }

    /// Leaves backslashes untouched. Only single quotes are doubled.
    #[must_use]
    pub const fn keep_backslashes(mut self) -> Self {
        self.double_backslashes = false;
        self
    }
}

impl Default for LiteralStyle {
    fn default() -> Self {
        Self::new()
    }
}

/// A SQL value ready to be rendered as a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value, rendered as `1` or `0`.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Unsigned integer above `i64::MAX`, rendered with its exact digits.
    UInt(u64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
}

impl SqlValue {
    /// Returns the SQL representation for inline use (escaped).
    #[must_use]
    pub fn to_sql_inline(&self, style: LiteralStyle) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => String::from(if *b { "1" } else { "0" }),
            Self::Int(n) => format!("{n}"),
            Self::UInt(n) => format!("{n}"),
            Self::Float(f) => format_float(*f),
            Self::Text(s) => format!("'{}'", escape_text(s, style)),
        }
    }

    /// Returns `true` for [`SqlValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Keeps integral floats recognisable as REAL (`2.0`, not `2`).
fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract().abs() < f64::EPSILON && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

/// Escapes the body of a string literal.
///
/// Newlines become a single space and carriage returns are removed so that
/// every statement stays on one line.
fn escape_text(s: &str, style: LiteralStyle) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '\'' => out.push_str("''"),
            '\\' if style.double_backslashes => out.push_str("\\\\"),
            '\n' => out.push(' '),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u64 {
    fn to_sql_value(self) -> SqlValue {
        i64::try_from(self).map_or(SqlValue::UInt(self), SqlValue::Int)
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}
