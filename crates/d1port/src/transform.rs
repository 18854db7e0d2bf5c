//! Value transformer.
//!
//! Rules are evaluated in a fixed priority: `NULL` short-circuits, then
//! locale remaps, then lookup remaps, then generic literal encoding.

use std::collections::BTreeMap;
use std::fmt;

use d1port_sql::SqlValue;
use serde::Serialize;

use crate::row::RawValue;

/// Locale codes rewritten by [`ValueRule::Locale`].
pub const LOCALE_CODES: &[(&str, &str)] = &[("en-US", "en"), ("zh-CN", "zh")];

/// What happens to a locale value that is not in the remap table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalePolicy {
    /// Keep the value as exported.
    #[default]
    Passthrough,
    /// Replace it with the given code.
    Fallback(String),
}

impl LocalePolicy {
    /// Falls back to English, as one of the legacy import scripts did.
    #[must_use]
    pub fn english() -> Self {
        Self::Fallback(String::from("en"))
    }
}

impl fmt::Display for LocalePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passthrough => f.write_str("passthrough"),
            Self::Fallback(code) => write!(f, "fallback to '{code}'"),
        }
    }
}

/// A per-column value rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueRule {
    /// Rewrites locale codes, honouring the configured [`LocalePolicy`].
    Locale {
        /// Destination column.
        column: String,
        /// Known codes and their replacements.
        codes: BTreeMap<String, String>,
    },
    /// Rewrites text values found in the table. Other values pass through.
    Lookup {
        /// Destination column.
        column: String,
        /// Legacy value to destination value.
        values: BTreeMap<String, String>,
    },
}

impl ValueRule {
    /// Locale rule with the standard [`LOCALE_CODES`].
    pub fn locale(column: impl Into<String>) -> Self {
        Self::Locale {
            column: column.into(),
            codes: pairs(LOCALE_CODES),
        }
    }

    /// Lookup rule built from `(from, to)` pairs.
    pub fn lookup(column: impl Into<String>, values: &[(&str, &str)]) -> Self {
        Self::Lookup {
            column: column.into(),
            values: pairs(values),
        }
    }

    /// Returns the destination column this rule applies to.
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Locale { column, .. } | Self::Lookup { column, .. } => column,
        }
    }

    const fn priority(&self) -> u8 {
        match self {
            Self::Locale { .. } => 0,
            Self::Lookup { .. } => 1,
        }
    }

    fn apply(&self, value: RawValue, locale_policy: &LocalePolicy) -> RawValue {
        match self {
            Self::Locale { codes, .. } => {
                if let Some(mapped) = value.as_text().and_then(|s| codes.get(s)) {
                    return RawValue::Text(mapped.clone());
                }
                match locale_policy {
                    LocalePolicy::Passthrough => value,
                    LocalePolicy::Fallback(code) => RawValue::Text(code.clone()),
                }
            }
            Self::Lookup { values, .. } => match value.as_text().and_then(|s| values.get(s)) {
                Some(mapped) => RawValue::Text(mapped.clone()),
                None => value,
            },
        }
    }
}

impl fmt::Display for ValueRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, column, map) = match self {
            Self::Locale { column, codes } => ("locale", column, codes),
            Self::Lookup { column, values } => ("lookup", column, values),
        };
        let entries: Vec<String> = map.iter().map(|(k, v)| format!("{k}->{v}")).collect();
        write!(f, "{kind} {column}: {}", entries.join(", "))
    }
}

fn pairs(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (String::from(*k), String::from(*v)))
        .collect()
}

/// Value rules grouped by table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueRules {
    by_table: BTreeMap<String, Vec<ValueRule>>,
}

impl ValueRules {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule for `table`. Rules are kept in priority order.
    pub fn add(&mut self, table: impl Into<String>, rule: ValueRule) {
        let rules = self.by_table.entry(table.into()).or_default();
        rules.push(rule);
        rules.sort_by_key(ValueRule::priority);
    }

    /// Returns the rules for `table`.
    #[must_use]
    pub fn for_table(&self, table: &str) -> &[ValueRule] {
        self.by_table.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the tables that carry rules.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.by_table.keys().map(String::as_str)
    }
}

/// Turns raw export values into SQL values.
#[derive(Debug, Clone, Copy)]
pub struct ValueTransformer<'a> {
    rules: &'a ValueRules,
    locale_policy: &'a LocalePolicy,
}

impl<'a> ValueTransformer<'a> {
    /// Creates a transformer over fixed rules.
    #[must_use]
    pub const fn new(rules: &'a ValueRules, locale_policy: &'a LocalePolicy) -> Self {
        Self {
            rules,
            locale_policy,
        }
    }

    /// Transforms the value destined for `table.column`.
    #[must_use]
    pub fn transform(&self, table: &str, column: &str, value: RawValue) -> SqlValue {
        if matches!(value, RawValue::Null) {
            return SqlValue::Null;
        }
        let value = self
            .rules
            .for_table(table)
            .iter()
            .filter(|rule| rule.column() == column)
            .fold(value, |value, rule| rule.apply(value, self.locale_policy));
        encode(value)
    }
}

/// Resolves a raw value into the SQL value variant used for literal output.
#[must_use]
pub fn encode(value: RawValue) -> SqlValue {
    match value {
        RawValue::Null => SqlValue::Null,
        RawValue::Bool(b) => SqlValue::Bool(b),
        RawValue::Text(s) => SqlValue::Text(s),
        RawValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                SqlValue::UInt(u)
            } else if let Some(f) = n.as_f64() {
                SqlValue::Float(f)
            } else {
                SqlValue::Text(n.to_string())
            }
        }
    }
}
