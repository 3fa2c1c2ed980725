//! SQL values and the per-compilation parameter context.
//!
//! Every literal that reaches generated SQL is bound as a named parameter,
//! never spliced into the statement text.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta};

use crate::ast::Literal;

/// A value bound to a SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// `BIT`.
    Bool(bool),
    /// `INT`.
    Int(i32),
    /// `BIGINT`.
    BigInt(i64),
    /// `FLOAT`.
    Float(f64),
    /// `NVARCHAR`.
    Text(String),
    /// `UNIQUEIDENTIFIER`.
    Guid(String),
    /// `DATETIME2`.
    DateTime(NaiveDateTime),
    /// `DATETIMEOFFSET`.
    DateTimeOffset(DateTime<FixedOffset>),
    /// `TIME`.
    Time(TimeDelta),
    /// `VARBINARY`.
    Binary(Vec<u8>),
}

impl SqlValue {
    /// Returns the T-SQL type used to declare a parameter holding this value.
    #[must_use]
    pub const fn sql_type(&self) -> &'static str {
        match self {
            Self::Null => "SQL_VARIANT",
            Self::Bool(_) => "BIT",
            Self::Int(_) => "INT",
            Self::BigInt(_) => "BIGINT",
            Self::Float(_) => "FLOAT",
            Self::Text(_) => "NVARCHAR(MAX)",
            Self::Guid(_) => "UNIQUEIDENTIFIER",
            Self::DateTime(_) => "DATETIME2",
            Self::DateTimeOffset(_) => "DATETIMEOFFSET",
            Self::Time(_) => "TIME",
            Self::Binary(_) => "VARBINARY(MAX)",
        }
    }

    /// Returns the SQL representation for inline use (escaped).
    ///
    /// Only parameter declarations use this; statement bodies reference the
    /// parameter by name.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => String::from(if *b { "1" } else { "0" }),
            Self::Int(n) => n.to_string(),
            Self::BigInt(n) => n.to_string(),
            Self::Float(f) => format!("{f:?}"),
            Self::Text(s) => format!("N'{}'", s.replace('\'', "''")),
            Self::Guid(g) => format!("'{g}'"),
            Self::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Self::DateTimeOffset(dt) => format!("'{}'", dt.format("%Y-%m-%dT%H:%M:%S%.f%:z")),
            Self::Time(span) => format!("'{}'", format_time(*span)),
            Self::Binary(bytes) => {
                let hex: String = bytes.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("0x{hex}")
            }
        }
    }

    /// Returns the value as JSON, for logs and command-line output.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::BigInt(n) => serde_json::Value::from(*n),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::Text(s) | Self::Guid(s) => serde_json::Value::String(s.clone()),
            Self::DateTime(dt) => serde_json::Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Self::DateTimeOffset(dt) => serde_json::Value::String(dt.to_rfc3339()),
            Self::Time(span) => serde_json::Value::String(format_time(*span)),
            Self::Binary(bytes) => {
                serde_json::Value::String(bytes.iter().map(|b| format!("{b:02X}")).collect())
            }
        }
    }
}

fn format_time(span: TimeDelta) -> String {
    let total = span.num_milliseconds();
    let (sign, total) = if total < 0 { ("-", -total) } else { ("", total) };
    let hours = total / 3_600_000;
    let minutes = (total / 60_000) % 60;
    let seconds = (total / 1000) % 60;
    let millis = total % 1000;
    if millis == 0 {
        format!("{sign}{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
    }
}

impl From<&Literal> for SqlValue {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Null => Self::Null,
            Literal::Bool(b) => Self::Bool(*b),
            Literal::Int(n) => Self::Int(*n),
            Literal::Long(n) => Self::BigInt(*n),
            Literal::Double(f) => Self::Float(*f),
            Literal::String(s) => Self::Text(s.clone()),
            Literal::Guid(g) => Self::Guid(g.clone()),
            Literal::DateTime(dt) => Self::DateTime(*dt),
            Literal::DateTimeOffset(dt) => Self::DateTimeOffset(*dt),
            Literal::TimeSpan(span) => Self::Time(*span),
            Literal::Bytes(bytes) => Self::Binary(bytes.clone()),
        }
    }
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

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::BigInt(self)
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

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::DateTime(self)
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Binary(self)
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

impl ToSqlValue for &Literal {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::from(self)
    }
}

/// A named parameter and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParameter {
    /// Name including the `@`.
    pub name: String,
    /// Bound value.
    pub value: SqlValue,
}

impl QueryParameter {
    /// `@p0 INT = 21`.
    #[must_use]
    pub fn declaration(&self) -> String {
        format!(
            "{} {} = {}",
            self.name,
            self.value.sql_type(),
            self.value.to_sql_inline()
        )
    }
}

/// Per-compilation table of generated parameter names and their values.
///
/// Created once per top-level compilation and read out once at the end; it
/// is never shared between independent compilations.
#[derive(Debug, Clone)]
pub struct ParameterContext {
    prefix: String,
    counter: usize,
    entries: Vec<QueryParameter>,
    single_row_merge: bool,
}

impl Default for ParameterContext {
    fn default() -> Self {
        Self::new("p")
    }
}

impl ParameterContext {
    /// Creates an empty context generating `@{prefix}0`, `@{prefix}1`, ...
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
            entries: Vec::new(),
            single_row_merge: false,
        }
    }

    /// Binds a value under a fresh name and returns the name.
    pub fn bind(&mut self, value: impl ToSqlValue) -> String {
        let name = format!("@{}{}", self.prefix, self.counter);
        self.counter += 1;
        self.entries.push(QueryParameter {
            name: name.clone(),
            value: value.to_sql_value(),
        });
        name
    }

    /// Number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bound parameters in binding order.
    #[must_use]
    pub fn parameters(&self) -> &[QueryParameter] {
        &self.entries
    }

    /// Takes the bound parameters out of the context.
    #[must_use]
    pub fn into_parameters(self) -> Vec<QueryParameter> {
        self.entries
    }

    /// Switches declaration rendering to one comma-joined `DECLARE`.
    pub fn set_single_row_merge(&mut self, enabled: bool) {
        self.single_row_merge = enabled;
    }

    /// Whether declarations render as one statement.
    #[must_use]
    pub const fn is_single_row_merge(&self) -> bool {
        self.single_row_merge
    }

    /// Renders `DECLARE` statements for every bound parameter.
    #[must_use]
    pub fn declarations(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        if self.single_row_merge {
            let list: Vec<String> = self.entries.iter().map(QueryParameter::declaration).collect();
            return format!("DECLARE {};", list.join(", "));
        }
        self.entries
            .iter()
            .map(|p| format!("DECLARE {};", p.declaration()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_sequential() {
        let mut ctx = ParameterContext::default();
        assert_eq!(ctx.bind(21), "@p0");
        assert_eq!(ctx.bind("Seattle"), "@p1");
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.parameters()[1].value, SqlValue::Text(String::from("Seattle")));
    }

    #[test]
    fn test_custom_prefix() {
        let mut ctx = ParameterContext::new("param");
        assert_eq!(ctx.bind(true), "@param0");
    }

    #[test]
    fn test_inline_text_is_escaped_unicode() {
        assert_eq!(
            SqlValue::Text(String::from("it's")).to_sql_inline(),
            "N'it''s'"
        );
        assert_eq!(SqlValue::Binary(vec![0x0A, 0xFF]).to_sql_inline(), "0x0AFF");
        assert_eq!(SqlValue::Bool(true).to_sql_inline(), "1");
        assert_eq!(SqlValue::Float(2.0).to_sql_inline(), "2.0");
    }

    #[test]
    fn test_declarations_one_per_parameter() {
        let mut ctx = ParameterContext::default();
        ctx.bind(21);
        ctx.bind("x");
        assert_eq!(
            ctx.declarations(),
            "DECLARE @p0 INT = 21;\nDECLARE @p1 NVARCHAR(MAX) = N'x';"
        );
    }

    #[test]
    fn test_declarations_single_row_merge() {
        let mut ctx = ParameterContext::default();
        ctx.set_single_row_merge(true);
        ctx.bind(21);
        ctx.bind(5_000_000_000_i64);
        assert_eq!(
            ctx.declarations(),
            "DECLARE @p0 INT = 21, @p1 BIGINT = 5000000000;"
        );
    }

    #[test]
    fn test_time_formatting() {
        assert_eq!(
            SqlValue::Time(TimeDelta::minutes(90)).to_sql_inline(),
            "'01:30:00'"
        );
    }
}
