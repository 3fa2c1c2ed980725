//! URI query options (`$filter`, `$orderby`, `$top`, ...).

use std::collections::{BTreeMap, HashMap};

use super::model::{OrderBy, QueryColumn, SelectQuery, Source, TableName};
use crate::ast::Operand;
use crate::error::{CompileError, Result};
use crate::lexer::{is_property_path, split_top_level, Fragment, Span};
use crate::parser::{FilterParser, ParseError};

/// The query options of a request URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// `$filter` / `where`.
    pub filter: Option<String>,
    /// `$orderby`.
    pub order_by: Option<String>,
    /// `$groupby`.
    pub group_by: Option<String>,
    /// `$select`.
    pub select: Option<String>,
    /// `$top`.
    pub top: Option<u64>,
    /// `$skip`.
    pub skip: Option<u64>,
    /// `$aggregate`.
    pub aggregate: Option<String>,
    /// `$compute`.
    pub compute: Option<String>,
    /// Every other option, verbatim. Keys starting with `@` supply values for
    /// parameters of the filter.
    pub custom: BTreeMap<String, String>,
}

impl QueryOptions {
    /// Parses a query string, with or without the leading `?`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Policy`] when `aggregate`, `compute` or
    /// `groupby` appear twice and a parse error when `top` or `skip` is not
    /// a non-negative integer.
    pub fn parse(query: &str) -> Result<Self> {
        let (body, mut offset) = match query.strip_prefix('?') {
            Some(rest) => (rest, 1),
            None => (query, 0),
        };

        let mut options = Self::default();
        for pair in body.split('&') {
            let span = Span::new(offset, offset + pair.len());
            offset += pair.len() + 1;
            if pair.is_empty() {
                continue;
            }

            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = url_decode(raw_key);
            let value = url_decode(raw_value);
            let name = key.strip_prefix('$').unwrap_or(&key).to_ascii_lowercase();
            match name.as_str() {
                "filter" | "where" => options.filter = Some(value),
                "orderby" => options.order_by = Some(value),
                "select" => options.select = Some(value),
                "groupby" => set_once(&mut options.group_by, "groupby", value)?,
                "aggregate" => set_once(&mut options.aggregate, "aggregate", value)?,
                "compute" => set_once(&mut options.compute, "compute", value)?,
                "top" => options.top = Some(parse_count("top", &value, span)?),
                "skip" => options.skip = Some(parse_count("skip", &value, span)?),
                _ => {
                    options.custom.insert(key, value);
                }
            }
        }
        tracing::debug!(custom = options.custom.len(), "parsed query options");
        Ok(options)
    }

    /// Values of the `@name=value` options, keyed without the `@`.
    #[must_use]
    pub fn parameter_values(&self) -> HashMap<String, String> {
        self.custom
            .iter()
            .filter_map(|(k, v)| k.strip_prefix('@').map(|name| (name.to_owned(), v.clone())))
            .collect()
    }

    /// Builds the `SELECT` these options describe over `table`.
    ///
    /// With `aggregate`, the output columns are the grouping keys followed by
    /// the aggregates and `select` is ignored.
    ///
    /// # Errors
    ///
    /// Propagates parse errors of every option.
    pub fn to_select(&self, table: TableName, parser: &FilterParser) -> Result<SelectQuery> {
        let mut query = SelectQuery::from(Source::Table(table));

        if let Some(filter) = self.filter.as_deref().filter(|f| !f.trim().is_empty()) {
            let mut expression = parser.parse_filter(filter)?.convert(&self.parameter_values())?;
            expression.apply_enum_types();
            query.filter = Some(expression);
        }

        if let Some(group_by) = &self.group_by {
            let (keys, rollup) = group_keys(group_by);
            query.rollup = rollup;
            for key in &keys {
                query.group_by.push(Operand::property(property_path(key, "groupby")?));
            }
        }

        let mut computed = Vec::new();
        if let Some(compute) = &self.compute {
            for item in split_top_level(compute, ',') {
                computed.push(Some(aliased_column(&item, parser)?));
            }
        }

        if let Some(aggregate) = &self.aggregate {
            for key in &query.group_by {
                if let Some(property) = key.as_property() {
                    query.columns.push(path_column(&property.value));
                }
            }
            for item in split_top_level(aggregate, ',') {
                query.columns.push(aliased_column(&item, parser)?);
            }
        } else if let Some(select) = &self.select {
            for item in split_top_level(select, ',') {
                // A selected compute alias takes the computed column's place.
                let named = computed.iter_mut().find(|slot| {
                    matches!(slot, Some(column) if column.name.eq_ignore_ascii_case(&item.text))
                });
                match named.and_then(Option::take) {
                    Some(column) => query.columns.push(column),
                    None if item.text == "*" => query.columns.push(QueryColumn::new("*")),
                    None => query.columns.push(path_column(property_path(&item, "select")?)),
                }
            }
        }

        let computed: Vec<QueryColumn> = computed.into_iter().flatten().collect();
        if !computed.is_empty() && query.columns.is_empty() {
            query.columns.push(QueryColumn::new("*"));
        }
        query.columns.extend(computed);

        if let Some(order_by) = &self.order_by {
            for item in split_top_level(order_by, ',') {
                query.order_by.push(order_key(&item.text, parser)?);
            }
        }

        query.top = self.top;
        query.skip = self.skip;
        Ok(query)
    }
}

fn set_once(slot: &mut Option<String>, name: &str, value: String) -> Result<()> {
    if slot.is_some() {
        return Err(CompileError::Policy(format!(
            "${name} may appear only once"
        )));
    }
    *slot = Some(value);
    Ok(())
}

fn parse_count(name: &str, value: &str, span: Span) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|_| {
        CompileError::Parse(
            ParseError::new(format!("${name} must be a non-negative integer"), span)
                .with_found(value),
        )
    })
}

/// Decodes `%XX` escapes and `+` in a query-string component.
fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let decoded = s
                    .get(i + 1..i + 3)
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                if let Some(byte) = decoded {
                    out.push(byte);
                    i += 2;
                } else {
                    out.push(b'%');
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// `a,b` or `rollup(a,b)`.
fn group_keys(text: &str) -> (Vec<Fragment>, bool) {
    let trimmed = text.trim();
    let inner = trimmed
        .get(..7)
        .filter(|head| head.eq_ignore_ascii_case("rollup("))
        .and_then(|_| trimmed[7..].strip_suffix(')'));
    match inner {
        Some(keys) => (split_top_level(keys, ','), true),
        None => (split_top_level(trimmed, ','), false),
    }
}

/// Checks that a `$select` or `$groupby` item is a property path.
fn property_path<'a>(item: &'a Fragment, option: &str) -> Result<&'a str> {
    if is_property_path(&item.text) {
        return Ok(&item.text);
    }
    Err(CompileError::Parse(
        ParseError::new(
            format!("${option} item '{}' is not a property path", item.text),
            Span::new(item.offset, item.offset + item.text.len()),
        )
        .with_found(item.text.as_str()),
    ))
}

/// A `$select` item: a column, or a property path exposed under its last
/// segment.
fn path_column(path: &str) -> QueryColumn {
    match path.rsplit_once('/') {
        Some((_, last)) => QueryColumn::new(last).expression(Operand::property(path)),
        None => QueryColumn::new(path),
    }
}

/// `<expression> [with <aggregate>] as <alias>`.
fn aliased_column(item: &Fragment, parser: &FilterParser) -> Result<QueryColumn> {
    let lower = item.text.to_ascii_lowercase();
    let Some(at) = lower.rfind(" as ") else {
        return Err(CompileError::Parse(ParseError::new(
            format!("'{}' needs an alias", item.text),
            Span::new(item.offset, item.offset + item.text.len()),
        )));
    };
    let alias = item.text[at + 4..].trim();
    let operand = parser.parse_operand(item.text[..at].trim())?;
    Ok(QueryColumn::new(alias).expression(operand))
}

fn order_key(item: &str, parser: &FilterParser) -> Result<OrderBy> {
    let lower = item.to_ascii_lowercase();
    if let Some(key) = lower.strip_suffix(" desc") {
        return Ok(OrderBy::desc(parser.parse_operand(item[..key.len()].trim())?));
    }
    let key = lower.strip_suffix(" asc").map_or(item, |key| &item[..key.len()]);
    Ok(OrderBy::asc(parser.parse_operand(key.trim())?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_decode() {
        assert_eq!(url_decode("Age+gt+21"), "Age gt 21");
        assert_eq!(url_decode("City%20eq%20%27Seattle%27"), "City eq 'Seattle'");
        assert_eq!(url_decode("100%"), "100%");
        assert_eq!(url_decode("caf%C3%A9"), "café");
    }

    #[test]
    fn test_group_keys() {
        let (keys, rollup) = group_keys("rollup(Region, City)");
        assert!(rollup);
        let names: Vec<&str> = keys.iter().map(|k| k.text.as_str()).collect();
        assert_eq!(names, vec!["Region", "City"]);
        assert!(!group_keys("Region").1);
    }

    #[test]
    fn test_path_column() {
        let column = path_column("Address/City");
        assert_eq!(column.name, "City");
        assert!(column.expression.is_some());
        assert!(path_column("Name").expression.is_none());
    }
}
