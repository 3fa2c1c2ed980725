//! Renders expression trees as T-SQL boolean expressions.

use crate::ast::{
    AggregateKind, Arithmetic, ArithmeticOp, Condition, EnumValue, Expression, Function, Literal,
    Operand, Parameter, Predicate, PredicateKind, PropertyName, Quantifier, QuantifierKind, With,
};
use crate::context::RenderContext;
use crate::ddl::edm_sql_type;
use crate::dialect::{Dialect, TSql};
use crate::error::{CompileError, Result};
use crate::lexer::{is_boolean_function, is_builtin_function};
use crate::params::ParameterContext;
use crate::schema::EnumType;

use super::functions::{builtin_template, fill};

/// Walks an [`Expression`] and renders a `WHERE`/`HAVING` condition.
///
/// Literals are bound into the shared [`ParameterContext`]; the returned
/// text only references them by name.
#[derive(Debug)]
pub struct FilterSerializer<'a, 'p> {
    ctx: RenderContext<'a>,
    params: &'p mut ParameterContext,
    entity: Option<String>,
    qualifier: Option<String>,
    aliases: usize,
    depth: usize,
}

impl<'a, 'p> FilterSerializer<'a, 'p> {
    /// Creates a serializer binding into `params`.
    pub fn new(ctx: RenderContext<'a>, params: &'p mut ParameterContext) -> Self {
        Self {
            ctx,
            params,
            entity: None,
            qualifier: None,
            aliases: 0,
            depth: 0,
        }
    }

    /// Scopes the serializer to an entity table.
    ///
    /// The entity name is used to look up navigations for `any`/`all`; the
    /// qualifier (table alias) prefixes unqualified columns and correlates
    /// quantifier subqueries. Without a qualifier, subqueries correlate on
    /// the entity name.
    #[must_use]
    pub fn for_entity(mut self, entity: impl Into<String>, qualifier: Option<String>) -> Self {
        self.entity = Some(entity.into());
        self.qualifier = qualifier;
        self
    }

    /// Renders a boolean expression.
    ///
    /// # Errors
    ///
    /// Fails on unsupported functions, unknown enum types, unmappable
    /// cast targets, and quantifiers without navigation metadata.
    pub fn serialize(&mut self, expression: &Expression) -> Result<String> {
        let sql = self.expression(expression)?;
        tracing::debug!(parameters = self.params.len(), "serialized filter");
        Ok(sql)
    }

    /// Renders a value expression (column list, order key, group key).
    ///
    /// # Errors
    ///
    /// Same as [`FilterSerializer::serialize`].
    pub fn serialize_operand(&mut self, operand: &Operand) -> Result<String> {
        self.operand(operand)
    }

    fn expression(&mut self, expression: &Expression) -> Result<String> {
        match expression {
            Expression::Condition(c) => self.condition(c),
            Expression::Predicate(p) => self.predicate(p),
            Expression::Quantifier(q) => self.quantifier(q),
        }
    }

    fn condition(&mut self, condition: &Condition) -> Result<String> {
        let mut items = Vec::new();
        flatten(condition, &mut items);
        match items.as_slice() {
            [] => Err(CompileError::InvalidExpression(format!(
                "empty '{}' condition",
                condition.kind.as_str()
            ))),
            [single] => self.expression(single),
            _ => {
                self.depth += 1;
                let rendered = items
                    .iter()
                    .map(|item| self.expression(item))
                    .collect::<Result<Vec<_>>>();
                self.depth -= 1;
                let keyword = condition.kind.as_sql();
                let separator = if self.ctx.options.pretty {
                    format!("\n{}{keyword} ", "  ".repeat(self.depth + 1))
                } else {
                    format!(" {keyword} ")
                };
                Ok(format!("({})", rendered?.join(&separator)))
            }
        }
    }

    fn predicate(&mut self, p: &Predicate) -> Result<String> {
        if let Some(sql) = self.boolean_comparison(p)? {
            return Ok(sql);
        }
        if let Some(sql) = self.enum_comparison(p)? {
            return Ok(sql);
        }

        let (subject, object) = match p.kind {
            PredicateKind::Eq | PredicateKind::Ne
                if p.subject.is_null() && !p.predicate.is_null() =>
            {
                (&p.predicate, &p.subject)
            }
            _ => (&p.subject, &p.predicate),
        };
        let lhs = self.operand(subject)?;

        match (p.kind, object) {
            (PredicateKind::Eq, rhs) if rhs.is_null() => Ok(format!("({lhs} IS NULL)")),
            (PredicateKind::Ne, rhs) if rhs.is_null() => Ok(format!("({lhs} IS NOT NULL)")),
            (PredicateKind::Eq, Operand::List(_)) | (PredicateKind::In, Operand::List(_)) => {
                let list = self.list(object)?;
                Ok(format!("({lhs} IN {list})"))
            }
            (PredicateKind::Ne, Operand::List(_)) => {
                let list = self.list(object)?;
                Ok(format!("({lhs} NOT IN {list})"))
            }
            (PredicateKind::In, Operand::Property(prop)) if prop.is_array => {
                let rhs = self.property(prop);
                Ok(format!(
                    "({lhs} IN (SELECT [value] FROM OPENJSON({rhs})))"
                ))
            }
            (PredicateKind::In, rhs) => {
                let rhs = self.operand(rhs)?;
                Ok(format!("({lhs} IN ({rhs}))"))
            }
            (PredicateKind::Has, rhs) => {
                // Rendered once; a bound parameter is referenced twice.
                let mask = self.operand(rhs)?;
                Ok(format!("(({lhs} & {mask}) = {mask})"))
            }
            (kind, rhs) => {
                let rhs = self.operand(rhs)?;
                Ok(format!("({lhs} {} {rhs})", comparison_sql(kind)))
            }
        }
    }

    /// `f(...) eq true` and friends, including the implicit form written as
    /// a bare call.
    fn boolean_comparison(&mut self, p: &Predicate) -> Result<Option<String>> {
        let (Operand::Function(function), Operand::Literal(Literal::Bool(expected))) =
            (&p.subject, &p.predicate)
        else {
            return Ok(None);
        };
        let truth = match p.kind {
            PredicateKind::Eq => *expected,
            PredicateKind::Ne => !*expected,
            _ => return Ok(None),
        };

        if is_boolean_function(&function.name) {
            let sql = self.boolean_function(function)?;
            return Ok(Some(if truth { sql } else { format!("NOT ({sql})") }));
        }
        if p.implicit {
            let sql = self.call(function)?;
            let bit = if truth == function.negate { 0 } else { 1 };
            return Ok(Some(format!("({sql} = {bit})")));
        }
        Ok(None)
    }

    fn enum_comparison(&mut self, p: &Predicate) -> Result<Option<String>> {
        let enum_value = match (&p.subject, &p.predicate) {
            (_, Operand::Enum(e)) | (Operand::Enum(e), _) => e,
            _ => return Ok(None),
        };
        if matches!((&p.subject, &p.predicate), (Operand::Enum(_), Operand::Enum(_))) {
            return Err(CompileError::InvalidExpression(String::from(
                "cannot compare two enum literals",
            )));
        }
        let meta = self.resolve_enum(&enum_value.type_name)?;
        let value = member_value(&meta, enum_value)?;

        let bitwise = meta.flags || p.kind == PredicateKind::Has;
        let rendered = |this: &mut Self, operand: &Operand| -> Result<String> {
            match operand {
                Operand::Enum(_) if bitwise => Ok(value.to_string()),
                Operand::Enum(_) => Ok(format!("CAST({value} AS {})", int_type(&meta)?)),
                other => this.operand(other),
            }
        };

        if bitwise {
            let column = match &p.subject {
                Operand::Enum(_) => &p.predicate,
                other => other,
            };
            let lhs = self.operand(column)?;
            return match p.kind {
                PredicateKind::Eq | PredicateKind::Has => {
                    Ok(Some(format!("({lhs} & {value} != 0)")))
                }
                PredicateKind::Ne => Ok(Some(format!("({lhs} & {value} = 0)"))),
                kind => {
                    let lhs = rendered(self, &p.subject)?;
                    let rhs = rendered(self, &p.predicate)?;
                    Ok(Some(format!("({lhs} {} {rhs})", comparison_sql(kind))))
                }
            };
        }

        let lhs = rendered(self, &p.subject)?;
        let rhs = rendered(self, &p.predicate)?;
        Ok(Some(format!("({lhs} {} {rhs})", comparison_sql(p.kind))))
    }

    fn resolve_enum(&self, type_name: &str) -> Result<std::sync::Arc<EnumType>> {
        let cache = self.ctx.enums.ok_or_else(|| {
            CompileError::unsupported_type(type_name, "no enum metadata is available")
        })?;
        cache
            .lookup(type_name)
            .ok_or_else(|| CompileError::unsupported_type(type_name, "not a known enum type"))
    }

    fn quantifier(&mut self, q: &Quantifier) -> Result<String> {
        let label = format!("{}/{}", q.name, q.kind.as_str());
        let entity = self.entity.clone().ok_or_else(|| {
            CompileError::NotSupported(format!("'{label}' outside an entity scope"))
        })?;
        let schema = self.ctx.schema.ok_or_else(|| {
            CompileError::NotSupported(format!("'{label}' without navigation metadata"))
        })?;
        let navigation = schema.navigation(&entity, &q.name).ok_or_else(|| {
            CompileError::NotSupported(format!("'{label}': '{entity}' has no navigation '{}'", q.name))
        })?;
        if navigation.keys.is_empty() {
            return Err(CompileError::InvalidExpression(format!(
                "navigation '{}' has no join columns",
                navigation.name
            )));
        }

        let alias = match &q.variable {
            Some(variable) => variable.clone(),
            None => {
                let alias = format!("q{}", self.aliases);
                self.aliases += 1;
                alias
            }
        };
        let outer = self.qualifier.clone().unwrap_or_else(|| entity.clone());
        let join = navigation
            .keys
            .iter()
            .map(|(parent, child)| {
                format!(
                    "{} = {}",
                    TSql.quote_path([alias.as_str(), child.as_str()]),
                    TSql.quote_path([outer.as_str(), parent.as_str()])
                )
            })
            .collect::<Vec<_>>()
            .join(" AND ");

        let body = match q.item.as_deref() {
            Some(item) => {
                let mut scoped = item.deep_copy();
                scoped.default_prefixes(&alias);
                let saved_entity = self.entity.replace(navigation.target.clone());
                let saved_qualifier = self.qualifier.replace(alias.clone());
                let body = self.expression(&scoped);
                self.entity = saved_entity;
                self.qualifier = saved_qualifier;
                Some(body?)
            }
            None => None,
        };

        let from = format!(
            "SELECT 1 FROM {} AS {}",
            quote_table(&navigation.target),
            TSql.quote_identifier(&alias)
        );
        match (q.kind, body) {
            (QuantifierKind::Any, None) => Ok(format!("EXISTS ({from} WHERE {join})")),
            (QuantifierKind::Any, Some(body)) => {
                Ok(format!("EXISTS ({from} WHERE {join} AND {body})"))
            }
            (QuantifierKind::All, Some(body)) => {
                Ok(format!("NOT EXISTS ({from} WHERE {join} AND NOT ({body}))"))
            }
            (QuantifierKind::All, None) => Err(CompileError::InvalidExpression(format!(
                "'{label}' requires a predicate"
            ))),
        }
    }

    fn operand(&mut self, operand: &Operand) -> Result<String> {
        match operand {
            Operand::Property(p) => Ok(self.property(p)),
            Operand::Parameter(p) => Ok(parameter(p)),
            Operand::Literal(Literal::Null) => Ok(String::from("NULL")),
            Operand::Literal(literal) => Ok(self.params.bind(literal)),
            Operand::Enum(e) => {
                let meta = self.resolve_enum(&e.type_name)?;
                let value = member_value(&meta, e)?;
                if meta.flags {
                    Ok(value.to_string())
                } else {
                    Ok(format!("CAST({value} AS {})", int_type(&meta)?))
                }
            }
            Operand::List(_) => self.list(operand),
            Operand::Function(f) => self.function(f),
            Operand::Arithmetic(a) => self.arithmetic(a),
            Operand::With(w) => self.aggregate(w),
        }
    }

    fn property(&self, p: &PropertyName) -> String {
        let qualifier = p.qualifier().or(self.qualifier.as_deref());
        let segments: Vec<&str> = if p.is_element() {
            vec!["value"]
        } else {
            p.value.split('/').collect()
        };
        TSql.quote_path(qualifier.into_iter().chain(segments))
    }

    fn list(&mut self, operand: &Operand) -> Result<String> {
        let Operand::List(list) = operand else {
            let single = self.operand(operand)?;
            return Ok(format!("({single})"));
        };
        if list.items.is_empty() {
            return Err(CompileError::InvalidExpression(String::from(
                "empty value list",
            )));
        }
        let items = list
            .items
            .iter()
            .map(|item| self.operand(item))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("({})", items.join(", ")))
    }

    fn arithmetic(&mut self, a: &Arithmetic) -> Result<String> {
        if let (Operand::Parameter(p), ArithmeticOp::Add | ArithmeticOp::Sub) = (&a.subject, a.op) {
            if let Some(base) = relative_date(&p.value) {
                return self.date_offset(base, a.op, &a.predicate);
            }
        }
        let lhs = self.operand(&a.subject)?;
        let rhs = self.operand(&a.predicate)?;
        match a.op {
            ArithmeticOp::DivBy => Ok(format!("(CAST({lhs} AS FLOAT) / {rhs})")),
            op => Ok(format!("({lhs} {} {rhs})", op.as_sql())),
        }
    }

    /// `@Today sub 7` becomes `DATEADD(DAY, -@p0, ...)`; a duration offset
    /// counts hours instead of days.
    fn date_offset(&mut self, base: &str, op: ArithmeticOp, offset: &Operand) -> Result<String> {
        let (unit, amount) = match offset {
            Operand::Literal(Literal::TimeSpan(span)) => {
                let hours = i32::try_from(span.num_hours()).map_err(|_| {
                    CompileError::InvalidExpression(String::from("duration offset out of range"))
                })?;
                ("HOUR", self.params.bind(hours))
            }
            other => ("DAY", self.operand(other)?),
        };
        let sign = if op == ArithmeticOp::Sub { "-" } else { "" };
        Ok(format!("DATEADD({unit}, {sign}{amount}, {base})"))
    }

    fn aggregate(&mut self, w: &With) -> Result<String> {
        let inner = self.operand(&w.predicate)?;
        Ok(match w.aggregate {
            AggregateKind::Sum => format!("SUM({inner})"),
            AggregateKind::Min => format!("MIN({inner})"),
            AggregateKind::Max => format!("MAX({inner})"),
            AggregateKind::Average => format!("AVG({inner})"),
            AggregateKind::Count => format!("COUNT({inner})"),
            AggregateKind::CountDistinct => format!("COUNT(DISTINCT {inner})"),
            AggregateKind::Merge => format!("STRING_AGG(CAST({inner} AS NVARCHAR(MAX)), ',')"),
            AggregateKind::None => inner,
        })
    }

    /// A function in value position.
    fn function(&mut self, f: &Function) -> Result<String> {
        if is_boolean_function(&f.name) {
            let test = self.boolean_function(f)?;
            return Ok(format!("CASE WHEN {test} THEN 1 ELSE 0 END"));
        }
        if f.negate {
            return Err(CompileError::InvalidExpression(format!(
                "'not' cannot negate the value of '{}'",
                f.name
            )));
        }
        self.call(f)
    }

    /// Renders a scalar call through the built-in table, then the
    /// user-defined registry.
    fn call(&mut self, f: &Function) -> Result<String> {
        match f.name.as_str() {
            "cast" => return self.cast(f),
            "concat" if f.arguments.len() >= 2 => {
                let args = self.arguments(f)?;
                return Ok(format!("CONCAT({})", args.join(", ")));
            }
            _ => {}
        }
        let args = self.arguments(f)?;
        if let Some(template) = builtin_template(&f.name, args.len()) {
            return Ok(fill(template, &args));
        }
        if is_builtin_function(&f.name) {
            return Err(CompileError::InvalidExpression(format!(
                "'{}' does not take {} argument(s)",
                f.name,
                args.len()
            )));
        }
        match self.ctx.functions.and_then(|registry| registry.lookup(&f.name)) {
            Some(function) => function.render(&f.name, &args),
            None => Err(CompileError::NotSupported(format!("function '{}'", f.name))),
        }
    }

    fn arguments(&mut self, f: &Function) -> Result<Vec<String>> {
        f.arguments.iter().map(|a| self.operand(a)).collect()
    }

    fn cast(&mut self, f: &Function) -> Result<String> {
        let [value, target] = f.arguments.as_slice() else {
            return Err(CompileError::InvalidExpression(String::from(
                "'cast' takes a value and a type name",
            )));
        };
        let type_name = type_argument(target)?;
        let sql_type = edm_sql_type(type_name)
            .ok_or_else(|| CompileError::unsupported_type(type_name, "no SQL mapping for cast target"))?;
        let value = self.operand(value)?;
        Ok(format!("CAST({value} AS {sql_type})"))
    }

    /// A boolean function as a condition, honouring `not`.
    fn boolean_function(&mut self, f: &Function) -> Result<String> {
        match f.name.as_str() {
            "contains" | "startswith" | "endswith" => self.like(f),
            "isof" => {
                let target = f.arguments.last().ok_or_else(|| {
                    CompileError::InvalidExpression(String::from("'isof' requires a type name"))
                })?;
                let type_name = type_argument(target)?;
                let column = TSql.quote_path(
                    self.qualifier
                        .as_deref()
                        .into_iter()
                        .chain([self.ctx.options.type_discriminator.as_str()]),
                );
                let exact = self.params.bind(type_name);
                let derived = self.params.bind(format!("%.{type_name}"));
                let test = format!("({column} = {exact} OR {column} LIKE {derived})");
                Ok(if f.negate { format!("NOT {test}") } else { test })
            }
            _ => {
                let sql = self.call(f)?;
                let bit = if f.negate { 0 } else { 1 };
                Ok(format!("({sql} = {bit})"))
            }
        }
    }

    fn like(&mut self, f: &Function) -> Result<String> {
        let [subject, pattern] = f.arguments.as_slice() else {
            return Err(CompileError::InvalidExpression(format!(
                "'{}' takes two arguments",
                f.name
            )));
        };
        let subject = self.operand(subject)?;
        let not = if f.negate { "NOT " } else { "" };
        match pattern {
            Operand::List(_) => {
                let list = self.list(pattern)?;
                Ok(format!("{subject} {not}IN {list}"))
            }
            Operand::Literal(Literal::String(text)) => {
                let escaped = escape_like(text);
                let pattern = match f.name.as_str() {
                    "startswith" => format!("{escaped}%"),
                    "endswith" => format!("%{escaped}"),
                    _ => format!("%{escaped}%"),
                };
                let name = self.params.bind(pattern);
                Ok(format!("{subject} {not}LIKE {name}"))
            }
            other => {
                let value = self.operand(other)?;
                let pattern = match f.name.as_str() {
                    "startswith" => format!("{value} + '%'"),
                    "endswith" => format!("'%' + {value}"),
                    _ => format!("'%' + {value} + '%'"),
                };
                Ok(format!("{subject} {not}LIKE {pattern}"))
            }
        }
    }
}

/// Collects the items of a condition, pulling nested conditions of the same
/// kind into the same run.
fn flatten<'e>(condition: &'e Condition, out: &mut Vec<&'e Expression>) {
    for item in &condition.items {
        match item {
            Expression::Condition(inner) if inner.kind == condition.kind => flatten(inner, out),
            other => out.push(other),
        }
    }
}

const fn comparison_sql(kind: PredicateKind) -> &'static str {
    match kind {
        PredicateKind::Eq | PredicateKind::Has => "=",
        PredicateKind::Ne => "!=",
        PredicateKind::Gt => ">",
        PredicateKind::Ge => ">=",
        PredicateKind::Lt => "<",
        PredicateKind::Le => "<=",
        PredicateKind::In => "IN",
    }
}

/// SQL for the relative-date placeholders.
fn relative_date(name: &str) -> Option<&'static str> {
    const DATES: &[(&str, &str)] = &[
        ("Now", "GETDATE()"),
        ("UtcNow", "GETUTCDATE()"),
        ("Today", "CAST(GETDATE() AS DATE)"),
        ("UtcToday", "CAST(GETUTCDATE() AS DATE)"),
    ];
    DATES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, sql)| *sql)
}

fn parameter(p: &Parameter) -> String {
    if let Some(sql) = relative_date(&p.value) {
        return String::from(sql);
    }
    tracing::warn!(name = %p.value, "unbound parameter rendered as a SQL variable");
    format!("@{}", p.value)
}

fn member_value(meta: &EnumType, e: &EnumValue) -> Result<i64> {
    meta.value_of(&e.value).ok_or_else(|| {
        CompileError::unsupported_type(&meta.name, format!("'{}' is not a member", e.value))
    })
}

fn int_type(meta: &EnumType) -> Result<&'static str> {
    match meta.underlying_bits {
        8 => Ok("TINYINT"),
        16 => Ok("SMALLINT"),
        32 => Ok("INT"),
        64 => Ok("BIGINT"),
        bits => Err(CompileError::unsupported_type(
            &meta.name,
            format!("unsupported underlying width of {bits} bits"),
        )),
    }
}

fn type_argument(operand: &Operand) -> Result<&str> {
    match operand {
        Operand::Property(p) => Ok(&p.value),
        Operand::Literal(Literal::String(s)) => Ok(s),
        _ => Err(CompileError::InvalidExpression(String::from(
            "expected a type name",
        ))),
    }
}

/// Escapes `LIKE` wildcards so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '[' => out.push_str("[[]"),
            '%' => out.push_str("[%]"),
            '_' => out.push_str("[_]"),
            c => out.push(c),
        }
    }
    out
}

/// Quotes a possibly schema-qualified table name.
pub(crate) fn quote_table(name: &str) -> String {
    if name.starts_with('@') || name.starts_with('#') {
        return String::from(name);
    }
    TSql.quote_path(name.split('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerOptions;
    use crate::params::SqlValue;
    use crate::parser::FilterParser;

    fn render(filter: &str) -> (String, Vec<SqlValue>) {
        let options = CompilerOptions::default();
        let mut params = ParameterContext::default();
        let expression = FilterParser::new().parse_filter(filter).unwrap();
        let sql = FilterSerializer::new(RenderContext::new(&options), &mut params)
            .serialize(&expression)
            .unwrap();
        let values = params.into_parameters().into_iter().map(|p| p.value).collect();
        (sql, values)
    }

    #[test]
    fn test_null_comparisons() {
        assert_eq!(render("Name eq null").0, "([Name] IS NULL)");
        assert_eq!(render("Name ne null").0, "([Name] IS NOT NULL)");
    }

    #[test]
    fn test_like_escapes_wildcards() {
        let (sql, values) = render("startswith(Code,'10%_')");
        assert_eq!(sql, "[Code] LIKE @p0");
        assert_eq!(values, vec![SqlValue::Text(String::from("10[%][_]%"))]);
    }

    #[test]
    fn test_relative_dates() {
        let (sql, values) = render("Created ge @Today sub 7");
        assert_eq!(sql, "([Created] >= DATEADD(DAY, -@p0, CAST(GETDATE() AS DATE)))");
        assert_eq!(values, vec![SqlValue::Int(7)]);

        let (sql, values) = render("Due lt @Now add duration'PT2H'");
        assert_eq!(sql, "([Due] < DATEADD(HOUR, @p0, GETDATE()))");
        assert_eq!(values, vec![SqlValue::Int(2)]);
    }

    #[test]
    fn test_divby_is_floating_point() {
        assert_eq!(
            render("Total divby Count gt 2").0,
            "((CAST([Total] AS FLOAT) / [Count]) > @p0)"
        );
    }

    #[test]
    fn test_flatten_same_kind() {
        let expression = Expression::Condition(Condition::new(
            crate::ast::ConditionKind::And,
            vec![
                Expression::Condition(Condition::new(
                    crate::ast::ConditionKind::And,
                    vec![FilterParser::new().parse_filter("A eq 1").unwrap()],
                )),
                FilterParser::new().parse_filter("B eq 2").unwrap(),
            ],
        ));
        let options = CompilerOptions::default();
        let mut params = ParameterContext::default();
        let sql = FilterSerializer::new(RenderContext::new(&options), &mut params)
            .serialize(&expression)
            .unwrap();
        assert_eq!(sql, "(([A] = @p0) AND ([B] = @p1))");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("a[b]%c_"), "a[[]b][%]c[_]");
    }

    #[test]
    fn test_quote_table() {
        assert_eq!(quote_table("dbo.Orders"), "[dbo].[Orders]");
        assert_eq!(quote_table("@paths"), "@paths");
    }
}
