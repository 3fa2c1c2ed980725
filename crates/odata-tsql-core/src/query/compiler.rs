//! Statement rendering.

use super::merge::{MergeAction, MergeQuery};
use super::model::{
    ColumnExpression, ColumnRole, DeleteQuery, InsertQuery, Join, QueryColumn, ScriptQuery,
    SelectQuery, Source, Statement, TableName, UnionQuery,
};
use crate::ast::Expression;
use crate::config::CompilerOptions;
use crate::context::RenderContext;
use crate::dialect::{Dialect, TSql};
use crate::error::{CompileError, Result};
use crate::filter::{quote_table, FilterSerializer};
use crate::params::{ParameterContext, QueryParameter};

/// A rendered statement and the parameters it references.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// Statement text.
    pub sql: String,
    /// Bound parameters in binding order.
    pub parameters: Vec<QueryParameter>,
    /// `DECLARE` statements for the parameters.
    pub declarations: String,
}

impl CompiledQuery {
    /// The declarations followed by the statement, runnable as one batch.
    #[must_use]
    pub fn batch(&self) -> String {
        if self.declarations.is_empty() {
            self.sql.clone()
        } else {
            format!("{}\n{}", self.declarations, self.sql)
        }
    }
}

/// Renders [`Statement`]s, delegating filter clauses to [`FilterSerializer`].
#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler<'a> {
    ctx: RenderContext<'a>,
}

impl<'a> QueryCompiler<'a> {
    /// Creates a compiler.
    #[must_use]
    pub const fn new(ctx: RenderContext<'a>) -> Self {
        Self { ctx }
    }

    /// The options statements are rendered with.
    #[must_use]
    pub const fn options(&self) -> &'a CompilerOptions {
        self.ctx.options
    }

    /// Renders a statement with a fresh parameter context.
    ///
    /// # Errors
    ///
    /// Fails on policy violations (`$skip` without an order, `OUTPUT` on a
    /// bulk merge, ...) and on any filter serialization error.
    pub fn compile(&self, statement: &Statement) -> Result<CompiledQuery> {
        let mut params = ParameterContext::new(self.ctx.options.parameter_prefix.clone());
        let sql = self.render(statement, &mut params)?;
        tracing::debug!(
            kind = statement.kind(),
            parameters = params.len(),
            "compiled statement"
        );
        Ok(CompiledQuery {
            sql,
            declarations: params.declarations(),
            parameters: params.into_parameters(),
        })
    }

    /// Renders a statement into an existing parameter context.
    ///
    /// # Errors
    ///
    /// Same as [`QueryCompiler::compile`].
    pub fn render(&self, statement: &Statement, params: &mut ParameterContext) -> Result<String> {
        match statement {
            Statement::Select(q) => self.select(q, params),
            Statement::Insert(q) => self.insert(q, params),
            Statement::Delete(q) => self.delete(q, params),
            Statement::Merge(q) => self.merge(q, params),
            Statement::Union(q) => self.union(q, params),
            Statement::Script(q) => self.script(q, params),
            Statement::Raw(sql) => Ok(sql.clone()),
        }
    }

    fn separator(&self) -> &'static str {
        self.ctx.options.clause_separator()
    }

    fn serializer<'p>(
        &self,
        source: &Source,
        params: &'p mut ParameterContext,
    ) -> FilterSerializer<'a, 'p> {
        FilterSerializer::new(self.ctx, params)
            .for_entity(source.entity(), source.alias().map(String::from))
    }

    fn condition(&self, expression: &Expression, source: &Source, params: &mut ParameterContext) -> Result<String> {
        self.serializer(source, params).serialize(expression)
    }

    /// Renders a `SELECT`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Policy`] when rows are skipped without an order.
    pub fn select(&self, q: &SelectQuery, params: &mut ParameterContext) -> Result<String> {
        if q.skip.is_some() && q.order_by.is_empty() {
            return Err(CompileError::Policy(String::from(
                "$skip requires $orderby",
            )));
        }
        let paged = !q.order_by.is_empty() && (q.skip.is_some() || q.top.is_some());

        let mut head = String::from("SELECT");
        if q.distinct {
            head.push_str(" DISTINCT");
        }
        if let Some(top) = q.top.filter(|_| !paged) {
            head.push_str(&format!(" TOP ({top})"));
        }
        let columns = if q.columns.is_empty() {
            String::from("*")
        } else {
            q.columns
                .iter()
                .map(|c| self.select_column(c, &q.source, params))
                .collect::<Result<Vec<_>>>()?
                .join(", ")
        };

        let mut clauses = vec![
            format!("{head} {columns}"),
            format!("FROM {}", self.source(&q.source, params)?),
        ];
        for join in &q.joins {
            clauses.push(self.join(join, &q.source, params)?);
        }
        if let Some(filter) = &q.filter {
            clauses.push(format!("WHERE {}", self.condition(filter, &q.source, params)?));
        }
        if !q.group_by.is_empty() {
            let keys = q
                .group_by
                .iter()
                .map(|k| self.serializer(&q.source, params).serialize_operand(k))
                .collect::<Result<Vec<_>>>()?
                .join(", ");
            clauses.push(if q.rollup {
                format!("GROUP BY ROLLUP({keys})")
            } else {
                format!("GROUP BY {keys}")
            });
        }
        if let Some(having) = &q.having {
            clauses.push(format!("HAVING {}", self.condition(having, &q.source, params)?));
        }
        if !q.order_by.is_empty() {
            let keys = q
                .order_by
                .iter()
                .map(|o| {
                    let key = self.serializer(&q.source, params).serialize_operand(&o.operand)?;
                    Ok(format!("{key} {}", if o.descending { "DESC" } else { "ASC" }))
                })
                .collect::<Result<Vec<_>>>()?
                .join(", ");
            clauses.push(format!("ORDER BY {keys}"));
        }
        if paged {
            let mut paging = format!("OFFSET {} ROWS", q.skip.unwrap_or(0));
            if let Some(top) = q.top {
                paging.push_str(&format!(" FETCH NEXT {top} ROWS ONLY"));
            }
            clauses.push(paging);
        }

        let sql = clauses.join(self.separator());
        Ok(with_prolog(q.prolog.as_deref(), sql))
    }

    fn select_column(&self, column: &QueryColumn, source: &Source, params: &mut ParameterContext) -> Result<String> {
        let name = TSql.quote_identifier(column.output_name());
        match &column.expression {
            Some(ColumnExpression::Operand(operand)) => {
                let value = self.serializer(source, params).serialize_operand(operand)?;
                Ok(format!("{value} AS {name}"))
            }
            Some(ColumnExpression::Raw(sql)) => Ok(format!("{sql} AS {name}")),
            None => {
                let qualifier = column.source.as_deref().or_else(|| source.alias());
                let reference = column_reference(qualifier, &column.name);
                Ok(match &column.alias {
                    Some(_) => format!("{reference} AS {name}"),
                    None => reference,
                })
            }
        }
    }

    fn join(&self, join: &Join, outer: &Source, params: &mut ParameterContext) -> Result<String> {
        let source = self.source(&join.source, params)?;
        match &join.on {
            Some(on) => Ok(format!(
                "{} {source} ON {}",
                join.kind.as_sql(),
                self.condition(on, outer, params)?
            )),
            None => Ok(format!("{} {source}", join.kind.as_sql())),
        }
    }

    fn source(&self, source: &Source, params: &mut ParameterContext) -> Result<String> {
        match source {
            Source::Table(table) => Ok(aliased_table(table)),
            Source::Select(query, alias) => Ok(format!(
                "({}) AS {}",
                self.select(query, params)?,
                TSql.quote_identifier(alias)
            )),
            Source::Script(sql, alias) => Ok(format!("({sql}) AS {}", TSql.quote_identifier(alias))),
            Source::Union(query, alias) => Ok(format!(
                "({}) AS {}",
                self.union(query, params)?,
                TSql.quote_identifier(alias)
            )),
            Source::Row(columns, alias) => {
                let values = columns
                    .iter()
                    .map(|c| {
                        let value = self.write_value(c, None, params)?;
                        Ok(format!("{value} AS {}", TSql.quote_identifier(&c.name)))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!(
                    "(SELECT {}) AS {}",
                    values.join(", "),
                    TSql.quote_identifier(alias)
                ))
            }
        }
    }

    /// The value written into `column`: its explicit expression, else the
    /// default implied by its role, else `fallback`.
    fn write_value(
        &self,
        column: &QueryColumn,
        fallback: Option<String>,
        params: &mut ParameterContext,
    ) -> Result<String> {
        match &column.expression {
            Some(ColumnExpression::Operand(operand)) => {
                return FilterSerializer::new(self.ctx, params).serialize_operand(operand);
            }
            Some(ColumnExpression::Raw(sql)) => return Ok(sql.clone()),
            None => {}
        }
        match column.role {
            ColumnRole::InsertedAt | ColumnRole::UpdatedAt => Ok(String::from("GETUTCDATE()")),
            ColumnRole::InsertedBy | ColumnRole::UpdatedBy => Ok(match self.ctx.options.audit_user() {
                Some(user) => params.bind(user),
                None => String::from("SUSER_SNAME()"),
            }),
            ColumnRole::None | ColumnRole::Computed | ColumnRole::Concurrency => {
                fallback.ok_or_else(|| {
                    CompileError::Policy(format!("column '{}' has no value", column.name))
                })
            }
        }
    }

    /// Renders an `INSERT`; computed and concurrency columns are skipped.
    ///
    /// # Errors
    ///
    /// Fails when no column is writable or a column has no value.
    pub fn insert(&self, q: &InsertQuery, params: &mut ParameterContext) -> Result<String> {
        let columns: Vec<&QueryColumn> = q.columns.iter().filter(|c| c.role.is_insertable()).collect();
        if columns.is_empty() {
            return Err(CompileError::Policy(format!(
                "insert into '{}' writes no columns",
                q.target.name
            )));
        }
        let names = columns
            .iter()
            .map(|c| TSql.quote_identifier(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let qualifier = q.source.as_ref().map(Source::alias);
        let values = columns
            .iter()
            .map(|c| {
                let fallback = qualifier.map(|alias| column_reference(alias, &c.name));
                self.write_value(c, fallback, params)
            })
            .collect::<Result<Vec<_>>>()?
            .join(", ");

        let target = table_reference(&q.target);
        let sql = match &q.source {
            None => format!("INSERT INTO {target} ({names}) VALUES ({values})"),
            Some(source) => format!(
                "INSERT INTO {target} ({names}){}SELECT {values} FROM {}",
                self.separator(),
                self.source(source, params)?
            ),
        };
        Ok(with_prolog(q.prolog.as_deref(), sql))
    }

    /// Renders a `DELETE`.
    ///
    /// # Errors
    ///
    /// Propagates filter serialization errors.
    pub fn delete(&self, q: &DeleteQuery, params: &mut ParameterContext) -> Result<String> {
        let top = q.top.map(|n| format!("TOP ({n}) ")).unwrap_or_default();
        let target = table_reference(&q.target);
        let mut sql = match &q.target.alias {
            Some(alias) => format!(
                "DELETE {top}{} FROM {target} AS {}",
                TSql.quote_identifier(alias),
                TSql.quote_identifier(alias)
            ),
            None => format!("DELETE {top}FROM {target}"),
        };
        if let Some(filter) = &q.filter {
            let source = Source::Table(q.target.clone());
            sql.push_str(self.separator());
            sql.push_str(&format!("WHERE {}", self.condition(filter, &source, params)?));
        }
        Ok(with_prolog(q.prolog.as_deref(), sql))
    }

    /// Renders a `MERGE`, wrapped in its concurrency check when one is set.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Policy`] for `OUTPUT` on a bulk merge, a merge
    /// without key columns or without any branch writing at least one column.
    pub fn merge(&self, q: &MergeQuery, params: &mut ParameterContext) -> Result<String> {
        if q.bulk && !q.output.is_empty() {
            return Err(CompileError::Policy(String::from(
                "OUTPUT columns cannot be used on a bulk merge",
            )));
        }
        if matches!(q.source, Source::Row(..)) {
            params.set_single_row_merge(true);
        }

        let target_alias = q.target.alias.clone().unwrap_or_else(|| String::from("target"));
        let (source_sql, source_alias) = match &q.source {
            Source::Table(table) if table.alias.is_none() => {
                (format!("{} AS [source]", table_reference(table)), String::from("source"))
            }
            other => (
                self.source(other, params)?,
                other.alias().unwrap_or("source").to_owned(),
            ),
        };

        let keys: Vec<&QueryColumn> = q.key_columns().collect();
        if keys.is_empty() {
            return Err(CompileError::Policy(format!(
                "merge into '{}' has no key columns",
                q.target.name
            )));
        }
        let on = keys
            .iter()
            .map(|k| {
                format!(
                    "{} = {}",
                    column_reference(Some(&target_alias), &k.name),
                    column_reference(Some(&source_alias), &k.name)
                )
            })
            .collect::<Vec<_>>()
            .join(" AND ");

        let target = table_reference(&q.target);
        let top = q.top.map(|n| format!("TOP ({n}) ")).unwrap_or_default();
        let mut clauses = vec![
            format!("MERGE {top}INTO {target} AS {}", TSql.quote_identifier(&target_alias)),
            format!("USING {source_sql}"),
            format!("ON {on}"),
        ];
        let mut branches = 0;

        match &q.when_matched {
            Some(MergeAction::Update(columns)) => {
                let columns = updatable(columns);
                if !columns.is_empty() {
                    let set =
                        self.assignments(&columns, &target_alias, Some(&source_alias), params)?;
                    clauses.push(format!("WHEN MATCHED THEN UPDATE SET {set}"));
                    branches += 1;
                }
            }
            Some(MergeAction::Delete) => {
                clauses.push(String::from("WHEN MATCHED THEN DELETE"));
                branches += 1;
            }
            None => {}
        }

        let columns: Vec<&QueryColumn> = q
            .when_not_matched_by_target
            .iter()
            .filter(|c| c.role.is_insertable())
            .collect();
        if !columns.is_empty() {
            let names = columns
                .iter()
                .map(|c| TSql.quote_identifier(&c.name))
                .collect::<Vec<_>>()
                .join(", ");
            let values = columns
                .iter()
                .map(|c| {
                    let fallback = column_reference(Some(&source_alias), &c.name);
                    self.write_value(c, Some(fallback), params)
                })
                .collect::<Result<Vec<_>>>()?
                .join(", ");
            clauses.push(format!(
                "WHEN NOT MATCHED BY TARGET THEN INSERT ({names}) VALUES ({values})"
            ));
            branches += 1;
        }

        match &q.when_not_matched_by_source {
            Some(MergeAction::Update(columns)) => {
                let columns = updatable(columns);
                if !columns.is_empty() {
                    let set = self.assignments(&columns, &target_alias, None, params)?;
                    clauses.push(format!("WHEN NOT MATCHED BY SOURCE THEN UPDATE SET {set}"));
                    branches += 1;
                }
            }
            Some(MergeAction::Delete) => {
                clauses.push(String::from("WHEN NOT MATCHED BY SOURCE THEN DELETE"));
                branches += 1;
            }
            None => {}
        }

        if branches == 0 {
            return Err(CompileError::Policy(format!(
                "merge into '{}' has no branch to execute",
                q.target.name
            )));
        }
        if !q.output.is_empty() {
            clauses.push(format!("OUTPUT $action, {}", q.output.join(", ")));
        }
        let merge = format!("{};", clauses.join(self.separator()));

        let Some(check) = &q.concurrency else {
            return Ok(with_prolog(q.prolog.as_deref(), merge));
        };
        let conflicts = match &check.query {
            Some(query) => self.select(query, params)?,
            None => {
                let version = q
                    .columns
                    .iter()
                    .find(|c| c.role == ColumnRole::Concurrency)
                    .ok_or_else(|| {
                        CompileError::Policy(String::from(
                            "a concurrency check needs a concurrency column or a query",
                        ))
                    })?;
                format!(
                    "SELECT 1 FROM {target} AS {} INNER JOIN {source_sql} ON {on} WHERE {} != {}",
                    TSql.quote_identifier(&target_alias),
                    column_reference(Some(&target_alias), &version.name),
                    column_reference(Some(&source_alias), &version.name)
                )
            }
        };
        let message = TSql.quote_string(&check.message.replace('%', "%%"));
        let sql = format!(
            "IF NOT EXISTS ({conflicts})\nBEGIN\n{merge}\nEND\nELSE\nBEGIN\nRAISERROR({message}, 16, 1);\nEND"
        );
        Ok(with_prolog(q.prolog.as_deref(), sql))
    }

    fn assignments(
        &self,
        columns: &[&QueryColumn],
        target_alias: &str,
        source_alias: Option<&str>,
        params: &mut ParameterContext,
    ) -> Result<String> {
        Ok(columns
            .iter()
            .map(|c| {
                let fallback = source_alias.map(|alias| column_reference(Some(alias), &c.name));
                let value = self.write_value(c, fallback, params)?;
                Ok(format!("{} = {value}", column_reference(Some(target_alias), &c.name)))
            })
            .collect::<Result<Vec<_>>>()?
            .join(", "))
    }

    /// Renders a `UNION [ALL]`.
    ///
    /// # Errors
    ///
    /// Fails for an empty union or any member failure.
    pub fn union(&self, q: &UnionQuery, params: &mut ParameterContext) -> Result<String> {
        if q.queries.is_empty() {
            return Err(CompileError::Policy(String::from("empty union")));
        }
        let keyword = if q.all { "UNION ALL" } else { "UNION" };
        let separator = format!("{0}{keyword}{0}", self.separator());
        Ok(q.queries
            .iter()
            .map(|member| self.select(member, params))
            .collect::<Result<Vec<_>>>()?
            .join(&separator))
    }

    /// Renders every statement of a script, each terminated by `;`.
    ///
    /// # Errors
    ///
    /// Propagates the first statement failure.
    pub fn script(&self, q: &ScriptQuery, params: &mut ParameterContext) -> Result<String> {
        let statements = q
            .statements
            .iter()
            .map(|s| {
                let sql = self.render(s, params)?;
                Ok(if sql.trim_end().ends_with(';') || sql.trim_end().ends_with("END") {
                    sql
                } else {
                    format!("{sql};")
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(statements.join("\n"))
    }
}

/// Columns a `MERGE` update branch may assign.
fn updatable(columns: &[QueryColumn]) -> Vec<&QueryColumn> {
    columns.iter().filter(|c| c.role.is_updatable()).collect()
}

fn with_prolog(prolog: Option<&str>, sql: String) -> String {
    match prolog {
        Some(prolog) if !prolog.is_empty() => format!("{prolog}\n{sql}"),
        _ => sql,
    }
}

/// `[alias].[name]`, or `[name]`; `*` stays bare.
fn column_reference(qualifier: Option<&str>, name: &str) -> String {
    let column = if name == "*" {
        String::from("*")
    } else {
        TSql.quote_identifier(name)
    };
    match qualifier {
        Some(q) => format!("{}.{column}", TSql.quote_identifier(q)),
        None => column,
    }
}

fn table_reference(table: &TableName) -> String {
    match &table.owner {
        Some(owner) => TSql.quote_path([owner.as_str(), table.name.as_str()]),
        None => quote_table(&table.name),
    }
}

fn aliased_table(table: &TableName) -> String {
    let reference = table_reference(table);
    match &table.alias {
        Some(alias) => format!("{reference} AS {}", TSql.quote_identifier(alias)),
        None => reference,
    }
}
