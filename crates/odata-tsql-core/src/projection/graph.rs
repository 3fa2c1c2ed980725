//! The composite tree and the path-compression batch it compiles to.

use super::reconstruct::{reconstruct, GraphResult};
use super::{Executor, PATH_KEY};
use crate::ast::{Expression, Literal, Operand, Predicate, PredicateKind, PropertyName};
use crate::config::CompilerOptions;
use crate::ddl::{Column, DdlSerializer};
use crate::dialect::{Dialect, TSql};
use crate::error::{CompileError, Result};
use crate::query::{
    CompiledQuery, InsertQuery, Join, JoinKind, OrderBy, QueryColumn, QueryCompiler, ScriptQuery,
    SelectQuery, Source, Statement, TableName, UnionQuery,
};
use crate::schema::{Navigation, SchemaProvider};

/// One component of the entity graph: the root entity or a navigation
/// reached from its parent component.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeNode {
    /// Position in the graph; the root is 0 and parents precede children.
    pub id: usize,
    /// Parent component, `None` for the root.
    pub parent: Option<usize>,
    /// Navigation name, or the table name for the root.
    pub name: String,
    /// Navigation names from the root, `/`-separated.
    pub path: String,
    /// Table holding the component's rows.
    pub table: String,
    /// Columns identifying a row.
    pub keys: Vec<String>,
    /// `(parent column, own column)` pairs joining to the parent.
    pub join: Vec<(String, String)>,
    /// Projected columns; empty projects every column.
    pub columns: Vec<String>,
    /// Restriction on the component's rows.
    pub filter: Option<Expression>,
}

impl CompositeNode {
    /// Table alias inside the batch.
    #[must_use]
    pub fn alias(&self) -> String {
        format!("c{}", self.id)
    }

    /// Staging-table column holding the component's path key.
    #[must_use]
    pub fn slot(&self) -> String {
        format!("s{}", self.id)
    }
}

/// A navigation to attach under an existing component.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    navigation: Navigation,
    keys: Vec<String>,
    columns: Vec<String>,
    filter: Option<Expression>,
}

impl Branch {
    /// Follows `navigation`.
    #[must_use]
    pub const fn new(navigation: Navigation) -> Self {
        Self {
            navigation,
            keys: Vec::new(),
            columns: Vec::new(),
            filter: None,
        }
    }

    /// Appends a key column of the target table.
    #[must_use]
    pub fn key(mut self, column: impl Into<String>) -> Self {
        self.keys.push(column.into());
        self
    }

    /// Projects only these columns.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts the related rows.
    #[must_use]
    pub fn filter(mut self, filter: Expression) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// A query over a root entity and the related collections below it,
/// compiled into one round trip.
///
/// The batch declares a staging table with one path-key column per
/// component, fills it from a `UNION ALL` of one select per component, then
/// returns the edges, the paths and one result set per component.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQuery {
    nodes: Vec<CompositeNode>,
}

impl GraphQuery {
    /// Id of the root component.
    pub const ROOT: usize = 0;

    /// Starts a graph at `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            nodes: vec![CompositeNode {
                id: Self::ROOT,
                parent: None,
                name: table.clone(),
                path: String::new(),
                table,
                keys: Vec::new(),
                join: Vec::new(),
                columns: Vec::new(),
                filter: None,
            }],
        }
    }

    /// Appends a key column of the root table.
    #[must_use]
    pub fn key(mut self, column: impl Into<String>) -> Self {
        self.nodes[Self::ROOT].keys.push(column.into());
        self
    }

    /// Projects only these root columns.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nodes[Self::ROOT].columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts the root rows.
    #[must_use]
    pub fn filter(mut self, filter: Expression) -> Self {
        self.nodes[Self::ROOT].filter = Some(filter);
        self
    }

    /// Every component, parents first.
    #[must_use]
    pub fn nodes(&self) -> &[CompositeNode] {
        &self.nodes
    }

    /// Looks up a component.
    #[must_use]
    pub fn node(&self, id: usize) -> Option<&CompositeNode> {
        self.nodes.get(id)
    }

    /// Direct children of a component.
    pub fn children(&self, id: usize) -> impl Iterator<Item = &CompositeNode> {
        self.nodes.iter().filter(move |n| n.parent == Some(id))
    }

    /// Components from the root down to `id`.
    fn chain(&self, id: usize) -> Vec<&CompositeNode> {
        let mut chain = Vec::new();
        let mut current = self.nodes.get(id);
        while let Some(node) = current {
            chain.push(node);
            current = node.parent.and_then(|p| self.nodes.get(p));
        }
        chain.reverse();
        chain
    }

    /// Attaches `branch` under component `parent` and returns its id.
    ///
    /// # Errors
    ///
    /// Fails for an unknown parent, a branch without key columns or a
    /// navigation without join columns.
    pub fn attach(&mut self, parent: usize, branch: Branch) -> Result<usize> {
        let Some(parent_node) = self.nodes.get(parent) else {
            return Err(CompileError::InvalidExpression(format!(
                "unknown component {parent}"
            )));
        };
        let Branch {
            navigation,
            keys,
            columns,
            filter,
        } = branch;
        if keys.is_empty() {
            return Err(CompileError::Policy(format!(
                "navigation '{}' has no key columns",
                navigation.name
            )));
        }
        if navigation.keys.is_empty() {
            return Err(CompileError::Policy(format!(
                "navigation '{}' has no join columns",
                navigation.name
            )));
        }

        let path = if parent_node.path.is_empty() {
            navigation.name.clone()
        } else {
            format!("{}/{}", parent_node.path, navigation.name)
        };
        let id = self.nodes.len();
        tracing::debug!(id, %path, table = %navigation.target, "attached component");
        self.nodes.push(CompositeNode {
            id,
            parent: Some(parent),
            name: navigation.name,
            path,
            table: navigation.target,
            keys,
            join: navigation.keys,
            columns,
            filter,
        });
        Ok(id)
    }

    /// Attaches the navigation `name` of component `parent` as described by
    /// `schema`, keyed on the primary key of the target table.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::NotSupported`] when the schema does not know
    /// the navigation or its target table, and [`GraphQuery::attach`] errors.
    pub fn expand(
        &mut self,
        schema: &dyn SchemaProvider,
        parent: usize,
        name: &str,
    ) -> Result<usize> {
        let entity = self
            .nodes
            .get(parent)
            .map(|n| n.table.clone())
            .ok_or_else(|| CompileError::InvalidExpression(format!("unknown component {parent}")))?;
        let navigation = schema
            .navigation(&entity, name)
            .ok_or_else(|| CompileError::NotSupported(format!("navigation '{entity}/{name}'")))?;
        let table = schema
            .table(&navigation.target)
            .ok_or_else(|| CompileError::NotSupported(format!("table '{}'", navigation.target)))?;
        let mut branch = Branch::new(navigation);
        for key in table.key_columns() {
            branch = branch.key(key);
        }
        self.attach(parent, branch)
    }

    /// Builds the batch as a script.
    ///
    /// # Errors
    ///
    /// Fails when the root has no key columns or the staging table name is
    /// not a table variable or temporary table.
    pub fn to_script(&self, options: &CompilerOptions) -> Result<ScriptQuery> {
        if self.nodes[Self::ROOT].keys.is_empty() {
            return Err(CompileError::Policy(format!(
                "table '{}' has no key columns",
                self.nodes[Self::ROOT].table
            )));
        }
        let staging = options.staging_table.as_str();
        let separator = options.path_separator.as_str();

        let mut slots = vec![Column::new("__row", "int").identity(1, 1)];
        slots.extend(
            self.nodes
                .iter()
                .map(|n| Column::new(n.slot(), "nvarchar").length(450)),
        );
        let declare = DdlSerializer::new().declare_table(staging, &slots)?;

        let branches = self
            .nodes
            .iter()
            .map(|n| self.path_select(n, separator))
            .collect::<Vec<_>>();
        let mut populate = InsertQuery::into(TableName::new(staging))
            .select(Source::Union(Box::new(UnionQuery::all(branches)), String::from("branches")));
        for node in &self.nodes {
            populate = populate.column(QueryColumn::new(node.slot()));
        }

        let edges: Vec<SelectQuery> = self
            .nodes
            .iter()
            .map(|n| {
                SelectQuery::from(Source::table(staging))
                    .distinct()
                    .column(QueryColumn::new("ComponentId").raw(n.id.to_string()))
                    .column(QueryColumn::new("PathKey").raw(TSql.quote_identifier(&n.slot())))
                    .filter(not_null(PropertyName::new(n.slot())))
            })
            .collect();

        let mut paths = SelectQuery::from(Source::table(staging))
            .column(QueryColumn::new("__row"))
            .order_by(OrderBy::asc(Operand::property("__row")));
        for node in &self.nodes {
            paths = paths.column(QueryColumn::new(node.slot()));
        }

        let mut script = ScriptQuery::default()
            .push(Statement::Raw(declare))
            .push(populate)
            .push(UnionQuery::all(edges))
            .push(paths);
        for node in &self.nodes {
            script = script.push(branch_select(node, staging, separator));
        }
        Ok(script)
    }

    /// Compiles the batch.
    ///
    /// # Errors
    ///
    /// Same as [`GraphQuery::to_script`] plus filter serialization errors.
    pub fn compile(&self, compiler: &QueryCompiler<'_>) -> Result<CompiledQuery> {
        let script = self.to_script(compiler.options())?;
        compiler.compile(&Statement::Script(script))
    }

    /// Compiles and executes the batch, then reconstructs the root results.
    ///
    /// # Errors
    ///
    /// Propagates compilation, execution and reconstruction failures.
    pub fn fetch(
        &self,
        compiler: &QueryCompiler<'_>,
        executor: &dyn Executor,
    ) -> Result<Vec<GraphResult>> {
        let compiled = self.compile(compiler)?;
        let sets = executor.execute(&compiled.sql, &compiled.parameters)?;
        tracing::debug!(result_sets = sets.len(), "executed graph batch");
        reconstruct(self, &sets)
    }

    /// One member of the staging-table union: the path keys of every
    /// component from the root down to `node`, NULL for the rest. Rows
    /// where `node` has no related row are pruned.
    fn path_select(&self, node: &CompositeNode, separator: &str) -> SelectQuery {
        let chain = self.chain(node.id);
        let root = chain[0];
        let mut query = SelectQuery::from(Source::Table(
            TableName::new(&root.table).alias(root.alias()),
        ));

        for pair in chain.windows(2) {
            let (parent, child) = (pair[0], pair[1]);
            let columns: Vec<(&str, &str)> = child
                .join
                .iter()
                .map(|(p, c)| (p.as_str(), c.as_str()))
                .collect();
            query = query.join(Join::on_columns(
                JoinKind::Left,
                Source::Table(TableName::new(&child.table).alias(child.alias())),
                &parent.alias(),
                &child.alias(),
                &columns,
            ));
        }

        for other in &self.nodes {
            let value = if chain.iter().any(|c| c.id == other.id) {
                path_key(&other.keys, Some(&other.alias()), separator)
            } else {
                String::from("NULL")
            };
            query = query.column(QueryColumn::new(other.slot()).raw(value));
        }

        let mut conditions = Vec::new();
        for component in &chain {
            if let Some(filter) = &component.filter {
                let mut filter = filter.deep_copy();
                filter.default_prefixes(&component.alias());
                conditions.push(filter);
            }
        }
        if node.parent.is_some() {
            for key in &node.keys {
                conditions.push(not_null(PropertyName::new(key).with_alias(node.alias())));
            }
        }
        query.filter = Expression::and(conditions);
        query
    }
}

/// The component's rows joined back to the staging table on the path key.
fn branch_select(node: &CompositeNode, staging: &str, separator: &str) -> SelectQuery {
    let alias = node.alias();
    let keyed = SelectQuery::from(Source::table(&node.table))
        .column(QueryColumn::new(PATH_KEY).raw(path_key(&node.keys, None, separator)))
        .column(QueryColumn::new("*"));
    let slot = node.slot();
    let mut query = SelectQuery::from(Source::Select(Box::new(keyed), alias.clone()))
        .distinct()
        .column(QueryColumn::new(PATH_KEY).source(&alias))
        .join(Join::on_columns(
            JoinKind::Inner,
            Source::Table(TableName::new(staging).alias("p")),
            &alias,
            "p",
            &[(PATH_KEY, slot.as_str())],
        ));
    if node.columns.is_empty() {
        query = query.column(QueryColumn::new("*").source(&alias));
    } else {
        for column in &node.columns {
            query = query.column(QueryColumn::new(column).source(&alias));
        }
    }
    query
}

/// Compresses key columns into one `NVARCHAR` path key.
fn path_key(keys: &[String], qualifier: Option<&str>, separator: &str) -> String {
    let mut parts: Vec<String> = keys
        .iter()
        .map(|k| {
            let column = TSql.quote_path(qualifier.into_iter().chain([k.as_str()]));
            format!("CAST({column} AS NVARCHAR(450))")
        })
        .collect();
    if parts.len() == 1 {
        return parts.remove(0);
    }
    let glue = format!(", {}, ", TSql.quote_string(separator));
    format!("CONCAT({})", parts.join(&glue))
}

fn not_null(property: PropertyName) -> Expression {
    Expression::Predicate(Predicate::new(
        PredicateKind::Ne,
        Operand::Property(property),
        Operand::literal(Literal::Null),
    ))
}
