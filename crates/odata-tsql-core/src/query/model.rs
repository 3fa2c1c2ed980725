//! Statement object model.
//!
//! Statements embed expression trees for their filter clauses; nothing is
//! rendered until a [`QueryCompiler`](super::QueryCompiler) walks them.

use crate::ast::{Expression, Operand, Predicate, PredicateKind, PropertyName};

use super::merge::MergeQuery;

/// A table reference: `[owner].[name] AS [alias]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    /// Table name, or a `@variable` / `#temp` name.
    pub name: String,
    /// Owning schema.
    pub owner: Option<String>,
    /// Alias used to qualify columns.
    pub alias: Option<String>,
}

impl TableName {
    /// Creates an unqualified table reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: None,
            alias: None,
        }
    }

    /// Sets the owning schema.
    #[must_use]
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Sets the alias.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// What a statement reads from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A table.
    Table(TableName),
    /// A nested select, rendered parenthesized under an alias.
    Select(Box<SelectQuery>, String),
    /// Raw SQL text, rendered parenthesized under an alias.
    Script(String, String),
    /// A union, rendered parenthesized under an alias.
    Union(Box<UnionQuery>, String),
    /// A single row of values, `(SELECT v AS [c], ...)` under an alias.
    Row(Vec<QueryColumn>, String),
}

impl Source {
    /// A table source.
    #[must_use]
    pub fn table(name: impl Into<String>) -> Self {
        Self::Table(TableName::new(name))
    }

    /// The alias columns are qualified with, if any.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        match self {
            Self::Table(t) => t.alias.as_deref(),
            Self::Select(_, alias)
            | Self::Script(_, alias)
            | Self::Union(_, alias)
            | Self::Row(_, alias) => Some(alias),
        }
    }

    /// The entity name used for navigation lookups.
    #[must_use]
    pub fn entity(&self) -> &str {
        match self {
            Self::Table(t) => &t.name,
            Self::Select(_, alias)
            | Self::Script(_, alias)
            | Self::Union(_, alias)
            | Self::Row(_, alias) => alias,
        }
    }
}

/// The value of a computed column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnExpression {
    /// An expression rendered through the filter serializer.
    Operand(Operand),
    /// Raw SQL.
    Raw(String),
}

/// Special handling a column receives in writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnRole {
    /// A plain column.
    #[default]
    None,
    /// Computed by the server; never written.
    Computed,
    /// Row version used for optimistic concurrency; never written.
    Concurrency,
    /// Set to the server time on insert.
    InsertedAt,
    /// Set to the server time on insert and update.
    UpdatedAt,
    /// Set to the audit user on insert.
    InsertedBy,
    /// Set to the audit user on insert and update.
    UpdatedBy,
}

impl ColumnRole {
    /// Whether an `INSERT` writes the column.
    #[must_use]
    pub const fn is_insertable(self) -> bool {
        !matches!(self, Self::Computed | Self::Concurrency)
    }

    /// Whether an `UPDATE` writes the column.
    #[must_use]
    pub const fn is_updatable(self) -> bool {
        !matches!(
            self,
            Self::Computed | Self::Concurrency | Self::InsertedAt | Self::InsertedBy
        )
    }
}

/// A column of a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryColumn {
    /// Column name.
    pub name: String,
    /// Output name, when different from `name`.
    pub alias: Option<String>,
    /// Alias of the table the column comes from.
    pub source: Option<String>,
    /// Explicit value; takes precedence over role defaults.
    pub expression: Option<ColumnExpression>,
    /// Declared element type.
    pub element_type: Option<String>,
    /// Part of the key used to match rows.
    pub is_key_column: bool,
    /// Write handling.
    pub role: ColumnRole,
}

impl QueryColumn {
    /// Creates a plain column.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            source: None,
            expression: None,
            element_type: None,
            is_key_column: false,
            role: ColumnRole::None,
        }
    }

    /// Sets the output name.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Qualifies the column with a table alias.
    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets an explicit value.
    #[must_use]
    pub fn expression(mut self, operand: Operand) -> Self {
        self.expression = Some(ColumnExpression::Operand(operand));
        self
    }

    /// Sets a raw SQL value.
    #[must_use]
    pub fn raw(mut self, sql: impl Into<String>) -> Self {
        self.expression = Some(ColumnExpression::Raw(sql.into()));
        self
    }

    /// Sets the element type.
    #[must_use]
    pub fn element_type(mut self, element_type: impl Into<String>) -> Self {
        self.element_type = Some(element_type.into());
        self
    }

    /// Marks the column as a key column.
    #[must_use]
    pub const fn key(mut self) -> Self {
        self.is_key_column = true;
        self
    }

    /// Sets the write role.
    #[must_use]
    pub const fn role(mut self, role: ColumnRole) -> Self {
        self.role = role;
        self
    }

    /// The name the column is exposed under.
    #[must_use]
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `INNER JOIN`.
    Inner,
    /// `LEFT JOIN`.
    Left,
    /// `CROSS JOIN`.
    Cross,
}

impl JoinKind {
    /// Returns the SQL keywords.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// A join clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Join flavour.
    pub kind: JoinKind,
    /// Joined source.
    pub source: Source,
    /// Join condition; absent for cross joins.
    pub on: Option<Expression>,
}

impl Join {
    /// Joins `source` where each `(left, right)` column pair is equal; the
    /// columns are qualified with the given aliases.
    #[must_use]
    pub fn on_columns(
        kind: JoinKind,
        source: Source,
        left_alias: &str,
        right_alias: &str,
        pairs: &[(&str, &str)],
    ) -> Self {
        let predicates = pairs.iter().map(|(left, right)| {
            Expression::Predicate(Predicate::new(
                PredicateKind::Eq,
                Operand::Property(PropertyName::new(*left).with_alias(left_alias)),
                Operand::Property(PropertyName::new(*right).with_alias(right_alias)),
            ))
        });
        Self {
            kind,
            source,
            on: Expression::and(predicates),
        }
    }
}

/// An `ORDER BY` key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Sort key.
    pub operand: Operand,
    /// Sort descending.
    pub descending: bool,
}

impl OrderBy {
    /// Ascending on `operand`.
    #[must_use]
    pub const fn asc(operand: Operand) -> Self {
        Self {
            operand,
            descending: false,
        }
    }

    /// Descending on `operand`.
    #[must_use]
    pub const fn desc(operand: Operand) -> Self {
        Self {
            operand,
            descending: true,
        }
    }
}

/// A `SELECT` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    /// SQL emitted before the statement.
    pub prolog: Option<String>,
    /// `SELECT DISTINCT`.
    pub distinct: bool,
    /// Row limit.
    pub top: Option<u64>,
    /// Rows to skip; requires an order.
    pub skip: Option<u64>,
    /// Output columns; empty selects `*`.
    pub columns: Vec<QueryColumn>,
    /// Row source.
    pub source: Source,
    /// Joins.
    pub joins: Vec<Join>,
    /// `WHERE`.
    pub filter: Option<Expression>,
    /// `GROUP BY` keys.
    pub group_by: Vec<Operand>,
    /// Group with `ROLLUP(...)`.
    pub rollup: bool,
    /// `HAVING`.
    pub having: Option<Expression>,
    /// `ORDER BY` keys.
    pub order_by: Vec<OrderBy>,
}

impl SelectQuery {
    /// Selects every column of `source`.
    #[must_use]
    pub const fn from(source: Source) -> Self {
        Self {
            prolog: None,
            distinct: false,
            top: None,
            skip: None,
            columns: Vec::new(),
            source,
            joins: Vec::new(),
            filter: None,
            group_by: Vec::new(),
            rollup: false,
            having: None,
            order_by: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: QueryColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets the filter.
    #[must_use]
    pub fn filter(mut self, filter: Expression) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Appends a join.
    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Appends an order key.
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// Sets the row limit.
    #[must_use]
    pub const fn top(mut self, top: u64) -> Self {
        self.top = Some(top);
        self
    }

    /// Sets the rows to skip.
    #[must_use]
    pub const fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Forces `DISTINCT`.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

/// An `INSERT` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertQuery {
    /// SQL emitted before the statement.
    pub prolog: Option<String>,
    /// Target table.
    pub target: TableName,
    /// Written columns.
    pub columns: Vec<QueryColumn>,
    /// Rows to insert; `None` inserts one row of column values.
    pub source: Option<Source>,
}

impl InsertQuery {
    /// Creates an insert into `target`.
    #[must_use]
    pub const fn into(target: TableName) -> Self {
        Self {
            prolog: None,
            target,
            columns: Vec::new(),
            source: None,
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: QueryColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Inserts the rows of `source`.
    #[must_use]
    pub fn select(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }
}

/// A `DELETE` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteQuery {
    /// SQL emitted before the statement.
    pub prolog: Option<String>,
    /// Target table.
    pub target: TableName,
    /// Row limit.
    pub top: Option<u64>,
    /// `WHERE`.
    pub filter: Option<Expression>,
}

impl DeleteQuery {
    /// Deletes from `target`.
    #[must_use]
    pub const fn from(target: TableName) -> Self {
        Self {
            prolog: None,
            target,
            top: None,
            filter: None,
        }
    }

    /// Sets the filter.
    #[must_use]
    pub fn filter(mut self, filter: Expression) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Several selects combined with `UNION [ALL]`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionQuery {
    /// Member queries.
    pub queries: Vec<SelectQuery>,
    /// `UNION ALL` instead of `UNION`.
    pub all: bool,
}

impl UnionQuery {
    /// Creates a `UNION ALL`.
    #[must_use]
    pub fn all(queries: Vec<SelectQuery>) -> Self {
        Self { queries, all: true }
    }

    /// Creates a `UNION`.
    #[must_use]
    pub fn distinct(queries: Vec<SelectQuery>) -> Self {
        Self {
            queries,
            all: false,
        }
    }
}

/// A batch of statements rendered one after another.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScriptQuery {
    /// Statements in execution order.
    pub statements: Vec<Statement>,
}

impl ScriptQuery {
    /// Appends a statement.
    #[must_use]
    pub fn push(mut self, statement: impl Into<Statement>) -> Self {
        self.statements.push(statement.into());
        self
    }
}

/// Any renderable statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `SELECT`.
    Select(SelectQuery),
    /// `INSERT`.
    Insert(InsertQuery),
    /// `DELETE`.
    Delete(DeleteQuery),
    /// `MERGE`.
    Merge(MergeQuery),
    /// `UNION`.
    Union(UnionQuery),
    /// A batch.
    Script(ScriptQuery),
    /// Raw SQL, emitted verbatim.
    Raw(String),
}

impl Statement {
    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Select(_) => "select",
            Self::Insert(_) => "insert",
            Self::Delete(_) => "delete",
            Self::Merge(_) => "merge",
            Self::Union(_) => "union",
            Self::Script(_) => "script",
            Self::Raw(_) => "raw",
        }
    }
}

impl From<SelectQuery> for Statement {
    fn from(query: SelectQuery) -> Self {
        Self::Select(query)
    }
}

impl From<InsertQuery> for Statement {
    fn from(query: InsertQuery) -> Self {
        Self::Insert(query)
    }
}

impl From<DeleteQuery> for Statement {
    fn from(query: DeleteQuery) -> Self {
        Self::Delete(query)
    }
}

impl From<MergeQuery> for Statement {
    fn from(query: MergeQuery) -> Self {
        Self::Merge(query)
    }
}

impl From<UnionQuery> for Statement {
    fn from(query: UnionQuery) -> Self {
        Self::Union(query)
    }
}

impl From<ScriptQuery> for Statement {
    fn from(query: ScriptQuery) -> Self {
        Self::Script(query)
    }
}
