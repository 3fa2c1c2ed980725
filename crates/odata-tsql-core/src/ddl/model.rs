//! Table, column, index and foreign-key descriptions.
//!
//! Built from external schema metadata right before rendering and never
//! mutated by the renderer.

use crate::dialect::{Dialect, TSql};

/// Declared length of a character or binary column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    /// `(n)`.
    Fixed(u32),
    /// `(max)`.
    Max,
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Boolean(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// Raw SQL expression (e.g., `SYSUTCDATETIME()`).
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of the default value.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Boolean(b) => String::from(if *b { "1" } else { "0" }),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => format!("{f:?}"),
            Self::String(s) => TSql.quote_string(s),
            Self::Expression(expr) => expr.clone(),
        }
    }
}

/// `IDENTITY(seed, increment)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// First value.
    pub seed: i64,
    /// Step.
    pub increment: i64,
}

/// A column definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// SQL type name without size suffix (`nvarchar`, `decimal`, ...).
    pub type_name: String,
    /// Length of character/binary types.
    pub length: Option<Length>,
    /// Precision of numeric and temporal types.
    pub precision: Option<u8>,
    /// Scale of numeric types.
    pub scale: Option<u8>,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Identity seed and increment.
    pub identity: Option<Identity>,
    /// Formula of a computed column.
    pub computed: Option<String>,
    /// Default constraint.
    pub default: Option<DefaultValue>,
    /// Check constraint expression.
    pub check: Option<String>,
}

impl Column {
    /// Creates a nullable column.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            length: None,
            precision: None,
            scale: None,
            nullable: true,
            identity: None,
            computed: None,
            default: None,
            check: None,
        }
    }

    /// Sets a fixed length.
    #[must_use]
    pub const fn length(mut self, length: u32) -> Self {
        self.length = Some(Length::Fixed(length));
        self
    }

    /// Sets `max` length.
    #[must_use]
    pub const fn max_length(mut self) -> Self {
        self.length = Some(Length::Max);
        self
    }

    /// Sets the precision.
    #[must_use]
    pub const fn precision(mut self, precision: u8) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Sets the scale.
    #[must_use]
    pub const fn scale(mut self, scale: u8) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Makes the column an identity column.
    #[must_use]
    pub const fn identity(mut self, seed: i64, increment: i64) -> Self {
        self.identity = Some(Identity { seed, increment });
        self.nullable = false;
        self
    }

    /// Makes the column computed from `formula`.
    #[must_use]
    pub fn computed(mut self, formula: impl Into<String>) -> Self {
        self.computed = Some(formula.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets a check constraint.
    #[must_use]
    pub fn check(mut self, expression: impl Into<String>) -> Self {
        self.check = Some(expression.into());
        self
    }
}

/// A key column of an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    /// Column name.
    pub name: String,
    /// Sort descending.
    pub descending: bool,
}

/// Columns of an index and where it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexPartition {
    /// Ordered key columns.
    pub keys: Vec<IndexColumn>,
    /// Non-key columns carried in the leaf level.
    pub included: Vec<String>,
    /// Partition scheme or filegroup, rendered as `ON [name]`.
    pub storage: Option<String>,
}

/// An index, primary key or unique constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// Index or constraint name.
    pub name: String,
    /// Renders as `PRIMARY KEY`.
    pub is_primary_key: bool,
    /// Renders as a `UNIQUE` constraint.
    pub is_unique_constraint: bool,
    /// A `CREATE UNIQUE INDEX`.
    pub is_unique: bool,
    /// Clustered storage.
    pub clustered: bool,
    /// Key and included columns.
    pub partition: IndexPartition,
}

impl Index {
    /// Creates a nonclustered, non-unique index.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_primary_key: false,
            is_unique_constraint: false,
            is_unique: false,
            clustered: false,
            partition: IndexPartition::default(),
        }
    }

    /// Creates a clustered primary key.
    #[must_use]
    pub fn primary_key(name: impl Into<String>) -> Self {
        Self {
            is_primary_key: true,
            clustered: true,
            ..Self::new(name)
        }
    }

    /// Creates a unique constraint.
    #[must_use]
    pub fn unique_constraint(name: impl Into<String>) -> Self {
        Self {
            is_unique_constraint: true,
            ..Self::new(name)
        }
    }

    /// Makes a plain index unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Sets clustered storage.
    #[must_use]
    pub const fn clustered(mut self, clustered: bool) -> Self {
        self.clustered = clustered;
        self
    }

    /// Appends an ascending key column.
    #[must_use]
    pub fn key(mut self, column: impl Into<String>) -> Self {
        self.partition.keys.push(IndexColumn {
            name: column.into(),
            descending: false,
        });
        self
    }

    /// Appends a descending key column.
    #[must_use]
    pub fn key_desc(mut self, column: impl Into<String>) -> Self {
        self.partition.keys.push(IndexColumn {
            name: column.into(),
            descending: true,
        });
        self
    }

    /// Appends an included column.
    #[must_use]
    pub fn include(mut self, column: impl Into<String>) -> Self {
        self.partition.included.push(column.into());
        self
    }

    /// Places the index on a partition scheme or filegroup.
    #[must_use]
    pub fn on(mut self, storage: impl Into<String>) -> Self {
        self.partition.storage = Some(storage.into());
        self
    }

    /// Whether the index renders as a table constraint.
    #[must_use]
    pub const fn is_constraint(&self) -> bool {
        self.is_primary_key || self.is_unique_constraint
    }
}

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAction {
    /// No action.
    NoAction,
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// A foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Constraint name.
    pub name: String,
    /// Referencing columns.
    pub columns: Vec<String>,
    /// Referenced table, optionally owner-qualified (`dbo.Customers`).
    pub references: String,
    /// Referenced columns.
    pub referenced_columns: Vec<String>,
    /// Action on delete.
    pub on_delete: Option<ForeignKeyAction>,
}

impl ForeignKey {
    /// Creates a foreign key to `references`.
    #[must_use]
    pub fn new(name: impl Into<String>, references: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            references: references.into(),
            referenced_columns: Vec::new(),
            on_delete: None,
        }
    }

    /// Adds a `(column, referenced column)` pair.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>, referenced: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self.referenced_columns.push(referenced.into());
        self
    }

    /// Sets the delete action.
    #[must_use]
    pub const fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }
}

/// A table definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Owning schema; `dbo` when absent.
    pub owner: Option<String>,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
    /// Indexes and key constraints.
    pub indexes: Vec<Index>,
    /// Foreign keys.
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: None,
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Sets the owning schema.
    #[must_use]
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Appends an index or key constraint.
    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Appends a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    /// `[owner].[name]`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        TSql.quote_path([self.owner.as_deref().unwrap_or("dbo"), self.name.as_str()])
    }

    /// Key columns of the primary key, in key order.
    #[must_use]
    pub fn key_columns(&self) -> Vec<&str> {
        self.indexes
            .iter()
            .find(|index| index.is_primary_key)
            .map(|index| index.partition.keys.iter().map(|k| k.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}
