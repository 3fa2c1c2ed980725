//! Read-only schema metadata consumed by the compiler.
//!
//! The compiler never loads metadata itself; callers implement
//! [`SchemaProvider`] and [`EnumResolver`] over whatever catalog they have.

mod enums;

use std::collections::HashMap;

pub use enums::{EnumMetadataCache, EnumResolver, EnumType, StaticEnumResolver};

use crate::ddl::Table;

/// A navigation property from one entity to a related collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Navigation name as written in filters.
    pub name: String,
    /// Table holding the related rows.
    pub target: String,
    /// Join columns as `(parent column, child column)` pairs.
    pub keys: Vec<(String, String)>,
}

impl Navigation {
    /// Creates a navigation.
    #[must_use]
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            keys: Vec::new(),
        }
    }

    /// Adds a join column pair.
    #[must_use]
    pub fn key(mut self, parent: impl Into<String>, child: impl Into<String>) -> Self {
        self.keys.push((parent.into(), child.into()));
        self
    }
}

/// Supplies entity and table metadata on demand.
pub trait SchemaProvider: Send + Sync {
    /// Returns the navigation `name` of `entity`.
    fn navigation(&self, entity: &str, name: &str) -> Option<Navigation>;

    /// Returns the table definition for `name`.
    fn table(&self, _name: &str) -> Option<Table> {
        None
    }
}

/// A [`SchemaProvider`] over fixed, in-memory definitions.
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    navigations: HashMap<(String, String), Navigation>,
    tables: HashMap<String, Table>,
}

impl StaticSchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a navigation of `entity`.
    #[must_use]
    pub fn with_navigation(mut self, entity: impl Into<String>, navigation: Navigation) -> Self {
        self.navigations
            .insert((entity.into(), navigation.name.clone()), navigation);
        self
    }

    /// Registers a table.
    #[must_use]
    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }
}

impl SchemaProvider for StaticSchema {
    fn navigation(&self, entity: &str, name: &str) -> Option<Navigation> {
        self.navigations
            .get(&(String::from(entity), String::from(name)))
            .cloned()
    }

    fn table(&self, name: &str) -> Option<Table> {
        self.tables.get(name).cloned()
    }
}
