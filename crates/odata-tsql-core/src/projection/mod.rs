//! Graph projection.
//!
//! A query over a root entity and its related collections compiles into a
//! single batch. The batch stages the linkage between components as
//! compressed path keys, then returns, in order:
//!
//! 1. the edges: `(ComponentId, PathKey)` for every staged key,
//! 2. the paths: the staging table ordered by `[__row]`,
//! 3. one result set per component: `[__PathKey]` followed by its columns.
//!
//! [`reconstruct`] turns those result sets back into nested objects.

mod graph;
mod reconstruct;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use graph::{Branch, CompositeNode, GraphQuery};
pub use reconstruct::{reconstruct, GraphResult};

use crate::error::Result;
use crate::params::QueryParameter;

/// Column carrying a component row's path key in its result set.
pub const PATH_KEY: &str = "__PathKey";

/// One tabular result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column names.
    pub columns: Vec<String>,
    /// Rows, each holding one value per column.
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    /// Creates an empty result set with the given columns.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    #[must_use]
    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(values);
        self
    }

    /// Position of a column, matched case-insensitively.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }
}

/// Runs SQL and returns its result sets.
pub trait Executor {
    /// Executes `sql` with `parameters` bound.
    ///
    /// # Errors
    ///
    /// Implementations report execution failures; a raised concurrency
    /// message should be mapped with
    /// [`MergeQuery::conflict_from`](crate::query::MergeQuery::conflict_from).
    fn execute(&self, sql: &str, parameters: &[QueryParameter]) -> Result<Vec<ResultSet>>;
}
