//! Statement model and rendering.
//!
//! Statements are plain data built by callers (or by [`QueryOptions`]) and
//! rendered by [`QueryCompiler`], which hands every filter clause to the
//! filter serializer and collects bound values in one parameter context.

mod compiler;
mod merge;
mod model;
mod options;

pub use compiler::{CompiledQuery, QueryCompiler};
pub use merge::{ConcurrencyCheck, HasSource, MergeAction, MergeBuilder, MergeQuery, NoSource};
pub use model::{
    ColumnExpression, ColumnRole, DeleteQuery, InsertQuery, Join, JoinKind, OrderBy, QueryColumn,
    ScriptQuery, SelectQuery, Source, Statement, TableName, UnionQuery,
};
pub use options::QueryOptions;
