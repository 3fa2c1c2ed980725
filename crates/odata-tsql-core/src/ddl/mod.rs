//! Schema DDL: table descriptions and their guarded T-SQL rendering.

mod model;
mod render;
mod types;

pub use model::{
    Column, DefaultValue, ForeignKey, ForeignKeyAction, Identity, Index, IndexColumn,
    IndexPartition, Length, Table,
};
pub use render::DdlSerializer;
pub use types::{edm_sql_type, render_type};
