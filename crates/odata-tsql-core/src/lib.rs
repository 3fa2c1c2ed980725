//! # odata-tsql-core
//!
//! Compiles OData-style query options into parameterized T-SQL.
//!
//! This crate provides:
//! - A tokenizer and a hand-written precedence compiler turning `$filter`
//!   text into a structured document, then into an expression tree
//! - A filter serializer rendering expression trees as T-SQL predicates with
//!   every literal bound as a parameter
//! - A statement model (SELECT, INSERT, DELETE, MERGE, UNION, scripts) and
//!   idempotent DDL rendering
//! - A graph projection engine fetching a root entity and its related
//!   collections in one round trip
//!
//! ## Filters
//!
//! ```rust
//! use odata_tsql_core::{compile_filter, CompilerOptions};
//!
//! let options = CompilerOptions::default();
//! let compiled = compile_filter("Age gt 21", &options)?;
//! assert_eq!(compiled.sql, "([Age] > @p0)");
//! assert_eq!(compiled.parameters.len(), 1);
//! # Ok::<(), odata_tsql_core::CompileError>(())
//! ```
//!
//! ## Query options
//!
//! ```rust
//! use odata_tsql_core::query::{QueryCompiler, QueryOptions, TableName};
//! use odata_tsql_core::{CompilerOptions, FilterParser, RenderContext};
//!
//! let options = QueryOptions::parse("$filter=Name eq 'Ann'&$orderby=Name&$top=5")?;
//! let select = options.to_select(TableName::new("People"), &FilterParser::new())?;
//!
//! let config = CompilerOptions::default();
//! let compiled = QueryCompiler::new(RenderContext::new(&config)).compile(&select.into())?;
//! assert_eq!(
//!     compiled.sql,
//!     "SELECT * FROM [People] WHERE ([Name] = @p0) ORDER BY [Name] ASC OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY"
//! );
//! # Ok::<(), odata_tsql_core::CompileError>(())
//! ```

pub mod ast;
pub mod config;
pub mod context;
pub mod ddl;
pub mod dialect;
pub mod error;
pub mod filter;
pub mod lexer;
pub mod params;
pub mod parser;
pub mod projection;
pub mod query;
pub mod schema;

pub use ast::{Expression, Operand};
pub use config::CompilerOptions;
pub use context::RenderContext;
pub use error::{CompileError, Result};
pub use filter::FilterSerializer;
pub use lexer::{Token, TokenKind, Tokenizer};
pub use params::{ParameterContext, QueryParameter, SqlValue};
pub use parser::{FilterParser, ParseError};
pub use query::{CompiledQuery, QueryCompiler, QueryOptions, Statement};

/// Parses `filter` and renders it as a T-SQL predicate with the options'
/// defaults and no enum, function or schema metadata.
///
/// # Errors
///
/// Returns parse errors for malformed input and rendering errors for
/// constructs that need metadata.
pub fn compile_filter(filter: &str, options: &CompilerOptions) -> Result<CompiledQuery> {
    let mut expression = FilterParser::new().parse_filter(filter)?;
    expression.apply_enum_types();

    let mut params = ParameterContext::new(options.parameter_prefix.clone());
    let sql = FilterSerializer::new(RenderContext::new(options), &mut params).serialize(&expression)?;
    Ok(CompiledQuery {
        sql,
        declarations: params.declarations(),
        parameters: params.into_parameters(),
    })
}
