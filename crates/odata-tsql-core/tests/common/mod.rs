#![allow(dead_code)]

use odata_tsql_core::query::{QueryCompiler, Statement};
use odata_tsql_core::schema::{EnumMetadataCache, EnumType, Navigation, StaticEnumResolver, StaticSchema};
use odata_tsql_core::{
    CompileError, CompiledQuery, CompilerOptions, Expression, FilterParser, FilterSerializer,
    ParameterContext, RenderContext, SqlValue,
};

pub fn parse(filter: &str) -> Expression {
    FilterParser::new()
        .parse_filter(filter)
        .unwrap_or_else(|e| panic!("Failed to parse: {filter}\nError: {e:?}"))
}

pub fn parse_err(filter: &str) -> CompileError {
    FilterParser::new()
        .parse_filter(filter)
        .expect_err(&format!("Expected parse error for: {filter}"))
}

/// Renders `filter` as a predicate with default options and no metadata.
pub fn where_clause(filter: &str) -> (String, Vec<SqlValue>) {
    let options = CompilerOptions::default();
    render_with(filter, RenderContext::new(&options))
}

pub fn render_with(filter: &str, ctx: RenderContext<'_>) -> (String, Vec<SqlValue>) {
    let mut expression = parse(filter);
    expression.apply_enum_types();
    let mut params = ParameterContext::new(ctx.options.parameter_prefix.clone());
    let sql = FilterSerializer::new(ctx, &mut params)
        .serialize(&expression)
        .unwrap_or_else(|e| panic!("Failed to render: {filter}\nError: {e:?}"));
    let values = params.into_parameters().into_iter().map(|p| p.value).collect();
    (sql, values)
}

pub fn render_err(filter: &str, ctx: RenderContext<'_>) -> CompileError {
    let expression = parse(filter);
    let mut params = ParameterContext::default();
    FilterSerializer::new(ctx, &mut params)
        .serialize(&expression)
        .expect_err(&format!("Expected render error for: {filter}"))
}

pub fn compile(statement: impl Into<Statement>) -> CompiledQuery {
    let options = CompilerOptions::default();
    compile_with(statement, &options)
}

pub fn compile_with(statement: impl Into<Statement>, options: &CompilerOptions) -> CompiledQuery {
    let statement = statement.into();
    QueryCompiler::new(RenderContext::new(options))
        .compile(&statement)
        .unwrap_or_else(|e| panic!("Failed to compile {}\nError: {e:?}", statement.kind()))
}

pub fn compile_err(statement: impl Into<Statement>) -> CompileError {
    let options = CompilerOptions::default();
    let statement = statement.into();
    QueryCompiler::new(RenderContext::new(&options))
        .compile(&statement)
        .expect_err(&format!("Expected compile error for {}", statement.kind()))
}

/// Verifies that serializing a parsed filter is a fixed point:
/// parse(filter).serialize() re-parses to the same text.
pub fn round_trip(filter: &str) {
    let rendered1 = parse(filter).serialize();
    let rendered2 = parse(&rendered1).serialize();
    assert_eq!(
        rendered1, rendered2,
        "Round-trip failed.\n  Input:    {filter}\n  First:    {rendered1}\n  Second:   {rendered2}"
    );
}

pub fn text(value: &str) -> SqlValue {
    SqlValue::Text(String::from(value))
}

/// `Status` (flags: Active=1, Archived=4) and `Priority` (Low=1, High=2).
pub fn enums() -> EnumMetadataCache {
    EnumMetadataCache::new(
        StaticEnumResolver::new()
            .with_type(
                EnumType::new("Status", 32)
                    .flags()
                    .member("Active", 1)
                    .member("Archived", 4),
            )
            .with_type(EnumType::new("Priority", 32).member("Low", 1).member("High", 2)),
    )
}

/// Customers with an `Orders` navigation joined on `Id = CustomerId`.
pub fn schema() -> StaticSchema {
    StaticSchema::new().with_navigation(
        "Customers",
        Navigation::new("Orders", "Orders").key("Id", "CustomerId"),
    )
}
