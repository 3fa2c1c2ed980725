//! End-to-end tests for filter rendering: comparisons, conditions,
//! functions, enums, parameters and quantifiers.

mod common;
use common::*;

use std::collections::HashMap;

use odata_tsql_core::filter::{FunctionRegistry, UserFunctionRegistry};
use odata_tsql_core::query::{QueryCompiler, SelectQuery, Source};
use odata_tsql_core::{
    compile_filter, CompileError, CompilerOptions, FilterParser, FilterSerializer,
    ParameterContext, RenderContext, SqlValue,
};

// ===================================================================
// Comparisons and conditions
// ===================================================================

#[test]
fn single_comparison() {
    let (sql, values) = where_clause("Age gt 21");
    assert_eq!(sql, "([Age] > @p0)");
    assert_eq!(values, vec![SqlValue::Int(21)]);
}

#[test]
fn and_over_grouped_or() {
    let (sql, values) = where_clause("Age gt 21 and (City eq 'Seattle' or City eq 'Portland')");
    assert_eq!(
        sql,
        "(([Age] > @p0) AND (([City] = @p1) OR ([City] = @p2)))"
    );
    assert_eq!(
        values,
        vec![SqlValue::Int(21), text("Seattle"), text("Portland")]
    );
    round_trip("Age gt 21 and (City eq 'Seattle' or City eq 'Portland')");
}

#[test]
fn and_binds_tighter_than_or() {
    let (sql, _) = where_clause("A eq 1 or B eq 2 and C eq 3");
    assert_eq!(sql, "(([A] = @p0) OR (([B] = @p1) AND ([C] = @p2)))");
}

#[test]
fn every_comparison_operator() {
    assert_eq!(where_clause("A ne 1").0, "([A] != @p0)");
    assert_eq!(where_clause("A ge 1").0, "([A] >= @p0)");
    assert_eq!(where_clause("A lt 1").0, "([A] < @p0)");
    assert_eq!(where_clause("A le 1").0, "([A] <= @p0)");
}

#[test]
fn null_on_either_side() {
    assert_eq!(where_clause("Name eq null").0, "([Name] IS NULL)");
    assert_eq!(where_clause("null eq Name").0, "([Name] IS NULL)");
    assert_eq!(where_clause("Name ne null").0, "([Name] IS NOT NULL)");
    assert!(where_clause("Name eq null").1.is_empty());
}

#[test]
fn in_literal_list() {
    let (sql, values) = where_clause("City in ('Seattle', 'Portland')");
    assert_eq!(sql, "([City] IN (@p0, @p1))");
    assert_eq!(values, vec![text("Seattle"), text("Portland")]);
}

#[test]
fn literals_are_never_inlined() {
    let (sql, values) = where_clause("Name eq 'x''; DROP TABLE People; --'");
    assert_eq!(sql, "([Name] = @p0)");
    assert_eq!(values, vec![text("x'; DROP TABLE People; --")]);
}

// ===================================================================
// Arithmetic
// ===================================================================

#[test]
fn arithmetic_precedence() {
    assert_eq!(
        where_clause("A add B mul C eq 10").0,
        "(([A] + ([B] * [C])) = @p0)"
    );
    assert_eq!(
        where_clause("A mul B add C mul D gt 0").0,
        "((([A] * [B]) + ([C] * [D])) > @p0)"
    );
}

#[test]
fn grouped_arithmetic_is_kept() {
    assert_eq!(
        where_clause("(A add B) mul C eq 10").0,
        "((([A] + [B]) * [C]) = @p0)"
    );
}

#[test]
fn subtraction_of_columns() {
    assert_eq!(
        where_clause("Price sub Discount gt 10").0,
        "(([Price] - [Discount]) > @p0)"
    );
}

// ===================================================================
// Functions
// ===================================================================

#[test]
fn contains_binds_wrapped_pattern() {
    let (sql, values) = where_clause("contains(Name,'foo')");
    assert_eq!(sql, "[Name] LIKE @p0");
    assert_eq!(values, vec![text("%foo%")]);
}

#[test]
fn startswith_and_endswith() {
    assert_eq!(where_clause("startswith(Name,'An')").1, vec![text("An%")]);
    assert_eq!(where_clause("endswith(Name,'son')").1, vec![text("%son")]);
}

#[test]
fn negated_contains() {
    let (sql, values) = where_clause("not contains(Name,'foo')");
    assert_eq!(sql, "[Name] NOT LIKE @p0");
    assert_eq!(values, vec![text("%foo%")]);
}

#[test]
fn boolean_function_compared_to_false() {
    let (sql, _) = where_clause("contains(Name,'foo') eq false");
    assert_eq!(sql, "NOT ([Name] LIKE @p0)");
}

#[test]
fn scalar_function_in_comparison() {
    assert_eq!(where_clause("tolower(Name) eq 'ann'").0, "(LOWER([Name]) = @p0)");
    assert_eq!(where_clause("length(Name) gt 5").0, "(LEN([Name]) > @p0)");
    assert_eq!(where_clause("year(Created) eq 2024").0, "(DATEPART(YEAR, [Created]) = @p0)");
}

#[test]
fn isof_matches_exact_and_derived_types() {
    let (sql, values) = where_clause("isof('Model.Car')");
    assert_eq!(sql, "([__type] = @p0 OR [__type] LIKE @p1)");
    assert_eq!(values, vec![text("Model.Car"), text("%.Model.Car")]);
}

#[test]
fn user_function_from_registry() {
    let registry = UserFunctionRegistry::new().with_template("distance", "dbo.Distance({0}, {1})");
    let expression = FilterParser::new()
        .with_functions(registry.names())
        .parse_filter("distance(Lat, Lon) lt 10")
        .unwrap_or_else(|e| panic!("Failed to parse: {e:?}"));

    let options = CompilerOptions::default();
    let mut params = ParameterContext::default();
    let sql = FilterSerializer::new(RenderContext::new(&options).with_functions(&registry), &mut params)
        .serialize(&expression)
        .unwrap_or_else(|e| panic!("Failed to render: {e:?}"));
    assert_eq!(sql, "(dbo.Distance([Lat], [Lon]) < @p0)");
}

#[test]
fn function_without_rendering_is_not_supported() {
    let expression = FilterParser::new()
        .with_functions(["distance"])
        .parse_filter("distance(Lat, Lon) lt 10")
        .unwrap_or_else(|e| panic!("Failed to parse: {e:?}"));

    let options = CompilerOptions::default();
    let mut params = ParameterContext::default();
    let err = FilterSerializer::new(RenderContext::new(&options), &mut params)
        .serialize(&expression)
        .expect_err("unregistered function must not render");
    assert_eq!(err, CompileError::NotSupported(String::from("function 'distance'")));
}

// ===================================================================
// Relative dates
// ===================================================================

#[test]
fn relative_date_placeholders() {
    let (sql, values) = where_clause("Created lt @UtcNow");
    assert_eq!(sql, "([Created] < GETUTCDATE())");
    assert!(values.is_empty());
    assert_eq!(where_clause("Due ge @Today").0, "([Due] >= CAST(GETDATE() AS DATE))");
}

// ===================================================================
// Enums
// ===================================================================

#[test]
fn flags_enum_equality_is_bitwise() {
    let options = CompilerOptions::default();
    let enums = enums();
    let ctx = RenderContext::new(&options).with_enums(&enums);

    assert_eq!(render_with("Status eq Status'Active'", ctx).0, "([Status] & 1 != 0)");
    assert_eq!(render_with("Status ne Status'Active'", ctx).0, "([Status] & 1 = 0)");
    assert_eq!(
        render_with("Status has Status'Active,Archived'", ctx).0,
        "([Status] & 5 != 0)"
    );
}

#[test]
fn has_on_plain_value_binds_mask_once() {
    let (sql, values) = where_clause("Permissions has 6");
    assert_eq!(sql, "(([Permissions] & @p0) = @p0)");
    assert_eq!(values, vec![SqlValue::Int(6)]);
}

#[test]
fn plain_enum_is_cast_to_its_width() {
    let options = CompilerOptions::default();
    let enums = enums();
    let ctx = RenderContext::new(&options).with_enums(&enums);

    let (sql, values) = render_with("Priority eq Priority'High'", ctx);
    assert_eq!(sql, "([Priority] = CAST(2 AS INT))");
    assert!(values.is_empty());
}

#[test]
fn enum_without_metadata() {
    let options = CompilerOptions::default();
    let err = render_err("Status eq Status'Active'", RenderContext::new(&options));
    assert!(matches!(err, CompileError::UnsupportedType { ref type_name, .. } if type_name == "Status"));
}

#[test]
fn enum_with_unknown_member() {
    let options = CompilerOptions::default();
    let enums = enums();
    let err = render_err(
        "Status eq Status'Deleted'",
        RenderContext::new(&options).with_enums(&enums),
    );
    assert!(matches!(err, CompileError::UnsupportedType { .. }));
}

// ===================================================================
// Parameter substitution
// ===================================================================

fn substituted(filter: &str, pairs: &[(&str, &str)]) -> String {
    let values: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (String::from(*k), String::from(*v)))
        .collect();
    let expression = parse(filter)
        .convert(&values)
        .unwrap_or_else(|e| panic!("Failed to convert: {filter}\nError: {e:?}"));
    let options = CompilerOptions::default();
    let mut params = ParameterContext::default();
    FilterSerializer::new(RenderContext::new(&options), &mut params)
        .serialize(&expression)
        .unwrap_or_else(|e| panic!("Failed to render: {filter}\nError: {e:?}"))
}

#[test]
fn single_value_parameter() {
    assert_eq!(substituted("Age gt @age", &[("age", "30")]), "([Age] > @p0)");
}

#[test]
fn multi_value_equality_splits_into_or() {
    assert_eq!(
        substituted("City eq @cities", &[("cities", "'Seattle','Portland'")]),
        "(([City] = @p0) OR ([City] = @p1))"
    );
}

#[test]
fn multi_value_inequality_splits_into_and() {
    assert_eq!(
        substituted("Id ne @ids", &[("ids", "1,2")]),
        "(([Id] != @p0) AND ([Id] != @p1))"
    );
}

// ===================================================================
// Quantifiers
// ===================================================================

fn customers_where(filter: &str) -> String {
    let options = CompilerOptions::default();
    let schema = schema();
    let select = SelectQuery::from(Source::table("Customers")).filter(parse(filter));
    QueryCompiler::new(RenderContext::new(&options).with_schema(&schema))
        .compile(&select.into())
        .unwrap_or_else(|e| panic!("Failed to compile: {filter}\nError: {e:?}"))
        .sql
}

#[test]
fn any_with_lambda() {
    assert_eq!(
        customers_where("Orders/any(o: o/Total gt 100)"),
        "SELECT * FROM [Customers] WHERE EXISTS (SELECT 1 FROM [Orders] AS [o] \
         WHERE [o].[CustomerId] = [Customers].[Id] AND ([o].[Total] > @p0))"
    );
}

#[test]
fn any_without_predicate() {
    assert_eq!(
        customers_where("Orders/any()"),
        "SELECT * FROM [Customers] WHERE EXISTS (SELECT 1 FROM [Orders] AS [q0] \
         WHERE [q0].[CustomerId] = [Customers].[Id])"
    );
}

#[test]
fn all_negates_twice() {
    assert_eq!(
        customers_where("Orders/all(o: o/Total gt 0)"),
        "SELECT * FROM [Customers] WHERE NOT EXISTS (SELECT 1 FROM [Orders] AS [o] \
         WHERE [o].[CustomerId] = [Customers].[Id] AND NOT (([o].[Total] > @p0)))"
    );
}

#[test]
fn quantifier_without_schema() {
    let options = CompilerOptions::default();
    let select = SelectQuery::from(Source::table("Customers")).filter(parse("Orders/any()"));
    let err = QueryCompiler::new(RenderContext::new(&options))
        .compile(&select.into())
        .expect_err("quantifier needs navigation metadata");
    assert!(matches!(err, CompileError::NotSupported(_)));
}

// ===================================================================
// Options
// ===================================================================

#[test]
fn custom_parameter_prefix() {
    let options = CompilerOptions {
        parameter_prefix: String::from("v"),
        ..CompilerOptions::default()
    };
    let compiled = compile_filter("A eq 1 and B eq 2", &options)
        .unwrap_or_else(|e| panic!("Failed to compile: {e:?}"));
    assert_eq!(compiled.sql, "(([A] = @v0) AND ([B] = @v1))");
    assert_eq!(compiled.declarations, "DECLARE @v0 INT = 1;\nDECLARE @v1 INT = 2;");
}

#[test]
fn pretty_conditions_break_lines() {
    let options = CompilerOptions {
        pretty: true,
        ..CompilerOptions::default()
    };
    let compiled = compile_filter("A eq 1 and B eq 2", &options)
        .unwrap_or_else(|e| panic!("Failed to compile: {e:?}"));
    assert_eq!(compiled.sql, "(([A] = @p0)\n  AND ([B] = @p1))");
}
