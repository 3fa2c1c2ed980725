//! Tests for graph batches and reconstruction of their result sets.

mod common;
use common::*;

use std::cell::RefCell;

use serde_json::json;

use odata_tsql_core::ddl::{Column, Index, Table};
use odata_tsql_core::params::QueryParameter;
use odata_tsql_core::projection::{reconstruct, Branch, Executor, GraphQuery, ResultSet};
use odata_tsql_core::query::QueryCompiler;
use odata_tsql_core::schema::Navigation;
use odata_tsql_core::{CompileError, CompilerOptions, RenderContext, Result};

fn customers_with_orders() -> GraphQuery {
    let mut graph = GraphQuery::new("Customers").key("Id");
    graph
        .attach(
            GraphQuery::ROOT,
            Branch::new(Navigation::new("Orders", "Orders").key("Id", "CustomerId")).key("Id"),
        )
        .unwrap_or_else(|e| panic!("Failed to attach Orders: {e:?}"));
    graph
}

/// Ann (1) with orders 10 and 11, Bob (2) without orders. The paths repeat
/// the row for order 10.
fn canned_sets() -> Vec<ResultSet> {
    vec![
        ResultSet::new(["ComponentId", "PathKey"])
            .row(vec![json!(0), json!("1")])
            .row(vec![json!(0), json!("2")])
            .row(vec![json!(1), json!("10")])
            .row(vec![json!(1), json!("11")]),
        ResultSet::new(["__row", "s0", "s1"])
            .row(vec![json!(1), json!("1"), json!(null)])
            .row(vec![json!(2), json!("2"), json!(null)])
            .row(vec![json!(3), json!("1"), json!("10")])
            .row(vec![json!(4), json!("1"), json!("11")])
            .row(vec![json!(5), json!("1"), json!("10")]),
        ResultSet::new(["__PathKey", "Id", "Name"])
            .row(vec![json!("1"), json!(1), json!("Ann")])
            .row(vec![json!("2"), json!(2), json!("Bob")]),
        ResultSet::new(["__PathKey", "Id", "Total"])
            .row(vec![json!("10"), json!(10), json!(99.5)])
            .row(vec![json!("11"), json!(11), json!(12)]),
    ]
}

struct CannedExecutor {
    sets: Vec<ResultSet>,
    seen: RefCell<Option<(String, usize)>>,
}

impl Executor for CannedExecutor {
    fn execute(&self, sql: &str, parameters: &[QueryParameter]) -> Result<Vec<ResultSet>> {
        *self.seen.borrow_mut() = Some((String::from(sql), parameters.len()));
        Ok(self.sets.clone())
    }
}

// ===================================================================
// Batch
// ===================================================================

#[test]
fn batch_declares_staging_table() {
    let sql = compile(
        customers_with_orders()
            .to_script(&CompilerOptions::default())
            .unwrap_or_else(|e| panic!("Failed to build script: {e:?}")),
    )
    .sql;
    assert!(sql.starts_with(
        "DECLARE @paths TABLE ([__row] INT IDENTITY(1, 1) NOT NULL, \
         [s0] NVARCHAR(450) NULL, [s1] NVARCHAR(450) NULL);"
    ));
    assert!(sql.contains(
        "SELECT CAST([c0].[Id] AS NVARCHAR(450)) AS [s0], NULL AS [s1] FROM [Customers] AS [c0]"
    ));
    assert!(sql.contains("LEFT JOIN [Orders] AS [c1] ON ([c0].[Id] = [c1].[CustomerId])"));
    assert!(sql.contains("WHERE ([c1].[Id] IS NOT NULL)"));
    assert!(sql.contains(
        "SELECT DISTINCT 0 AS [ComponentId], [s0] AS [PathKey] FROM @paths WHERE ([s0] IS NOT NULL)"
    ));
}

#[test]
fn branch_filter_is_qualified_and_bound() {
    let mut graph = GraphQuery::new("Customers").key("Id");
    graph
        .attach(
            GraphQuery::ROOT,
            Branch::new(Navigation::new("Orders", "Orders").key("Id", "CustomerId"))
                .key("Id")
                .filter(parse("Total gt 100")),
        )
        .unwrap_or_else(|e| panic!("Failed to attach Orders: {e:?}"));
    let options = CompilerOptions::default();
    let compiled = graph
        .compile(&QueryCompiler::new(RenderContext::new(&options)))
        .unwrap_or_else(|e| panic!("Failed to compile graph: {e:?}"));
    assert!(compiled.sql.contains("[c1].[Total] > @p0"));
    assert_eq!(compiled.parameters.len(), 1);
}

#[test]
fn root_without_key_is_refused() {
    let err = GraphQuery::new("Customers")
        .to_script(&CompilerOptions::default())
        .expect_err("root without key must be rejected");
    assert!(matches!(err, CompileError::Policy(_)));
}

#[test]
fn staging_table_must_be_temporary() {
    let options = CompilerOptions {
        staging_table: String::from("paths"),
        ..CompilerOptions::default()
    };
    let err = customers_with_orders()
        .to_script(&options)
        .expect_err("permanent staging table must be rejected");
    assert!(matches!(err, CompileError::Policy(_)));
}

// ===================================================================
// Expansion from schema
// ===================================================================

#[test]
fn expand_uses_target_primary_key() {
    let schema = schema().with_table(
        Table::new("Orders")
            .column(Column::new("OrderNo", "int").not_null())
            .index(Index::primary_key("PK_Orders").key("OrderNo")),
    );
    let mut graph = GraphQuery::new("Customers").key("Id");
    let id = graph
        .expand(&schema, GraphQuery::ROOT, "Orders")
        .unwrap_or_else(|e| panic!("Failed to expand Orders: {e:?}"));
    let node = graph.node(id).unwrap_or_else(|| panic!("missing component {id}"));
    assert_eq!(node.path, "Orders");
    assert_eq!(node.keys, vec![String::from("OrderNo")]);
    assert_eq!(
        node.join,
        vec![(String::from("Id"), String::from("CustomerId"))]
    );
}

#[test]
fn expand_unknown_navigation() {
    let mut graph = GraphQuery::new("Customers").key("Id");
    let err = graph
        .expand(&schema(), GraphQuery::ROOT, "Invoices")
        .expect_err("unknown navigation must be rejected");
    assert!(matches!(err, CompileError::NotSupported(_)));
}

// ===================================================================
// Reconstruction
// ===================================================================

#[test]
fn fetch_rebuilds_nested_rows() {
    let graph = customers_with_orders();
    let executor = CannedExecutor {
        sets: canned_sets(),
        seen: RefCell::new(None),
    };
    let options = CompilerOptions::default();
    let results = graph
        .fetch(&QueryCompiler::new(RenderContext::new(&options)), &executor)
        .unwrap_or_else(|e| panic!("Failed to fetch graph: {e:?}"));

    let seen = executor.seen.borrow();
    let (sql, parameters) = seen.as_ref().unwrap_or_else(|| panic!("batch was not executed"));
    assert!(sql.starts_with("DECLARE @paths TABLE ("));
    assert_eq!(*parameters, 0);

    assert_eq!(results.len(), 2);
    let ann = &results[0];
    assert_eq!(ann.key, "1");
    assert_eq!(ann.member["Name"], json!("Ann"));
    let orders: Vec<&str> = ann.children.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(orders, vec!["10", "11"]);
    assert_eq!(ann.children[0].path, "Orders");
    assert!(results[1].children.is_empty());
}

#[test]
fn json_lists_every_navigation() {
    let graph = customers_with_orders();
    let results = reconstruct(&graph, &canned_sets())
        .unwrap_or_else(|e| panic!("Failed to reconstruct: {e:?}"));
    assert_eq!(
        results[0].to_json(&graph),
        json!({
            "Id": 1,
            "Name": "Ann",
            "Orders": [
                { "Id": 10, "Total": 99.5 },
                { "Id": 11, "Total": 12 }
            ]
        })
    );
    assert_eq!(
        results[1].to_json(&graph),
        json!({ "Id": 2, "Name": "Bob", "Orders": [] })
    );
}

#[test]
fn rows_missing_from_their_set_are_dropped() {
    let graph = customers_with_orders();
    let mut sets = canned_sets();
    sets[3].rows.truncate(1);
    let results = reconstruct(&graph, &sets)
        .unwrap_or_else(|e| panic!("Failed to reconstruct: {e:?}"));
    assert_eq!(results[0].children.len(), 1);
}

#[test]
fn result_set_count_must_match() {
    let graph = customers_with_orders();
    let sets = canned_sets();
    let err = reconstruct(&graph, &sets[..3]).expect_err("missing set must be rejected");
    assert!(matches!(err, CompileError::InvalidResult(_)));
}

#[test]
fn branch_set_needs_path_key() {
    let graph = customers_with_orders();
    let mut sets = canned_sets();
    sets[2] = ResultSet::new(["Id", "Name"]).row(vec![json!(1), json!("Ann")]);
    let err = reconstruct(&graph, &sets).expect_err("set without path key must be rejected");
    assert!(matches!(err, CompileError::InvalidResult(_)));
}
