//! Invoicing System - OData to T-SQL Example
//!
//! This example compiles the statements behind a small invoicing service:
//! - Idempotent DDL for the invoice tables
//! - Dashboard queries built from OData query strings
//! - An upsert of staged invoices with optimistic concurrency
//! - A graph batch fetching clients with their invoices in one round trip
//!
//! Run with: cargo run --example invoicing

use odata_tsql_core::ddl::{
    Column, DdlSerializer, DefaultValue, ForeignKey, ForeignKeyAction, Index, Table,
};
use odata_tsql_core::projection::{Branch, GraphQuery};
use odata_tsql_core::query::{
    ColumnRole, MergeQuery, QueryColumn, QueryOptions, Source, TableName,
};
use odata_tsql_core::schema::Navigation;
use odata_tsql_core::{
    CompileError, CompiledQuery, CompilerOptions, FilterParser, QueryCompiler, RenderContext,
    Statement,
};

// =============================================================================
// SCHEMA DEFINITIONS
// =============================================================================

fn clients() -> Table {
    Table::new("Clients")
        .owner("billing")
        .column(Column::new("Id", "int").identity(1, 1))
        .column(Column::new("Name", "nvarchar").length(200).not_null())
        .column(Column::new("Email", "nvarchar").length(320))
        .column(Column::new("PaymentTermsDays", "int").not_null().default_value(DefaultValue::Integer(30)))
        .index(Index::primary_key("PK_Clients").key("Id"))
}

fn invoices() -> Table {
    Table::new("Invoices")
        .owner("billing")
        .column(Column::new("Id", "int").identity(1, 1))
        .column(Column::new("ClientId", "int").not_null())
        .column(Column::new("Number", "nvarchar").length(32).not_null())
        .column(Column::new("Status", "int").not_null().check("[Status] BETWEEN 0 AND 3"))
        .column(Column::new("Total", "decimal").precision(19).scale(4).not_null())
        .column(Column::new("DueDate", "date").not_null())
        .column(Column::new("CreatedAt", "datetime2").precision(3).default_value(
            DefaultValue::Expression(String::from("SYSUTCDATETIME()")),
        ))
        .column(Column::new("Version", "rowversion"))
        .index(Index::primary_key("PK_Invoices").key("Id"))
        .index(Index::unique_constraint("UQ_Invoices_Number").key("Number"))
        .index(Index::new("IX_Invoices_Due").key("ClientId").key_desc("DueDate").include("Total"))
        .foreign_key(
            ForeignKey::new("FK_Invoices_Clients", "billing.Clients")
                .column("ClientId", "Id")
                .on_delete(ForeignKeyAction::NoAction),
        )
}

// =============================================================================
// HELPER TO PRINT SQL
// =============================================================================

fn print_sql(description: &str, sql: &str) {
    println!("-- {description}");
    println!("{sql}");
    println!();
}

fn print_compiled(description: &str, compiled: &CompiledQuery) {
    print_sql(description, &compiled.batch());
}

// =============================================================================
// EXAMPLE QUERIES
// =============================================================================

fn main() -> Result<(), CompileError> {
    println!("-- =============================================================================");
    println!("-- INVOICING SYSTEM - SQL QUERIES");
    println!("-- =============================================================================");
    println!();

    let options = CompilerOptions {
        user_name: Some(String::from("billing-service")),
        ..CompilerOptions::default()
    };
    let compiler = QueryCompiler::new(RenderContext::new(&options));
    let parser = FilterParser::new();

    // -------------------------------------------------------------------------
    // SCHEMA
    // -------------------------------------------------------------------------
    let ddl = DdlSerializer::new();
    print_sql("Clients table", &ddl.create_script(&clients())?);
    print_sql("Invoices table", &ddl.create_script(&invoices())?);

    // -------------------------------------------------------------------------
    // DASHBOARD QUERIES
    // -------------------------------------------------------------------------
    let overdue = QueryOptions::parse(
        "$filter=Status eq 1 and DueDate lt @today&$orderby=DueDate&$top=20&@today=2024-01-15",
    )?
    .to_select(TableName::new("Invoices").owner("billing"), &parser)?;
    print_compiled("Overdue invoices", &compiler.compile(&overdue.into())?);

    let revenue = QueryOptions::parse(
        "$filter=year(DueDate) eq 2024&$groupby=ClientId&$aggregate=Total with sum as Revenue",
    )?
    .to_select(TableName::new("Invoices").owner("billing"), &parser)?;
    print_compiled("Revenue per client in 2024", &compiler.compile(&revenue.into())?);

    let lookup = QueryOptions::parse("$filter=contains(tolower(Name), 'acme')&$select=Id,Name")?
        .to_select(TableName::new("Clients").owner("billing"), &parser)?;
    print_compiled("Client lookup", &compiler.compile(&lookup.into())?);

    // -------------------------------------------------------------------------
    // WRITES
    // -------------------------------------------------------------------------
    let upsert = MergeQuery::into(TableName::new("Invoices").owner("billing"))
        .column(QueryColumn::new("Id").key())
        .column(QueryColumn::new("Status"))
        .column(QueryColumn::new("Total"))
        .column(QueryColumn::new("Version").role(ColumnRole::Concurrency))
        .update_when_matched()
        .insert_when_not_matched()
        .check_concurrency("Invoice was modified by another user")
        .using(Source::table("#InvoiceStaging"))
        .build();
    print_compiled(
        "Upsert staged invoices",
        &compiler.compile(&Statement::Merge(upsert))?,
    );

    // -------------------------------------------------------------------------
    // GRAPH
    // -------------------------------------------------------------------------
    let mut graph = GraphQuery::new("billing.Clients")
        .key("Id")
        .columns(["Id", "Name"])
        .filter(parser.parse_filter("PaymentTermsDays le 30")?);
    graph.attach(
        GraphQuery::ROOT,
        Branch::new(Navigation::new("Invoices", "billing.Invoices").key("Id", "ClientId"))
            .key("Id")
            .columns(["Id", "Number", "Total"])
            .filter(parser.parse_filter("Status ne 3")?),
    )?;
    print_compiled("Clients with open invoices", &graph.compile(&compiler)?);

    Ok(())
}
