//! Tests for idempotent DDL scripts.

use odata_tsql_core::ddl::{
    Column, DdlSerializer, DefaultValue, ForeignKey, ForeignKeyAction, Index, Table,
};
use odata_tsql_core::CompileError;

fn orders() -> Table {
    Table::new("Orders")
        .column(Column::new("Id", "int").identity(1, 1))
        .column(Column::new("CustomerId", "int").not_null())
        .column(Column::new("Total", "decimal").precision(18).scale(2).not_null())
        .column(Column::new("Note", "nvarchar").length(200))
        .index(Index::primary_key("PK_Orders").key("Id"))
        .index(Index::new("IX_Orders_CustomerId").key("CustomerId").include("Total"))
        .foreign_key(
            ForeignKey::new("FK_Orders_Customers", "Customers")
                .column("CustomerId", "Id")
                .on_delete(ForeignKeyAction::Cascade),
        )
}

fn ddl() -> DdlSerializer {
    DdlSerializer::new()
}

// ===================================================================
// Tables and columns
// ===================================================================

#[test]
fn create_table_is_guarded() {
    let sql = ddl()
        .create_table(&orders())
        .unwrap_or_else(|e| panic!("Failed to render table: {e:?}"));
    assert_eq!(
        sql,
        "IF OBJECT_ID(N'[dbo].[Orders]', N'U') IS NULL\n\
         BEGIN\n    \
         CREATE TABLE [dbo].[Orders] (\n        \
         [Id] INT IDENTITY(1, 1) NOT NULL,\n        \
         [CustomerId] INT NOT NULL,\n        \
         [Total] DECIMAL(18,2) NOT NULL,\n        \
         [Note] NVARCHAR(200) NULL,\n        \
         CONSTRAINT [PK_Orders] PRIMARY KEY CLUSTERED ([Id] ASC)\n    \
         );\n\
         END;"
    );
}

#[test]
fn table_without_columns() {
    let err = ddl()
        .create_table(&Table::new("Empty"))
        .expect_err("table without columns must be rejected");
    assert!(matches!(err, CompileError::Policy(_)));
}

#[test]
fn add_column_checks_col_length() {
    let table = orders().owner("sales");
    let sql = ddl()
        .add_column(&table, &Column::new("Note", "nvarchar").length(200))
        .unwrap_or_else(|e| panic!("Failed to render column: {e:?}"));
    assert_eq!(
        sql,
        "IF COL_LENGTH(N'[sales].[Orders]', N'Note') IS NULL\n    \
         ALTER TABLE [sales].[Orders] ADD [Note] NVARCHAR(200) NULL;"
    );
}

#[test]
fn named_default_and_check_constraints() {
    let column = Column::new("Status", "tinyint")
        .not_null()
        .default_value(DefaultValue::Integer(0))
        .check("[Status] < 4");
    assert_eq!(
        ddl()
            .column_definition(&column, Some("Orders"))
            .unwrap_or_else(|e| panic!("Failed to render column: {e:?}")),
        "[Status] TINYINT NOT NULL CONSTRAINT [DF_Orders_Status] DEFAULT (0) \
         CONSTRAINT [CK_Orders_Status] CHECK ([Status] < 4)"
    );
}

#[test]
fn string_default_is_unicode_literal() {
    let column = Column::new("Region", "nvarchar")
        .length(20)
        .default_value(DefaultValue::String(String::from("O'Neil")));
    assert_eq!(
        ddl()
            .column_definition(&column, None)
            .unwrap_or_else(|e| panic!("Failed to render column: {e:?}")),
        "[Region] NVARCHAR(20) NULL DEFAULT (N'O''Neil')"
    );
}

#[test]
fn max_length_on_fixed_type_is_unsupported() {
    let table = Table::new("Codes").column(Column::new("Code", "char").max_length());
    let err = ddl()
        .create_table(&table)
        .expect_err("char(max) must be rejected");
    assert!(matches!(err, CompileError::UnsupportedType { .. }));
}

// ===================================================================
// Indexes and foreign keys
// ===================================================================

#[test]
fn create_index_with_include() {
    let table = orders();
    let sql = ddl()
        .create_index(&table, &table.indexes[1])
        .unwrap_or_else(|e| panic!("Failed to render index: {e:?}"));
    assert_eq!(
        sql,
        "IF NOT EXISTS (SELECT 1 FROM sys.indexes WHERE name = N'IX_Orders_CustomerId' \
         AND object_id = OBJECT_ID(N'[dbo].[Orders]'))\n    \
         CREATE NONCLUSTERED INDEX [IX_Orders_CustomerId] ON [dbo].[Orders] ([CustomerId] ASC) \
         INCLUDE ([Total]);"
    );
}

#[test]
fn unique_descending_index_on_filegroup() {
    let table = orders();
    let index = Index::new("IX_Orders_Total").unique().key_desc("Total").on("FG_Data");
    let sql = ddl()
        .create_index(&table, &index)
        .unwrap_or_else(|e| panic!("Failed to render index: {e:?}"));
    assert!(sql.ends_with(
        "CREATE UNIQUE NONCLUSTERED INDEX [IX_Orders_Total] ON [dbo].[Orders] ([Total] DESC) ON [FG_Data];"
    ));
}

#[test]
fn primary_key_added_as_constraint() {
    let table = orders();
    let sql = ddl()
        .create_index(&table, &table.indexes[0])
        .unwrap_or_else(|e| panic!("Failed to render key: {e:?}"));
    assert_eq!(
        sql,
        "IF OBJECT_ID(N'[dbo].[PK_Orders]') IS NULL\n    \
         ALTER TABLE [dbo].[Orders] ADD CONSTRAINT [PK_Orders] PRIMARY KEY CLUSTERED ([Id] ASC);"
    );
}

#[test]
fn foreign_key_with_cascade() {
    let table = orders();
    let sql = ddl()
        .add_foreign_key(&table, &table.foreign_keys[0])
        .unwrap_or_else(|e| panic!("Failed to render foreign key: {e:?}"));
    assert_eq!(
        sql,
        "IF OBJECT_ID(N'[dbo].[FK_Orders_Customers]', N'F') IS NULL\n    \
         ALTER TABLE [dbo].[Orders] ADD CONSTRAINT [FK_Orders_Customers] FOREIGN KEY ([CustomerId]) \
         REFERENCES [dbo].[Customers] ([Id]) ON DELETE CASCADE;"
    );
}

#[test]
fn foreign_key_needs_columns() {
    let err = ddl()
        .add_foreign_key(&orders(), &ForeignKey::new("FK_Empty", "Customers"))
        .expect_err("foreign key without columns must be rejected");
    assert!(matches!(err, CompileError::Policy(_)));
}

// ===================================================================
// Full scripts
// ===================================================================

#[test]
fn create_script_guards_every_object() {
    let sql = ddl()
        .create_script(&orders())
        .unwrap_or_else(|e| panic!("Failed to render script: {e:?}"));
    assert!(sql.starts_with("IF OBJECT_ID(N'[dbo].[Orders]', N'U') IS NULL"));
    assert_eq!(sql.matches("IF COL_LENGTH(").count(), 4);
    assert_eq!(sql.matches("IF NOT EXISTS (SELECT 1 FROM sys.indexes").count(), 1);
    assert_eq!(sql.matches("IF OBJECT_ID(N'[dbo].[PK_Orders]') IS NULL").count(), 1);
    assert!(sql.ends_with("ON DELETE CASCADE;"));
}

#[test]
fn temporary_staging_table() {
    let columns = [Column::new("s0", "nvarchar").length(450)];
    assert_eq!(
        ddl()
            .declare_table("#paths", &columns)
            .unwrap_or_else(|e| panic!("Failed to declare table: {e:?}")),
        "CREATE TABLE #paths ([s0] NVARCHAR(450) NULL);"
    );
}
