//! Idempotent DDL rendering.
//!
//! Every statement is guarded by an existence check so a script can be
//! replayed against a database that already has part of the schema.

use super::model::{Column, ForeignKey, Index, Table};
use super::types::render_type;
use crate::dialect::{Dialect, TSql};
use crate::error::{CompileError, Result};
use crate::filter::quote_table;

const INDENT: &str = "    ";

/// Renders [`Table`] definitions as guarded T-SQL DDL.
#[derive(Debug, Default, Clone, Copy)]
pub struct DdlSerializer;

impl DdlSerializer {
    /// Creates a serializer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Renders one column definition.
    ///
    /// With a table name, default and check constraints are named
    /// `DF_<table>_<column>` and `CK_<table>_<column>`; without one (table
    /// variables) they stay anonymous.
    ///
    /// # Errors
    ///
    /// Fails when the column type cannot take its declared size.
    pub fn column_definition(&self, column: &Column, table: Option<&str>) -> Result<String> {
        let name = TSql.quote_identifier(&column.name);
        if let Some(formula) = &column.computed {
            return Ok(format!("{name} AS ({formula})"));
        }

        let mut sql = format!("{name} {}", render_type(column)?);
        if let Some(identity) = column.identity {
            sql.push_str(&format!(
                " IDENTITY({}, {})",
                identity.seed, identity.increment
            ));
        }
        sql.push_str(if column.nullable { " NULL" } else { " NOT NULL" });

        if let Some(default) = &column.default {
            if let Some(table) = table {
                sql.push_str(&format!(
                    " CONSTRAINT {}",
                    TSql.quote_identifier(&format!("DF_{table}_{}", column.name))
                ));
            }
            sql.push_str(&format!(" DEFAULT ({})", default.to_sql()));
        }
        if let Some(check) = &column.check {
            if let Some(table) = table {
                sql.push_str(&format!(
                    " CONSTRAINT {}",
                    TSql.quote_identifier(&format!("CK_{table}_{}", column.name))
                ));
            }
            sql.push_str(&format!(" CHECK ({check})"));
        }
        Ok(sql)
    }

    /// `CREATE TABLE` guarded by `OBJECT_ID`, with key constraints inline.
    ///
    /// # Errors
    ///
    /// Fails for a table without columns or with an invalid column.
    pub fn create_table(&self, table: &Table) -> Result<String> {
        if table.columns.is_empty() {
            return Err(CompileError::Policy(format!(
                "table '{}' has no columns",
                table.name
            )));
        }
        let qualified = table.qualified_name();
        let mut lines = table
            .columns
            .iter()
            .map(|c| self.column_definition(c, Some(&table.name)))
            .collect::<Result<Vec<_>>>()?;
        for index in table.indexes.iter().filter(|i| i.is_constraint()) {
            lines.push(constraint_clause(index)?);
        }

        let body = lines
            .iter()
            .map(|line| format!("{INDENT}{INDENT}{line}"))
            .collect::<Vec<_>>()
            .join(",\n");
        Ok(format!(
            "IF OBJECT_ID({}, N'U') IS NULL\nBEGIN\n{INDENT}CREATE TABLE {qualified} (\n{body}\n{INDENT});\nEND;",
            TSql.quote_string(&qualified)
        ))
    }

    /// `ALTER TABLE ... ADD` guarded by `COL_LENGTH`.
    ///
    /// # Errors
    ///
    /// Fails for an invalid column.
    pub fn add_column(&self, table: &Table, column: &Column) -> Result<String> {
        let qualified = table.qualified_name();
        Ok(format!(
            "IF COL_LENGTH({}, {}) IS NULL\n{INDENT}ALTER TABLE {qualified} ADD {};",
            TSql.quote_string(&qualified),
            TSql.quote_string(&column.name),
            self.column_definition(column, Some(&table.name))?
        ))
    }

    /// Creates an index, or adds a key constraint, if it does not exist.
    ///
    /// # Errors
    ///
    /// Fails for an index without key columns.
    pub fn create_index(&self, table: &Table, index: &Index) -> Result<String> {
        let qualified = table.qualified_name();
        if index.is_constraint() {
            let object = TSql.quote_path([table.owner.as_deref().unwrap_or("dbo"), index.name.as_str()]);
            return Ok(format!(
                "IF OBJECT_ID({}) IS NULL\n{INDENT}ALTER TABLE {qualified} ADD {};",
                TSql.quote_string(&object),
                constraint_clause(index)?
            ));
        }

        let mut sql = format!(
            "IF NOT EXISTS (SELECT 1 FROM sys.indexes WHERE name = {} AND object_id = OBJECT_ID({}))\n{INDENT}CREATE ",
            TSql.quote_string(&index.name),
            TSql.quote_string(&qualified)
        );
        if index.is_unique {
            sql.push_str("UNIQUE ");
        }
        sql.push_str(if index.clustered { "CLUSTERED" } else { "NONCLUSTERED" });
        sql.push_str(&format!(
            " INDEX {} ON {qualified} {}",
            TSql.quote_identifier(&index.name),
            key_list(index)?
        ));
        if !index.partition.included.is_empty() {
            let included: Vec<String> = index
                .partition
                .included
                .iter()
                .map(|c| TSql.quote_identifier(c))
                .collect();
            sql.push_str(&format!(" INCLUDE ({})", included.join(", ")));
        }
        if let Some(storage) = &index.partition.storage {
            sql.push_str(&format!(" ON {}", TSql.quote_identifier(storage)));
        }
        sql.push(';');
        Ok(sql)
    }

    /// Adds a foreign key if it does not exist.
    ///
    /// # Errors
    ///
    /// Fails when the column lists are empty or differ in length.
    pub fn add_foreign_key(&self, table: &Table, foreign_key: &ForeignKey) -> Result<String> {
        if foreign_key.columns.is_empty()
            || foreign_key.columns.len() != foreign_key.referenced_columns.len()
        {
            return Err(CompileError::Policy(format!(
                "foreign key '{}' needs matching column lists",
                foreign_key.name
            )));
        }
        let qualified = table.qualified_name();
        let object = TSql.quote_path([table.owner.as_deref().unwrap_or("dbo"), foreign_key.name.as_str()]);
        let quote_all = |columns: &[String]| {
            columns
                .iter()
                .map(|c| TSql.quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut sql = format!(
            "IF OBJECT_ID({}, N'F') IS NULL\n{INDENT}ALTER TABLE {qualified} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            TSql.quote_string(&object),
            TSql.quote_identifier(&foreign_key.name),
            quote_all(&foreign_key.columns),
            referenced_table(&foreign_key.references),
            quote_all(&foreign_key.referenced_columns)
        );
        if let Some(action) = foreign_key.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_sql());
        }
        sql.push(';');
        Ok(sql)
    }

    /// The full idempotent script for a table: the table, then every
    /// column, index and foreign key guarded on its own so a partially
    /// deployed table is completed.
    ///
    /// # Errors
    ///
    /// Propagates the first rendering failure.
    pub fn create_script(&self, table: &Table) -> Result<String> {
        let mut statements = vec![self.create_table(table)?];
        for column in &table.columns {
            statements.push(self.add_column(table, column)?);
        }
        for index in &table.indexes {
            statements.push(self.create_index(table, index)?);
        }
        for foreign_key in &table.foreign_keys {
            statements.push(self.add_foreign_key(table, foreign_key)?);
        }
        tracing::debug!(table = %table.name, statements = statements.len(), "rendered ddl script");
        Ok(statements.join("\n"))
    }

    /// Declares a table variable (`@name`) or creates a temporary table
    /// (`#name`) holding `columns`.
    ///
    /// # Errors
    ///
    /// Fails for an invalid column or a name that is neither.
    pub fn declare_table(&self, name: &str, columns: &[Column]) -> Result<String> {
        let definitions = columns
            .iter()
            .map(|c| self.column_definition(c, None))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        if name.starts_with('@') {
            Ok(format!("DECLARE {name} TABLE ({definitions});"))
        } else if name.starts_with('#') {
            Ok(format!("CREATE TABLE {name} ({definitions});"))
        } else {
            Err(CompileError::Policy(format!(
                "staging table '{name}' must be a table variable or a temporary table"
            )))
        }
    }
}

fn constraint_clause(index: &Index) -> Result<String> {
    let kind = if index.is_primary_key {
        "PRIMARY KEY"
    } else {
        "UNIQUE"
    };
    let storage = if index.clustered { "CLUSTERED" } else { "NONCLUSTERED" };
    let mut sql = format!(
        "CONSTRAINT {} {kind} {storage} {}",
        TSql.quote_identifier(&index.name),
        key_list(index)?
    );
    if let Some(on) = &index.partition.storage {
        sql.push_str(&format!(" ON {}", TSql.quote_identifier(on)));
    }
    Ok(sql)
}

fn key_list(index: &Index) -> Result<String> {
    if index.partition.keys.is_empty() {
        return Err(CompileError::Policy(format!(
            "index '{}' has no key columns",
            index.name
        )));
    }
    let keys: Vec<String> = index
        .partition
        .keys
        .iter()
        .map(|k| {
            format!(
                "{} {}",
                TSql.quote_identifier(&k.name),
                if k.descending { "DESC" } else { "ASC" }
            )
        })
        .collect();
    Ok(format!("({})", keys.join(", ")))
}

fn referenced_table(name: &str) -> String {
    if name.contains('.') {
        quote_table(name)
    } else {
        TSql.quote_path(["dbo", name])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ddl::DefaultValue;

    #[test]
    fn test_column_definition() {
        let ddl = DdlSerializer::new();
        let id = Column::new("Id", "int").identity(1, 1);
        assert_eq!(
            ddl.column_definition(&id, Some("Orders")).unwrap(),
            "[Id] INT IDENTITY(1, 1) NOT NULL"
        );
        let flag = Column::new("Active", "bit")
            .not_null()
            .default_value(DefaultValue::Boolean(true));
        assert_eq!(
            ddl.column_definition(&flag, Some("Orders")).unwrap(),
            "[Active] BIT NOT NULL CONSTRAINT [DF_Orders_Active] DEFAULT (1)"
        );
        assert_eq!(
            ddl.column_definition(&flag, None).unwrap(),
            "[Active] BIT NOT NULL DEFAULT (1)"
        );
        let total = Column::new("Total", "decimal").computed("[Qty] * [Price]");
        assert_eq!(
            ddl.column_definition(&total, None).unwrap(),
            "[Total] AS ([Qty] * [Price])"
        );
    }

    #[test]
    fn test_declare_table_variable() {
        let columns = [
            Column::new("__row", "int").identity(1, 1),
            Column::new("s0", "nvarchar").length(450),
        ];
        assert_eq!(
            DdlSerializer::new().declare_table("@paths", &columns).unwrap(),
            "DECLARE @paths TABLE ([__row] INT IDENTITY(1, 1) NOT NULL, [s0] NVARCHAR(450) NULL);"
        );
        assert!(DdlSerializer::new().declare_table("paths", &columns).is_err());
    }

    #[test]
    fn test_index_without_keys_is_rejected() {
        let table = Table::new("Orders").column(Column::new("Id", "int"));
        let err = DdlSerializer::new()
            .create_index(&table, &Index::new("IX_Empty"))
            .unwrap_err();
        assert!(matches!(err, CompileError::Policy(_)));
    }
}
