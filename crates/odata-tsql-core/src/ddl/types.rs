//! Fixed SQL type tables: size suffixes and Edm type mapping.

use super::model::{Column, Length};
use crate::error::{CompileError, Result};

/// How a SQL type takes its size suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suffix {
    /// No suffix.
    None,
    /// `(n)` or `(max)`.
    VariableLength,
    /// `(n)`; `max` is rejected.
    FixedLength,
    /// `(precision,scale)`.
    PrecisionScale,
    /// `(precision)` when a precision is set.
    Precision,
}

fn suffix_kind(type_name: &str) -> Suffix {
    match type_name.to_ascii_lowercase().as_str() {
        "varchar" | "nvarchar" | "varbinary" => Suffix::VariableLength,
        "char" | "nchar" | "binary" => Suffix::FixedLength,
        "decimal" | "numeric" => Suffix::PrecisionScale,
        "float" | "datetime2" | "datetimeoffset" | "time" => Suffix::Precision,
        _ => Suffix::None,
    }
}

/// Renders the column's type with its size suffix: `NVARCHAR(50)`,
/// `VARBINARY(max)`, `DECIMAL(18,2)`, `DATETIME2(3)`.
///
/// # Errors
///
/// Returns [`CompileError::UnsupportedType`] for `max` on a fixed-length type.
pub fn render_type(column: &Column) -> Result<String> {
    let name = column.type_name.to_ascii_uppercase();
    let suffix = match (suffix_kind(&column.type_name), column.length) {
        (Suffix::VariableLength, Some(Length::Max) | None) => String::from("(max)"),
        (Suffix::VariableLength | Suffix::FixedLength, Some(Length::Fixed(n))) => format!("({n})"),
        (Suffix::FixedLength, None) => String::from("(1)"),
        (Suffix::FixedLength, Some(Length::Max)) => {
            return Err(CompileError::unsupported_type(
                &column.type_name,
                format!("column '{}' cannot be declared with max length", column.name),
            ));
        }
        (Suffix::PrecisionScale, _) => format!(
            "({},{})",
            column.precision.unwrap_or(18),
            column.scale.unwrap_or(0)
        ),
        (Suffix::Precision, _) => column
            .precision
            .map(|p| format!("({p})"))
            .unwrap_or_default(),
        (Suffix::None, _) => String::new(),
    };
    Ok(format!("{name}{suffix}"))
}

/// Maps an Edm primitive type name to its SQL type.
#[must_use]
pub fn edm_sql_type(edm: &str) -> Option<&'static str> {
    let sql = match edm {
        "Edm.String" => "NVARCHAR(MAX)",
        "Edm.Boolean" => "BIT",
        "Edm.Byte" => "TINYINT",
        "Edm.SByte" | "Edm.Int16" => "SMALLINT",
        "Edm.Int32" => "INT",
        "Edm.Int64" => "BIGINT",
        "Edm.Single" => "REAL",
        "Edm.Double" => "FLOAT",
        "Edm.Decimal" => "DECIMAL(38,10)",
        "Edm.Guid" => "UNIQUEIDENTIFIER",
        "Edm.Date" => "DATE",
        "Edm.DateTime" => "DATETIME2",
        "Edm.DateTimeOffset" => "DATETIMEOFFSET",
        "Edm.Duration" | "Edm.Time" | "Edm.TimeOfDay" => "TIME",
        "Edm.Binary" => "VARBINARY(MAX)",
        "Edm.Geography" => "GEOGRAPHY",
        "Edm.Geometry" => "GEOMETRY",
        _ => return None,
    };
    Some(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_suffixes() {
        assert_eq!(
            render_type(&Column::new("Name", "nvarchar").length(50)).unwrap(),
            "NVARCHAR(50)"
        );
        assert_eq!(
            render_type(&Column::new("Body", "varbinary")).unwrap(),
            "VARBINARY(max)"
        );
        assert_eq!(render_type(&Column::new("Code", "char")).unwrap(), "CHAR(1)");
        assert!(render_type(&Column::new("Code", "nchar").max_length()).is_err());
    }

    #[test]
    fn test_numeric_and_temporal_suffixes() {
        assert_eq!(
            render_type(&Column::new("Price", "decimal").precision(10).scale(2)).unwrap(),
            "DECIMAL(10,2)"
        );
        assert_eq!(render_type(&Column::new("Qty", "numeric")).unwrap(), "NUMERIC(18,0)");
        assert_eq!(
            render_type(&Column::new("At", "datetime2").precision(3)).unwrap(),
            "DATETIME2(3)"
        );
        assert_eq!(render_type(&Column::new("At", "datetime2")).unwrap(), "DATETIME2");
        assert_eq!(render_type(&Column::new("Id", "int")).unwrap(), "INT");
    }

    #[test]
    fn test_edm_mapping() {
        assert_eq!(edm_sql_type("Edm.Int32"), Some("INT"));
        assert_eq!(edm_sql_type("Edm.String"), Some("NVARCHAR(MAX)"));
        assert_eq!(edm_sql_type("Edm.Stream"), None);
    }
}
