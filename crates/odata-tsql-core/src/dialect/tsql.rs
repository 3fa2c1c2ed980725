//! Microsoft SQL Server dialect.

use super::Dialect;

/// T-SQL: bracket-quoted identifiers and `N'...'` Unicode strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TSql;

impl Dialect for TSql {
    fn name(&self) -> &'static str {
        "tsql"
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('[', ']')
    }

    fn string_prefix(&self) -> &'static str {
        "N"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tsql_quoting() {
        assert_eq!(TSql.name(), "tsql");
        assert_eq!(TSql.quote_identifier("Name"), "[Name]");
        assert_eq!(TSql.quote_identifier("odd]name"), "[odd]]name]");
        assert_eq!(TSql.quote_path(["dbo", "Orders"]), "[dbo].[Orders]");
        assert_eq!(TSql.quote_string("it's"), "N'it''s'");
    }
}
