//! SQL dialect support.
//!
//! Generated statements target T-SQL; the trait keeps identifier and string
//! quoting in one place so every serializer escapes the same way.

mod tsql;

pub use tsql::TSql;

/// Trait for SQL dialect-specific behavior.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the opening and closing identifier quote characters.
    fn identifier_quotes(&self) -> (char, char) {
        ('"', '"')
    }

    /// Returns the prefix placed before a string literal (`N` for Unicode).
    fn string_prefix(&self) -> &'static str {
        ""
    }

    /// Quotes an identifier, doubling any embedded closing quote.
    fn quote_identifier(&self, name: &str) -> String {
        let (open, close) = self.identifier_quotes();
        let escaped = name.replace(close, &format!("{close}{close}"));
        format!("{open}{escaped}{close}")
    }

    /// Quotes every part and joins them with `.`.
    fn quote_path<'a, I>(&self, parts: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
        Self: Sized,
    {
        parts
            .into_iter()
            .map(|part| self.quote_identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quotes a string literal.
    fn quote_string(&self, value: &str) -> String {
        format!("{}'{}'", self.string_prefix(), value.replace('\'', "''"))
    }
}
