//! Scalar function dispatch: built-in templates with a user-defined fallback.

use std::collections::HashMap;

use crate::error::{CompileError, Result};

/// Renders a user-defined function call from its already-rendered arguments.
pub trait UserFunction: Send + Sync {
    /// Renders `name(arguments)` as SQL.
    ///
    /// # Errors
    ///
    /// Returns an error when the arguments do not fit the function.
    fn render(&self, name: &str, arguments: &[String]) -> Result<String>;
}

/// Name-keyed lookup of user-defined functions.
pub trait FunctionRegistry: Send + Sync {
    /// Returns the renderer registered under `name`.
    fn lookup(&self, name: &str) -> Option<&dyn UserFunction>;

    /// Names the parser must accept in front of `(`.
    fn names(&self) -> Vec<String>;
}

/// A SQL template with positional `{0}`, `{1}`, ... placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionTemplate {
    template: String,
    arity: usize,
}

impl FunctionTemplate {
    /// Creates a template; its arity is one past the highest placeholder.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let arity = placeholders(&template).max().map_or(0, |n| n + 1);
        Self { template, arity }
    }

    /// Number of arguments the template expects.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.arity
    }
}

impl UserFunction for FunctionTemplate {
    fn render(&self, name: &str, arguments: &[String]) -> Result<String> {
        if arguments.len() != self.arity {
            return Err(CompileError::InvalidExpression(format!(
                "'{name}' takes {} argument(s), got {}",
                self.arity,
                arguments.len()
            )));
        }
        Ok(fill(&self.template, arguments))
    }
}

/// A ready-made [`FunctionRegistry`] backed by a map.
#[derive(Default)]
pub struct UserFunctionRegistry {
    functions: HashMap<String, Box<dyn UserFunction>>,
}

impl UserFunctionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a renderer under `name`.
    #[must_use]
    pub fn register(mut self, name: impl Into<String>, function: impl UserFunction + 'static) -> Self {
        self.functions.insert(name.into(), Box::new(function));
        self
    }

    /// Registers a [`FunctionTemplate`] under `name`.
    #[must_use]
    pub fn with_template(self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.register(name, FunctionTemplate::new(template))
    }

    /// Number of registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl FunctionRegistry for UserFunctionRegistry {
    fn lookup(&self, name: &str) -> Option<&dyn UserFunction> {
        self.functions.get(name).map(AsRef::as_ref)
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for UserFunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserFunctionRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Returns the SQL template of a built-in scalar function for `arity` arguments.
///
/// `concat`, `cast` and the boolean functions are rendered by the serializer
/// itself and are not listed here.
#[must_use]
pub(crate) fn builtin_template(name: &str, arity: usize) -> Option<&'static str> {
    let template = match (name, arity) {
        ("tolower" | "lower", 1) => "LOWER({0})",
        ("toupper" | "upper", 1) => "UPPER({0})",
        ("trim", 1) => "LTRIM(RTRIM({0}))",
        ("length", 1) => "LEN({0})",
        ("indexof", 2) => "(CHARINDEX({1}, {0}) - 1)",
        ("substring", 2) => "SUBSTRING({0}, {1} + 1, LEN({0}))",
        ("substring", 3) => "SUBSTRING({0}, {1} + 1, {2})",
        ("year", 1) => "DATEPART(YEAR, {0})",
        ("month", 1) => "DATEPART(MONTH, {0})",
        ("day", 1) => "DATEPART(DAY, {0})",
        ("hour", 1) => "DATEPART(HOUR, {0})",
        ("minute", 1) => "DATEPART(MINUTE, {0})",
        ("second", 1) => "DATEPART(SECOND, {0})",
        ("fractionalseconds", 1) => "(DATEPART(NANOSECOND, {0}) / 1000000000.0)",
        ("date", 1) => "CAST({0} AS DATE)",
        ("time", 1) => "CAST({0} AS TIME)",
        ("totaloffsetminutes", 1) => "DATEPART(TZOFFSET, {0})",
        ("now", 0) => "SYSDATETIMEOFFSET()",
        ("mindatetime", 0) => "CAST('0001-01-01T00:00:00' AS DATETIME2)",
        ("maxdatetime", 0) => "CAST('9999-12-31T23:59:59.9999999' AS DATETIME2)",
        ("round", 1) => "ROUND({0}, 0)",
        ("floor", 1) => "FLOOR({0})",
        ("ceiling", 1) => "CEILING({0})",
        ("geo.distance", 2) => "{0}.STDistance({1})",
        ("geo.length", 1) => "{0}.STLength()",
        ("geo.intersects", 2) => "{0}.STIntersects({1})",
        _ => return None,
    };
    Some(template)
}

/// Substitutes `{n}` placeholders; anything else is copied verbatim.
pub(crate) fn fill(template: &str, arguments: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let index = after
            .find('}')
            .and_then(|close| after[..close].parse::<usize>().ok().map(|n| (n, close)));
        match index.and_then(|(n, close)| arguments.get(n).map(|arg| (arg, close))) {
            Some((arg, close)) => {
                out.push_str(arg);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn placeholders(template: &str) -> impl Iterator<Item = usize> + '_ {
    template.split('{').skip(1).filter_map(|piece| {
        let close = piece.find('}')?;
        piece[..close].parse::<usize>().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| String::from(*s)).collect()
    }

    #[test]
    fn test_fill_positional() {
        assert_eq!(
            fill("SUBSTRING({0}, {1} + 1, {2})", &args(&["[Name]", "@p0", "@p1"])),
            "SUBSTRING([Name], @p0 + 1, @p1)"
        );
        assert_eq!(fill("{x} {0}", &args(&["a"])), "{x} a");
    }

    #[test]
    fn test_substring_overloads() {
        assert!(builtin_template("substring", 2).is_some());
        assert!(builtin_template("substring", 3).is_some());
        assert!(builtin_template("substring", 1).is_none());
    }

    #[test]
    fn test_template_arity() {
        let template = FunctionTemplate::new("dbo.Distance({0}, {1})");
        assert_eq!(template.arity(), 2);
        assert_eq!(
            template.render("distance", &args(&["[A]", "[B]"])).unwrap(),
            "dbo.Distance([A], [B])"
        );
        let err = template.render("distance", &args(&["[A]"])).unwrap_err();
        assert!(err.to_string().contains("takes 2 argument(s), got 1"));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = UserFunctionRegistry::new()
            .with_template("soundex", "SOUNDEX({0})")
            .with_template("fiscalyear", "dbo.FiscalYear({0})");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["fiscalyear", "soundex"]);
        let rendered = registry
            .lookup("soundex")
            .unwrap()
            .render("soundex", &args(&["[Name]"]))
            .unwrap();
        assert_eq!(rendered, "SOUNDEX([Name])");
        assert!(registry.lookup("missing").is_none());
    }
}
