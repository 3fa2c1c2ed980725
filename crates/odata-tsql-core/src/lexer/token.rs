//! Token types for the filter tokenizer.

use super::Span;
use crate::ast::{Literal, QuantifierKind};

/// Reserved words of the filter grammar.
///
/// Keywords are lowercase, following URI query conventions; `Price` and
/// `price` are property names, `add` is the arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Comparison and membership
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Has,
    In,

    // Conjunctions
    And,
    Or,
    Not,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    DivBy,
    Mod,

    // Aggregation
    With,
}

impl Keyword {
    /// Looks up a keyword.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "gt" => Some(Self::Gt),
            "ge" => Some(Self::Ge),
            "lt" => Some(Self::Lt),
            "le" => Some(Self::Le),
            "has" => Some(Self::Has),
            "in" => Some(Self::In),
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "not" => Some(Self::Not),
            "add" => Some(Self::Add),
            "sub" => Some(Self::Sub),
            "mul" => Some(Self::Mul),
            "div" => Some(Self::Div),
            "divby" => Some(Self::DivBy),
            "mod" => Some(Self::Mod),
            "with" => Some(Self::With),
            _ => None,
        }
    }

    /// Returns the keyword text.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Has => "has",
            Self::In => "in",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::DivBy => "divby",
            Self::Mod => "mod",
            Self::With => "with",
        }
    }

    /// Comparison or membership operator.
    #[must_use]
    pub const fn is_operator(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Gt | Self::Ge | Self::Lt | Self::Le | Self::Has | Self::In
        )
    }

    /// `and` / `or`.
    #[must_use]
    pub const fn is_conjunction(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Arithmetic operator.
    #[must_use]
    pub const fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::DivBy | Self::Mod
        )
    }

    /// Operators after which a bare property name denotes a collection.
    #[must_use]
    pub const fn introduces_list(&self) -> bool {
        matches!(self, Self::In | Self::Has)
    }
}

/// Functions the tokenizer recognizes in front of an opening parenthesis.
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    "contains",
    "startswith",
    "endswith",
    "length",
    "indexof",
    "substring",
    "tolower",
    "toupper",
    "lower",
    "upper",
    "trim",
    "concat",
    "year",
    "month",
    "day",
    "hour",
    "minute",
    "second",
    "fractionalseconds",
    "date",
    "time",
    "totaloffsetminutes",
    "now",
    "mindatetime",
    "maxdatetime",
    "round",
    "floor",
    "ceiling",
    "cast",
    "isof",
    "geo.distance",
    "geo.length",
    "geo.intersects",
];

/// Built-in functions that yield a boolean.
pub const BOOLEAN_FUNCTIONS: &[&str] = &["contains", "startswith", "endswith", "isof", "geo.intersects"];

/// Returns true if `name` is a built-in function.
#[must_use]
pub fn is_builtin_function(name: &str) -> bool {
    BUILTIN_FUNCTIONS.contains(&name)
}

/// Returns true if `name` is a built-in function yielding a boolean.
#[must_use]
pub fn is_boolean_function(name: &str) -> bool {
    BOOLEAN_FUNCTIONS.contains(&name)
}

/// A piece of the input kept as raw text for recursive compilation,
/// together with its byte offset in the original input.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// The raw text.
    pub text: String,
    /// Byte offset of `text` in the input.
    pub offset: usize,
}

/// Token classification.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A reserved word.
    Keyword(Keyword),
    /// `(` opening a group.
    LeftParen,
    /// `)` closing a group.
    RightParen,
    /// A scalar literal.
    Literal(Literal),
    /// An enum literal, `'Type'Value'` or `Type'Value'`.
    Enum {
        /// Enum type name.
        type_name: String,
        /// Member name(s) or numeric value.
        value: String,
    },
    /// `@name` input placeholder.
    Parameter(String),
    /// A property path.
    Property {
        /// The path, `/`-separated.
        path: String,
        /// Whether the property denotes a collection (follows `in`/`has`).
        array: bool,
    },
    /// A recognized function call with its argument text.
    Function {
        /// Function name.
        name: String,
        /// Raw argument text, split at top-level commas.
        args: Vec<Fragment>,
        /// Whether the call was preceded by `not`.
        negate: bool,
    },
    /// `Nav/any(...)` or `Nav/all(...)`.
    Quantifier {
        /// Navigation path of the collection.
        navigation: String,
        /// Any or all.
        kind: QuantifierKind,
        /// Lambda variable, when written as `x: ...`.
        variable: Option<String>,
        /// Predicate text, absent for `Nav/any()`.
        body: Option<Fragment>,
    },
    /// Parenthesized literal list following `in`.
    List(Vec<Fragment>),
}

/// A token with its source text and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The classification.
    pub kind: TokenKind,
    /// The source text the token was built from.
    pub text: String,
    /// Location in the input.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    /// Returns the keyword, if this token is one.
    #[must_use]
    pub const fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(k) => Some(k),
            _ => None,
        }
    }

    /// Comparison or membership operator.
    #[must_use]
    pub fn is_operator(&self) -> bool {
        self.keyword().is_some_and(|k| k.is_operator())
    }

    /// `and` / `or`.
    #[must_use]
    pub fn is_conjunction(&self) -> bool {
        self.keyword().is_some_and(|k| k.is_conjunction())
    }

    /// Arithmetic operator.
    #[must_use]
    pub fn is_arithmetic(&self) -> bool {
        self.keyword().is_some_and(|k| k.is_arithmetic())
    }

    /// Function call.
    #[must_use]
    pub const fn is_function(&self) -> bool {
        matches!(self.kind, TokenKind::Function { .. })
    }

    /// `any` / `all` quantifier.
    #[must_use]
    pub const fn is_quantifier(&self) -> bool {
        matches!(self.kind, TokenKind::Quantifier { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_round_trip() {
        for word in ["eq", "ne", "has", "in", "and", "divby", "mod", "with"] {
            let kw = Keyword::from_str(word).unwrap();
            assert_eq!(kw.as_str(), word);
        }
    }

    #[test]
    fn test_keywords_are_lowercase_only() {
        assert_eq!(Keyword::from_str("EQ"), None);
        assert_eq!(Keyword::from_str("Add"), None);
    }

    #[test]
    fn test_keyword_classes() {
        assert!(Keyword::Le.is_operator());
        assert!(!Keyword::Le.is_arithmetic());
        assert!(Keyword::DivBy.is_arithmetic());
        assert!(Keyword::Or.is_conjunction());
        assert!(Keyword::In.introduces_list());
        assert!(!Keyword::Eq.introduces_list());
    }

    #[test]
    fn test_token_flags() {
        let token = Token::new(TokenKind::Keyword(Keyword::Mul), "mul", Span::new(0, 3));
        assert!(token.is_arithmetic());
        assert!(!token.is_operator());
        assert!(!token.is_function());
    }

    #[test]
    fn test_builtin_functions() {
        assert!(is_builtin_function("contains"));
        assert!(is_builtin_function("geo.distance"));
        assert!(!is_builtin_function("soundex"));
    }
}
