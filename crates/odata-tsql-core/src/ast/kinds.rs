//! Operator and aggregate kinds.

use serde::{Deserialize, Serialize};

use crate::lexer::Keyword;

/// Conjunction kind of a [`Condition`](super::Condition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    /// All items hold.
    And,
    /// Some item holds.
    Or,
}

impl ConditionKind {
    /// Filter-grammar keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }

    /// SQL keyword.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Parses the filter-grammar keyword.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }
}

/// Comparison or membership operator of a [`Predicate`](super::Predicate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredicateKind {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Has,
    In,
}

impl PredicateKind {
    /// Filter-grammar keyword.
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
        }
    }

    /// Parses the filter-grammar keyword.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        Keyword::from_str(s).and_then(Self::from_keyword)
    }

    /// Maps a tokenizer keyword.
    #[must_use]
    pub const fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::Eq => Some(Self::Eq),
            Keyword::Ne => Some(Self::Ne),
            Keyword::Gt => Some(Self::Gt),
            Keyword::Ge => Some(Self::Ge),
            Keyword::Lt => Some(Self::Lt),
            Keyword::Le => Some(Self::Le),
            Keyword::Has => Some(Self::Has),
            Keyword::In => Some(Self::In),
            _ => None,
        }
    }
}

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Division that always yields a fractional result.
    DivBy,
    Mod,
}

impl ArithmeticOp {
    /// Filter-grammar keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::DivBy => "divby",
            Self::Mod => "mod",
        }
    }

    /// SQL operator symbol.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div | Self::DivBy => "/",
            Self::Mod => "%",
        }
    }

    /// Parses the filter-grammar keyword.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        Keyword::from_str(s).and_then(Self::from_keyword)
    }

    /// Maps a tokenizer keyword.
    #[must_use]
    pub const fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::Add => Some(Self::Add),
            Keyword::Sub => Some(Self::Sub),
            Keyword::Mul => Some(Self::Mul),
            Keyword::Div => Some(Self::Div),
            Keyword::DivBy => Some(Self::DivBy),
            Keyword::Mod => Some(Self::Mod),
            _ => None,
        }
    }
}

/// Aggregate applied by `with`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateKind {
    Sum,
    Min,
    Max,
    Average,
    Count,
    CountDistinct,
    /// Merges values into one delimited string.
    Merge,
    /// Value passed through ungrouped.
    None,
}

impl AggregateKind {
    /// Filter-grammar name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Average => "average",
            Self::Count => "count",
            Self::CountDistinct => "countdistinct",
            Self::Merge => "merge",
            Self::None => "none",
        }
    }

    /// Parses a name, ignoring case.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Some(Self::Sum),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "average" | "avg" => Some(Self::Average),
            "count" => Some(Self::Count),
            "countdistinct" => Some(Self::CountDistinct),
            "merge" => Some(Self::Merge),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

/// Quantifier over a related collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantifierKind {
    /// Some element satisfies the predicate.
    Any,
    /// Every element satisfies the predicate.
    All,
}

impl QuantifierKind {
    /// Filter-grammar name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::All => "all",
        }
    }

    /// Parses the filter-grammar name.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "any" => Some(Self::Any),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Value of the quantifier over an empty collection.
    #[must_use]
    pub const fn default_truth(&self) -> bool {
        matches!(self, Self::All)
    }
}
