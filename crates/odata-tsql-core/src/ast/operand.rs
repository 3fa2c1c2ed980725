//! Value-producing nodes.

use super::kinds::{AggregateKind, ArithmeticOp};
use super::literal::Literal;
use super::slots::Slots;
use crate::error::Result;

/// Name a lambda-variable reference resolves to when it names the element
/// itself rather than one of its properties.
pub const ELEMENT: &str = "$it";

/// A reference to a property (column).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyName {
    /// Property path, `/`-separated.
    pub value: String,
    /// Navigation prefix (lambda variable or expand path) scoping the property.
    pub prefix: Option<String>,
    /// Table alias qualifying the column in SQL.
    pub alias: Option<String>,
    /// Declared element type, filled by enum fix-up or schema lookup.
    pub element_type: Option<String>,
    /// Whether the property denotes a collection.
    pub is_array: bool,
}

impl PropertyName {
    /// Creates an unqualified property reference.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// Sets the SQL alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets the navigation prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Returns true when the reference names a lambda element itself.
    #[must_use]
    pub fn is_element(&self) -> bool {
        self.value == ELEMENT
    }

    /// Table qualifier used in SQL: the alias, else the prefix.
    #[must_use]
    pub fn qualifier(&self) -> Option<&str> {
        self.alias.as_deref().or(self.prefix.as_deref())
    }
}

/// A named input placeholder, `@name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Name without the `@`.
    pub value: String,
}

/// An enum literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// Enum type name.
    pub type_name: String,
    /// Member name, comma-separated member names, or a number.
    pub value: String,
}

/// A literal list, the right side of `in`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct List {
    pub items: Vec<Operand>,
}

/// A function call.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Function name as written.
    pub name: String,
    /// Arguments in order.
    pub arguments: Vec<Operand>,
    /// Set by a leading `not`.
    pub negate: bool,
}

impl Function {
    /// Creates a call.
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: Vec<Operand>) -> Self {
        Self {
            name: name.into(),
            arguments,
            negate: false,
        }
    }
}

/// Binary arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub struct Arithmetic {
    pub op: ArithmeticOp,
    pub subject: Operand,
    pub predicate: Operand,
}

impl Arithmetic {
    /// Creates a node with both operands.
    #[must_use]
    pub const fn new(op: ArithmeticOp, subject: Operand, predicate: Operand) -> Self {
        Self {
            op,
            subject,
            predicate,
        }
    }
}

/// Aggregate application, `<operand> with <aggregate>`.
#[derive(Debug, Clone, PartialEq)]
pub struct With {
    pub predicate: Operand,
    pub aggregate: AggregateKind,
}

/// Any value-producing node.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Property(PropertyName),
    Parameter(Parameter),
    Literal(Literal),
    Enum(EnumValue),
    List(List),
    Function(Function),
    Arithmetic(Box<Arithmetic>),
    With(Box<With>),
}

impl Operand {
    /// Shorthand for a property reference.
    #[must_use]
    pub fn property(value: impl Into<String>) -> Self {
        Self::Property(PropertyName::new(value))
    }

    /// Shorthand for a literal.
    #[must_use]
    pub fn literal(value: Literal) -> Self {
        Self::Literal(value)
    }

    /// Shorthand for a parameter reference.
    #[must_use]
    pub fn parameter(name: impl Into<String>) -> Self {
        Self::Parameter(Parameter { value: name.into() })
    }

    /// Returns true for the `null` literal.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Literal(Literal::Null))
    }

    /// Returns the property reference, if this is one.
    #[must_use]
    pub const fn as_property(&self) -> Option<&PropertyName> {
        match self {
            Self::Property(p) => Some(p),
            _ => None,
        }
    }
}

/// Builds an [`Arithmetic`] node, filling subject then predicate.
#[derive(Debug, Clone)]
pub struct ArithmeticBuilder {
    op: ArithmeticOp,
    slots: Slots,
}

impl ArithmeticBuilder {
    /// Starts a node for `op`.
    #[must_use]
    pub const fn new(op: ArithmeticOp) -> Self {
        Self {
            op,
            slots: Slots::new(),
        }
    }

    /// Assigns the next empty operand slot.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidExpression`](crate::CompileError::InvalidExpression)
    /// when both slots are already filled.
    pub fn operand(mut self, operand: Operand) -> Result<Self> {
        self.slots.fill(operand, self.op.as_str())?;
        Ok(self)
    }

    /// Yields the node.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidExpression`](crate::CompileError::InvalidExpression)
    /// when an operand is missing.
    pub fn build(self) -> Result<Arithmetic> {
        let (subject, predicate) = self.slots.finish(self.op.as_str())?;
        Ok(Arithmetic::new(self.op, subject, predicate))
    }
}
