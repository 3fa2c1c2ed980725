//! Boolean expression nodes.

use super::kinds::{ConditionKind, PredicateKind, QuantifierKind};
use super::operand::Operand;
use super::slots::Slots;
use crate::error::Result;

/// Root of a filter: any boolean-valued node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Condition(Condition),
    Predicate(Predicate),
    Quantifier(Quantifier),
}

/// `and` / `or` over ordered items.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub kind: ConditionKind,
    pub items: Vec<Expression>,
}

impl Condition {
    /// Creates a condition.
    #[must_use]
    pub const fn new(kind: ConditionKind, items: Vec<Expression>) -> Self {
        Self { kind, items }
    }
}

/// A comparison or membership test.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub kind: PredicateKind,
    pub subject: Operand,
    pub predicate: Operand,
    /// Written as a bare boolean function, `contains(Name,'x')`, and
    /// rewritten to `... eq true`.
    pub implicit: bool,
}

impl Predicate {
    /// Creates a predicate with both operands.
    #[must_use]
    pub const fn new(kind: PredicateKind, subject: Operand, predicate: Operand) -> Self {
        Self {
            kind,
            subject,
            predicate,
            implicit: false,
        }
    }
}

/// `Navigation/any(...)` or `Navigation/all(...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantifier {
    pub kind: QuantifierKind,
    /// Navigation path of the collection.
    pub name: String,
    /// Lambda variable, if the filter named one.
    pub variable: Option<String>,
    /// Result over an empty collection.
    pub default_truth: bool,
    /// Predicate over each element; `None` tests non-emptiness.
    pub item: Option<Box<Expression>>,
}

impl Quantifier {
    /// Creates a quantifier with the kind's default truth.
    #[must_use]
    pub fn new(kind: QuantifierKind, name: impl Into<String>, item: Option<Expression>) -> Self {
        Self {
            kind,
            name: name.into(),
            variable: None,
            default_truth: kind.default_truth(),
            item: item.map(Box::new),
        }
    }
}

impl Expression {
    /// Returns an independent copy of the tree.
    ///
    /// Every node owns its children, so the copy shares nothing with `self`;
    /// take one before rewriting a tree that is still referenced elsewhere.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// Joins expressions with `and`, flattening nested `and` conditions.
    #[must_use]
    pub fn and(items: impl IntoIterator<Item = Expression>) -> Option<Self> {
        Self::join(ConditionKind::And, items)
    }

    /// Joins expressions with `or`, flattening nested `or` conditions.
    #[must_use]
    pub fn or(items: impl IntoIterator<Item = Expression>) -> Option<Self> {
        Self::join(ConditionKind::Or, items)
    }

    fn join(kind: ConditionKind, items: impl IntoIterator<Item = Expression>) -> Option<Self> {
        let mut flat = Vec::new();
        for item in items {
            match item {
                Self::Condition(c) if c.kind == kind => flat.extend(c.items),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Self::Condition(Condition::new(kind, flat))),
        }
    }
}

impl From<Predicate> for Expression {
    fn from(value: Predicate) -> Self {
        Self::Predicate(value)
    }
}

impl From<Condition> for Expression {
    fn from(value: Condition) -> Self {
        Self::Condition(value)
    }
}

impl From<Quantifier> for Expression {
    fn from(value: Quantifier) -> Self {
        Self::Quantifier(value)
    }
}

/// Builds a [`Predicate`], filling subject then predicate.
#[derive(Debug, Clone)]
pub struct PredicateBuilder {
    kind: PredicateKind,
    slots: Slots,
    implicit: bool,
}

impl PredicateBuilder {
    /// Starts a predicate of `kind`.
    #[must_use]
    pub const fn new(kind: PredicateKind) -> Self {
        Self {
            kind,
            slots: Slots::new(),
            implicit: false,
        }
    }

    /// Marks the predicate as boolean-function shorthand.
    #[must_use]
    pub const fn implicit(mut self) -> Self {
        self.implicit = true;
        self
    }

    /// Assigns the next empty operand slot.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidExpression`](crate::CompileError::InvalidExpression)
    /// when both slots are already filled.
    pub fn operand(mut self, operand: Operand) -> Result<Self> {
        self.slots.fill(operand, self.kind.as_str())?;
        Ok(self)
    }

    /// Yields the predicate.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidExpression`](crate::CompileError::InvalidExpression)
    /// when an operand is missing.
    pub fn build(self) -> Result<Predicate> {
        let (subject, predicate) = self.slots.finish(self.kind.as_str())?;
        Ok(Predicate {
            kind: self.kind,
            subject,
            predicate,
            implicit: self.implicit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ArithmeticBuilder, ArithmeticOp, Literal};
    use crate::CompileError;

    #[test]
    fn test_builder_fills_slots_in_order() {
        let predicate = PredicateBuilder::new(PredicateKind::Gt)
            .operand(Operand::property("Age"))
            .unwrap()
            .operand(Operand::literal(Literal::Int(21)))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(predicate.subject, Operand::property("Age"));
        assert_eq!(predicate.predicate, Operand::literal(Literal::Int(21)));
    }

    #[test]
    fn test_one_slot_predicate_is_rejected() {
        let err = PredicateBuilder::new(PredicateKind::Eq)
            .operand(Operand::property("Age"))
            .unwrap()
            .build()
            .unwrap_err();
        assert!(matches!(err, CompileError::InvalidExpression(_)));
    }

    #[test]
    fn test_third_operand_is_rejected() {
        let builder = ArithmeticBuilder::new(ArithmeticOp::Add)
            .operand(Operand::property("A"))
            .unwrap()
            .operand(Operand::property("B"))
            .unwrap();
        assert!(builder.operand(Operand::property("C")).is_err());
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let original: Expression = Predicate::new(
            PredicateKind::Eq,
            Operand::property("Name"),
            Operand::literal(Literal::String(String::from("x"))),
        )
        .into();
        let mut copy = original.deep_copy();
        copy.set_prefixes("o");
        assert_ne!(copy, original);
        let Expression::Predicate(p) = &original else {
            panic!("expected predicate");
        };
        assert_eq!(p.subject.as_property().unwrap().prefix, None);
    }

    #[test]
    fn test_join_flattens_same_kind() {
        let p = |name: &str| -> Expression {
            Predicate::new(
                PredicateKind::Eq,
                Operand::property(name),
                Operand::literal(Literal::Int(1)),
            )
            .into()
        };
        let inner = Expression::and([p("A"), p("B")]).unwrap();
        let outer = Expression::and([inner, p("C")]).unwrap();
        let Expression::Condition(c) = outer else {
            panic!("expected condition");
        };
        assert_eq!(c.items.len(), 3);
        assert!(Expression::or([]).is_none());
    }
}
