//! Expression model.
//!
//! A closed set of node kinds built from the structured document emitted by
//! the precedence compiler. Every consumer matches the node kinds
//! exhaustively.

mod display;
mod document;
mod expression;
mod kinds;
mod literal;
mod operand;
mod rewrite;
mod slots;

pub use expression::{Condition, Expression, Predicate, PredicateBuilder, Quantifier};
pub use kinds::{AggregateKind, ArithmeticOp, ConditionKind, PredicateKind, QuantifierKind};
pub use literal::Literal;
pub use operand::{
    Arithmetic, ArithmeticBuilder, EnumValue, Function, List, Operand, Parameter, PropertyName,
    With, ELEMENT,
};
