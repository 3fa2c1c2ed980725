//! Rendering back to the filter grammar.

use std::fmt;

use super::expression::{Condition, Expression, Predicate, Quantifier};
use super::kinds::ConditionKind;
use super::operand::{Arithmetic, Operand, PropertyName, ELEMENT};
use crate::parser::precedence::binding_power;

impl Expression {
    /// Renders the tree in the filter grammar it was parsed from.
    #[must_use]
    pub fn serialize(&self) -> String {
        self.to_string()
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, parent: Option<ConditionKind>) -> fmt::Result {
        match self {
            Self::Condition(c) => fmt_condition(c, f, parent.is_some()),
            Self::Predicate(p) => fmt::Display::fmt(p, f),
            Self::Quantifier(q) => fmt::Display::fmt(q, f),
        }
    }
}

fn fmt_condition(condition: &Condition, f: &mut fmt::Formatter<'_>, nested: bool) -> fmt::Result {
    if nested {
        f.write_str("(")?;
    }
    for (i, item) in condition.items.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", condition.kind.as_str())?;
        }
        item.fmt_nested(f, Some(condition.kind))?;
    }
    if nested {
        f.write_str(")")?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, None)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.implicit {
            return write!(f, "{}", self.subject);
        }
        write!(f, "{} {} {}", self.subject, self.kind.as_str(), self.predicate)
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}(", self.name, self.kind.as_str())?;
        if let Some(item) = &self.item {
            if let Some(variable) = &self.variable {
                write!(f, "{variable}: ")?;
            }
            write!(f, "{item}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.prefix, self.value.as_str()) {
            (Some(prefix), ELEMENT) => f.write_str(prefix),
            (Some(prefix), value) => write!(f, "{prefix}/{value}"),
            (None, value) => f.write_str(value),
        }
    }
}

fn fmt_arithmetic_child(
    child: &Operand,
    parent: &Arithmetic,
    right: bool,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    if let Operand::Arithmetic(inner) = child {
        let (inner_bp, outer_bp) = (binding_power(inner.op), binding_power(parent.op));
        if inner_bp < outer_bp || (right && inner_bp == outer_bp) {
            return write!(f, "({child})");
        }
    }
    write!(f, "{child}")
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(p) => write!(f, "{p}"),
            Self::Parameter(p) => write!(f, "@{}", p.value),
            Self::Literal(l) => write!(f, "{l}"),
            Self::Enum(e) => write!(f, "{}'{}'", e.type_name, e.value),
            Self::List(list) => {
                f.write_str("(")?;
                for (i, item) in list.items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            Self::Function(func) => {
                if func.negate {
                    f.write_str("not ")?;
                }
                write!(f, "{}(", func.name)?;
                for (i, arg) in func.arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Self::Arithmetic(a) => {
                fmt_arithmetic_child(&a.subject, a, false, f)?;
                write!(f, " {} ", a.op.as_str())?;
                fmt_arithmetic_child(&a.predicate, a, true, f)
            }
            Self::With(w) => write!(f, "{} with {}", w.predicate, w.aggregate.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ArithmeticOp, Literal, PredicateKind};

    #[test]
    fn test_arithmetic_parenthesizes_only_when_needed() {
        let sum = Operand::Arithmetic(Box::new(Arithmetic::new(
            ArithmeticOp::Add,
            Operand::property("A"),
            Operand::property("B"),
        )));
        let product = Operand::Arithmetic(Box::new(Arithmetic::new(
            ArithmeticOp::Mul,
            sum.clone(),
            Operand::property("C"),
        )));
        assert_eq!(product.to_string(), "(A add B) mul C");

        let difference = Operand::Arithmetic(Box::new(Arithmetic::new(
            ArithmeticOp::Sub,
            Operand::property("X"),
            sum,
        )));
        assert_eq!(difference.to_string(), "X sub (A add B)");
    }

    #[test]
    fn test_nested_condition_is_parenthesized() {
        let p = |name: &str, v: i32| -> Expression {
            Predicate::new(
                PredicateKind::Eq,
                Operand::property(name),
                Operand::literal(Literal::Int(v)),
            )
            .into()
        };
        let inner = Expression::Condition(Condition::new(ConditionKind::Or, vec![p("A", 1), p("B", 2)]));
        let outer = Expression::Condition(Condition::new(ConditionKind::And, vec![p("C", 3), inner]));
        assert_eq!(outer.serialize(), "C eq 3 and (A eq 1 or B eq 2)");
    }

    #[test]
    fn test_element_reference_prints_variable() {
        let p = PropertyName::new(ELEMENT).with_prefix("t");
        assert_eq!(p.to_string(), "t");
        assert_eq!(PropertyName::new("Total").with_prefix("o").to_string(), "o/Total");
    }
}
