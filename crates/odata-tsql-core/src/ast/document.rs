//! Typed construction from the structured document.

use super::expression::{Condition, Expression, PredicateBuilder, Quantifier};
use super::kinds::{AggregateKind, ArithmeticOp, ConditionKind, PredicateKind, QuantifierKind};
use super::literal::Literal;
use super::operand::{
    ArithmeticBuilder, EnumValue, Function, List, Operand, Parameter, PropertyName, With,
};
use crate::error::{CompileError, Result};
use crate::parser::{DocNode, Tag};

fn invalid(node: &DocNode, what: &str) -> CompileError {
    CompileError::InvalidExpression(format!("{} node {what}", node.tag.as_str()))
}

fn required<'a>(node: &'a DocNode, name: &str) -> Result<&'a str> {
    node.get(name)
        .ok_or_else(|| invalid(node, &format!("has no '{name}' attribute")))
}

impl Expression {
    /// Builds an expression from a document node (the root or any boolean node).
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidExpression`] when the document does not
    /// describe a well-formed tree.
    pub fn from_document(node: &DocNode) -> Result<Self> {
        match node.tag {
            Tag::Root => match node.children.as_slice() {
                [child] => Self::from_document(child),
                _ => Err(invalid(node, "must hold exactly one expression")),
            },
            Tag::Condition => {
                let kind = ConditionKind::from_str(required(node, "kind")?)
                    .ok_or_else(|| invalid(node, "has an unknown kind"))?;
                if node.children.is_empty() {
                    return Err(invalid(node, "has no items"));
                }
                let items = node
                    .children
                    .iter()
                    .map(Self::from_document)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::Condition(Condition::new(kind, items)))
            }
            Tag::Predicate => {
                let kind = PredicateKind::from_str(required(node, "kind")?)
                    .ok_or_else(|| invalid(node, "has an unknown kind"))?;
                let mut builder = PredicateBuilder::new(kind);
                if node.flag("implicit") {
                    builder = builder.implicit();
                }
                for child in &node.children {
                    builder = builder.operand(Operand::from_document(child)?)?;
                }
                Ok(Self::Predicate(builder.build()?))
            }
            Tag::Quantifier => {
                let kind = QuantifierKind::from_str(required(node, "kind")?)
                    .ok_or_else(|| invalid(node, "has an unknown kind"))?;
                let item = match node.children.as_slice() {
                    [] => None,
                    [child] => Some(Self::from_document(child)?),
                    _ => return Err(invalid(node, "holds more than one predicate")),
                };
                let mut quantifier = Quantifier::new(kind, required(node, "name")?, item);
                quantifier.variable = node.get("variable").map(String::from);
                Ok(Self::Quantifier(quantifier))
            }
            _ => Err(invalid(node, "is not a boolean expression")),
        }
    }
}

impl Operand {
    /// Builds an operand from a document node.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidExpression`] when the node is not a
    /// well-formed operand.
    pub fn from_document(node: &DocNode) -> Result<Self> {
        match node.tag {
            Tag::Property => Ok(Self::Property(PropertyName {
                value: String::from(required(node, "value")?),
                prefix: node.get("prefix").map(String::from),
                alias: node.get("alias").map(String::from),
                element_type: node.get("type").map(String::from),
                is_array: node.flag("array"),
            })),
            Tag::Parameter => Ok(Self::Parameter(Parameter {
                value: String::from(required(node, "value")?),
            })),
            Tag::Literal => Literal::from_raw(required(node, "type")?, required(node, "value")?)
                .map(Self::Literal)
                .map_err(CompileError::InvalidExpression),
            Tag::Enum => Ok(Self::Enum(EnumValue {
                type_name: String::from(required(node, "type")?),
                value: String::from(required(node, "value")?),
            })),
            Tag::List => {
                let items = node
                    .children
                    .iter()
                    .map(Self::from_document)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::List(List { items }))
            }
            Tag::Function => {
                let arguments = node
                    .children
                    .iter()
                    .map(Self::from_document)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::Function(Function {
                    name: String::from(required(node, "name")?),
                    arguments,
                    negate: node.flag("negate"),
                }))
            }
            Tag::Arithmetic => {
                let op = ArithmeticOp::from_str(required(node, "op")?)
                    .ok_or_else(|| invalid(node, "has an unknown operator"))?;
                let mut builder = ArithmeticBuilder::new(op);
                for child in &node.children {
                    builder = builder.operand(Self::from_document(child)?)?;
                }
                Ok(Self::Arithmetic(Box::new(builder.build()?)))
            }
            Tag::With => {
                let aggregate = AggregateKind::from_str(required(node, "aggregate")?)
                    .ok_or_else(|| invalid(node, "has an unknown aggregate"))?;
                let [child] = node.children.as_slice() else {
                    return Err(invalid(node, "must hold exactly one operand"));
                };
                Ok(Self::With(Box::new(With {
                    predicate: Self::from_document(child)?,
                    aggregate,
                })))
            }
            _ => Err(invalid(node, "is not an operand")),
        }
    }
}
