//! Tree rewrites: prefix scoping, parameter substitution, property discovery.

use std::collections::HashMap;

use super::expression::{Condition, Expression, Predicate};
use super::kinds::PredicateKind;
use super::literal::Literal;
use super::operand::{List, Operand, PropertyName};
use crate::error::{CompileError, Result};
use crate::lexer::split_top_level;

impl Operand {
    fn visit_properties<'a>(&'a self, out: &mut Vec<&'a PropertyName>) {
        match self {
            Self::Property(p) => out.push(p),
            Self::List(list) => list.items.iter().for_each(|i| i.visit_properties(out)),
            Self::Function(func) => func.arguments.iter().for_each(|a| a.visit_properties(out)),
            Self::Arithmetic(a) => {
                a.subject.visit_properties(out);
                a.predicate.visit_properties(out);
            }
            Self::With(w) => w.predicate.visit_properties(out),
            Self::Parameter(_) | Self::Literal(_) | Self::Enum(_) => {}
        }
    }

    fn visit_properties_mut(&mut self, f: &mut dyn FnMut(&mut PropertyName)) {
        match self {
            Self::Property(p) => f(p),
            Self::List(list) => list.items.iter_mut().for_each(|i| i.visit_properties_mut(f)),
            Self::Function(func) => func
                .arguments
                .iter_mut()
                .for_each(|a| a.visit_properties_mut(f)),
            Self::Arithmetic(a) => {
                a.subject.visit_properties_mut(f);
                a.predicate.visit_properties_mut(f);
            }
            Self::With(w) => w.predicate.visit_properties_mut(f),
            Self::Parameter(_) | Self::Literal(_) | Self::Enum(_) => {}
        }
    }

    /// Sets the navigation prefix of every property reference in the operand.
    pub fn set_prefixes(&mut self, prefix: &str) {
        self.visit_properties_mut(&mut |p| p.prefix = Some(String::from(prefix)));
    }

    /// Substitutes bound parameters with literals.
    ///
    /// A value holding several comma-separated items becomes a [`List`]
    /// whose items are typed independently.
    #[must_use]
    pub fn convert(self, parameters: &HashMap<String, String>) -> Self {
        match self {
            Self::Parameter(p) => match parameters.get(&p.value) {
                Some(value) => substitute(value),
                None => Self::Parameter(p),
            },
            Self::List(list) => {
                let mut items = Vec::with_capacity(list.items.len());
                for item in list.items {
                    match item.convert(parameters) {
                        Self::List(inner) => items.extend(inner.items),
                        other => items.push(other),
                    }
                }
                Self::List(List { items })
            }
            Self::Function(mut func) => {
                func.arguments = func
                    .arguments
                    .into_iter()
                    .map(|a| a.convert(parameters))
                    .collect();
                Self::Function(func)
            }
            Self::Arithmetic(mut a) => {
                a.subject = a.subject.convert(parameters);
                a.predicate = a.predicate.convert(parameters);
                Self::Arithmetic(a)
            }
            Self::With(mut w) => {
                w.predicate = w.predicate.convert(parameters);
                Self::With(w)
            }
            other => other,
        }
    }
}

fn substitute(value: &str) -> Operand {
    let mut items: Vec<Operand> = split_top_level(value, ',')
        .iter()
        .map(|piece| Operand::Literal(Literal::infer(&piece.text)))
        .collect();
    match items.len() {
        0 => Operand::Literal(Literal::String(String::new())),
        1 => items.remove(0),
        _ => Operand::List(List { items }),
    }
}

impl Expression {
    /// Sets the navigation prefix of every property reference, leaving
    /// quantifier bodies (scoped to their own collection) untouched.
    pub fn set_prefixes(&mut self, prefix: &str) {
        self.visit_properties_mut(&mut |p| p.prefix = Some(String::from(prefix)));
    }

    /// Sets the navigation prefix of every property reference that has none.
    pub fn default_prefixes(&mut self, prefix: &str) {
        self.visit_properties_mut(&mut |p| {
            if p.prefix.is_none() {
                p.prefix = Some(String::from(prefix));
            }
        });
    }

    fn visit_properties_mut(&mut self, f: &mut dyn FnMut(&mut PropertyName)) {
        match self {
            Self::Condition(c) => c.items.iter_mut().for_each(|i| i.visit_properties_mut(f)),
            Self::Predicate(p) => {
                p.subject.visit_properties_mut(f);
                p.predicate.visit_properties_mut(f);
            }
            Self::Quantifier(_) => {}
        }
    }

    /// Lists every property reference outside quantifier bodies, in
    /// encounter order.
    #[must_use]
    pub fn locate_property_names(&self) -> Vec<&PropertyName> {
        let mut out = Vec::new();
        self.collect_properties(&mut out);
        out
    }

    fn collect_properties<'a>(&'a self, out: &mut Vec<&'a PropertyName>) {
        match self {
            Self::Condition(c) => c.items.iter().for_each(|i| i.collect_properties(out)),
            Self::Predicate(p) => {
                p.subject.visit_properties(out);
                p.predicate.visit_properties(out);
            }
            Self::Quantifier(_) => {}
        }
    }

    /// Copies the enum type of an enum literal onto the property it is
    /// compared with, so the serializer can resolve the property's type.
    pub fn apply_enum_types(&mut self) {
        match self {
            Self::Condition(c) => c.items.iter_mut().for_each(Self::apply_enum_types),
            Self::Predicate(p) => match (&mut p.subject, &p.predicate) {
                (Operand::Property(prop), Operand::Enum(e)) if prop.element_type.is_none() => {
                    prop.element_type = Some(e.type_name.clone());
                }
                _ => {}
            },
            Self::Quantifier(q) => {
                if let Some(item) = q.item.as_deref_mut() {
                    item.apply_enum_types();
                }
            }
        }
    }

    /// Substitutes bound parameters with typed literals.
    ///
    /// An equality against a multi-valued substitution splits into an `or`
    /// of single-value equalities (`ne` into an `and` of inequalities); `in`
    /// receives the values as its list.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidExpression`] when a multi-valued
    /// substitution lands in an ordering comparison.
    pub fn convert(self, parameters: &HashMap<String, String>) -> Result<Self> {
        match self {
            Self::Condition(c) => {
                let items = c
                    .items
                    .into_iter()
                    .map(|i| i.convert(parameters))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::Condition(Condition::new(c.kind, items)))
            }
            Self::Predicate(p) => convert_predicate(p, parameters),
            Self::Quantifier(mut q) => {
                if let Some(item) = q.item.take() {
                    q.item = Some(Box::new(item.convert(parameters)?));
                }
                Ok(Self::Quantifier(q))
            }
        }
    }
}

fn convert_predicate(p: Predicate, parameters: &HashMap<String, String>) -> Result<Expression> {
    let subject = p.subject.convert(parameters);
    let predicate = p.predicate.convert(parameters);

    let split = |subject: Operand, list: List| -> Option<Expression> {
        let kind = p.kind;
        let pieces = list
            .items
            .into_iter()
            .map(|item| Expression::Predicate(Predicate::new(kind, subject.clone(), item)));
        match kind {
            PredicateKind::Ne => Expression::and(pieces),
            _ => Expression::or(pieces),
        }
    };

    match (p.kind, subject, predicate) {
        (PredicateKind::Eq | PredicateKind::Ne, subject, Operand::List(list)) if !subject.is_list() => {
            split(subject, list).ok_or_else(|| empty_list(p.kind))
        }
        (PredicateKind::Eq | PredicateKind::Ne, Operand::List(list), predicate) => {
            split(predicate, list).ok_or_else(|| empty_list(p.kind))
        }
        (PredicateKind::In, subject, Operand::Literal(single)) => Ok(Expression::Predicate(Predicate {
            subject,
            predicate: Operand::List(List {
                items: vec![Operand::Literal(single)],
            }),
            ..p
        })),
        (kind, subject, predicate)
            if !matches!(kind, PredicateKind::In) && (subject.is_list() || predicate.is_list()) =>
        {
            Err(CompileError::InvalidExpression(format!(
                "'{}' cannot compare against several values",
                kind.as_str()
            )))
        }
        (_, subject, predicate) => Ok(Expression::Predicate(Predicate {
            subject,
            predicate,
            ..p
        })),
    }
}

fn empty_list(kind: PredicateKind) -> CompileError {
    CompileError::InvalidExpression(format!("'{}' against an empty list", kind.as_str()))
}

impl Operand {
    /// Returns true for a literal list.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }
}
