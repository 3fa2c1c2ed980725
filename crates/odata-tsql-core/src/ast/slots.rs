//! Two-slot operand assignment shared by predicate and arithmetic builders.

use super::operand::Operand;
use crate::error::{CompileError, Result};

/// Subject and predicate slots, filled in encounter order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Slots {
    subject: Option<Operand>,
    predicate: Option<Operand>,
}

impl Slots {
    pub(crate) const fn new() -> Self {
        Self {
            subject: None,
            predicate: None,
        }
    }

    /// The first empty slot wins.
    pub(crate) fn fill(&mut self, operand: Operand, node: &str) -> Result<()> {
        if self.subject.is_none() {
            self.subject = Some(operand);
        } else if self.predicate.is_none() {
            self.predicate = Some(operand);
        } else {
            return Err(CompileError::InvalidExpression(format!(
                "'{node}' already has both operands"
            )));
        }
        Ok(())
    }

    pub(crate) fn finish(self, node: &str) -> Result<(Operand, Operand)> {
        match (self.subject, self.predicate) {
            (Some(subject), Some(predicate)) => Ok((subject, predicate)),
            (Some(_), None) => Err(CompileError::InvalidExpression(format!(
                "'{node}' is missing its right operand"
            ))),
            _ => Err(CompileError::InvalidExpression(format!(
                "'{node}' has no operands"
            ))),
        }
    }
}
