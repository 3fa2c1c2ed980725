//! Arithmetic precedence climbing.
//!
//! A run `a op b op c ...` is folded left to right. Each new operator is
//! inserted next to the tree built so far: when the current root binds more
//! loosely than the new operator, the operator is rotated into the root's
//! right child (recursively); otherwise the tree becomes the new operator's
//! left operand. Operands coming from parenthesized groups are leaves and are
//! never rotated into.

use crate::ast::ArithmeticOp;

use super::document::{DocNode, Tag};

/// Returns the binding power of an arithmetic operator.
///
/// Higher binds tighter. All operators associate to the left.
#[must_use]
pub const fn binding_power(op: ArithmeticOp) -> u8 {
    match op {
        ArithmeticOp::Add | ArithmeticOp::Sub => 1,
        ArithmeticOp::Mul | ArithmeticOp::Div | ArithmeticOp::DivBy | ArithmeticOp::Mod => 2,
    }
}

/// An arithmetic tree under construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Climb {
    /// An atomic operand.
    Leaf(DocNode),
    /// An operator built during this run.
    Op {
        /// The operator.
        op: ArithmeticOp,
        /// Subject.
        left: Box<Climb>,
        /// Predicate.
        right: Box<Climb>,
    },
}

impl Climb {
    /// Inserts `op operand` to the right of this tree.
    #[must_use]
    pub fn insert(self, op: ArithmeticOp, operand: DocNode) -> Self {
        match self {
            Self::Op {
                op: existing,
                left,
                right,
            } if binding_power(existing) < binding_power(op) => Self::Op {
                op: existing,
                left,
                right: Box::new(right.insert(op, operand)),
            },
            tree => Self::Op {
                op,
                left: Box::new(tree),
                right: Box::new(Self::Leaf(operand)),
            },
        }
    }

    /// Emits the tree as document nodes.
    #[must_use]
    pub fn into_document(self) -> DocNode {
        match self {
            Self::Leaf(node) => node,
            Self::Op { op, left, right } => DocNode::new(Tag::Arithmetic)
                .attr("op", op.as_str())
                .child(left.into_document())
                .child(right.into_document()),
        }
    }
}

/// Folds an operand run into one arithmetic tree.
#[must_use]
pub fn climb(first: DocNode, rest: impl IntoIterator<Item = (ArithmeticOp, DocNode)>) -> DocNode {
    let tree = rest
        .into_iter()
        .fold(Climb::Leaf(first), |tree, (op, operand)| tree.insert(op, operand));
    tracing::trace!(tree = ?tree, "resolved arithmetic run");
    tree.into_document()
}
