//! Filter parser.
//!
//! A tokenizer pass followed by a hand-written precedence compiler that emits
//! a structured document; the expression model is built from the document.

mod compiler;
mod document;
mod error;
pub(crate) mod precedence;

pub use compiler::FilterParser;
pub use document::{DocNode, Tag};
pub use error::ParseError;
pub use precedence::binding_power;
