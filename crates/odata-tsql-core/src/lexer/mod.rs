//! Filter tokenizer.
//!
//! Splits a raw query-option string into classified tokens. Quoted
//! strings are opaque, recognized function calls and `any`/`all`
//! quantifiers are absorbed into a single token together with their
//! parenthesized argument text, and the list following `in` becomes one
//! token.

mod span;
mod token;
mod tokenizer;

pub use span::Span;
pub use token::{
    is_boolean_function, is_builtin_function, Fragment, Keyword, Token, TokenKind, BOOLEAN_FUNCTIONS,
    BUILTIN_FUNCTIONS,
};
pub use tokenizer::{is_property_path, split_top_level, Tokenizer};
