//! Filter serialization: expression trees to T-SQL conditions.
//!
//! Scalar functions go through a fixed table of built-in templates first
//! and a caller-supplied [`FunctionRegistry`] second; anything else is a
//! [`NotSupported`](crate::CompileError::NotSupported) error.

mod functions;
mod serializer;

pub use functions::{FunctionRegistry, FunctionTemplate, UserFunction, UserFunctionRegistry};
pub use serializer::FilterSerializer;

pub(crate) use serializer::quote_table;
