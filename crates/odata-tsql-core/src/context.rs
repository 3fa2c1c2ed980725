//! Read-only collaborators shared by the serializers of one compilation.

use crate::config::CompilerOptions;
use crate::filter::FunctionRegistry;
use crate::schema::{EnumMetadataCache, SchemaProvider};

/// Options plus the optional metadata sources a serializer may consult.
///
/// Cheap to copy; the mutable part of a compilation lives in the
/// [`ParameterContext`](crate::ParameterContext) passed alongside it.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    /// Compiler options.
    pub options: &'a CompilerOptions,
    /// Enum metadata, needed for enum literals.
    pub enums: Option<&'a EnumMetadataCache>,
    /// User-defined functions, consulted after the built-ins.
    pub functions: Option<&'a dyn FunctionRegistry>,
    /// Navigation metadata, needed for `any`/`all`.
    pub schema: Option<&'a dyn SchemaProvider>,
}

impl<'a> RenderContext<'a> {
    /// Creates a context with no metadata sources.
    #[must_use]
    pub const fn new(options: &'a CompilerOptions) -> Self {
        Self {
            options,
            enums: None,
            functions: None,
            schema: None,
        }
    }

    /// Attaches the enum metadata cache.
    #[must_use]
    pub const fn with_enums(mut self, enums: &'a EnumMetadataCache) -> Self {
        self.enums = Some(enums);
        self
    }

    /// Attaches a user-defined function registry.
    #[must_use]
    pub fn with_functions(mut self, functions: &'a dyn FunctionRegistry) -> Self {
        self.functions = Some(functions);
        self
    }

    /// Attaches a schema provider.
    #[must_use]
    pub fn with_schema(mut self, schema: &'a dyn SchemaProvider) -> Self {
        self.schema = Some(schema);
        self
    }
}

impl std::fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("options", self.options)
            .field("enums", &self.enums)
            .field("functions", &self.functions.is_some())
            .field("schema", &self.schema.is_some())
            .finish()
    }
}
