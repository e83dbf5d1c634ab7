//! Fluent composition of the builder and the TypeScript generator for the
//! common include-configure-generate call pattern.

use crate::builder::{ModelBuilder, ModelError};
use crate::model::{Model, TypeRef};
use crate::output::typescript::{
    FormatContext, TypeCategory, TypeScriptGenerator, TypeScriptOptions,
};
use crate::reflect::{HostType, TypeSource};

/// Starts a fluent declaration run over the given type source.
///
/// ```
/// use declgen::{declarations, Catalog, HostType, MemberDecl, TypeDecl};
///
/// let mut catalog = Catalog::new();
/// catalog.insert(TypeDecl::class(
///     "Shop.Address",
///     vec![MemberDecl::property("Street", HostType::string())],
/// ));
///
/// let output = declarations(&catalog)
///     .including("Shop.Address")
///     .unwrap()
///     .generate();
/// assert!(output.contains("interface Address"));
/// ```
pub fn declarations(source: &dyn TypeSource) -> Declarations<'_> {
    Declarations::new(source)
}

/// Thin wrapper around [`ModelBuilder`] and [`TypeScriptGenerator`].
pub struct Declarations<'a> {
    builder: ModelBuilder<'a>,
    generator: TypeScriptGenerator,
}

impl<'a> Declarations<'a> {
    pub fn new(source: &'a dyn TypeSource) -> Self {
        Self {
            builder: ModelBuilder::new(source),
            generator: TypeScriptGenerator::default(),
        }
    }

    /// Adds a class and everything it references to the model.
    pub fn including(mut self, id: &str) -> Result<Self, ModelError> {
        self.builder.add(&HostType::named(id))?;
        Ok(self)
    }

    /// Adds a class without chasing its property references.
    pub fn including_without_references(mut self, id: &str) -> Result<Self, ModelError> {
        self.builder.add_with(&HostType::named(id), false)?;
        Ok(self)
    }

    /// Adds every class the source declares.
    pub fn including_all(mut self) -> Result<Self, ModelError> {
        self.builder.add_all()?;
        Ok(self)
    }

    pub fn with_options(mut self, options: TypeScriptOptions) -> Self {
        self.generator.options = options;
        self
    }

    pub fn with_type_formatter<F>(mut self, category: TypeCategory, formatter: F) -> Self
    where
        F: Fn(&TypeRef, &FormatContext<'_>) -> String + 'static,
    {
        self.generator.register_type_formatter(category, formatter);
        self
    }

    pub fn with_type_convertor<F>(mut self, host_id: &str, convertor: F) -> Self
    where
        F: Fn(&TypeRef) -> String + 'static,
    {
        self.generator.register_type_convertor(host_id, convertor);
        self
    }

    pub fn with_identifier_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&str) -> String + 'static,
    {
        self.generator.register_identifier_formatter(formatter);
        self
    }

    /// Freezes the builder and returns the resolved model, for callers that
    /// want to run visitors before rendering.
    pub fn build(self) -> Model {
        self.builder.build()
    }

    /// Builds the model and renders it.
    pub fn generate(self) -> String {
        let model = self.builder.build();
        self.generator.generate(&model)
    }
}
