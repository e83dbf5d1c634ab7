//! Visitor seam for inspecting or mutating a model before emission.

use crate::model::{ClassDef, Model, Module, Property, TypeRef};

/// Polymorphic over the model/module/class/property capability set.
///
/// Every method defaults to a no-op, so an implementation overrides only
/// the levels it cares about. Dispatch order is
/// [`Model::run_visitor`]: the model itself, then each module, its member
/// classes and their properties.
pub trait ModelVisitor {
    fn visit_model(&mut self, _model: &mut Model) {}

    fn visit_module(&mut self, _module: &mut Module) {}

    fn visit_class(&mut self, _class: &mut ClassDef) {}

    fn visit_property(&mut self, _property: &mut Property) {}
}

/// Built-in pass run once per build, after the graph is closed: widens
/// every unbound generic parameter to `any`, since no concrete substitution
/// is known at model-build time.
pub(crate) struct TypeResolver;

impl ModelVisitor for TypeResolver {
    fn visit_property(&mut self, property: &mut Property) {
        let ty = std::mem::replace(&mut property.ty, TypeRef::Any);
        property.ty = widen(ty);
    }
}

fn widen(ty: TypeRef) -> TypeRef {
    match ty {
        TypeRef::GenericParam(_) => TypeRef::Any,
        TypeRef::Collection(element) => TypeRef::Collection(Box::new(widen(*element))),
        other => other,
    }
}
