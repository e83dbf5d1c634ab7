//! Type classification and the closure-computing model builder.

use thiserror::Error;

use crate::model::{ClassDef, EnumMember, EnumRef, Model, Property, TypeRef};
use crate::reflect::{ClassDecl, DeclKind, HostType, MemberDecl, TypeDecl, TypeSource};
use crate::visit::TypeResolver;

/// Failures surfaced by classification and model building. All of them are
/// fatal for the current `add` call; there is no partial recovery.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A scalar-like host type has no known target mapping.
    #[error("the type '{0}' has no supported scalar mapping")]
    UnsupportedType(String),
    /// A non-class type was requested as a model root.
    #[error("type '{0}' isn't a class; only classes can be added to the model")]
    NotAClass(String),
    /// A named type reference the source cannot resolve.
    #[error("type '{0}' is not declared by the type source")]
    UnknownType(String),
}

/// The classifier's buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    Primitive,
    Enum,
    Collection,
    Class,
    GenericParam,
}

/// Categorizes a host type into exactly one family.
///
/// Nullable wrappers are unwrapped before classification; callers that care
/// about optionality must look for the wrapper themselves. Classification is
/// total over supported types: an [`HostType::Opaque`] reference fails with
/// [`ModelError::UnsupportedType`], an unresolvable [`HostType::Named`]
/// reference with [`ModelError::UnknownType`].
pub fn classify(ty: &HostType, source: &dyn TypeSource) -> Result<TypeFamily, ModelError> {
    match ty {
        HostType::Scalar(_) => Ok(TypeFamily::Primitive),
        HostType::Nullable(inner) => classify(inner, source),
        HostType::Sequence(_) => Ok(TypeFamily::Collection),
        HostType::TypeParam(_) => Ok(TypeFamily::GenericParam),
        HostType::Opaque(name) => Err(ModelError::UnsupportedType(name.clone())),
        HostType::Named(id) => match source.get(id) {
            Some(decl) => Ok(match decl.kind {
                DeclKind::Class(_) => TypeFamily::Class,
                DeclKind::Enum(_) => TypeFamily::Enum,
            }),
            None => Err(ModelError::UnknownType(id.clone())),
        },
    }
}

/// Computes the closed, de-duplicated class graph reachable from the
/// requested root types.
pub struct ModelBuilder<'a> {
    source: &'a dyn TypeSource,
    classes: Vec<ClassDef>,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(source: &'a dyn TypeSource) -> Self {
        Self {
            source,
            classes: Vec::new(),
        }
    }

    /// Adds a class type and everything it references to the model.
    pub fn add(&mut self, ty: &HostType) -> Result<(), ModelError> {
        self.add_with(ty, true)
    }

    /// Adds a class type; when `include_references` is false, classes
    /// reachable through properties are left out (the base-type chain is
    /// always followed).
    pub fn add_with(&mut self, ty: &HostType, include_references: bool) -> Result<(), ModelError> {
        // Nullability at the class level collapses to the unwrapped class.
        if let HostType::Nullable(inner) = ty {
            return self.add_with(inner, include_references);
        }
        if classify(ty, self.source)? != TypeFamily::Class {
            return Err(ModelError::NotAClass(ty.to_string()));
        }
        let HostType::Named(id) = ty else {
            return Err(ModelError::NotAClass(ty.to_string()));
        };
        // Already present: idempotent, and the guard that terminates
        // mutually-referential graphs.
        if self.contains(id) {
            return Ok(());
        }
        let source = self.source;
        let decl = source
            .get(id)
            .ok_or_else(|| ModelError::UnknownType(id.clone()))?;
        let DeclKind::Class(class_decl) = &decl.kind else {
            return Err(ModelError::NotAClass(id.clone()));
        };
        let class = build_class(decl, class_decl, source)?;
        let base = class_decl.base.clone();
        // Insert before recursing so self- and mutual references
        // short-circuit on the guard above.
        self.classes.push(class);
        if let Some(base_id) = base {
            self.add(&HostType::Named(base_id))?;
        }
        if include_references {
            self.add_references(id)?;
        }
        Ok(())
    }

    /// Batch entry point: adds every class-family type the source declares.
    pub fn add_all(&mut self) -> Result<(), ModelError> {
        let ids: Vec<String> = self
            .source
            .types()
            .iter()
            .filter(|decl| matches!(decl.kind, DeclKind::Class(_)))
            .map(|decl| decl.id.clone())
            .collect();
        for id in ids {
            self.add(&HostType::Named(id))?;
        }
        Ok(())
    }

    /// Freezes the table into a [`Model`] and runs the built-in
    /// type-resolution pass over the closed graph.
    pub fn build(self) -> Model {
        let mut model = Model::new(self.classes);
        model.run_visitor(&mut TypeResolver);
        model
    }

    fn contains(&self, id: &str) -> bool {
        self.classes.iter().any(|c| c.id == id)
    }

    /// Chases class references out of the given class's properties:
    /// class-typed properties and class element types of collections.
    /// Primitives, enums and generic parameters stay leaf references.
    fn add_references(&mut self, class_id: &str) -> Result<(), ModelError> {
        let referenced: Vec<String> = self
            .classes
            .iter()
            .find(|c| c.id == class_id)
            .map(|class| {
                class
                    .properties
                    .iter()
                    .filter_map(referenced_class_id)
                    .collect()
            })
            .unwrap_or_default();
        for id in referenced {
            self.add(&HostType::Named(id))?;
        }
        Ok(())
    }
}

fn referenced_class_id(property: &Property) -> Option<String> {
    match &property.ty {
        TypeRef::Class(id) => Some(id.clone()),
        TypeRef::Collection(element) => match element.as_ref() {
            TypeRef::Class(id) => Some(id.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn build_class(
    decl: &TypeDecl,
    class_decl: &ClassDecl,
    source: &dyn TypeSource,
) -> Result<ClassDef, ModelError> {
    let mut properties = Vec::with_capacity(class_decl.members.len());
    for member in &class_decl.members {
        properties.push(build_property(member, source)?);
    }
    Ok(ClassDef {
        id: decl.id.clone(),
        name: decl.rename.clone().unwrap_or_else(|| decl.name.clone()),
        module: decl
            .module_override
            .clone()
            .unwrap_or_else(|| decl.namespace.clone()),
        base: class_decl.base.clone(),
        properties,
        ignored: decl.ignored,
    })
}

fn build_property(member: &MemberDecl, source: &dyn TypeSource) -> Result<Property, ModelError> {
    Ok(Property {
        name: member.rename.clone().unwrap_or_else(|| member.name.clone()),
        ty: resolve_member_type(&member.ty, source)?,
        ignored: member.ignored,
        optional: member.optional,
        constant: member.constant.clone(),
    })
}

/// Maps a declared member type onto a model type reference. Nullable
/// wrappers are unwrapped; optionality comes only from the annotation.
fn resolve_member_type(ty: &HostType, source: &dyn TypeSource) -> Result<TypeRef, ModelError> {
    match ty {
        HostType::Scalar(kind) => Ok(TypeRef::Primitive((*kind).into())),
        HostType::Nullable(inner) => resolve_member_type(inner, source),
        HostType::Sequence(element) => Ok(TypeRef::Collection(Box::new(resolve_member_type(
            element, source,
        )?))),
        HostType::TypeParam(name) => Ok(TypeRef::GenericParam(name.clone())),
        HostType::Opaque(name) => Err(ModelError::UnsupportedType(name.clone())),
        HostType::Named(id) => {
            let decl = source
                .get(id)
                .ok_or_else(|| ModelError::UnknownType(id.clone()))?;
            match &decl.kind {
                DeclKind::Class(_) => Ok(TypeRef::Class(decl.id.clone())),
                DeclKind::Enum(enum_decl) => Ok(TypeRef::Enum(EnumRef {
                    id: decl.id.clone(),
                    name: decl.rename.clone().unwrap_or_else(|| decl.name.clone()),
                    module: decl
                        .module_override
                        .clone()
                        .unwrap_or_else(|| decl.namespace.clone()),
                    members: enum_decl
                        .members
                        .iter()
                        .map(|m| EnumMember {
                            name: m.name.clone(),
                            value: m.value,
                        })
                        .collect(),
                })),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PrimitiveKind;
    use crate::reflect::{Catalog, Constant};

    fn person_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert(TypeDecl::class(
            "People.Person",
            vec![
                MemberDecl::property("Name", HostType::string()),
                MemberDecl::property("YearOfBirth", HostType::int()),
            ],
        ));
        catalog.insert(
            TypeDecl::class(
                "People.Employee",
                vec![MemberDecl::property("Salary", HostType::decimal())],
            )
            .with_base("People.Person"),
        );
        catalog
    }

    #[test]
    fn classify_covers_every_family() {
        let catalog = person_catalog();

        assert_eq!(
            classify(&HostType::string(), &catalog).unwrap(),
            TypeFamily::Primitive
        );
        assert_eq!(
            classify(&HostType::sequence(HostType::int()), &catalog).unwrap(),
            TypeFamily::Collection
        );
        assert_eq!(
            classify(&HostType::type_param("T"), &catalog).unwrap(),
            TypeFamily::GenericParam
        );
        assert_eq!(
            classify(&HostType::named("People.Person"), &catalog).unwrap(),
            TypeFamily::Class
        );

        let mut with_enum = person_catalog();
        with_enum.insert(TypeDecl::enumeration("People.Kind", &[("Adult", 0)]));
        assert_eq!(
            classify(&HostType::named("People.Kind"), &with_enum).unwrap(),
            TypeFamily::Enum
        );
    }

    #[test]
    fn classify_unwraps_nullable() {
        let catalog = person_catalog();
        let ty = HostType::nullable(HostType::named("People.Person"));

        assert_eq!(classify(&ty, &catalog).unwrap(), TypeFamily::Class);
    }

    #[test]
    fn classify_rejects_opaque_scalars_by_name() {
        let catalog = Catalog::new();
        let err = classify(&HostType::opaque("Sys.Pointer"), &catalog).unwrap_err();

        assert!(matches!(err, ModelError::UnsupportedType(name) if name == "Sys.Pointer"));
    }

    #[test]
    fn classify_rejects_undeclared_named_types() {
        let catalog = Catalog::new();
        let err = classify(&HostType::named("Missing.Type"), &catalog).unwrap_err();

        assert!(matches!(err, ModelError::UnknownType(id) if id == "Missing.Type"));
    }

    #[test]
    fn adding_a_primitive_root_fails_and_leaves_the_model_unchanged() {
        let catalog = person_catalog();
        let mut builder = ModelBuilder::new(&catalog);

        let err = builder.add(&HostType::int()).unwrap_err();
        assert!(matches!(err, ModelError::NotAClass(_)));

        let model = builder.build();
        assert!(model.classes().is_empty());
    }

    #[test]
    fn adding_an_enum_root_fails() {
        let mut catalog = Catalog::new();
        catalog.insert(TypeDecl::enumeration("E.Kind", &[("A", 0)]));
        let mut builder = ModelBuilder::new(&catalog);

        let err = builder.add(&HostType::named("E.Kind")).unwrap_err();
        assert!(matches!(err, ModelError::NotAClass(id) if id == "E.Kind"));
    }

    #[test]
    fn nullable_root_collapses_to_the_unwrapped_class() {
        let catalog = person_catalog();
        let mut builder = ModelBuilder::new(&catalog);

        builder
            .add(&HostType::nullable(HostType::named("People.Person")))
            .unwrap();
        let model = builder.build();

        assert_eq!(model.classes().len(), 1);
        assert_eq!(model.classes()[0].id, "People.Person");
    }

    #[test]
    fn add_is_idempotent() {
        let catalog = person_catalog();

        let mut once = ModelBuilder::new(&catalog);
        once.add(&HostType::named("People.Employee")).unwrap();
        let once = once.build();

        let mut twice = ModelBuilder::new(&catalog);
        twice.add(&HostType::named("People.Employee")).unwrap();
        twice.add(&HostType::named("People.Employee")).unwrap();
        let twice = twice.build();

        assert_eq!(once.classes().len(), twice.classes().len());
    }

    #[test]
    fn base_chain_is_added_and_properties_are_not_duplicated() {
        let catalog = person_catalog();
        let mut builder = ModelBuilder::new(&catalog);

        builder.add(&HostType::named("People.Employee")).unwrap();
        let model = builder.build();

        let employee = model.class("People.Employee").unwrap();
        assert_eq!(employee.base.as_deref(), Some("People.Person"));
        let names: Vec<&str> = employee
            .properties
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, ["Salary"]);

        let person = model.class("People.Person").unwrap();
        assert!(person.base.is_none());
        assert_eq!(person.properties.len(), 2);
    }

    #[test]
    fn mutually_referential_classes_terminate_and_appear_once() {
        let mut catalog = Catalog::new();
        catalog.insert(TypeDecl::class(
            "Graph.A",
            vec![MemberDecl::property("Other", HostType::named("Graph.B"))],
        ));
        catalog.insert(TypeDecl::class(
            "Graph.B",
            vec![MemberDecl::property("Other", HostType::named("Graph.A"))],
        ));

        let mut builder = ModelBuilder::new(&catalog);
        builder.add(&HostType::named("Graph.A")).unwrap();
        let model = builder.build();

        assert_eq!(model.classes().len(), 2);
        assert!(model.class("Graph.A").is_some());
        assert!(model.class("Graph.B").is_some());
    }

    #[test]
    fn self_referential_class_terminates() {
        let mut catalog = Catalog::new();
        catalog.insert(TypeDecl::class(
            "Graph.Node",
            vec![MemberDecl::property(
                "Next",
                HostType::named("Graph.Node"),
            )],
        ));

        let mut builder = ModelBuilder::new(&catalog);
        builder.add(&HostType::named("Graph.Node")).unwrap();

        assert_eq!(builder.build().classes().len(), 1);
    }

    #[test]
    fn collection_properties_pull_in_their_element_class() {
        let mut catalog = Catalog::new();
        catalog.insert(TypeDecl::class(
            "Shop.Order",
            vec![MemberDecl::property("TotalPrice", HostType::decimal())],
        ));
        catalog.insert(TypeDecl::class(
            "Shop.Customer",
            vec![MemberDecl::property(
                "Orders",
                HostType::sequence(HostType::named("Shop.Order")),
            )],
        ));

        let mut builder = ModelBuilder::new(&catalog);
        builder.add(&HostType::named("Shop.Customer")).unwrap();
        let model = builder.build();

        assert!(model.class("Shop.Order").is_some());
    }

    #[test]
    fn references_are_left_out_when_not_included() {
        let mut catalog = Catalog::new();
        catalog.insert(TypeDecl::class(
            "Shop.Order",
            vec![MemberDecl::property("TotalPrice", HostType::decimal())],
        ));
        catalog.insert(TypeDecl::class(
            "Shop.Customer",
            vec![
                MemberDecl::property("Orders", HostType::sequence(HostType::named("Shop.Order"))),
                MemberDecl::property("LastOrder", HostType::named("Shop.Order")),
            ],
        ));

        let mut builder = ModelBuilder::new(&catalog);
        builder
            .add_with(&HostType::named("Shop.Customer"), false)
            .unwrap();
        let model = builder.build();

        assert_eq!(model.classes().len(), 1);
        assert!(model.class("Shop.Order").is_none());
    }

    #[test]
    fn enum_properties_stay_leaf_references_with_members() {
        let mut catalog = Catalog::new();
        catalog.insert(TypeDecl::enumeration(
            "Shop.CustomerKind",
            &[("Corporate", 1), ("Individual", 2)],
        ));
        catalog.insert(TypeDecl::class(
            "Shop.Customer",
            vec![MemberDecl::property(
                "Kind",
                HostType::named("Shop.CustomerKind"),
            )],
        ));

        let mut builder = ModelBuilder::new(&catalog);
        builder.add(&HostType::named("Shop.Customer")).unwrap();
        let model = builder.build();

        assert_eq!(model.classes().len(), 1);
        let TypeRef::Enum(enum_ref) = &model.class("Shop.Customer").unwrap().properties[0].ty
        else {
            panic!("expected an enum reference");
        };
        assert_eq!(enum_ref.name, "CustomerKind");
        assert_eq!(enum_ref.module, "Shop");
        assert_eq!(enum_ref.members.len(), 2);
        assert_eq!(enum_ref.members[0].name, "Corporate");
        assert_eq!(enum_ref.members[0].value, 1);
    }

    #[test]
    fn member_annotations_override_names_and_set_flags() {
        let mut catalog = Catalog::new();
        catalog.insert(TypeDecl::class(
            "Api.Account",
            vec![
                MemberDecl::property("UserName", HostType::string()).renamed("userName"),
                MemberDecl::property("Secret", HostType::string()).ignored(),
                MemberDecl::property("Nickname", HostType::string()).optional(),
            ],
        ));

        let mut builder = ModelBuilder::new(&catalog);
        builder.add(&HostType::named("Api.Account")).unwrap();
        let model = builder.build();

        let account = model.class("Api.Account").unwrap();
        assert_eq!(account.properties[0].name, "userName");
        assert!(account.properties[1].ignored);
        assert!(account.properties[2].optional);
    }

    #[test]
    fn class_annotations_override_name_and_module() {
        let mut catalog = Catalog::new();
        catalog.insert(
            TypeDecl::class("Api.Internal.AccountDto", Vec::new())
                .renamed("Account")
                .in_module("Api"),
        );

        let mut builder = ModelBuilder::new(&catalog);
        builder
            .add(&HostType::named("Api.Internal.AccountDto"))
            .unwrap();
        let model = builder.build();

        let account = model.class("Api.Internal.AccountDto").unwrap();
        assert_eq!(account.name, "Account");
        assert_eq!(account.module, "Api");
        assert!(model.module("Api").unwrap().contains("Api.Internal.AccountDto"));
    }

    #[test]
    fn unsupported_member_type_aborts_the_add() {
        let mut catalog = Catalog::new();
        catalog.insert(TypeDecl::class(
            "Sys.Handle",
            vec![MemberDecl::property("Raw", HostType::opaque("Sys.Pointer"))],
        ));

        let mut builder = ModelBuilder::new(&catalog);
        let err = builder.add(&HostType::named("Sys.Handle")).unwrap_err();

        assert!(matches!(err, ModelError::UnsupportedType(name) if name == "Sys.Pointer"));
    }

    #[test]
    fn nullable_member_types_resolve_to_the_underlying_mapping() {
        let mut catalog = Catalog::new();
        catalog.insert(TypeDecl::class(
            "Api.Account",
            vec![MemberDecl::property(
                "Age",
                HostType::nullable(HostType::int()),
            )],
        ));

        let mut builder = ModelBuilder::new(&catalog);
        builder.add(&HostType::named("Api.Account")).unwrap();
        let model = builder.build();

        let age = &model.class("Api.Account").unwrap().properties[0];
        assert_eq!(age.ty, TypeRef::Primitive(PrimitiveKind::Number));
        assert!(!age.optional);
    }

    #[test]
    fn generic_parameters_widen_to_any_after_build() {
        let mut catalog = Catalog::new();
        catalog.insert(
            TypeDecl::class(
                "Api.Page",
                vec![
                    MemberDecl::property("Item", HostType::type_param("T")),
                    MemberDecl::property("Items", HostType::sequence(HostType::type_param("T"))),
                    MemberDecl::property("Count", HostType::int()),
                ],
            )
            .with_type_params(&["T"]),
        );

        let mut builder = ModelBuilder::new(&catalog);
        builder.add(&HostType::named("Api.Page")).unwrap();
        let model = builder.build();

        let page = model.class("Api.Page").unwrap();
        assert_eq!(page.properties[0].ty, TypeRef::Any);
        assert_eq!(
            page.properties[1].ty,
            TypeRef::Collection(Box::new(TypeRef::Any))
        );
        assert_eq!(
            page.properties[2].ty,
            TypeRef::Primitive(PrimitiveKind::Number)
        );
    }

    #[test]
    fn add_all_adds_every_declared_class_and_skips_enums() {
        let mut catalog = person_catalog();
        catalog.insert(TypeDecl::enumeration("People.Kind", &[("Adult", 0)]));

        let mut builder = ModelBuilder::new(&catalog);
        builder.add_all().unwrap();
        let model = builder.build();

        assert_eq!(model.classes().len(), 2);
    }

    #[test]
    fn constants_carry_their_value_into_the_model() {
        let mut catalog = Catalog::new();
        catalog.insert(TypeDecl::class(
            "Api.Limits",
            vec![MemberDecl::constant("MaxPageSize", Constant::Int(100))],
        ));

        let mut builder = ModelBuilder::new(&catalog);
        builder.add(&HostType::named("Api.Limits")).unwrap();
        let model = builder.build();

        let limit = &model.class("Api.Limits").unwrap().properties[0];
        assert_eq!(limit.constant, Some(Constant::Int(100)));
    }
}
