//! Host-type descriptors and the query interface the model builder consumes.
//!
//! The builder never talks to a platform's reflection machinery directly. A
//! host adapter describes its types as [`TypeDecl`] values (classes, enums,
//! their members and already-resolved annotation values) and exposes them
//! through the [`TypeSource`] lookup trait. Declared types reference each
//! other by qualified name, so cyclic host graphs need no shared-ownership
//! plumbing. [`Catalog`] is the in-memory implementation; hand-built catalogs
//! are also how the test suite drives the builder.

use serde::{Deserialize, Serialize};

/// Scalar host types with a known target mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarKind {
    Bool,
    Char,
    String,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    DateTime,
}

impl ScalarKind {
    /// Lowercase spelling used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Char => "char",
            ScalarKind::String => "string",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Decimal => "decimal",
            ScalarKind::DateTime => "datetime",
        }
    }
}

/// The shape of one host type reference.
///
/// `Named` points at a [`TypeDecl`] by qualified name. `Opaque` marks a
/// scalar-like host type the adapter could not map; classifying it fails
/// with [`ModelError::UnsupportedType`](crate::ModelError::UnsupportedType).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostType {
    Scalar(ScalarKind),
    /// A nullable wrapper around another type.
    Nullable(Box<HostType>),
    /// An array, list or other enumerable with one element type.
    Sequence(Box<HostType>),
    /// Reference to a declared class or enum by qualified name.
    Named(String),
    /// An unbound generic parameter of an open generic definition.
    TypeParam(String),
    /// A scalar-like host type with no known mapping.
    Opaque(String),
}

impl HostType {
    pub fn boolean() -> Self {
        HostType::Scalar(ScalarKind::Bool)
    }

    pub fn character() -> Self {
        HostType::Scalar(ScalarKind::Char)
    }

    pub fn string() -> Self {
        HostType::Scalar(ScalarKind::String)
    }

    pub fn int() -> Self {
        HostType::Scalar(ScalarKind::I32)
    }

    pub fn long() -> Self {
        HostType::Scalar(ScalarKind::I64)
    }

    pub fn float() -> Self {
        HostType::Scalar(ScalarKind::F64)
    }

    pub fn decimal() -> Self {
        HostType::Scalar(ScalarKind::Decimal)
    }

    pub fn date_time() -> Self {
        HostType::Scalar(ScalarKind::DateTime)
    }

    pub fn named(id: impl Into<String>) -> Self {
        HostType::Named(id.into())
    }

    pub fn nullable(inner: HostType) -> Self {
        HostType::Nullable(Box::new(inner))
    }

    pub fn sequence(element: HostType) -> Self {
        HostType::Sequence(Box::new(element))
    }

    pub fn type_param(name: impl Into<String>) -> Self {
        HostType::TypeParam(name.into())
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        HostType::Opaque(name.into())
    }
}

impl std::fmt::Display for HostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostType::Scalar(kind) => f.write_str(kind.name()),
            HostType::Nullable(inner) => write!(f, "{inner}?"),
            HostType::Sequence(element) => write!(f, "{element}[]"),
            HostType::Named(id) => f.write_str(id),
            HostType::TypeParam(name) => f.write_str(name),
            HostType::Opaque(name) => f.write_str(name),
        }
    }
}

/// A literal value carried by a constant field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// One property or field declared directly on a class, with its annotation
/// values already resolved by the host adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDecl {
    /// Declared member name.
    pub name: String,
    /// Declared member type.
    pub ty: HostType,
    /// Custom name annotation, if any.
    pub rename: Option<String>,
    /// Optional-member annotation.
    pub optional: bool,
    /// Ignore annotation.
    pub ignored: bool,
    /// Literal value, present only for constant fields.
    pub constant: Option<Constant>,
}

impl MemberDecl {
    pub fn property(name: impl Into<String>, ty: HostType) -> Self {
        Self {
            name: name.into(),
            ty,
            rename: None,
            optional: false,
            ignored: false,
            constant: None,
        }
    }

    /// A constant field; the declared type follows the literal's kind.
    pub fn constant(name: impl Into<String>, value: Constant) -> Self {
        let ty = match &value {
            Constant::Str(_) => HostType::string(),
            Constant::Int(_) => HostType::long(),
            Constant::Float(_) => HostType::float(),
            Constant::Bool(_) => HostType::boolean(),
        };
        Self {
            name: name.into(),
            ty,
            rename: None,
            optional: false,
            ignored: false,
            constant: Some(value),
        }
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }
}

/// A class declaration: base type, directly declared members, type
/// parameters of an open generic definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    /// Qualified name of the base type; `None` when the host base is the
    /// universal root object type.
    pub base: Option<String>,
    /// Members declared directly on this type, in declaration order.
    /// Inherited members belong to the base declaration.
    pub members: Vec<MemberDecl>,
    /// Non-empty marks an open generic definition.
    pub type_params: Vec<String>,
}

/// An enum declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub members: Vec<EnumMemberDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumMemberDecl {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeclKind {
    Class(ClassDecl),
    Enum(EnumDecl),
}

/// One declared host type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    /// Qualified name; the stable identity key for the model builder.
    pub id: String,
    /// Unqualified declared name.
    pub name: String,
    /// Namespace portion of the qualified name.
    pub namespace: String,
    pub kind: DeclKind,
    /// Custom declared-name annotation.
    pub rename: Option<String>,
    /// Custom module annotation; overrides the namespace-derived module.
    pub module_override: Option<String>,
    /// Ignore annotation.
    pub ignored: bool,
}

impl TypeDecl {
    pub fn class(id: impl Into<String>, members: Vec<MemberDecl>) -> Self {
        Self::with_kind(
            id,
            DeclKind::Class(ClassDecl {
                base: None,
                members,
                type_params: Vec::new(),
            }),
        )
    }

    pub fn enumeration(id: impl Into<String>, members: &[(&str, i64)]) -> Self {
        Self::with_kind(
            id,
            DeclKind::Enum(EnumDecl {
                members: members
                    .iter()
                    .map(|(name, value)| EnumMemberDecl {
                        name: (*name).to_string(),
                        value: *value,
                    })
                    .collect(),
            }),
        )
    }

    fn with_kind(id: impl Into<String>, kind: DeclKind) -> Self {
        let id = id.into();
        let (namespace, name) = match id.rsplit_once('.') {
            Some((namespace, name)) => (namespace.to_string(), name.to_string()),
            None => (String::new(), id.clone()),
        };
        Self {
            id,
            name,
            namespace,
            kind,
            rename: None,
            module_override: None,
            ignored: false,
        }
    }

    /// Sets the base type; meaningful for class declarations only.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        if let DeclKind::Class(class) = &mut self.kind {
            class.base = Some(base.into());
        }
        self
    }

    /// Marks the class as an open generic definition with the given
    /// type parameters.
    pub fn with_type_params(mut self, params: &[&str]) -> Self {
        if let DeclKind::Class(class) = &mut self.kind {
            class.type_params = params.iter().map(|p| (*p).to_string()).collect();
        }
        self
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }

    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.module_override = Some(module.into());
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }
}

/// The narrow query interface to a host type system.
///
/// One implementation per host platform; the builder depends on nothing
/// else.
pub trait TypeSource {
    /// Looks up a declared type by qualified name.
    fn get(&self, id: &str) -> Option<&TypeDecl>;

    /// Enumerates every declared type, in declaration order.
    fn types(&self) -> Vec<&TypeDecl>;
}

/// An ordered, in-memory [`TypeSource`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    types: Vec<TypeDecl>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declaration, replacing any previous one with the same id.
    pub fn insert(&mut self, decl: TypeDecl) {
        match self.types.iter_mut().find(|t| t.id == decl.id) {
            Some(slot) => *slot = decl,
            None => self.types.push(decl),
        }
    }

    /// Loads a catalog from a JSON metadata dump.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeSource for Catalog {
    fn get(&self, id: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|t| t.id == id)
    }

    fn types(&self) -> Vec<&TypeDecl> {
        self.types.iter().collect()
    }
}
