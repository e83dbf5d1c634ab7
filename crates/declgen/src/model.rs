//! The resolved model: classes grouped into modules, ready for visitors and
//! for the output backends.
//!
//! Classes reference each other by id (the host type's qualified name) and
//! are resolved through lookups on [`Model`], never through direct
//! ownership, so reference cycles between classes are just strings.

use serde::{Deserialize, Serialize};

use crate::reflect::{Constant, ScalarKind};
use crate::visit::ModelVisitor;

/// Target-side scalar families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Bool,
    String,
    Number,
    Date,
}

impl From<ScalarKind> for PrimitiveKind {
    fn from(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Bool => PrimitiveKind::Bool,
            ScalarKind::Char | ScalarKind::String => PrimitiveKind::String,
            ScalarKind::I8
            | ScalarKind::I16
            | ScalarKind::I32
            | ScalarKind::I64
            | ScalarKind::U8
            | ScalarKind::U16
            | ScalarKind::U32
            | ScalarKind::U64
            | ScalarKind::F32
            | ScalarKind::F64
            | ScalarKind::Decimal => PrimitiveKind::Number,
            ScalarKind::DateTime => PrimitiveKind::Date,
        }
    }
}

/// One resolved type reference.
///
/// `GenericParam` only exists between property construction and the
/// resolution pass that runs inside
/// [`ModelBuilder::build`](crate::ModelBuilder::build); a built model spells
/// unsubstituted generics as `Any`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeRef {
    Primitive(PrimitiveKind),
    Enum(EnumRef),
    Collection(Box<TypeRef>),
    /// Reference to a class model by id. The class is usually in the model;
    /// when it is not (references were not included), backends fall back to
    /// the name derived from the id.
    Class(String),
    GenericParam(String),
    Any,
}

/// An enum reference carries its resolved name, module and members, so it
/// can be rendered without another source lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumRef {
    pub id: String,
    pub name: String,
    pub module: String,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

/// One member of a class model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Resolved name; annotation overrides already applied.
    pub name: String,
    pub ty: TypeRef,
    /// Excluded from generated output, but kept in the model.
    pub ignored: bool,
    pub optional: bool,
    /// Literal value for constant fields.
    pub constant: Option<Constant>,
}

/// One class model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    /// Host type identity; unique within a model.
    pub id: String,
    /// Resolved name; annotation overrides already applied.
    pub name: String,
    /// Name of the module this class belongs to. Reassign through
    /// [`Model::assign_module`], never by writing this field, so the module
    /// membership sets stay in sync.
    pub module: String,
    /// Id of the base class model; `None` when the host base is the
    /// universal root object type. Inherited properties are reachable only
    /// through this chain.
    pub base: Option<String>,
    /// Directly declared properties, in declaration order.
    pub properties: Vec<Property>,
    /// Excluded from generated output, but kept in the model.
    pub ignored: bool,
}

/// A named grouping of class models.
///
/// Renaming a module does not rewrite its members' back-references; move
/// classes between modules with [`Model::assign_module`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    classes: Vec<String>,
}

impl Module {
    /// Member class ids, in insertion order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn contains(&self, class_id: &str) -> bool {
        self.classes.iter().any(|c| c == class_id)
    }
}

/// The finished graph: every class model plus the modules grouping them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    classes: Vec<ClassDef>,
    modules: Vec<Module>,
}

impl Model {
    /// Groups the given classes into modules, preserving insertion order.
    pub fn new(classes: Vec<ClassDef>) -> Self {
        let mut modules: Vec<Module> = Vec::new();
        for class in &classes {
            match modules.iter_mut().find(|m| m.name == class.module) {
                Some(module) => module.classes.push(class.id.clone()),
                None => modules.push(Module {
                    name: class.module.clone(),
                    classes: vec![class.id.clone()],
                }),
            }
        }
        Self { classes, modules }
    }

    /// Every class model, in builder insertion order.
    pub fn classes(&self) -> &[ClassDef] {
        &self.classes
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn class(&self, id: &str) -> Option<&ClassDef> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn class_mut(&mut self, id: &str) -> Option<&mut ClassDef> {
        self.classes.iter_mut().find(|c| c.id == id)
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Moves a class into another module: removes it from its current
    /// module's member set and adds it to the target's, creating the target
    /// if needed. A class is never in two modules at once. Returns `false`
    /// when the class id is unknown.
    pub fn assign_module(&mut self, class_id: &str, module_name: &str) -> bool {
        let Some(class) = self.classes.iter_mut().find(|c| c.id == class_id) else {
            return false;
        };
        let previous = std::mem::replace(&mut class.module, module_name.to_string());
        if previous == module_name {
            return true;
        }
        if let Some(old) = self.modules.iter_mut().find(|m| m.name == previous) {
            old.classes.retain(|c| c != class_id);
        }
        match self.modules.iter_mut().find(|m| m.name == module_name) {
            Some(target) => {
                if !target.contains(class_id) {
                    target.classes.push(class_id.to_string());
                }
            }
            None => self.modules.push(Module {
                name: module_name.to_string(),
                classes: vec![class_id.to_string()],
            }),
        }
        true
    }

    /// Dispatches a visitor over the whole graph: the model itself, then
    /// each module, each member class and each property.
    pub fn run_visitor<V: ModelVisitor + ?Sized>(&mut self, visitor: &mut V) {
        visitor.visit_model(self);
        for index in 0..self.modules.len() {
            visitor.visit_module(&mut self.modules[index]);
            let members = self.modules[index].classes.clone();
            for id in members {
                if let Some(class) = self.classes.iter_mut().find(|c| c.id == id) {
                    visitor.visit_class(class);
                    for property in &mut class.properties {
                        visitor.visit_property(property);
                    }
                }
            }
        }
    }
}
