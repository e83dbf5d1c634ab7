//! Renders a resolved model into TypeScript declaration text.
//!
//! Output is grouped into one `declare module` block per module. Rendering
//! of types and identifiers can be overridden per type category, per host
//! type, or for all member identifiers; the most specific registered hook
//! wins, falling back to the built-in spellings.

use std::collections::HashMap;

use crate::model::{ClassDef, EnumRef, Model, PrimitiveKind, TypeRef};
use crate::reflect::Constant;

/// Rendering options.
#[derive(Debug, Clone, Default)]
pub struct TypeScriptOptions {
    /// Prefix emitted declarations with `export`.
    pub export: bool,
    /// Emit interface members as `readonly`.
    pub readonly: bool,
}

/// Formatter-registry key: the type-reference category a hook applies to.
///
/// Unresolved generic parameters render through the `Any` category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Primitive,
    Enum,
    Collection,
    Class,
    Any,
}

impl TypeCategory {
    pub fn of(ty: &TypeRef) -> TypeCategory {
        match ty {
            TypeRef::Primitive(_) => TypeCategory::Primitive,
            TypeRef::Enum(_) => TypeCategory::Enum,
            TypeRef::Collection(_) => TypeCategory::Collection,
            TypeRef::Class(_) => TypeCategory::Class,
            TypeRef::GenericParam(_) | TypeRef::Any => TypeCategory::Any,
        }
    }
}

/// Overrides how one [`TypeCategory`] is rendered.
pub type TypeFormatter = Box<dyn Fn(&TypeRef, &FormatContext<'_>) -> String>;

/// Overrides how referenced class and property identifiers are rendered.
pub type IdentifierFormatter = Box<dyn Fn(&str) -> String>;

/// Overrides the spelling of one specific host type wherever it is
/// referenced.
pub type TypeConvertor = Box<dyn Fn(&TypeRef) -> String>;

/// Passed to type formatters so they can render nested types with the full
/// resolution order (convertors, other formatters, defaults).
pub struct FormatContext<'a> {
    pub model: &'a Model,
    /// Module of the declaration currently being emitted; decides
    /// cross-module qualification.
    pub module: &'a str,
    generator: &'a TypeScriptGenerator,
}

impl FormatContext<'_> {
    pub fn format(&self, ty: &TypeRef) -> String {
        self.generator.format_type(ty, self.model, self.module)
    }
}

/// TypeScript declaration generator.
///
/// Purely functional over the model and the registered hooks: `generate`
/// mutates nothing and is deterministic given the builder's insertion
/// order.
pub struct TypeScriptGenerator {
    pub options: TypeScriptOptions,
    type_formatters: HashMap<TypeCategory, TypeFormatter>,
    convertors: HashMap<String, TypeConvertor>,
    identifier_formatter: Option<IdentifierFormatter>,
}

impl Default for TypeScriptGenerator {
    fn default() -> Self {
        Self::new(TypeScriptOptions::default())
    }
}

impl TypeScriptGenerator {
    pub fn new(options: TypeScriptOptions) -> Self {
        Self {
            options,
            type_formatters: HashMap::new(),
            convertors: HashMap::new(),
            identifier_formatter: None,
        }
    }

    /// Registers a formatter for one type category.
    pub fn register_type_formatter<F>(&mut self, category: TypeCategory, formatter: F)
    where
        F: Fn(&TypeRef, &FormatContext<'_>) -> String + 'static,
    {
        self.type_formatters.insert(category, Box::new(formatter));
    }

    /// Registers a convertor for the host type with the given qualified
    /// name. Convertors take precedence over category formatters.
    pub fn register_type_convertor<F>(&mut self, host_id: impl Into<String>, convertor: F)
    where
        F: Fn(&TypeRef) -> String + 'static,
    {
        self.convertors.insert(host_id.into(), Box::new(convertor));
    }

    /// Registers a formatter applied to every rendered class and property
    /// identifier.
    pub fn register_identifier_formatter<F>(&mut self, formatter: F)
    where
        F: Fn(&str) -> String + 'static,
    {
        self.identifier_formatter = Some(Box::new(formatter));
    }

    /// Renders the model: one `declare module` block per module in model
    /// order, module contents in class-insertion order. Enums referenced by
    /// visible properties are declared in their own module, before that
    /// module's interfaces; modules owning only enums come last. Ignored
    /// classes and properties are omitted entirely.
    pub fn generate(&self, model: &Model) -> String {
        let mut enum_groups = referenced_enums(model);
        let mut out = String::new();
        for module in model.modules() {
            let enums = take_group(&mut enum_groups, &module.name);
            let classes: Vec<&ClassDef> = module
                .classes()
                .iter()
                .filter_map(|id| model.class(id))
                .filter(|class| !class.ignored)
                .collect();
            if enums.is_empty() && classes.is_empty() {
                continue;
            }
            self.emit_module(&mut out, model, &module.name, &enums, &classes);
        }
        for (name, enums) in enum_groups {
            self.emit_module(&mut out, model, &name, &enums, &[]);
        }
        out
    }

    fn emit_module(
        &self,
        out: &mut String,
        model: &Model,
        name: &str,
        enums: &[EnumRef],
        classes: &[&ClassDef],
    ) {
        let top_level = name.is_empty();
        let indent = if top_level { "" } else { "  " };
        if !top_level {
            out.push_str(&format!("declare module {name} {{\n"));
        }
        let export = if self.options.export { "export " } else { "" };
        for enum_ref in enums {
            out.push_str(&format!(
                "{indent}{export}enum {} {{\n",
                self.identifier(&enum_ref.name)
            ));
            for (index, member) in enum_ref.members.iter().enumerate() {
                let comma = if index + 1 == enum_ref.members.len() {
                    ""
                } else {
                    ","
                };
                out.push_str(&format!(
                    "{indent}  {} = {}{comma}\n",
                    member.name, member.value
                ));
            }
            out.push_str(&format!("{indent}}}\n"));
        }
        for class in classes {
            let extends = match &class.base {
                Some(base_id) => format!(" extends {}", self.base_name(base_id, model, name)),
                None => String::new(),
            };
            out.push_str(&format!(
                "{indent}{export}interface {}{extends} {{\n",
                self.identifier(&class.name)
            ));
            for property in class.properties.iter().filter(|p| !p.ignored) {
                let readonly = if self.options.readonly { "readonly " } else { "" };
                let optional = if property.optional { "?" } else { "" };
                let spelling = match &property.constant {
                    Some(constant) => literal(constant),
                    None => self.format_type(&property.ty, model, name),
                };
                out.push_str(&format!(
                    "{indent}  {readonly}{}{optional}: {spelling};\n",
                    self.identifier(&property.name)
                ));
            }
            out.push_str(&format!("{indent}}}\n"));
        }
        if !top_level {
            out.push_str("}\n");
        }
    }

    fn format_type(&self, ty: &TypeRef, model: &Model, module: &str) -> String {
        if let Some(id) = host_id_of(ty) {
            if let Some(convertor) = self.convertors.get(id) {
                return convertor(ty);
            }
        }
        if let Some(formatter) = self.type_formatters.get(&TypeCategory::of(ty)) {
            let ctx = FormatContext {
                model,
                module,
                generator: self,
            };
            return formatter(ty, &ctx);
        }
        self.default_format(ty, model, module)
    }

    fn default_format(&self, ty: &TypeRef, model: &Model, module: &str) -> String {
        match ty {
            TypeRef::Primitive(kind) => primitive_spelling(*kind).to_string(),
            TypeRef::Enum(enum_ref) => {
                qualify(&enum_ref.module, &self.identifier(&enum_ref.name), module)
            }
            TypeRef::Collection(element) => {
                format!("{}[]", self.format_type(element, model, module))
            }
            TypeRef::Class(id) => match model.class(id) {
                Some(class) => qualify(&class.module, &self.identifier(&class.name), module),
                None => self.identifier(trailing_name(id)),
            },
            TypeRef::GenericParam(_) | TypeRef::Any => "any".to_string(),
        }
    }

    fn base_name(&self, base_id: &str, model: &Model, module: &str) -> String {
        match model.class(base_id) {
            Some(base) => qualify(&base.module, &self.identifier(&base.name), module),
            None => self.identifier(trailing_name(base_id)),
        }
    }

    fn identifier(&self, name: &str) -> String {
        match &self.identifier_formatter {
            Some(formatter) => formatter(name),
            None => name.to_string(),
        }
    }
}

/// Convenience wrapper: renders with default hooks and the given options.
pub fn generate_typescript(model: &Model, options: &TypeScriptOptions) -> String {
    TypeScriptGenerator::new(options.clone()).generate(model)
}

fn primitive_spelling(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Bool => "boolean",
        PrimitiveKind::String => "string",
        PrimitiveKind::Number => "number",
        PrimitiveKind::Date => "Date",
    }
}

fn literal(constant: &Constant) -> String {
    match constant {
        Constant::Str(value) => format!("{value:?}"),
        Constant::Int(value) => value.to_string(),
        Constant::Float(value) => value.to_string(),
        Constant::Bool(value) => value.to_string(),
    }
}

fn qualify(owner_module: &str, name: &str, current_module: &str) -> String {
    if owner_module == current_module || owner_module.is_empty() {
        name.to_string()
    } else {
        format!("{owner_module}.{name}")
    }
}

fn trailing_name(id: &str) -> &str {
    id.rsplit('.').next().unwrap_or(id)
}

fn host_id_of(ty: &TypeRef) -> Option<&str> {
    match ty {
        TypeRef::Class(id) => Some(id),
        TypeRef::Enum(enum_ref) => Some(&enum_ref.id),
        _ => None,
    }
}

/// Enums referenced by visible properties, grouped by the module each enum
/// is declared in; groups and members keep first-reference order.
fn referenced_enums(model: &Model) -> Vec<(String, Vec<EnumRef>)> {
    let mut groups: Vec<(String, Vec<EnumRef>)> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    for class in model.classes().iter().filter(|c| !c.ignored) {
        for property in class.properties.iter().filter(|p| !p.ignored) {
            collect_enums(&property.ty, &mut groups, &mut seen);
        }
    }
    groups
}

fn collect_enums(ty: &TypeRef, groups: &mut Vec<(String, Vec<EnumRef>)>, seen: &mut Vec<String>) {
    match ty {
        TypeRef::Enum(enum_ref) => {
            if seen.iter().any(|id| id == &enum_ref.id) {
                return;
            }
            seen.push(enum_ref.id.clone());
            match groups.iter_mut().find(|(module, _)| module == &enum_ref.module) {
                Some((_, list)) => list.push(enum_ref.clone()),
                None => groups.push((enum_ref.module.clone(), vec![enum_ref.clone()])),
            }
        }
        TypeRef::Collection(element) => collect_enums(element, groups, seen),
        _ => {}
    }
}

fn take_group(groups: &mut Vec<(String, Vec<EnumRef>)>, module: &str) -> Vec<EnumRef> {
    match groups.iter().position(|(name, _)| name == module) {
        Some(index) => groups.remove(index).1,
        None => Vec::new(),
    }
}
