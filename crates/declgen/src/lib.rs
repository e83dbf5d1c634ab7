//! TypeScript declaration generation from object-model type graphs.
//!
//! `declgen` turns the type definitions of a host object model (classes,
//! properties, base types, enums, generics, collections) into TypeScript
//! declaration text, so client-side types stay structurally consistent with
//! server-side data models without hand-maintained duplication.
//!
//! # Architecture
//!
//! ```text
//! Host descriptors          Model                 Output
//! ────────────────      ─────────────────     ───────────────────
//! TypeSource impl  ──>  ModelBuilder      ──> TypeScript declarations
//! (Catalog, or a        (reachability         (generator + formatter/
//!  platform adapter)     closure, visitors)    convertor hooks)
//! ```
//!
//! The builder computes the closed, de-duplicated graph of classes reachable
//! from the requested roots, following base-type chains and property
//! references. Visitors can inspect or mutate the graph before the generator
//! renders it into `declare module` blocks.
//!
//! # Example
//!
//! ```
//! use declgen::{
//!     generate_typescript, Catalog, HostType, MemberDecl, ModelBuilder, TypeDecl,
//!     TypeScriptOptions,
//! };
//!
//! let mut catalog = Catalog::new();
//! catalog.insert(TypeDecl::class(
//!     "Shop.Address",
//!     vec![
//!         MemberDecl::property("Street", HostType::string()),
//!         MemberDecl::property("Town", HostType::string()),
//!     ],
//! ));
//! catalog.insert(TypeDecl::class(
//!     "Shop.Customer",
//!     vec![
//!         MemberDecl::property("Name", HostType::string()),
//!         MemberDecl::property("Home", HostType::named("Shop.Address")),
//!     ],
//! ));
//!
//! let mut builder = ModelBuilder::new(&catalog);
//! builder.add(&HostType::named("Shop.Customer")).unwrap();
//! let model = builder.build();
//!
//! let output = generate_typescript(&model, &TypeScriptOptions::default());
//! assert!(output.contains("declare module Shop {"));
//! assert!(output.contains("Home: Address;"));
//! ```

pub mod builder;
pub mod fluent;
pub mod model;
pub mod output;
pub mod reflect;
pub mod visit;

pub use builder::{ModelBuilder, ModelError, TypeFamily, classify};
pub use fluent::{Declarations, declarations};
pub use model::{ClassDef, EnumMember, EnumRef, Model, Module, PrimitiveKind, Property, TypeRef};
pub use output::typescript::{
    FormatContext, TypeCategory, TypeScriptGenerator, TypeScriptOptions, generate_typescript,
};
pub use reflect::{
    Catalog, ClassDecl, Constant, DeclKind, EnumDecl, EnumMemberDecl, HostType, MemberDecl,
    ScalarKind, TypeDecl, TypeSource,
};
pub use visit::ModelVisitor;
