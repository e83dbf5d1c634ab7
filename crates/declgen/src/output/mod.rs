//! Output backends.
//!
//! A backend takes a resolved [`Model`](crate::model::Model) and produces
//! declaration text.

pub mod typescript;

pub use typescript::{
    FormatContext, TypeCategory, TypeScriptGenerator, TypeScriptOptions, generate_typescript,
};
