//! Schema description model for stencil code generation.
//!
//! This crate is what schema authors write against. A schema is an
//! ordinary struct embedding the [`Base`] marker plus a [`Schema`] impl
//! listing its fields; the generator finds the marker syntactically,
//! instantiates the declaration inside a synthesized program, and renders
//! code from what the trait reports.
//!
//! ## Layers
//!
//! - [`types`] - [`TypeSpec`]: storage vs apparent types, conversion
//!   capabilities, zero values
//! - [`field`] - [`FieldSpec`]: named fields with wire mapping and flags
//! - [`schema`] - the [`Schema`] trait, the [`Base`] marker and per-object
//!   [`ObjectDefaults`]
//! - [`config`] - the typed [`RunConfig`] threaded through a generation
//!   run

pub mod config;
pub mod field;
pub mod naming;
pub mod schema;
pub mod types;

pub use config::{ConfigError, RunConfig, Variable};
pub use field::FieldSpec;
pub use schema::{Base, ObjectDefaults, Schema, SymbolPredicate};
pub use types::{Describe, InitStyle, TypeSpec, UNKNOWN_ELEMENT};

/// Convenient imports for schema declaration files.
pub mod prelude {
    pub use crate::field::{self, FieldSpec};
    pub use crate::schema::{Base, ObjectDefaults, Schema};
    pub use crate::types::{self, InitStyle, TypeSpec};
}
