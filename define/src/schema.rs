//! The contract an author-declared schema fulfills.
//!
//! Authors declare a schema object by embedding the [`Base`] marker as a
//! struct field and implementing [`Schema`]. The marker is the only
//! structural signal the extractor needs; everything else is read through
//! the trait when the synthesized program instantiates the declaration:
//!
//! ```
//! use stencil_define::{self as schema, FieldSpec};
//!
//! #[derive(Default)]
//! pub struct Pet {
//!     base: schema::Base,
//! }
//!
//! impl schema::Schema for Pet {
//!     fn fields(&self) -> Vec<FieldSpec> {
//!         vec![
//!             schema::field::string("Name").required(true),
//!             schema::field::int("Age"),
//!         ]
//!     }
//! }
//! ```
//!
//! Every defaulted method reads from [`ObjectDefaults`], the per-object
//! view of the run configuration. Overriding a method replaces the default
//! wholesale, which is how authors rename objects, suppress symbols, or
//! attach comments.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::RunConfig;
use crate::field::FieldSpec;

/// Marker embedded in author schema structs.
///
/// Zero-sized: it carries no state (run configuration travels through
/// [`ObjectDefaults`] instead). Its only job is to be structurally
/// recognizable by the extractor.
#[derive(Debug, Default, Clone, Copy)]
pub struct Base;

/// Predicate deciding whether a dotted symbol path is generated.
pub type SymbolPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// The per-object defaults a schema's trait methods fall back to.
///
/// Built fresh for every object in every run; schemas that don't override
/// anything inherit exactly this.
#[derive(Clone)]
pub struct ObjectDefaults {
    /// Object name; defaults to the declared struct name.
    pub name: String,
    /// Package (crate/module) the generated file belongs to.
    pub package: String,
    /// Builder type name.
    pub builder_name: String,
    /// Type returned by the builder's build method.
    pub builder_result_type: String,
    /// Prefix for key-name constants (the object name when key-name
    /// prefixing is enabled, empty otherwise).
    pub key_name_prefix: String,
    /// Whether builders are generated this run.
    pub with_builders: bool,
    /// Whether per-field presence methods are generated this run.
    pub with_has_methods: bool,
    /// Run-level symbol generation policy, when one is configured.
    pub symbol_filter: Option<SymbolPredicate>,
    /// Run-level symbol renames.
    pub symbol_renames: BTreeMap<String, String>,
}

impl ObjectDefaults {
    /// Derives the defaults for one declared object from the run
    /// configuration.
    pub fn for_object(declared_name: &str, package: &str, config: &RunConfig) -> Self {
        Self {
            name: declared_name.to_string(),
            package: package.to_string(),
            builder_name: format!("{declared_name}Builder"),
            builder_result_type: declared_name.to_string(),
            key_name_prefix: if config.with_key_name_prefix {
                declared_name.to_string()
            } else {
                String::new()
            },
            with_builders: config.with_builders,
            with_has_methods: config.with_has_methods,
            symbol_filter: None,
            symbol_renames: config.symbol_renames.clone(),
        }
    }

    /// Installs the run-level symbol generation predicate.
    pub fn with_symbol_filter(mut self, filter: SymbolPredicate) -> Self {
        self.symbol_filter = Some(filter);
        self
    }
}

impl fmt::Debug for ObjectDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDefaults")
            .field("name", &self.name)
            .field("package", &self.package)
            .field("builder_name", &self.builder_name)
            .field("builder_result_type", &self.builder_result_type)
            .field("key_name_prefix", &self.key_name_prefix)
            .field("with_builders", &self.with_builders)
            .field("with_has_methods", &self.with_has_methods)
            .field("symbol_filter", &self.symbol_filter.is_some())
            .field("symbol_renames", &self.symbol_renames)
            .finish()
    }
}

/// The contract a declared schema object fulfills.
///
/// Only [`Schema::fields`] usually needs writing; every other method has a
/// default derived from the run configuration.
pub trait Schema {
    /// The fields of the generated object, in declaration order.
    ///
    /// The driver re-sorts this list by field name before rendering, so
    /// declaration order never leaks into generated output.
    fn fields(&self) -> Vec<FieldSpec> {
        Vec::new()
    }

    /// The generated object's name.
    fn name(&self, defaults: &ObjectDefaults) -> String {
        defaults.name.clone()
    }

    /// The package the generated file belongs to.
    fn package(&self, defaults: &ObjectDefaults) -> String {
        defaults.package.clone()
    }

    /// Documentation comment for the generated object. Should not repeat
    /// the object name; rendering prepends it.
    fn comment(&self) -> String {
        String::new()
    }

    /// Prefix for this object's key-name constants.
    fn key_name_prefix(&self, defaults: &ObjectDefaults) -> String {
        defaults.key_name_prefix.clone()
    }

    /// The key-name string for one field: prefix + field name + `Key`.
    fn key_name(&self, defaults: &ObjectDefaults, field_name: &str) -> String {
        format!("{}{}Key", self.key_name_prefix(defaults), field_name)
    }

    /// The builder type's name.
    fn builder_name(&self, defaults: &ObjectDefaults) -> String {
        defaults.builder_name.clone()
    }

    /// The type the builder's build method returns.
    fn builder_result_type(&self, defaults: &ObjectDefaults) -> String {
        defaults.builder_result_type.clone()
    }

    /// File base name override for the per-object artifact. `None` means
    /// the snake_case form of the declared name is used.
    fn filename_base(&self) -> Option<String> {
        None
    }

    /// Extra `use` lines for the generated file.
    fn imports(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether a dotted symbol path (e.g. `object.method.set`) is
    /// generated. The default consults the run-level exclusion policy;
    /// overriding this replaces that policy for the object.
    fn generate_symbol(&self, defaults: &ObjectDefaults, symbol: &str) -> bool {
        match &defaults.symbol_filter {
            Some(filter) => filter(symbol),
            None => true,
        }
    }

    /// The emitted name for a dotted symbol path. The default consults the
    /// run-level rename table and falls back to the path's last segment.
    fn symbol_name(&self, defaults: &ObjectDefaults, symbol: &str) -> String {
        if let Some(renamed) = defaults.symbol_renames.get(symbol) {
            return renamed.clone();
        }
        match symbol.rsplit_once('.') {
            Some((_, last)) => last.to_string(),
            None => symbol.to_string(),
        }
    }
}
