//! Field declarations.
//!
//! A [`FieldSpec`] binds a declared name to a [`TypeSpec`] plus its wire
//! mapping and flags. Declaration mistakes (an invalid name) are author
//! errors and panic immediately rather than surfacing later as values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::Variable;
use crate::naming;
use crate::types::{self, TypeSpec};

/// A named field belonging to a schema.
///
/// Declared names are CamelCase; the wire key and storage identifier are
/// derived from the name unless overridden.
///
/// ## Examples
///
/// ```
/// use stencil_define::field;
///
/// let f = field::string("CreatedAt").required(true);
/// assert_eq!(f.wire_key(), "createdAt");
/// assert_eq!(f.storage_ident(), "created_at");
/// assert_eq!(f.key_name(""), "CreatedAtKey");
/// assert_eq!(f.key_name("Thing"), "ThingCreatedAtKey");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    name: String,
    spec: TypeSpec,
    wire_key: Option<String>,
    storage_ident: Option<String>,
    required: bool,
    extension: bool,
    constant: Option<String>,
    comment: String,
    extras: BTreeMap<String, Variable>,
}

impl FieldSpec {
    /// Declares a field.
    ///
    /// ## Panics
    ///
    /// Panics when `name` is not a valid declared name (non-empty, leading
    /// ASCII uppercase). This is a schema-authoring mistake, detected at
    /// the moment of declaration.
    pub fn new(name: impl Into<String>, spec: TypeSpec) -> Self {
        let name = name.into();
        if !naming::is_declared_name(&name) {
            panic!("field names must be CamelCase identifiers (`{name}` is invalid)");
        }
        Self {
            name,
            spec,
            wire_key: None,
            storage_ident: None,
            required: false,
            extension: false,
            constant: None,
            comment: String::new(),
            extras: BTreeMap::new(),
        }
    }

    /// Marks the field as required for builder validation.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Overrides the wire key (defaults to the lowerCamel form of the
    /// declared name).
    pub fn wire(mut self, key: impl Into<String>) -> Self {
        self.wire_key = Some(key.into());
        self
    }

    /// Overrides the storage identifier (defaults to the snake_case form
    /// of the declared name).
    pub fn storage(mut self, ident: impl Into<String>) -> Self {
        self.storage_ident = Some(ident.into());
        self
    }

    /// Declares the field as an extension: present in the generated struct
    /// but excluded from the wire format and from the generic
    /// get/set/keys surface entirely. Extension fields are author-managed.
    pub fn extension(mut self, extension: bool) -> Self {
        self.extension = extension;
        self
    }

    /// Fixes the field to a constant value.
    ///
    /// The argument is a Rust expression of the field's apparent type
    /// (e.g. `String::from("thing")`). Generic set on a constant field is
    /// a silent no-op and the field always reads as this value.
    pub fn constant_value(mut self, expr: impl Into<String>) -> Self {
        self.constant = Some(expr.into());
        self
    }

    /// Attaches a documentation comment to the generated accessors.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Attaches an arbitrary key/typed-value pair visible to templates.
    pub fn extra(mut self, name: impl Into<String>, value: Variable) -> Self {
        self.extras.insert(name.into(), value);
        self
    }

    /// The declared (CamelCase) name.
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// The field's type description.
    pub fn get_spec(&self) -> &TypeSpec {
        &self.spec
    }

    /// The wire key; derived from the name unless overridden.
    pub fn wire_key(&self) -> String {
        match &self.wire_key {
            Some(key) => key.clone(),
            None => naming::lower_camel(&self.name),
        }
    }

    /// The storage identifier; derived from the name unless overridden.
    pub fn storage_ident(&self) -> String {
        match &self.storage_ident {
            Some(ident) => ident.clone(),
            None => naming::snake_case(&self.name),
        }
    }

    /// The key-name string for this field: `<prefix><Name>Key`.
    ///
    /// The emitted constant symbol is the SCREAMING_SNAKE conversion of
    /// this string; the string itself is the stable contract.
    pub fn key_name(&self, prefix: &str) -> String {
        format!("{prefix}{}Key", self.name)
    }

    pub fn get_required(&self) -> bool {
        self.required
    }

    pub fn is_extension(&self) -> bool {
        self.extension
    }

    pub fn is_constant(&self) -> bool {
        self.constant.is_some()
    }

    /// The constant-value expression, when the field is constant.
    pub fn get_constant(&self) -> Option<&str> {
        self.constant.as_deref()
    }

    pub fn get_comment(&self) -> &str {
        &self.comment
    }

    pub fn get_extras(&self) -> &BTreeMap<String, Variable> {
        &self.extras
    }
}

/// Declares a string field.
pub fn string(name: impl Into<String>) -> FieldSpec {
    FieldSpec::new(name, types::string())
}

/// Declares a 64-bit integer field.
pub fn int(name: impl Into<String>) -> FieldSpec {
    FieldSpec::new(name, types::int())
}

/// Declares a 64-bit float field.
pub fn float(name: impl Into<String>) -> FieldSpec {
    FieldSpec::new(name, types::float())
}

/// Declares a boolean field.
pub fn boolean(name: impl Into<String>) -> FieldSpec {
    FieldSpec::new(name, types::boolean())
}

/// Declares a string-list field.
pub fn string_list(name: impl Into<String>) -> FieldSpec {
    FieldSpec::new(name, types::string_list())
}

/// Declares a byte-sequence field (base64 on the wire).
pub fn byte_slice(name: impl Into<String>) -> FieldSpec {
    FieldSpec::new(name, types::byte_slice_type())
}
