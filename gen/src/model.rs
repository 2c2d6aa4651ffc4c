//! Fully-resolved rendering contexts.
//!
//! A [`Schema`] implementation is live trait-object behavior; templates
//! need plain, serializable data. The driver resolves every schema into an
//! [`ObjectModel`] - names finalized, field list sorted, key constants and
//! symbol policy precomputed - and hands that to the template engine. Text
//! templates address the same data by dotted path through its serde
//! representation.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;
use stencil_define::schema::SymbolPredicate;
use stencil_define::{FieldSpec, ObjectDefaults, RunConfig, Schema, Variable, naming};

use crate::errors::GeneratorError;

/// One field, with every derived name and type string materialized.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedField {
    /// Declared (CamelCase) name.
    pub name: String,
    /// Generated struct field identifier.
    pub storage_ident: String,
    /// JSON key on the wire.
    pub wire_key: String,
    /// Key-name string (`ThingNameKey`).
    pub key_name: String,
    /// Emitted constant symbol (`THING_NAME_KEY`).
    pub key_const: String,
    /// Storage type as stored (`String`).
    pub raw_type: String,
    /// Storage type as declared in the struct (`Option<String>`).
    pub storage_type: String,
    /// Apparent type seen through accessors.
    pub apparent_type: String,
    /// Element type for sequence storage, or the unknown sentinel.
    pub element: String,
    /// Zero-value literal for the typed accessor.
    pub zero_value: String,
    /// Acceptor capability method, when declared.
    pub accept_method: Option<String>,
    /// Producer capability method, when declared.
    pub produce_method: Option<String>,
    /// Builder setter takes an iterator of elements.
    pub sequence_style: bool,
    /// Storage supports a length query.
    pub supports_len: bool,
    /// Required for builder validation.
    pub required: bool,
    /// Excluded from the wire and the generic surface.
    pub extension: bool,
    /// Constant-value expression, when the field is fixed.
    pub constant: Option<String>,
    /// Documentation comment.
    pub comment: String,
    /// Author-attached template variables.
    pub extras: BTreeMap<String, Variable>,
}

impl ResolvedField {
    fn resolve(field: &FieldSpec, key_prefix: &str) -> Self {
        let key_name = field.key_name(key_prefix);
        let spec = field.get_spec();
        Self {
            name: field.get_name().to_string(),
            storage_ident: field.storage_ident(),
            wire_key: field.wire_key(),
            key_const: naming::screaming_snake(&key_name),
            key_name,
            raw_type: spec.get_name().to_string(),
            storage_type: spec.storage_type(),
            apparent_type: spec.get_apparent().to_string(),
            element: spec.get_element().to_string(),
            zero_value: spec.get_zero_value().to_string(),
            accept_method: spec.get_accept_method().map(str::to_string),
            produce_method: spec.get_produce_method().map(str::to_string),
            sequence_style: spec.sequence_style(),
            supports_len: spec.get_supports_len(),
            required: field.get_required(),
            extension: field.is_extension(),
            constant: field.get_constant().map(str::to_string),
            comment: field.get_comment().to_string(),
            extras: field.get_extras().clone(),
        }
    }
}

/// Outcome of the symbol policy for one dotted symbol path.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolDecision {
    /// Whether the symbol is generated at all.
    pub generate: bool,
    /// The identifier it is emitted under.
    pub ident: String,
}

/// A declared object, fully resolved for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectModel {
    /// Generated object name.
    pub name: String,
    /// Package the generated file belongs to.
    pub package: String,
    /// Object documentation comment.
    pub comment: String,
    /// Builder type name.
    pub builder_name: String,
    /// Type returned by the builder's build method.
    pub builder_result_type: String,
    /// Prefix applied to key-name constants.
    pub key_name_prefix: String,
    /// Base of the per-object artifact filename (before the marker).
    pub file_base: String,
    /// Extra `use` lines for the generated file.
    pub imports: Vec<String>,
    /// Fields, sorted by declared name.
    pub fields: Vec<ResolvedField>,
    /// Whether a builder is rendered for this object.
    pub with_builders: bool,
    /// Whether per-field presence methods are rendered.
    pub with_has_methods: bool,
    /// Run-level template variables.
    pub variables: BTreeMap<String, Variable>,
    /// Precomputed symbol policy, keyed by dotted symbol path.
    pub symbols: BTreeMap<String, SymbolDecision>,
}

/// Fixed (non-per-field) symbols every object model carries.
const OBJECT_SYMBOLS: &[&str] = &[
    "object.method.get",
    "object.method.set",
    "object.method.has",
    "object.method.remove",
    "object.method.keys",
    "object.method.to_json",
    "object.method.from_json",
];

const BUILDER_SYMBOLS: &[&str] = &[
    "builder.method.set",
    "builder.method.build",
    "builder.method.must_build",
];

impl ObjectModel {
    /// Resolves one declared schema against its per-object defaults.
    ///
    /// The field list is sorted by declared field name so key-constant
    /// ordering is deterministic regardless of declaration order.
    /// Wire-key collisions between non-extension fields are rejected here,
    /// before any rendering starts.
    pub fn resolve(
        declared_name: &str,
        schema: &dyn Schema,
        defaults: &ObjectDefaults,
        config: &RunConfig,
    ) -> Result<Self, GeneratorError> {
        let name = schema.name(defaults);
        let prefix = schema.key_name_prefix(defaults);

        let mut fields = schema.fields();
        fields.sort_by(|a, b| a.get_name().cmp(b.get_name()));
        let fields: Vec<ResolvedField> = fields
            .iter()
            .map(|f| ResolvedField::resolve(f, &prefix))
            .collect();

        let mut seen = BTreeMap::new();
        for field in fields.iter().filter(|f| !f.extension) {
            if seen.insert(field.wire_key.clone(), ()).is_some() {
                return Err(GeneratorError::DuplicateWireKey {
                    object: name.clone(),
                    key: field.wire_key.clone(),
                });
            }
        }

        let mut symbols = BTreeMap::new();
        for symbol in OBJECT_SYMBOLS.iter().chain(BUILDER_SYMBOLS) {
            symbols.insert(
                symbol.to_string(),
                SymbolDecision {
                    generate: schema.generate_symbol(defaults, symbol),
                    ident: schema.symbol_name(defaults, symbol),
                },
            );
        }
        for field in fields.iter().filter(|f| !f.extension) {
            for (template, default_ident) in [
                (
                    format!("object.accessor.{}", field.name),
                    naming::snake_case(&field.name),
                ),
                (
                    format!("object.has.{}", field.name),
                    format!("has_{}", naming::snake_case(&field.name)),
                ),
                (
                    format!("builder.method.{}", field.name),
                    naming::snake_case(&field.name),
                ),
            ] {
                let named = schema.symbol_name(defaults, &template);
                // symbol_name falls back to the path's last segment (the
                // declared field name); the rendered identifier for that
                // default is derived from the field name instead
                let ident = if named == field.name {
                    default_ident
                } else {
                    named
                };
                symbols.insert(
                    template.clone(),
                    SymbolDecision {
                        generate: schema.generate_symbol(defaults, &template),
                        ident,
                    },
                );
            }
        }

        Ok(Self {
            comment: schema.comment(),
            builder_name: schema.builder_name(defaults),
            builder_result_type: schema.builder_result_type(defaults),
            key_name_prefix: prefix,
            file_base: schema
                .filename_base()
                .unwrap_or_else(|| naming::snake_case(declared_name)),
            imports: schema.imports(),
            package: schema.package(defaults),
            fields,
            with_builders: defaults.with_builders,
            with_has_methods: defaults.with_has_methods,
            variables: config.variables.clone(),
            symbols,
            name,
        })
    }

    /// Whether a dotted symbol path should be generated. Unknown paths
    /// default to generated.
    pub fn generate(&self, symbol: &str) -> bool {
        self.symbols.get(symbol).is_none_or(|d| d.generate)
    }

    /// The identifier a dotted symbol path is emitted under.
    pub fn symbol_ident(&self, symbol: &str) -> String {
        match self.symbols.get(symbol) {
            Some(decision) => decision.ident.clone(),
            None => match symbol.rsplit_once('.') {
                Some((_, last)) => last.to_string(),
                None => symbol.to_string(),
            },
        }
    }

    /// Looks up a field by declared name.
    pub fn field_by_name(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The fields participating in the wire format and generic surface.
    pub fn wire_fields(&self) -> impl Iterator<Item = &ResolvedField> {
        self.fields.iter().filter(|f| !f.extension)
    }

    /// The extension fields (struct storage only, author-managed).
    pub fn extension_fields(&self) -> impl Iterator<Item = &ResolvedField> {
        self.fields.iter().filter(|f| f.extension)
    }
}

/// The whole-run rendering context for `run/` templates.
#[derive(Debug, Clone, Serialize)]
pub struct RunContext {
    /// The resolved package name.
    pub package: String,
    /// Every object model in the run, in rendering order.
    pub objects: Vec<ObjectModel>,
    /// Run-level template variables.
    pub variables: BTreeMap<String, Variable>,
}

/// Compiles the run-level symbol exclusion patterns into one predicate.
///
/// Returns `None` when no patterns are configured, so schemas fall back to
/// generate-everything.
pub fn compile_symbol_filter(
    patterns: &[String],
) -> Result<Option<SymbolPredicate>, GeneratorError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut compiled = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        compiled.push(Regex::new(pattern).map_err(|e| {
            GeneratorError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            }
        })?);
    }
    Ok(Some(std::sync::Arc::new(move |symbol: &str| {
        !compiled.iter().any(|re| re.is_match(symbol))
    })))
}
