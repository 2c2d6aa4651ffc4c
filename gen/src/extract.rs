//! Syntactic discovery of schema declarations.
//!
//! The extractor scans one directory of Rust sources for structs that
//! embed the `stencil_define::Base` marker as a field. The scan is purely
//! syntactic: nothing is type-checked or instantiated, and only the struct
//! names are recorded - the synthesized program later instantiates the
//! real declarations to read their field lists.
//!
//! Import aliasing is honored per file: `use stencil_define as sd;` makes
//! `sd::Base` match, and `use stencil_define::Base as Marker;` makes a
//! bare `Marker` field match.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use syn::{Fields, Item, Type, UseTree};

use crate::errors::GeneratorError;

/// Crate whose `Base` marker identifies a schema declaration.
const MARKER_CRATE: &str = "stencil_define";

/// Name of the marker type inside the marker crate.
const MARKER_TYPE: &str = "Base";

/// A schema declaration found by the extractor. Name only; everything
/// else is read later from the live declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredSchema {
    /// The declared struct name.
    pub name: String,
}

/// Scans every `*.rs` file directly inside `dir` for schema declarations.
///
/// Returns declarations sorted by name for deterministic downstream
/// ordering.
///
/// ## Errors
///
/// A syntax error in any file aborts the scan with the parser diagnostic;
/// the run cannot proceed on a directory that does not parse.
pub fn extract_dir(dir: &Path) -> Result<Vec<DeclaredSchema>, GeneratorError> {
    let entries = fs::read_dir(dir).map_err(|e| GeneratorError::Read {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut names = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| GeneratorError::Read {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("rs") {
            continue;
        }
        let source = fs::read_to_string(&path).map_err(|e| GeneratorError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        for schema in extract_source(&source).map_err(|message| GeneratorError::Parse {
            path: path.display().to_string(),
            message,
        })? {
            names.insert(schema.name);
        }
    }

    Ok(names
        .into_iter()
        .map(|name| DeclaredSchema { name })
        .collect())
}

/// Scans one source text for schema declarations.
///
/// Exposed separately so the scan logic is testable without a filesystem.
pub fn extract_source(source: &str) -> Result<Vec<DeclaredSchema>, String> {
    let file = syn::parse_file(source).map_err(|e| e.to_string())?;

    let mut aliases = MarkerAliases::default();
    for item in &file.items {
        if let Item::Use(use_item) = item {
            aliases.collect(&use_item.tree, Vec::new());
        }
    }

    let mut schemas = Vec::new();
    collect_structs(&file.items, &aliases, &mut schemas);
    Ok(schemas)
}

/// The ways the marker type can be spelled in one file.
#[derive(Debug, Default)]
struct MarkerAliases {
    /// Local names bound to the marker crate (`use stencil_define as sd`).
    crate_names: BTreeSet<String>,
    /// Local names bound directly to the marker type
    /// (`use stencil_define::Base as Marker`).
    type_names: BTreeSet<String>,
}

impl MarkerAliases {
    fn collect(&mut self, tree: &UseTree, mut prefix: Vec<String>) {
        match tree {
            UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.collect(&path.tree, prefix);
            }
            UseTree::Name(name) => {
                let ident = name.ident.to_string();
                if prefix.is_empty() && ident == MARKER_CRATE {
                    self.crate_names.insert(ident);
                } else if prefix.first().map(String::as_str) == Some(MARKER_CRATE)
                    && ident == MARKER_TYPE
                {
                    self.type_names.insert(ident);
                }
            }
            UseTree::Rename(rename) => {
                let ident = rename.ident.to_string();
                let local = rename.rename.to_string();
                if prefix.is_empty() && ident == MARKER_CRATE {
                    self.crate_names.insert(local);
                } else if prefix.first().map(String::as_str) == Some(MARKER_CRATE)
                    && ident == MARKER_TYPE
                {
                    self.type_names.insert(local);
                }
            }
            UseTree::Glob(_) => {
                // A glob import of the marker crate makes a bare `Base`
                // plausible; accept it.
                if prefix.first().map(String::as_str) == Some(MARKER_CRATE) {
                    self.type_names.insert(MARKER_TYPE.to_string());
                }
            }
            UseTree::Group(group) => {
                for item in &group.items {
                    self.collect(item, prefix.clone());
                }
            }
        }
    }

    /// Whether a field type path names the marker.
    fn matches(&self, ty: &Type) -> bool {
        let Type::Path(type_path) = ty else {
            return false;
        };
        if type_path.qself.is_some() {
            return false;
        }
        let segments: Vec<String> = type_path
            .path
            .segments
            .iter()
            .map(|s| s.ident.to_string())
            .collect();
        match segments.as_slice() {
            // Fully qualified: stencil_define::Base, or through an alias
            [crate_name, type_name] => {
                type_name == MARKER_TYPE
                    && (crate_name == MARKER_CRATE || self.crate_names.contains(crate_name))
            }
            // Bare name imported from the marker crate
            [type_name] => self.type_names.contains(type_name),
            _ => false,
        }
    }
}

/// Walks items (recursing into inline modules) recording marker-embedding
/// structs.
fn collect_structs(items: &[Item], aliases: &MarkerAliases, out: &mut Vec<DeclaredSchema>) {
    for item in items {
        match item {
            Item::Struct(item_struct) => {
                let embeds_marker = match &item_struct.fields {
                    Fields::Named(named) => {
                        named.named.iter().any(|field| aliases.matches(&field.ty))
                    }
                    _ => false,
                };
                if embeds_marker {
                    out.push(DeclaredSchema {
                        name: item_struct.ident.to_string(),
                    });
                }
            }
            Item::Mod(item_mod) => {
                if let Some((_, items)) = &item_mod.content {
                    collect_structs(items, aliases, out);
                }
            }
            _ => {}
        }
    }
}
