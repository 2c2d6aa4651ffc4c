//! Layered template engine.
//!
//! A [`TemplateSet`] mounts sources into one namespace: the built-in
//! source (native `quote`-based render functions) first, then any number
//! of user directories. Directories contribute text blocks: a file
//! `<name>.tmpl` defines the block `<name>` (relative path, `/`
//! separators). A block defined by a later mount completely replaces an
//! earlier block of the same name - there is no merging.
//!
//! Block classes:
//!
//! - core blocks (`object/header`, `object/struct`, `object/builder`,
//!   `object/footer`) are always rendered; rendering one that does not
//!   exist is an error
//! - hook blocks (`ext/...`) render only when defined; rendering an
//!   undefined hook is a silent no-op
//! - artifact blocks (names carrying a file extension, e.g.
//!   `object/$object.rs`, `run/mod.rs`) are rendered to output files
//!
//! Text blocks are interpolated against the serialized rendering context:
//! `{{ dotted.path }}` substitutes a scalar from the context and
//! `{{ render "block/name" }}` splices another block's output. The
//! interpolated text must parse as Rust tokens; it then flows through the
//! same validation and formatting as native output.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use proc_macro2::TokenStream;
use serde_json::Value;

use crate::errors::GeneratorError;
use crate::model::{ObjectModel, RunContext};

/// Prefix of hook blocks: undefined hooks render as empty output.
pub const HOOK_PREFIX: &str = "ext/";

/// Suffix a template file must carry to define a block.
pub const TEMPLATE_SUFFIX: &str = ".tmpl";

/// The data a block renders against.
#[derive(Debug, Clone, Copy)]
pub enum BlockContext<'a> {
    /// A per-object block: one declared object.
    Object(&'a ObjectModel),
    /// A per-run block: every object plus the package name.
    Run(&'a RunContext),
}

impl<'a> BlockContext<'a> {
    /// The object model, for blocks that only make sense per object.
    pub fn object(&self) -> Result<&'a ObjectModel, GeneratorError> {
        match *self {
            Self::Object(model) => Ok(model),
            Self::Run(_) => Err(GeneratorError::CodeGen(
                "per-object block rendered with a per-run context".to_string(),
            )),
        }
    }

    /// The run context, for blocks that render once per run.
    pub fn run(&self) -> Result<&'a RunContext, GeneratorError> {
        match *self {
            Self::Run(run) => Ok(run),
            Self::Object(_) => Err(GeneratorError::CodeGen(
                "per-run block rendered with a per-object context".to_string(),
            )),
        }
    }

    /// The context as a JSON value, for dotted-path interpolation.
    pub fn to_value(&self) -> Result<Value, GeneratorError> {
        let value = match self {
            Self::Object(model) => serde_json::to_value(model)?,
            Self::Run(run) => serde_json::to_value(run)?,
        };
        Ok(value)
    }
}

/// A native (built-in) block implementation.
pub type NativeBlock = fn(&Engine, &BlockContext) -> Result<TokenStream, GeneratorError>;

/// A block body: built-in function or user-supplied template text.
#[derive(Clone)]
pub enum BlockBody {
    /// Built-in render function.
    Native(NativeBlock),
    /// Template text loaded from a mounted directory.
    Text(String),
}

/// One mounted template source.
#[derive(Debug, Clone)]
enum Source {
    /// The built-in block set.
    Builtin,
    /// A user directory of `*.tmpl` files.
    Dir(PathBuf),
}

/// An ordered set of template sources. Later mounts override earlier
/// ones block-by-block.
#[derive(Debug)]
pub struct TemplateSet {
    sources: Vec<Source>,
}

impl TemplateSet {
    /// A set with the built-in source mounted first.
    pub fn new() -> Self {
        Self {
            sources: vec![Source::Builtin],
        }
    }

    /// Mounts a user template directory after everything mounted so far.
    pub fn mount_dir(&mut self, dir: impl Into<PathBuf>) {
        self.sources.push(Source::Dir(dir.into()));
    }

    /// Loads every source and resolves overrides into an [`Engine`].
    pub fn build(&self) -> Result<Engine, GeneratorError> {
        let mut blocks = BTreeMap::new();
        for source in &self.sources {
            match source {
                Source::Builtin => {
                    for (name, body) in crate::blocks::builtin() {
                        blocks.insert(name, body);
                    }
                }
                Source::Dir(dir) => {
                    for (name, text) in load_dir(dir)? {
                        blocks.insert(name, BlockBody::Text(text));
                    }
                }
            }
        }
        Ok(Engine { blocks })
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects `(block name, template text)` pairs under one directory.
fn load_dir(dir: &Path) -> Result<Vec<(String, String)>, GeneratorError> {
    let mut found = Vec::new();
    walk(dir, Path::new(""), &mut found)?;
    found.sort();
    Ok(found)
}

fn walk(
    root: &Path,
    rel: &Path,
    out: &mut Vec<(String, String)>,
) -> Result<(), GeneratorError> {
    let dir = root.join(rel);
    let entries = fs::read_dir(&dir).map_err(|e| GeneratorError::Read {
        path: dir.display().to_string(),
        source: e,
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| GeneratorError::Read {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        let rel_child = rel.join(entry.file_name());
        if path.is_dir() {
            walk(root, &rel_child, out)?;
            continue;
        }
        let Some(rel_str) = rel_child.to_str() else {
            continue;
        };
        let rel_str = rel_str.replace('\\', "/");
        if let Some(name) = rel_str.strip_suffix(TEMPLATE_SUFFIX) {
            let text = fs::read_to_string(&path).map_err(|e| GeneratorError::Read {
                path: path.display().to_string(),
                source: e,
            })?;
            out.push((name.to_string(), text));
        }
    }
    Ok(())
}

/// The resolved block namespace for one run.
pub struct Engine {
    blocks: BTreeMap<String, BlockBody>,
}

impl Engine {
    /// Whether a block of this name is defined by any mounted source.
    pub fn has_block(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    /// Renders a block by name.
    ///
    /// Undefined hook blocks (`ext/...`) yield empty output; an undefined
    /// block of any other class is an error.
    pub fn render(&self, name: &str, cx: &BlockContext) -> Result<TokenStream, GeneratorError> {
        match self.blocks.get(name) {
            Some(BlockBody::Native(f)) => f(self, cx),
            Some(BlockBody::Text(text)) => {
                let rendered = self.interpolate(name, text, cx)?;
                rendered
                    .parse::<TokenStream>()
                    .map_err(|e| GeneratorError::BlockRender {
                        block: name.to_string(),
                        message: format!("output is not valid Rust tokens: {e}"),
                    })
            }
            None if name.starts_with(HOOK_PREFIX) => Ok(TokenStream::new()),
            None => Err(GeneratorError::UnknownBlock(name.to_string())),
        }
    }

    /// Renders a small inline template against the context and returns it
    /// as documentation-comment lines (leading space included, ready for
    /// `#[doc = ...]` attributes).
    pub fn comment(
        &self,
        origin: &str,
        template: &str,
        cx: &BlockContext,
    ) -> Result<Vec<String>, GeneratorError> {
        if template.is_empty() {
            return Ok(Vec::new());
        }
        let rendered = self.interpolate(origin, template, cx)?;
        Ok(rendered.lines().map(|line| format!(" {line}")).collect())
    }

    /// The artifact blocks (names carrying a file extension), sorted.
    pub fn artifact_names(&self) -> Vec<String> {
        self.blocks
            .keys()
            .filter(|name| {
                let last = name.rsplit('/').next().unwrap_or(name);
                last.contains('.')
            })
            .cloned()
            .collect()
    }

    /// Substitutes `{{ ... }}` tags in template text.
    fn interpolate(
        &self,
        origin: &str,
        template: &str,
        cx: &BlockContext,
    ) -> Result<String, GeneratorError> {
        let data = cx.to_value()?;
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or_else(|| GeneratorError::BlockRender {
                block: origin.to_string(),
                message: "unclosed `{{` tag".to_string(),
            })?;
            let expr = after[..end].trim();
            if let Some(target) = expr.strip_prefix("render ") {
                let target = target.trim().trim_matches('"');
                let tokens = self.render(target, cx)?;
                out.push_str(&tokens.to_string());
            } else {
                let value =
                    lookup(&data, expr).ok_or_else(|| GeneratorError::BlockRender {
                        block: origin.to_string(),
                        message: format!("unknown context path `{expr}`"),
                    })?;
                out.push_str(&scalar_text(origin, expr, value)?);
            }
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Resolves a dotted path (array steps by numeric index) in a JSON value.
fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = data;
    for step in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(step)?,
            Value::Array(items) => items.get(step.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Renders a scalar context value as substitution text.
fn scalar_text(origin: &str, path: &str, value: &Value) -> Result<String, GeneratorError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(GeneratorError::BlockRender {
            block: origin.to_string(),
            message: format!("context path `{path}` is not a scalar"),
        }),
    }
}
