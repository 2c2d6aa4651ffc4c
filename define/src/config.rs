//! Typed run configuration.
//!
//! One [`RunConfig`] value describes a whole generation run. It is built
//! from command-level switches, serialized to JSON, and handed to the
//! synthesized program, which threads it (as per-object
//! [`crate::schema::ObjectDefaults`]) through every call that needs it.
//! There is no global state.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Problems with run-configuration input.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A `--var` argument did not look like `name=value[:type]`.
    #[error("invalid variable declaration `{0}` (expected name=value[:type])")]
    InvalidVariable(String),

    /// A `--var` value did not parse as its declared type.
    #[error("cannot parse `{value}` as {ty} for variable `{name}`")]
    InvalidVariableValue {
        name: String,
        value: String,
        ty: String,
    },

    /// A `--rename-symbol` argument did not look like `symbol=NewName`.
    #[error("invalid symbol rename `{0}` (expected symbol=NewName)")]
    InvalidRename(String),
}

/// A typed variable value made available to templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variable {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Variable {
    /// Parses a `name=value[:type]` assignment as accepted by `--var`.
    ///
    /// The type suffix is one of `string` (default), `int` or `bool`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use stencil_define::config::Variable;
    ///
    /// let (name, value) = Variable::parse_assignment("retries=3:int").unwrap();
    /// assert_eq!(name, "retries");
    /// assert_eq!(value, Variable::Int(3));
    ///
    /// let (_, value) = Variable::parse_assignment("label=hello").unwrap();
    /// assert_eq!(value, Variable::Str("hello".to_string()));
    /// ```
    pub fn parse_assignment(input: &str) -> Result<(String, Variable), ConfigError> {
        let (name, rest) = input
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidVariable(input.to_string()))?;
        if name.is_empty() || rest.is_empty() {
            return Err(ConfigError::InvalidVariable(input.to_string()));
        }

        let (value, ty) = match rest.rsplit_once(':') {
            Some((value, ty)) if matches!(ty, "string" | "int" | "bool") => (value, ty),
            _ => (rest, "string"),
        };

        let parsed = match ty {
            "int" => Variable::Int(value.parse().map_err(|_| {
                ConfigError::InvalidVariableValue {
                    name: name.to_string(),
                    value: value.to_string(),
                    ty: ty.to_string(),
                }
            })?),
            "bool" => Variable::Bool(value.parse().map_err(|_| {
                ConfigError::InvalidVariableValue {
                    name: name.to_string(),
                    value: value.to_string(),
                    ty: ty.to_string(),
                }
            })?),
            _ => Variable::Str(value.to_string()),
        };
        Ok((name.to_string(), parsed))
    }
}

/// Configuration for one generation run.
///
/// Serde-round-trippable: the pipeline serializes this into the synthesized
/// workspace and the driver deserializes it on the other side of the
/// process boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory generated files are written to.
    pub dst_dir: PathBuf,

    /// Extra template sources; later directories override earlier ones
    /// (and the built-in set) block-by-block.
    pub template_dirs: Vec<PathBuf>,

    /// Generate a builder type per object.
    pub with_builders: bool,

    /// Generate per-field `has_*` presence methods.
    pub with_has_methods: bool,

    /// Prefix key-name constants with the object name.
    pub with_key_name_prefix: bool,

    /// Regex patterns; a dotted symbol path matching any of them is not
    /// generated (unless a schema overrides the policy).
    pub exclude_symbols: Vec<String>,

    /// Dotted symbol path -> replacement symbol name.
    pub symbol_renames: BTreeMap<String, String>,

    /// Arbitrary typed variables available to templates.
    pub variables: BTreeMap<String, Variable>,

    /// Verbose progress output.
    pub verbose: bool,
}

impl RunConfig {
    /// Returns a string variable, or `None` when absent or differently
    /// typed.
    pub fn string_var(&self, name: &str) -> Option<&str> {
        match self.variables.get(name) {
            Some(Variable::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns a bool variable, defaulting to `false` when absent or
    /// differently typed.
    pub fn bool_var(&self, name: &str) -> bool {
        matches!(self.variables.get(name), Some(Variable::Bool(true)))
    }

    /// Returns an int variable, or `None` when absent or differently
    /// typed.
    pub fn int_var(&self, name: &str) -> Option<i64> {
        match self.variables.get(name) {
            Some(Variable::Int(n)) => Some(*n),
            _ => None,
        }
    }
}
