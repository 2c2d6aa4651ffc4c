//! Built-in template blocks.
//!
//! These are the system defaults of the layered template set: native
//! render functions producing token streams. Any of them can be replaced
//! wholesale by a user template directory defining a block of the same
//! name.
//!
//! - [`object`] - the per-object artifact and its core fragments
//! - [`builder`] - the per-object builder fragment
//! - [`run`] - the per-run module-index artifact

pub mod builder;
pub mod object;
pub mod run;

use proc_macro2::TokenStream;

use crate::engine::BlockBody;
use crate::errors::GeneratorError;

/// The built-in block set, in namespace order.
pub fn builtin() -> Vec<(String, BlockBody)> {
    vec![
        (
            "object/$object.rs".to_string(),
            BlockBody::Native(object::object_file),
        ),
        (
            "object/header".to_string(),
            BlockBody::Native(object::header),
        ),
        (
            "object/struct".to_string(),
            BlockBody::Native(object::object_struct),
        ),
        (
            "object/builder".to_string(),
            BlockBody::Native(builder::builder),
        ),
        (
            "object/footer".to_string(),
            BlockBody::Native(object::footer),
        ),
        ("run/mod.rs".to_string(), BlockBody::Native(run::mod_file)),
    ]
}

/// Parses a model-supplied source fragment into tokens, attributing
/// failures to the block that needed it.
pub(crate) fn fragment(
    block: &str,
    what: &str,
    source: &str,
) -> Result<TokenStream, GeneratorError> {
    source
        .parse::<TokenStream>()
        .map_err(|e| GeneratorError::BlockRender {
            block: block.to_string(),
            message: format!("cannot parse {what} `{source}`: {e}"),
        })
}
