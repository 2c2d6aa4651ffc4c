//! Per-run blocks.
//!
//! `run/mod.rs` is the built-in whole-run artifact: a module index
//! declaring and re-exporting every generated per-object file, so the
//! destination package picks the run up with a single `mod`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::engine::{BlockContext, Engine};
use crate::errors::GeneratorError;

/// Module declarations and re-exports for everything generated this run.
pub fn mod_file(_engine: &Engine, cx: &BlockContext) -> Result<TokenStream, GeneratorError> {
    let run = cx.run()?;
    let decls = run.objects.iter().map(|model| {
        let module = format_ident!("{}_gen", model.file_base);
        quote! {
            pub mod #module;
            pub use #module::*;
        }
    });
    Ok(quote! { #(#decls)* })
}
