//! The per-object builder block.
//!
//! Rendered only when the run enables builders. The builder owns a mutex
//! over lazily-initialized state, so a `Default` builder is immediately
//! usable; typed setters consume and return the builder, forwarding to the
//! object's generic set path by wire key, and errors are deferred to
//! build time.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::engine::{BlockContext, Engine};
use crate::errors::GeneratorError;
use crate::model::ResolvedField;

use super::fragment;

const BLOCK: &str = "object/builder";

/// Renders the builder struct, state, setters and build methods.
pub fn builder(engine: &Engine, cx: &BlockContext) -> Result<TokenStream, GeneratorError> {
    let model = cx.object()?;
    if !model.with_builders {
        return Ok(TokenStream::new());
    }

    let object_ident = format_ident!("{}", model.name);
    let builder_ident = format_ident!("{}", model.builder_name);
    let state_ident = format_ident!("{}State", model.builder_name);
    let result_ty = fragment(BLOCK, "builder result type", &model.builder_result_type)?;
    let set_ident = format_ident!("{}", model.symbol_ident("object.method.set"));
    let has_ident = format_ident!("{}", model.symbol_ident("object.method.has"));

    let ext_header = engine.render("ext/builder/header", cx)?;
    let ext_footer = engine.render("ext/builder/footer", cx)?;
    let init_hook = engine.render("ext/builder/initialize", cx)?;

    // With no initialize hook the lazy path stays a plain function
    // reference; a hook turns it into a closure running after default
    // construction.
    let lazy_init = if init_hook.is_empty() {
        quote! { #object_ident::default }
    } else {
        quote! {
            || {
                let object = #object_ident::default();
                #init_hook
                object
            }
        }
    };

    let setters = typed_setters(model.wire_fields().collect::<Vec<_>>().as_slice(), model)?;

    let generic_set = if model.generate("builder.method.set") {
        let builder_set = format_ident!("{}", model.symbol_ident("builder.method.set"));
        quote! {
            #[doc = " Sets any key by name, bypassing the typed setters."]
            pub fn #builder_set(self, key: &str, value: Value) -> Self {
                self.apply(key, value)
            }
        }
    } else {
        TokenStream::new()
    };

    let required_checks = model
        .wire_fields()
        .filter(|f| f.required && f.constant.is_none())
        .map(|f| {
            let key_const = format_ident!("{}", f.key_const);
            let name = &f.name;
            quote! {
                if !object.#has_ident(#key_const) {
                    return Err(ObjectError::RequiredField(#name.to_string()));
                }
            }
        })
        .collect::<Vec<_>>();

    let build_methods = build_methods(model, &result_ty, &required_checks)?;

    let builder_doc = format!(
        " Builds `{}` values, validating required fields.",
        model.name
    );

    Ok(quote! {
        #ext_header

        #[doc = #builder_doc]
        #[derive(Default)]
        pub struct #builder_ident {
            state: Mutex<#state_ident>,
        }

        #[derive(Default)]
        struct #state_ident {
            object: Option<#object_ident>,
            error: Option<ObjectError>,
        }

        impl #builder_ident {
            pub fn new() -> Self {
                Self::default()
            }

            fn apply(self, key: &str, value: Value) -> Self {
                {
                    let mut state = lock(&self.state);
                    if state.error.is_none() {
                        let object = state.object.get_or_insert_with(#lazy_init);
                        if let Err(err) = object.#set_ident(key, value) {
                            state.error = Some(err);
                        }
                    }
                }
                self
            }

            fn fail(self, err: ObjectError) -> Self {
                {
                    let mut state = lock(&self.state);
                    if state.error.is_none() {
                        state.error = Some(err);
                    }
                }
                self
            }

            #setters
            #generic_set
            #build_methods
        }

        #ext_footer
    })
}

/// One typed consuming setter per settable wire field.
fn typed_setters(
    wire: &[&ResolvedField],
    model: &crate::model::ObjectModel,
) -> Result<TokenStream, GeneratorError> {
    let mut out = TokenStream::new();
    for field in wire {
        if field.constant.is_some() {
            continue;
        }
        let symbol = format!("builder.method.{}", field.name);
        if !model.generate(&symbol) {
            continue;
        }
        let setter = format_ident!("{}", model.symbol_ident(&symbol));
        let key_const = format_ident!("{}", field.key_const);

        let method = if field.sequence_style {
            let element = fragment(BLOCK, "element type", &field.element)?;
            quote! {
                pub fn #setter<I>(self, values: I) -> Self
                where
                    I: IntoIterator<Item = #element>,
                {
                    let collected: Vec<#element> = values.into_iter().collect();
                    match serde_json::to_value(collected) {
                        Ok(v) => self.apply(#key_const, v),
                        Err(e) => self.fail(ObjectError::from(e)),
                    }
                }
            }
        } else if field.apparent_type == "String" {
            quote! {
                pub fn #setter(self, value: impl Into<String>) -> Self {
                    match serde_json::to_value(value.into()) {
                        Ok(v) => self.apply(#key_const, v),
                        Err(e) => self.fail(ObjectError::from(e)),
                    }
                }
            }
        } else {
            let apparent = fragment(BLOCK, "apparent type", &field.apparent_type)?;
            quote! {
                pub fn #setter(self, value: #apparent) -> Self {
                    match serde_json::to_value(value) {
                        Ok(v) => self.apply(#key_const, v),
                        Err(e) => self.fail(ObjectError::from(e)),
                    }
                }
            }
        };
        out.extend(method);
    }
    Ok(out)
}

/// The build / must_build pair, as the symbol policy allows.
fn build_methods(
    model: &crate::model::ObjectModel,
    result_ty: &TokenStream,
    required_checks: &[TokenStream],
) -> Result<TokenStream, GeneratorError> {
    let mut out = TokenStream::new();

    let build_ident = format_ident!("{}", model.symbol_ident("builder.method.build"));
    if model.generate("builder.method.build") {
        out.extend(quote! {
            #[doc = " Validates required fields and returns the built object, resetting"]
            #[doc = " the builder for reuse."]
            pub fn #build_ident(&mut self) -> Result<#result_ty, ObjectError> {
                let mut state = lock(&self.state);
                if let Some(err) = state.error.take() {
                    state.object = None;
                    return Err(err);
                }
                let object = state.object.take().unwrap_or_default();
                #(#required_checks)*
                Ok(object)
            }
        });
    }

    if model.generate("builder.method.must_build") && model.generate("builder.method.build") {
        let must_build = format_ident!("{}", model.symbol_ident("builder.method.must_build"));
        let doc = format!(
            " Like [`{}::{}`], but panics on error.",
            model.builder_name, build_ident
        );
        let panic_msg = format!("cannot build {}: {{err}}", model.name);
        out.extend(quote! {
            #[doc = #doc]
            pub fn #must_build(&mut self) -> #result_ty {
                match self.#build_ident() {
                    Ok(object) => object,
                    Err(err) => panic!(#panic_msg),
                }
            }
        });
    }

    Ok(out)
}
