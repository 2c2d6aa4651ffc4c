//! Core per-object blocks: file assembly, header, struct and footer.
//!
//! The emitted object follows one fixed shape: a public struct holding an
//! `RwLock` over an inner struct of `Option` storage plus open extra
//! storage, with the generic get/set/has/remove/keys surface, typed
//! accessors, deterministic JSON in both directions, and a deep `Clone`.
//! See `stencil-runtime`'s object contract tests for a committed copy of
//! the output shape.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::engine::{BlockContext, Engine};
use crate::errors::GeneratorError;
use crate::model::{ObjectModel, ResolvedField};

use super::fragment;

/// The per-object artifact: every core block plus the object hooks, in
/// their fixed order. Overriding a core block changes the corresponding
/// slice of this file.
pub fn object_file(engine: &Engine, cx: &BlockContext) -> Result<TokenStream, GeneratorError> {
    let header = engine.render("object/header", cx)?;
    let ext_header = engine.render("ext/object/header", cx)?;
    let body = engine.render("object/struct", cx)?;
    let builder = engine.render("object/builder", cx)?;
    let footer = engine.render("object/footer", cx)?;
    let ext_footer = engine.render("ext/object/footer", cx)?;
    Ok(quote! {
        #header
        #ext_header
        #body
        #builder
        #footer
        #ext_footer
    })
}

/// Imports and key-name constants.
pub fn header(_engine: &Engine, cx: &BlockContext) -> Result<TokenStream, GeneratorError> {
    const BLOCK: &str = "object/header";
    let model = cx.object()?;
    let wire: Vec<&ResolvedField> = model.wire_fields().collect();

    let needs_accept = wire
        .iter()
        .any(|f| f.constant.is_none() && f.accept_method.is_some());
    let needs_produce = wire
        .iter()
        .any(|f| f.constant.is_none() && f.produce_method.is_some());
    let needs_keys = model.generate("object.method.keys");
    let needs_wire = !wire.is_empty();

    let collections = if needs_keys {
        quote! { use std::collections::{BTreeMap, BTreeSet}; }
    } else {
        quote! { use std::collections::BTreeMap; }
    };
    let sync = if model.with_builders {
        quote! { use std::sync::{Mutex, RwLock}; }
    } else {
        quote! { use std::sync::RwLock; }
    };

    let mut runtime = Vec::new();
    if needs_accept {
        runtime.push(quote!(AcceptValue));
    }
    runtime.push(quote!(ObjectError));
    if needs_produce {
        runtime.push(quote!(ProduceValue));
    }
    if model.with_builders {
        runtime.push(quote!(lock));
    }
    runtime.push(quote!(read_lock));
    if needs_wire {
        runtime.push(quote!(to_wire));
    }
    runtime.push(quote!(write_lock));

    let extra_imports = model
        .imports
        .iter()
        .map(|import| fragment(BLOCK, "import", &format!("use {import};")))
        .collect::<Result<Vec<_>, _>>()?;

    let consts = wire.iter().map(|f| {
        let ident = format_ident!("{}", f.key_const);
        let key = &f.wire_key;
        quote! { pub const #ident: &str = #key; }
    });

    Ok(quote! {
        #collections
        #sync

        use serde::de::{Deserialize, Deserializer};
        use serde::ser::{Serialize, SerializeMap, Serializer};
        use serde_json::Value;
        use stencil_runtime::{#(#runtime),*};

        #(#extra_imports)*

        #(#consts)*
    })
}

/// The object struct, its inner storage, the generic surface, typed
/// accessors and the JSON round trip.
pub fn object_struct(engine: &Engine, cx: &BlockContext) -> Result<TokenStream, GeneratorError> {
    const BLOCK: &str = "object/struct";
    let model = cx.object()?;

    let object_ident = format_ident!("{}", model.name);
    let inner_ident = format_ident!("{}Inner", model.name);

    // Stored fields: everything except constants (whose value is fixed in
    // code). Extension fields are stored but surface nowhere else.
    let stored: Vec<&ResolvedField> = model
        .fields
        .iter()
        .filter(|f| f.constant.is_none())
        .collect();
    let wire: Vec<&ResolvedField> = model.wire_fields().collect();

    let doc_lines = engine.comment(BLOCK, &model.comment, cx)?;
    let docs = quote! { #(#[doc = #doc_lines])* };

    let storage_decls = stored
        .iter()
        .map(|f| {
            let ident = format_ident!("{}", f.storage_ident);
            let raw = fragment(BLOCK, "storage type", &f.raw_type)?;
            Ok(quote! { #ident: Option<#raw>, })
        })
        .collect::<Result<Vec<_>, GeneratorError>>()?;

    let load_arms = wire
        .iter()
        .map(|f| load_arm(f))
        .collect::<Result<Vec<_>, _>>()?;

    let generic_surface = generic_surface(model, &wire)?;
    let accessors = typed_accessors(engine, cx, model, &wire)?;
    let has_methods = has_methods(model, &wire)?;
    let extension_accessors = extension_accessors(model)?;
    let json_methods = json_methods(model, &inner_ident)?;
    let serialize_impl = serialize_impl(model, &object_ident, &wire)?;

    Ok(quote! {
        #docs
        #[derive(Default)]
        pub struct #object_ident {
            inner: RwLock<#inner_ident>,
        }

        #[derive(Default, Clone)]
        struct #inner_ident {
            #(#storage_decls)*
            extra: BTreeMap<String, Value>,
        }

        impl #inner_ident {
            fn load(entries: BTreeMap<String, Value>) -> Result<Self, ObjectError> {
                let mut inner = Self::default();
                for (key, value) in entries {
                    match key.as_str() {
                        #(#load_arms)*
                        _ => {
                            inner.extra.insert(key, value);
                        }
                    }
                }
                Ok(inner)
            }
        }

        impl #object_ident {
            #generic_surface
            #accessors
            #has_methods
            #extension_accessors
            #json_methods
        }

        impl Clone for #object_ident {
            fn clone(&self) -> Self {
                let inner = read_lock(&self.inner);
                Self {
                    inner: RwLock::new(inner.clone()),
                }
            }
        }

        #serialize_impl

        impl<'de> Deserialize<'de> for #object_ident {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                use serde::de::Error as _;
                let entries = BTreeMap::<String, Value>::deserialize(deserializer)?;
                let inner = #inner_ident::load(entries).map_err(D::Error::custom)?;
                Ok(Self {
                    inner: RwLock::new(inner),
                })
            }
        }
    })
}

/// Rendered after everything else; empty by default, present so user
/// template sets can replace it.
pub fn footer(_engine: &Engine, _cx: &BlockContext) -> Result<TokenStream, GeneratorError> {
    Ok(TokenStream::new())
}

fn key_const_ident(field: &ResolvedField) -> proc_macro2::Ident {
    format_ident!("{}", field.key_const)
}

/// One `load` arm: decode a recognized wire key into declared storage.
fn load_arm(field: &ResolvedField) -> Result<TokenStream, GeneratorError> {
    const BLOCK: &str = "object/struct";
    let key_const = key_const_ident(field);
    if field.constant.is_some() {
        // The value is fixed; wire input for this key is dropped.
        return Ok(quote! { #key_const => {} });
    }
    let ident = format_ident!("{}", field.storage_ident);
    let raw = fragment(BLOCK, "storage type", &field.raw_type)?;
    let arm = match &field.accept_method {
        Some(method) => {
            let accept = format_ident!("{}", method);
            quote! {
                #key_const => {
                    let stored = <#raw>::#accept(value).map_err(|e| ObjectError::TypeMismatch {
                        key: #key_const.to_string(),
                        reason: e.to_string(),
                    })?;
                    inner.#ident = Some(stored);
                }
            }
        }
        None => quote! {
            #key_const => {
                let stored: #raw = serde_json::from_value(value).map_err(|e| ObjectError::TypeMismatch {
                    key: #key_const.to_string(),
                    reason: e.to_string(),
                })?;
                inner.#ident = Some(stored);
            }
        },
    };
    Ok(arm)
}

/// The generic get/set/has/remove/keys methods, as the symbol policy
/// allows.
fn generic_surface(
    model: &ObjectModel,
    wire: &[&ResolvedField],
) -> Result<TokenStream, GeneratorError> {
    const BLOCK: &str = "object/struct";
    let mut out = TokenStream::new();

    if model.generate("object.method.get") {
        let get_ident = format_ident!("{}", model.symbol_ident("object.method.get"));
        let arms = wire
            .iter()
            .map(|f| {
                let key_const = key_const_ident(f);
                if let Some(constant) = &f.constant {
                    let apparent = fragment(BLOCK, "apparent type", &f.apparent_type)?;
                    let expr = fragment(BLOCK, "constant expression", constant)?;
                    Ok(quote! {
                        #key_const => {
                            let v: #apparent = #expr;
                            to_wire(key, &v)
                        }
                    })
                } else {
                    let ident = format_ident!("{}", f.storage_ident);
                    Ok(quote! {
                        #key_const => match &inner.#ident {
                            Some(v) => to_wire(key, v),
                            None => Err(ObjectError::NoSuchKey(key.to_string())),
                        },
                    })
                }
            })
            .collect::<Result<Vec<_>, GeneratorError>>()?;
        out.extend(quote! {
            #[doc = " Returns the value stored under `key` in its wire form."]
            pub fn #get_ident(&self, key: &str) -> Result<Value, ObjectError> {
                let inner = read_lock(&self.inner);
                match key {
                    #(#arms)*
                    _ => inner
                        .extra
                        .get(key)
                        .cloned()
                        .ok_or_else(|| ObjectError::NoSuchKey(key.to_string())),
                }
            }
        });
    }

    if model.generate("object.method.set") {
        let set_ident = format_ident!("{}", model.symbol_ident("object.method.set"));
        let arms = wire
            .iter()
            .map(|f| {
                let key_const = key_const_ident(f);
                if f.constant.is_some() {
                    return Ok(quote! { #key_const => {} });
                }
                let ident = format_ident!("{}", f.storage_ident);
                let raw = fragment(BLOCK, "storage type", &f.raw_type)?;
                let arm = match &f.accept_method {
                    Some(method) => {
                        let accept = format_ident!("{}", method);
                        quote! {
                            #key_const => {
                                let stored = <#raw>::#accept(value).map_err(|e| ObjectError::TypeMismatch {
                                    key: key.to_string(),
                                    reason: e.to_string(),
                                })?;
                                inner.#ident = Some(stored);
                            }
                        }
                    }
                    None => quote! {
                        #key_const => {
                            let stored: #raw = serde_json::from_value(value).map_err(|e| ObjectError::TypeMismatch {
                                key: key.to_string(),
                                reason: e.to_string(),
                            })?;
                            inner.#ident = Some(stored);
                        }
                    },
                };
                Ok(arm)
            })
            .collect::<Result<Vec<_>, GeneratorError>>()?;
        out.extend(quote! {
            #[doc = " Stores `value` under `key`, coercing it into the declared storage"]
            #[doc = " type for known keys and into extra storage otherwise."]
            pub fn #set_ident(&self, key: &str, value: Value) -> Result<(), ObjectError> {
                let mut inner = write_lock(&self.inner);
                match key {
                    #(#arms)*
                    _ => {
                        inner.extra.insert(key.to_string(), value);
                    }
                }
                Ok(())
            }
        });
    }

    if model.generate("object.method.has") {
        let has_ident = format_ident!("{}", model.symbol_ident("object.method.has"));
        let arms = wire.iter().map(|f| {
            let key_const = key_const_ident(f);
            if f.constant.is_some() {
                quote! { #key_const => true, }
            } else {
                let ident = format_ident!("{}", f.storage_ident);
                quote! { #key_const => inner.#ident.is_some(), }
            }
        });
        out.extend(quote! {
            #[doc = " True when the key currently holds a value."]
            pub fn #has_ident(&self, key: &str) -> bool {
                let inner = read_lock(&self.inner);
                match key {
                    #(#arms)*
                    _ => inner.extra.contains_key(key),
                }
            }
        });
    }

    if model.generate("object.method.remove") {
        let remove_ident = format_ident!("{}", model.symbol_ident("object.method.remove"));
        let arms = wire.iter().map(|f| {
            let key_const = key_const_ident(f);
            if f.constant.is_some() {
                quote! { #key_const => {} }
            } else {
                let ident = format_ident!("{}", f.storage_ident);
                quote! { #key_const => inner.#ident = None, }
            }
        });
        out.extend(quote! {
            #[doc = " Clears the value stored under `key`. Idempotent."]
            pub fn #remove_ident(&self, key: &str) {
                let mut inner = write_lock(&self.inner);
                match key {
                    #(#arms)*
                    _ => {
                        inner.extra.remove(key);
                    }
                }
            }
        });
    }

    if model.generate("object.method.keys") {
        let keys_ident = format_ident!("{}", model.symbol_ident("object.method.keys"));
        let inserts = wire.iter().map(|f| {
            let key_const = key_const_ident(f);
            if f.constant.is_some() {
                quote! { keys.insert(#key_const.to_string()); }
            } else {
                let ident = format_ident!("{}", f.storage_ident);
                quote! {
                    if inner.#ident.is_some() {
                        keys.insert(#key_const.to_string());
                    }
                }
            }
        });
        out.extend(quote! {
            #[doc = " Returns the sorted union of present declared keys and extra keys."]
            pub fn #keys_ident(&self) -> Vec<String> {
                let inner = read_lock(&self.inner);
                let mut keys = BTreeSet::new();
                #(#inserts)*
                keys.extend(inner.extra.keys().cloned());
                keys.into_iter().collect()
            }
        });
    }

    Ok(out)
}

/// One typed accessor per wire field, returning the apparent type or the
/// zero value.
fn typed_accessors(
    engine: &Engine,
    cx: &BlockContext,
    model: &ObjectModel,
    wire: &[&ResolvedField],
) -> Result<TokenStream, GeneratorError> {
    const BLOCK: &str = "object/struct";
    let mut out = TokenStream::new();
    for field in wire {
        let symbol = format!("object.accessor.{}", field.name);
        if !model.generate(&symbol) {
            continue;
        }
        let accessor = format_ident!("{}", model.symbol_ident(&symbol));
        let apparent = fragment(BLOCK, "apparent type", &field.apparent_type)?;
        let doc_lines = engine.comment(BLOCK, &field.comment, cx)?;
        let docs = quote! { #(#[doc = #doc_lines])* };

        if let Some(constant) = &field.constant {
            let expr = fragment(BLOCK, "constant expression", constant)?;
            out.extend(quote! {
                #docs
                pub fn #accessor(&self) -> #apparent {
                    #expr
                }
            });
            continue;
        }

        let ident = format_ident!("{}", field.storage_ident);
        let zero = fragment(BLOCK, "zero value", &field.zero_value)?;
        let produced = match &field.produce_method {
            Some(method) => {
                let produce = format_ident!("{}", method);
                quote! { v.#produce() }
            }
            None => quote! { v.clone() },
        };
        out.extend(quote! {
            #docs
            pub fn #accessor(&self) -> #apparent {
                let inner = read_lock(&self.inner);
                match &inner.#ident {
                    Some(v) => #produced,
                    None => #zero,
                }
            }
        });
    }
    Ok(out)
}

/// Per-field presence methods, when enabled for the run.
fn has_methods(
    model: &ObjectModel,
    wire: &[&ResolvedField],
) -> Result<TokenStream, GeneratorError> {
    if !model.with_has_methods {
        return Ok(TokenStream::new());
    }
    let mut out = TokenStream::new();
    for field in wire {
        let symbol = format!("object.has.{}", field.name);
        if !model.generate(&symbol) {
            continue;
        }
        let has_ident = format_ident!("{}", model.symbol_ident(&symbol));
        let body = if field.constant.is_some() {
            quote! { true }
        } else {
            let ident = format_ident!("{}", field.storage_ident);
            quote! { read_lock(&self.inner).#ident.is_some() }
        };
        out.extend(quote! {
            pub fn #has_ident(&self) -> bool {
                #body
            }
        });
    }
    Ok(out)
}

/// Crate-visible accessors for extension fields. These are the only
/// surface extensions get; the author builds the rest.
fn extension_accessors(model: &ObjectModel) -> Result<TokenStream, GeneratorError> {
    const BLOCK: &str = "object/struct";
    let mut out = TokenStream::new();
    for field in model.extension_fields().filter(|f| f.constant.is_none()) {
        let ident = format_ident!("{}", field.storage_ident);
        let set_ident = format_ident!("set_{}", field.storage_ident);
        let raw = fragment(BLOCK, "storage type", &field.raw_type)?;
        out.extend(quote! {
            #[allow(dead_code)]
            pub(crate) fn #ident(&self) -> Option<#raw> {
                read_lock(&self.inner).#ident.clone()
            }

            #[allow(dead_code)]
            pub(crate) fn #set_ident(&self, value: Option<#raw>) {
                write_lock(&self.inner).#ident = value;
            }
        });
    }
    Ok(out)
}

/// The to_json / from_json methods, as the symbol policy allows.
fn json_methods(
    model: &ObjectModel,
    inner_ident: &proc_macro2::Ident,
) -> Result<TokenStream, GeneratorError> {
    let mut out = TokenStream::new();

    if model.generate("object.method.to_json") {
        let to_json = format_ident!("{}", model.symbol_ident("object.method.to_json"));
        out.extend(quote! {
            #[doc = " Serializes the object as one JSON document."]
            pub fn #to_json(&self) -> Result<Vec<u8>, ObjectError> {
                serde_json::to_vec(self).map_err(ObjectError::from)
            }
        });
    }

    if model.generate("object.method.from_json") {
        let from_json = format_ident!("{}", model.symbol_ident("object.method.from_json"));
        out.extend(quote! {
            #[doc = " Replaces this object's state from a JSON document."]
            #[doc = ""]
            #[doc = " The input is decoded into a fresh shadow state which replaces the"]
            #[doc = " current state only on full success; on failure the object is"]
            #[doc = " unchanged."]
            pub fn #from_json(&self, src: &[u8]) -> Result<(), ObjectError> {
                let entries: BTreeMap<String, Value> = serde_json::from_slice(src)?;
                let fresh = #inner_ident::load(entries)?;
                *write_lock(&self.inner) = fresh;
                Ok(())
            }
        });
    }

    Ok(out)
}

/// The deterministic `Serialize` impl: sorted entries, extras first so a
/// declared field always wins a key collision.
fn serialize_impl(
    _model: &ObjectModel,
    object_ident: &proc_macro2::Ident,
    wire: &[&ResolvedField],
) -> Result<TokenStream, GeneratorError> {
    const BLOCK: &str = "object/struct";
    let inserts = wire
        .iter()
        .map(|f| {
            let key_const = key_const_ident(f);
            if let Some(constant) = &f.constant {
                let apparent = fragment(BLOCK, "apparent type", &f.apparent_type)?;
                let expr = fragment(BLOCK, "constant expression", constant)?;
                Ok(quote! {
                    {
                        let v: #apparent = #expr;
                        entries.insert(
                            #key_const.to_string(),
                            to_wire(#key_const, &v).map_err(S::Error::custom)?,
                        );
                    }
                })
            } else {
                let ident = format_ident!("{}", f.storage_ident);
                Ok(quote! {
                    if let Some(v) = &inner.#ident {
                        entries.insert(
                            #key_const.to_string(),
                            to_wire(#key_const, v).map_err(S::Error::custom)?,
                        );
                    }
                })
            }
        })
        .collect::<Result<Vec<_>, GeneratorError>>()?;

    Ok(quote! {
        impl Serialize for #object_ident {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                use serde::ser::Error as _;
                let inner = read_lock(&self.inner);
                let mut entries: BTreeMap<String, Value> = BTreeMap::new();
                for (key, value) in &inner.extra {
                    entries.insert(key.clone(), value.clone());
                }
                #(#inserts)*
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(&key, &value)?;
                }
                map.end()
            }
        }
    })
}
