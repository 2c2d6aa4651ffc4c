//! Sample schema declarations.
//!
//! These are real inputs for the generator: each struct embeds the
//! `stencil_define::Base` marker so the extractor can find it, and its
//! `Schema` impl declares the fields of the object to generate. They
//! double as living documentation of the declaration surface and as
//! fixtures for the generator's own tests.
//!
//! Generate from this crate with:
//!
//! ```text
//! stencil-gen definitions/src --dst-dir demo/src --with-builders --with-has-methods
//! ```

use stencil_define as schema;
use stencil_define::FieldSpec;

/// A person record: required name, optional contact details, open to
/// arbitrary extra fields on the wire.
#[derive(Default)]
pub struct Person {
    pub base: schema::Base,
}

impl schema::Schema for Person {
    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            schema::field::string("Name")
                .required(true)
                .comment("The person's display name."),
            schema::field::string("Email"),
            schema::field::int("Age"),
            schema::field::string_list("Tags"),
        ]
    }

    fn comment(&self) -> String {
        "A person record.".to_string()
    }
}

/// A stored credential: binary key material travels as base64 text, the
/// record kind is fixed, and the cache slot never reaches the wire.
#[derive(Default)]
pub struct Credential {
    pub base: schema::Base,
}

impl schema::Schema for Credential {
    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            schema::field::string("KeyId").required(true).wire("kid"),
            schema::field::byte_slice("Data"),
            schema::field::string("Kind").constant_value(r#"String::from("credential")"#),
            schema::field::string("CachedThumbprint").extension(true),
        ]
    }

    fn comment(&self) -> String {
        "A stored credential.".to_string()
    }
}
