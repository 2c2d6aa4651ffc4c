//! Shared fixtures for generator tests.

use stencil_define::{Base, FieldSpec, ObjectDefaults, RunConfig, Schema, field};

use crate::model::ObjectModel;

/// A representative schema: required string, plain integer, sequence,
/// byte field, constant and extension.
#[derive(Default)]
pub struct SampleSchema {
    #[allow(dead_code)]
    base: Base,
}

impl Schema for SampleSchema {
    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            field::string("Name").required(true),
            field::int("Count"),
            field::string_list("Tags"),
            field::byte_slice("Data"),
            field::string("Kind").constant_value(r#"String::from("sample")"#),
            field::string("Secret").extension(true),
        ]
    }

    fn comment(&self) -> String {
        "A sample object.".to_string()
    }
}

/// Resolves [`SampleSchema`] under a default configuration, renaming the
/// object to `name`.
pub fn make_model(name: &str) -> ObjectModel {
    let config = RunConfig {
        with_builders: true,
        with_has_methods: true,
        ..RunConfig::default()
    };
    let defaults = ObjectDefaults::for_object(name, "demo", &config);
    ObjectModel::resolve(name, &SampleSchema::default(), &defaults, &config)
        .expect("sample schema must resolve")
}
