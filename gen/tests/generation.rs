//! End-to-end generation tests: resolve schemas, render, write, and check
//! the emitted source.

use std::fs;
use std::path::Path;

use stencil_define::{RunConfig, Schema};
use stencil_gen::driver::generate;
use stencil_gen::test_utils::SampleSchema;
use tempfile::TempDir;

fn sample_objects() -> Vec<(String, Box<dyn Schema>)> {
    vec![(
        "Sample".to_string(),
        Box::new(SampleSchema::default()) as Box<dyn Schema>,
    )]
}

fn base_config(dst: &Path) -> RunConfig {
    RunConfig {
        dst_dir: dst.to_path_buf(),
        with_builders: true,
        with_has_methods: true,
        ..RunConfig::default()
    }
}

fn generated_source(config: &RunConfig) -> String {
    generate(sample_objects(), config).unwrap();
    fs::read_to_string(config.dst_dir.join("sample_gen.rs")).unwrap()
}

#[test]
fn emitted_files_carry_the_generated_marker() {
    let dir = TempDir::new().unwrap();
    let config = base_config(&dir.path().join("out"));
    generate(sample_objects(), &config).unwrap();

    let mut names: Vec<String> = fs::read_dir(&config.dst_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["mod_gen.rs", "sample_gen.rs"]);
}

#[test]
fn generated_code_parses_as_rust() {
    let dir = TempDir::new().unwrap();
    let code = generated_source(&base_config(&dir.path().join("out")));
    syn::parse_file(&code).expect("generated code must parse");
}

#[test]
fn generation_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let first = generated_source(&base_config(&dir.path().join("a")));
    let second = generated_source(&base_config(&dir.path().join("b")));
    assert_eq!(first, second);
}

#[test]
fn key_constants_respect_the_prefix_toggle() {
    let dir = TempDir::new().unwrap();
    let plain = generated_source(&base_config(&dir.path().join("plain")));
    assert!(plain.contains("pub const NAME_KEY: &str = \"name\";"));

    let config = RunConfig {
        with_key_name_prefix: true,
        ..base_config(&dir.path().join("prefixed"))
    };
    let prefixed = generated_source(&config);
    assert!(prefixed.contains("pub const SAMPLE_NAME_KEY: &str = \"name\";"));
    assert!(!prefixed.contains("pub const NAME_KEY"));
}

#[test]
fn byte_fields_decode_through_their_acceptor() {
    let dir = TempDir::new().unwrap();
    let code = generated_source(&base_config(&dir.path().join("out")));
    assert!(code.contains("<stencil_runtime::ByteSlice>::accept_value(value)"));
    assert!(code.contains("pub fn data(&self) -> Vec<u8>"));
}

#[test]
fn constant_fields_read_as_their_fixed_expression() {
    let dir = TempDir::new().unwrap();
    let code = generated_source(&base_config(&dir.path().join("out")));
    assert!(code.contains("String::from(\"sample\")"));
    // Constant storage does not exist
    assert!(!code.contains("kind: Option<String>"));
}

#[test]
fn extension_fields_stay_off_the_generic_surface() {
    let dir = TempDir::new().unwrap();
    let code = generated_source(&base_config(&dir.path().join("out")));
    // Stored, with crate-visible accessors only
    assert!(code.contains("secret: Option<String>"));
    assert!(code.contains("pub(crate) fn secret"));
    assert!(code.contains("pub(crate) fn set_secret"));
    // Never a key constant
    assert!(!code.contains("SECRET_KEY"));
}

#[test]
fn builders_are_opt_in() {
    let dir = TempDir::new().unwrap();
    let config = RunConfig {
        with_builders: false,
        ..base_config(&dir.path().join("out"))
    };
    let code = generated_source(&config);
    assert!(!code.contains("SampleBuilder"));
    assert!(!code.contains("Mutex"));
}

#[test]
fn has_methods_are_opt_in() {
    let dir = TempDir::new().unwrap();
    let config = RunConfig {
        with_has_methods: false,
        ..base_config(&dir.path().join("out"))
    };
    let code = generated_source(&config);
    assert!(!code.contains("pub fn has_name"));
    // The generic has method remains
    assert!(code.contains("pub fn has(&self, key: &str)"));
}

#[test]
fn excluded_symbols_are_not_generated() {
    let dir = TempDir::new().unwrap();
    let config = RunConfig {
        exclude_symbols: vec!["^object\\.method\\.remove$".to_string()],
        ..base_config(&dir.path().join("out"))
    };
    let code = generated_source(&config);
    assert!(!code.contains("pub fn remove"));
    assert!(code.contains("pub fn get"));
}

#[test]
fn renamed_symbols_use_the_replacement_identifier() {
    let dir = TempDir::new().unwrap();
    let mut config = base_config(&dir.path().join("out"));
    config
        .symbol_renames
        .insert("object.method.set".to_string(), "assign".to_string());
    let code = generated_source(&config);
    assert!(code.contains("pub fn assign(&self, key: &str, value: Value)"));
    assert!(!code.contains("pub fn set(&self, key: &str, value: Value)"));
    // The builder forwards through the renamed generic path
    assert!(code.contains(".assign(key, value)"));
}

#[test]
fn user_templates_override_core_blocks_wholesale() {
    let dir = TempDir::new().unwrap();
    let tmpl = dir.path().join("tmpl");
    fs::create_dir_all(tmpl.join("object")).unwrap();
    fs::write(
        tmpl.join("object/footer.tmpl"),
        "pub const OBJECT_NAME: &str = \"{{ name }}\";",
    )
    .unwrap();

    let config = RunConfig {
        template_dirs: vec![tmpl],
        ..base_config(&dir.path().join("out"))
    };
    let code = generated_source(&config);
    assert!(code.contains("pub const OBJECT_NAME: &str = \"Sample\";"));
}

#[test]
fn hook_blocks_render_only_when_defined() {
    let dir = TempDir::new().unwrap();
    let without_hook = generated_source(&base_config(&dir.path().join("plain")));
    assert!(!without_hook.contains("hook_marker"));

    let tmpl = dir.path().join("tmpl");
    fs::create_dir_all(tmpl.join("ext/object")).unwrap();
    fs::write(
        tmpl.join("ext/object/footer.tmpl"),
        "pub fn hook_marker() {}",
    )
    .unwrap();
    let config = RunConfig {
        template_dirs: vec![tmpl],
        ..base_config(&dir.path().join("hooked"))
    };
    let code = generated_source(&config);
    assert!(code.contains("pub fn hook_marker()"));
}

#[test]
fn builder_initialize_hook_runs_inside_lazy_init() {
    let dir = TempDir::new().unwrap();
    let tmpl = dir.path().join("tmpl");
    fs::create_dir_all(tmpl.join("ext/builder")).unwrap();
    fs::write(
        tmpl.join("ext/builder/initialize.tmpl"),
        "let _ = &object;",
    )
    .unwrap();
    let config = RunConfig {
        template_dirs: vec![tmpl],
        ..base_config(&dir.path().join("out"))
    };
    let code = generated_source(&config);
    assert!(code.contains("let _ = &object;"));
    syn::parse_file(&code).expect("hooked builder must still parse");
}

#[test]
fn user_run_templates_emit_once_with_marker_names() {
    let dir = TempDir::new().unwrap();
    let tmpl = dir.path().join("tmpl");
    fs::create_dir_all(tmpl.join("run")).unwrap();
    fs::write(
        tmpl.join("run/registry.rs.tmpl"),
        "pub const PACKAGE: &str = \"{{ package }}\";",
    )
    .unwrap();

    let config = RunConfig {
        template_dirs: vec![tmpl],
        ..base_config(&dir.path().join("out"))
    };
    generate(sample_objects(), &config).unwrap();

    let registry = fs::read_to_string(config.dst_dir.join("registry_gen.rs")).unwrap();
    assert!(registry.contains("pub const PACKAGE: &str = \"out\";"));
}

#[test]
fn multiple_objects_share_one_run_index() {
    #[derive(Default)]
    struct Second;
    impl Schema for Second {
        fn fields(&self) -> Vec<stencil_define::FieldSpec> {
            vec![stencil_define::field::string("Label")]
        }
    }

    let dir = TempDir::new().unwrap();
    let config = base_config(&dir.path().join("out"));
    let objects: Vec<(String, Box<dyn Schema>)> = vec![
        (
            "Sample".to_string(),
            Box::new(SampleSchema::default()) as Box<dyn Schema>,
        ),
        ("Second".to_string(), Box::new(Second) as Box<dyn Schema>),
    ];
    generate(objects, &config).unwrap();

    assert!(config.dst_dir.join("sample_gen.rs").exists());
    assert!(config.dst_dir.join("second_gen.rs").exists());
    let module = fs::read_to_string(config.dst_dir.join("mod_gen.rs")).unwrap();
    assert!(module.contains("pub mod sample_gen;"));
    assert!(module.contains("pub mod second_gen;"));
}
