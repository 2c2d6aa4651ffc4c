//! Generation driver.
//!
//! This is the half of the pipeline that executes *inside* the synthesized
//! program, where the author's real declarations are linkable. The
//! synthesized `main` instantiates each extracted schema and calls
//! [`run_generation`] with the destination directory and the serialized
//! run configuration; everything from there - defaults, model resolution,
//! template mounting, rendering, file emission - happens here.

use std::fs;
use std::path::PathBuf;

use stencil_define::{ObjectDefaults, RunConfig, Schema};

use crate::emit::{artifact_filename, emit_file};
use crate::engine::{BlockContext, TemplateSet};
use crate::errors::GeneratorError;
use crate::model::{ObjectModel, RunContext, compile_symbol_filter};

/// Entry point called by the synthesized program's `main`.
///
/// `args` is the argument vector the pipeline passed through the host
/// toolchain: the destination directory followed by the path of the
/// serialized run configuration.
pub fn run_generation(
    objects: Vec<(String, Box<dyn Schema>)>,
    args: &[String],
) -> Result<(), GeneratorError> {
    let [dst_dir, config_path] = args else {
        return Err(GeneratorError::Invocation(format!(
            "expected <dst-dir> <config>, got {} arguments",
            args.len()
        )));
    };

    let raw = fs::read(config_path).map_err(|e| GeneratorError::Read {
        path: config_path.clone(),
        source: e,
    })?;
    let mut config: RunConfig = serde_json::from_slice(&raw)?;
    config.dst_dir = PathBuf::from(dst_dir);

    generate(objects, &config)
}

/// Resolves every schema and renders the run.
///
/// Per-object artifacts execute once per object with that object's model;
/// per-run artifacts execute exactly once with the full model list.
pub fn generate(
    objects: Vec<(String, Box<dyn Schema>)>,
    config: &RunConfig,
) -> Result<(), GeneratorError> {
    let package = config
        .dst_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("generated")
        .to_string();

    let filter = compile_symbol_filter(&config.exclude_symbols)?;

    let mut models = Vec::new();
    for (declared_name, schema) in &objects {
        let mut defaults = ObjectDefaults::for_object(declared_name, &package, config);
        if let Some(filter) = &filter {
            defaults = defaults.with_symbol_filter(filter.clone());
        }
        let model = ObjectModel::resolve(declared_name, schema.as_ref(), &defaults, config)?;
        if config.verbose {
            eprintln!(
                "resolved `{}` ({} fields, file base `{}`)",
                model.name,
                model.fields.len(),
                model.file_base
            );
        }
        models.push(model);
    }

    let run = RunContext {
        package,
        objects: models,
        variables: config.variables.clone(),
    };

    let mut set = TemplateSet::new();
    for dir in &config.template_dirs {
        set.mount_dir(dir);
    }
    let engine = set.build()?;

    fs::create_dir_all(&config.dst_dir).map_err(|e| GeneratorError::Write {
        path: config.dst_dir.display().to_string(),
        source: e,
    })?;

    for block in engine.artifact_names() {
        if block.starts_with("object/") {
            for model in &run.objects {
                let cx = BlockContext::Object(model);
                let tokens = engine.render(&block, &cx)?;
                let Some(filename) = artifact_filename(&block, Some(&model.file_base)) else {
                    continue;
                };
                let path = config.dst_dir.join(&filename);
                emit_file(&tokens, &path)?;
                if config.verbose {
                    eprintln!("wrote {}", path.display());
                }
            }
        } else if block.starts_with("run/") {
            let cx = BlockContext::Run(&run);
            let tokens = engine.render(&block, &cx)?;
            let Some(filename) = artifact_filename(&block, None) else {
                continue;
            };
            let path = config.dst_dir.join(&filename);
            emit_file(&tokens, &path)?;
            if config.verbose {
                eprintln!("wrote {}", path.display());
            }
        }
    }

    Ok(())
}
