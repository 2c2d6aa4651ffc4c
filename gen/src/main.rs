//! Stencil code generator CLI.
//!
//! Scans a schema directory, bootstraps the generation program and writes
//! generated object implementations to the destination directory.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use stencil_define::{ConfigError, RunConfig, Variable};
use stencil_gen::GeneratorError;
use stencil_gen::pipeline::{CargoToolchain, Pipeline};

/// Generate extensible-object implementations from schema declarations.
#[derive(Parser, Debug)]
#[command(name = "stencil-gen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing the schema declarations
    schema_dir: PathBuf,

    /// Destination directory for generated files
    #[arg(short = 'd', long, default_value = ".")]
    dst_dir: PathBuf,

    /// Additional template directory; later directories override earlier
    /// ones block-by-block (repeatable)
    #[arg(short = 't', long = "tmpl-dir")]
    tmpl_dir: Vec<PathBuf>,

    /// Generate a builder type for each object
    #[arg(long)]
    with_builders: bool,

    /// Generate per-field has_* presence methods
    #[arg(long)]
    with_has_methods: bool,

    /// Prefix key-name constants with the object name
    #[arg(long)]
    with_key_name_prefix: bool,

    /// Regex matched against dotted symbol paths; matching symbols are
    /// not generated (repeatable)
    #[arg(long = "exclude-symbol")]
    exclude_symbol: Vec<String>,

    /// Rename a symbol, as symbol=NewName (repeatable)
    #[arg(long = "rename-symbol")]
    rename_symbol: Vec<String>,

    /// A name=value pair with an optional type suffix
    /// (e.g. key=value:bool), made available to templates (repeatable)
    #[arg(long = "var")]
    var: Vec<String>,

    /// Keep the synthesized temporary workspace for inspection
    #[arg(long)]
    keep_tmpdir: bool,

    /// Path to a stencil source checkout (development runs)
    #[arg(long)]
    dev_path: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), GeneratorError> {
    let mut variables = BTreeMap::new();
    for assignment in &cli.var {
        let (name, value) = Variable::parse_assignment(assignment)?;
        variables.insert(name, value);
    }

    // Surface bad exclusion patterns here instead of from inside the
    // synthesized program
    stencil_gen::model::compile_symbol_filter(&cli.exclude_symbol)?;

    let mut symbol_renames = BTreeMap::new();
    for rename in &cli.rename_symbol {
        let (symbol, name) = rename
            .split_once('=')
            .filter(|(symbol, name)| !symbol.is_empty() && !name.is_empty())
            .ok_or_else(|| ConfigError::InvalidRename(rename.clone()))?;
        symbol_renames.insert(symbol.to_string(), name.to_string());
    }

    let config = RunConfig {
        dst_dir: absolute(&cli.dst_dir),
        template_dirs: cli.tmpl_dir.iter().map(|d| absolute(d)).collect(),
        with_builders: cli.with_builders,
        with_has_methods: cli.with_has_methods,
        with_key_name_prefix: cli.with_key_name_prefix,
        exclude_symbols: cli.exclude_symbol.clone(),
        symbol_renames,
        variables,
        verbose: cli.verbose > 0,
    };

    let toolchain = CargoToolchain;
    let mut pipeline = Pipeline::new(config, absolute(&cli.schema_dir), &toolchain)
        .keep_workspace(cli.keep_tmpdir);
    if let Some(dev_path) = &cli.dev_path {
        pipeline = pipeline.dev_path(absolute(dev_path));
    }
    pipeline.run()
}

/// Absolutizes a path against the current directory; relative paths would
/// otherwise resolve against the synthesized workspace.
fn absolute(path: &PathBuf) -> PathBuf {
    if path.is_absolute() {
        path.clone()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.clone())
    }
}
