//! The bootstrap pipeline.
//!
//! Schema declarations are ordinary Rust code; their field lists only
//! exist at run time of a program that links them. The pipeline therefore
//! runs in two stages: this half resolves the author's package, extracts
//! candidate declarations syntactically, synthesizes an ephemeral cargo
//! workspace whose `main` instantiates those declarations, and delegates
//! building and running it to the host toolchain. The other half - the
//! driver - executes inside that program.
//!
//! The stages are strictly sequential with no retries; the first failure
//! aborts the run. A toolchain failure keeps the synthesized workspace on
//! disk so its sources can be inspected.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use quote::{format_ident, quote};
use stencil_define::RunConfig;
use tempfile::TempDir;

use crate::errors::GeneratorError;
use crate::extract::{self, DeclaredSchema};

/// The resolved package enclosing the schema directory.
#[derive(Debug, Clone)]
pub struct ResolvedPackage {
    /// Directory containing the package manifest.
    pub root: PathBuf,
    /// The package name from the manifest.
    pub name: String,
}

impl ResolvedPackage {
    /// The package name as a Rust identifier (dashes become underscores).
    pub fn crate_ident(&self) -> String {
        self.name.replace('-', "_")
    }
}

/// Finds the package enclosing `schema_dir` by walking upward to the
/// nearest manifest with a `[package]` section.
pub fn resolve_package(schema_dir: &Path) -> Result<ResolvedPackage, GeneratorError> {
    let mut dir = Some(schema_dir);
    while let Some(current) = dir {
        let manifest = current.join("Cargo.toml");
        if manifest.exists() {
            let content = fs::read_to_string(&manifest).map_err(|e| GeneratorError::Read {
                path: manifest.display().to_string(),
                source: e,
            })?;
            let parsed: toml::Value =
                content.parse().map_err(|e: toml::de::Error| GeneratorError::Manifest {
                    path: manifest.display().to_string(),
                    message: e.to_string(),
                })?;
            // Workspace-only manifests are skipped; the schema package is
            // the nearest manifest that actually declares a package.
            if let Some(name) = parsed
                .get("package")
                .and_then(|p| p.get("name"))
                .and_then(|n| n.as_str())
            {
                return Ok(ResolvedPackage {
                    root: current.to_path_buf(),
                    name: name.to_string(),
                });
            }
        }
        dir = current.parent();
    }
    Err(GeneratorError::NoManifest(
        schema_dir.display().to_string(),
    ))
}

/// External build-and-run collaborator.
///
/// The pipeline treats compilation and execution of the synthesized
/// program as a black box: it hands over a workspace and arguments and
/// learns only success or failure.
pub trait HostToolchain {
    /// Builds the workspace and runs its binary with `args`.
    fn build_and_run(&self, workspace: &Path, args: &[String]) -> Result<(), String>;
}

/// The default collaborator: `cargo run` in the synthesized workspace.
#[derive(Debug, Default)]
pub struct CargoToolchain;

impl HostToolchain for CargoToolchain {
    fn build_and_run(&self, workspace: &Path, args: &[String]) -> Result<(), String> {
        let status = Command::new("cargo")
            .arg("run")
            .arg("--quiet")
            .arg("--")
            .args(args)
            .current_dir(workspace)
            .status()
            .map_err(|e| format!("failed to invoke cargo: {e}"))?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("cargo run exited with {status}"))
        }
    }
}

/// One generation run, front to back.
pub struct Pipeline<'a> {
    config: RunConfig,
    schema_dir: PathBuf,
    toolchain: &'a dyn HostToolchain,
    /// Path dependencies for the stencil crates themselves (development
    /// runs); releases depend on the published versions.
    dev_path: Option<PathBuf>,
    /// Keep the synthesized workspace after a successful run.
    keep_workspace: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: RunConfig,
        schema_dir: impl Into<PathBuf>,
        toolchain: &'a dyn HostToolchain,
    ) -> Self {
        Self {
            config,
            schema_dir: schema_dir.into(),
            toolchain,
            dev_path: None,
            keep_workspace: false,
        }
    }

    /// Uses a stencil source checkout instead of published crates.
    pub fn dev_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dev_path = Some(path.into());
        self
    }

    /// Retains the synthesized workspace for inspection.
    pub fn keep_workspace(mut self, keep: bool) -> Self {
        self.keep_workspace = keep;
        self
    }

    /// Runs resolve, extract, synthesize, delegate and cleanup in order.
    pub fn run(&self) -> Result<(), GeneratorError> {
        let package = resolve_package(&self.schema_dir)?;
        self.info(&format!(
            "resolved package `{}` at {}",
            package.name,
            package.root.display()
        ));

        let schemas = extract::extract_dir(&self.schema_dir)?;
        if schemas.is_empty() {
            return Err(GeneratorError::NoSchemas(
                self.schema_dir.display().to_string(),
            ));
        }
        self.info(&format!("extracted {} schema declaration(s)", schemas.len()));

        let workspace = self.synthesize(&package, &schemas)?;
        self.info(&format!(
            "synthesized workspace at {}",
            workspace.path().display()
        ));

        let args = vec![
            self.config.dst_dir.display().to_string(),
            workspace.path().join(CONFIG_FILE).display().to_string(),
        ];
        match self.toolchain.build_and_run(workspace.path(), &args) {
            Ok(()) => {
                if self.keep_workspace {
                    let kept = workspace.keep();
                    self.info(&format!("keeping workspace at {}", kept.display()));
                }
                Ok(())
            }
            Err(message) => {
                // Keep the synthesized sources around for debugging
                let kept = workspace.keep();
                Err(GeneratorError::Toolchain {
                    message,
                    workspace: kept,
                })
            }
        }
    }

    /// Writes the ephemeral workspace: manifest, synthesized `main`, and
    /// the serialized run configuration.
    fn synthesize(
        &self,
        package: &ResolvedPackage,
        schemas: &[DeclaredSchema],
    ) -> Result<TempDir, GeneratorError> {
        let workspace = TempDir::with_prefix("stencil-").map_err(|e| GeneratorError::Write {
            path: "temporary workspace".to_string(),
            source: e,
        })?;

        let manifest = self.bootstrap_manifest(package);
        write(&workspace.path().join("Cargo.toml"), &manifest)?;

        let main = self.bootstrap_main(package, schemas);
        let src_dir = workspace.path().join("src");
        fs::create_dir_all(&src_dir).map_err(|e| GeneratorError::Write {
            path: src_dir.display().to_string(),
            source: e,
        })?;
        write(&src_dir.join("main.rs"), &main)?;

        let config = serde_json::to_vec_pretty(&self.config)?;
        fs::write(workspace.path().join(CONFIG_FILE), config).map_err(|e| {
            GeneratorError::Write {
                path: CONFIG_FILE.to_string(),
                source: e,
            }
        })?;

        Ok(workspace)
    }

    /// The manifest of the synthesized package. The trailing empty
    /// `[workspace]` table detaches it from any enclosing workspace.
    fn bootstrap_manifest(&self, package: &ResolvedPackage) -> String {
        let author_name = &package.name;
        let author_path = package.root.display();
        let stencil_deps = match &self.dev_path {
            Some(dev) => format!(
                "stencil-define = {{ path = \"{}\" }}\nstencil-gen = {{ path = \"{}\" }}\n",
                dev.join("define").display(),
                dev.join("gen").display()
            ),
            None => {
                let version = env!("CARGO_PKG_VERSION");
                format!(
                    "stencil-define = \"{version}\"\nstencil-gen = \"{version}\"\n"
                )
            }
        };
        format!(
            "[package]\n\
             name = \"stencil-bootstrap\"\n\
             version = \"0.0.0\"\n\
             edition = \"2024\"\n\
             publish = false\n\
             \n\
             [dependencies]\n\
             {author_name} = {{ path = \"{author_path}\" }}\n\
             {stencil_deps}\
             \n\
             [workspace]\n"
        )
    }

    /// The synthesized `main`: instantiate every extracted declaration and
    /// hand the list to the driver.
    fn bootstrap_main(&self, package: &ResolvedPackage, schemas: &[DeclaredSchema]) -> String {
        let author = format_ident!("{}", package.crate_ident());
        let entries = schemas.iter().map(|schema| {
            let name = &schema.name;
            let ty = format_ident!("{}", schema.name);
            quote! {
                (
                    #name.to_string(),
                    Box::new(#author::#ty::default()) as Box<dyn stencil_define::Schema>,
                ),
            }
        });
        let tokens = quote! {
            fn main() {
                let args: Vec<String> = std::env::args().skip(1).collect();
                let objects: Vec<(String, Box<dyn stencil_define::Schema>)> = vec![
                    #(#entries)*
                ];
                if let Err(err) = stencil_gen::driver::run_generation(objects, &args) {
                    eprintln!("{err}");
                    std::process::exit(1);
                }
            }
        };
        match syn::parse2(tokens.clone()) {
            Ok(file) => prettyplease::unparse(&file),
            Err(_) => tokens.to_string(),
        }
    }

    fn info(&self, message: &str) {
        if self.config.verbose {
            eprintln!("{message}");
        }
    }
}

/// Name of the serialized run configuration inside the workspace.
pub const CONFIG_FILE: &str = "stencil-config.json";

fn write(path: &Path, content: &str) -> Result<(), GeneratorError> {
    fs::write(path, content).map_err(|e| GeneratorError::Write {
        path: path.display().to_string(),
        source: e,
    })
}
