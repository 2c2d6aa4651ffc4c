//! Error types for the stencil generator.
//!
//! Everything above the generated-object boundary is fatal: a generation
//! run either completes or aborts, so these errors propagate to the CLI
//! which prints them and exits non-zero. Recoverable errors live in
//! `stencil_runtime::ObjectError` and belong to generated code.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during a generation run.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// A schema source file failed to parse.
    #[error("failed to parse `{path}`: {message}")]
    Parse {
        /// The file the syntax error came from.
        path: String,
        /// The underlying parser diagnostic.
        message: String,
    },

    /// No schema declarations were found in the scanned directory.
    #[error("no schema declarations found in `{0}`")]
    NoSchemas(String),

    /// No package manifest was found above the schema directory.
    #[error("no package manifest found above `{0}`")]
    NoManifest(String),

    /// A package manifest exists but could not be understood.
    #[error("failed to read manifest `{path}`: {message}")]
    Manifest {
        /// Path of the offending manifest.
        path: String,
        /// What went wrong with it.
        message: String,
    },

    /// A core template block was requested but is not defined anywhere.
    #[error("no template block named `{0}`")]
    UnknownBlock(String),

    /// A template block failed to render.
    #[error("template block `{block}` failed: {message}")]
    BlockRender {
        /// The block being rendered.
        block: String,
        /// Why rendering failed.
        message: String,
    },

    /// Generated code did not parse as a Rust file.
    #[error("generated code is invalid: {0}")]
    CodeGen(String),

    /// Two fields of one object map to the same wire key.
    #[error("object `{object}` declares wire key `{key}` more than once")]
    DuplicateWireKey {
        /// The object with the collision.
        object: String,
        /// The colliding wire key.
        key: String,
    },

    /// An `--exclude-symbol` pattern is not a valid regular expression.
    #[error("invalid symbol exclusion pattern `{pattern}`: {message}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// The regex engine's diagnostic.
        message: String,
    },

    /// Reading an input file failed.
    #[error("failed to read `{path}`: {source}")]
    Read {
        /// The path being read.
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing an output file failed.
    #[error("failed to write `{path}`: {source}")]
    Write {
        /// The path being written.
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The synthesized program was invoked with unusable arguments.
    #[error("invalid driver invocation: {0}")]
    Invocation(String),

    /// The host toolchain failed to build or run the synthesized program.
    ///
    /// The synthesized workspace is retained so it can be inspected.
    #[error("host toolchain failed: {message} (synthesized sources kept in `{workspace}`)")]
    Toolchain {
        /// What the toolchain reported.
        message: String,
        /// Where the synthesized program still lives.
        workspace: PathBuf,
    },

    /// Invalid run configuration input.
    #[error(transparent)]
    Config(#[from] stencil_define::ConfigError),

    /// A JSON (de)serialization failure, typically of the run
    /// configuration.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
