//! Output assembly and file writing.
//!
//! Rendered token streams are validated with `syn` (a malformed block
//! never reaches disk), formatted with `prettyplease`, stamped with a
//! generated-code notice, and written atomically via temp file + rename.
//! Filename derivation also lives here: every emitted file carries the
//! generated marker before its extension, and the reserved `$object` stem
//! is substituted with the object's derived file base.

use std::fs;
use std::path::Path;

use proc_macro2::TokenStream;

use crate::errors::GeneratorError;

/// Marker inserted before the extension of every emitted filename.
pub const GENERATED_MARKER: &str = "_gen";

/// Reserved filename stem substituted with the object's file base.
pub const OBJECT_STEM: &str = "$object";

/// Notice prepended to every emitted file.
const GENERATED_NOTICE: &str = "// Code generated by stencil-gen. Do not edit manually.\n\n";

/// Derives the destination filename for an artifact block.
///
/// The block's namespace (`object/`, `run/`) is stripped, the reserved
/// `$object` stem is substituted when a file base is supplied, and the
/// generated marker is inserted before the extension. Template-relative
/// subdirectories survive.
///
/// Returns `None` for names without a namespace (not artifacts).
///
/// ## Examples
///
/// ```
/// use stencil_gen::emit::artifact_filename;
///
/// assert_eq!(
///     artifact_filename("object/$object.rs", Some("thing")),
///     Some("thing_gen.rs".to_string())
/// );
/// assert_eq!(
///     artifact_filename("run/mod.rs", None),
///     Some("mod_gen.rs".to_string())
/// );
/// assert_eq!(
///     artifact_filename("run/sub/extras.rs", None),
///     Some("sub/extras_gen.rs".to_string())
/// );
/// ```
pub fn artifact_filename(block_name: &str, file_base: Option<&str>) -> Option<String> {
    let rel = block_name.split_once('/')?.1;
    let rel = match file_base {
        Some(base) => rel.replace(OBJECT_STEM, base),
        None => rel.to_string(),
    };
    Some(mark_filename(&rel))
}

/// Inserts the generated marker before the filename's extension.
pub fn mark_filename(rel: &str) -> String {
    match rel.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}{GENERATED_MARKER}.{ext}"),
        None => format!("{rel}{GENERATED_MARKER}"),
    }
}

/// Validates rendered tokens as a complete Rust file.
pub fn validate_code(tokens: &TokenStream) -> Result<syn::File, GeneratorError> {
    syn::parse2(tokens.clone()).map_err(|e| GeneratorError::CodeGen(e.to_string()))
}

/// Formats a validated file and prepends the generated-code notice.
pub fn format_code(file: &syn::File) -> String {
    format!("{GENERATED_NOTICE}{}", prettyplease::unparse(file))
}

/// Writes content atomically: temp file in the same directory, then
/// rename, so a crashed run never leaves a half-written artifact.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), GeneratorError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| GeneratorError::Write {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).map_err(|e| GeneratorError::Write {
        path: temp_path.display().to_string(),
        source: e,
    })?;
    fs::rename(&temp_path, path).map_err(|e| GeneratorError::Write {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

/// Validates, formats and writes one rendered artifact.
pub fn emit_file(tokens: &TokenStream, path: &Path) -> Result<(), GeneratorError> {
    let file = validate_code(tokens)?;
    let formatted = format_code(&file);
    write_atomic(path, &formatted)
}
