//! Diagnostic view file emission.
//!
//! The forward pass writes one view file per affected controller containing
//! the controller's full transformed source inside a `<pre>` block. The
//! source is embedded verbatim, unescaped: the view is a debugging aid over
//! the project's own code, not a renderer of untrusted input.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SrcviewError};

/// Fixed name of the emitted view file. The injected action resolves it by
/// name via `View("Source")`.
pub const VIEW_FILE_NAME: &str = "Source.cshtml";

/// Renders the fixed HTML fragment wrapping the serialized source.
pub fn render_source_view(source: &str) -> String {
    format!("<pre>\n{}</pre>\n", source)
}

/// Writes the view file into `views_dir`, returning its path.
pub fn write_view_file(views_dir: &Path, source: &str) -> Result<PathBuf> {
    let path = views_dir.join(VIEW_FILE_NAME);
    fs::write(&path, render_source_view(source)).map_err(|e| SrcviewError::io(&path, e))?;
    Ok(path)
}
