//! The source-rewriting capability consumed by the forward pass.
//!
//! The driver is grammar-agnostic: it hands a [`SourceRewriter`] the file
//! text and gets back the rewritten text plus the affected controller names.
//! [`CstRewriter`] is the one real implementation, built on `srcview-cst`;
//! any conforming grammar could be substituted behind the same seam.

use std::path::Path;

use tracing::debug;

use srcview_cst::{append_method, collect_classes, parse_unit, serialize, synthesize_method};

use crate::error::{Result, SrcviewError};

// ============================================================================
// Fixed Transformation Constants
// ============================================================================

/// Base type a class must declare to be eligible for transformation.
pub const MARKER_BASE_TYPE: &str = "Controller";

/// Name of the injected diagnostic action.
pub const ACTION_NAME: &str = "Source";

/// Return type of the injected action.
pub const ACTION_RETURN_TYPE: &str = "ActionResult";

/// View-resolution call invoked by the injected action's body.
pub const VIEW_CALL: &str = "View";

/// Suffix stripped from a class name to get its view directory name.
pub const CONTROLLER_SUFFIX: &str = "Controller";

// ============================================================================
// Rewriter Capability
// ============================================================================

/// Result of rewriting one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// The transformed source text, normalized.
    pub text: String,
    /// Affected controller names, suffix already stripped, in match order.
    pub affected: Vec<String>,
}

/// Grammar-facing seam of the forward pass: parse, locate, edit, serialize.
///
/// Implementations must be pure with respect to the file system; all writes
/// stay in the driver.
pub trait SourceRewriter {
    /// Rewrites `source`, injecting the diagnostic action into every
    /// matching class. `path` is only used for error reporting.
    fn rewrite(&self, path: &Path, source: &str) -> Result<RewriteOutcome>;
}

// ============================================================================
// CST Rewriter
// ============================================================================

/// [`SourceRewriter`] backed by the `srcview-cst` C# subset grammar.
#[derive(Debug, Clone)]
pub struct CstRewriter {
    pub marker: String,
    pub action_name: String,
    pub return_type: String,
    pub view_call: String,
    pub suffix: String,
}

impl Default for CstRewriter {
    fn default() -> Self {
        CstRewriter {
            marker: MARKER_BASE_TYPE.to_string(),
            action_name: ACTION_NAME.to_string(),
            return_type: ACTION_RETURN_TYPE.to_string(),
            view_call: VIEW_CALL.to_string(),
            suffix: CONTROLLER_SUFFIX.to_string(),
        }
    }
}

impl SourceRewriter for CstRewriter {
    fn rewrite(&self, path: &Path, source: &str) -> Result<RewriteOutcome> {
        let unit = parse_unit(source).map_err(|e| SrcviewError::parse(path, e))?;

        let matches = collect_classes(&unit, &self.marker);
        let mut tree = unit;
        let mut affected = Vec::new();
        for m in &matches {
            let method =
                synthesize_method(&self.action_name, &self.return_type, &self.view_call);
            tree = append_method(&tree, &m.path, method)?;
            debug!(class = %m.name, file = %path.display(), "injected diagnostic action");
            affected.push(strip_suffix(&m.name, &self.suffix));
        }

        Ok(RewriteOutcome {
            text: serialize(&tree),
            affected,
        })
    }
}

/// View directory name for a matched class: the name with its trailing
/// suffix stripped, or the full name when the suffix is absent or the stem
/// would be empty.
fn strip_suffix(class_name: &str, suffix: &str) -> String {
    class_name
        .strip_suffix(suffix)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(class_name)
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================
