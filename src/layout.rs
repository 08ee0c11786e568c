//! Project layout discovery and the `ProjectLayout` collaborator.
//!
//! The transformation engine is independent of any on-disk convention; it
//! consumes the small [`ProjectLayout`] capability defined here. The
//! concrete [`DiskLayout`] implements the fixed web-project contract: one
//! directory containing both `Controllers` and `Views` subdirectories, with
//! a one-to-one naming convention between a controller's type name (minus
//! its `Controller` suffix) and a same-named subdirectory under `Views`.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Result, SrcviewError};

/// Name of the controllers subdirectory inside the web project.
pub const CONTROLLERS_DIR: &str = "Controllers";

/// Name of the views subdirectory inside the web project.
pub const VIEWS_DIR: &str = "Views";

/// Extension of controller source files.
pub const CONTROLLER_EXT: &str = "cs";

// ============================================================================
// Layout Capability
// ============================================================================

/// File-system layout collaborator consumed by the transform driver.
///
/// Keeping this behind a trait keeps the engine free of directory-crawling
/// assumptions; tests substitute a layout rooted in a temp directory.
pub trait ProjectLayout {
    /// Directory holding the controller source files.
    fn controllers_dir(&self) -> &Path;

    /// View directory for a controller name (suffix already stripped).
    ///
    /// # Errors
    ///
    /// [`SrcviewError::Discovery`] if the directory does not exist; the
    /// naming convention is a hard contract.
    fn views_dir_for(&self, controller: &str) -> Result<PathBuf>;

    /// All existing per-controller view directories, as (name, path) pairs
    /// sorted by name.
    fn view_dirs(&self) -> Result<Vec<(String, PathBuf)>>;

    /// Mirrored view directory for a controller under a publish target root.
    /// Purely path arithmetic; the driver creates it on demand.
    fn publish_views_dir(&self, target_root: &Path, controller: &str) -> PathBuf;
}

// ============================================================================
// Disk Layout
// ============================================================================

/// [`ProjectLayout`] backed by the conventional web-project directory tree.
#[derive(Debug, Clone)]
pub struct DiskLayout {
    web_root: PathBuf,
    controllers: PathBuf,
    views: PathBuf,
}

impl DiskLayout {
    /// Discovers the web project under `root`: the unique directory (the
    /// root itself included) containing both `Controllers` and `Views`
    /// subdirectories.
    ///
    /// # Errors
    ///
    /// [`SrcviewError::Discovery`] when no candidate or more than one
    /// candidate exists. Discovery failures abort the run before any
    /// transformation happens.
    pub fn discover(root: &Path) -> Result<Self> {
        let mut candidates = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_dir() {
                continue;
            }
            let dir = entry.path();
            if dir.join(CONTROLLERS_DIR).is_dir() && dir.join(VIEWS_DIR).is_dir() {
                candidates.push(dir.to_path_buf());
            }
        }

        match candidates.len() {
            0 => Err(SrcviewError::discovery(format!(
                "no directory under {} contains both {} and {}",
                root.display(),
                CONTROLLERS_DIR,
                VIEWS_DIR
            ))),
            1 => Ok(Self::at(candidates.remove(0))),
            n => Err(SrcviewError::discovery(format!(
                "web project is ambiguous: {} candidate directories under {}",
                n,
                root.display()
            ))),
        }
    }

    /// Builds a layout rooted at a known web-project directory, skipping
    /// discovery. Used by tests and by callers that already know the root.
    pub fn at(web_root: PathBuf) -> Self {
        let controllers = web_root.join(CONTROLLERS_DIR);
        let views = web_root.join(VIEWS_DIR);
        DiskLayout {
            web_root,
            controllers,
            views,
        }
    }

    /// The web-project root this layout is anchored at.
    pub fn web_root(&self) -> &Path {
        &self.web_root
    }
}

impl ProjectLayout for DiskLayout {
    fn controllers_dir(&self) -> &Path {
        &self.controllers
    }

    fn views_dir_for(&self, controller: &str) -> Result<PathBuf> {
        let dir = self.views.join(controller);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(SrcviewError::discovery(format!(
                "no view directory for controller {:?}: expected {}",
                controller,
                dir.display()
            )))
        }
    }

    fn view_dirs(&self) -> Result<Vec<(String, PathBuf)>> {
        let entries =
            fs::read_dir(&self.views).map_err(|e| SrcviewError::io(&self.views, e))?;
        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SrcviewError::io(&self.views, e))?;
            let path = entry.path();
            if path.is_dir() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    dirs.push((name.to_string(), path.clone()));
                }
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn publish_views_dir(&self, target_root: &Path, controller: &str) -> PathBuf {
        target_root.join(VIEWS_DIR).join(controller)
    }
}

// ============================================================================
// Controller File Collection
// ============================================================================

/// Collects controller source files (`.cs`) under the controllers directory,
/// recursively, sorted by path for deterministic processing order.
///
/// Backup files never collide with this filter: their final extension is the
/// backup suffix, not `.cs`.
pub fn collect_controller_files(layout: &dyn ProjectLayout) -> Result<Vec<PathBuf>> {
    let dir = layout.controllers_dir();
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == CONTROLLER_EXT) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

// ============================================================================
// Tests
// ============================================================================
