//! Forward and reverse transform drivers.
//!
//! The forward pass rewrites each controller file to add the diagnostic
//! action; the reverse pass restores the originals from backups and, when
//! publishing, copies generated view files into the publish target tree.
//!
//! Everything here is sequential and synchronous: one file is fully parsed,
//! transformed, and written before the next begins. The `{path}.old` backup
//! convention is the only safety mechanism, and it assumes at most one
//! forward/reverse cycle is in flight per file; concurrent invocations on
//! the same project are unsupported.
//!
//! Per-file write ordering in the forward pass guarantees that a source file
//! is never overwritten without its backup already on disk: parse and edit
//! failures abort before anything is written, view files and the backup are
//! written next, and the source overwrite comes last.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, SrcviewError};
use crate::layout::{collect_controller_files, ProjectLayout};
use crate::rewrite::{CstRewriter, SourceRewriter};
use crate::views::{write_view_file, VIEW_FILE_NAME};

/// Suffix appended to a source path to form its backup path.
pub const BACKUP_SUFFIX: &str = ".old";

/// Build profile that enables the publish copy in the reverse pass.
pub const PUBLISH_PROFILE: &str = "Release";

/// Backup path for a source file: the original path with [`BACKUP_SUFFIX`]
/// appended.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut os = OsString::from(path.as_os_str());
    os.push(BACKUP_SUFFIX);
    PathBuf::from(os)
}

// ============================================================================
// Forward Pass
// ============================================================================

/// Result of transforming one controller file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardOutcome {
    pub path: PathBuf,
    /// Affected controller names, suffix already stripped. Ephemeral: used
    /// only to drive view-file creation, never persisted.
    pub affected: Vec<String>,
}

/// Transforms one controller file in place with the default C# rewriter.
pub fn forward_file(layout: &dyn ProjectLayout, path: &Path) -> Result<ForwardOutcome> {
    forward_file_with(layout, &CstRewriter::default(), path)
}

/// Transforms one controller file in place.
///
/// Ordering: read and rewrite entirely in memory first. Then view files,
/// then the backup, then the source overwrite last. If the final overwrite
/// fails the backup is already on disk and a later reverse pass still
/// restores correctness.
pub fn forward_file_with(
    layout: &dyn ProjectLayout,
    rewriter: &dyn SourceRewriter,
    path: &Path,
) -> Result<ForwardOutcome> {
    let original = fs::read_to_string(path).map_err(|e| SrcviewError::io(path, e))?;
    let rewritten = rewriter.rewrite(path, &original)?;

    for name in &rewritten.affected {
        let views_dir = layout.views_dir_for(name)?;
        let view_path = write_view_file(&views_dir, &rewritten.text)?;
        debug!(view = %view_path.display(), "wrote source view");
    }

    let backup = backup_path(path);
    fs::write(&backup, &original).map_err(|e| SrcviewError::io(&backup, e))?;
    fs::write(path, &rewritten.text).map_err(|e| SrcviewError::io(path, e))?;

    info!(
        file = %path.display(),
        controllers = rewritten.affected.len(),
        "forward pass complete"
    );
    Ok(ForwardOutcome {
        path: path.to_path_buf(),
        affected: rewritten.affected,
    })
}

/// Runs the forward pass over every controller file, in sorted order.
///
/// The first failing file aborts the run; files after it are not processed.
/// Files already transformed keep their backups, so a reverse pass still
/// restores them.
pub fn run_forward(layout: &dyn ProjectLayout) -> Result<Vec<ForwardOutcome>> {
    let files = collect_controller_files(layout)?;
    let rewriter = CstRewriter::default();
    let mut outcomes = Vec::new();
    for path in &files {
        outcomes.push(forward_file_with(layout, &rewriter, path)?);
    }
    info!(files = files.len(), "forward pass finished");
    Ok(outcomes)
}

// ============================================================================
// Reverse Pass
// ============================================================================

/// Restores one file from its backup: pure text restoration, no parsing.
/// The backup is deleted after the restore succeeds.
///
/// # Errors
///
/// [`SrcviewError::BackupMissing`] if the backup does not exist, which means
/// the forward pass never ran or the file was already reversed.
pub fn reverse_file(path: &Path) -> Result<()> {
    let backup = backup_path(path);
    let original = match fs::read(&backup) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SrcviewError::BackupMissing {
                path: path.display().to_string(),
            });
        }
        Err(e) => return Err(SrcviewError::io(&backup, e)),
    };
    fs::write(path, &original).map_err(|e| SrcviewError::io(path, e))?;
    fs::remove_file(&backup).map_err(|e| SrcviewError::io(&backup, e))?;
    info!(file = %path.display(), "restored from backup");
    Ok(())
}

/// Runs the reverse pass over every controller file, then publishes view
/// files when `profile` equals [`PUBLISH_PROFILE`].
pub fn run_reverse(layout: &dyn ProjectLayout, target_root: &Path, profile: &str) -> Result<()> {
    let files = collect_controller_files(layout)?;
    for path in &files {
        reverse_file(path)?;
    }
    if profile == PUBLISH_PROFILE {
        publish_views(layout, target_root)?;
    } else {
        debug!(profile, "publish skipped for non-release profile");
    }
    Ok(())
}

/// Copies every previously written view file into a mirrored directory under
/// the publish target root, creating intermediate directories as needed.
///
/// Best-effort per file: a failing copy is logged and skipped so the rest of
/// the views still publish.
pub fn publish_views(layout: &dyn ProjectLayout, target_root: &Path) -> Result<()> {
    let mut published = 0usize;
    for (name, dir) in layout.view_dirs()? {
        let view_file = dir.join(VIEW_FILE_NAME);
        if !view_file.is_file() {
            continue;
        }
        let dest_dir = layout.publish_views_dir(target_root, &name);
        let dest = dest_dir.join(VIEW_FILE_NAME);
        if let Err(e) = copy_view(&view_file, &dest_dir, &dest) {
            warn!(
                from = %view_file.display(),
                to = %dest.display(),
                error = %e,
                "view publish failed, skipping"
            );
            continue;
        }
        published += 1;
    }
    info!(published, target = %target_root.display(), "view publish complete");
    Ok(())
}

fn copy_view(view_file: &Path, dest_dir: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest_dir)?;
    fs::copy(view_file, dest)?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
