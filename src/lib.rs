//! Build-time source transformer for MVC controller files.
//!
//! The forward pass injects a diagnostic `Source` action into every class
//! extending the `Controller` base type and emits a view file rendering the
//! transformed source; the reverse pass restores originals from backups and
//! optionally publishes the generated views. The AST machinery lives in the
//! `srcview-cst` crate; this crate holds:
//! - Error taxonomy and exit codes
//! - Project layout discovery (the file-system collaborator)
//! - The grammar-facing rewriter seam
//! - Forward/reverse transform drivers
//! - View file emission

pub mod driver;
pub mod error;
pub mod layout;
pub mod rewrite;
pub mod views;

pub use driver::{forward_file, reverse_file, run_forward, run_reverse, ForwardOutcome};
pub use error::{Result, SrcviewError};
pub use layout::{DiskLayout, ProjectLayout};
pub use rewrite::{CstRewriter, SourceRewriter};
