//! Error types and exit code mapping for srcview.
//!
//! One unified error type covers the whole driver. The taxonomy mirrors how
//! failures abort: discovery errors stop the run before any file is touched,
//! parse errors are fatal per run, a missing backup means the reverse pass
//! was invoked out of order, and I/O errors are fatal except for per-file
//! publish copies (which are logged and skipped in the driver).
//!
//! ## Exit Code Mapping
//!
//! - `2`: discovery errors (expected directory absent or not unique)
//! - `3`: parse errors (malformed source)
//! - `4`: backup missing (reverse pass without a forward pass)
//! - `5`: I/O errors
//! - `10`: internal errors (bugs, unexpected state)

use std::io;
use std::path::Path;

use thiserror::Error;

use srcview_cst::{ParserError, TransformError};

/// Unified error type for the srcview driver.
#[derive(Debug, Error)]
pub enum SrcviewError {
    /// An expected directory was absent or not found uniquely.
    #[error("discovery error: {message}")]
    Discovery { message: String },

    /// A controller file failed to parse.
    #[error("parse error in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParserError,
    },

    /// Reverse pass invoked for a file that has no backup.
    #[error("no backup found for {path}; forward pass never ran or was already reversed")]
    BackupMissing { path: String },

    /// A read, write, or copy failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A collected class path failed to resolve during editing. This means
    /// a bug in the locator/editor pairing, not bad user input.
    #[error("internal error: {source}")]
    Internal {
        #[source]
        source: TransformError,
    },
}

impl SrcviewError {
    /// Builds a discovery error from a message.
    pub fn discovery(message: impl Into<String>) -> Self {
        SrcviewError::Discovery {
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: &Path, source: io::Error) -> Self {
        SrcviewError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Wraps a parse error with the file it occurred in.
    pub fn parse(path: &Path, source: ParserError) -> Self {
        SrcviewError::Parse {
            path: path.display().to_string(),
            source,
        }
    }

    /// Stable process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            SrcviewError::Discovery { .. } => 2,
            SrcviewError::Parse { .. } => 3,
            SrcviewError::BackupMissing { .. } => 4,
            SrcviewError::Io { .. } => 5,
            SrcviewError::Internal { .. } => 10,
        }
    }
}

impl From<TransformError> for SrcviewError {
    fn from(source: TransformError) -> Self {
        SrcviewError::Internal { source }
    }
}

/// Result type for driver operations.
pub type Result<T> = std::result::Result<T, SrcviewError>;
