//! Error types for the package assembler.
//!
//! This module defines semantic error variants for the archive build
//! pipeline. A build either produces a complete artifact or fails with one
//! of these errors; there is no partial-success state.

use camino::Utf8PathBuf;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while assembling a package archive.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// A tar stream ended before its two-null-record terminator was found.
    #[error("malformed archive {path}: input ended before the end-of-archive marker")]
    UnterminatedArchive {
        /// Path of the offending archive.
        path: Utf8PathBuf,
    },

    /// The archiving capability failed while emitting a tar stream.
    #[error("tar emission failed for {path}: {source}")]
    EmitFailed {
        /// Directory the archive was being built from.
        path: Utf8PathBuf,
        /// The underlying error reported by the archive writer.
        #[source]
        source: std::io::Error,
    },

    /// A build-scoped temporary directory has a non-UTF-8 path.
    #[error("temporary build directory is not valid UTF-8: {path:?}")]
    NonUtf8TempDir {
        /// The offending path.
        path: PathBuf,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`ForgeError`].
pub type Result<T> = std::result::Result<T, ForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unterminated_archive_names_the_path() {
        let err = ForgeError::UnterminatedArchive {
            path: Utf8PathBuf::from("/tmp/control.tar"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/control.tar"));
        assert!(msg.contains("end-of-archive"));
    }

    #[test]
    fn emit_failed_preserves_source() {
        let err = ForgeError::EmitFailed {
            path: Utf8PathBuf::from("/stage"),
            source: std::io::Error::other("disk full"),
        };
        assert!(err.to_string().contains("/stage"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn io_errors_convert_via_from() {
        let err: ForgeError = std::io::Error::other("denied").into();
        assert!(matches!(err, ForgeError::Io(_)));
    }
}
