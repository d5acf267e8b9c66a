//! apkforge: assembles apk-style binary package archives.
//!
//! Given a staged file tree and package metadata, this crate produces a
//! single installable artifact: a gzip-compressed control tar stream
//! (package descriptor plus lifecycle scripts, terminator trimmed)
//! followed back-to-back by a gzip-compressed data tar stream in which
//! every entry has been stripped of host identity and paired with a
//! content-hash extension record.
//!
//! Staging-tree preparation, dependency resolution, script templating and
//! command-line handling are collaborator concerns; the crate consumes a
//! ready staging directory, a [`PackageMetadata`] record and a
//! [`LifecycleScripts`] mapping, and hands back the finished artifact.
//!
//! # Modules
//!
//! - [`archive`] - tar construction from a directory tree
//! - [`build`] - end-to-end package assembly
//! - [`checksum_line`] - per-entry content-hash extension records
//! - [`compress`] - dual-stream gzip compression and concatenation
//! - [`error`] - semantic error types
//! - [`header`] - fixed-layout ustar header codec
//! - [`metadata`] - package metadata and control-file rendering
//! - [`rewrite`] - streaming rewrite of the payload archive
//! - [`trim`] - end-of-archive marker removal

pub mod archive;
pub mod build;
pub mod checksum_line;
pub mod compress;
pub mod error;
pub mod header;
pub mod metadata;
pub mod rewrite;
pub mod trim;

pub use archive::{ArchiveWriter, TarballWriter};
pub use build::{BuildParams, build_package, build_package_with};
pub use error::{ForgeError, Result};
pub use metadata::{LifecycleScripts, PackageMetadata, ScriptEvent};
