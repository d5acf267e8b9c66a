//! Tar archive construction from a staged directory tree.
//!
//! Byte emission is delegated to the `tar` crate behind a narrow
//! collaborator trait, so a different emitter (or a shelled-out tool)
//! could be substituted as long as its entry ordering and field layout
//! match. This module only controls what gets archived and in what order.

use crate::error::{ForgeError, Result};
use crate::metadata::CONTROL_FILE;
use camino::Utf8Path;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// The archiving capability: emit a ustar stream for a directory tree.
pub trait ArchiveWriter {
    /// Write a tar archive of `source_dir`'s contents into `output`.
    ///
    /// Stored paths are relative to `source_dir`, never absolute.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying emitter is fatal and aborts the
    /// build.
    fn build_archive(&self, source_dir: &Utf8Path, output: &mut dyn Write) -> Result<()>;
}

/// `tar`-crate backed [`ArchiveWriter`].
///
/// Enumerates all entries recursively, hidden ones included. When the
/// control metadata file is present it is forced to be the first entry
/// written, because the installer expects to find it without scanning the
/// whole archive. All other entries keep whatever order the directory
/// listing returns; ordering across hosts is deliberately not guaranteed.
#[derive(Debug, Default)]
pub struct TarballWriter;

impl ArchiveWriter for TarballWriter {
    fn build_archive(&self, source_dir: &Utf8Path, output: &mut dyn Write) -> Result<()> {
        let mut builder = tar::Builder::new(output);
        builder.follow_symlinks(false);
        append_dir_contents(&mut builder, source_dir, source_dir.as_std_path(), Path::new(""))?;
        builder.finish().map_err(|source| ForgeError::EmitFailed {
            path: source_dir.to_owned(),
            source,
        })?;
        Ok(())
    }
}

fn append_dir_contents<W: Write>(
    builder: &mut tar::Builder<W>,
    root: &Utf8Path,
    dir: &Path,
    prefix: &Path,
) -> Result<()> {
    let mut entries: Vec<fs::DirEntry> = fs::read_dir(dir)?.collect::<io::Result<_>>()?;

    // Control file first; everything else keeps listing order.
    if let Some(i) = entries.iter().position(|e| e.file_name() == CONTROL_FILE) {
        let control = entries.remove(i);
        entries.insert(0, control);
    }

    for entry in entries {
        let path = entry.path();
        let stored = prefix.join(entry.file_name());
        let emit_failed = |source| ForgeError::EmitFailed {
            path: root.to_owned(),
            source,
        };
        if entry.file_type()?.is_dir() {
            builder.append_dir(&stored, &path).map_err(emit_failed)?;
            append_dir_contents(builder, root, &path, &stored)?;
        } else {
            builder
                .append_path_with_name(&path, &stored)
                .map_err(emit_failed)?;
        }
    }
    Ok(())
}
