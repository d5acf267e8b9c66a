//! End-to-end package assembly.
//!
//! Orchestrates the whole pipeline: payload tar, streaming rewrite,
//! whole-archive content hash, control staging, control tar, terminator
//! trim, and finally compression and concatenation into the output
//! artifact. Everything in between lives in a build-scoped temporary
//! directory that is dropped on every exit path; the output path itself
//! is populated via sibling temporary and atomic rename, so a failed
//! build never leaves a partial artifact behind.

use crate::archive::{ArchiveWriter, TarballWriter};
use crate::compress::concat_compressed;
use crate::error::{ForgeError, Result};
use crate::metadata::{LifecycleScripts, PackageMetadata, write_control_dir};
use crate::rewrite::{rewrite_archive, sibling_tmp};
use crate::trim::trim_end_of_archive;
use camino::{Utf8Path, Utf8PathBuf};
use log::warn;
use sha2::{Digest, Sha256};
use std::fs::{self, File};

/// Inputs for one package build.
#[derive(Debug)]
pub struct BuildParams {
    /// Externally prepared filesystem-root mirror of the payload.
    pub staging_dir: Utf8PathBuf,
    /// Package metadata, already normalised on construction.
    pub metadata: PackageMetadata,
    /// Optional lifecycle script bodies.
    pub scripts: LifecycleScripts,
    /// Where the finished artifact lands.
    pub output_path: Utf8PathBuf,
}

/// Assemble a package with the default `tar`-crate archive writer.
///
/// # Errors
///
/// See [`build_package_with`].
pub fn build_package(params: &BuildParams) -> Result<Utf8PathBuf> {
    build_package_with(&TarballWriter, params)
}

/// Assemble a package using the given archiving capability.
///
/// Returns the path of the finished artifact (the same as
/// `params.output_path`).
///
/// # Errors
///
/// Returns [`ForgeError::EmitFailed`] when the archive writer fails,
/// [`ForgeError::UnterminatedArchive`] when the freshly built control
/// archive lacks its end-of-archive marker, and [`ForgeError::Io`] for
/// any other I/O failure. On error no artifact is produced.
pub fn build_package_with(
    archiver: &dyn ArchiveWriter,
    params: &BuildParams,
) -> Result<Utf8PathBuf> {
    // Signing is not implemented; the installing system has to be told to
    // accept an untrusted package.
    warn!(
        "package {} will be unsigned; install it with the untrusted-package override",
        params.metadata.name()
    );

    let work = tempfile::tempdir()?;
    let work_dir = Utf8PathBuf::from_path_buf(work.path().to_path_buf())
        .map_err(|path| ForgeError::NonUtf8TempDir { path })?;

    let data_tar = work_dir.join("data.tar");
    write_tar(archiver, &params.staging_dir, &data_tar)?;
    rewrite_archive(&data_tar)?;

    // The whole data archive is read once to hash it; peak memory is
    // bounded by the archive size.
    let data_bytes = fs::read(data_tar.as_std_path())?;
    let datahash = format!("{:x}", Sha256::digest(&data_bytes));
    drop(data_bytes);

    let control_dir = work_dir.join("control");
    fs::create_dir(control_dir.as_std_path())?;
    write_control_dir(&control_dir, &params.metadata, &params.scripts, &datahash)?;

    let control_tar = work_dir.join("control.tar");
    write_tar(archiver, &control_dir, &control_tar)?;
    trim_end_of_archive(&control_tar)?;

    let staged_output = sibling_tmp(&params.output_path);
    if let Err(err) = concat_compressed(&control_tar, &data_tar, &staged_output) {
        let _ = fs::remove_file(staged_output.as_std_path());
        return Err(err);
    }
    fs::rename(staged_output.as_std_path(), params.output_path.as_std_path())?;

    Ok(params.output_path.clone())
}

/// Build a raw tar archive of `source` at `dest`.
fn write_tar(archiver: &dyn ArchiveWriter, source: &Utf8Path, dest: &Utf8Path) -> Result<()> {
    let mut file = File::create(dest.as_std_path())?;
    archiver.build_archive(source, &mut file)?;
    Ok(())
}
