//! Independent compression and concatenation of the two tar streams.
//!
//! Each stream becomes its own self-terminating gzip member, written
//! back-to-back into the final output: control member first, data member
//! second. gzip readers treat concatenated members as one logical stream,
//! which is exactly what the installer relies on.

use crate::error::Result;
use camino::Utf8Path;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{Read, Write};

/// Chunk size for streaming compression; no whole-file buffering.
const CHUNK_LEN: usize = 4096;

/// Compress `control_tar` and `data_tar` into `output`, control first.
///
/// # Errors
///
/// Returns [`crate::ForgeError::Io`] if any read, write, or encoder
/// finalisation fails.
pub fn concat_compressed(
    control_tar: &Utf8Path,
    data_tar: &Utf8Path,
    output: &Utf8Path,
) -> Result<()> {
    let mut out = File::create(output.as_std_path())?;
    compress_member(control_tar, &mut out)?;
    compress_member(data_tar, &mut out)?;
    Ok(())
}

/// Stream one file through a gzip encoder into `output` as a complete
/// member.
fn compress_member(source: &Utf8Path, output: &mut File) -> Result<()> {
    let mut input = File::open(source.as_std_path())?;
    let mut encoder = GzEncoder::new(&mut *output, Compression::default());
    let mut chunk = [0u8; CHUNK_LEN];
    loop {
        let n = input.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        encoder.write_all(&chunk[..n])?;
    }
    encoder.finish()?;
    Ok(())
}
