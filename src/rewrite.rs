//! Streaming rewrite of the payload tar archive.
//!
//! A single forward pass over an existing tar stream: every header is
//! stripped of host identity and re-owned by root, and every data-bearing
//! record gains a content-hash extension record immediately before it.
//! The pass writes to a sibling temporary file and replaces the input via
//! atomic rename, so a crash mid-pass leaves the original untouched.

use crate::checksum_line::extension_record;
use crate::error::Result;
use crate::header::{BLOCK_LEN, TarHeader, padded_len};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};

/// Suffix convention for the sibling temporary of an in-place pass.
pub(crate) const TMP_SUFFIX: &str = ".tmp";

/// Sibling temporary path for an in-place archive pass.
pub(crate) fn sibling_tmp(path: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{path}{TMP_SUFFIX}"))
}

/// Fill `buf` from `reader`, stopping early only at end of input.
pub(crate) fn read_up_to(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Read the next 512-byte header block.
///
/// Returns `Ok(None)` at end of input; a trailing block shorter than 512
/// bytes also reads as end of input.
pub(crate) fn read_header_block(reader: &mut impl Read) -> Result<Option<TarHeader>> {
    let mut block = [0u8; BLOCK_LEN];
    let filled = read_up_to(reader, &mut block)?;
    if filled < BLOCK_LEN {
        return Ok(None);
    }
    Ok(Some(TarHeader::from_block(block)))
}

/// Rewrite the archive at `path` in place.
///
/// Each record is normalised to root ownership, and an extension record
/// carrying the entry's content hash (or its canonical path alone, for
/// directories) is interleaved before it. End-of-archive marker blocks are
/// copied through unchanged; the pass stops after the second consecutive
/// one or when input runs out. A missing terminator is not an error here;
/// only the trimmer enforces its presence.
///
/// # Errors
///
/// Returns [`crate::ForgeError::Io`] if reading the input or writing the
/// temporary fails; on failure the temporary is removed best-effort and
/// the original file is left untouched.
pub fn rewrite_archive(path: &Utf8Path) -> Result<()> {
    let tmp = sibling_tmp(path);
    if let Err(err) = rewrite_into(path, &tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn rewrite_into(path: &Utf8Path, tmp: &Utf8Path) -> Result<()> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut writer = BufWriter::new(File::create(tmp)?);
    let mut zero_blocks = 0u8;

    while let Some(header) = read_header_block(&mut reader)? {
        if header.is_zero_block() {
            writer.write_all(header.as_bytes())?;
            zero_blocks += 1;
            if zero_blocks == 2 {
                break;
            }
            continue;
        }
        zero_blocks = 0;

        let declared = header.entry_size();
        let mut payload = vec![0u8; padded_len(declared) as usize];
        let filled = read_up_to(&mut reader, &mut payload)?;
        payload.truncate(filled);

        let mut canonical = header.clone();
        canonical.erase_identity();
        let content_len = usize::try_from(declared)
            .unwrap_or(usize::MAX)
            .min(payload.len());
        let record = extension_record(&canonical, &payload[..content_len]);

        let mut output_header = header;
        output_header.assign_root_identity();
        output_header.write_checksum();

        writer.write_all(record.header.as_bytes())?;
        writer.write_all(&record.payload)?;
        writer.write_all(output_header.as_bytes())?;
        writer.write_all(&payload)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
#[path = "rewrite_tests.rs"]
mod tests;
