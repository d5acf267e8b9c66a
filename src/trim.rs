//! Removal of a tar stream's end-of-archive marker.
//!
//! The control archive is chained directly in front of the data archive,
//! so its two terminating null blocks must go; otherwise a reader would
//! see a premature end of archive. While scanning, every copied header
//! also gets the full identity-erasure pass, catching any stray ownership
//! that survived the build step.

use crate::error::{ForgeError, Result};
use crate::header::{BLOCK_LEN, padded_len};
use crate::rewrite::{read_header_block, sibling_tmp};
use camino::Utf8Path;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};

/// Strip the end-of-archive marker from the archive at `path`, in place.
///
/// Copies records through (identity erased, checksum resealed) until two
/// consecutive all-zero blocks are seen; neither terminator block reaches
/// the output. The input is replaced via sibling temporary and atomic
/// rename on success.
///
/// # Errors
///
/// Returns [`ForgeError::UnterminatedArchive`] when input ends before two
/// consecutive null blocks are found, and [`ForgeError::Io`] for
/// underlying read or write failures. On any error the temporary is
/// removed best-effort and the original file is left untouched.
pub fn trim_end_of_archive(path: &Utf8Path) -> Result<()> {
    let tmp = sibling_tmp(path);
    if let Err(err) = trim_into(path, &tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn trim_into(path: &Utf8Path, tmp: &Utf8Path) -> Result<()> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut writer = BufWriter::new(File::create(tmp)?);
    let mut zero_blocks = 0u8;

    loop {
        let Some(header) = read_header_block(&mut reader)? else {
            return Err(ForgeError::UnterminatedArchive {
                path: path.to_owned(),
            });
        };

        if header.is_zero_block() {
            zero_blocks += 1;
            if zero_blocks == 2 {
                break;
            }
            continue;
        }

        // A lone null block was not a terminator after all; put it back.
        if zero_blocks == 1 {
            writer.write_all(&[0u8; BLOCK_LEN])?;
        }
        zero_blocks = 0;

        let mut payload = vec![0u8; padded_len(header.entry_size()) as usize];
        reader.read_exact(&mut payload).map_err(|err| {
            if err.kind() == ErrorKind::UnexpectedEof {
                ForgeError::UnterminatedArchive {
                    path: path.to_owned(),
                }
            } else {
                ForgeError::Io(err)
            }
        })?;

        let mut output_header = header;
        output_header.erase_identity();
        output_header.write_checksum();
        writer.write_all(output_header.as_bytes())?;
        writer.write_all(&payload)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
#[path = "trim_tests.rs"]
mod tests;
