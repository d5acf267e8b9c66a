//! Per-entry content-hash extension records.
//!
//! Every data-bearing entry in the rewritten payload archive is preceded
//! by a synthetic extension record (type flag `x`) whose payload is a
//! single length-prefixed checksum line in the form the package installer
//! expects. The prefix is self-referential: the digit count of the prefix
//! itself contributes to the total it states, so the encoder runs a small
//! bounded fixed-point rather than a plain `format!`.

use crate::header::{BLOCK_LEN, TarHeader, layout, padded_len, type_flag};
use sha1::{Digest, Sha1};

/// Label naming the digest algorithm in a checksum line.
pub const CHECKSUM_LABEL: &str = "APK-TOOLS.checksum.SHA1";

/// Path segment marking an entry as extended metadata rather than content.
pub const MARKER_SEGMENT: &str = "PaxHeaders";

/// A synthetic extension record, ready to be written to a tar stream.
///
/// The payload is already null-padded to the block boundary; the header's
/// size field carries the unpadded line length.
#[derive(Debug)]
pub struct ExtensionRecord {
    /// Sealed header block with type flag `x`.
    pub header: TarHeader,
    /// Block-padded payload bytes (empty for directory entries).
    pub payload: Vec<u8>,
}

/// Count the decimal digits of `n`.
const fn decimal_digits(n: usize) -> usize {
    let mut digits = 1;
    let mut rest = n / 10;
    while rest > 0 {
        digits += 1;
        rest /= 10;
    }
    digits
}

/// Prefix `line` with its own total character length and a space.
///
/// The stated total covers the line plus the prefix digits themselves.
/// Computed as a bounded fixed-point: start from the unprefixed length
/// plus its digit count; if carrying the prefix into the total grew the
/// digit count (99 to 100), add one more and stop. One retry always
/// suffices for realistic digest and path lengths.
#[must_use]
pub fn length_prefixed(line: &str) -> String {
    let unprefixed = line.len();
    let mut total = unprefixed + decimal_digits(unprefixed);
    if decimal_digits(total) != decimal_digits(unprefixed) {
        total += 1;
    }
    format!("{total} {line}")
}

/// Format the checksum line for a payload digest.
#[must_use]
pub fn checksum_line(digest_hex: &str) -> String {
    length_prefixed(&format!("{CHECKSUM_LABEL}={digest_hex}\n"))
}

/// Hex-encode the 160-bit content hash of `payload`.
#[must_use]
pub fn content_digest(payload: &[u8]) -> String {
    format!("{:x}", Sha1::digest(payload))
}

/// Rewrite an entry path so it names extended metadata.
///
/// Inserts [`MARKER_SEGMENT`] immediately before the last path component:
/// the insertion point is just after the last separator found when the
/// final byte is excluded from the search (so a surviving trailing
/// separator does not count), or position 0 when no such separator
/// exists. Any doubled separator produced by the insertion is collapsed.
#[must_use]
pub fn marker_path(path: &str) -> String {
    let search_end = path.len().saturating_sub(1);
    let insert_at = path[..search_end].rfind('/').map_or(0, |i| i + 1);
    let mut rewritten = String::with_capacity(path.len() + MARKER_SEGMENT.len() + 1);
    rewritten.push_str(&path[..insert_at]);
    rewritten.push_str(MARKER_SEGMENT);
    rewritten.push('/');
    rewritten.push_str(&path[insert_at..]);
    rewritten.replace("//", "/")
}

/// Null-pad `bytes` to the next block boundary.
fn block_padded(bytes: &[u8]) -> Vec<u8> {
    let mut padded = bytes.to_vec();
    padded.resize(padded_len(bytes.len() as u64) as usize, 0);
    padded
}

/// Build the extension record describing one entry.
///
/// `canonical` must already have gone through the full identity erasure
/// pass; its path is the canonical entry path. For directory entries the
/// payload is empty and the trailing separator is stripped from the path
/// before the marker segment is inserted; for data-bearing entries the
/// payload is the checksum line for `content` (the entry's unpadded
/// payload bytes).
#[must_use]
pub fn extension_record(canonical: &TarHeader, content: &[u8]) -> ExtensionRecord {
    let is_directory = canonical.type_flag() == type_flag::DIRECTORY;
    let path = canonical.path();

    let (line, record_path) = if is_directory {
        (String::new(), path.trim_end_matches('/').to_owned())
    } else {
        (checksum_line(&content_digest(content)), path)
    };

    let mut header = canonical.clone();
    let name = marker_path(&record_path);
    let mut name_bytes = name.into_bytes();
    name_bytes.truncate(layout::NAME.len);
    header.write_padded(layout::NAME, &name_bytes);
    header.set_type_flag(type_flag::EXTENSION);
    header.set_entry_size(line.len() as u64);
    header.write_checksum();

    let payload = if line.is_empty() {
        Vec::new()
    } else {
        block_padded(line.as_bytes())
    };
    debug_assert!(payload.len() % BLOCK_LEN == 0);

    ExtensionRecord { header, payload }
}

#[cfg(test)]
#[path = "checksum_line_tests.rs"]
mod tests;
