//! Fixed-layout ustar header codec.
//!
//! A tar header is a single 512-byte block with fields at fixed byte
//! offsets. This module owns that layout: reading and writing named byte
//! ranges, the ustar checksum convention, and the two identity
//! normalisation passes applied before a header reaches an output stream.
//! All operations preserve the block length invariant; a [`TarHeader`] is
//! always exactly [`BLOCK_LEN`] bytes.

use std::fmt;

/// Length of one tar block, and of every tar header.
pub const BLOCK_LEN: usize = 512;

/// The POSIX ustar magic and version bytes (`ustar\0` + `00`).
pub const USTAR_MAGIC: &[u8; 8] = b"ustar\x0000";

/// An octal-encoded zero with its NUL terminator, at numeric field width.
const ZERO_OCTAL: &[u8; 8] = b"0000000\0";

/// Type flag byte values for the entry kinds this assembler handles.
pub mod type_flag {
    /// Regular file.
    pub const REGULAR: u8 = b'0';
    /// Directory.
    pub const DIRECTORY: u8 = b'5';
    /// Extended-header record carrying metadata for the following entry.
    pub const EXTENSION: u8 = b'x';
    /// The null byte found in end-of-archive marker blocks.
    pub const NULL: u8 = 0;
}

/// A named byte range inside a header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Byte offset of the field within the block.
    pub offset: usize,
    /// Field width in bytes.
    pub len: usize,
}

impl Field {
    const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Exclusive end offset of the field.
    #[must_use]
    pub const fn end(self) -> usize {
        self.offset + self.len
    }
}

/// The ustar field layout, as a table of descriptive constants.
pub mod layout {
    use super::Field;

    /// Entry path.
    pub const NAME: Field = Field::new(0, 100);
    /// Numeric owner user id, octal ASCII.
    pub const UID: Field = Field::new(108, 8);
    /// Numeric owner group id, octal ASCII.
    pub const GID: Field = Field::new(116, 8);
    /// Payload size, octal ASCII.
    pub const SIZE: Field = Field::new(124, 12);
    /// Header checksum.
    pub const CHECKSUM: Field = Field::new(148, 8);
    /// Entry kind byte.
    pub const TYPEFLAG: Field = Field::new(156, 1);
    /// Magic and version.
    pub const MAGIC: Field = Field::new(257, 8);
    /// Owner user name.
    pub const UNAME: Field = Field::new(265, 32);
    /// Owner group name.
    pub const GNAME: Field = Field::new(297, 32);
    /// Device major number.
    pub const DEVMAJOR: Field = Field::new(329, 8);
    /// Device minor number.
    pub const DEVMINOR: Field = Field::new(337, 8);
}

/// Round `n` up to the next multiple of [`BLOCK_LEN`].
///
/// Tar payloads occupy whole blocks; the final block is null-padded.
#[must_use]
pub const fn padded_len(n: u64) -> u64 {
    n.div_ceil(BLOCK_LEN as u64) * BLOCK_LEN as u64
}

/// An owned 512-byte tar header block.
///
/// Field writes go through [`TarHeader::write`] (exact width) or
/// [`TarHeader::write_padded`] (explicit null padding); neither can change
/// the block length.
#[derive(Clone, PartialEq, Eq)]
pub struct TarHeader([u8; BLOCK_LEN]);

impl TarHeader {
    /// Wrap a raw 512-byte block.
    #[must_use]
    pub const fn from_block(block: [u8; BLOCK_LEN]) -> Self {
        Self(block)
    }

    /// Borrow the raw block bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; BLOCK_LEN] {
        &self.0
    }

    /// Read a field's bytes.
    #[must_use]
    pub fn bytes(&self, field: Field) -> &[u8] {
        &self.0[field.offset..field.end()]
    }

    /// Overwrite a field with a value of exactly the field's width.
    pub fn write(&mut self, field: Field, value: &[u8]) {
        assert_eq!(value.len(), field.len, "field write must match field width");
        self.0[field.offset..field.end()].copy_from_slice(value);
    }

    /// Overwrite a field with `value`, null-padding to the field's width.
    pub fn write_padded(&mut self, field: Field, value: &[u8]) {
        assert!(value.len() <= field.len, "value exceeds field width");
        self.0[field.offset..field.offset + value.len()].copy_from_slice(value);
        self.0[field.offset + value.len()..field.end()].fill(0);
    }

    /// The entry kind byte.
    #[must_use]
    pub const fn type_flag(&self) -> u8 {
        self.0[layout::TYPEFLAG.offset]
    }

    /// Set the entry kind byte.
    pub fn set_type_flag(&mut self, flag: u8) {
        self.0[layout::TYPEFLAG.offset] = flag;
    }

    /// True when every byte of the block is zero.
    ///
    /// Two consecutive such blocks form the end-of-archive marker.
    #[must_use]
    pub fn is_zero_block(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// The entry path, read up to the first NUL in the name field.
    #[must_use]
    pub fn path(&self) -> String {
        let name = self.bytes(layout::NAME);
        let end = name.iter().position(|b| *b == 0).unwrap_or(name.len());
        String::from_utf8_lossy(&name[..end]).into_owned()
    }

    /// Decode the declared payload size from its octal ASCII field.
    ///
    /// Parsing is lenient: non-octal bytes terminate the scan rather than
    /// failing, so a malformed field reads as a (possibly wrong) size
    /// instead of an error. The stream passes do not validate sizes.
    #[must_use]
    pub fn entry_size(&self) -> u64 {
        let mut size: u64 = 0;
        let mut seen_digit = false;
        for byte in self.bytes(layout::SIZE) {
            match byte {
                b'0'..=b'7' => {
                    size = size * 8 + u64::from(byte - b'0');
                    seen_digit = true;
                }
                b' ' if !seen_digit => {}
                _ => break,
            }
        }
        size
    }

    /// Encode `size` into the octal ASCII size field.
    pub fn set_entry_size(&mut self, size: u64) {
        let encoded = format!("{size:011o}\0");
        self.write(layout::SIZE, encoded.as_bytes());
    }

    /// Compute and store the ustar header checksum.
    ///
    /// The 8-byte checksum field is blanked to ASCII spaces, all 512
    /// unsigned byte values are summed, and the sum is stored as six
    /// zero-padded octal digits followed by a NUL; the final byte keeps the
    /// space written during blanking.
    pub fn write_checksum(&mut self) {
        self.write(layout::CHECKSUM, b"        ");
        let sum: u32 = self.0.iter().map(|b| u32::from(*b)).sum();
        let digits = format!("{sum:06o}");
        let field = layout::CHECKSUM;
        self.0[field.offset..field.offset + 6].copy_from_slice(digits.as_bytes());
        self.0[field.offset + 6] = 0;
    }

    /// Strip every host-specific identity field from the header.
    ///
    /// Used when deriving the canonical form of an entry for hashing and
    /// when emitting trimmed control-archive headers: magic is pinned to
    /// the ustar literal, numeric uid/gid become octal zero, owner and
    /// group names are blanked, and device numbers become octal zero.
    pub fn erase_identity(&mut self) {
        self.write(layout::MAGIC, USTAR_MAGIC);
        self.write(layout::UID, ZERO_OCTAL);
        self.write(layout::GID, ZERO_OCTAL);
        self.write_padded(layout::UNAME, b"");
        self.write_padded(layout::GNAME, b"");
        self.write(layout::DEVMAJOR, ZERO_OCTAL);
        self.write(layout::DEVMINOR, ZERO_OCTAL);
    }

    /// Replace host ownership with root ownership.
    ///
    /// Used on headers written to the output stream: same magic and
    /// numeric uid/gid treatment as [`TarHeader::erase_identity`], but the
    /// owner and group name fields carry the literal `root` null-padded to
    /// their 32-byte width, and device numbers are left untouched.
    pub fn assign_root_identity(&mut self) {
        self.write(layout::MAGIC, USTAR_MAGIC);
        self.write(layout::UID, ZERO_OCTAL);
        self.write(layout::GID, ZERO_OCTAL);
        self.write_padded(layout::UNAME, b"root");
        self.write_padded(layout::GNAME, b"root");
    }
}

impl Default for TarHeader {
    fn default() -> Self {
        Self([0; BLOCK_LEN])
    }
}

impl fmt::Debug for TarHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TarHeader")
            .field("path", &self.path())
            .field("type_flag", &self.type_flag())
            .field("entry_size", &self.entry_size())
            .finish()
    }
}

#[cfg(test)]
#[path = "header_tests.rs"]
mod tests;
