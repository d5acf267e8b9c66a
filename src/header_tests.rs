//! Unit tests for the ustar header codec.

use super::*;
use rstest::rstest;

fn sample_header() -> TarHeader {
    let mut header = TarHeader::default();
    header.write_padded(layout::NAME, b"usr/bin/hello");
    header.set_type_flag(type_flag::REGULAR);
    header.set_entry_size(1234);
    header.write(layout::UID, b"0001750\0");
    header.write(layout::GID, b"0001750\0");
    header.write_padded(layout::UNAME, b"builder");
    header.write_padded(layout::GNAME, b"builder");
    header
}

#[rstest]
#[case(0, 0)]
#[case(1, 512)]
#[case(511, 512)]
#[case(512, 512)]
#[case(513, 1024)]
fn padded_len_rounds_to_block_multiples(#[case] input: u64, #[case] expected: u64) {
    assert_eq!(padded_len(input), expected);
}

#[test]
fn padded_len_is_smallest_block_multiple() {
    for n in 0..4096u64 {
        let rounded = padded_len(n);
        assert_eq!(rounded % 512, 0);
        assert!(rounded >= n);
        assert!(rounded < n + 512);
    }
}

#[test]
fn checksum_round_trips_against_independent_sum() {
    let mut header = sample_header();
    header.write_checksum();

    // Independent sum: checksum bytes treated as spaces.
    let bytes = header.as_bytes();
    let mut sum: u32 = 0;
    for (i, byte) in bytes.iter().enumerate() {
        if (layout::CHECKSUM.offset..layout::CHECKSUM.end()).contains(&i) {
            sum += u32::from(b' ');
        } else {
            sum += u32::from(*byte);
        }
    }
    let expected = format!("{sum:06o}");

    let field = header.bytes(layout::CHECKSUM);
    assert_eq!(&field[..6], expected.as_bytes());
    assert_eq!(field[6], 0, "seventh byte is the NUL terminator");
    assert_eq!(field[7], b' ', "eighth byte keeps the blanking space");
}

#[test]
fn checksum_is_stable_across_recomputation() {
    let mut header = sample_header();
    header.write_checksum();
    let first = header.bytes(layout::CHECKSUM).to_vec();
    header.write_checksum();
    assert_eq!(header.bytes(layout::CHECKSUM), first.as_slice());
}

#[test]
fn entry_size_decodes_octal_ascii() {
    let header = sample_header();
    assert_eq!(header.entry_size(), 1234);
}

#[test]
fn entry_size_tolerates_leading_spaces_and_terminator() {
    let mut header = TarHeader::default();
    header.write(layout::SIZE, b"     1750 \0 ");
    assert_eq!(header.entry_size(), 0o1750);
}

#[test]
fn entry_size_of_zero_block_is_zero() {
    assert_eq!(TarHeader::default().entry_size(), 0);
}

#[test]
fn erase_identity_blanks_ownership_and_devices() {
    let mut header = sample_header();
    header.write(layout::DEVMAJOR, b"0000010\0");
    header.write(layout::DEVMINOR, b"0000020\0");
    header.erase_identity();

    assert_eq!(header.bytes(layout::MAGIC), USTAR_MAGIC);
    assert_eq!(header.bytes(layout::UID), b"0000000\0");
    assert_eq!(header.bytes(layout::GID), b"0000000\0");
    assert!(header.bytes(layout::UNAME).iter().all(|b| *b == 0));
    assert!(header.bytes(layout::GNAME).iter().all(|b| *b == 0));
    assert_eq!(header.bytes(layout::DEVMAJOR), b"0000000\0");
    assert_eq!(header.bytes(layout::DEVMINOR), b"0000000\0");
}

#[test]
fn assign_root_identity_sets_root_names_and_keeps_devices() {
    let mut header = sample_header();
    header.write(layout::DEVMAJOR, b"0000010\0");
    header.assign_root_identity();

    assert_eq!(header.bytes(layout::UID), b"0000000\0");
    assert_eq!(header.bytes(layout::GID), b"0000000\0");
    assert_eq!(&header.bytes(layout::UNAME)[..5], b"root\0");
    assert!(header.bytes(layout::UNAME)[4..].iter().all(|b| *b == 0));
    assert_eq!(&header.bytes(layout::GNAME)[..5], b"root\0");
    assert_eq!(
        header.bytes(layout::DEVMAJOR),
        b"0000010\0",
        "root substitution must not touch device numbers"
    );
}

#[test]
fn path_stops_at_first_nul() {
    let header = sample_header();
    assert_eq!(header.path(), "usr/bin/hello");
}

#[test]
fn zero_block_detection() {
    assert!(TarHeader::default().is_zero_block());
    assert!(!sample_header().is_zero_block());
}

#[test]
fn field_writes_preserve_block_length() {
    let mut header = TarHeader::default();
    header.write_padded(layout::NAME, b"a");
    header.write(layout::MAGIC, USTAR_MAGIC);
    assert_eq!(header.as_bytes().len(), BLOCK_LEN);
}

#[test]
#[should_panic(expected = "field write must match field width")]
fn exact_write_rejects_wrong_width() {
    let mut header = TarHeader::default();
    header.write(layout::UID, b"0");
}
