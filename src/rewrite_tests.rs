//! Unit tests for the streaming archive rewrite pass.

use super::*;
use crate::checksum_line::{checksum_line, content_digest};
use crate::header::{layout, type_flag};
use camino::Utf8PathBuf;
use std::fs;
use tempfile::TempDir;

const MOTD: &[u8] = b"welcome to the machine\n";

/// One decoded record from a raw tar byte stream.
struct Record {
    header: TarHeader,
    payload: Vec<u8>,
}

fn scan_records(bytes: &[u8]) -> Vec<Record> {
    let mut records = Vec::new();
    let mut pos = 0;
    while pos + BLOCK_LEN <= bytes.len() {
        let block: [u8; BLOCK_LEN] = bytes[pos..pos + BLOCK_LEN].try_into().expect("block");
        pos += BLOCK_LEN;
        let header = TarHeader::from_block(block);
        if header.is_zero_block() {
            records.push(Record {
                header,
                payload: Vec::new(),
            });
            continue;
        }
        let len = padded_len(header.entry_size()) as usize;
        let payload = bytes[pos..pos + len].to_vec();
        pos += len;
        records.push(Record { header, payload });
    }
    records
}

/// A deterministic input archive: one directory, one regular file.
fn input_tar() -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());

    let mut dir = tar::Header::new_ustar();
    dir.set_path("share/").expect("dir path");
    dir.set_entry_type(tar::EntryType::Directory);
    dir.set_size(0);
    dir.set_mode(0o755);
    dir.set_username("builder").expect("uname");
    dir.set_cksum();
    builder.append(&dir, std::io::empty()).expect("append dir");

    let mut file = tar::Header::new_ustar();
    file.set_path("share/motd").expect("file path");
    file.set_entry_type(tar::EntryType::Regular);
    file.set_size(MOTD.len() as u64);
    file.set_mode(0o644);
    file.set_username("builder").expect("uname");
    file.set_cksum();
    builder.append(&file, MOTD).expect("append file");

    builder.into_inner().expect("finish")
}

fn rewrite_fixture(temp: &TempDir, bytes: &[u8]) -> Utf8PathBuf {
    let path = Utf8PathBuf::from_path_buf(temp.path().join("data.tar")).expect("utf-8");
    fs::write(path.as_std_path(), bytes).expect("write input");
    rewrite_archive(&path).expect("rewrite");
    path
}

#[test]
fn every_entry_gains_a_preceding_extension_record() {
    let temp = TempDir::new().expect("temp dir");
    let path = rewrite_fixture(&temp, &input_tar());
    let records = scan_records(&fs::read(path.as_std_path()).expect("read output"));

    // ext, dir, ext, file, two terminator blocks.
    assert_eq!(records.len(), 6);
    assert_eq!(records[0].header.type_flag(), type_flag::EXTENSION);
    assert_eq!(records[0].header.path(), "PaxHeaders/share");
    assert_eq!(records[1].header.type_flag(), type_flag::DIRECTORY);
    assert_eq!(records[1].header.path(), "share/");
    assert_eq!(records[2].header.type_flag(), type_flag::EXTENSION);
    assert_eq!(records[2].header.path(), "share/PaxHeaders/motd");
    assert_eq!(records[3].header.type_flag(), type_flag::REGULAR);
    assert!(records[4].header.is_zero_block());
    assert!(records[5].header.is_zero_block());
}

#[test]
fn extension_digest_matches_independent_hash_of_the_payload() {
    let temp = TempDir::new().expect("temp dir");
    let path = rewrite_fixture(&temp, &input_tar());
    let records = scan_records(&fs::read(path.as_std_path()).expect("read output"));

    let line_len = records[2].header.entry_size() as usize;
    let line = std::str::from_utf8(&records[2].payload[..line_len]).expect("utf-8 line");
    assert_eq!(line, checksum_line(&content_digest(MOTD)));
    assert!(line.contains("APK-TOOLS.checksum.SHA1="));
}

#[test]
fn directory_extension_records_have_empty_payloads() {
    let temp = TempDir::new().expect("temp dir");
    let path = rewrite_fixture(&temp, &input_tar());
    let records = scan_records(&fs::read(path.as_std_path()).expect("read output"));
    assert_eq!(records[0].header.entry_size(), 0);
    assert!(records[0].payload.is_empty());
}

#[test]
fn output_headers_are_root_owned_with_fresh_checksums() {
    let temp = TempDir::new().expect("temp dir");
    let path = rewrite_fixture(&temp, &input_tar());
    let records = scan_records(&fs::read(path.as_std_path()).expect("read output"));

    for record in &records[..4] {
        if record.header.type_flag() == type_flag::EXTENSION {
            continue;
        }
        assert_eq!(&record.header.bytes(layout::UNAME)[..5], b"root\0");
        assert_eq!(record.header.bytes(layout::UID), b"0000000\0");

        let stored = record.header.bytes(layout::CHECKSUM).to_vec();
        let mut resealed = record.header.clone();
        resealed.write_checksum();
        assert_eq!(resealed.bytes(layout::CHECKSUM), stored.as_slice());
    }
}

#[test]
fn payload_bytes_are_copied_through_unchanged() {
    let temp = TempDir::new().expect("temp dir");
    let path = rewrite_fixture(&temp, &input_tar());
    let records = scan_records(&fs::read(path.as_std_path()).expect("read output"));
    assert_eq!(&records[3].payload[..MOTD.len()], MOTD);
    assert!(records[3].payload[MOTD.len()..].iter().all(|b| *b == 0));
}

#[test]
fn rewrite_replaces_the_input_in_place_without_leftover_temporary() {
    let temp = TempDir::new().expect("temp dir");
    let path = rewrite_fixture(&temp, &input_tar());
    assert!(path.exists());
    assert!(!sibling_tmp(&path).exists());
}

#[test]
fn missing_terminator_is_tolerated_by_this_pass() {
    let temp = TempDir::new().expect("temp dir");
    let truncated: Vec<u8> = input_tar()
        .into_iter()
        .take(2 * BLOCK_LEN + padded_len(MOTD.len() as u64) as usize)
        .collect();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("data.tar")).expect("utf-8");
    fs::write(path.as_std_path(), &truncated).expect("write input");

    rewrite_archive(&path).expect("truncation is not an error for the rewrite pass");
    let records = scan_records(&fs::read(path.as_std_path()).expect("read output"));
    assert_eq!(records.len(), 4, "two entries, each with its extension record");
}
