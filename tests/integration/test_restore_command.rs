//! End-to-end CLI tests for the restore command.
//!
//! These tests spill a BAM with `samspill spill`, restore it with
//! `samspill restore`, and compare the records byte for byte.

use noodles::sam::header::record::value::map::program::tag as pg_tag;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

use crate::helpers::{create_test_bam, read_raw_records};

fn spill(input: &Path, output: &Path, extra: &[&str]) {
    let status = Command::new(env!("CARGO_BIN_EXE_samspill"))
        .args(["spill", "-i", input.to_str().unwrap(), "-o", output.to_str().unwrap()])
        .args(extra)
        .status()
        .expect("Failed to run spill command");
    assert!(status.success(), "spill command failed");
}

fn restore(input: &Path, header: &Path, output: &Path, extra: &[&str]) -> bool {
    Command::new(env!("CARGO_BIN_EXE_samspill"))
        .args([
            "restore",
            "-i",
            input.to_str().unwrap(),
            "--header",
            header.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .args(extra)
        .status()
        .expect("Failed to run restore command")
        .success()
}

#[test]
fn test_spill_restore_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input.bam");
    let spilled = temp_dir.path().join("chunk.spill");
    let restored = temp_dir.path().join("restored.bam");
    create_test_bam(&input, 750);

    spill(&input, &spilled, &[]);
    assert!(restore(&spilled, &input, &restored, &[]));
    assert!(spilled.exists(), "spill file kept without --delete");

    let (_, expected) = read_raw_records(&input);
    let (header, actual) = read_raw_records(&restored);
    assert_eq!(actual, expected);

    let programs = header.programs();
    let pg = programs.as_ref().get(b"samspill".as_slice()).expect("@PG for samspill");
    let command_line = pg.other_fields().get(&pg_tag::COMMAND_LINE).unwrap().to_string();
    assert!(command_line.contains("restore"));
    assert_eq!(header.read_groups().len(), 1);
}

#[test]
fn test_restore_delete_removes_spill_file() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input.bam");
    let spilled = temp_dir.path().join("chunk.spill");
    let restored = temp_dir.path().join("restored.bam");
    create_test_bam(&input, 40);

    spill(&input, &spilled, &["--window-size", "0"]);
    assert!(restore(&spilled, &input, &restored, &["--window-size", "0", "--delete"]));
    assert!(!spilled.exists());
    assert_eq!(read_raw_records(&restored).1.len(), 40);
}

#[test]
fn test_restore_corrupt_spill_fails() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input.bam");
    let spilled = temp_dir.path().join("chunk.spill");
    let restored = temp_dir.path().join("restored.bam");
    create_test_bam(&input, 200);
    spill(&input, &spilled, &[]);

    let mut bytes = std::fs::read(&spilled).unwrap();
    bytes[40] ^= 0xff;
    std::fs::write(&spilled, &bytes).unwrap();

    assert!(!restore(&spilled, &input, &restored, &["--delete"]));
    assert!(spilled.exists(), "failed restore must not delete its input");
}
