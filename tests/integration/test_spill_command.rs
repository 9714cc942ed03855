//! End-to-end CLI tests for the spill command.
//!
//! These tests run the actual `samspill spill` binary and validate:
//! 1. The spill file holds every input record
//! 2. `--verify` reads the file back in place
//! 3. Invalid options and missing inputs fail cleanly

use samspill_lib::record::RawRecord;
use samspill_lib::spill::{SpillConfig, SpillFile};
use std::process::Command;
use tempfile::TempDir;

use crate::helpers::{create_test_bam, read_raw_records};

fn read_spill(path: &std::path::Path, config: SpillConfig) -> Vec<Vec<u8>> {
    let mut spill = SpillFile::open_existing(path, config).unwrap();
    let mut record = RawRecord::new();
    let mut records = Vec::new();
    while spill.read(&mut record).unwrap().is_some() {
        records.push(record.as_ref().to_vec());
    }
    records
}

#[test]
fn test_spill_command_basic() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input.bam");
    let output = temp_dir.path().join("output.spill");
    create_test_bam(&input, 500);

    let status = Command::new(env!("CARGO_BIN_EXE_samspill"))
        .args(["spill", "-i", input.to_str().unwrap(), "-o", output.to_str().unwrap()])
        .status()
        .expect("Failed to run spill command");
    assert!(status.success(), "spill command failed");

    let (_, expected) = read_raw_records(&input);
    assert_eq!(read_spill(&output, SpillConfig::default()), expected);
}

#[test]
fn test_spill_command_verify_with_custom_groups() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input.bam");
    let output = temp_dir.path().join("output.spill");
    create_test_bam(&input, 321);

    let status = Command::new(env!("CARGO_BIN_EXE_samspill"))
        .args([
            "spill",
            "--input",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--group-size",
            "17",
            "--window-size",
            "4096",
            "--verify",
            "--verbose",
        ])
        .status()
        .expect("Failed to run spill command");
    assert!(status.success(), "spill --verify failed");

    let config = SpillConfig::default().with_group_size(17).with_window_size(4096);
    assert_eq!(read_spill(&output, config).len(), 321);
}

#[test]
fn test_spill_command_zero_group_size_fails() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input.bam");
    let output = temp_dir.path().join("output.spill");
    create_test_bam(&input, 5);

    let result = Command::new(env!("CARGO_BIN_EXE_samspill"))
        .args([
            "spill",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--group-size",
            "0",
        ])
        .output()
        .expect("Failed to run spill command");
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("group-size"));
    assert!(!output.exists());
}

#[test]
fn test_spill_command_missing_input_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("output.spill");

    let result = Command::new(env!("CARGO_BIN_EXE_samspill"))
        .args(["spill", "-i", "/nonexistent/input.bam", "-o", output.to_str().unwrap()])
        .output()
        .expect("Failed to run spill command");
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("does not exist"));
}
