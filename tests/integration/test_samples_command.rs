//! End-to-end CLI tests for the samples command.

use std::process::Command;
use tempfile::TempDir;

use crate::helpers::{create_header, create_records, write_bam};

#[test]
fn test_samples_command_writes_tsv() {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a.bam");
    let b = temp_dir.path().join("b.bam");
    let output = temp_dir.path().join("samples.tsv");

    write_bam(&a, &create_header(&[("A1", Some("S1")), ("A2", Some("S2"))]), &[]);
    write_bam(&b, &create_header(&[("B1", Some("S2"))]), &create_records(2, Some("B1")));

    let status = Command::new(env!("CARGO_BIN_EXE_samspill"))
        .args([
            "samples",
            "-i",
            a.to_str().unwrap(),
            "-i",
            b.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .status()
        .expect("Failed to run samples command");
    assert!(status.success());

    let a = a.display().to_string();
    let b = b.display().to_string();
    let tsv = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = tsv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "source\tread_group\tsample\tsample_id".to_string(),
            format!("{a}\tA1\tS1\t0"),
            format!("{a}\tA2\tS2\t1"),
            format!("{b}\tB1\tS2\t1"),
            format!("{b}\t*\tS2\t1"),
        ]
    );
}

#[test]
fn test_samples_command_requires_input() {
    let result = Command::new(env!("CARGO_BIN_EXE_samspill"))
        .args(["samples"])
        .output()
        .expect("Failed to run samples command");
    assert!(!result.status.success());
}
