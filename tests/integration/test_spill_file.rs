//! End-to-end tests of spill files on disk.
//!
//! These tests cover:
//! 1. Round trips of arbitrary record streams through both read paths
//! 2. Raw BAM records surviving a spill unchanged
//! 3. Independent spill files driven from separate threads

use proptest::prelude::*;
use samspill_lib::errors::ErrorKind;
use samspill_lib::record::RawRecord;
use samspill_lib::spill::{SpillConfig, SpillFile, SpillMode};
use std::path::Path;
use std::thread;
use tempfile::TempDir;

use crate::helpers::{create_test_bam, read_raw_records};

/// Writes `records`, then reads them back either by reopening or by switching in place.
fn round_trip(
    path: &Path,
    config: SpillConfig,
    records: &[Vec<u8>],
    reopen: bool,
) -> Vec<Vec<u8>> {
    let mut spill = SpillFile::open_write(path, config).unwrap();
    for r in records {
        spill.write(r).unwrap();
    }

    let mut record = Vec::new();
    if reopen {
        spill.close_write().unwrap();
        spill.open_read(Some(&mut record)).unwrap();
    } else {
        spill.end_write().unwrap();
        spill.begin_read(Some(&mut record)).unwrap();
    }

    let mut out = Vec::with_capacity(records.len());
    while let Some(len) = spill.read(&mut record).unwrap() {
        assert_eq!(len, record.len());
        out.push(record.clone());
    }
    assert_eq!(spill.read(&mut record).unwrap(), None);
    spill.destroy(Some(&mut record), true).unwrap();
    assert!(!path.exists());
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_round_trip_any_records(
        records in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..600), 0..400),
        group_size in 1usize..150,
        window_size in prop::sample::select(vec![0usize, 64, 4096, 1 << 20]),
        reopen in any::<bool>(),
    ) {
        let dir = TempDir::new().unwrap();
        let config = SpillConfig::default()
            .with_group_size(group_size)
            .with_window_size(window_size);
        let out = round_trip(&dir.path().join("p.spill"), config, &records, reopen);
        prop_assert_eq!(out, records);
    }

    #[test]
    fn prop_repetitive_records_round_trip(
        seed in prop::collection::vec(any::<u8>(), 1..64),
        count in 1usize..500,
    ) {
        let dir = TempDir::new().unwrap();
        let records: Vec<Vec<u8>> = (0..count)
            .map(|i| seed.iter().cycle().skip(i % seed.len()).take(40 + i % 90).copied().collect())
            .collect();
        let out = round_trip(&dir.path().join("r.spill"), SpillConfig::default(), &records, false);
        prop_assert_eq!(out, records);
    }
}

#[test]
fn test_raw_bam_records_survive_spill() {
    let dir = TempDir::new().unwrap();
    let bam = dir.path().join("in.bam");
    create_test_bam(&bam, 1234);
    let (_, expected) = read_raw_records(&bam);

    let path = dir.path().join("bam.spill");
    let mut spill = SpillFile::open_write(&path, SpillConfig::default()).unwrap();
    for bytes in &expected {
        spill.write(&RawRecord::from(bytes.clone())).unwrap();
    }
    spill.close_write().unwrap();
    assert!(spill.stats().file_bytes_written < spill.stats().bytes_written);

    let mut reread = SpillFile::open_existing(&path, SpillConfig::default()).unwrap();
    let mut record = RawRecord::new();
    let mut actual = Vec::new();
    while reread.read(&mut record).unwrap().is_some() {
        assert!(record.name().is_some_and(|name| name.starts_with(b"read")));
        actual.push(record.as_ref().to_vec());
    }
    assert_eq!(actual, expected);
}

#[test]
fn test_short_record_fails_raw_decode_without_closing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.spill");
    let mut spill = SpillFile::open_write(&path, SpillConfig::default()).unwrap();
    spill.write(&b"too short for BAM".to_vec()).unwrap();
    spill.write(&vec![0u8; 40]).unwrap();
    spill.end_write().unwrap();
    spill.begin_read(None).unwrap();

    let mut record = RawRecord::new();
    assert_eq!(spill.read(&mut record).unwrap_err().kind(), ErrorKind::Input);
    assert_eq!(spill.mode(), SpillMode::ReadOpen);
    assert_eq!(spill.read(&mut record).unwrap(), Some(40));
    assert_eq!(spill.read(&mut record).unwrap(), None);
}

#[test]
fn test_independent_spill_files_on_threads() {
    let dir = TempDir::new().unwrap();
    let handles: Vec<_> = (0..4u8)
        .map(|t| {
            let path = dir.path().join(format!("chunk{t}.spill"));
            thread::spawn(move || {
                let records: Vec<Vec<u8>> =
                    (0..2_000u32).map(|i| format!("thread{t}-record{i}").into_bytes()).collect();
                let config = SpillConfig::default().with_group_size(37);
                round_trip(&path, config, &records, t % 2 == 0) == records
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn test_dropping_without_destroy_keeps_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kept.spill");
    {
        let mut spill = SpillFile::open_write(&path, SpillConfig::default()).unwrap();
        spill.write(&b"abc".to_vec()).unwrap();
    }
    assert!(path.exists());
}
