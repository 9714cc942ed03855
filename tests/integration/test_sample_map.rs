//! Sample map tests over headers read back from BAM files on disk.

use samspill_lib::bam_io::read_bam_header;
use samspill_lib::sample::SampleMap;
use tempfile::TempDir;

use crate::helpers::{create_header, create_records, write_bam};

#[test]
fn test_sample_map_across_bam_files() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.bam");
    let b = dir.path().join("b.bam");
    let c = dir.path().join("c.bam");

    write_bam(&a, &create_header(&[("L1", Some("NA12878")), ("L2", Some("NA12891"))]), &[]);
    write_bam(&b, &create_header(&[("L1", Some("NA12891"))]), &create_records(3, Some("L1")));
    write_bam(&c, &create_header(&[]), &create_records(3, None));

    let mut samples = SampleMap::new();
    for path in [&a, &b, &c] {
        let header = read_bam_header(path).unwrap();
        samples.add(&path.display().to_string(), Some(&header));
    }

    let a = a.display().to_string();
    let b = b.display().to_string();
    let c = c.display().to_string();

    assert_eq!(samples.lookup(&a, Some("L1")), Some(0));
    assert_eq!(samples.lookup(&a, Some("L2")), Some(1));
    assert_eq!(samples.lookup(&a, None), None);

    // Same read group ID in another file resolves independently.
    assert_eq!(samples.lookup(&b, Some("L1")), Some(1));
    assert_eq!(samples.lookup(&b, None), Some(1));

    assert_eq!(samples.lookup(&c, None), Some(2));
    assert_eq!(samples.samples(), ["NA12878", "NA12891", c.as_str()]);
}

#[test]
fn test_source_without_header() {
    let mut samples = SampleMap::new();
    assert_eq!(samples.add("reads.sam", None), 0);
    assert_eq!(samples.add("reads.sam", None), 0);
    assert_eq!(samples.len(), 1);
    assert_eq!(samples.lookup("reads.sam", None), Some(0));
    assert!(samples.lookup("other.sam", None).is_none());
}
