//! Utilities for generating test BAM data programmatically.

use bstr::BString;
use noodles::bam;
use noodles::sam::Header;
use noodles::sam::alignment::io::Write as AlignmentWrite;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::record_buf::{Data, QualityScores, RecordBuf, Sequence};
use noodles::sam::header::record::value::Map;
use noodles::sam::header::record::value::map::read_group::tag as rg_tag;
use noodles::sam::header::record::value::map::{ReadGroup, ReferenceSequence};
use samspill_lib::bam_io::create_raw_bam_reader;
use samspill_lib::record::RawRecord;
use std::fs::File;
use std::num::NonZeroUsize;
use std::path::Path;

/// Creates a header with one reference sequence and the given `(ID, SM)` read groups.
pub fn create_header(read_groups: &[(&str, Option<&str>)]) -> Header {
    let mut builder = Header::builder().add_reference_sequence(
        BString::from("chr1"),
        Map::<ReferenceSequence>::new(NonZeroUsize::new(10_000).expect("non-zero length")),
    );
    for (id, sample) in read_groups {
        let mut rg = Map::<ReadGroup>::builder();
        if let Some(sample) = sample {
            rg = rg.insert(rg_tag::SAMPLE, String::from(*sample));
        }
        builder = builder.add_read_group(BString::from(*id), rg.build().expect("valid @RG"));
    }
    builder.build()
}

/// Creates `count` unmapped reads of varying length, optionally tagged with a read group.
pub fn create_records(count: usize, read_group: Option<&str>) -> Vec<RecordBuf> {
    const BASES: &[u8] = b"ACGT";
    (0..count)
        .map(|i| {
            let len = 20 + (i * 7) % 131;
            let bases: Vec<u8> = (0..len).map(|j| BASES[(i * 3 + j * j) % 4]).collect();
            let quals: Vec<u8> = (0..len).map(|j| 20 + ((i + j) % 21) as u8).collect();

            let mut data = Data::default();
            if let Some(rg) = read_group {
                data.insert(Tag::READ_GROUP, Value::from(rg));
            }

            RecordBuf::builder()
                .set_name(BString::from(format!("read{i:06}")))
                .set_flags(Flags::UNMAPPED)
                .set_sequence(Sequence::from(bases))
                .set_quality_scores(QualityScores::from(quals))
                .set_data(data)
                .build()
        })
        .collect()
}

/// Writes `records` to a BAM file at `path`.
pub fn write_bam(path: &Path, header: &Header, records: &[RecordBuf]) {
    let mut writer = bam::io::Writer::new(File::create(path).expect("Failed to create BAM file"));
    writer.write_header(header).expect("Failed to write header");
    for record in records {
        writer.write_alignment_record(header, record).expect("Failed to write record");
    }
    writer.finish(header).expect("Failed to finish BAM");
}

/// Creates a BAM with `count` records and returns its header.
pub fn create_test_bam(path: &Path, count: usize) -> Header {
    let header = create_header(&[("rg1", Some("sample1"))]);
    write_bam(path, &header, &create_records(count, Some("rg1")));
    header
}

/// Reads every record of a BAM file as raw bytes.
pub fn read_raw_records(path: &Path) -> (Header, Vec<Vec<u8>>) {
    let (mut reader, header) = create_raw_bam_reader(path).expect("Failed to open BAM");
    let mut records = Vec::new();
    let mut record = RawRecord::new();
    while reader.read_record(&mut record).expect("Failed to read record") > 0 {
        records.push(record.as_ref().to_vec());
    }
    (header, records)
}
