//! Copy the records of a BAM file into a spill file.
//!
//! Records are moved as raw BAM bytes, without decoding. With `--verify` the file is
//! switched from writing to reading in place and every record is read back and checked.

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;
use samspill_lib::bam_io::create_raw_bam_reader;
use samspill_lib::logging::{OperationTimer, format_count, log_spill_summary};
use samspill_lib::progress::ProgressTracker;
use samspill_lib::record::RawRecord;
use samspill_lib::spill::SpillFile;
use samspill_lib::validation::{validate_file_exists, validate_output_distinct};
use std::path::PathBuf;

use crate::commands::command::Command;
use crate::commands::common::SpillOptions;

/// Write the records of a BAM file to a compressed spill file.
#[derive(Debug, Parser)]
#[command(
    name = "spill",
    about = "\x1b[38;5;72m[SPILL]\x1b[0m          \x1b[36mCopy BAM records into a compressed spill file\x1b[0m",
    long_about = r#"
Copy the records of a BAM file into a compressed spill file.

Records are batched into groups of --group-size records. Each group is compressed
with LZ4 against a dictionary made of the preceding groups, so similar records in
neighbouring groups compress well. The BAM header is not stored; keep the input BAM
(or any BAM with the same header) to restore from.

EXAMPLES:

  # Spill a BAM
  samspill spill -i input.bam -o chunk0.spill

  # Spill and read everything back to check it
  samspill spill -i input.bam -o chunk0.spill --verify

  # Larger groups, no cross-group dictionary
  samspill spill -i input.bam -o chunk0.spill --group-size 1000 --window-size 0
"#
)]
pub struct Spill {
    /// Input BAM file.
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output spill file.
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Read the spill file back after writing and check every record.
    #[arg(long = "verify", default_value = "false")]
    pub verify: bool,

    /// Spill file options.
    #[command(flatten)]
    pub spill: SpillOptions,
}

impl Command for Spill {
    fn execute(&self, _command_line: &str) -> Result<()> {
        validate_file_exists(&self.input, "Input BAM")?;
        validate_output_distinct(&self.output, &[&self.input])?;
        self.spill.validate()?;

        info!("Spill");
        info!("  Input: {}", self.input.display());
        info!("  Output: {}", self.output.display());
        info!("  Group size: {}", self.spill.group_size);
        info!("  Window size: {}", self.spill.window_size);

        let timer = OperationTimer::new("Spilling records");
        let (mut reader, _header) = create_raw_bam_reader(&self.input)?;
        let mut spill = SpillFile::open_write(&self.output, self.spill.to_config())
            .with_context(|| format!("Failed to create spill file: {}", self.output.display()))?;

        let mut progress = ProgressTracker::new("Spilled records");
        let mut hasher = crc32fast::Hasher::new();
        let mut record = RawRecord::new();
        while reader
            .read_record(&mut record)
            .with_context(|| format!("Failed to read record from: {}", self.input.display()))?
            > 0
        {
            spill.write(&record)?;
            hasher.update(&record);
            progress.record(1);
        }
        progress.log_final();
        let written = spill.stats().records_written;
        let checksum = hasher.finalize();

        if self.verify {
            spill.end_write()?;
            spill.begin_read(Some(&mut record))?;

            let mut hasher = crc32fast::Hasher::new();
            while spill.read(&mut record)?.is_some() {
                hasher.update(&record);
            }
            let read = spill.stats().records_read;
            if read != written || hasher.finalize() != checksum {
                bail!(
                    "Verification of {} failed: wrote {} records, read back {}",
                    self.output.display(),
                    format_count(written),
                    format_count(read)
                );
            }
            info!("Verified {} records", format_count(read));
        } else {
            spill.close_write()?;
        }

        log_spill_summary(&self.output.display().to_string(), spill.stats());
        spill.destroy(Some(&mut record), false)?;
        timer.log_completion(written);
        Ok(())
    }
}
