//! Write the records of a spill file back out as BAM.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use samspill_lib::bam_io::{create_raw_bam_writer, read_bam_header};
use samspill_lib::header::add_pg_record;
use samspill_lib::logging::{OperationTimer, log_spill_summary};
use samspill_lib::progress::ProgressTracker;
use samspill_lib::record::RawRecord;
use samspill_lib::spill::SpillFile;
use samspill_lib::validation::{validate_files_exist, validate_output_distinct};
use std::path::PathBuf;

use crate::commands::command::Command;
use crate::commands::common::SpillOptions;

/// Restore a BAM file from a spill file.
#[derive(Debug, Parser)]
#[command(
    name = "restore",
    about = "\x1b[38;5;72m[SPILL]\x1b[0m          \x1b[36mWrite the records of a spill file back to BAM\x1b[0m",
    long_about = r#"
Read every record of a spill file and write it to a BAM file.

Spill files do not carry a BAM header. The header is taken from --header, which
should be the BAM the records were spilled from. A @PG line for this command is
appended to it. --window-size must match the value used when spilling.

EXAMPLES:

  samspill restore -i chunk0.spill --header input.bam -o restored.bam

  # Remove the spill file once it has been restored
  samspill restore -i chunk0.spill --header input.bam -o restored.bam --delete
"#
)]
pub struct Restore {
    /// Input spill file.
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// BAM file whose header is used for the output.
    #[arg(short = 'H', long = "header")]
    pub header: PathBuf,

    /// Output BAM file.
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Delete the spill file after a successful restore.
    #[arg(long = "delete", default_value = "false")]
    pub delete: bool,

    /// Spill file options.
    #[command(flatten)]
    pub spill: SpillOptions,
}

impl Command for Restore {
    fn execute(&self, command_line: &str) -> Result<()> {
        validate_files_exist(&[(&self.input, "Spill file"), (&self.header, "Header BAM")])?;
        validate_output_distinct(&self.output, &[&self.input, &self.header])?;
        self.spill.validate()?;

        info!("Restore");
        info!("  Input: {}", self.input.display());
        info!("  Header: {}", self.header.display());
        info!("  Output: {}", self.output.display());

        let timer = OperationTimer::new("Restoring records");
        let header = read_bam_header(&self.header)?;
        let header = add_pg_record(header, env!("CARGO_PKG_VERSION"), command_line)?;

        let mut spill = SpillFile::open_existing(&self.input, self.spill.to_config())
            .with_context(|| format!("Failed to open spill file: {}", self.input.display()))?;
        let mut writer = create_raw_bam_writer(&self.output, &header)?;

        let mut progress = ProgressTracker::new("Restored records");
        let mut record = RawRecord::new();
        while spill.read(&mut record)?.is_some() {
            writer
                .write_raw_record(&record)
                .with_context(|| format!("Failed to write to: {}", self.output.display()))?;
            progress.record(1);
        }
        progress.log_final();
        writer
            .finish()
            .with_context(|| format!("Failed to finish: {}", self.output.display()))?;

        let restored = spill.stats().records_read;
        log_spill_summary(&self.input.display().to_string(), spill.stats());
        spill.destroy(Some(&mut record), self.delete)?;
        if self.delete {
            info!("Deleted {}", self.input.display());
        }
        timer.log_completion(restored);
        Ok(())
    }
}
