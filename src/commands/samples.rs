//! Report the sample each read group of each input resolves to.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use samspill_lib::bam_io::read_bam_header;
use samspill_lib::logging::OperationTimer;
use samspill_lib::sample::SampleMap;
use samspill_lib::validation::{validate_file_exists, validate_output_distinct};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::commands::command::Command;

/// Placeholder written in the read group column for reads without an `RG` tag.
const NO_READ_GROUP: &str = "*";

/// Map read groups to samples across one or more BAM files.
#[derive(Debug, Parser)]
#[command(
    name = "samples",
    about = "\x1b[38;5;173m[UTILITIES]\x1b[0m      \x1b[36mMap read groups of BAM files to sample ids\x1b[0m",
    long_about = r#"
Build a sample map over the headers of one or more BAM files and print it.

Each input contributes one row per read group, keyed by the input path and the
read group ID. Read groups are read in header order and reading stops at the
first read group without an SM field. An input with no usable read group is its
own sample; an input with exactly one also maps reads without an RG tag to that
sample (shown with read group "*").

Output columns: source, read_group, sample, sample_id.

EXAMPLES:

  samspill samples -i a.bam -i b.bam

  samspill samples -i a.bam -i b.bam -o samples.tsv
"#
)]
pub struct Samples {
    /// Input BAM files.
    #[arg(short = 'i', long = "input", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Output TSV file (stdout if omitted).
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

impl Command for Samples {
    fn execute(&self, _command_line: &str) -> Result<()> {
        for input in &self.inputs {
            validate_file_exists(input, "Input BAM")?;
        }
        if let Some(output) = &self.output {
            validate_output_distinct(output, &self.inputs)?;
        }

        let timer = OperationTimer::new("Mapping samples");
        let mut samples = SampleMap::new();
        let mut rows: Vec<(String, String)> = Vec::new();

        for input in &self.inputs {
            let source = input.display().to_string();
            let header = read_bam_header(input)?;
            let n = samples.add(&source, Some(&header));
            info!("{source}: {n} read group(s) with a sample");

            rows.extend(header.read_groups().keys().map(|id| (source.clone(), id.to_string())));
            rows.push((source, NO_READ_GROUP.to_string()));
        }

        let sink: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(
                File::create(path)
                    .with_context(|| format!("Failed to create output: {}", path.display()))?,
            ),
            None => Box::new(io::stdout().lock()),
        };
        let mut out = BufWriter::new(sink);
        writeln!(out, "source\tread_group\tsample\tsample_id")?;

        let mut written = 0u64;
        for (source, read_group) in &rows {
            let rg = (read_group != NO_READ_GROUP).then_some(read_group.as_str());
            let Some(id) = samples.lookup(source, rg) else { continue };
            let name = samples.sample_name(id).unwrap_or_default();
            writeln!(out, "{source}\t{read_group}\t{name}\t{id}")?;
            written += 1;
        }
        out.flush().context("Failed to flush sample map output")?;

        info!("Found {} sample(s)", samples.len());
        timer.log_completion(written);
        Ok(())
    }
}
