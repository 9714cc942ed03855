//! Integration tests for the samspill library and binary.
//!
//! These tests exercise spill files end to end on disk, and run the `samspill`
//! binary against BAM files generated on the fly.

mod helpers;
mod test_restore_command;
mod test_sample_map;
mod test_samples_command;
mod test_spill_command;
mod test_spill_file;
