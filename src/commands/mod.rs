//! CLI command implementations for samspill.
//!
//! - [`spill`] - Copy BAM records into a spill file
//! - [`restore`] - Write the records of a spill file back to BAM
//! - [`samples`] - Map read groups of BAM files to sample ids

#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::uninlined_format_args
)]

pub mod command;
pub mod common;
pub mod restore;
pub mod samples;
pub mod spill;
