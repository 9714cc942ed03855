//! Common CLI options shared across commands.
//!
//! This module provides shared argument structures that can be composed into
//! command structs using `#[command(flatten)]`.

use clap::Args;

use samspill_lib::spill::{
    DEFAULT_BUFFER_SIZE, DEFAULT_GROUP_SIZE, DEFAULT_WINDOW_SIZE, SpillConfig,
};
use samspill_lib::validation::validate_positive;

/// Spill file tuning options.
///
/// A spill file must be read with the same `--window-size` it was written with.
#[derive(Debug, Clone, Args)]
pub struct SpillOptions {
    /// Number of records compressed together as one group.
    #[arg(long = "group-size", default_value_t = DEFAULT_GROUP_SIZE)]
    pub group_size: usize,

    /// Initial size of the record staging buffer in bytes.
    ///
    /// Only a starting allocation; larger records are accepted and the buffer grows.
    #[arg(long = "buffer-size", default_value_t = DEFAULT_BUFFER_SIZE)]
    pub buffer_size: usize,

    /// Size of the compression dictionary window in bytes (0 disables it).
    #[arg(long = "window-size", default_value_t = DEFAULT_WINDOW_SIZE)]
    pub window_size: usize,

    /// Log spill file diagnostics and failures.
    #[arg(long = "verbose", default_value = "false")]
    pub verbose: bool,
}

impl Default for SpillOptions {
    fn default() -> Self {
        Self {
            group_size: DEFAULT_GROUP_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            window_size: DEFAULT_WINDOW_SIZE,
            verbose: false,
        }
    }
}

impl SpillOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns an error if the group size is zero.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_positive(self.group_size, "group-size")?;
        Ok(())
    }

    /// The spill configuration these options describe.
    pub fn to_config(&self) -> SpillConfig {
        SpillConfig::default()
            .with_group_size(self.group_size)
            .with_buffer_size(self.buffer_size)
            .with_window_size(self.window_size)
            .with_verbose(self.verbose)
    }
}
