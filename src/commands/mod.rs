pub mod publish;
pub mod tag;
pub mod wash;

use anyhow::{Context, Result};
use std::path::Path;

use ticktag::config::Config;

// Re-export command functions for convenience
pub use publish::publish;
pub use tag::{tag, TagParams};
pub use wash::{wash, WashParams};

/// Load configuration from the given file or the environment
///
/// Runs before the subscriber is installed, so nothing is logged here.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).context("Failed to load configuration")
}
