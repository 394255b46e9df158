//! Command-line driver for rulesim designs.

use tracing_subscriber as _;

/// Argument parsing and mapping onto run configuration.
pub mod args;
/// Built-in designs and the run driver.
pub mod designs;

pub use args::Cli;
pub use designs::{drive, DesignName};
