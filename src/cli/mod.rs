//! CLI module
//!
//! Command-line interface for the daily optimizer.
//!
//! # Commands
//!
//! - `run` - Optimize every selected dataset for one raw date
//! - `plan` - Print the resolved read globs and write paths

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
