//! CLI commands and argument parsing

use crate::types::WriteMode;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Raw-to-optimized lake job
#[derive(Parser, Debug)]
#[command(name = "lake-optimizer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML); defaults apply when omitted
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format of the run report
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Optimize raw data into date-partitioned Parquet
    Run {
        /// Raw date to read (YYYY-MM-DD, default today)
        #[arg(long)]
        raw_date: Option<NaiveDate>,

        /// Datasets to process (comma-separated, empty = all)
        #[arg(long)]
        datasets: Option<String>,

        /// Append to or overwrite the target partitions
        #[arg(long)]
        write_mode: Option<WriteMode>,
    },

    /// Show where each dataset would be read from and written to
    Plan {
        /// Raw date to read (YYYY-MM-DD, default today)
        #[arg(long)]
        raw_date: Option<NaiveDate>,

        /// Datasets to include (comma-separated, empty = all)
        #[arg(long)]
        datasets: Option<String>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
