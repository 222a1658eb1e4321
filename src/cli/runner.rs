//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::OptimizerConfig;
use crate::context::SystemClock;
use crate::error::Result;
use crate::optimizer::DailyOptimizer;
use crate::storage::Session;
use crate::types::{Dataset, WriteMode};
use chrono::NaiveDate;
use serde_json::{json, Value};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run {
                raw_date,
                datasets,
                write_mode,
            } => {
                self.run_job(*raw_date, datasets.as_deref(), *write_mode)
                    .await
            }
            Commands::Plan { raw_date, datasets } => self.plan(*raw_date, datasets.as_deref()),
        }
    }

    /// Load configuration and apply command-line overrides
    pub fn load_config(
        &self,
        datasets: Option<&str>,
        write_mode: Option<WriteMode>,
    ) -> Result<OptimizerConfig> {
        let mut config = match &self.cli.config {
            Some(path) => OptimizerConfig::from_file(path)?,
            None => OptimizerConfig::default(),
        };

        if let Some(list) = datasets {
            config.datasets = parse_datasets(list)?;
        }
        if let Some(mode) = write_mode {
            config.write_mode = mode;
        }
        Ok(config)
    }

    async fn run_job(
        &self,
        raw_date: Option<NaiveDate>,
        datasets: Option<&str>,
        write_mode: Option<WriteMode>,
    ) -> Result<()> {
        let optimizer = DailyOptimizer::new(self.load_config(datasets, write_mode)?)?;
        let ctx = optimizer.context(&SystemClock, raw_date);
        let session = Session::open(&optimizer.config().storage)?;

        let report = optimizer.run(&session, &ctx).await?;

        for summary in &report.datasets {
            self.output_message(&json!({
                "type": "WRITE",
                "write": summary,
            }));
        }
        self.output_message(&json!({
            "type": "RESULT",
            "raw_date": report.raw_date,
            "partition_date": report.partition_date,
            "rows": report.total_rows(),
            "files": report.total_files(),
            "duration_ms": report.duration_ms,
        }));
        Ok(())
    }

    fn plan(&self, raw_date: Option<NaiveDate>, datasets: Option<&str>) -> Result<()> {
        let optimizer = DailyOptimizer::new(self.load_config(datasets, None)?)?;
        let ctx = optimizer.context(&SystemClock, raw_date);

        for entry in optimizer.plan(&ctx)? {
            match self.cli.format {
                OutputFormat::Json => self.output_message(&json!({
                    "type": "PLAN",
                    "plan": entry,
                })),
                OutputFormat::Pretty => println!("{entry}"),
            }
        }
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Parse a comma-separated dataset list
fn parse_datasets(list: &str) -> Result<Vec<Dataset>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}
