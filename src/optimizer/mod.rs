//! Daily optimizer
//!
//! Runs the (read, project, write) pipeline of every selected dataset, one
//! after another.
//!
//! # Overview
//!
//! - `DailyOptimizer` - validated configuration plus the run loop
//! - `RunReport` - what each dataset wrote
//! - `PlanEntry` - resolved paths, for dry runs
//!
//! Datasets always run in the order titles, title_info, episodes,
//! episode_likes, comments. The first failure stops the run; datasets
//! written before it stay committed.

mod types;

pub use types::{PlanEntry, RunReport};

use crate::config::OptimizerConfig;
use crate::context::{Clock, RunContext};
use crate::datasets::read_dataset;
use crate::error::{Error, Result};
use crate::output::{TableWriter, WriteSummary};
use crate::storage::Session;
use crate::types::Dataset;
use chrono::NaiveDate;
use std::time::Instant;

/// The daily raw-to-optimized job
#[derive(Debug, Clone)]
pub struct DailyOptimizer {
    config: OptimizerConfig,
}

impl DailyOptimizer {
    /// Create an optimizer from a validated configuration
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Capture the run context
    ///
    /// Raw files are read for `raw_date`, or for today when not given.
    pub fn context(&self, clock: &dyn Clock, raw_date: Option<NaiveDate>) -> RunContext {
        let now = clock.now();
        RunContext::new(
            now,
            raw_date.unwrap_or_else(|| now.date()),
            self.config.partition_date,
        )
    }

    /// Run every selected dataset in order, stopping at the first failure
    pub async fn run(&self, session: &Session, ctx: &RunContext) -> Result<RunReport> {
        let start = Instant::now();
        let datasets = self.config.selected_datasets();

        tracing::info!(
            raw_date = %ctx.raw_date(),
            partition = %ctx.partition_path(),
            weekday = %ctx.weekday(),
            datasets = datasets.len(),
            "Starting daily optimization"
        );

        let writer = TableWriter::new(session, &self.config);
        let mut summaries = Vec::with_capacity(datasets.len());

        for dataset in datasets {
            let summary = self
                .run_dataset(session, &writer, ctx, dataset)
                .await
                .map_err(|e| {
                    tracing::error!(%dataset, error = %e, "Dataset failed; stopping run");
                    Error::pipeline(dataset.name(), e)
                })?;
            summaries.push(summary);
        }

        let report = RunReport {
            raw_date: ctx.raw_date(),
            partition_date: ctx.partition_date(),
            datasets: summaries,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            rows = report.total_rows(),
            files = report.total_files(),
            duration_ms = report.duration_ms,
            "Daily optimization complete"
        );
        Ok(report)
    }

    async fn run_dataset(
        &self,
        session: &Session,
        writer: &TableWriter<'_>,
        ctx: &RunContext,
        dataset: Dataset,
    ) -> Result<WriteSummary> {
        let table = read_dataset(session, &self.config, ctx, dataset).await?;
        writer.save(table, dataset, ctx).await
    }

    /// Resolve read and write locations without touching storage
    pub fn plan(&self, ctx: &RunContext) -> Result<Vec<PlanEntry>> {
        self.config
            .selected_datasets()
            .into_iter()
            .map(|dataset| {
                let root = ctx.raw_root(&self.config, dataset)?;
                let glob = dataset.layout().glob();
                Ok(PlanEntry {
                    dataset,
                    read_glob: format!("{}/{glob}", root.trim_end_matches('/')),
                    write_path: ctx.optimized_root(&self.config, dataset)?,
                })
            })
            .collect()
    }
}
