//! Partitioned Parquet sink for the optimized zone

use super::schema::{infer_schema, json_to_arrow};
use super::writer::{encode_parquet, ParquetWriterConfig};
use crate::config::OptimizerConfig;
use crate::context::RunContext;
use crate::error::Result;
use crate::storage::Session;
use crate::table::Table;
use crate::types::{Dataset, WriteMode};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Marker written after every successful write
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Outcome of writing one dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    /// Dataset written
    pub dataset: Dataset,
    /// Output partition directory
    pub path: String,
    /// Rows written
    pub rows: usize,
    /// Parquet files added
    pub files: usize,
    /// Objects deleted first (overwrite mode only)
    pub replaced: usize,
}

/// Writes tables into the optimized zone
pub struct TableWriter<'a> {
    session: &'a Session,
    config: &'a OptimizerConfig,
    parquet: ParquetWriterConfig,
}

impl<'a> TableWriter<'a> {
    /// Create a writer using the default Parquet settings (Snappy)
    pub fn new(session: &'a Session, config: &'a OptimizerConfig) -> Self {
        Self {
            session,
            config,
            parquet: ParquetWriterConfig::default(),
        }
    }

    /// Persist a table under the dataset's partition for this run
    ///
    /// The table is coalesced to at most `file_count_cap` partitions and
    /// each non-empty partition becomes one Parquet file.
    pub async fn save(
        &self,
        table: Table,
        dataset: Dataset,
        ctx: &RunContext,
    ) -> Result<WriteSummary> {
        let path = ctx.optimized_root(self.config, dataset)?;
        let target = self.session.resolve(&path)?;
        let table = table.coalesce(self.config.file_count_cap);

        let replaced = match self.config.write_mode {
            WriteMode::Append => 0,
            WriteMode::Overwrite => self.session.delete_prefix(&target).await?,
        };
        if replaced > 0 {
            tracing::info!(
                %dataset,
                path = %target.url(),
                replaced,
                "Cleared partition before overwrite"
            );
        }

        let rows = table.num_rows();
        let mut files = 0;

        if rows == 0 {
            tracing::warn!(%dataset, path = %target.url(), "No rows to write");
        } else {
            let schema = Arc::new(infer_schema(&table));
            let write_id = Uuid::new_v4();

            for (index, partition) in table.partitions().iter().enumerate() {
                if partition.is_empty() {
                    continue;
                }
                let batch = json_to_arrow(partition, &schema)?;
                let data = encode_parquet(&batch, &self.parquet)?;
                let name = format!(
                    "part-{index:05}-{write_id}-c000.{}",
                    self.parquet.file_suffix()
                );
                let url = self.session.write(&target.child(&name), data).await?;
                tracing::debug!(
                    %dataset,
                    file = %url,
                    rows = partition.len(),
                    "Wrote Parquet file"
                );
                files += 1;
            }
        }

        self.session
            .write(&target.child(SUCCESS_MARKER), Bytes::new())
            .await?;

        let path = target.url();
        tracing::info!(%dataset, rows, files, "Data successfully optimized to {path}");

        Ok(WriteSummary {
            dataset,
            path,
            rows,
            files,
            replaced,
        })
    }
}

/// Persist a table as an appended (or overwritten) Parquet partition
pub async fn save_to_parquet(
    session: &Session,
    config: &OptimizerConfig,
    ctx: &RunContext,
    table: Table,
    dataset: Dataset,
) -> Result<WriteSummary> {
    TableWriter::new(session, config)
        .save(table, dataset, ctx)
        .await
}
