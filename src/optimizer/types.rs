//! Optimizer types
//!
//! Reports produced by a run and by planning one.

use crate::output::WriteSummary;
use crate::types::Dataset;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Date whose raw files were read
    pub raw_date: NaiveDate,
    /// Date of the written partitions
    pub partition_date: NaiveDate,
    /// One summary per dataset, in run order
    pub datasets: Vec<WriteSummary>,
    /// Wall time of the run in milliseconds
    pub duration_ms: u64,
}

impl RunReport {
    /// Rows written across all datasets
    pub fn total_rows(&self) -> usize {
        self.datasets.iter().map(|d| d.rows).sum()
    }

    /// Files written across all datasets
    pub fn total_files(&self) -> usize {
        self.datasets.iter().map(|d| d.files).sum()
    }

    /// Summary of one dataset, if it ran
    pub fn dataset(&self, dataset: Dataset) -> Option<&WriteSummary> {
        self.datasets.iter().find(|d| d.dataset == dataset)
    }
}

/// Where one dataset would be read from and written to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    /// Dataset
    pub dataset: Dataset,
    /// Raw files read, as `{raw_root}/{glob}`
    pub read_glob: String,
    /// Output partition directory
    pub write_path: String,
}

impl fmt::Display for PlanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<14} {} -> {}",
            self.dataset.name(),
            self.read_glob,
            self.write_path
        )
    }
}
