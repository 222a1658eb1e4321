//! Configuration for the daily optimizer
//!
//! Every setting has a default reproducing the production job, so an empty
//! YAML document (or no file at all) is a valid configuration.
//!
//! ```yaml
//! bucket: wt-grepp-lake
//! platform: naver
//! file_count_cap: 50
//! write_mode: append
//! partition_date: processing
//! storage:
//!   region: ap-northeast-2
//! ```

use crate::error::{Error, Result, ResultExt};
use crate::template;
use crate::types::{Dataset, PartitionDate, WriteMode};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete optimizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Bucket holding both the raw and optimized zones
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Platform the raw documents were scraped from
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Dated raw root for one dataset
    #[serde(default = "default_raw_root_template")]
    pub raw_root_template: String,

    /// Output partition directory for one dataset
    #[serde(default = "default_optimized_root_template")]
    pub optimized_root_template: String,

    /// Maximum number of files a single write produces
    #[serde(default = "default_file_count_cap")]
    pub file_count_cap: usize,

    /// Append (default) or overwrite the target partition
    #[serde(default)]
    pub write_mode: WriteMode,

    /// Date the output partition follows
    #[serde(default)]
    pub partition_date: PartitionDate,

    /// Restrict the run to these datasets; empty means all five
    #[serde(default)]
    pub datasets: Vec<Dataset>,

    /// Object store connection settings
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_bucket() -> String {
    "wt-grepp-lake".to_string()
}

fn default_platform() -> String {
    "naver".to_string()
}

fn default_raw_root_template() -> String {
    "s3a://{{ bucket }}/raw/{{ platform }}/{{ dataset }}/{{ date }}".to_string()
}

fn default_optimized_root_template() -> String {
    "s3a://{{ bucket }}/optimized/{{ dataset }}/year={{ year }}/month={{ month }}/day={{ day }}/platform={{ platform }}"
        .to_string()
}

fn default_file_count_cap() -> usize {
    50
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            platform: default_platform(),
            raw_root_template: default_raw_root_template(),
            optimized_root_template: default_optimized_root_template(),
            file_count_cap: default_file_count_cap(),
            write_mode: WriteMode::default(),
            partition_date: PartitionDate::default(),
            datasets: Vec::new(),
            storage: StorageConfig::default(),
        }
    }
}

impl OptimizerConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Check invariants serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::invalid_value("bucket", "must not be empty"));
        }
        if self.platform.trim().is_empty() {
            return Err(Error::invalid_value("platform", "must not be empty"));
        }
        if self.file_count_cap == 0 {
            return Err(Error::invalid_value("file_count_cap", "must be at least 1"));
        }
        template::validate(&self.raw_root_template)
            .map_err(|e| Error::invalid_value("raw_root_template", e.to_string()))?;
        template::validate(&self.optimized_root_template)
            .map_err(|e| Error::invalid_value("optimized_root_template", e.to_string()))?;
        Ok(())
    }

    /// Datasets this run processes, always in canonical order
    pub fn selected_datasets(&self) -> Vec<Dataset> {
        Dataset::ALL
            .into_iter()
            .filter(|d| self.datasets.is_empty() || self.datasets.contains(d))
            .collect()
    }
}

// ============================================================================
// Storage Config
// ============================================================================

/// S3 connection settings
///
/// Unset fields fall back to the standard `AWS_*` environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Custom endpoint for S3-compatible services
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bucket region
    #[serde(default)]
    pub region: Option<String>,

    /// Static access key
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// Static secret key
    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// Use `https://{bucket}.{endpoint}` instead of path-style requests
    #[serde(default)]
    pub virtual_hosted_style: bool,

    /// Permit plain HTTP endpoints
    #[serde(default)]
    pub allow_http: bool,
}
