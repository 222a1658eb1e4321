//! Common types used throughout lake-optimizer
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type; one table row
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Datasets
// ============================================================================

/// The five logical datasets scraped from the platform, in run order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    /// Weekly title schedule
    Titles,
    /// Title metadata
    TitleInfo,
    /// Episode lists per title
    Episodes,
    /// Episode like-counts
    EpisodeLikes,
    /// Episode comments
    Comments,
}

impl Dataset {
    /// All datasets in the order the daily run processes them
    pub const ALL: [Dataset; 5] = [
        Dataset::Titles,
        Dataset::TitleInfo,
        Dataset::Episodes,
        Dataset::EpisodeLikes,
        Dataset::Comments,
    ];

    /// Name used in raw and optimized paths
    pub fn name(self) -> &'static str {
        match self {
            Dataset::Titles => "titles",
            Dataset::TitleInfo => "title_info",
            Dataset::Episodes => "episodes",
            Dataset::EpisodeLikes => "episode_likes",
            Dataset::Comments => "comments",
        }
    }

    /// How raw files are laid out beneath the dated raw root
    pub fn layout(self) -> ReadLayout {
        match self {
            Dataset::Titles | Dataset::TitleInfo => ReadLayout::Flat,
            Dataset::Episodes | Dataset::EpisodeLikes | Dataset::Comments => ReadLayout::Nested,
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Dataset::ALL
            .into_iter()
            .find(|d| d.name() == s.trim())
            .ok_or_else(|| Error::invalid_value("datasets", format!("unknown dataset '{s}'")))
    }
}

/// Directory depth of raw JSON files under a dataset's dated root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadLayout {
    /// `{root}/*.json`
    Flat,
    /// `{root}/*/*.json`
    Nested,
}

impl ReadLayout {
    /// Glob matched against keys relative to the raw root
    pub fn glob(self) -> &'static str {
        match self {
            ReadLayout::Flat => "*.json",
            ReadLayout::Nested => "*/*.json",
        }
    }
}

// ============================================================================
// Write Behaviour
// ============================================================================

/// How a write treats data already present at the target partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Add new files next to existing ones; reruns duplicate rows
    #[default]
    Append,
    /// Delete everything under the partition path before writing
    Overwrite,
}

/// Which date the output `year=/month=/day=` partition follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionDate {
    /// Date the job runs
    #[default]
    Processing,
    /// Date of the raw files that were read
    Raw,
}
