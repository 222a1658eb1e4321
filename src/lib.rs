// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # lake-optimizer
//!
//! Daily batch job that reads one day of raw scraped JSON from the raw zone
//! of an object store, applies a light per-dataset projection and appends
//! the result as Parquet to a date-partitioned optimized zone.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lake_optimizer::{DailyOptimizer, OptimizerConfig, Session, SystemClock};
//!
//! #[tokio::main]
//! async fn main() -> lake_optimizer::Result<()> {
//!     let optimizer = DailyOptimizer::new(OptimizerConfig::default())?;
//!     let ctx = optimizer.context(&SystemClock, None);
//!     let session = Session::open(&optimizer.config().storage)?;
//!
//!     let report = optimizer.run(&session, &ctx).await?;
//!     println!("wrote {} rows", report.total_rows());
//!     Ok(())
//! }
//! ```
//!
//! ## Layout
//!
//! ```text
//! raw/{platform}/{dataset}/{YYYY}/{MM}/{DD}/[*/]*.json
//!         │
//!         │  read_json ─ select / explode ─ coalesce(50)
//!         ▼
//! optimized/{dataset}/year=YYYY/month=MM/day=DD/platform={platform}/part-*.snappy.parquet
//! ```
//!
//! Datasets run one after another in the order titles, title_info,
//! episodes, episode_likes, comments, stopping at the first failure.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Job configuration
pub mod config;

/// Template interpolation for path conventions
pub mod template;

/// Run context and clocks
pub mod context;

/// Object store session
pub mod storage;

/// In-process partitioned table and column expressions
pub mod table;

/// Raw dataset readers and projections
pub mod datasets;

/// Arrow/Parquet output
pub mod output;

/// The daily run
pub mod optimizer;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{OptimizerConfig, StorageConfig};
pub use context::{Clock, FixedClock, RunContext, SystemClock};
pub use error::{Error, Result};
pub use optimizer::{DailyOptimizer, PlanEntry, RunReport};
pub use output::{save_to_parquet, WriteSummary};
pub use storage::Session;
pub use table::Table;
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
