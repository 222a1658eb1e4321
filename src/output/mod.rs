//! Output module
//!
//! Handles Arrow RecordBatch creation and Parquet writing into the
//! optimized zone.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Inferring one Arrow schema across all rows of a table
//! - Converting JSON rows to Arrow RecordBatches
//! - Encoding Parquet files in memory
//! - Writing coalesced, date-partitioned Parquet file sets

mod schema;
mod sink;
mod writer;

pub use schema::{infer_schema, json_to_arrow};
pub use sink::{save_to_parquet, TableWriter, WriteSummary, SUCCESS_MARKER};
pub use writer::{encode_parquet, ParquetWriter, ParquetWriterConfig};

#[cfg(test)]
mod tests;
