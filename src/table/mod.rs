//! Table module
//!
//! The in-process dataframe layer the readers project with.
//!
//! # Overview
//!
//! This module provides:
//! - `Table` - partitioned JSON rows with an ordered column list
//! - Column expressions (`col`, `lit`, `explode`, `alias`) and `select`
//! - `coalesce` to cap the partition count before writing
//! - Parsing of multi-line raw JSON documents into rows

mod column;
mod document;
mod types;

pub use column::{col, explode, lit, lookup, Column};
pub use document::parse_document;
pub use types::{Row, Table};
