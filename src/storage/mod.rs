//! Storage module
//!
//! The object store session every pipeline of a run shares.
//!
//! # Overview
//!
//! This module provides:
//! - URL resolution for `s3a://`, `s3://`, `memory://` and local paths
//! - Glob listing of raw objects beneath a dated root
//! - Whole-object reads, writes and prefix deletes

mod session;

pub use session::{Location, Session};
