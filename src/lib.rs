//! StatDB - A statistical aggregation engine implemented in Rust
//!
//! This crate computes single-value aggregates, grouped aggregates, time-series
//! trends, pivot tables, percentiles, histograms, correlation, rankings and
//! sequential statistics over records served by a pluggable query executor.

pub mod common;
pub mod config;
pub mod core;
pub mod query;
pub mod storage;
pub mod utils;

pub use crate::core::{StatError, StatResult};
pub use query::aggregation::AggregationEngine;
