// Query module for the statistics engine
//
// This module provides the aggregation pipeline:
// - Splitting aggregation requests into pushdown and materialized parts
// - Client-side order statistics over materialized rows
// - Period bucketing, comparison and gap filling

pub mod aggregation;

// Re-export commonly used types for convenience
pub use aggregation::{AggregationEngine, AggregationEntry, AggregationSpec};
pub use crate::core::{StatError, StatResult};
