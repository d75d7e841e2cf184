pub mod interval;
pub mod operators;

pub use interval::TimeInterval;
pub use operators::{AggregationOperation, PushdownOp, SortDirection};
