//! 存储访问层
//!
//! 引擎只依赖 `QueryExecutor` trait；`MemoryExecutor` 是随库提供的
//! 内存实现，可用于嵌入式场景和测试

pub mod filter;
pub mod guard;
pub mod memory_executor;
pub mod query_executor;

pub use filter::{Condition, QueryFilter};
pub use guard::{CancellationToken, QueryGuard};
pub use memory_executor::MemoryExecutor;
pub use query_executor::{
    AggregateColumn, AggregateQuery, FetchQuery, FieldQuery, OrderBy, QueryExecutor, TrendQuery,
};

pub use crate::core::StorageError;
