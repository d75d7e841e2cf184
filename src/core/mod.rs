pub mod error;
pub mod record;
pub mod types;
pub mod value;

// 错误和结果类型
pub use error::{
    AggregateError, ConfigError, StatError, StatResult, StorageError, StorageResult,
};

// 核心数据类型
pub use record::Record;
pub use value::Value;

// 操作符与时间粒度
pub use types::{AggregationOperation, PushdownOp, SortDirection, TimeInterval};
