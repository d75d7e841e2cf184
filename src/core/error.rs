//! 统一错误处理系统 for StatDB
//!
//! ## 设计理念
//!
//! 1. **分层错误**：存储层（`StorageError`）、聚合层（`AggregateError`）、
//!    配置层（`ConfigError`）各自定义，使用 `#[from]` 汇总到 `StatError`
//!
//! 2. **退化结果不是错误**：空数据集、零分母等情况返回 0 或空集合，
//!    只有参数非法、超出物化上限或存储层失败才会返回 `Err`
//!
//! 3. **统一接口**：`StatResult<T>` 提供统一的返回类型，简化错误传播

use thiserror::Error;

/// 统一的引擎错误类型
#[derive(Error, Debug)]
pub enum StatError {
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),

    #[error("聚合错误: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 统一的结果类型
pub type StatResult<T> = Result<T, StatError>;

/// 存储层结果类型
pub type StorageResult<T> = Result<T, StorageError>;

/// 存储层错误类型
///
/// 由 `QueryExecutor` 实现产生，引擎不做重试，原样向调用方传播
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("后端错误: {0}")]
    Backend(String),
    #[error("集合不存在: {0}")]
    UnknownCollection(String),
    #[error("查询已取消")]
    Cancelled,
    #[error("查询超时: 已耗时 {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },
}

/// 聚合层错误类型
///
/// 涵盖请求参数和资源上限相关的错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregateError {
    #[error("未知的聚合操作: {0}")]
    UnknownOperation(String),
    #[error("无效参数: {0}")]
    InvalidArgument(String),
    #[error("物化行数超出上限: 上限 {limit}, 实际至少 {actual}")]
    MaterializationLimit { limit: usize, actual: usize },
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("配置解析错误: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("配置序列化错误: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl AggregateError {
    /// 创建无效参数错误
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
