//! 存储辅助模块
//!
//! 提供总是失败的执行器，用于验证错误透传

use statdb::core::{Record, StorageResult, Value};
use statdb::storage::{
    AggregateQuery, FetchQuery, FieldQuery, QueryExecutor, StorageError, TrendQuery,
};

pub const BACKEND_FAILURE: &str = "connection reset by peer";

/// 所有调用都返回后端错误
#[derive(Debug, Default)]
pub struct FailingExecutor;

impl FailingExecutor {
    fn fail<T>() -> StorageResult<T> {
        Err(StorageError::Backend(BACKEND_FAILURE.to_string()))
    }
}

impl QueryExecutor for FailingExecutor {
    fn pushdown_aggregate(&self, _query: &AggregateQuery) -> StorageResult<Vec<Record>> {
        Self::fail()
    }

    fn fetch_all(&self, _query: &FetchQuery) -> StorageResult<Vec<Record>> {
        Self::fail()
    }

    fn fetch_field(&self, _query: &FieldQuery) -> StorageResult<Vec<Value>> {
        Self::fail()
    }

    fn grouped_date_trend(&self, _query: &TrendQuery) -> StorageResult<Vec<(String, f64)>> {
        Self::fail()
    }
}
