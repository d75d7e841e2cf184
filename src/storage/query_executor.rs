//! 查询执行器接口
//!
//! 聚合引擎只通过 `QueryExecutor` 访问后端存储。接口分为两类：
//! - 下推聚合：`pushdown_aggregate`、`grouped_date_trend`，由后端完成计算
//! - 物化读取：`fetch_all`、`fetch_field`，把行或字段值拉到内存

use std::fmt::Debug;

use super::filter::QueryFilter;
use super::guard::QueryGuard;
use crate::core::error::StorageResult;
use crate::core::{PushdownOp, Record, SortDirection, TimeInterval, Value};

/// 排序规则
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// 下推聚合的一列
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateColumn {
    /// 结果行中的列名
    pub alias: String,
    pub op: PushdownOp,
    /// None 只对 COUNT 有意义，表示统计行数
    pub field: Option<String>,
}

/// 下推聚合查询
#[derive(Debug, Clone)]
pub struct AggregateQuery {
    pub collection: String,
    pub filter: QueryFilter,
    pub columns: Vec<AggregateColumn>,
    pub group_by: Vec<String>,
    pub guard: QueryGuard,
}

/// 整行读取
#[derive(Debug, Clone)]
pub struct FetchQuery {
    pub collection: String,
    pub filter: QueryFilter,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
    pub guard: QueryGuard,
}

/// 单字段读取，结果不含 Null
#[derive(Debug, Clone)]
pub struct FieldQuery {
    pub collection: String,
    pub filter: QueryFilter,
    pub field: String,
    pub limit: Option<usize>,
    pub guard: QueryGuard,
}

/// 按时间截断分组的趋势查询
#[derive(Debug, Clone)]
pub struct TrendQuery {
    pub collection: String,
    pub filter: QueryFilter,
    pub date_field: String,
    pub interval: TimeInterval,
    pub value_field: Option<String>,
    pub op: PushdownOp,
    pub guard: QueryGuard,
}

/// 后端查询能力
pub trait QueryExecutor: Send + Sync + Debug {
    /// 下推聚合
    ///
    /// 不分组时恰好返回一行；分组时每组一行，包含分组字段和聚合列，
    /// 按分组键升序排列。空输入上 COUNT 为 0，其余为 Null。
    fn pushdown_aggregate(&self, query: &AggregateQuery) -> StorageResult<Vec<Record>>;

    /// 是否能在一次往返中计算多个聚合列
    fn supports_batching(&self) -> bool {
        false
    }

    fn fetch_all(&self, query: &FetchQuery) -> StorageResult<Vec<Record>>;

    fn fetch_field(&self, query: &FieldQuery) -> StorageResult<Vec<Value>>;

    /// 返回 (周期标签, 聚合值)，按时间升序；没有数据的周期不出现
    fn grouped_date_trend(&self, query: &TrendQuery) -> StorageResult<Vec<(String, f64)>>;
}
