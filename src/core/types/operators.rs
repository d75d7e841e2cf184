//! 聚合操作符类型定义
//!
//! `AggregationOperation` 是对外的完整操作集合；`PushdownOp` 是执行器
//! 能够原生下推的子集。两者的区分决定了聚合的执行策略。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::AggregateError;

/// 聚合操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationOperation {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Median,
    Mode,
    Variance,
    StdDev,
}

impl AggregationOperation {
    pub const ALL: [AggregationOperation; 9] = [
        AggregationOperation::Count,
        AggregationOperation::Sum,
        AggregationOperation::Avg,
        AggregationOperation::Min,
        AggregationOperation::Max,
        AggregationOperation::Median,
        AggregationOperation::Mode,
        AggregationOperation::Variance,
        AggregationOperation::StdDev,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AggregationOperation::Count => "count",
            AggregationOperation::Sum => "sum",
            AggregationOperation::Avg => "avg",
            AggregationOperation::Min => "min",
            AggregationOperation::Max => "max",
            AggregationOperation::Median => "median",
            AggregationOperation::Mode => "mode",
            AggregationOperation::Variance => "variance",
            AggregationOperation::StdDev => "stddev",
        }
    }

    /// 可下推到执行器时返回对应的下推操作
    pub fn pushdown_op(&self) -> Option<PushdownOp> {
        match self {
            AggregationOperation::Count => Some(PushdownOp::Count),
            AggregationOperation::Sum => Some(PushdownOp::Sum),
            AggregationOperation::Avg => Some(PushdownOp::Avg),
            AggregationOperation::Min => Some(PushdownOp::Min),
            AggregationOperation::Max => Some(PushdownOp::Max),
            AggregationOperation::Median
            | AggregationOperation::Mode
            | AggregationOperation::Variance
            | AggregationOperation::StdDev => None,
        }
    }

    pub fn is_pushdown_capable(&self) -> bool {
        self.pushdown_op().is_some()
    }
}

impl fmt::Display for AggregationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 大小写不敏感；未知名称返回 `UnknownOperation` 而不是被忽略
impl FromStr for AggregationOperation {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(AggregationOperation::Count),
            "sum" => Ok(AggregationOperation::Sum),
            "avg" | "average" => Ok(AggregationOperation::Avg),
            "min" => Ok(AggregationOperation::Min),
            "max" => Ok(AggregationOperation::Max),
            "median" => Ok(AggregationOperation::Median),
            "mode" => Ok(AggregationOperation::Mode),
            "variance" => Ok(AggregationOperation::Variance),
            "stddev" | "std_dev" | "std" => Ok(AggregationOperation::StdDev),
            _ => Err(AggregateError::UnknownOperation(s.to_string())),
        }
    }
}

/// 执行器原生支持的聚合操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushdownOp {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl PushdownOp {
    pub fn name(&self) -> &'static str {
        match self {
            PushdownOp::Count => "COUNT",
            PushdownOp::Sum => "SUM",
            PushdownOp::Avg => "AVG",
            PushdownOp::Min => "MIN",
            PushdownOp::Max => "MAX",
        }
    }
}

impl From<PushdownOp> for AggregationOperation {
    fn from(op: PushdownOp) -> Self {
        match op {
            PushdownOp::Count => AggregationOperation::Count,
            PushdownOp::Sum => AggregationOperation::Sum,
            PushdownOp::Avg => AggregationOperation::Avg,
            PushdownOp::Min => AggregationOperation::Min,
            PushdownOp::Max => AggregationOperation::Max,
        }
    }
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}
