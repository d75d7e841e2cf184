//! 聚合结果类型
//!
//! 每个请求构造一次，返回后即丢弃，不跨调用保存状态

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::core::Value;
use crate::utils::math::round_to;

/// 单个百分位结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileEntry {
    /// 形如 "p50"、"p99.9"
    pub label: String,
    pub percentile: f64,
    pub value: f64,
}

/// 按请求顺序保存的百分位集合
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PercentileSet {
    entries: Vec<PercentileEntry>,
}

impl PercentileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label_for(percentile: f64) -> String {
        if percentile.fract() == 0.0 {
            format!("p{}", percentile as i64)
        } else {
            format!("p{percentile}")
        }
    }

    pub fn push(&mut self, percentile: f64, value: f64) {
        self.entries.push(PercentileEntry {
            label: Self::label_for(percentile),
            percentile,
            value,
        });
    }

    /// 按标签查询，例如 `get("p50")`
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.value)
    }

    pub fn entries(&self) -> &[PercentileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 单字段的统计摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticalSummary {
    pub count: u64,
    pub sum: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    /// 空数据集时为 Null
    pub mode: Value,
    pub variance: f64,
    pub std_dev: f64,
    pub percentiles: PercentileSet,
}

impl StatisticalSummary {
    pub fn empty() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            avg: 0.0,
            min: 0.0,
            max: 0.0,
            median: 0.0,
            mode: Value::Null,
            variance: 0.0,
            std_dev: 0.0,
            percentiles: PercentileSet::new(),
        }
    }
}

/// 直方图区间，最后一个区间上界闭合，其余左闭右开
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub index: usize,
    pub range_start: f64,
    pub range_end: f64,
    pub count: u64,
    pub percentage: f64,
}

/// 透视表
///
/// `columns` 是整个数据集上列维度的去重集合，每一行对每一列都有值
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PivotTable {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub data: BTreeMap<String, BTreeMap<String, f64>>,
}

impl PivotTable {
    pub fn cell(&self, row: &str, column: &str) -> Option<f64> {
        self.data.get(row).and_then(|cells| cells.get(column)).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period: String,
    pub value: f64,
}

impl TrendPoint {
    pub fn new(period: impl Into<String>, value: f64) -> Self {
        Self {
            period: period.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// 当前周期与上一周期的对比
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    pub change_percent: f64,
    pub trend: Trend,
}

impl ComparisonResult {
    /// previous 不为正时 change_percent 为 0
    pub fn between(current: f64, previous: f64, precision: u32) -> Self {
        let change = current - previous;
        let change_percent = if previous > 0.0 {
            round_to(change / previous * 100.0, precision)
        } else {
            0.0
        };
        let trend = if change > 0.0 {
            Trend::Up
        } else if change < 0.0 {
            Trend::Down
        } else {
            Trend::Stable
        };
        Self {
            current,
            previous,
            change,
            change_percent,
            trend,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodValue {
    pub period: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthRateResult {
    /// 每个周期的合计值，最早的在前
    pub data: Vec<PeriodValue>,
    /// 逐期增长率（百分数），跳过上一期为 0 的过渡
    pub rates: Vec<f64>,
    pub growth_rate: f64,
}

/// 分组占比
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareItem {
    pub group: Value,
    pub value: f64,
    pub percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_labels() {
        assert_eq!(PercentileSet::label_for(50.0), "p50");
        assert_eq!(PercentileSet::label_for(99.9), "p99.9");
    }

    #[test]
    fn test_comparison_up() {
        let result = ComparisonResult::between(15000.0, 12000.0, 2);
        assert_eq!(result.change, 3000.0);
        assert_eq!(result.change_percent, 25.0);
        assert_eq!(result.trend, Trend::Up);
    }

    #[test]
    fn test_comparison_zero_previous_is_guarded() {
        let result = ComparisonResult::between(500.0, 0.0, 2);
        assert_eq!(result.change, 500.0);
        assert_eq!(result.change_percent, 0.0);
        assert_eq!(result.trend, Trend::Up);

        let stable = ComparisonResult::between(0.0, 0.0, 2);
        assert_eq!(stable.trend, Trend::Stable);
    }

    #[test]
    fn test_comparison_down() {
        let result = ComparisonResult::between(80.0, 100.0, 2);
        assert_eq!(result.change_percent, -20.0);
        assert_eq!(result.trend, Trend::Down);
    }
}
