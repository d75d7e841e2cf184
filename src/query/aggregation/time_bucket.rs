//! 时间分桶
//!
//! 把参考时刻映射到周期边界和周期标签。所有计算都以调用方传入的
//! `now` 为准，同一个请求内不会重新读取时钟。

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::statistics;
use super::types::TrendPoint;
use crate::core::{AggregationOperation, Record, TimeInterval, Value};
use crate::storage::Condition;

/// 左闭右开的时间段 [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }

    /// 对应的范围过滤条件
    pub fn condition(&self, date_field: &str) -> Condition {
        Condition::range(date_field, self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TimeBucketer {
    interval: TimeInterval,
}

impl TimeBucketer {
    pub fn new(interval: TimeInterval) -> Self {
        Self { interval }
    }

    pub fn label(&self, ts: DateTime<Utc>) -> String {
        self.interval.label(ts)
    }

    /// 相对 `now` 所在周期偏移 `offset` 个周期，0 为当前周期，-1 为上一周期
    pub fn period(&self, now: DateTime<Utc>, offset: i64) -> Period {
        let start = self.interval.shift(self.interval.truncate(now), offset);
        Period {
            start,
            end: self.interval.shift(start, 1),
        }
    }

    /// 截至当前周期的最近 n 个周期，最早的在前
    pub fn expected_periods(&self, now: DateTime<Utc>, n: usize) -> Vec<Period> {
        let n = n as i64;
        (0..n).map(|i| self.period(now, i - (n - 1))).collect()
    }

    pub fn expected_labels(&self, now: DateTime<Utc>, n: usize) -> Vec<String> {
        self.expected_periods(now, n)
            .into_iter()
            .map(|period| self.label(period.start))
            .collect()
    }

    /// 在物化的行上按周期聚合，用于无法下推的操作
    pub fn bucket(
        &self,
        rows: &[Record],
        date_field: &str,
        value_field: Option<&str>,
        operation: AggregationOperation,
    ) -> Vec<TrendPoint> {
        let mut buckets: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for row in rows {
            let Some(ts) = row.get(date_field).as_timestamp() else {
                continue;
            };
            let value = match value_field {
                Some(field) => row.get(field).clone(),
                None => Value::Int(1),
            };
            buckets.entry(self.label(ts)).or_default().push(value);
        }

        buckets
            .into_iter()
            .map(|(label, values)| {
                let numbers = statistics::numeric_values(&values);
                let value = match operation {
                    AggregationOperation::Count => {
                        values.iter().filter(|v| !v.is_null()).count() as f64
                    }
                    other => statistics::reduce_numbers(other, &numbers),
                };
                TrendPoint::new(label, value)
            })
            .collect()
    }
}
