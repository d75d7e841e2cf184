//! 顺序统计：累计和、累计平均、滑动平均
//!
//! 输入行必须已经按排序字段有序。累加器通过 fold 显式传递，
//! 每行输出原始字段加上一个新属性。

use std::collections::VecDeque;

use crate::core::error::AggregateError;
use crate::core::Record;
use crate::utils::math::safe_div;

pub const RUNNING_TOTAL: &str = "running_total";
pub const CUMULATIVE_AVERAGE: &str = "cumulative_average";
pub const MOVING_AVERAGE: &str = "moving_average";

/// 累加器状态
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulator {
    pub sum: f64,
    pub count: u64,
}

impl Accumulator {
    /// Null 或非数值不计入
    pub fn push(self, value: Option<f64>) -> Self {
        match value {
            Some(v) => Self {
                sum: self.sum + v,
                count: self.count + 1,
            },
            None => self,
        }
    }

    pub fn average(&self) -> f64 {
        safe_div(self.sum, self.count as f64)
    }
}

pub struct SequentialAggregator;

impl SequentialAggregator {
    pub fn running_total(rows: Vec<Record>, field: &str) -> Vec<Record> {
        Self::accumulate(rows, field, RUNNING_TOTAL, |acc| acc.sum)
    }

    pub fn cumulative_average(rows: Vec<Record>, field: &str) -> Vec<Record> {
        Self::accumulate(rows, field, CUMULATIVE_AVERAGE, Accumulator::average)
    }

    /// 固定窗口滑动平均，前 window-1 行不输出
    pub fn moving_average(
        rows: Vec<Record>,
        field: &str,
        window: usize,
    ) -> Result<Vec<Record>, AggregateError> {
        if window == 0 {
            return Err(AggregateError::invalid_argument("window must be positive"));
        }

        let mut trailing: VecDeque<Option<f64>> = VecDeque::with_capacity(window);
        let mut output = Vec::with_capacity(rows.len().saturating_sub(window - 1));
        for mut row in rows {
            if trailing.len() == window {
                trailing.pop_front();
            }
            trailing.push_back(row.get_f64(field));
            if trailing.len() < window {
                continue;
            }
            let acc = trailing
                .iter()
                .fold(Accumulator::default(), |acc, value| acc.push(*value));
            row.set(MOVING_AVERAGE, acc.average());
            output.push(row);
        }
        Ok(output)
    }

    fn accumulate(
        rows: Vec<Record>,
        field: &str,
        attribute: &str,
        emit: impl Fn(&Accumulator) -> f64,
    ) -> Vec<Record> {
        rows.into_iter()
            .scan(Accumulator::default(), |acc, mut row| {
                *acc = acc.push(row.get_f64(field));
                row.set(attribute, emit(acc));
                Some(row)
            })
            .collect()
    }
}
