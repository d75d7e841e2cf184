//! 等宽直方图

use log::warn;

use super::types::HistogramBin;
use crate::core::error::AggregateError;
use crate::utils::math::percentage;

#[derive(Debug, Clone, Copy)]
pub struct HistogramBuilder {
    bins: usize,
}

impl HistogramBuilder {
    pub fn new(bins: usize) -> Result<Self, AggregateError> {
        if bins == 0 {
            return Err(AggregateError::invalid_argument("bin count must be positive"));
        }
        Ok(Self { bins })
    }

    /// 在 [min, max] 上分箱；min/max 由调用方通过下推得到
    ///
    /// 区间左闭右开，最后一个区间右端闭合。超出范围的值落入首尾区间。
    pub fn build(&self, values: &[f64], min: f64, max: f64) -> Vec<HistogramBin> {
        if values.is_empty() {
            return Vec::new();
        }

        let total = values.len() as f64;
        if max <= min {
            warn!("histogram range is degenerate (min = max = {min}), using a single bin");
            return vec![HistogramBin {
                index: 0,
                range_start: min,
                range_end: max,
                count: values.len() as u64,
                percentage: percentage(total, total),
            }];
        }

        let width = (max - min) / self.bins as f64;
        let mut counts = vec![0u64; self.bins];
        for value in values {
            counts[self.bin_index(*value, min, width)] += 1;
        }

        counts
            .into_iter()
            .enumerate()
            .map(|(index, count)| HistogramBin {
                index,
                range_start: min + index as f64 * width,
                range_end: if index + 1 == self.bins {
                    max
                } else {
                    min + (index + 1) as f64 * width
                },
                count,
                percentage: percentage(count as f64, total),
            })
            .collect()
    }

    fn bin_index(&self, value: f64, min: f64, width: f64) -> usize {
        let last = self.bins - 1;
        if value.is_nan() || value <= min {
            return 0;
        }
        let mut index = (((value - min) / width).floor() as usize).min(last);
        // 浮点误差可能让值落到相邻区间，用区间边界重新校正
        if index > 0 && value < min + index as f64 * width {
            index -= 1;
        } else if index < last && value >= min + (index + 1) as f64 * width {
            index += 1;
        }
        index
    }
}
