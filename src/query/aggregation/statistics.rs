//! 客户端统计量
//!
//! 需要完整物化字段值的顺序统计量：中位数、众数、方差、标准差、
//! 百分位数和皮尔逊相关系数。全部是纯函数，空输入返回 0 或空集合。

use std::collections::BTreeMap;

use super::types::PercentileSet;
use crate::core::{AggregationOperation, Value};
use crate::utils::math::{finite_or_zero, safe_div};

/// 升序排序后的副本，NaN 排在最后
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

pub fn mean(values: &[f64]) -> f64 {
    safe_div(sum(values), values.len() as f64)
}

/// 偶数个取中间两个的平均值，奇数个取中间值
pub fn median(values: &[f64]) -> f64 {
    let sorted = sorted(values);
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// 出现次数最多的值；次数相同时取最小值
pub fn mode(values: &[Value]) -> Option<Value> {
    let mut frequencies: BTreeMap<&Value, usize> = BTreeMap::new();
    for value in values.iter().filter(|value| !value.is_null()) {
        *frequencies.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(&Value, usize)> = None;
    for (value, count) in frequencies {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value.clone())
}

/// 总体方差（除以 n）
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let squared: f64 = values.iter().map(|v| (v - avg).powi(2)).sum();
    squared / values.len() as f64
}

/// 总体标准差
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// 已排序数据上的线性插值百分位，p 取值 [0, 100]
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let index = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let fraction = index - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

pub fn percentiles(values: &[f64], requested: &[f64]) -> PercentileSet {
    let mut set = PercentileSet::new();
    if values.is_empty() {
        return set;
    }
    let sorted = sorted(values);
    for p in requested {
        set.push(*p, percentile_sorted(&sorted, *p));
    }
    set
}

/// 皮尔逊相关系数
///
/// r = Σ(x - x̄)(y - ȳ) / sqrt(Σ(x - x̄)² · Σ(y - ȳ)²)，按均值中心化两遍计算
///
/// 少于两个样本或任一变量为常量时返回 0
pub fn correlation(pairs: &[(f64, f64)]) -> f64 {
    let Some(&(first_x, first_y)) = pairs.first() else {
        return 0.0;
    };
    // 常量均值在浮点下未必精确，直接判定
    if pairs.iter().all(|(x, _)| *x == first_x) || pairs.iter().all(|(_, y)| *y == first_y) {
        return 0.0;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut covariance, mut spread_x, mut spread_y) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        spread_x += dx * dx;
        spread_y += dy * dy;
    }

    if spread_x <= 0.0 || spread_y <= 0.0 {
        return 0.0;
    }
    finite_or_zero(covariance / (spread_x * spread_y).sqrt()).clamp(-1.0, 1.0)
}

/// 数值聚合，空输入返回 0
pub fn reduce_numbers(operation: AggregationOperation, values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    match operation {
        AggregationOperation::Count => values.len() as f64,
        AggregationOperation::Sum => sum(values),
        AggregationOperation::Avg => mean(values),
        AggregationOperation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        AggregationOperation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        AggregationOperation::Median => median(values),
        AggregationOperation::Mode => {
            let boxed: Vec<Value> = values.iter().map(|v| Value::Float(*v)).collect();
            mode(&boxed).and_then(|v| v.as_f64()).unwrap_or(0.0)
        }
        AggregationOperation::Variance => variance(values),
        AggregationOperation::StdDev => std_dev(values),
    }
}

/// 任意字段值上的聚合
///
/// Min/Max/Mode 保留原始值类型，其余操作只考虑数值。
/// 空输入时 Count 为 0，Mode 为 Null，其余为 0.0
pub fn reduce(operation: AggregationOperation, values: &[Value]) -> Value {
    let present: Vec<&Value> = values.iter().filter(|value| !value.is_null()).collect();
    match operation {
        AggregationOperation::Count => Value::Int(present.len() as i64),
        AggregationOperation::Min => present
            .into_iter()
            .min()
            .cloned()
            .unwrap_or(Value::Float(0.0)),
        AggregationOperation::Max => present
            .into_iter()
            .max()
            .cloned()
            .unwrap_or(Value::Float(0.0)),
        AggregationOperation::Mode => mode(values).unwrap_or(Value::Null),
        other => {
            let numbers: Vec<f64> = present.iter().filter_map(|v| v.as_f64()).collect();
            Value::Float(reduce_numbers(other, &numbers))
        }
    }
}

/// 取出数值视图，丢弃 Null 和非数值
pub fn numeric_values(values: &[Value]) -> Vec<f64> {
    values.iter().filter_map(Value::as_f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICES: [f64; 5] = [10.0, 20.0, 30.0, 40.0, 50.0];

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_price_scenario() {
        assert_eq!(median(&PRICES), 30.0);
        assert_eq!(variance(&PRICES), 200.0);
        assert!((std_dev(&PRICES) - 14.142).abs() < 1e-3);

        let set = percentiles(&PRICES, &[25.0, 50.0, 75.0]);
        assert_eq!(set.get("p25"), Some(20.0));
        assert_eq!(set.get("p50"), Some(30.0));
        assert_eq!(set.get("p75"), Some(40.0));
    }

    #[test]
    fn test_median_even_count() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_p50_matches_median() {
        let samples: [&[f64]; 4] = [
            &[1.0],
            &[3.0, 1.0],
            &[7.0, 1.0, 4.0, 4.0, 9.0, 2.0],
            &[0.5, -2.0, 11.0, 3.25, 8.0],
        ];
        for values in samples {
            let set = percentiles(values, &[50.0]);
            assert!(approx(set.get("p50").unwrap(), median(values)));
        }
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(percentile_sorted(&sorted, 90.0), 3.7));
        assert_eq!(percentile_sorted(&sorted, 0.0), 1.0);
        assert_eq!(percentile_sorted(&sorted, 100.0), 4.0);
        assert!(percentiles(&[], &[50.0]).is_empty());
    }

    #[test]
    fn test_variance_and_std_dev_agree() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(variance(&values), 4.0);
        assert_eq!(std_dev(&values), 2.0);
        assert!(approx(std_dev(&PRICES).powi(2), variance(&PRICES)));
    }

    #[test]
    fn test_mode_prefers_smallest_on_tie() {
        let values: Vec<Value> = [3, 1, 3, 1, 2].into_iter().map(Value::from).collect();
        assert_eq!(mode(&values), Some(Value::Int(1)));

        let values: Vec<Value> = [5, 2, 5].into_iter().map(Value::from).collect();
        assert_eq!(mode(&values), Some(Value::Int(5)));

        assert_eq!(mode(&[]), None);
        assert_eq!(mode(&[Value::Null, Value::Null]), None);
    }

    #[test]
    fn test_correlation() {
        let perfect: Vec<(f64, f64)> = (1..=5).map(|x| (x as f64, 2.0 * x as f64)).collect();
        assert!(approx(correlation(&perfect), 1.0));

        let inverse: Vec<(f64, f64)> = (1..=5).map(|x| (x as f64, -(x as f64))).collect();
        assert!(approx(correlation(&inverse), -1.0));

        let constant = [(1.0, 7.0), (2.0, 7.0), (3.0, 7.0)];
        assert_eq!(correlation(&constant), 0.0);
        assert_eq!(correlation(&[(1.0, 2.0)]), 0.0);
    }

    #[test]
    fn test_correlation_of_fractional_constants_is_zero() {
        let both_constant = vec![(1.1, 2.2); 7];
        assert_eq!(correlation(&both_constant), 0.0);

        let large_constant = vec![(1e8 + 0.3, 0.1); 7];
        assert_eq!(correlation(&large_constant), 0.0);

        let one_constant: Vec<(f64, f64)> = (0..7).map(|y| (0.1, y as f64)).collect();
        assert_eq!(correlation(&one_constant), 0.0);

        let shifted: Vec<(f64, f64)> = (0..7).map(|i| (1e8 + i as f64 * 0.1, i as f64)).collect();
        assert!((correlation(&shifted) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_reduce_on_empty_input() {
        assert_eq!(reduce(AggregationOperation::Count, &[]), Value::Int(0));
        assert_eq!(reduce(AggregationOperation::Sum, &[]), Value::Float(0.0));
        assert_eq!(reduce(AggregationOperation::Mode, &[]), Value::Null);
        assert_eq!(reduce_numbers(AggregationOperation::StdDev, &[]), 0.0);
    }

    #[test]
    fn test_reduce_keeps_original_type_for_extrema() {
        let values = vec![Value::from("pear"), Value::from("apple"), Value::Null];
        assert_eq!(reduce(AggregationOperation::Min, &values), Value::from("apple"));
        assert_eq!(reduce(AggregationOperation::Count, &values), Value::Int(2));
        assert_eq!(reduce(AggregationOperation::Sum, &values), Value::Float(0.0));
    }
}
