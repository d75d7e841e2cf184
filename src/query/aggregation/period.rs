//! 周期对比与缺口填充

use chrono::{DateTime, Datelike, Utc};
use log::{debug, warn};
use std::collections::HashMap;

use super::scope::DataScope;
use super::strategy::evaluate_single;
use super::time_bucket::TimeBucketer;
use super::types::{ComparisonResult, GrowthRateResult, PeriodValue, TrendPoint};
use crate::core::error::{AggregateError, StatResult};
use crate::core::{AggregationOperation, TimeInterval};
use crate::storage::{Condition, QueryExecutor};
use crate::utils::math::round_to;

/// 以固定参考时刻做周期计算
pub struct PeriodComparator<'s, 'a, E: QueryExecutor + ?Sized> {
    scope: &'s DataScope<'a, E>,
    now: DateTime<Utc>,
    precision: u32,
}

impl<'s, 'a, E: QueryExecutor + ?Sized> PeriodComparator<'s, 'a, E> {
    pub fn new(scope: &'s DataScope<'a, E>, now: DateTime<Utc>, precision: u32) -> Self {
        Self {
            scope,
            now,
            precision,
        }
    }

    /// 当前周期与上一个同粒度周期对比
    pub fn compare_with_previous(
        &self,
        field: &str,
        metric: AggregationOperation,
        interval: TimeInterval,
        date_field: &str,
    ) -> StatResult<ComparisonResult> {
        let bucketer = TimeBucketer::new(interval);
        let current = bucketer.period(self.now, 0);
        let previous = bucketer.period(self.now, -1);
        debug!(
            "compare {} {}: [{}, {}) vs [{}, {})",
            metric, field, current.start, current.end, previous.start, previous.end
        );

        let current_value = self.metric_in(current.condition(date_field), field, metric)?;
        let previous_value = self.metric_in(previous.condition(date_field), field, metric)?;
        Ok(ComparisonResult::between(
            current_value,
            previous_value,
            self.precision,
        ))
    }

    /// 今年与去年对比
    pub fn year_over_year(
        &self,
        field: &str,
        metric: AggregationOperation,
        date_field: &str,
    ) -> StatResult<ComparisonResult> {
        let year = self.now.year();
        let current = self.metric_in(Condition::year(date_field, year), field, metric)?;
        let previous = self.metric_in(Condition::year(date_field, year - 1), field, metric)?;
        Ok(ComparisonResult::between(current, previous, self.precision))
    }

    /// 最近 n 个周期的合计及平均环比增长率
    pub fn growth_rate(
        &self,
        field: &str,
        interval: TimeInterval,
        periods: usize,
        date_field: &str,
    ) -> StatResult<GrowthRateResult> {
        if periods == 0 {
            return Err(AggregateError::invalid_argument("periods must be positive").into());
        }

        let bucketer = TimeBucketer::new(interval);
        let mut data = Vec::with_capacity(periods);
        for period in bucketer.expected_periods(self.now, periods) {
            let value =
                self.metric_in(period.condition(date_field), field, AggregationOperation::Sum)?;
            data.push(PeriodValue {
                period: bucketer.label(period.start),
                start: period.start,
                end: period.end,
                value,
            });
        }

        let values: Vec<f64> = data.iter().map(|entry| entry.value).collect();
        let (rates, growth_rate) = average_growth(&values, self.precision);
        Ok(GrowthRateResult {
            data,
            rates,
            growth_rate,
        })
    }

    fn metric_in(
        &self,
        condition: Condition,
        field: &str,
        metric: AggregationOperation,
    ) -> StatResult<f64> {
        let scope = self.scope.narrowed(condition);
        let value = evaluate_single(&scope, metric, Some(field))?;
        Ok(value.as_f64().unwrap_or(0.0))
    }
}

/// 逐期增长率及其平均值；上一期为 0 的过渡被跳过
pub fn average_growth(values: &[f64], precision: u32) -> (Vec<f64>, f64) {
    let rates: Vec<f64> = values
        .windows(2)
        .filter(|pair| pair[0] != 0.0)
        .map(|pair| round_to((pair[1] - pair[0]) / pair[0] * 100.0, precision))
        .collect();
    let skipped = values.len().saturating_sub(1) - rates.len();
    if skipped > 0 {
        warn!("growth rate: skipped {skipped} transition(s) from a zero period");
    }
    if rates.is_empty() {
        return (rates, 0.0);
    }
    let average = rates.iter().sum::<f64>() / rates.len() as f64;
    (rates, round_to(average, precision))
}

/// 按预期周期标签补齐趋势序列
pub struct GapFiller;

impl GapFiller {
    /// 输出与 `expected` 一一对应，缺失的周期取 `fill`
    pub fn fill(expected: &[String], actual: &[TrendPoint], fill: f64) -> Vec<TrendPoint> {
        let found: HashMap<&str, f64> = actual
            .iter()
            .map(|point| (point.period.as_str(), point.value))
            .collect();
        expected
            .iter()
            .map(|label| {
                let value = found.get(label.as_str()).copied().unwrap_or(fill);
                TrendPoint::new(label.as_str(), value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Record;
    use crate::storage::{MemoryExecutor, QueryFilter, QueryGuard};
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn executor() -> MemoryExecutor {
        let executor = MemoryExecutor::new();
        executor.insert_many(
            "sales",
            vec![
                Record::new().with("at", ts(2023, 6, 1)).with("amount", 400),
                Record::new().with("at", ts(2024, 1, 10)).with("amount", 100),
                Record::new().with("at", ts(2024, 2, 10)).with("amount", 110),
                Record::new().with("at", ts(2024, 3, 2)).with("amount", 60),
                Record::new().with("at", ts(2024, 3, 20)).with("amount", 61),
            ],
        );
        executor
    }

    #[test]
    fn test_growth_rate_over_three_months() {
        let executor = executor();
        let scope = DataScope::new(&executor, "sales", QueryFilter::new(), QueryGuard::default(), 100);
        let comparator = PeriodComparator::new(&scope, ts(2024, 3, 25), 2);

        let result = comparator
            .growth_rate("amount", TimeInterval::Month, 3, "at")
            .expect("growth rate should succeed");
        let values: Vec<f64> = result.data.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![100.0, 110.0, 121.0]);
        assert_eq!(result.rates, vec![10.0, 10.0]);
        assert_eq!(result.growth_rate, 10.0);
        assert_eq!(result.data[0].period, "2024-01");
    }

    #[test]
    fn test_compare_with_previous_month() {
        let executor = executor();
        let scope = DataScope::new(&executor, "sales", QueryFilter::new(), QueryGuard::default(), 100);
        let comparator = PeriodComparator::new(&scope, ts(2024, 3, 25), 2);

        let result = comparator
            .compare_with_previous("amount", AggregationOperation::Sum, TimeInterval::Month, "at")
            .expect("comparison should succeed");
        assert_eq!(result.current, 121.0);
        assert_eq!(result.previous, 110.0);
        assert_eq!(result.change_percent, 10.0);
    }

    #[test]
    fn test_year_over_year() {
        let executor = executor();
        let scope = DataScope::new(&executor, "sales", QueryFilter::new(), QueryGuard::default(), 100);
        let comparator = PeriodComparator::new(&scope, ts(2024, 3, 25), 2);

        let result = comparator
            .year_over_year("amount", AggregationOperation::Sum, "at")
            .expect("comparison should succeed");
        assert_eq!(result.current, 331.0);
        assert_eq!(result.previous, 400.0);
        assert_eq!(result.change, -69.0);
        assert_eq!(result.change_percent, -17.25);
    }

    #[test]
    fn test_zero_previous_transitions_are_skipped() {
        let (rates, average) = average_growth(&[0.0, 50.0, 100.0], 2);
        assert_eq!(rates, vec![100.0]);
        assert_eq!(average, 100.0);

        let (rates, average) = average_growth(&[0.0, 0.0], 2);
        assert!(rates.is_empty());
        assert_eq!(average, 0.0);
    }

    #[test]
    fn test_gap_filling() {
        let expected: Vec<String> = ["d1", "d2", "d3"].iter().map(|s| s.to_string()).collect();
        let filled = GapFiller::fill(&expected, &[TrendPoint::new("d2", 42.0)], 0.0);
        assert_eq!(
            filled,
            vec![
                TrendPoint::new("d1", 0.0),
                TrendPoint::new("d2", 42.0),
                TrendPoint::new("d3", 0.0)
            ]
        );
    }

    #[test]
    fn test_zero_periods_is_rejected() {
        let executor = executor();
        let scope = DataScope::new(&executor, "sales", QueryFilter::new(), QueryGuard::default(), 100);
        let comparator = PeriodComparator::new(&scope, ts(2024, 3, 25), 2);
        assert!(comparator.growth_rate("amount", TimeInterval::Day, 0, "at").is_err());
    }
}
