//! 聚合引擎
//!
//! 对外的库接口。每个公开方法就是一个独立请求：构造新的 `DataScope`
//! 和查询保护，按需捕获一次参考时刻，返回后不保留任何状态。

use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;

use super::histogram::HistogramBuilder;
use super::period::{GapFiller, PeriodComparator};
use super::pivot::PivotBuilder;
use super::ranking::RankingEngine;
use super::scope::DataScope;
use super::sequential::SequentialAggregator;
use super::spec::AggregationSpec;
use super::statistics;
use super::strategy::{evaluate_single, evaluate_spec, evaluate_spec_grouped, StrategyKind};
use super::time_bucket::TimeBucketer;
use super::types::{
    ComparisonResult, GrowthRateResult, HistogramBin, PercentileSet, PivotTable, ShareItem,
    StatisticalSummary, TrendPoint,
};
use super::pushdown::PushdownAggregator;
use crate::common::time::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::core::error::{AggregateError, StatResult};
use crate::core::{AggregationOperation, PushdownOp, Record, SortDirection, TimeInterval, Value};
use crate::storage::{CancellationToken, Condition, OrderBy, QueryExecutor, QueryFilter, QueryGuard};
use crate::utils::math::percentage;

#[derive(Debug)]
pub struct AggregationEngine<E: QueryExecutor> {
    executor: Arc<E>,
    collection: String,
    filter: QueryFilter,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    token: CancellationToken,
}

impl<E: QueryExecutor> AggregationEngine<E> {
    pub fn new(executor: Arc<E>, collection: impl Into<String>) -> Self {
        Self {
            executor,
            collection: collection.into(),
            filter: QueryFilter::new(),
            clock: Arc::new(SystemClock),
            config: EngineConfig::default(),
            token: CancellationToken::new(),
        }
    }

    /// 上游已确定的数据集选择条件
    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// 共享取消标记；取消后所有后续执行器调用返回 `Cancelled`
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn scope(&self) -> DataScope<'_, E> {
        let mut guard = QueryGuard::new(self.token.clone());
        if let Some(timeout_ms) = self.config.query_timeout_ms {
            guard = guard.with_timeout(Duration::from_millis(timeout_ms));
        }
        DataScope::new(
            self.executor.as_ref(),
            &self.collection,
            self.filter.clone(),
            guard,
            self.config.max_materialized_rows,
        )
    }

    fn precision(&self) -> u32 {
        self.config.percentage_precision
    }

    // ==================== 聚合 ====================

    /// 按规范求值，结果键按声明顺序排列
    pub fn aggregate(&self, spec: &AggregationSpec) -> StatResult<Record> {
        debug!("aggregate on {}: {} entries", self.collection, spec.len());
        evaluate_spec(&self.scope(), spec)
    }

    /// 按单个字段分组聚合
    pub fn group_by_with_aggregations(
        &self,
        field: &str,
        spec: &AggregationSpec,
    ) -> StatResult<Vec<Record>> {
        self.aggregate_by(&[field], spec)
    }

    /// 按多个字段分组聚合
    pub fn aggregate_by(&self, fields: &[&str], spec: &AggregationSpec) -> StatResult<Vec<Record>> {
        if fields.is_empty() {
            return Err(AggregateError::invalid_argument("group-by fields must not be empty").into());
        }
        let group_by: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        debug!("aggregate on {} grouped by {:?}", self.collection, group_by);
        evaluate_spec_grouped(&self.scope(), &group_by, spec)
    }

    // ==================== 统计量 ====================

    pub fn statistical_summary(&self, field: &str) -> StatResult<StatisticalSummary> {
        let scope = self.scope();
        let basics = AggregationSpec::new()
            .with("count", AggregationOperation::Count, field)
            .sum("sum", field)
            .avg("avg", field)
            .min("min", field)
            .max("max", field);
        let totals = evaluate_spec(&scope, &basics)?;

        let count = totals.get_f64("count").unwrap_or(0.0) as u64;
        if count == 0 {
            return Ok(StatisticalSummary::empty());
        }

        let values = scope.fetch_values(field)?;
        let numbers = statistics::numeric_values(&values);
        Ok(StatisticalSummary {
            count,
            sum: totals.get_f64("sum").unwrap_or(0.0),
            avg: totals.get_f64("avg").unwrap_or(0.0),
            min: totals.get_f64("min").unwrap_or(0.0),
            max: totals.get_f64("max").unwrap_or(0.0),
            median: statistics::median(&numbers),
            mode: statistics::mode(&values).unwrap_or(Value::Null),
            variance: statistics::variance(&numbers),
            std_dev: statistics::std_dev(&numbers),
            percentiles: statistics::percentiles(&numbers, &self.config.summary_percentiles),
        })
    }

    /// 线性插值百分位，p 取值 [0, 100]
    pub fn percentiles(&self, field: &str, requested: &[f64]) -> StatResult<PercentileSet> {
        if let Some(bad) = requested
            .iter()
            .find(|p| !p.is_finite() || **p < 0.0 || **p > 100.0)
        {
            return Err(
                AggregateError::invalid_argument(format!("percentile out of range: {bad}")).into(),
            );
        }
        let numbers = self.scope().fetch_numbers(field)?;
        Ok(statistics::percentiles(&numbers, requested))
    }

    pub fn histogram(&self, field: &str, bins: usize) -> StatResult<Vec<HistogramBin>> {
        let builder = HistogramBuilder::new(bins)?;
        let scope = self.scope();
        let values = scope.fetch_numbers(field)?;
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let min = PushdownAggregator::scalar(&scope, PushdownOp::Min, Some(field))?
            .as_f64()
            .unwrap_or_else(|| values.iter().copied().fold(f64::INFINITY, f64::min));
        let max = PushdownAggregator::scalar(&scope, PushdownOp::Max, Some(field))?
            .as_f64()
            .unwrap_or_else(|| values.iter().copied().fold(f64::NEG_INFINITY, f64::max));
        Ok(builder.build(&values, min, max))
    }

    /// 两个字段的皮尔逊相关系数，只使用两者都为数值的行
    pub fn correlation(&self, field_a: &str, field_b: &str) -> StatResult<f64> {
        let scope = self
            .scope()
            .narrowed(Condition::not_null(field_a))
            .narrowed(Condition::not_null(field_b));
        let rows = scope.fetch_rows(None)?;
        let pairs: Vec<(f64, f64)> = rows
            .iter()
            .filter_map(|row| Some((row.get_f64(field_a)?, row.get_f64(field_b)?)))
            .collect();
        Ok(statistics::correlation(&pairs))
    }

    pub fn pivot(
        &self,
        row_field: &str,
        column_field: &str,
        value_field: &str,
        operation: AggregationOperation,
    ) -> StatResult<PivotTable> {
        let rows = self.scope().fetch_rows(None)?;
        Ok(PivotBuilder::new(row_field, column_field, value_field, operation).build(&rows))
    }

    // ==================== 趋势 ====================

    /// 按周期标签分组的趋势，标签升序即时间顺序
    ///
    /// 可下推的操作交给 `grouped_date_trend`，其余操作物化后在本地分桶
    pub fn trend(
        &self,
        date_field: &str,
        interval: TimeInterval,
        value_field: Option<&str>,
        operation: AggregationOperation,
    ) -> StatResult<Vec<TrendPoint>> {
        self.trend_in(&self.scope(), date_field, interval, value_field, operation)
    }

    /// 最近 `periods` 个周期的趋势，缺失周期填 `fill_value`，最早的在前
    pub fn trend_with_gap_filling(
        &self,
        date_field: &str,
        interval: TimeInterval,
        fill_value: f64,
        periods: usize,
        value_field: Option<&str>,
        operation: AggregationOperation,
    ) -> StatResult<Vec<TrendPoint>> {
        let now = self.clock.now();
        let bucketer = TimeBucketer::new(interval);
        let expected = bucketer.expected_periods(now, periods);
        let (Some(first), Some(last)) = (expected.first(), expected.last()) else {
            return Ok(Vec::new());
        };

        let scope = self
            .scope()
            .narrowed(Condition::range(date_field, first.start, last.end));
        let actual = self.trend_in(&scope, date_field, interval, value_field, operation)?;
        let labels: Vec<String> = expected.iter().map(|p| bucketer.label(p.start)).collect();
        Ok(GapFiller::fill(&labels, &actual, fill_value))
    }

    fn trend_in(
        &self,
        scope: &DataScope<'_, E>,
        date_field: &str,
        interval: TimeInterval,
        value_field: Option<&str>,
        operation: AggregationOperation,
    ) -> StatResult<Vec<TrendPoint>> {
        if value_field.is_none() && operation != AggregationOperation::Count {
            return Err(AggregateError::invalid_argument(format!(
                "{operation} trend requires a value field"
            ))
            .into());
        }

        let strategy = StrategyKind::for_operation(operation);
        debug!(
            "trend on {} by {}: {} via {}",
            self.collection,
            interval,
            operation,
            strategy.name()
        );
        match operation.pushdown_op() {
            Some(op) => Ok(scope
                .date_trend(date_field, interval, value_field, op)?
                .into_iter()
                .map(|(period, value)| TrendPoint::new(period, value))
                .collect()),
            None => {
                let rows = scope.narrowed(Condition::not_null(date_field)).fetch_rows(None)?;
                Ok(TimeBucketer::new(interval).bucket(&rows, date_field, value_field, operation))
            }
        }
    }

    // ==================== 顺序统计 ====================

    pub fn moving_average(
        &self,
        field: &str,
        window: usize,
        order_field: &str,
    ) -> StatResult<Vec<Record>> {
        if window == 0 {
            return Err(AggregateError::invalid_argument("window must be positive").into());
        }
        let rows = self.scope().fetch_rows(Some(OrderBy::asc(order_field)))?;
        Ok(SequentialAggregator::moving_average(rows, field, window)?)
    }

    pub fn running_total(&self, field: &str, order_field: &str) -> StatResult<Vec<Record>> {
        let rows = self.scope().fetch_rows(Some(OrderBy::asc(order_field)))?;
        Ok(SequentialAggregator::running_total(rows, field))
    }

    pub fn cumulative_average(&self, field: &str, order_field: &str) -> StatResult<Vec<Record>> {
        let rows = self.scope().fetch_rows(Some(OrderBy::asc(order_field)))?;
        Ok(SequentialAggregator::cumulative_average(rows, field))
    }

    // ==================== 排名 ====================

    /// 按字段降序排名，可选分区
    pub fn rank_by(&self, field: &str, partition: Option<&str>) -> StatResult<Vec<Record>> {
        let rows = self.scope().fetch_rows(Some(OrderBy::desc(field)))?;
        Ok(RankingEngine::assign(rows, partition))
    }

    /// 字段值最大（或按 direction 最小）的 n 行，忽略字段为 Null 的行
    pub fn top_n(&self, field: &str, n: usize, direction: SortDirection) -> StatResult<Vec<Record>> {
        let order = OrderBy {
            field: field.to_string(),
            direction,
        };
        self.scope()
            .narrowed(Condition::not_null(field))
            .fetch_top(order, n)
    }

    pub fn bottom_n(&self, field: &str, n: usize) -> StatResult<Vec<Record>> {
        self.top_n(field, n, SortDirection::Asc)
    }

    /// 各分组的聚合值及其占总量的百分比
    pub fn percentage_share(
        &self,
        group_field: &str,
        field: &str,
        operation: AggregationOperation,
    ) -> StatResult<Vec<ShareItem>> {
        let spec = AggregationSpec::new().with("value", operation, field);
        let rows = self.aggregate_by(&[group_field], &spec)?;

        let values: Vec<f64> = rows
            .iter()
            .map(|row| row.get_f64("value").unwrap_or(0.0))
            .collect();
        let total: f64 = values.iter().sum();
        Ok(rows
            .iter()
            .zip(values)
            .map(|(row, value)| ShareItem {
                group: row.get(group_field).clone(),
                value,
                percentage: percentage(value, total),
            })
            .collect())
    }

    // ==================== 周期对比 ====================

    pub fn compare_with_previous_period(
        &self,
        field: &str,
        metric: AggregationOperation,
        interval: TimeInterval,
        date_field: &str,
    ) -> StatResult<ComparisonResult> {
        let scope = self.scope();
        PeriodComparator::new(&scope, self.clock.now(), self.precision())
            .compare_with_previous(field, metric, interval, date_field)
    }

    pub fn year_over_year(
        &self,
        field: &str,
        metric: AggregationOperation,
        date_field: &str,
    ) -> StatResult<ComparisonResult> {
        let scope = self.scope();
        PeriodComparator::new(&scope, self.clock.now(), self.precision())
            .year_over_year(field, metric, date_field)
    }

    pub fn growth_rate(
        &self,
        field: &str,
        interval: TimeInterval,
        periods: usize,
        date_field: &str,
    ) -> StatResult<GrowthRateResult> {
        let scope = self.scope();
        let result = PeriodComparator::new(&scope, self.clock.now(), self.precision())
            .growth_rate(field, interval, periods, date_field)?;
        info!(
            "growth rate of {} over {} {}(s): {}%",
            field, periods, interval, result.growth_rate
        );
        Ok(result)
    }

    // ==================== 便捷方法 ====================

    pub fn count(&self) -> StatResult<u64> {
        let value = evaluate_single(&self.scope(), AggregationOperation::Count, None)?;
        Ok(value.as_f64().unwrap_or(0.0) as u64)
    }

    pub fn sum(&self, field: &str) -> StatResult<f64> {
        self.numeric(AggregationOperation::Sum, field)
    }

    pub fn avg(&self, field: &str) -> StatResult<f64> {
        self.numeric(AggregationOperation::Avg, field)
    }

    /// 保留字段原始类型
    pub fn min(&self, field: &str) -> StatResult<Value> {
        evaluate_single(&self.scope(), AggregationOperation::Min, Some(field))
    }

    pub fn max(&self, field: &str) -> StatResult<Value> {
        evaluate_single(&self.scope(), AggregationOperation::Max, Some(field))
    }

    pub fn median(&self, field: &str) -> StatResult<f64> {
        self.numeric(AggregationOperation::Median, field)
    }

    /// 空数据集返回 Null
    pub fn mode(&self, field: &str) -> StatResult<Value> {
        evaluate_single(&self.scope(), AggregationOperation::Mode, Some(field))
    }

    pub fn variance(&self, field: &str) -> StatResult<f64> {
        self.numeric(AggregationOperation::Variance, field)
    }

    pub fn std_dev(&self, field: &str) -> StatResult<f64> {
        self.numeric(AggregationOperation::StdDev, field)
    }

    fn numeric(&self, operation: AggregationOperation, field: &str) -> StatResult<f64> {
        let value = evaluate_single(&self.scope(), operation, Some(field))?;
        Ok(value.as_f64().unwrap_or(0.0))
    }
}
