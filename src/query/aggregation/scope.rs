//! 单次请求的数据范围
//!
//! 把执行器、集合名、过滤条件、查询保护和物化上限绑在一起，
//! 所有组件都通过它访问 `QueryExecutor`

use log::{trace, warn};

use crate::core::error::{AggregateError, StatResult};
use crate::core::{PushdownOp, Record, TimeInterval, Value};
use crate::storage::{
    AggregateColumn, AggregateQuery, Condition, FetchQuery, FieldQuery, OrderBy, QueryExecutor,
    QueryFilter, QueryGuard, TrendQuery,
};

#[derive(Debug)]
pub struct DataScope<'a, E: QueryExecutor + ?Sized> {
    executor: &'a E,
    collection: &'a str,
    filter: QueryFilter,
    guard: QueryGuard,
    row_limit: usize,
}

impl<'a, E: QueryExecutor + ?Sized> DataScope<'a, E> {
    pub fn new(
        executor: &'a E,
        collection: &'a str,
        filter: QueryFilter,
        guard: QueryGuard,
        row_limit: usize,
    ) -> Self {
        Self {
            executor,
            collection,
            filter,
            guard,
            row_limit,
        }
    }

    /// 追加一个条件，得到更窄的范围
    pub fn narrowed(&self, condition: Condition) -> Self {
        Self {
            executor: self.executor,
            collection: self.collection,
            filter: self.filter.clone().and(condition),
            guard: self.guard.clone(),
            row_limit: self.row_limit,
        }
    }

    pub fn executor(&self) -> &E {
        self.executor
    }

    pub fn filter(&self) -> &QueryFilter {
        &self.filter
    }

    pub fn row_limit(&self) -> usize {
        self.row_limit
    }

    /// 下推聚合，一次往返
    pub fn pushdown(
        &self,
        columns: Vec<AggregateColumn>,
        group_by: &[String],
    ) -> StatResult<Vec<Record>> {
        trace!(
            "pushdown aggregate on {}: {} column(s), group by {:?}",
            self.collection,
            columns.len(),
            group_by
        );
        let query = AggregateQuery {
            collection: self.collection.to_string(),
            filter: self.filter.clone(),
            columns,
            group_by: group_by.to_vec(),
            guard: self.guard.clone(),
        };
        Ok(self.executor.pushdown_aggregate(&query)?)
    }

    /// 物化整行，超过上限时报错
    pub fn fetch_rows(&self, order_by: Option<OrderBy>) -> StatResult<Vec<Record>> {
        let query = FetchQuery {
            collection: self.collection.to_string(),
            filter: self.filter.clone(),
            order_by,
            limit: Some(self.row_limit.saturating_add(1)),
            guard: self.guard.clone(),
        };
        let rows = self.executor.fetch_all(&query)?;
        self.enforce_limit(rows.len())?;
        Ok(rows)
    }

    /// 只取前 n 行，由后端负责排序和截断
    pub fn fetch_top(&self, order_by: OrderBy, n: usize) -> StatResult<Vec<Record>> {
        let query = FetchQuery {
            collection: self.collection.to_string(),
            filter: self.filter.clone(),
            order_by: Some(order_by),
            limit: Some(n.min(self.row_limit)),
            guard: self.guard.clone(),
        };
        Ok(self.executor.fetch_all(&query)?)
    }

    /// 物化单个字段的非空值
    pub fn fetch_values(&self, field: &str) -> StatResult<Vec<Value>> {
        let query = FieldQuery {
            collection: self.collection.to_string(),
            filter: self.filter.clone(),
            field: field.to_string(),
            limit: Some(self.row_limit.saturating_add(1)),
            guard: self.guard.clone(),
        };
        let values = self.executor.fetch_field(&query)?;
        self.enforce_limit(values.len())?;
        Ok(values)
    }

    /// 物化单个字段的数值
    pub fn fetch_numbers(&self, field: &str) -> StatResult<Vec<f64>> {
        Ok(self
            .fetch_values(field)?
            .iter()
            .filter_map(Value::as_f64)
            .collect())
    }

    pub fn date_trend(
        &self,
        date_field: &str,
        interval: TimeInterval,
        value_field: Option<&str>,
        op: PushdownOp,
    ) -> StatResult<Vec<(String, f64)>> {
        let query = TrendQuery {
            collection: self.collection.to_string(),
            filter: self.filter.clone(),
            date_field: date_field.to_string(),
            interval,
            value_field: value_field.map(str::to_string),
            op,
            guard: self.guard.clone(),
        };
        Ok(self.executor.grouped_date_trend(&query)?)
    }

    fn enforce_limit(&self, fetched: usize) -> StatResult<()> {
        if fetched > self.row_limit {
            return Err(AggregateError::MaterializationLimit {
                limit: self.row_limit,
                actual: fetched,
            }
            .into());
        }
        if fetched > self.row_limit / 10 * 9 && fetched > 0 {
            warn!(
                "materialized {} of at most {} rows from {}",
                fetched, self.row_limit, self.collection
            );
        }
        Ok(())
    }
}
