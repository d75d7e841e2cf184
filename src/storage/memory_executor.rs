//! 内存执行器
//!
//! 以集合名 -> 行列表的形式保存数据。每次调用都在读锁内复制出快照，
//! 之后对集合的写入不会影响已经取出的数据集。

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::filter::QueryFilter;
use super::query_executor::{
    AggregateColumn, AggregateQuery, FetchQuery, FieldQuery, QueryExecutor, TrendQuery,
};
use super::guard::QueryGuard;
use crate::core::error::{StorageError, StorageResult};
use crate::core::{PushdownOp, Record, SortDirection, Value};

#[derive(Clone, Default)]
pub struct MemoryExecutor {
    collections: Arc<RwLock<HashMap<String, Vec<Record>>>>,
    queries_issued: Arc<AtomicUsize>,
    batching: bool,
}

impl std::fmt::Debug for MemoryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryExecutor")
            .field("collections", &self.collections.read().len())
            .field("queries_issued", &self.queries_issued())
            .field("batching", &self.batching)
            .finish()
    }
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开启后 `pushdown_aggregate` 声明支持多列批量计算
    pub fn with_batching(mut self, batching: bool) -> Self {
        self.batching = batching;
        self
    }

    pub fn create_collection(&self, name: &str) {
        self.collections
            .write()
            .entry(name.to_string())
            .or_default();
    }

    pub fn insert(&self, collection: &str, record: Record) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(record);
    }

    pub fn insert_many(&self, collection: &str, records: impl IntoIterator<Item = Record>) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .extend(records);
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// 已执行的查询往返次数
    pub fn queries_issued(&self) -> usize {
        self.queries_issued.load(Ordering::SeqCst)
    }

    pub fn reset_query_count(&self) {
        self.queries_issued.store(0, Ordering::SeqCst);
    }

    fn begin(&self, guard: &QueryGuard) -> StorageResult<()> {
        guard.check()?;
        self.queries_issued.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn snapshot(&self, collection: &str, filter: &QueryFilter) -> StorageResult<Vec<Record>> {
        let collections = self.collections.read();
        let rows = collections
            .get(collection)
            .ok_or_else(|| StorageError::UnknownCollection(collection.to_string()))?;
        Ok(rows
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    fn reduce_column(rows: &[&Record], column: &AggregateColumn) -> Value {
        let field = match (&column.field, column.op) {
            (None, PushdownOp::Count) => return Value::Int(rows.len() as i64),
            (None, _) => return Value::Null,
            (Some(field), _) => field,
        };
        let values: Vec<&Value> = rows
            .iter()
            .map(|record| record.get(field))
            .filter(|value| !value.is_null())
            .collect();

        match column.op {
            PushdownOp::Count => Value::Int(values.len() as i64),
            PushdownOp::Sum | PushdownOp::Avg => {
                let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
                if numbers.is_empty() {
                    return Value::Null;
                }
                let sum: f64 = numbers.iter().sum();
                if column.op == PushdownOp::Sum {
                    Value::Float(sum)
                } else {
                    Value::Float(sum / numbers.len() as f64)
                }
            }
            PushdownOp::Min => values.into_iter().min().cloned().unwrap_or_default(),
            PushdownOp::Max => values.into_iter().max().cloned().unwrap_or_default(),
        }
    }
}

impl QueryExecutor for MemoryExecutor {
    fn pushdown_aggregate(&self, query: &AggregateQuery) -> StorageResult<Vec<Record>> {
        self.begin(&query.guard)?;
        let rows = self.snapshot(&query.collection, &query.filter)?;

        if query.group_by.is_empty() {
            let refs: Vec<&Record> = rows.iter().collect();
            let result = query
                .columns
                .iter()
                .map(|column| (column.alias.clone(), Self::reduce_column(&refs, column)))
                .collect();
            return Ok(vec![result]);
        }

        let mut groups: BTreeMap<Vec<Value>, Vec<&Record>> = BTreeMap::new();
        for record in &rows {
            let key = query
                .group_by
                .iter()
                .map(|field| record.get(field).clone())
                .collect();
            groups.entry(key).or_default().push(record);
        }

        let mut output = Vec::with_capacity(groups.len());
        for (key, members) in groups {
            query.guard.check()?;
            let mut row = Record::new();
            for (field, value) in query.group_by.iter().zip(key) {
                row.set(field.as_str(), value);
            }
            for column in &query.columns {
                row.set(column.alias.as_str(), Self::reduce_column(&members, column));
            }
            output.push(row);
        }
        Ok(output)
    }

    fn supports_batching(&self) -> bool {
        self.batching
    }

    fn fetch_all(&self, query: &FetchQuery) -> StorageResult<Vec<Record>> {
        self.begin(&query.guard)?;
        let mut rows = self.snapshot(&query.collection, &query.filter)?;

        // 稳定排序，相等键保留存储顺序
        if let Some(order) = &query.order_by {
            rows.sort_by(|a, b| {
                let ordering = a.get(&order.field).cmp(b.get(&order.field));
                match order.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    fn fetch_field(&self, query: &FieldQuery) -> StorageResult<Vec<Value>> {
        self.begin(&query.guard)?;
        let rows = self.snapshot(&query.collection, &query.filter)?;
        let values = rows
            .iter()
            .map(|record| record.get(&query.field))
            .filter(|value| !value.is_null())
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(values)
    }

    fn grouped_date_trend(&self, query: &TrendQuery) -> StorageResult<Vec<(String, f64)>> {
        self.begin(&query.guard)?;
        let rows = self.snapshot(&query.collection, &query.filter)?;

        let mut buckets: BTreeMap<String, Vec<&Record>> = BTreeMap::new();
        for record in &rows {
            if let Some(ts) = record.get(&query.date_field).as_timestamp() {
                buckets
                    .entry(query.interval.label(ts))
                    .or_default()
                    .push(record);
            }
        }

        let column = AggregateColumn {
            alias: "value".to_string(),
            op: query.op,
            field: query.value_field.clone(),
        };
        Ok(buckets
            .into_iter()
            .map(|(label, members)| {
                let value = Self::reduce_column(&members, &column).as_f64().unwrap_or(0.0);
                (label, value)
            })
            .collect())
    }
}
