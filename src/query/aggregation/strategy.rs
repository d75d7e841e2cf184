//! 聚合策略
//!
//! 每个聚合操作在请求时被分派到两种策略之一：
//! - 下推：count/sum/avg/min/max 由执行器原生计算，不物化数据
//! - 物化：median/mode/variance/stddev 需要拉取字段值在客户端计算
//!
//! 同一个请求中两种策略可以混用，结果按声明顺序合并。

use log::debug;
use std::collections::BTreeMap;

use super::pushdown::PushdownAggregator;
use super::scope::DataScope;
use super::spec::{AggregationEntry, AggregationSpec};
use super::statistics;
use crate::core::error::{AggregateError, StatResult};
use crate::core::{AggregationOperation, Record, Value};
use crate::storage::QueryExecutor;

/// 聚合策略类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Pushdown,
    Materialize,
}

impl StrategyKind {
    pub fn for_operation(operation: AggregationOperation) -> Self {
        if operation.is_pushdown_capable() {
            StrategyKind::Pushdown
        } else {
            StrategyKind::Materialize
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Pushdown => "Pushdown",
            StrategyKind::Materialize => "Materialize",
        }
    }
}

/// 聚合策略
pub trait AggregationStrategy {
    fn kind(&self) -> StrategyKind;

    /// 不分组求值，结果键 -> 标量
    fn evaluate<E: QueryExecutor + ?Sized>(
        &self,
        scope: &DataScope<'_, E>,
        entries: &[&AggregationEntry],
    ) -> StatResult<Record>;

    /// 分组求值，每组一行，包含分组字段和各结果键
    fn evaluate_grouped<E: QueryExecutor + ?Sized>(
        &self,
        scope: &DataScope<'_, E>,
        group_by: &[String],
        entries: &[&AggregationEntry],
    ) -> StatResult<Vec<Record>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PushdownStrategy;

impl AggregationStrategy for PushdownStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Pushdown
    }

    fn evaluate<E: QueryExecutor + ?Sized>(
        &self,
        scope: &DataScope<'_, E>,
        entries: &[&AggregationEntry],
    ) -> StatResult<Record> {
        PushdownAggregator::aggregate(scope, entries)
    }

    fn evaluate_grouped<E: QueryExecutor + ?Sized>(
        &self,
        scope: &DataScope<'_, E>,
        group_by: &[String],
        entries: &[&AggregationEntry],
    ) -> StatResult<Vec<Record>> {
        PushdownAggregator::aggregate_grouped(scope, group_by, entries)
    }
}

/// 物化策略：一次拉取行，所有物化项共用
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterializeStrategy;

impl MaterializeStrategy {
    fn reduce_entry(entry: &AggregationEntry, rows: &[&Record]) -> Value {
        match entry.field() {
            None => Value::Int(rows.len() as i64),
            Some(field) => {
                let values: Vec<Value> = rows.iter().map(|row| row.get(field).clone()).collect();
                statistics::reduce(entry.operation(), &values)
            }
        }
    }
}

impl AggregationStrategy for MaterializeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Materialize
    }

    fn evaluate<E: QueryExecutor + ?Sized>(
        &self,
        scope: &DataScope<'_, E>,
        entries: &[&AggregationEntry],
    ) -> StatResult<Record> {
        let mut result = Record::new();
        if entries.is_empty() {
            return Ok(result);
        }

        let rows = scope.fetch_rows(None)?;
        let refs: Vec<&Record> = rows.iter().collect();
        for entry in entries {
            result.set(entry.key(), Self::reduce_entry(entry, &refs));
        }
        Ok(result)
    }

    fn evaluate_grouped<E: QueryExecutor + ?Sized>(
        &self,
        scope: &DataScope<'_, E>,
        group_by: &[String],
        entries: &[&AggregationEntry],
    ) -> StatResult<Vec<Record>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let rows = scope.fetch_rows(None)?;
        let mut groups: BTreeMap<Vec<Value>, Vec<&Record>> = BTreeMap::new();
        for row in &rows {
            let key = group_by.iter().map(|field| row.get(field).clone()).collect();
            groups.entry(key).or_default().push(row);
        }

        Ok(groups
            .into_iter()
            .map(|(key, members)| {
                let mut record: Record = group_by.iter().cloned().zip(key).collect();
                for entry in entries {
                    record.set(entry.key(), Self::reduce_entry(entry, &members));
                }
                record
            })
            .collect())
    }
}

/// 按策略拆分后分别求值，再按声明顺序合并
pub fn evaluate_spec<E: QueryExecutor + ?Sized>(
    scope: &DataScope<'_, E>,
    spec: &AggregationSpec,
) -> StatResult<Record> {
    let (pushdown, materialize) = spec.partition();
    debug!(
        "aggregate: {} pushdown, {} materialized entries",
        pushdown.len(),
        materialize.len()
    );

    let pushed = PushdownStrategy.evaluate(scope, &pushdown)?;
    let materialized = MaterializeStrategy.evaluate(scope, &materialize)?;

    Ok(spec
        .entries()
        .iter()
        .map(|entry| {
            let value = match entry.strategy() {
                StrategyKind::Pushdown => pushed.get(entry.key()),
                StrategyKind::Materialize => materialized.get(entry.key()),
            };
            (entry.key().to_string(), value.clone())
        })
        .collect())
}

/// 分组版本，组按分组键升序
pub fn evaluate_spec_grouped<E: QueryExecutor + ?Sized>(
    scope: &DataScope<'_, E>,
    group_by: &[String],
    spec: &AggregationSpec,
) -> StatResult<Vec<Record>> {
    // 结果键与分组列同名时，输出行无法同时容纳两者
    if let Some(entry) = spec
        .entries()
        .iter()
        .find(|entry| group_by.iter().any(|field| field == entry.key()))
    {
        return Err(AggregateError::invalid_argument(format!(
            "result key '{}' collides with a group-by field",
            entry.key()
        ))
        .into());
    }

    let (pushdown, materialize) = spec.partition();
    debug!(
        "grouped aggregate by {:?}: {} pushdown, {} materialized entries",
        group_by,
        pushdown.len(),
        materialize.len()
    );

    // 每组按来源策略各保留一行部分结果
    let mut groups: BTreeMap<Vec<Value>, [Option<Record>; 2]> = BTreeMap::new();
    let partials = [
        (StrategyKind::Pushdown, PushdownStrategy.evaluate_grouped(scope, group_by, &pushdown)?),
        (
            StrategyKind::Materialize,
            MaterializeStrategy.evaluate_grouped(scope, group_by, &materialize)?,
        ),
    ];
    for (kind, rows) in partials {
        for row in rows {
            let key = group_by.iter().map(|field| row.get(field).clone()).collect();
            groups.entry(key).or_default()[slot(kind)] = Some(row);
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, partial_rows)| {
            let mut record: Record = group_by.iter().cloned().zip(key).collect();
            for entry in spec.entries() {
                let value = partial_rows[slot(entry.strategy())]
                    .as_ref()
                    .filter(|row| row.contains(entry.key()))
                    .map(|row| row.get(entry.key()).clone())
                    .unwrap_or_else(|| empty_value(entry.operation()));
                record.set(entry.key(), value);
            }
            record
        })
        .collect())
}

/// 单个操作的数值结果
pub fn evaluate_single<E: QueryExecutor + ?Sized>(
    scope: &DataScope<'_, E>,
    operation: AggregationOperation,
    field: Option<&str>,
) -> StatResult<Value> {
    let entry = match field {
        Some(field) => AggregationEntry::new(operation.name(), operation, field),
        None => AggregationEntry::count_rows(operation.name()),
    };
    let spec = AggregationSpec::new().with_entry(entry);
    let result = evaluate_spec(scope, &spec)?;
    Ok(result.get(operation.name()).clone())
}

fn slot(kind: StrategyKind) -> usize {
    match kind {
        StrategyKind::Pushdown => 0,
        StrategyKind::Materialize => 1,
    }
}

fn empty_value(operation: AggregationOperation) -> Value {
    match operation {
        AggregationOperation::Count => Value::Int(0),
        AggregationOperation::Mode => Value::Null,
        _ => Value::Float(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::StatError;
    use crate::storage::{MemoryExecutor, QueryFilter, QueryGuard};

    fn executor() -> MemoryExecutor {
        let executor = MemoryExecutor::new();
        executor.insert_many(
            "products",
            vec![
                Record::new().with("category", "a").with("price", 10),
                Record::new().with("category", "a").with("price", 20),
                Record::new().with("category", "b").with("price", 30),
                Record::new().with("category", "b").with("price", 40),
                Record::new().with("category", "b").with("price", 50),
            ],
        );
        executor
    }

    fn scope(executor: &MemoryExecutor) -> DataScope<'_, MemoryExecutor> {
        DataScope::new(executor, "products", QueryFilter::new(), QueryGuard::default(), 1000)
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(
            StrategyKind::for_operation(AggregationOperation::Avg),
            StrategyKind::Pushdown
        );
        assert_eq!(
            StrategyKind::for_operation(AggregationOperation::Median),
            StrategyKind::Materialize
        );
        assert_eq!(StrategyKind::Materialize.name(), "Materialize");
    }

    #[test]
    fn test_mixed_spec_keeps_declaration_order() {
        let executor = executor();
        let spec = AggregationSpec::new()
            .with("median_price", AggregationOperation::Median, "price")
            .count("n")
            .with("spread", AggregationOperation::Variance, "price")
            .avg("avg_price", "price");

        let result = evaluate_spec(&scope(&executor), &spec).expect("evaluate should succeed");
        let keys: Vec<&str> = result.field_names().collect();
        assert_eq!(keys, vec!["median_price", "n", "spread", "avg_price"]);
        assert_eq!(result.get_f64("median_price"), Some(30.0));
        assert_eq!(result.get("n"), &Value::Int(5));
        assert_eq!(result.get_f64("spread"), Some(200.0));
        assert_eq!(result.get_f64("avg_price"), Some(30.0));
    }

    #[test]
    fn test_materialize_fetches_once_for_all_entries() {
        let executor = executor();
        let spec = AggregationSpec::new()
            .with("median", AggregationOperation::Median, "price")
            .with("mode", AggregationOperation::Mode, "category")
            .with("sd", AggregationOperation::StdDev, "price");

        evaluate_spec(&scope(&executor), &spec).expect("evaluate should succeed");
        assert_eq!(executor.queries_issued(), 1);
    }

    #[test]
    fn test_grouped_mixed_strategies() {
        let executor = executor();
        let spec = AggregationSpec::new()
            .sum("total", "price")
            .with("median", AggregationOperation::Median, "price");

        let rows = evaluate_spec_grouped(&scope(&executor), &["category".to_string()], &spec)
            .expect("grouped evaluate should succeed");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("category"), &Value::from("a"));
        assert_eq!(rows[0].get_f64("total"), Some(30.0));
        assert_eq!(rows[0].get_f64("median"), Some(15.0));
        assert_eq!(rows[1].get_f64("total"), Some(120.0));
        assert_eq!(rows[1].get_f64("median"), Some(40.0));
    }

    #[test]
    fn test_grouped_key_colliding_with_group_field_is_rejected() {
        let executor = executor();
        let group_by = ["category".to_string()];
        for spec in [
            AggregationSpec::new().sum("category", "price"),
            AggregationSpec::new()
                .sum("total", "price")
                .with("category", AggregationOperation::Median, "price"),
        ] {
            let result = evaluate_spec_grouped(&scope(&executor), &group_by, &spec);
            assert!(matches!(
                result,
                Err(StatError::Aggregate(AggregateError::InvalidArgument(_)))
            ));
        }
        assert_eq!(executor.queries_issued(), 0);
    }

    #[test]
    fn test_evaluate_single() {
        let executor = executor();
        let value = evaluate_single(&scope(&executor), AggregationOperation::Max, Some("price"))
            .expect("evaluate should succeed");
        assert_eq!(value, Value::Int(50));
        let count = evaluate_single(&scope(&executor), AggregationOperation::Count, None)
            .expect("evaluate should succeed");
        assert_eq!(count, Value::Int(5));
    }
}
