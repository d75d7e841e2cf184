//! 下推聚合器
//!
//! 把 count/sum/avg/min/max 翻译成执行器原生的聚合查询。执行器支持
//! 批量时所有列合并为一次往返，否则每个聚合项一次往返。

use log::debug;
use std::collections::BTreeMap;

use super::scope::DataScope;
use super::spec::AggregationEntry;
use crate::core::error::StatResult;
use crate::core::{PushdownOp, Record, Value};
use crate::storage::{AggregateColumn, QueryExecutor};

pub struct PushdownAggregator;

impl PushdownAggregator {
    /// 不分组聚合，返回 结果键 -> 标量
    pub fn aggregate<E: QueryExecutor + ?Sized>(
        scope: &DataScope<'_, E>,
        entries: &[&AggregationEntry],
    ) -> StatResult<Record> {
        let columns = Self::columns(entries);
        let mut result = Record::new();
        if columns.is_empty() {
            return Ok(result);
        }

        let batches = Self::batches(scope, columns);
        for batch in batches {
            let rows = scope.pushdown(batch.clone(), &[])?;
            let row = rows.into_iter().next().unwrap_or_default();
            for column in &batch {
                let value = Self::normalize(column.op, row.get(&column.alias).clone());
                result.set(column.alias.as_str(), value);
            }
        }
        Ok(result)
    }

    /// 分组聚合，每组一行：分组字段 + 聚合列，按分组键升序
    pub fn aggregate_grouped<E: QueryExecutor + ?Sized>(
        scope: &DataScope<'_, E>,
        group_by: &[String],
        entries: &[&AggregationEntry],
    ) -> StatResult<Vec<Record>> {
        let columns = Self::columns(entries);
        if columns.is_empty() {
            return Ok(Vec::new());
        }

        let mut groups: BTreeMap<Vec<Value>, Record> = BTreeMap::new();
        for batch in Self::batches(scope, columns) {
            for row in scope.pushdown(batch.clone(), group_by)? {
                let key: Vec<Value> = group_by.iter().map(|f| row.get(f).clone()).collect();
                let merged = groups
                    .entry(key)
                    .or_insert_with(|| row.project(&Self::field_refs(group_by)));
                for column in &batch {
                    let value = Self::normalize(column.op, row.get(&column.alias).clone());
                    merged.set(column.alias.as_str(), value);
                }
            }
        }
        Ok(groups.into_values().collect())
    }

    /// 单个下推聚合值
    pub fn scalar<E: QueryExecutor + ?Sized>(
        scope: &DataScope<'_, E>,
        op: PushdownOp,
        field: Option<&str>,
    ) -> StatResult<Value> {
        let column = AggregateColumn {
            alias: op.name().to_ascii_lowercase(),
            op,
            field: field.map(str::to_string),
        };
        let alias = column.alias.clone();
        let rows = scope.pushdown(vec![column], &[])?;
        let value = rows
            .into_iter()
            .next()
            .map(|row| row.get(&alias).clone())
            .unwrap_or_default();
        Ok(Self::normalize(op, value))
    }

    fn columns(entries: &[&AggregationEntry]) -> Vec<AggregateColumn> {
        entries
            .iter()
            .filter_map(|entry| {
                entry.operation().pushdown_op().map(|op| AggregateColumn {
                    alias: entry.key().to_string(),
                    op,
                    field: entry.field().map(str::to_string),
                })
            })
            .collect()
    }

    fn batches<E: QueryExecutor + ?Sized>(
        scope: &DataScope<'_, E>,
        columns: Vec<AggregateColumn>,
    ) -> Vec<Vec<AggregateColumn>> {
        if scope.executor().supports_batching() {
            debug!("pushdown: batching {} column(s) into one query", columns.len());
            vec![columns]
        } else {
            debug!("pushdown: issuing {} single-column queries", columns.len());
            columns.into_iter().map(|column| vec![column]).collect()
        }
    }

    fn field_refs(fields: &[String]) -> Vec<&str> {
        fields.iter().map(String::as_str).collect()
    }

    /// 空输入上后端返回的 Null 折叠为 0
    fn normalize(op: PushdownOp, value: Value) -> Value {
        match (op, value) {
            (PushdownOp::Count, Value::Null) => Value::Int(0),
            (_, Value::Null) => Value::Float(0.0),
            (_, value) => value,
        }
    }
}
