//! 聚合请求规范
//!
//! `AggregationSpec` 是有序的 结果键 -> (操作, 字段) 映射，结果按声明顺序输出

use crate::core::error::AggregateError;
use crate::core::AggregationOperation;

use super::strategy::StrategyKind;

/// 单个聚合项
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationEntry {
    key: String,
    operation: AggregationOperation,
    field: Option<String>,
}

impl AggregationEntry {
    pub fn new(
        key: impl Into<String>,
        operation: AggregationOperation,
        field: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            operation,
            field: Some(field.into()),
        }
    }

    /// COUNT(*)
    pub fn count_rows(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operation: AggregationOperation::Count,
            field: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operation(&self) -> AggregationOperation {
        self.operation
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn strategy(&self) -> StrategyKind {
        StrategyKind::for_operation(self.operation)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationSpec {
    entries: Vec<AggregationEntry>,
}

impl AggregationSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        key: impl Into<String>,
        operation: AggregationOperation,
        field: impl Into<String>,
    ) -> Self {
        self.entries.push(AggregationEntry::new(key, operation, field));
        self
    }

    pub fn with_entry(mut self, entry: AggregationEntry) -> Self {
        self.entries.push(entry);
        self
    }

    // 便捷构造函数
    pub fn count(self, key: impl Into<String>) -> Self {
        self.with_entry(AggregationEntry::count_rows(key))
    }

    pub fn sum(self, key: impl Into<String>, field: impl Into<String>) -> Self {
        self.with(key, AggregationOperation::Sum, field)
    }

    pub fn avg(self, key: impl Into<String>, field: impl Into<String>) -> Self {
        self.with(key, AggregationOperation::Avg, field)
    }

    pub fn min(self, key: impl Into<String>, field: impl Into<String>) -> Self {
        self.with(key, AggregationOperation::Min, field)
    }

    pub fn max(self, key: impl Into<String>, field: impl Into<String>) -> Self {
        self.with(key, AggregationOperation::Max, field)
    }

    /// 从字符串操作名构造；未知操作名返回错误
    pub fn parse_entry(
        self,
        key: impl Into<String>,
        operation: &str,
        field: impl Into<String>,
    ) -> Result<Self, AggregateError> {
        let operation = operation.parse::<AggregationOperation>()?;
        Ok(self.with(key, operation, field))
    }

    pub fn entries(&self) -> &[AggregationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按执行策略拆分，保持各自的声明顺序
    pub fn partition(&self) -> (Vec<&AggregationEntry>, Vec<&AggregationEntry>) {
        self.entries
            .iter()
            .partition(|entry| entry.strategy() == StrategyKind::Pushdown)
    }
}
