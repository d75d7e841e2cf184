//! 查询过滤条件
//!
//! 仅包含引擎自身需要的类型化谓词（周期限定、分组匹配），
//! 不是通用的查询语言。上游过滤在构造引擎时以 `QueryFilter` 传入。

use chrono::Datelike;

use crate::core::{Record, Value};

/// 单个过滤条件
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// field == value
    Equals { field: String, value: Value },
    /// start <= field < end
    Range {
        field: String,
        start: Value,
        end: Value,
    },
    /// 时间戳字段的年份等于 year
    Year { field: String, year: i32 },
    NotNull { field: String },
}

impl Condition {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn range(field: impl Into<String>, start: impl Into<Value>, end: impl Into<Value>) -> Self {
        Condition::Range {
            field: field.into(),
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn year(field: impl Into<String>, year: i32) -> Self {
        Condition::Year {
            field: field.into(),
            year,
        }
    }

    pub fn not_null(field: impl Into<String>) -> Self {
        Condition::NotNull {
            field: field.into(),
        }
    }

    /// Null 字段不满足任何条件
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Condition::Equals { field, value } => {
                let actual = record.get(field);
                !actual.is_null() && actual == value
            }
            Condition::Range { field, start, end } => {
                let actual = record.get(field);
                !actual.is_null() && actual >= start && actual < end
            }
            Condition::Year { field, year } => record
                .get(field)
                .as_timestamp()
                .map(|ts| ts.year() == *year)
                .unwrap_or(false),
            Condition::NotNull { field } => !record.get(field).is_null(),
        }
    }
}

/// 条件的合取
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    conditions: Vec<Condition>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|condition| condition.matches(record))
    }
}
