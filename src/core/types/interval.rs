//! 时间粒度与截断规则

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::time::CalendarUtils;
use crate::core::error::AggregateError;

/// 时间粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeInterval {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeInterval {
    pub fn name(&self) -> &'static str {
        match self {
            TimeInterval::Minute => "minute",
            TimeInterval::Hour => "hour",
            TimeInterval::Day => "day",
            TimeInterval::Week => "week",
            TimeInterval::Month => "month",
            TimeInterval::Quarter => "quarter",
            TimeInterval::Year => "year",
        }
    }

    /// 截断格式，`%q` 表示季度编号
    pub fn truncation_format(&self) -> &'static str {
        match self {
            TimeInterval::Minute => "%Y-%m-%d %H:%M",
            TimeInterval::Hour => "%Y-%m-%d %H:00",
            TimeInterval::Day => "%Y-%m-%d",
            TimeInterval::Week => "%G-W%V",
            TimeInterval::Month => "%Y-%m",
            TimeInterval::Quarter => "%Y-Q%q",
            TimeInterval::Year => "%Y",
        }
    }

    /// 截断到所在周期的起点
    pub fn truncate(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeInterval::Minute => CalendarUtils::start_of_minute(ts),
            TimeInterval::Hour => CalendarUtils::start_of_hour(ts),
            TimeInterval::Day => CalendarUtils::start_of_day(ts),
            TimeInterval::Week => CalendarUtils::start_of_week(ts),
            TimeInterval::Month => CalendarUtils::start_of_month(ts),
            TimeInterval::Quarter => CalendarUtils::start_of_quarter(ts),
            TimeInterval::Year => CalendarUtils::start_of_year(ts),
        }
    }

    /// 平移 `units` 个周期，负数向过去平移
    pub fn shift(&self, ts: DateTime<Utc>, units: i64) -> DateTime<Utc> {
        match self {
            TimeInterval::Minute => CalendarUtils::shift(ts, Duration::minutes(units)),
            TimeInterval::Hour => CalendarUtils::shift(ts, Duration::hours(units)),
            TimeInterval::Day => CalendarUtils::shift(ts, Duration::days(units)),
            TimeInterval::Week => CalendarUtils::shift(ts, Duration::weeks(units)),
            TimeInterval::Month => CalendarUtils::shift_months(ts, units),
            TimeInterval::Quarter => CalendarUtils::shift_months(ts, units.saturating_mul(3)),
            TimeInterval::Year => CalendarUtils::shift_months(ts, units.saturating_mul(12)),
        }
    }

    /// 周期标签；同一周期内的所有时间点得到相同标签，且标签字典序即时间顺序
    pub fn label(&self, ts: DateTime<Utc>) -> String {
        match self {
            TimeInterval::Quarter => {
                format!("{}-Q{}", ts.format("%Y"), CalendarUtils::quarter_of(ts))
            }
            other => ts.format(other.truncation_format()).to_string(),
        }
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimeInterval {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minute" => Ok(TimeInterval::Minute),
            "hour" => Ok(TimeInterval::Hour),
            "day" => Ok(TimeInterval::Day),
            "week" => Ok(TimeInterval::Week),
            "month" => Ok(TimeInterval::Month),
            "quarter" => Ok(TimeInterval::Quarter),
            "year" => Ok(TimeInterval::Year),
            _ => Err(AggregateError::invalid_argument(format!(
                "unknown time interval: {s}"
            ))),
        }
    }
}
