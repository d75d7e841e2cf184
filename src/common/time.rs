use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Timelike, Utc};
use std::fmt::Debug;

/// 周期计算使用的参考时刻来源
///
/// 引擎在请求入口调用一次 `now()`，同一请求内的所有周期计算共用该值
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// 基于 `Utc::now` 的系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定在某一时刻的时钟，用于测试和重放请求
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    /// 从年月日时分秒创建，非法日期返回 None
    pub fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(Self::new)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

/// UTC 时间戳上的日历运算
pub struct CalendarUtils;

impl CalendarUtils {
    pub fn start_of_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
        Self::from_date_hms(ts.date_naive(), ts.hour(), ts.minute())
    }

    pub fn start_of_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
        Self::from_date_hms(ts.date_naive(), ts.hour(), 0)
    }

    pub fn start_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
        Self::from_date_hms(ts.date_naive(), 0, 0)
    }

    /// 周从周一开始（ISO 8601）
    pub fn start_of_week(ts: DateTime<Utc>) -> DateTime<Utc> {
        let days_from_monday = ts.weekday().num_days_from_monday() as i64;
        Self::start_of_day(ts) - Duration::days(days_from_monday)
    }

    pub fn start_of_month(ts: DateTime<Utc>) -> DateTime<Utc> {
        Self::from_ymd(ts.year(), ts.month())
    }

    pub fn start_of_quarter(ts: DateTime<Utc>) -> DateTime<Utc> {
        let first_month = (Self::quarter_of(ts) - 1) * 3 + 1;
        Self::from_ymd(ts.year(), first_month)
    }

    pub fn start_of_year(ts: DateTime<Utc>) -> DateTime<Utc> {
        Self::from_ymd(ts.year(), 1)
    }

    /// 季度编号 1..=4
    pub fn quarter_of(ts: DateTime<Utc>) -> u32 {
        (ts.month() - 1) / 3 + 1
    }

    /// 按月平移，负数向过去平移；溢出时保持原值
    pub fn shift_months(ts: DateTime<Utc>, months: i64) -> DateTime<Utc> {
        let magnitude = Months::new(months.unsigned_abs().min(u32::MAX as u64) as u32);
        let shifted = if months >= 0 {
            ts.checked_add_months(magnitude)
        } else {
            ts.checked_sub_months(magnitude)
        };
        shifted.unwrap_or(ts)
    }

    /// 按 Duration 平移；溢出时保持原值
    pub fn shift(ts: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
        ts.checked_add_signed(delta).unwrap_or(ts)
    }

    fn from_ymd(year: i32, month: u32) -> DateTime<Utc> {
        let date = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
        Self::from_date_hms(date, 0, 0)
    }

    fn from_date_hms(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
        let naive = date
            .and_hms_opt(hour, minute, 0)
            .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN));
        Utc.from_utc_datetime(&naive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::at(2024, 3, 15, 10, 30, 0).unwrap();
        assert_eq!(clock.now(), ts(2024, 3, 15, 10, 30, 0));
        assert_eq!(clock.now(), clock.now());
        assert!(FixedClock::at(2024, 2, 30, 0, 0, 0).is_none());
    }

    #[test]
    fn test_start_of_units() {
        let t = ts(2024, 8, 15, 13, 47, 22);
        assert_eq!(CalendarUtils::start_of_minute(t), ts(2024, 8, 15, 13, 47, 0));
        assert_eq!(CalendarUtils::start_of_hour(t), ts(2024, 8, 15, 13, 0, 0));
        assert_eq!(CalendarUtils::start_of_day(t), ts(2024, 8, 15, 0, 0, 0));
        // 2024-08-15 是周四
        assert_eq!(CalendarUtils::start_of_week(t), ts(2024, 8, 12, 0, 0, 0));
        assert_eq!(CalendarUtils::start_of_month(t), ts(2024, 8, 1, 0, 0, 0));
        assert_eq!(CalendarUtils::start_of_quarter(t), ts(2024, 7, 1, 0, 0, 0));
        assert_eq!(CalendarUtils::start_of_year(t), ts(2024, 1, 1, 0, 0, 0));
        assert_eq!(CalendarUtils::quarter_of(t), 3);
    }

    #[test]
    fn test_shift_months_crosses_year() {
        let t = ts(2024, 1, 1, 0, 0, 0);
        assert_eq!(CalendarUtils::shift_months(t, -1), ts(2023, 12, 1, 0, 0, 0));
        assert_eq!(CalendarUtils::shift_months(t, 14), ts(2025, 3, 1, 0, 0, 0));
    }
}
