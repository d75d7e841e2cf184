//! 通用基础设施模块
//!
//! 时间处理：参考时钟与日历运算

pub mod time;

pub use time::{CalendarUtils, Clock, FixedClock, SystemClock};
