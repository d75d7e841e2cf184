//! 统计聚合
//!
//! 组件划分：
//! - `strategy`/`pushdown`：下推与物化两种执行策略
//! - `statistics`：中位数、众数、方差、百分位、相关系数等纯函数
//! - `histogram`、`pivot`、`sequential`、`ranking`：专用构建器
//! - `time_bucket`、`period`：周期边界、周期对比与缺口填充
//! - `engine`：对外的 `AggregationEngine`

pub mod engine;
pub mod histogram;
pub mod period;
pub mod pivot;
pub mod pushdown;
pub mod ranking;
pub mod scope;
pub mod sequential;
pub mod spec;
pub mod statistics;
pub mod strategy;
pub mod time_bucket;
pub mod types;

pub use engine::AggregationEngine;
pub use histogram::HistogramBuilder;
pub use period::{GapFiller, PeriodComparator};
pub use pivot::PivotBuilder;
pub use pushdown::PushdownAggregator;
pub use ranking::RankingEngine;
pub use scope::DataScope;
pub use sequential::{Accumulator, SequentialAggregator};
pub use spec::{AggregationEntry, AggregationSpec};
pub use strategy::{AggregationStrategy, MaterializeStrategy, PushdownStrategy, StrategyKind};
pub use time_bucket::{Period, TimeBucketer};
pub use types::{
    ComparisonResult, GrowthRateResult, HistogramBin, PercentileEntry, PercentileSet,
    PeriodValue, PivotTable, ShareItem, StatisticalSummary, Trend, TrendPoint,
};
