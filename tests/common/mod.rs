//! 集成测试共享工具模块
//!
//! 提供测试基础设施和辅助函数，供所有集成测试使用

#![allow(dead_code)]

pub mod assertions;
pub mod data_fixtures;
pub mod storage_helpers;

use std::sync::Arc;

use statdb::common::FixedClock;
use statdb::storage::MemoryExecutor;
use statdb::AggregationEngine;

/// 测试引擎包装器
///
/// 持有执行器的共享引用，方便在测试中检查往返次数
pub struct TestEngine {
    pub executor: Arc<MemoryExecutor>,
    pub engine: AggregationEngine<MemoryExecutor>,
}

impl TestEngine {
    pub fn new(executor: MemoryExecutor, collection: &str) -> Self {
        let executor = Arc::new(executor);
        let engine = AggregationEngine::new(executor.clone(), collection);
        Self { executor, engine }
    }

    /// 固定参考时刻
    pub fn at(mut self, clock: FixedClock) -> Self {
        self.engine = self.engine.with_clock(clock);
        self
    }
}
