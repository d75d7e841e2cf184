//! Value 模块 - 记录字段的标量值类型系统
//!
//! 此模块提供了聚合引擎使用的标量值类型，包括：
//! - 核心类型定义 (`types.rs`)
//! - 比较逻辑 (`comparison.rs`)
//! - 类型转换 (`conversion.rs`)

pub mod comparison;
pub mod conversion;
pub mod types;

pub use types::*;
