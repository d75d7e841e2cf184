use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::ConfigError;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub log: LogConfig,
}

/// 聚合引擎配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// 物化类操作（中位数、百分位、透视表等）允许拉取的最大行数
    pub max_materialized_rows: usize,
    /// 每次执行器调用的超时时间，None 表示不设超时
    pub query_timeout_ms: Option<u64>,
    /// statistical_summary 使用的百分位集合
    pub summary_percentiles: Vec<f64>,
    /// 百分比、增长率保留的小数位数
    pub percentage_precision: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_materialized_rows: 1_000_000,
            query_timeout_ms: None,
            summary_percentiles: vec![25.0, 50.0, 75.0, 90.0, 95.0, 99.0],
            percentage_precision: 2,
        }
    }
}

/// 日志配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub dir: String,
    pub file: String,
    pub max_file_size: u64,
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "logs".to_string(),
            file: "statdb".to_string(),
            max_file_size: 100 * 1024 * 1024, // 100MB
            max_files: 5,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
