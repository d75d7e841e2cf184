//! 配置与日志集成测试
//!
//! 测试范围:
//! - 配置默认值
//! - TOML 序列化和反序列化
//! - 配置驱动的引擎行为

mod common;

use common::assertions::{assert_ok, assert_err_with};
use common::data_fixtures::{price_catalog, PRODUCTS};
use common::TestEngine;

use statdb::config::{Config, EngineConfig};

/// 测试配置默认值
#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert_eq!(config.engine.max_materialized_rows, 1_000_000);
    assert_eq!(config.engine.query_timeout_ms, None);
    assert_eq!(
        config.engine.summary_percentiles,
        vec![25.0, 50.0, 75.0, 90.0, 95.0, 99.0]
    );
    assert_eq!(config.engine.percentage_precision, 2);
    assert_eq!(config.log.level, "info");
    assert_eq!(config.log.dir, "logs");
    assert_eq!(config.log.file, "statdb");
    assert_eq!(config.log.max_file_size, 100 * 1024 * 1024); // 100MB
    assert_eq!(config.log.max_files, 5);
}

/// 测试配置序列化和反序列化
#[test]
fn test_config_serialization() {
    let mut config = Config::default();
    config.engine.max_materialized_rows = 10_000;
    config.engine.summary_percentiles = vec![50.0, 99.9];
    config.log.level = "debug".to_string();

    // 序列化为 TOML
    let toml_str = toml::to_string_pretty(&config).expect("序列化配置失败");
    assert!(toml_str.contains("[engine]"));
    assert!(toml_str.contains("max_materialized_rows = 10000"));
    assert!(toml_str.contains("level = \"debug\""));

    // 反序列化
    let loaded: Config = toml::from_str(&toml_str).expect("反序列化配置失败");
    assert_eq!(loaded, config);
}

/// 测试加载不存在的配置文件
#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    assert_err_with(Config::load(dir.path().join("missing.toml")), "IO错误");
}

/// 测试配置决定的摘要百分位和精度
#[test]
fn test_engine_uses_configured_percentiles_and_precision() {
    let t = TestEngine::new(price_catalog(), PRODUCTS);
    let engine = t.engine.with_config(EngineConfig {
        summary_percentiles: vec![10.0, 50.0],
        percentage_precision: 0,
        ..EngineConfig::default()
    });

    let summary = assert_ok(engine.statistical_summary("price"));
    assert_eq!(summary.percentiles.len(), 2);
    assert_eq!(summary.percentiles.get("p10"), Some(14.0));

    let bins = assert_ok(engine.histogram("price", 3));
    let percentages: Vec<f64> = bins.iter().map(|b| b.percentage).collect();
    assert_eq!(percentages, vec![40.0, 20.0, 40.0]);
}
