//! 测试数据生成模块
//!
//! 提供各种测试数据的生成函数

use chrono::{DateTime, TimeZone, Utc};

use statdb::core::Record;
use statdb::storage::MemoryExecutor;

pub const PRODUCTS: &str = "products";
pub const SALES: &str = "sales";

pub fn ts(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// 创建商品记录
pub fn product(name: &str, category: &str, price: i64) -> Record {
    Record::new()
        .with("name", name)
        .with("category", category)
        .with("price", price)
}

/// 价格为 10, 20, 30, 40, 50 的五个商品
pub fn price_catalog() -> MemoryExecutor {
    let executor = MemoryExecutor::new();
    executor.insert_many(
        PRODUCTS,
        vec![
            product("pen", "office", 10),
            product("mug", "kitchen", 20),
            product("lamp", "office", 30),
            product("pan", "kitchen", 40),
            product("desk", "office", 50),
        ],
    );
    executor
}

/// 创建销售记录
pub fn sale(at: DateTime<Utc>, region: &str, amount: f64) -> Record {
    Record::new()
        .with("sold_at", at)
        .with("region", region)
        .with("amount", amount)
}

/// 带时间戳的销售数据，参考时刻为 2024-03-15
///
/// 每月合计：2023-03 = 80，2024-01 = 100，2024-02 = 12000，2024-03 = 15000
pub fn sales_history() -> MemoryExecutor {
    let executor = MemoryExecutor::new();
    executor.insert_many(
        SALES,
        vec![
            sale(ts(2023, 3, 10, 9), "eu", 80.0),
            sale(ts(2024, 1, 5, 9), "eu", 60.0),
            sale(ts(2024, 1, 20, 9), "us", 40.0),
            sale(ts(2024, 2, 3, 9), "eu", 5000.0),
            sale(ts(2024, 2, 18, 9), "us", 7000.0),
            sale(ts(2024, 3, 1, 0), "eu", 9000.0),
            sale(ts(2024, 3, 14, 23), "us", 6000.0),
        ],
    );
    executor
}
