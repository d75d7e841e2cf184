// 工具模块 - 仅用于导出各个子模块，不包含具体实现

// 日志模块
pub mod logging;

// 数值辅助函数模块
pub mod math;
pub use math::{finite_or_zero, percentage, round_to, safe_div};
