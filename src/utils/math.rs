//! 数值辅助函数
//!
//! 所有除法都经过零分母保护，结果保证为有限值

/// 四舍五入到指定小数位
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// 分母为 0 时返回 0
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// 占比百分数，`total` 为 0 时返回 0
///
/// 不做舍入：分布中各项逐个舍入后合计会偏离 100
pub fn percentage(part: f64, total: f64) -> f64 {
    safe_div(part * 100.0, total)
}

/// 把非有限值（NaN、Inf）折叠为 0
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
