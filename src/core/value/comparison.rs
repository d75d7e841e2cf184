use super::types::Value;
use std::cmp::Ordering as CmpOrdering;

// 手动实现PartialEq以正确处理f64比较
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => (a == b) || (a.is_nan() && b.is_nan()),
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                Self::cmp_int_f64(*a, *b) == CmpOrdering::Equal
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

// 手动实现Eq，因为f64没有实现Eq
impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

/// 全序：Null < Bool < 数值 < String < Timestamp
///
/// Int 与 Float 按精确数值比较，`Int(1)` 与 `Float(1.0)` 相等，
/// 因此分组和透视表中它们落入同一个键
impl Ord for Value {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        match (self, other) {
            (Value::Null, Value::Null) => CmpOrdering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => Self::cmp_f64(*a, *b),
            (Value::Int(a), Value::Float(b)) => Self::cmp_int_f64(*a, *b),
            (Value::Float(a), Value::Int(b)) => Self::cmp_int_f64(*b, *a).reverse(),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (a, b) => a.type_priority().cmp(&b.type_priority()),
        }
    }
}

impl Value {
    /// NaN 视为最大值，-0.0 与 0.0 相等
    pub(crate) fn cmp_f64(a: f64, b: f64) -> CmpOrdering {
        match a.partial_cmp(&b) {
            Some(ordering) => ordering,
            None => a.is_nan().cmp(&b.is_nan()),
        }
    }

    /// 不经过 `as f64` 转换，避免大整数精度丢失破坏传递性
    fn cmp_int_f64(a: i64, b: f64) -> CmpOrdering {
        // 2^63
        const BOUND: f64 = 9_223_372_036_854_775_808.0;
        if b.is_nan() || b >= BOUND {
            return CmpOrdering::Less;
        }
        if b < -BOUND {
            return CmpOrdering::Greater;
        }
        let whole = b.trunc();
        a.cmp(&(whole as i64)).then_with(|| Self::cmp_f64(0.0, b - whole))
    }

    fn type_priority(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::String(_) => 3,
            Value::Timestamp(_) => 4,
        }
    }
}
