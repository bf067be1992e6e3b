//! The filters behind the default `diff`, `patch` and `reverse` pipes.
//!
//! Each submodule covers one kind of value and exposes one function per
//! pipeline it takes part in, so a custom pipe can be assembled from the
//! same pieces.

pub mod arrays;
pub mod dates;
pub mod nested;
pub mod texts;
pub mod trivial;

use serde_json::Value;

/// Identity comparison: the same value, or two equal primitives.
///
/// Objects and arrays are only strictly equal to themselves. Numbers compare
/// by value, so `1` and `1.0` are equal.
pub(crate) fn strict_eq(left: &Value, right: &Value) -> bool {
    if std::ptr::eq(left, right) {
        return true;
    }
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => {
            a == b || matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
        }
        _ => false,
    }
}
