// Scalar coercion rules
//
// int:   JSON integers, decimal integer strings, floats with zero fraction
// float: JSON numbers, numeric strings
// str:   strings, plus the string form of numbers and bools

use serde_json::{Number, Value};

use super::FieldType;

/// Coerce a raw value to the declared type, `None` when not convertible
pub fn coerce(ty: FieldType, raw: &Value) -> Option<Value> {
    match ty {
        FieldType::Int => coerce_int(raw).map(Value::from),
        FieldType::Float => coerce_float(raw)
            .and_then(Number::from_f64)
            .map(Value::Number),
        FieldType::Str => coerce_str(raw).map(Value::String),
    }
}

// 2^63, the first float above the i64 range
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

#[allow(clippy::cast_possible_truncation)]
fn coerce_int(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(f))
            .map(|f| f as i64),
        // Integers above i64::MAX are rejected, never clamped
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_float(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn coerce_str(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
