//! Numeric coercion policy (spec.md §4.4, §8): any field declared integer accepts both
//! numeric and decimal-string upstream values. A decimal string is rounded to the
//! nearest integer; anything non-numeric becomes `NULL`.

use serde_json::Value;

/// Coerces an arbitrary upstream JSON value into `Option<i32>` per the policy table in
/// spec.md §8: `42 -> 42`, `"42" -> 42`, `"472.44" -> 472`, `null -> null`, `"abc" -> null`.
pub fn coerce_integer(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i as i32)
            } else {
                n.as_f64().map(|f| f.round() as i32)
            }
        }
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i32),
        _ => None,
    }
}

/// Same policy but for decimal-precision fields (price, area), returned as `f64` for
/// the caller to convert into `sea_orm::prelude::Decimal` at the repository boundary.
pub fn coerce_decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

pub fn coerce_bool(value: &Value, default: bool) -> bool {
    match value {
        Value::Bool(b) => *b,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_integer_matches_spec_table() {
        assert_eq!(coerce_integer(&json!(42)), Some(42));
        assert_eq!(coerce_integer(&json!("42")), Some(42));
        assert_eq!(coerce_integer(&json!("472.44")), Some(472));
        assert_eq!(coerce_integer(&json!(null)), None);
        assert_eq!(coerce_integer(&json!("abc")), None);
    }

    #[test]
    fn coerce_integer_rounds_float_values() {
        assert_eq!(coerce_integer(&json!(472.6)), Some(473));
        assert_eq!(coerce_integer(&json!(472.4)), Some(472));
    }

    #[test]
    fn coerce_decimal_parses_numeric_strings() {
        assert_eq!(coerce_decimal(&json!("472.44")), Some(472.44));
        assert_eq!(coerce_decimal(&json!(472.44)), Some(472.44));
        assert_eq!(coerce_decimal(&json!("abc")), None);
    }

    #[test]
    fn coerce_bool_reads_actual_booleans_and_falls_back_otherwise() {
        assert!(coerce_bool(&json!(true), false));
        assert!(!coerce_bool(&json!("true"), false));
        assert!(!coerce_bool(&json!(null), false));
        assert!(coerce_bool(&json!(null), true));
    }
}
