//! Host-compatible coercions over JSON values.
//!
//! Group and lookup keys are compared as strings, using the same coercion the
//! workflow host applies, so `1` and `"1"` collide.

use serde_json::{Number, Value};

/// String coercion of an optional value. Absent values become `"undefined"`.
pub fn stringify(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(v) => stringify_value(v),
    }
}

fn stringify_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => stringify_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                other => stringify_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Largest integer a host number represents exactly.
const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

fn stringify_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        if i.unsigned_abs() <= MAX_SAFE_INTEGER {
            return i.to_string();
        }
    } else if let Some(u) = n.as_u64() {
        if u <= MAX_SAFE_INTEGER {
            return u.to_string();
        }
    }

    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) => ryu_js::Buffer::new().format(f).to_string(),
        None => n.to_string(),
    }
}

/// Truthiness of an optional value. Absent, null, `false`, `0` and `""` are falsy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Type name of an optional value, as reported in type errors.
pub fn type_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "object",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) | Some(Value::Object(_)) => "object",
    }
}

/// Returns true if the value can be used as a lookup key.
pub fn is_key_like(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stringify_scalars() {
        assert_eq!(stringify(None), "undefined");
        assert_eq!(stringify(Some(&json!(null))), "null");
        assert_eq!(stringify(Some(&json!(true))), "true");
        assert_eq!(stringify(Some(&json!("abc"))), "abc");
        assert_eq!(stringify(Some(&json!(-7))), "-7");
    }

    #[test]
    fn test_stringify_numbers_match_strings() {
        assert_eq!(stringify(Some(&json!(1))), stringify(Some(&json!("1"))));
        assert_eq!(stringify(Some(&json!(1.0))), "1");
        assert_eq!(stringify(Some(&json!(1.5))), "1.5");
    }

    #[test]
    fn test_stringify_floats_use_host_formatting() {
        assert_eq!(stringify(Some(&json!(-0.0))), "0");
        assert_eq!(stringify(Some(&json!(1.2345678901234568e20))), "123456789012345680000");
        assert_eq!(stringify(Some(&json!(1e21))), "1e+21");
        assert_eq!(stringify(Some(&json!(1e-7))), "1e-7");
        assert_eq!(stringify(Some(&json!(0.1))), "0.1");
        assert_eq!(stringify(Some(&json!(12345678901234567890u64))), "12345678901234567000");
        assert_eq!(stringify(Some(&json!(9007199254740991u64))), "9007199254740991");
    }

    #[test]
    fn test_stringify_compound() {
        assert_eq!(stringify(Some(&json!([1, null, "a"]))), "1,,a");
        assert_eq!(stringify(Some(&json!({"a": 1}))), "[object Object]");
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(0.0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(is_truthy(Some(&json!("0"))));
        assert!(is_truthy(Some(&json!(2))));
        assert!(is_truthy(Some(&json!([]))));
        assert!(is_truthy(Some(&json!({}))));
    }

    #[test]
    fn test_type_name() {
        assert_eq!(type_name(Some(&json!(true))), "boolean");
        assert_eq!(type_name(Some(&json!([1]))), "object");
        assert_eq!(type_name(None), "undefined");
    }
}
