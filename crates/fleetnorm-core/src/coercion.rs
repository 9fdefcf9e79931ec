//! Scalar coercion — total, non-panicking conversions between the textual and
//! native scalar shapes that agents disagree on.
//!
//! macOS agents report `"true"`, `"1"` or `"0"` where Windows agents send a
//! native JSON boolean; numbers show up both as JSON numbers and as strings.
//! Every function here returns a safe default instead of failing. Callers that
//! need to tell "absent" from "false"/"zero" check presence *before* coercing.

use phf::phf_set;
use serde_json::Value;

/// Lowercased string tokens that coerce to `true`.
static TRUTHY: phf::Set<&'static str> = phf_set! {
    "true",
    "1",
    "yes",
};

/// Coerce a value to a boolean.
///
/// Native booleans pass through. Strings are trimmed and compared
/// case-insensitively against `true`, `1` and `yes`. Native numbers are judged
/// by their decimal rendering, so `1` is `true` and `2` is `false`. Everything
/// else is `false`.
pub fn coerce_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => is_truthy(s),
        Value::Number(n) => is_truthy(&n.to_string()),
        _ => false,
    }
}

/// `true` when `s` is one of the truthy tokens.
pub fn is_truthy(s: &str) -> bool {
    TRUTHY.contains(s.trim().to_ascii_lowercase().as_str())
}

/// Coerce a value to a finite `f64`, defaulting to `0.0`.
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Non-empty, trimmed textual form of a scalar. Maps, arrays, null and blank
/// strings yield `None`.
pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Flatten a value into a list of strings.
///
/// Arrays keep their scalar elements, a comma-separated string is split, and a
/// single scalar becomes a one-element list. Blank entries are dropped.
pub fn coerce_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(coerce_string).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
        other => coerce_string(other).into_iter().collect(),
    }
}

/// `true` for JSON null and for strings that are empty after trimming.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
