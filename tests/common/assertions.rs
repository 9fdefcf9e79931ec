//! Domain-specific assertion macros for fleetnorm harnesses.
//!
//! These add context-rich failure messages that make it clear which
//! normalization guarantee was violated and where in the payload.

/// Assert that no object key anywhere in a value is snake_case.
///
/// ```rust
/// assert_no_snake_keys!(normalized);
/// ```
#[macro_export]
macro_rules! assert_no_snake_keys {
    ($value:expr) => {{
        fn walk(value: &serde_json::Value, pointer: &str) {
            match value {
                serde_json::Value::Object(map) => {
                    for (key, child) in map {
                        if fleetnorm_core::keys::is_snake_case(key) {
                            panic!(
                                "assert_no_snake_keys! failed: key {:?} at {:?} is still snake_case",
                                key, pointer
                            );
                        }
                        walk(child, &format!("{pointer}/{key}"));
                    }
                }
                serde_json::Value::Array(items) => {
                    for (i, child) in items.iter().enumerate() {
                        walk(child, &format!("{pointer}/{i}"));
                    }
                }
                _ => {}
            }
        }
        walk(&$value, "");
    }};
}

/// Assert that a JSON pointer resolves to nothing in a serialized value.
///
/// ```rust
/// assert_absent!(serde_json::to_value(&identity).unwrap(), "/secureToken");
/// ```
#[macro_export]
macro_rules! assert_absent {
    ($value:expr, $pointer:expr) => {{
        let value: &serde_json::Value = &$value;
        let pointer: &str = $pointer;
        if let Some(found) = value.pointer(pointer) {
            panic!(
                "assert_absent! failed: {:?} is present with value {}",
                pointer, found
            );
        }
    }};
}

/// Assert that a JSON pointer resolves to the expected value.
///
/// ```rust
/// assert_at!(normalized, "/mdmEnrollment/enrolled", true);
/// ```
#[macro_export]
macro_rules! assert_at {
    ($value:expr, $pointer:expr, $expected:tt) => {{
        let value: &serde_json::Value = &$value;
        let pointer: &str = $pointer;
        let expected = serde_json::json!($expected);
        match value.pointer(pointer) {
            Some(actual) if *actual == expected => {}
            Some(actual) => panic!(
                "assert_at! failed at {:?}\n  expected: {}\n  actual:   {}",
                pointer, expected, actual
            ),
            None => panic!("assert_at! failed: nothing at {:?}", pointer),
        }
    }};
}

/// Assert the rendered text and active flag of a `TemporalValue`.
///
/// ```rust
/// assert_temporal!(summary.last_check_in, "Mar 1, 2024 09:30", active = false);
/// ```
#[macro_export]
macro_rules! assert_temporal {
    ($temporal:expr, $text:expr, active = $active:expr) => {{
        let temporal: &fleetnorm_core::TemporalValue = &$temporal;
        let text: &str = $text;
        let active: bool = $active;
        if temporal.text != text || temporal.is_active != active {
            panic!(
                "assert_temporal! failed:\n  expected: {:?} (active={})\n  actual:   {:?} (active={})",
                text, active, temporal.text, temporal.is_active
            );
        }
    }};
}
