//! Candidate field paths — ordered fallbacks for attributes whose location
//! drifts between agents and agent versions.
//!
//! A path is dotted (`hardware.storage.0.capacity`); numeric segments index
//! arrays. Lookups treat JSON null and blank strings as absent, so the first
//! candidate holding real data wins.

use serde_json::Value;

use crate::coercion::{coerce_boolean, coerce_number, coerce_string, is_blank};

/// Follow a dotted path.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// First candidate that is present and not blank.
pub fn first_present<'a>(value: &'a Value, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|path| lookup(value, path))
        .find(|found| !is_blank(found))
}

/// First candidate rendered as non-empty text.
pub fn first_string(value: &Value, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|path| lookup(value, path))
        .find_map(coerce_string)
}

/// First present candidate, coerced to a boolean.
pub fn first_bool(value: &Value, candidates: &[&str]) -> Option<bool> {
    first_present(value, candidates).map(coerce_boolean)
}

/// First present candidate, coerced to a number.
pub fn first_number(value: &Value, candidates: &[&str]) -> Option<f64> {
    first_present(value, candidates).map(coerce_number)
}

/// First candidate that holds an array. A lone object is treated as a
/// one-element array, which is how PowerShell serializes single results.
pub fn first_array<'a>(value: &'a Value, candidates: &[&str]) -> Option<Vec<&'a Value>> {
    candidates
        .iter()
        .filter_map(|path| lookup(value, path))
        .find_map(|found| match found {
            Value::Array(items) => Some(items.iter().collect()),
            Value::Object(_) => Some(vec![found]),
            _ => None,
        })
}

/// `true` when any candidate is present.
pub fn any_present(value: &Value, candidates: &[&str]) -> bool {
    first_present(value, candidates).is_some()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "hardware": {
                "storage": [{"capacity": 500}, {"capacity": "250"}],
                "model": "",
                "vendor": null,
                "manufacturer": "Dell Inc."
            },
            "network": {"adapter": {"name": "Ethernet"}},
            "flags": {"enabled": "yes"}
        })
    }

    #[test]
    fn lookup_walks_maps_and_arrays() {
        let p = payload();
        assert_eq!(lookup(&p, "hardware.storage.1.capacity"), Some(&json!("250")));
        assert_eq!(lookup(&p, "hardware.storage.9.capacity"), None);
        assert_eq!(lookup(&p, "hardware.storage.x"), None);
        assert_eq!(lookup(&p, ""), Some(&p));
    }

    #[test]
    fn blank_candidates_are_skipped() {
        let p = payload();
        assert_eq!(
            first_string(&p, &["hardware.model", "hardware.vendor", "hardware.manufacturer"]),
            Some("Dell Inc.".to_string())
        );
        assert_eq!(first_present(&p, &["hardware.model", "hardware.vendor"]), None);
    }

    #[test]
    fn typed_helpers() {
        let p = payload();
        assert_eq!(first_bool(&p, &["flags.missing", "flags.enabled"]), Some(true));
        assert_eq!(first_bool(&p, &["flags.missing"]), None);
        assert_eq!(first_number(&p, &["hardware.storage.1.capacity"]), Some(250.0));
    }

    #[test]
    fn first_array_wraps_single_object() {
        let p = payload();
        assert_eq!(first_array(&p, &["hardware.storage"]).map(|a| a.len()), Some(2));
        assert_eq!(first_array(&p, &["network.adapter"]).map(|a| a.len()), Some(1));
        assert!(first_array(&p, &["hardware.manufacturer"]).is_none());
    }
}
