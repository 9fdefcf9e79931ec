//! Key normalization — rewrites osquery-style `snake_case` map keys to the
//! `camelCase` the Windows agent already uses.
//!
//! Only keys made of lowercase/digit segments joined by single underscores are
//! rewritten (`os_version` → `osVersion`, `ipv4_address` → `ipv4Address`).
//! Everything else, including `SCREAMING_CASE`, leading-underscore keys and
//! keys that are already camelCase, passes through untouched, which is what
//! makes [`normalize_keys`] idempotent.

use regex::Regex;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::OnceLock;

use crate::config::NormalizeConfig;

fn snake_case_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:_[a-z0-9]+)+$").expect("valid snake_case regex"))
}

/// `true` for keys this module rewrites.
pub fn is_snake_case(key: &str) -> bool {
    snake_case_re().is_match(key)
}

/// `camelCase` form of a snake_case key; other keys are borrowed unchanged.
pub fn to_camel_case(key: &str) -> Cow<'_, str> {
    if !is_snake_case(key) {
        return Cow::Borrowed(key);
    }
    let mut out = String::with_capacity(key.len());
    for (i, segment) in key.split('_').enumerate() {
        if i == 0 {
            out.push_str(segment);
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }
    Cow::Owned(out)
}

/// Normalize keys with the default depth bound.
pub fn normalize_keys(value: &Value) -> Value {
    KeyNormalizer::default().normalize(value)
}

/// Depth-bounded key normalizer.
#[derive(Debug, Clone, Copy)]
pub struct KeyNormalizer {
    max_depth: usize,
}

impl Default for KeyNormalizer {
    fn default() -> Self {
        Self::new(NormalizeConfig::default().max_depth)
    }
}

impl KeyNormalizer {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn normalize(&self, value: &Value) -> Value {
        self.walk(value, 0)
    }

    fn walk(&self, value: &Value, depth: usize) -> Value {
        if depth > self.max_depth {
            return value.clone();
        }
        match value {
            Value::Object(map) => Value::Object(self.normalize_map(map, depth)),
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.walk(item, depth + 1)).collect())
            }
            other => other.clone(),
        }
    }

    /// Keys that were already canonical are inserted first so they win over a
    /// rewritten duplicate (`serialNumber` beats `serial_number`).
    fn normalize_map(&self, map: &Map<String, Value>, depth: usize) -> Map<String, Value> {
        let mut out = Map::new();
        let mut rewritten = Vec::new();
        for (key, item) in map {
            match to_camel_case(key) {
                Cow::Borrowed(_) => {
                    out.insert(key.clone(), self.walk(item, depth + 1));
                }
                Cow::Owned(camel) => rewritten.push((camel, item)),
            }
        }
        for (camel, item) in rewritten {
            if !out.contains_key(&camel) {
                out.insert(camel, self.walk(item, depth + 1));
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
