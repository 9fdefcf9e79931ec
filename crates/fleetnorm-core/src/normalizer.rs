//! Normalizer — turns a raw agent payload into a canonical one.
//!
//! The stages run in a fixed order: embedded-object decoding → key
//! normalization → boolean-literal coercion. Each stage is idempotent and so
//! is the composition, so feeding an already normalized payload back in is a
//! no-op.
//!
//! Only the string literals `true` / `false` (any case) are rewritten into
//! native booleans here. `"1"`/`"0"` and numeric-looking strings are left
//! alone because serials, build numbers and zero-padded identifiers share that
//! shape; extractors coerce those at read time.

use serde_json::Value;

use crate::config::NormalizeConfig;
use crate::decoder::{Diagnostic, EmbeddedDecoder};
use crate::keys::KeyNormalizer;

/// Normalize with the default configuration.
pub fn normalize_payload(raw: &Value) -> Value {
    Normalizer::default().normalize(raw)
}

#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    decoder: EmbeddedDecoder,
    keys: KeyNormalizer,
    decode_embedded: bool,
    max_depth: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&NormalizeConfig::default())
    }
}

impl Normalizer {
    pub fn from_config(config: &NormalizeConfig) -> Self {
        Self {
            decoder: EmbeddedDecoder::new(config.max_depth),
            keys: KeyNormalizer::new(config.max_depth),
            decode_embedded: config.decode_embedded,
            max_depth: config.max_depth,
        }
    }

    pub fn normalize(&self, raw: &Value) -> Value {
        self.normalize_with(raw, &mut |_| {})
    }

    /// Normalize, reporting every embedded string that failed to decode.
    pub fn normalize_with(&self, raw: &Value, sink: &mut dyn FnMut(Diagnostic)) -> Value {
        let decoded = if self.decode_embedded {
            self.decoder.convert(raw, sink)
        } else {
            raw.clone()
        };
        let keyed = self.keys.normalize(&decoded);
        coerce_boolean_literals(&keyed, 0, self.max_depth)
    }
}

fn coerce_boolean_literals(value: &Value, depth: usize, max_depth: usize) -> Value {
    if depth > max_depth {
        return value.clone();
    }
    match value {
        Value::String(s) => match s.trim() {
            t if t.eq_ignore_ascii_case("true") => Value::Bool(true),
            t if t.eq_ignore_ascii_case("false") => Value::Bool(false),
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| coerce_boolean_literals(item, depth + 1, max_depth))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), coerce_boolean_literals(v, depth + 1, max_depth)))
                .collect(),
        ),
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
