//! Embedded object decoder — expands strings that carry a serialized object.
//!
//! Windows agents frequently ship composite fields as text: either JSON inside
//! a JSON string, or the PowerShell custom-object rendering
//! `@{Name=foo; Enabled=True; Volumes=@(@{Letter=C}, @{Letter=D})}`. This
//! module turns both into native [`Value`] trees so the rest of the pipeline
//! never has to know which agent produced a field.
//!
//! A string is only considered when its trimmed text starts with `@{`, `@(`,
//! `{` or `[`. Anything that fails to parse is left exactly as it was; the
//! failure is reported to an optional [`Diagnostic`] sink and never to the
//! caller's return value.

use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::config::NormalizeConfig;

/// Errors raised while decoding a single embedded string. These never escape
/// [`convert_embedded_objects`]; they surface only through
/// [`try_decode_embedded`] and the diagnostic sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input at offset {0}")]
    UnexpectedEnd(usize),

    #[error("expected `{expected}` at offset {offset}")]
    Expected { expected: &'static str, offset: usize },

    #[error("entry `{0}` has no `=` separator")]
    MissingSeparator(String),

    #[error("empty key at offset {0}")]
    EmptyKey(usize),

    #[error("unbalanced `{delimiter}` opened at offset {offset}")]
    Unbalanced { delimiter: char, offset: usize },

    #[error("unexpected trailing input at offset {0}")]
    TrailingInput(usize),

    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),

    #[error("invalid JSON: {0}")]
    Json(String),
}

/// A string that looked structured but could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// JSON pointer to the field, e.g. `/security/bitlocker`.
    pub pointer: String,
    pub error: DecodeError,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pointer = if self.pointer.is_empty() { "/" } else { &self.pointer };
        write!(f, "{pointer}: {}", self.error)
    }
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// `true` when `s` starts with one of the structural cues this module decodes.
pub fn looks_embedded(s: &str) -> bool {
    let t = s.trim_start();
    t.starts_with("@{") || t.starts_with("@(") || t.starts_with('{') || t.starts_with('[')
}

/// Decode one string. `Ok(None)` means the string is not a structured
/// encoding and should be kept as text.
pub fn try_decode_embedded(s: &str) -> Result<Option<Value>, DecodeError> {
    EmbeddedDecoder::default().decode_str(s)
}

/// Decode every embedded object string anywhere in `value`.
pub fn convert_embedded_objects(value: &Value) -> Value {
    EmbeddedDecoder::default().convert(value, &mut |_| {})
}

/// Like [`convert_embedded_objects`], reporting each string that had to be
/// preserved because it failed to parse.
pub fn convert_embedded_objects_with(value: &Value, sink: &mut dyn FnMut(Diagnostic)) -> Value {
    EmbeddedDecoder::default().convert(value, sink)
}

// ---------------------------------------------------------------------------
// EmbeddedDecoder
// ---------------------------------------------------------------------------

/// Depth-bounded decoder. Subtrees deeper than `max_depth` are returned
/// untouched, as are custom-notation strings nested deeper than that.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedDecoder {
    max_depth: usize,
}

impl Default for EmbeddedDecoder {
    fn default() -> Self {
        Self::new(NormalizeConfig::default().max_depth)
    }
}

impl EmbeddedDecoder {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn convert(&self, value: &Value, sink: &mut dyn FnMut(Diagnostic)) -> Value {
        let mut pointer = String::new();
        self.walk(value, 0, &mut pointer, sink)
    }

    pub fn decode_str(&self, s: &str) -> Result<Option<Value>, DecodeError> {
        let text = s.trim();
        if text.starts_with("@{") || text.starts_with("@(") {
            CustomObjectParser::new(text, self.max_depth).parse_document().map(Some)
        } else if text.starts_with('{') || text.starts_with('[') {
            serde_json::from_str(text)
                .map(Some)
                .map_err(|e| DecodeError::Json(e.to_string()))
        } else {
            Ok(None)
        }
    }

    fn walk(
        &self,
        value: &Value,
        depth: usize,
        pointer: &mut String,
        sink: &mut dyn FnMut(Diagnostic),
    ) -> Value {
        if depth > self.max_depth {
            return value.clone();
        }
        match value {
            Value::String(s) if looks_embedded(s) => match self.decode_str(s) {
                // The decoded tree takes the string's place, so it is walked
                // at the same depth.
                Ok(Some(decoded)) => self.walk(&decoded, depth, pointer, sink),
                Ok(None) => value.clone(),
                Err(error) => {
                    sink(Diagnostic {
                        pointer: pointer.clone(),
                        error,
                    });
                    value.clone()
                }
            },
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let len = pointer.len();
                        pointer.push('/');
                        pointer.push_str(&i.to_string());
                        let out = self.walk(item, depth + 1, &mut *pointer, &mut *sink);
                        pointer.truncate(len);
                        out
                    })
                    .collect(),
            ),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, item)| {
                        let len = pointer.len();
                        pointer.push('/');
                        pointer.push_str(&key.replace('~', "~0").replace('/', "~1"));
                        let out = self.walk(item, depth + 1, &mut *pointer, &mut *sink);
                        pointer.truncate(len);
                        (key.clone(), out)
                    })
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Custom-object notation parser
// ---------------------------------------------------------------------------

/// Recursive-descent parser for PowerShell's `@{...}` / `@(...)` rendering.
///
/// ```text
/// document := composite (ws composite)*
/// object   := "@{" (entry (sep entry)*)? sep? "}"
/// array    := "@(" (value (asep value)*)? asep? ")"
/// entry    := key "=" value
/// sep      := ";" | newline          asep := "," | sep
/// ```
struct CustomObjectParser {
    chars: Vec<char>,
    pos: usize,
    max_depth: usize,
}

impl CustomObjectParser {
    fn new(input: &str, max_depth: usize) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            max_depth,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_pair(&self) -> (Option<char>, Option<char>) {
        (self.peek(), self.chars.get(self.pos + 1).copied())
    }

    fn at_composite(&self) -> bool {
        matches!(self.peek_pair(), (Some('@'), Some('{' | '(')))
    }

    fn skip_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&predicate) {
            self.pos += 1;
        }
    }

    fn skip_inline_ws(&mut self) {
        self.skip_while(|c| c == ' ' || c == '\t');
    }

    fn expect(&mut self, expected: &'static str) -> Result<(), DecodeError> {
        for want in expected.chars() {
            match self.peek() {
                Some(c) if c == want => self.pos += 1,
                Some(_) => {
                    return Err(DecodeError::Expected {
                        expected,
                        offset: self.pos,
                    })
                }
                None => return Err(DecodeError::UnexpectedEnd(self.pos)),
            }
        }
        Ok(())
    }

    fn parse_document(&mut self) -> Result<Value, DecodeError> {
        self.skip_while(char::is_whitespace);
        let first = self.parse_composite(0)?;
        self.skip_while(char::is_whitespace);
        if self.peek().is_none() {
            return Ok(first);
        }

        // `Format-List`-style output: several objects back to back.
        let mut items = vec![first];
        while self.at_composite() {
            items.push(self.parse_composite(0)?);
            self.skip_while(|c| c.is_whitespace() || c == ',' || c == ';');
        }
        match self.peek() {
            None => Ok(Value::Array(items)),
            Some(_) => Err(DecodeError::TrailingInput(self.pos)),
        }
    }

    fn parse_composite(&mut self, depth: usize) -> Result<Value, DecodeError> {
        if depth > self.max_depth {
            return Err(DecodeError::TooDeep(self.max_depth));
        }
        match self.peek_pair() {
            (Some('@'), Some('{')) => self.parse_object(depth),
            (Some('@'), Some('(')) => self.parse_array(depth),
            (None, _) => Err(DecodeError::UnexpectedEnd(self.pos)),
            _ => Err(DecodeError::Expected {
                expected: "@{",
                offset: self.pos,
            }),
        }
    }

    fn parse_object(&mut self, depth: usize) -> Result<Value, DecodeError> {
        self.expect("@{")?;
        let mut map = Map::new();
        loop {
            self.skip_while(|c| c.is_whitespace() || c == ';');
            match self.peek() {
                None => return Err(DecodeError::UnexpectedEnd(self.pos)),
                Some('}') => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                Some(_) => {}
            }

            let key_start = self.pos;
            let mut key = String::new();
            while let Some(c) = self.peek() {
                if matches!(c, '=' | '}' | ';' | '\n' | '\r') {
                    break;
                }
                key.push(c);
                self.pos += 1;
            }
            if self.peek() != Some('=') {
                return Err(DecodeError::MissingSeparator(key.trim().to_string()));
            }
            let key = key.trim().to_string();
            if key.is_empty() {
                return Err(DecodeError::EmptyKey(key_start));
            }
            self.pos += 1;

            let value = self.parse_value(depth, '}', &[';', '\n', '\r'])?;
            map.insert(key, value);
        }
    }

    fn parse_array(&mut self, depth: usize) -> Result<Value, DecodeError> {
        self.expect("@(")?;
        let mut items = Vec::new();
        loop {
            self.skip_while(|c| c.is_whitespace() || c == ',' || c == ';');
            match self.peek() {
                None => return Err(DecodeError::UnexpectedEnd(self.pos)),
                Some(')') => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                Some(_) => items.push(self.parse_value(depth, ')', &[',', ';', '\n', '\r'])?),
            }
        }
    }

    fn parse_value(
        &mut self,
        depth: usize,
        closer: char,
        separators: &[char],
    ) -> Result<Value, DecodeError> {
        self.skip_inline_ws();
        if self.at_composite() {
            let value = self.parse_composite(depth + 1)?;
            self.skip_inline_ws();
            return Ok(value);
        }

        let mut text = String::new();
        let mut open: Vec<(char, usize)> = Vec::new();
        while let Some(c) = self.peek() {
            if open.is_empty() && (c == closer || separators.contains(&c)) {
                break;
            }
            match c {
                '{' | '(' | '[' => open.push((c, self.pos)),
                '}' | ')' | ']' => {
                    if open.last().is_some_and(|&(o, _)| closing_for(o) == c) {
                        open.pop();
                    }
                }
                _ => {}
            }
            text.push(c);
            self.pos += 1;
        }
        if let Some(&(delimiter, offset)) = open.last() {
            return Err(DecodeError::Unbalanced { delimiter, offset });
        }
        Ok(scalar_value(&text))
    }
}

fn closing_for(open: char) -> char {
    match open {
        '{' => '}',
        '(' => ')',
        _ => ']',
    }
}

/// Type a bare scalar from the custom notation.
///
/// Integers without leading zeros become numbers; decimals stay text so
/// version strings such as `10.10` survive.
fn scalar_value(raw: &str) -> Value {
    let text = raw.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("$null") {
        return Value::Null;
    }
    if text.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if is_plain_integer(text) {
        if let Ok(n) = text.parse::<i64>() {
            return Value::Number(Number::from(n));
        }
    }
    Value::String(text.to_string())
}

fn is_plain_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
