//! Temporal parsing — turns the many timestamp shapes agents emit into a
//! display string plus an "ongoing session" flag.
//!
//! Classification order, first match wins:
//!
//! 1. all-digit text of at least ten characters is a Unix epoch (seconds, or
//!    milliseconds when the value exceeds `9_999_999_999`);
//! 2. a no-year short form such as `Jan 22 09:08` (optionally preceded by a
//!    weekday) is placed in the current calendar year;
//! 3. general formats: RFC 3339, RFC 2822, common `strftime` layouts, CIM
//!    datetimes and `/Date(ms)/` literals from Windows PowerShell.
//!
//! Text that matches nothing is returned verbatim. Parsing never fails.
//!
//! The `still` marker (as in `last` output, `Jan 22 09:08 still logged in`) is
//! a display heuristic: it says the agent saw the session open when it
//! sampled, not that it is open now.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

use crate::config::DisplayConfig;

pub const DEFAULT_FORMAT: &str = "%b %-d, %Y %H:%M";
pub const UNKNOWN: &str = "Unknown";

/// Largest value still read as epoch seconds.
const MAX_EPOCH_SECONDS: i64 = 9_999_999_999;

/// Timezone-aware layouts tried after RFC 3339 / RFC 2822.
const ZONED_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Naive layouts, read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
    "%a %b %e %H:%M:%S %Y",
    "%b %e %Y %H:%M:%S",
];

fn epoch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{10,}$").expect("valid epoch regex"))
}

fn short_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[A-Za-z]{3}\s+)?([A-Za-z]{3})\s+(\d{1,2})\s+(\d{1,2}):(\d{2})$")
            .expect("valid short date regex")
    })
}

fn still_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\s*still(?:\s+logged\s+in)?\s*").expect("valid still regex")
    })
}

fn dotnet_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^/Date\((-?\d+)(?:[+-]\d{4})?\)/$").expect("valid /Date()/ regex")
    })
}

fn cim_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{14})\.\d{6}[+-]\d{3}$").expect("valid CIM datetime regex")
    })
}

// ---------------------------------------------------------------------------
// TemporalValue
// ---------------------------------------------------------------------------

/// A rendered timestamp.
///
/// `text` is either the formatted instant or, when nothing parsed, the source
/// text with any `still` marker removed. `is_active` is set only when the
/// source carried that marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalValue {
    pub text: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instant: Option<DateTime<Utc>>,
}

impl TemporalValue {
    pub fn unknown(label: impl Into<String>) -> Self {
        Self {
            text: label.into(),
            is_active: false,
            instant: None,
        }
    }

    /// `true` when the source resolved to a calendar instant.
    pub fn is_parsed(&self) -> bool {
        self.instant.is_some()
    }
}

// ---------------------------------------------------------------------------
// TemporalParser
// ---------------------------------------------------------------------------

/// Configurable temporal parser. [`parse_temporal`] uses the defaults.
#[derive(Debug, Clone)]
pub struct TemporalParser {
    format: String,
    unknown_label: String,
    reference: Option<DateTime<Utc>>,
}

impl Default for TemporalParser {
    fn default() -> Self {
        Self::new(DEFAULT_FORMAT)
    }
}

impl TemporalParser {
    /// Build a parser rendering with `format`. An invalid `strftime` string
    /// falls back to [`DEFAULT_FORMAT`].
    pub fn new(format: impl Into<String>) -> Self {
        let format = format.into();
        let format = if is_valid_format(&format) {
            format
        } else {
            DEFAULT_FORMAT.to_string()
        };
        Self {
            format,
            unknown_label: UNKNOWN.to_string(),
            reference: None,
        }
    }

    pub fn from_config(display: &DisplayConfig) -> Self {
        Self::new(display.timestamp_format.clone()).with_unknown_label(&display.unknown_label)
    }

    /// Pin "now", which supplies the year for no-year short dates.
    pub fn with_reference(mut self, now: DateTime<Utc>) -> Self {
        self.reference = Some(now);
        self
    }

    pub fn with_unknown_label(mut self, label: impl Into<String>) -> Self {
        self.unknown_label = label.into();
        self
    }

    pub fn parse(&self, raw: Option<&Value>, allow_active_suffix: bool) -> TemporalValue {
        let Some(text) = raw.and_then(stringify) else {
            return TemporalValue::unknown(&self.unknown_label);
        };

        let mut is_active = false;
        let mut text = text.trim().to_string();
        if allow_active_suffix && text.to_ascii_lowercase().contains("still") {
            is_active = true;
            text = still_re().replace(&text, " ").trim().to_string();
        }

        match self.resolve(&text) {
            Some(instant) => TemporalValue {
                text: instant.format(&self.format).to_string(),
                is_active,
                instant: Some(instant),
            },
            None => TemporalValue {
                text,
                is_active,
                instant: None,
            },
        }
    }

    /// Resolve text to an instant without rendering it.
    pub fn resolve(&self, text: &str) -> Option<DateTime<Utc>> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if epoch_re().is_match(text) {
            return parse_epoch(text);
        }
        if let Some(instant) = self.parse_short_form(text) {
            return Some(instant);
        }
        parse_general(text)
    }

    fn parse_short_form(&self, text: &str) -> Option<DateTime<Utc>> {
        let caps = short_date_re().captures(text)?;
        let year = self.reference.unwrap_or_else(Utc::now).format("%Y").to_string();
        let candidate = format!("{year} {} {} {}:{}", &caps[1], &caps[2], &caps[3], &caps[4]);
        NaiveDateTime::parse_from_str(&candidate, "%Y %b %d %H:%M")
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    }
}

/// Parse with the default parser.
pub fn parse_temporal(raw: Option<&Value>, allow_active_suffix: bool) -> TemporalValue {
    TemporalParser::default().parse(raw, allow_active_suffix)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn stringify(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            (None, None, Some(f)) => (f.trunc() as i64).to_string(),
            _ => n.to_string(),
        },
        other => other.to_string(),
    };
    (!text.trim().is_empty()).then_some(text)
}

fn parse_epoch(digits: &str) -> Option<DateTime<Utc>> {
    let value: i64 = digits.parse().ok()?;
    if value > MAX_EPOCH_SECONDS {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}

fn parse_general(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Some(caps) = dotnet_date_re().captures(text) {
        return caps[1].parse().ok().and_then(DateTime::from_timestamp_millis);
    }
    if let Some(caps) = cim_date_re().captures(text) {
        return NaiveDateTime::parse_from_str(&caps[1], "%Y%m%d%H%M%S")
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn is_valid_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
