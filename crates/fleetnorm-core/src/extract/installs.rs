//! Managed installs — the software items a device-management agent
//! (Munki, Cimian, ...) is responsible for, with their errors and warnings.
//!
//! Messages live in two places. Agents that keep a device-level log expose
//! `installs.errors` / `installs.recentErrors` (or the `munki.` / `cimian.`
//! equivalents); others attach lists to each item. When a device-level list
//! is present it is authoritative and the per-item lists are ignored, which
//! keeps a message that appears in both from being counted twice.

use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;

use crate::coercion::coerce_string;
use crate::paths::{first_present, first_string, lookup};
use crate::platform::Platform;
use crate::temporal::{TemporalParser, TemporalValue};

const ITEMS: &[&str] = &[
    "installs.items",
    "installs.managedItems",
    "munki.items",
    "munki.managedInstalls",
    "cimian.items",
    "managedInstalls",
    "installs",
];
const LAST_RUN: &[&str] = &[
    "installs.lastRun",
    "installs.lastRunTime",
    "munki.lastRun",
    "munki.endTime",
    "cimian.lastRun",
    "cimian.lastSessionEnd",
    "lastRun",
];
const DEVICE_ERRORS: &[&str] = &[
    "installs.errors",
    "installs.recentErrors",
    "munki.errors",
    "cimian.errors",
];
const DEVICE_WARNINGS: &[&str] = &[
    "installs.warnings",
    "installs.recentWarnings",
    "munki.warnings",
    "cimian.warnings",
];
const MESSAGE_TEXT: &[&str] = &["message", "text", "error", "description", "msg"];

// ---------------------------------------------------------------------------
// MessageKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Errors,
    Warnings,
}

impl MessageKind {
    fn device_paths(self) -> &'static [&'static str] {
        match self {
            MessageKind::Errors => DEVICE_ERRORS,
            MessageKind::Warnings => DEVICE_WARNINGS,
        }
    }

    fn item_keys(self) -> &'static [&'static str] {
        match self {
            MessageKind::Errors => &["errors", "recentErrors", "lastError"],
            MessageKind::Warnings => &["warnings", "recentWarnings", "lastWarning"],
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Errors => write!(f, "errors"),
            MessageKind::Warnings => write!(f, "warnings"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown message kind `{0}` (expected `errors` or `warnings`)")]
pub struct ParseMessageKindError(String);

impl FromStr for MessageKind {
    type Err = ParseMessageKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "errors" | "error" => Ok(MessageKind::Errors),
            "warnings" | "warning" => Ok(MessageKind::Warnings),
            _ => Err(ParseMessageKindError(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Summary types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallsSummary {
    pub platform: Platform,
    pub items: Vec<InstallItem>,
    pub total_items: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub last_run: TemporalValue,
}

// ---------------------------------------------------------------------------
// Message access
// ---------------------------------------------------------------------------

/// Text of one message entry: a string, or an object carrying the text under
/// one of the usual keys. The text is returned exactly as reported; blank
/// entries are dropped.
pub fn message_text(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) => (!s.trim().is_empty()).then(|| s.clone()),
        Value::Object(_) => MESSAGE_TEXT
            .iter()
            .filter_map(|key| lookup(entry, key))
            .find_map(|found| match found {
                Value::String(_) => message_text(found),
                other => coerce_string(other),
            }),
        _ => None,
    }
}

fn message_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(entries) => entries.iter().filter_map(message_text).collect(),
        other => message_text(other).into_iter().collect(),
    }
}

/// The first device-level message list, or `None` when the payload has none.
pub fn device_messages(payload: &Value, kind: MessageKind) -> Option<Vec<String>> {
    first_present(payload, kind.device_paths()).map(message_list)
}

/// Messages attached to a single install item.
pub fn item_messages(item: &Value, kind: MessageKind) -> Vec<String> {
    first_present(item, kind.item_keys())
        .map(message_list)
        .unwrap_or_default()
}

pub fn item_name(item: &Value) -> Option<String> {
    first_string(item, &["name", "displayName", "itemName", "title"])
}

/// Raw install item objects, in payload order.
pub fn install_items(payload: &Value) -> Vec<&Value> {
    ITEMS
        .iter()
        .filter_map(|path| lookup(payload, path))
        .find_map(Value::as_array)
        .map(|items| items.iter().filter(|item| item.is_object()).collect())
        .unwrap_or_default()
}

/// Every message of `kind` a device reports: the device-level list when there
/// is one, otherwise the concatenated per-item lists.
pub fn collect_messages(payload: &Value, kind: MessageKind) -> Vec<String> {
    device_messages(payload, kind).unwrap_or_else(|| {
        install_items(payload)
            .into_iter()
            .flat_map(|item| item_messages(item, kind))
            .collect()
    })
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

pub(crate) fn extract(payload: &Value, platform: Platform, temporal: &TemporalParser) -> InstallsSummary {
    let items: Vec<InstallItem> = install_items(payload)
        .into_iter()
        .filter_map(|raw| {
            Some(InstallItem {
                name: item_name(raw)?,
                version: first_string(raw, &["version", "installedVersion", "versionToInstall"]),
                status: item_status(raw),
                errors: item_messages(raw, MessageKind::Errors),
                warnings: item_messages(raw, MessageKind::Warnings),
            })
        })
        .collect();

    InstallsSummary {
        platform,
        total_items: items.len(),
        error_count: collect_messages(payload, MessageKind::Errors).len(),
        warning_count: collect_messages(payload, MessageKind::Warnings).len(),
        last_run: temporal.parse(first_present(payload, LAST_RUN), false),
        items,
    }
}

fn item_status(item: &Value) -> Option<String> {
    first_string(item, &["status", "installStatus", "state"]).or_else(|| {
        match first_present(item, &["installed", "isInstalled"])? {
            Value::Bool(true) => Some("installed".to_string()),
            Value::Bool(false) => Some("not installed".to_string()),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize_payload;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn munki_payload() -> Value {
        normalize_payload(&json!({
            "platform": "darwin",
            "munki": {
                "last_run": "2024-03-01T09:30:00Z",
                "items": [
                    {"name": "Firefox", "version": "123.0", "installed": "true"},
                    {"name": "Zoom", "status": "failed", "errors": ["Download failed", {"message": "Checksum mismatch"}]},
                    {"version": "1.0"}
                ]
            }
        }))
    }

    #[rstest]
    #[case("errors", Some(MessageKind::Errors))]
    #[case(" Warning ", Some(MessageKind::Warnings))]
    #[case("info", None)]
    fn kind_parsing(#[case] input: &str, #[case] expected: Option<MessageKind>) {
        assert_eq!(input.parse::<MessageKind>().ok(), expected);
    }

    #[test]
    fn items_and_counts() {
        let summary = extract(&munki_payload(), Platform::Mac, &TemporalParser::default());
        assert_eq!(summary.total_items, 2);
        assert_eq!(summary.items[0].status.as_deref(), Some("installed"));
        assert_eq!(
            summary.items[1].errors,
            vec!["Download failed".to_string(), "Checksum mismatch".to_string()]
        );
        assert_eq!(summary.error_count, 2);
        assert_eq!(summary.warning_count, 0);
        assert_eq!(summary.last_run.text, "Mar 1, 2024 09:30");
    }

    #[test]
    fn device_level_list_is_authoritative() {
        let payload = normalize_payload(&json!({
            "installs": {
                "recent_errors": ["Only this"],
                "items": [{"name": "Zoom", "errors": ["Per item"]}]
            }
        }));
        assert_eq!(device_messages(&payload, MessageKind::Errors), Some(vec!["Only this".to_string()]));
        assert_eq!(collect_messages(&payload, MessageKind::Errors), vec!["Only this"]);
        assert_eq!(device_messages(&payload, MessageKind::Warnings), None);
    }

    #[rstest]
    #[case(json!("  spaced  "), Some("  spaced  "))]
    #[case(json!("   "), None)]
    #[case(json!({"text": "from text"}), Some("from text"))]
    #[case(json!({"message": "  ", "text": "next key"}), Some("next key"))]
    #[case(json!({"error": 1603}), Some("1603"))]
    #[case(json!({"msg": "short"}), Some("short"))]
    #[case(json!({"code": 3}), None)]
    #[case(json!(""), None)]
    fn message_entries(#[case] entry: Value, #[case] expected: Option<&str>) {
        assert_eq!(message_text(&entry).as_deref(), expected);
    }
}
