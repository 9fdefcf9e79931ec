//! Module extractors — typed, platform-aware projections of a normalized
//! payload.
//!
//! Every attribute is read from an ordered list of candidate paths (see
//! [`crate::paths`]); the first present candidate wins and a missing attribute
//! is `None`. Platform-gated sections (Secure Token, Platform SSO, Windows
//! Hello, ...) are `None` off-platform and are skipped when serialized, so
//! they are absent rather than zero-valued.
//!
//! Extractors never fail. They expect a payload that already went through
//! [`crate::normalizer`], but tolerate raw input too.

pub mod hardware;
pub mod identity;
pub mod installs;
pub mod management;
pub mod network;
pub mod security;

use phf::phf_set;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

use crate::coercion::{coerce_boolean, coerce_number};
use crate::config::Config;
use crate::paths::first_present;
use crate::platform::{detect_platform, Platform};
use crate::temporal::TemporalParser;

pub use hardware::{HardwareSummary, StorageDrive, StorageTotals};
pub use identity::{
    BootstrapTokenInfo, DirectoryJoinInfo, IdentityInfo, LoginSession, PlatformSsoInfo,
    SecureTokenInfo, UserAccount, WindowsHelloInfo,
};
pub use installs::{InstallItem, InstallsSummary, MessageKind, ParseMessageKindError};
pub use management::{infer_provider, ManagementSummary};
pub use network::{NetworkInterface, NetworkSummary, VpnInfo};
pub use security::{AntivirusInfo, DiskEncryption, SecuritySummary};

// ---------------------------------------------------------------------------
// DeviceSummary
// ---------------------------------------------------------------------------

/// Every module summary for one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    pub platform: Platform,
    pub identity: IdentityInfo,
    pub hardware: HardwareSummary,
    pub network: NetworkSummary,
    pub management: ManagementSummary,
    pub security: SecuritySummary,
    pub installs: InstallsSummary,
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Runs the extractors with a shared temporal parser.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    temporal: TemporalParser,
}

impl Extractor {
    pub fn new(temporal: TemporalParser) -> Self {
        Self { temporal }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(TemporalParser::from_config(&config.display))
    }

    pub fn device(&self, payload: &Value) -> DeviceSummary {
        let platform = detect_platform(payload);
        DeviceSummary {
            platform,
            identity: identity::extract(payload, platform, &self.temporal),
            hardware: hardware::extract(payload, platform),
            network: network::extract(payload, platform),
            management: management::extract(payload, platform, &self.temporal),
            security: security::extract(payload, platform),
            installs: installs::extract(payload, platform, &self.temporal),
        }
    }

    pub fn identity(&self, payload: &Value) -> IdentityInfo {
        identity::extract(payload, detect_platform(payload), &self.temporal)
    }

    pub fn management(&self, payload: &Value) -> ManagementSummary {
        management::extract(payload, detect_platform(payload), &self.temporal)
    }

    pub fn installs(&self, payload: &Value) -> InstallsSummary {
        installs::extract(payload, detect_platform(payload), &self.temporal)
    }
}

pub fn extract_device(payload: &Value) -> DeviceSummary {
    Extractor::default().device(payload)
}

pub fn extract_identity(payload: &Value) -> IdentityInfo {
    Extractor::default().identity(payload)
}

pub fn extract_hardware(payload: &Value) -> HardwareSummary {
    hardware::extract(payload, detect_platform(payload))
}

pub fn extract_network(payload: &Value) -> NetworkSummary {
    network::extract(payload, detect_platform(payload))
}

pub fn extract_management(payload: &Value) -> ManagementSummary {
    Extractor::default().management(payload)
}

pub fn extract_security(payload: &Value) -> SecuritySummary {
    security::extract(payload, detect_platform(payload))
}

pub fn extract_installs(payload: &Value) -> InstallsSummary {
    Extractor::default().installs(payload)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// State words agents use instead of booleans (`ProtectionStatus=On`,
/// `status: "Enabled"`).
static STATE_TOKENS: phf::Set<&'static str> = phf_set! {
    "on",
    "enabled",
    "active",
    "up",
    "connected",
    "protected",
    "escrowed",
    "granted",
    "running",
    "registered",
};

/// Keys checked inside an object that stands for a single flag.
const INNER_FLAG_KEYS: &[&str] = &[
    "enabled",
    "isEnabled",
    "status",
    "state",
    "Enabled",
    "Status",
];

/// Boolean coercion that also understands state words.
pub(crate) fn flag(value: &Value) -> bool {
    coerce_boolean(value)
        || value
            .as_str()
            .is_some_and(|s| STATE_TOKENS.contains(s.trim().to_ascii_lowercase().as_str()))
}

/// Read a flag from a scalar or from the usual keys of a wrapping object.
pub(crate) fn read_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Null => None,
        Value::Object(_) => first_present(value, INNER_FLAG_KEYS).map(flag),
        other => Some(flag(other)),
    }
}

pub(crate) fn first_flag(payload: &Value, candidates: &[&str]) -> Option<bool> {
    candidates
        .iter()
        .filter_map(|path| first_present(payload, &[*path]))
        .find_map(read_flag)
}

/// First candidate holding a positive count.
pub(crate) fn positive_count(payload: &Value, candidates: &[&str]) -> Option<u32> {
    first_present(payload, candidates)
        .map(coerce_number)
        .filter(|n| *n > 0.0)
        .map(|n| n.min(u32::MAX as f64) as u32)
}

fn capacity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*([0-9]+(?:\.[0-9]+)?)\s*(bytes|b|kb|mb|gb|tb|pb|kib|mib|gib|tib|pib)?\s*$")
            .expect("valid capacity regex")
    })
}

/// Byte count from a number or a `"16 GB"`-style string.
///
/// `binary` selects 1024-based multipliers for the bare `KB`/`MB`/`GB` units,
/// which is how operating systems report memory; storage uses 1000-based
/// units. `KiB`/`GiB`-style units are always binary.
pub fn parse_capacity(value: &Value, binary: bool) -> Option<u64> {
    let bytes = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let caps = capacity_re().captures(s)?;
            let amount: f64 = caps[1].parse().ok()?;
            let unit = caps.get(2).map(|m| m.as_str().to_ascii_lowercase());
            let base: f64 = if binary { 1024.0 } else { 1000.0 };
            let exp = match unit.as_deref() {
                None | Some("b") | Some("bytes") => 0,
                Some("kb") | Some("kib") => 1,
                Some("mb") | Some("mib") => 2,
                Some("gb") | Some("gib") => 3,
                Some("tb") | Some("tib") => 4,
                _ => 5,
            };
            let base = if unit.as_deref().is_some_and(|u| u.ends_with("ib")) {
                1024.0
            } else {
                base
            };
            amount * base.powi(exp)
        }
        _ => return None,
    };
    (bytes.is_finite() && bytes > 0.0).then(|| bytes.round() as u64)
}

/// Render a byte count, e.g. `500.3 GB` (decimal) or `16 GB` (binary).
pub fn format_bytes(bytes: u64, binary: bool) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let base = if binary { 1024.0 } else { 1000.0 };
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= base && unit < UNITS.len() - 1 {
        value /= base;
        unit += 1;
    }
    if unit == 0 || (value.fract() < 0.05 || value.fract() > 0.95) {
        format!("{:.0} {}", value, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
