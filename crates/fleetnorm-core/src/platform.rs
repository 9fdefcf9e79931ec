//! Platform detection, shared by every extractor.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

use crate::coercion::coerce_string;
use crate::paths::lookup;

/// Operating-system family of the device that produced a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Mac,
    Windows,
    Other,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Mac => write!(f, "mac"),
            Platform::Windows => write!(f, "windows"),
            Platform::Other => write!(f, "other"),
        }
    }
}

impl Platform {
    pub fn is_mac(self) -> bool {
        self == Platform::Mac
    }

    pub fn is_windows(self) -> bool {
        self == Platform::Windows
    }
}

/// Explicit OS indicators, in priority order.
const OS_FIELDS: &[&str] = &[
    "platform",
    "osName",
    "os.name",
    "os.platform",
    "operatingSystem",
    "operatingSystem.name",
    "operatingSystem.Caption",
    "operatingSystem.Name",
    "operatingSystem.platform",
    "system.platform",
    "system.osName",
    "systemInfo.platform",
    "systemInfo.osName",
    "osVersion.name",
    "osVersion.platform",
    "inventory.platform",
];

/// Hardware model / vendor strings.
const HARDWARE_FIELDS: &[&str] = &[
    "hardware.model",
    "hardware.modelName",
    "hardware.modelIdentifier",
    "hardware.vendor",
    "hardware.manufacturer",
    "systemInfo.hardwareModel",
    "systemInfo.hardwareVendor",
    "system.hardwareModel",
    "system.hardwareVendor",
    "model",
    "manufacturer",
];

fn mac_os_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)mac|darwin").expect("valid mac os regex"))
}

/// `mac`/`apple` as a word prefix, so `Virtual Machine` does not count.
fn mac_hardware_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bapple|\bmac(?:book|mini|pro|studio|os|\b|\d)")
            .expect("valid mac hardware regex")
    })
}

fn other_os_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)linux|ubuntu|debian|centos|rhel|red hat|fedora|chrome ?os|freebsd")
            .expect("valid other os regex")
    })
}

fn strings_at<'a>(
    payload: &'a Value,
    fields: &'static [&'static str],
) -> impl Iterator<Item = String> + 'a {
    fields
        .iter()
        .filter_map(move |path| lookup(payload, path))
        .filter_map(coerce_string)
}

/// Detect the platform of a normalized payload.
///
/// Mac when an OS field mentions `mac`/`darwin` or a hardware model/vendor
/// names Apple hardware; otherwise Other when an OS field names a non-Windows
/// family; otherwise Windows.
pub fn detect_platform(payload: &Value) -> Platform {
    let os_names: Vec<String> = strings_at(payload, OS_FIELDS).collect();

    if os_names.iter().any(|name| mac_os_re().is_match(name))
        || strings_at(payload, HARDWARE_FIELDS).any(|hw| mac_hardware_re().is_match(&hw))
    {
        return Platform::Mac;
    }
    if os_names.iter().any(|name| other_os_re().is_match(name)) {
        return Platform::Other;
    }
    Platform::Windows
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
