//! Security posture — firewall, disk encryption and the platform-specific
//! protections (SIP and Gatekeeper on macOS, antivirus on Windows).

use serde::Serialize;
use serde_json::Value;

use super::{first_flag, flag};
use crate::paths::{first_present, first_string};
use crate::platform::Platform;

const FIREWALL: &[&str] = &[
    "security.firewall",
    "security.firewallEnabled",
    "firewall",
    "firewallEnabled",
    "alf.globalState",
    "firewallProfiles.domain",
];
const FILEVAULT: &[&str] = &[
    "security.fileVault",
    "security.filevault",
    "fileVault",
    "filevault",
    "diskEncryption",
    "security.diskEncryption",
];
const BITLOCKER: &[&str] = &[
    "security.bitLocker",
    "security.bitlocker",
    "bitLocker",
    "bitlocker",
    "encryptableVolume",
    "diskEncryption",
    "security.diskEncryption",
];
const SIP: &[&str] = &[
    "security.sip",
    "security.systemIntegrityProtection",
    "sip",
    "sipConfig.enabled",
    "systemIntegrityProtection",
];
const GATEKEEPER: &[&str] = &[
    "security.gatekeeper",
    "gatekeeper.assessmentsEnabled",
    "gatekeeper",
];
const ANTIVIRUS: &[&str] = &[
    "security.antivirus",
    "antivirus",
    "windowsDefender",
    "defender",
    "security.defender",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySummary {
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firewall_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_encryption: Option<DiskEncryption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sip_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gatekeeper_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub antivirus: Option<AntivirusInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskEncryption {
    /// `FileVault` or `BitLocker`.
    pub method: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AntivirusInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_to_date: Option<bool>,
}

pub(crate) fn extract(payload: &Value, platform: Platform) -> SecuritySummary {
    let mac = platform.is_mac();
    let windows = platform.is_windows();

    SecuritySummary {
        platform,
        firewall_enabled: first_flag(payload, FIREWALL),
        disk_encryption: match platform {
            Platform::Mac => disk_encryption(payload, FILEVAULT, "FileVault"),
            Platform::Windows => disk_encryption(payload, BITLOCKER, "BitLocker"),
            Platform::Other => None,
        },
        sip_enabled: mac.then(|| first_flag(payload, SIP)).flatten(),
        gatekeeper_enabled: mac.then(|| first_flag(payload, GATEKEEPER)).flatten(),
        antivirus: windows.then(|| antivirus(payload)).flatten(),
    }
}

fn disk_encryption(payload: &Value, candidates: &[&str], method: &str) -> Option<DiskEncryption> {
    let raw = first_present(payload, candidates)?;
    let (enabled, status) = match raw {
        Value::Object(_) => {
            let status = first_string(
                raw,
                &["status", "protectionStatus", "ProtectionStatus", "state", "conversionStatus"],
            );
            let enabled = first_flag(raw, &["enabled", "isEnabled", "isEncrypted", "encrypted"])
                .or_else(|| status.as_deref().map(|s| flag(&Value::String(s.to_string()))))?;
            (enabled, status)
        }
        Value::String(s) => (flag(raw), Some(s.trim().to_string())),
        other => (flag(other), None),
    };
    Some(DiskEncryption {
        method: method.to_string(),
        enabled,
        status,
    })
}

fn antivirus(payload: &Value) -> Option<AntivirusInfo> {
    let raw = first_present(payload, ANTIVIRUS)?;
    let info = match raw {
        Value::Object(_) => AntivirusInfo {
            product: first_string(raw, &["product", "name", "displayName", "Product", "Name"]),
            enabled: first_flag(
                raw,
                &[
                    "enabled",
                    "antivirusEnabled",
                    "realTimeProtectionEnabled",
                    "Enabled",
                    "AntivirusEnabled",
                    "status",
                ],
            ),
            up_to_date: first_flag(
                raw,
                &["upToDate", "signaturesUpToDate", "definitionsUpToDate", "UpToDate"],
            ),
        },
        scalar => AntivirusInfo {
            product: None,
            enabled: Some(flag(scalar)),
            up_to_date: None,
        },
    };
    Some(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize_payload;
    use crate::platform::detect_platform;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn security(raw: Value) -> SecuritySummary {
        let payload = normalize_payload(&raw);
        extract(&payload, detect_platform(&payload))
    }

    #[test]
    fn mac_posture() {
        let summary = security(json!({
            "platform": "darwin",
            "security": {"firewall": "1", "file_vault": "On", "sip": "enabled", "gatekeeper": "true"},
            "antivirus": {"product": "XProtect", "enabled": true}
        }));
        assert_eq!(summary.firewall_enabled, Some(true));
        assert_eq!(
            summary.disk_encryption,
            Some(DiskEncryption {
                method: "FileVault".into(),
                enabled: true,
                status: Some("On".into())
            })
        );
        assert_eq!(summary.sip_enabled, Some(true));
        assert_eq!(summary.gatekeeper_enabled, Some(true));
        assert!(summary.antivirus.is_none());
    }

    #[test]
    fn windows_posture_from_embedded_object() {
        let summary = security(json!({
            "platform": "Windows",
            "bit_locker": "@{MountPoint=C:; ProtectionStatus=On}",
            "windows_defender": {"product": "Microsoft Defender", "real_time_protection_enabled": "True", "signatures_up_to_date": "False"},
            "sip": true
        }));
        let encryption = summary.disk_encryption.expect("bitlocker");
        assert_eq!(encryption.method, "BitLocker");
        assert!(encryption.enabled);
        assert_eq!(encryption.status.as_deref(), Some("On"));
        assert_eq!(
            summary.antivirus,
            Some(AntivirusInfo {
                product: Some("Microsoft Defender".into()),
                enabled: Some(true),
                up_to_date: Some(false),
            })
        );
        assert!(summary.sip_enabled.is_none());
    }

    #[test]
    fn other_platforms_report_only_firewall() {
        let summary = security(json!({"platform": "linux", "firewall": "off", "disk_encryption": "on"}));
        assert_eq!(summary.firewall_enabled, Some(false));
        assert!(summary.disk_encryption.is_none());
    }
}
