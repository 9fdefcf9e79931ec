//! Static payload corpora used across harnesses.
//!
//! Each corpus mimics one agent family: the macOS agent reports osquery-style
//! snake_case tables, the Windows agent reports PowerShell output with
//! `@{Key=Value}` strings and PascalCase keys mixed in.

use serde_json::{json, Value};

/// macOS agent on an Apple Silicon laptop enrolled in Jamf.
pub fn mac_payload() -> Value {
    json!({
        "platform": "darwin",
        "computer_name": "ada-mbp",
        "serial_number": "C02XK0AAJGH5",
        "os_version": {"name": "macOS", "version": "14.4.1", "build": "23E224"},
        "current_user": "ada",
        "hardware": {
            "model": "MacBook Pro",
            "model_identifier": "Mac14,9",
            "processor": "Apple M2 Pro",
            "cpu_cores": "10",
            "gpu_cores": "16",
            "memory": "16 GB",
            "architecture": "arm64"
        },
        "storage": [
            {"name": "Macintosh HD", "capacity": "494.38 GB", "free_space": "120.5 GB", "is_internal": "true"},
            {"name": "Backup", "capacity": "2 TB", "free_space": "1.5 TB", "is_internal": "false"}
        ],
        "network": {
            "hostname": "ada-mbp.local",
            "interfaces": [
                {"name": "lo0", "ipv4": "127.0.0.1", "is_active": "true"},
                {"name": "en0", "ipv4": "192.168.1.20", "mac": "a4:83:e7:00:11:22", "is_active": "true", "type": "wifi"}
            ],
            "wifi": {"ssid": "HQ-Corp"}
        },
        "mdm_enrollment": {
            "enrolled": "true",
            "server_url": "https://acme.jamfcloud.com/mdm/ServerURL",
            "user_approved": "true",
            "enrollment_type": "DEP",
            "last_check_in": "2024-03-01T09:30:00Z"
        },
        "secure_token": {"enabled": "1", "users": ["ada"]},
        "bootstrap_token": {"escrowed": "true", "supported": "true"},
        "security": {"firewall": "1", "file_vault": "On", "sip": "enabled", "gatekeeper": "true"},
        "login_history": [
            {"user": "ada", "tty": "console", "time": "2024-03-01 08:55:00 still logged in"},
            {"user": "ada", "tty": "ttys001", "time": 1709280000}
        ],
        "munki": {
            "last_run": "2024-03-01T09:00:00Z",
            "items": [
                {"name": "Firefox", "version": "123.0", "installed": "true"},
                {"name": "Zoom", "status": "failed", "errors": ["Download failed: timed out"]}
            ]
        }
    })
}

/// Windows agent on a Dell laptop enrolled in Intune, with PowerShell
/// custom-object strings where the agent did not serialize nested objects.
pub fn windows_payload() -> Value {
    json!({
        "device_name": "LAB-07",
        "serial_number": "5CG1234XYZ",
        "operating_system": "@{Name=Microsoft Windows 11 Pro; Version=10.0.22631; Build=22631}",
        "hardware": {
            "manufacturer": "Dell Inc.",
            "model": "Latitude 7440",
            "processor": "13th Gen Intel(R) Core(TM) i7-1365U",
            "cpu_cores": 10,
            "memory": 34359738368_u64
        },
        "storage": "[{\"name\": \"C:\", \"capacity\": 511000000000, \"free_space\": 211000000000, \"is_internal\": true}]",
        "network": {
            "hostname": "LAB-07",
            "ip_address": "10.20.30.40",
            "dns_servers": ["10.20.0.10", "10.20.0.11"]
        },
        "mdm": {
            "enrolled": "True",
            "server_url": "https://wip.mam.manage.microsoft.com/Enroll",
            "last_check_in": "/Date(1709283600000)/"
        },
        "bit_locker": "@{MountPoint=C:; ProtectionStatus=On}",
        "windows_defender": "@{Product=Microsoft Defender; Enabled=True; UpToDate=False}",
        "windows_hello": {"enabled": "True", "methods": "PIN, Face"},
        "device_join": {"azure_ad_joined": "YES", "tenant_name": "Acme"},
        "secure_token": {"enabled": true},
        "cimian": {
            "errors": [
                {"message": "Installer exited with code 1603"},
                "Hash mismatch for 7zip"
            ],
            "warnings": []
        }
    })
}

/// Payloads that exercise the decoder and key normalizer in isolation.
pub const CORPUS_EMBEDDED: &[&str] = &[
    r#"{"tpm": "@{SpecVersion=2.0; IsEnabled=True; IsActivated=$null}"}"#,
    r#"{"bit_locker": "@{MountPoint=C:; KeyProtector=@(@{Type=Tpm}, @{Type=RecoveryPassword})}"}"#,
    r#"{"nested_json": "{\"inner_key\": \"{\\\"deep_key\\\": 1}\"}"}"#,
    r#"{"services": "@{Name=WinRM; Status=Running}\n@{Name=Spooler; Status=Stopped}"}"#,
    r#"{"list": ["@{a=1}", "plain", "[1, 2, 3]"]}"#,
];

/// Payloads holding strings that look structured but do not parse.
pub const CORPUS_MALFORMED: &[&str] = &[
    r#"{"broken": "@{Name=Value"}"#,
    r#"{"broken": "@{=oops}"}"#,
    r#"{"broken": "{not json"}"#,
    r#"{"broken": "@{Name=(unclosed}"}"#,
];

pub fn parse(corpus_entry: &str) -> Value {
    serde_json::from_str(corpus_entry).expect("fixture must be valid JSON")
}
