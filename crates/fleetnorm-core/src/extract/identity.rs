//! Identity — who and what the device is, plus the platform-specific
//! credential sections.
//!
//! Secure Token, Bootstrap Token and Platform SSO exist only on macOS; Windows
//! Hello and directory join exist only on Windows. Each is populated only on
//! its own platform and only when the agent actually reported it.

use serde::Serialize;
use serde_json::Value;

use super::{first_flag, flag};
use crate::coercion::coerce_string_list;
use crate::paths::{first_present, first_string, lookup};
use crate::platform::Platform;
use crate::temporal::{TemporalParser, TemporalValue};

const DEVICE_NAME: &[&str] = &[
    "deviceName",
    "computerName",
    "identity.deviceName",
    "identity.computerName",
    "system.computerName",
    "systemInfo.computerName",
    "inventory.deviceName",
    "hostname",
    "network.hostname",
];
const SERIAL_NUMBER: &[&str] = &[
    "serialNumber",
    "identity.serialNumber",
    "hardware.serialNumber",
    "systemInfo.hardwareSerial",
    "inventory.serialNumber",
    "bios.serialNumber",
];
const MODEL_IDENTIFIER: &[&str] = &[
    "modelIdentifier",
    "identity.modelIdentifier",
    "hardware.modelIdentifier",
    "systemInfo.hardwareModel",
    "system.hardwareModel",
];
const ASSET_TAG: &[&str] = &["assetTag", "identity.assetTag", "inventory.assetTag"];
const OS_NAME: &[&str] = &[
    "osName",
    "os.name",
    "operatingSystem.name",
    "operatingSystem.Caption",
    "operatingSystem.Name",
    "operatingSystem",
    "osVersion.name",
    "system.osName",
];
const OS_VERSION: &[&str] = &[
    "osVersion",
    "os.version",
    "operatingSystem.version",
    "operatingSystem.Version",
    "osVersion.version",
    "system.osVersion",
];
const OS_BUILD: &[&str] = &[
    "osBuild",
    "os.build",
    "operatingSystem.build",
    "operatingSystem.BuildNumber",
    "operatingSystem.Build",
    "osVersion.build",
    "buildNumber",
];
const CURRENT_USER: &[&str] = &[
    "currentUser",
    "consoleUser",
    "identity.currentUser",
    "users.current",
    "loggedInUser",
    "system.currentUser",
];
const LAST_LOGIN: &[&str] = &[
    "lastLogin",
    "identity.lastLogin",
    "users.lastLogin",
    "lastLoggedOnUser.time",
];
const LOGIN_HISTORY: &[&str] = &[
    "loginHistory",
    "identity.loginHistory",
    "lastLogins",
    "users.loginHistory",
];
const USER_ACCOUNTS: &[&str] = &[
    "users.accounts",
    "identity.users",
    "localUsers",
    "accounts",
    "users",
];

const SECURE_TOKEN: &[&str] = &[
    "secureToken",
    "identity.secureToken",
    "security.secureToken",
];
const BOOTSTRAP_TOKEN: &[&str] = &[
    "bootstrapToken",
    "identity.bootstrapToken",
    "security.bootstrapToken",
    "mdmEnrollment.bootstrapToken",
    "mdm.bootstrapToken",
];
const PLATFORM_SSO: &[&str] = &[
    "platformSso",
    "platformSSO",
    "identity.platformSso",
    "identity.platformSSO",
    "security.platformSso",
];
const WINDOWS_HELLO: &[&str] = &[
    "windowsHello",
    "identity.windowsHello",
    "security.windowsHello",
];
const DIRECTORY_JOIN: &[&str] = &["deviceJoin", "identity.deviceJoin", "dsregcmd", "joinInfo"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityInfo {
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_build: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_user: Option<String>,
    pub last_login: TemporalValue,
    pub recent_logins: Vec<LoginSession>,
    pub users: Vec<UserAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure_token: Option<SecureTokenInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_token: Option<BootstrapTokenInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_sso: Option<PlatformSsoInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windows_hello: Option<WindowsHelloInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_join: Option<DirectoryJoinInfo>,
}

/// One row of login history. `since.is_active` mirrors the `still logged in`
/// marker and is only as reliable as that marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub since: TemporalValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    /// macOS only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure_token: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureTokenInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    pub users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapTokenInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escrowed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSsoInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_registered: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowsHelloInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    pub methods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryJoinInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entra_joined: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_joined: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

pub(crate) fn extract(payload: &Value, platform: Platform, temporal: &TemporalParser) -> IdentityInfo {
    let mac = platform.is_mac();
    let windows = platform.is_windows();

    IdentityInfo {
        platform,
        device_name: device_name(payload),
        serial_number: first_string(payload, SERIAL_NUMBER),
        asset_tag: first_string(payload, ASSET_TAG),
        model_identifier: first_string(payload, MODEL_IDENTIFIER),
        os_name: first_string(payload, OS_NAME),
        os_version: first_string(payload, OS_VERSION),
        os_build: first_string(payload, OS_BUILD),
        current_user: first_string(payload, CURRENT_USER),
        last_login: temporal.parse(first_present(payload, LAST_LOGIN), true),
        recent_logins: login_history(payload, temporal),
        users: user_accounts(payload, mac),
        secure_token: mac.then(|| secure_token(payload)).flatten(),
        bootstrap_token: mac.then(|| bootstrap_token(payload)).flatten(),
        platform_sso: mac.then(|| platform_sso(payload)).flatten(),
        windows_hello: windows.then(|| windows_hello(payload)).flatten(),
        directory_join: windows.then(|| directory_join(payload)).flatten(),
    }
}

/// Device name as reported by the agent, if any.
pub fn device_name(payload: &Value) -> Option<String> {
    first_string(payload, DEVICE_NAME)
}

fn login_history(payload: &Value, temporal: &TemporalParser) -> Vec<LoginSession> {
    let Some(Value::Array(rows)) = first_present(payload, LOGIN_HISTORY) else {
        return Vec::new();
    };
    rows.iter()
        .filter(|row| row.is_object())
        .map(|row| LoginSession {
            user: first_string(row, &["user", "username", "userName"]),
            terminal: first_string(row, &["tty", "terminal", "line"]),
            host: first_string(row, &["host", "remoteHost"]),
            since: temporal.parse(first_present(row, &["time", "loginTime", "since", "date"]), true),
        })
        .collect()
}

fn user_accounts(payload: &Value, mac: bool) -> Vec<UserAccount> {
    let rows = USER_ACCOUNTS
        .iter()
        .filter_map(|path| lookup(payload, path))
        .find_map(Value::as_array);
    let Some(rows) = rows else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| {
            let name = first_string(row, &["username", "userName", "name", "shortName"])?;
            Some(UserAccount {
                name,
                full_name: first_string(row, &["fullName", "realName", "description"]),
                uid: first_string(row, &["uid", "sid", "userId"]),
                is_admin: first_flag(row, &["isAdmin", "admin", "isAdministrator"]),
                secure_token: if mac {
                    first_flag(row, &["secureToken", "hasSecureToken"])
                } else {
                    None
                },
            })
        })
        .collect()
}

fn secure_token(payload: &Value) -> Option<SecureTokenInfo> {
    let raw = first_present(payload, SECURE_TOKEN)?;
    Some(match raw {
        Value::Object(_) => SecureTokenInfo {
            enabled: first_flag(raw, &["enabled", "tokenGranted", "status"]),
            users: first_present(raw, &["users", "enabledUsers", "tokenUsers"])
                .map(coerce_string_list)
                .unwrap_or_default(),
        },
        Value::Array(_) => SecureTokenInfo {
            enabled: None,
            users: coerce_string_list(raw),
        },
        scalar => SecureTokenInfo {
            enabled: Some(flag(scalar)),
            users: Vec::new(),
        },
    })
}

fn bootstrap_token(payload: &Value) -> Option<BootstrapTokenInfo> {
    let raw = first_present(payload, BOOTSTRAP_TOKEN)?;
    Some(match raw {
        Value::Object(_) => BootstrapTokenInfo {
            escrowed: first_flag(raw, &["escrowed", "isEscrowed", "escrowedToServer"]),
            supported: first_flag(raw, &["supported", "isSupported", "allowed"]),
        },
        scalar => BootstrapTokenInfo {
            escrowed: Some(flag(scalar)),
            supported: None,
        },
    })
}

fn platform_sso(payload: &Value) -> Option<PlatformSsoInfo> {
    let raw = first_present(payload, PLATFORM_SSO)?;
    Some(match raw {
        Value::Object(_) => PlatformSsoInfo {
            registered: first_flag(raw, &["registered", "deviceRegistered", "isRegistered"]),
            user_registered: first_flag(raw, &["userRegistered", "userConfiguration.registered"]),
            method: first_string(raw, &["method", "authenticationMethod", "loginType"]),
            extension: first_string(raw, &["extensionIdentifier", "extension"]),
        },
        scalar => PlatformSsoInfo {
            registered: Some(flag(scalar)),
            user_registered: None,
            method: None,
            extension: None,
        },
    })
}

fn windows_hello(payload: &Value) -> Option<WindowsHelloInfo> {
    let raw = first_present(payload, WINDOWS_HELLO)?;
    Some(match raw {
        Value::Object(_) => WindowsHelloInfo {
            enabled: first_flag(raw, &["enabled", "isEnabled", "status"]),
            methods: first_present(raw, &["methods", "credentialProviders"])
                .map(coerce_string_list)
                .unwrap_or_default(),
        },
        scalar => WindowsHelloInfo {
            enabled: Some(flag(scalar)),
            methods: Vec::new(),
        },
    })
}

fn directory_join(payload: &Value) -> Option<DirectoryJoinInfo> {
    let scope = first_present(payload, DIRECTORY_JOIN).unwrap_or(payload);
    let info = DirectoryJoinInfo {
        entra_joined: first_flag(scope, &["azureAdJoined", "entraJoined", "aadJoined"]),
        domain_joined: first_flag(scope, &["domainJoined", "enterpriseJoined"]),
        tenant_name: first_string(scope, &["tenantName", "azureAdTenantName"]),
        domain_name: first_string(scope, &["domainName", "domain"])
            .filter(|d| !d.eq_ignore_ascii_case("WORKGROUP")),
    };
    let reported = info.entra_joined.is_some()
        || info.domain_joined.is_some()
        || info.tenant_name.is_some()
        || info.domain_name.is_some();
    reported.then_some(info)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
