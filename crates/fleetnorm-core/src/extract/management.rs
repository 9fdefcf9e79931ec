//! Management — MDM enrollment and provider.

use phf::phf_map;
use serde::Serialize;
use serde_json::Value;

use super::{first_flag, positive_count};
use crate::coercion::coerce_string;
use crate::paths::{first_array, first_present, first_string};
use crate::platform::Platform;
use crate::temporal::{TemporalParser, TemporalValue};

const ENROLLED: &[&str] = &[
    "mdmEnrollment.enrolled",
    "mdmEnrollment.isEnrolled",
    "mdm.enrolled",
    "mdm.isEnrolled",
    "management.enrolled",
    "management.mdmEnrollment.enrolled",
    "enrollment.enrolled",
    "mdmEnrolled",
];
const SERVER_URL: &[&str] = &[
    "mdmEnrollment.serverUrl",
    "mdmEnrollment.serverURL",
    "mdm.serverUrl",
    "management.serverUrl",
    "management.mdmEnrollment.serverUrl",
    "enrollment.serverUrl",
    "mdmEnrollment.checkinUrl",
    "mdm.checkinUrl",
];
const PROVIDER: &[&str] = &[
    "mdmEnrollment.provider",
    "mdmEnrollment.vendor",
    "mdm.provider",
    "mdm.vendor",
    "management.provider",
    "enrollment.provider",
    "mdmProvider",
];
const ENROLLMENT_TYPE: &[&str] = &[
    "mdmEnrollment.enrollmentType",
    "mdmEnrollment.type",
    "mdm.enrollmentType",
    "management.enrollmentType",
    "enrollment.type",
];
const AUTOMATED: &[&str] = &[
    "mdmEnrollment.depEnrolled",
    "mdmEnrollment.automatedEnrollment",
    "mdm.depEnrolled",
    "management.depEnrolled",
    "enrollment.automated",
];
const USER_APPROVED: &[&str] = &[
    "mdmEnrollment.userApproved",
    "mdmEnrollment.userApprovedEnrollment",
    "mdm.userApproved",
    "management.userApproved",
    "enrollment.userApproved",
];
const LAST_CHECK_IN: &[&str] = &[
    "mdmEnrollment.lastCheckIn",
    "mdmEnrollment.lastCheckin",
    "mdm.lastCheckIn",
    "management.lastCheckIn",
    "enrollment.lastCheckIn",
    "lastCheckIn",
];
const PROFILE_COUNT: &[&str] = &[
    "mdmEnrollment.profileCount",
    "mdm.profileCount",
    "management.profileCount",
    "profiles.count",
    "profileCount",
];
const PROFILES: &[&str] = &["profiles.items", "profiles", "management.profiles", "configurationProfiles"];

/// Server URL fragments and the vendor they identify. When several match, the
/// longest fragment wins (`manage.microsoft.com` over `microsoft`).
static PROVIDER_PATTERNS: phf::Map<&'static str, &'static str> = phf_map! {
    "jamfcloud.com" => "Jamf Pro",
    "jamf" => "Jamf Pro",
    "manage.microsoft.com" => "Microsoft Intune",
    "intune" => "Microsoft Intune",
    "kandji" => "Kandji",
    "mosyle" => "Mosyle",
    "simplemdm" => "SimpleMDM",
    "addigy" => "Addigy",
    "awmdm" => "Workspace ONE",
    "airwatch" => "Workspace ONE",
    "workspaceone" => "Workspace ONE",
    "jumpcloud" => "JumpCloud",
    "fleetdm" => "Fleet",
    "hexnode" => "Hexnode",
    "meraki" => "Meraki Systems Manager",
    "filewave" => "FileWave",
    "miradore" => "Miradore",
    "manageengine" => "ManageEngine",
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementSummary {
    pub platform: Platform,
    pub enrolled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_approved: Option<bool>,
    pub last_check_in: TemporalValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_count: Option<u32>,
}

/// Vendor name for an MDM server URL.
pub fn infer_provider(server_url: &str) -> Option<&'static str> {
    let url = server_url.to_ascii_lowercase();
    PROVIDER_PATTERNS
        .entries()
        .filter(|(pattern, _)| url.contains(*pattern))
        .max_by_key(|(pattern, _)| pattern.len())
        .map(|(_, vendor)| *vendor)
}

pub(crate) fn extract(payload: &Value, platform: Platform, temporal: &TemporalParser) -> ManagementSummary {
    let server_url = first_string(payload, SERVER_URL);
    let provider = first_string(payload, PROVIDER).or_else(|| {
        server_url
            .as_deref()
            .and_then(infer_provider)
            .map(str::to_string)
    });
    let enrollment_type = first_string(payload, ENROLLMENT_TYPE);
    let automated = first_flag(payload, AUTOMATED).or_else(|| {
        enrollment_type
            .as_deref()
            .map(|t| t.to_ascii_lowercase())
            .map(|t| t.contains("dep") || t.contains("automated") || t.contains("autopilot"))
    });
    let enrolled = first_flag(payload, ENROLLED).unwrap_or(server_url.is_some());

    ManagementSummary {
        platform,
        enrolled,
        server_url,
        provider,
        enrollment_type,
        automated,
        user_approved: first_flag(payload, USER_APPROVED),
        last_check_in: temporal.parse(first_present(payload, LAST_CHECK_IN), false),
        profile_count: positive_count(payload, PROFILE_COUNT).or_else(|| profile_list_len(payload)),
    }
}

fn profile_list_len(payload: &Value) -> Option<u32> {
    let profiles = first_array(payload, PROFILES)?;
    let named = profiles
        .iter()
        .filter(|p| first_present(p, &["name", "displayName", "identifier"]).and_then(coerce_string).is_some())
        .count();
    (named > 0).then(|| named.min(u32::MAX as usize) as u32)
}
