//! Network — addressing, interfaces, Wi-Fi and VPN.

use serde::Serialize;
use serde_json::Value;

use super::{first_flag, read_flag};
use crate::coercion::coerce_string_list;
use crate::paths::{first_array, first_present, first_string};
use crate::platform::Platform;

const HOSTNAME: &[&str] = &[
    "network.hostname",
    "network.hostName",
    "hostname",
    "hostName",
    "systemInfo.hostname",
    "system.hostname",
    "dnsHostName",
];
const PRIMARY_IP: &[&str] = &[
    "network.primaryIp",
    "network.ipAddress",
    "network.ipv4",
    "primaryIp",
    "ipAddress",
];
const MAC_ADDRESS: &[&str] = &[
    "network.macAddress",
    "network.primaryMac",
    "macAddress",
    "primaryMac",
];
const INTERFACES: &[&str] = &[
    "network.interfaces",
    "network.adapters",
    "interfaces",
    "interfaceDetails",
    "networkAdapters",
];
const WIFI_SSID: &[&str] = &[
    "network.wifi.ssid",
    "network.wifiSsid",
    "network.ssid",
    "wifi.ssid",
    "wifiNetwork.ssid",
    "wifiStatus.ssid",
];
const DNS_SERVERS: &[&str] = &[
    "network.dnsServers",
    "network.dns",
    "dnsServers",
    "dnsResolvers",
];
const VPN: &[&str] = &["network.vpn", "vpn", "vpnStatus"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSummary {
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    pub interfaces: Vec<NetworkInterface>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wifi_ssid: Option<String>,
    pub dns_servers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpn: Option<VpnInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VpnInfo {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

pub(crate) fn extract(payload: &Value, platform: Platform) -> NetworkSummary {
    let interfaces = interfaces(payload);
    let primary_ip = first_string(payload, PRIMARY_IP).or_else(|| fallback_ip(&interfaces));
    let mac_address = first_string(payload, MAC_ADDRESS).or_else(|| {
        interfaces
            .iter()
            .find(|i| i.ipv4.is_some() && i.ipv4 == primary_ip)
            .and_then(|i| i.mac.clone())
    });

    NetworkSummary {
        platform,
        hostname: first_string(payload, HOSTNAME),
        primary_ip,
        mac_address,
        interfaces,
        wifi_ssid: first_string(payload, WIFI_SSID),
        dns_servers: first_present(payload, DNS_SERVERS)
            .map(coerce_string_list)
            .unwrap_or_default(),
        vpn: vpn(payload),
    }
}

fn interfaces(payload: &Value) -> Vec<NetworkInterface> {
    first_array(payload, INTERFACES)
        .unwrap_or_default()
        .into_iter()
        .filter(|row| row.is_object())
        .map(|row| NetworkInterface {
            name: first_string(row, &["name", "interface", "description", "alias"]),
            ipv4: first_string(row, &["ipv4", "ipAddress", "address", "ipv4Address"]),
            ipv6: first_string(row, &["ipv6", "ipv6Address"]),
            mac: first_string(row, &["mac", "macAddress"]),
            is_active: first_flag(row, &["isActive", "active", "status", "connected"]),
            kind: first_string(row, &["type", "kind", "mediaType"]),
        })
        .collect()
}

/// First active, non-loopback IPv4 among the interfaces.
fn fallback_ip(interfaces: &[NetworkInterface]) -> Option<String> {
    interfaces
        .iter()
        .filter(|i| i.is_active != Some(false))
        .filter_map(|i| i.ipv4.as_deref())
        .find(|ip| !ip.starts_with("127.") && !ip.starts_with("169.254."))
        .map(str::to_string)
}

fn vpn(payload: &Value) -> Option<VpnInfo> {
    let raw = first_present(payload, VPN)?;
    let name = first_string(raw, &["name", "serviceName", "provider"]);
    let connected = match raw {
        Value::Object(_) => first_flag(raw, &["connected", "isConnected", "status", "state"]),
        other => read_flag(other),
    }?;
    Some(VpnInfo { connected, name })
}
