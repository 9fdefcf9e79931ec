//! Hardware — model, processor, memory and storage.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

use super::{first_flag, format_bytes, parse_capacity, positive_count};
use crate::paths::{first_array, first_present, first_string};
use crate::platform::Platform;

const MANUFACTURER: &[&str] = &[
    "hardware.manufacturer",
    "hardware.vendor",
    "systemInfo.hardwareVendor",
    "system.hardwareVendor",
    "computerSystem.manufacturer",
    "manufacturer",
];
const MODEL: &[&str] = &[
    "hardware.model",
    "hardware.modelName",
    "systemInfo.hardwareModel",
    "system.hardwareModel",
    "computerSystem.model",
    "model",
];
const MODEL_IDENTIFIER: &[&str] = &["hardware.modelIdentifier", "modelIdentifier"];
const PROCESSOR: &[&str] = &[
    "hardware.processor.name",
    "hardware.processor",
    "hardware.processorName",
    "hardware.cpu.name",
    "hardware.cpuBrand",
    "cpu.brand",
    "cpu.name",
    "processor.name",
    "processor",
    "systemInfo.cpuBrand",
    "system.cpuBrand",
];
const ARCHITECTURE: &[&str] = &[
    "hardware.architecture",
    "hardware.cpu.architecture",
    "architecture",
    "cpu.architecture",
    "systemInfo.cpuType",
    "system.arch",
    "os.arch",
];
const CPU_CORES: &[&str] = &[
    "hardware.cpuCores",
    "hardware.processor.cores",
    "hardware.cpu.cores",
    "hardware.numberOfCores",
    "cpu.cores",
    "cpu.physicalCores",
    "processor.numberOfCores",
    "systemInfo.cpuPhysicalCores",
    "system.cpuPhysicalCores",
];
const GPU_CORES: &[&str] = &[
    "hardware.gpuCores",
    "hardware.graphics.cores",
    "hardware.graphics.0.cores",
    "gpu.cores",
    "graphics.0.cores",
];
const GPU_NAME: &[&str] = &[
    "hardware.gpu",
    "hardware.graphics.name",
    "hardware.graphics.0.name",
    "gpu.name",
    "graphics.0.name",
    "videoController.name",
];
const MEMORY: &[&str] = &[
    "hardware.memory.total",
    "hardware.memory",
    "hardware.physicalMemory",
    "hardware.totalMemory",
    "memory.total",
    "memory.physicalTotal",
    "systemInfo.physicalMemory",
    "system.physicalMemory",
    "physicalMemory",
    "totalMemory",
];
const DRIVES: &[&str] = &[
    "hardware.storage.drives",
    "hardware.storage",
    "storage.drives",
    "storage",
    "hardware.disks",
    "disks",
    "logicalDisks",
    "volumes",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareSummary {
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_cores: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_cores: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_display: Option<String>,
    /// Heuristic: positive CPU and GPU core counts on an Apple Silicon
    /// processor. Agents do not report unified memory directly.
    pub unified_memory: bool,
    pub drives: Vec<StorageDrive>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageTotals>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageDrive {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_internal: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// Totals over internal drives only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageTotals {
    pub internal_drives: usize,
    pub capacity_bytes: u64,
    pub free_bytes: u64,
    pub used_bytes: u64,
    pub used_percent: f64,
    pub capacity_display: String,
    pub free_display: String,
}

fn apple_silicon_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bapple\s+m[1-9]\b|^\s*m[1-9](?:\s+(?:pro|max|ultra))?\s*$")
            .expect("valid apple silicon regex")
    })
}

pub(crate) fn extract(payload: &Value, platform: Platform) -> HardwareSummary {
    let processor = first_string(payload, PROCESSOR);
    let cpu_cores = positive_count(payload, CPU_CORES);
    let gpu_cores = positive_count(payload, GPU_CORES);
    let memory_bytes = first_present(payload, MEMORY).and_then(|m| parse_capacity(m, true));
    let drives = drives(payload);

    HardwareSummary {
        platform,
        manufacturer: first_string(payload, MANUFACTURER),
        model: first_string(payload, MODEL),
        model_identifier: first_string(payload, MODEL_IDENTIFIER),
        architecture: first_string(payload, ARCHITECTURE),
        unified_memory: is_unified_memory(processor.as_deref(), cpu_cores, gpu_cores),
        processor,
        cpu_cores,
        gpu_cores,
        gpu_name: first_string(payload, GPU_NAME),
        memory_display: memory_bytes.map(|b| format_bytes(b, true)),
        memory_bytes,
        storage: storage_totals(&drives),
        drives,
    }
}

fn is_unified_memory(processor: Option<&str>, cpu_cores: Option<u32>, gpu_cores: Option<u32>) -> bool {
    cpu_cores.is_some()
        && gpu_cores.is_some()
        && processor.is_some_and(|p| apple_silicon_re().is_match(p))
}

fn drives(payload: &Value) -> Vec<StorageDrive> {
    first_array(payload, DRIVES)
        .unwrap_or_default()
        .into_iter()
        .filter(|row| row.is_object())
        .map(|row| StorageDrive {
            name: first_string(row, &["name", "deviceId", "volumeName", "mountPoint", "label"]),
            capacity_bytes: first_present(row, &["capacity", "size", "totalSize", "totalBytes"])
                .and_then(|v| parse_capacity(v, false)),
            free_bytes: first_present(row, &["freeSpace", "free", "freeBytes", "available"])
                .and_then(|v| parse_capacity(v, false)),
            is_internal: first_flag(row, &["isInternal", "internal"]),
            file_system: first_string(row, &["fileSystem", "format"]),
            media_type: first_string(row, &["mediaType", "driveType", "kind"]),
        })
        .collect()
}

fn storage_totals(drives: &[StorageDrive]) -> Option<StorageTotals> {
    let counted: Vec<(u64, u64)> = drives
        .iter()
        .filter(|d| d.is_internal == Some(true))
        .filter_map(|d| Some((d.capacity_bytes?, d.free_bytes?)))
        .collect();
    if counted.is_empty() {
        return None;
    }
    // Oversized reports saturate at u64::MAX, so the sums saturate too.
    let capacity = counted.iter().fold(0u64, |acc, (c, _)| acc.saturating_add(*c));
    let free = counted.iter().fold(0u64, |acc, (_, f)| acc.saturating_add(*f));
    let used = capacity.saturating_sub(free);
    Some(StorageTotals {
        internal_drives: counted.len(),
        capacity_bytes: capacity,
        free_bytes: free,
        used_bytes: used,
        used_percent: (used as f64 / capacity as f64 * 1000.0).round() / 10.0,
        capacity_display: format_bytes(capacity, false),
        free_display: format_bytes(free, false),
    })
}
