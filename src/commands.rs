//! Command implementations for the `fleetnorm` binary.
//!
//! Each command reads device payload files, runs them through the core engine
//! and returns a serializable result; printing is left to the caller.

use anyhow::{bail, Context, Result};
use fleetnorm_core::aggregate::{aggregate, messages_for_item, DeviceRecord, MessageGroup, NoLabels};
use fleetnorm_core::extract::{DeviceSummary, Extractor, MessageKind};
use fleetnorm_core::{Config, Diagnostic, Normalizer};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The engine configured from a [`Config`].
#[derive(Debug, Clone)]
pub struct Engine {
    normalizer: Normalizer,
    extractor: Extractor,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(&Config::defaults())
    }
}

impl Engine {
    pub fn new(config: &Config) -> Self {
        Self {
            normalizer: Normalizer::from_config(&config.normalize),
            extractor: Extractor::from_config(config),
        }
    }

    /// Normalize a payload, logging every embedded object that failed to
    /// decode. The undecodable string is kept as-is.
    pub fn normalize(&self, raw: &Value, source: &Path) -> Value {
        let mut report = |diagnostic: Diagnostic| {
            tracing::warn!(file = %source.display(), "{diagnostic}");
        };
        self.normalizer.normalize_with(raw, &mut report)
    }

    pub fn normalize_file(&self, path: &Path) -> Result<Value> {
        let raw = read_payload(path)?;
        Ok(self.normalize(&raw, path))
    }

    pub fn summarize_file(&self, path: &Path) -> Result<DeviceSummary> {
        let payload = self.normalize_file(path)?;
        let summary = self.extractor.device(&payload);
        tracing::debug!(
            file = %path.display(),
            platform = %summary.platform,
            items = summary.installs.total_items,
            "summarized device"
        );
        Ok(summary)
    }

    /// Load a device for aggregation. Its id is the reported serial number,
    /// or the file stem when the payload has none.
    pub fn load_device(&self, path: &Path) -> Result<DeviceRecord> {
        let payload = self.normalize_file(path)?;
        let id = self
            .extractor
            .identity(&payload)
            .serial_number
            .or_else(|| file_stem(path))
            .with_context(|| format!("cannot derive a device id for {}", path.display()))?;
        Ok(DeviceRecord::new(id, payload))
    }

    pub fn aggregate_files(&self, request: &AggregateRequest) -> Result<Vec<MessageGroup>> {
        if request.files.is_empty() {
            bail!("no device payload files given");
        }
        let devices = request
            .files
            .iter()
            .map(|path| self.load_device(path))
            .collect::<Result<Vec<_>>>()?;
        tracing::info!(devices = devices.len(), kind = %request.kind, "aggregating messages");

        let groups = match (&request.item, &request.labels) {
            (Some(item), Some(labels)) => messages_for_item(&devices, item, request.kind, labels),
            (Some(item), None) => messages_for_item(&devices, item, request.kind, &NoLabels),
            (None, Some(labels)) => aggregate(&devices, request.kind, labels),
            (None, None) => aggregate(&devices, request.kind, &NoLabels),
        };
        tracing::debug!(groups = groups.len(), "aggregation finished");
        Ok(groups)
    }
}

/// Inputs of the `aggregate` command.
#[derive(Debug, Clone)]
pub struct AggregateRequest {
    pub files: Vec<PathBuf>,
    pub kind: MessageKind,
    pub item: Option<String>,
    pub labels: Option<HashMap<String, String>>,
}

pub fn read_payload(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {} as JSON", path.display()))
}

/// Read a device-id → label map from a JSON object file. Non-string values
/// are ignored.
pub fn read_labels(path: &Path) -> Result<HashMap<String, String>> {
    match read_payload(path)? {
        Value::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(id, label)| match label {
                Value::String(label) => Some((id, label)),
                _ => None,
            })
            .collect()),
        _ => bail!("{} must contain a JSON object of device id to label", path.display()),
    }
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
}

/// Render a result as pretty or single-line JSON.
pub fn render<T: serde::Serialize>(value: &T, compact: bool) -> Result<String> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(text)
}
