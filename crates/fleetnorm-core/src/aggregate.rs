//! Message aggregation across a fleet.
//!
//! Groups identical error or warning strings reported by many devices so the
//! most widespread problems surface first. Grouping is exact string equality;
//! `count` totals every occurrence while `devices` lists each reporting device
//! once, in the order the devices were first seen.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::extract::identity::device_name;
use crate::extract::installs::{collect_messages, install_items, item_messages, item_name};
use crate::extract::MessageKind;

/// One device's payload, keyed by a caller-chosen id.
///
/// Each record is a separate device. Records sharing an id are not merged
/// unless they are adjacent, so callers should merge duplicates beforehand.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRecord {
    pub id: String,
    pub payload: Value,
}

impl DeviceRecord {
    pub fn new(id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceRef {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageGroup {
    pub message: String,
    pub count: usize,
    pub devices: Vec<DeviceRef>,
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Supplies display labels for device ids.
pub trait DeviceLabeler {
    fn label(&self, device_id: &str) -> Option<String>;
}

impl DeviceLabeler for HashMap<String, String> {
    fn label(&self, device_id: &str) -> Option<String> {
        self.get(device_id).cloned()
    }
}

impl<F> DeviceLabeler for F
where
    F: Fn(&str) -> Option<String>,
{
    fn label(&self, device_id: &str) -> Option<String> {
        self(device_id)
    }
}

/// Labels every device by its reported name, falling back to its id.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLabels;

impl DeviceLabeler for NoLabels {
    fn label(&self, _device_id: &str) -> Option<String> {
        None
    }
}

fn device_ref(record: &DeviceRecord, labeler: &impl DeviceLabeler) -> DeviceRef {
    let label = labeler
        .label(&record.id)
        .filter(|l| !l.trim().is_empty())
        .or_else(|| device_name(&record.payload))
        .unwrap_or_else(|| record.id.clone());
    DeviceRef {
        id: record.id.clone(),
        label,
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Groups {
    groups: Vec<MessageGroup>,
    index: HashMap<String, usize>,
}

impl Groups {
    fn add(&mut self, message: String, device: &DeviceRef) {
        let slot = match self.index.get(&message) {
            Some(&slot) => slot,
            None => {
                self.index.insert(message.clone(), self.groups.len());
                self.groups.push(MessageGroup {
                    message,
                    count: 0,
                    devices: Vec::new(),
                });
                self.groups.len() - 1
            }
        };
        let group = &mut self.groups[slot];
        group.count += 1;
        // Devices arrive one at a time, so a repeat can only be the last entry.
        if !group.devices.last().is_some_and(|d| d.id == device.id) {
            group.devices.push(device.clone());
        }
    }

    /// Most frequent first; the sort is stable so ties keep first-seen order.
    fn finish(mut self) -> Vec<MessageGroup> {
        self.groups.sort_by(|a, b| b.count.cmp(&a.count));
        self.groups
    }
}

fn group_by<L, F>(devices: &[DeviceRecord], labeler: &L, mut messages: F) -> Vec<MessageGroup>
where
    L: DeviceLabeler,
    F: FnMut(&Value) -> Vec<String>,
{
    let mut groups = Groups::default();
    for record in devices {
        let found = messages(&record.payload);
        if found.is_empty() {
            continue;
        }
        let device = device_ref(record, labeler);
        for message in found {
            groups.add(message, &device);
        }
    }
    groups.finish()
}

/// Group every `kind` message across `devices`.
///
/// Each device contributes its device-level list when it has one and its
/// per-item lists otherwise.
pub fn aggregate(devices: &[DeviceRecord], kind: MessageKind, labeler: &impl DeviceLabeler) -> Vec<MessageGroup> {
    group_by(devices, labeler, |payload| collect_messages(payload, kind))
}

/// Like [`aggregate`], restricted to install items named `item` (trimmed,
/// case-insensitive). Device-level lists are not tied to an item and are not
/// consulted.
pub fn messages_for_item(
    devices: &[DeviceRecord],
    item: &str,
    kind: MessageKind,
    labeler: &impl DeviceLabeler,
) -> Vec<MessageGroup> {
    let wanted = item.trim().to_lowercase();
    group_by(devices, labeler, |payload| {
        install_items(payload)
            .into_iter()
            .filter(|raw| item_name(raw).is_some_and(|name| name.trim().to_lowercase() == wanted))
            .flat_map(|raw| item_messages(raw, kind))
            .collect()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
