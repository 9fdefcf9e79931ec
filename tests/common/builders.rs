//! Test builders — ergonomic constructors for payloads and device fleets.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use fleetnorm_core::DeviceRecord;
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// PayloadBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for raw agent payloads addressed by dotted paths.
///
/// # Example
///
/// ```rust
/// let payload = PayloadBuilder::new()
///     .set("platform", "darwin")
///     .set("mdm_enrollment.server_url", "https://acme.kandji.io")
///     .build();
/// ```
#[derive(Default)]
pub struct PayloadBuilder {
    root: Map<String, Value>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing object payload.
    pub fn from_payload(payload: Value) -> Self {
        match payload {
            Value::Object(root) => Self { root },
            other => panic!("PayloadBuilder::from_payload needs an object, got {other}"),
        }
    }

    /// Set `path`, creating intermediate objects. Existing non-object nodes on
    /// the way are replaced.
    pub fn set(mut self, path: &str, value: impl Into<Value>) -> Self {
        let mut segments: Vec<&str> = path.split('.').collect();
        let last = segments.pop().expect("path must not be empty");
        let mut node = &mut self.root;
        for segment in segments {
            let entry = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            node = entry.as_object_mut().expect("just ensured an object");
        }
        node.insert(last.to_string(), value.into());
        self
    }

    pub fn remove(mut self, key: &str) -> Self {
        self.root.remove(key);
        self
    }

    pub fn build(self) -> Value {
        Value::Object(self.root)
    }
}

// ---------------------------------------------------------------------------
// Fleet builders
// ---------------------------------------------------------------------------

/// A device whose agent keeps a device-level error list.
pub fn device_with_errors(id: &str, errors: &[&str]) -> DeviceRecord {
    DeviceRecord::new(
        id,
        PayloadBuilder::new().set("installs.errors", errors.to_vec()).build(),
    )
}

/// A device whose agent keeps a device-level warning list.
pub fn device_with_warnings(id: &str, warnings: &[&str]) -> DeviceRecord {
    DeviceRecord::new(
        id,
        PayloadBuilder::new().set("installs.warnings", warnings.to_vec()).build(),
    )
}

/// A device reporting errors only on its install items, as
/// `(item name, errors)` pairs.
pub fn device_with_item_errors(id: &str, items: &[(&str, &[&str])]) -> DeviceRecord {
    let items: Vec<Value> = items
        .iter()
        .map(|(name, errors)| serde_json::json!({"name": name, "errors": errors}))
        .collect();
    DeviceRecord::new(id, PayloadBuilder::new().set("installs.items", items).build())
}
