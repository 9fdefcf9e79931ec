//! Proptest strategies for generated agent payloads.
//!
//! [`arb_payload`] produces arbitrary JSON trees with a mix of snake_case and
//! camelCase keys. [`arb_device_payload`] places hostile leaves (huge numeric
//! strings, odd units, wrong shapes) at the paths the extractors actually
//! read, so extraction and aggregation see them instead of noise.

use proptest::prelude::*;
use serde_json::{json, Map, Value};

pub fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,6}(_[a-z0-9]{1,4}){0,3}",
        "[A-Z][a-zA-Z]{0,8}",
        "[a-z]{1,4}[A-Z][a-z]{1,4}",
    ]
}

pub fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9 .]{0,12}".prop_map(Value::String),
        prop_oneof![Just("true"), Just("False"), Just("@{A=1; b_c=x}"), Just("@{broken")]
            .prop_map(|s| Value::String(s.to_string())),
    ]
}

pub fn arb_payload() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(arb_key(), inner, 0..5)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Numbers and numeric strings at and beyond the edges of `u32`/`u64`/`f64`.
pub fn arb_extreme_number() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<u64>().prop_map(|n| json!(n)),
        any::<i64>().prop_map(|n| json!(n)),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(|f| json!(f)),
        "[0-9]{1,40}".prop_map(Value::String),
        "-?[0-9]{1,30}\\.[0-9]{1,6}".prop_map(Value::String),
        ("[0-9]{1,30}", prop::sample::select(vec!["B", "KB", "GB", "TB", "PB", "GiB", "PiB"]))
            .prop_map(|(n, unit)| Value::String(format!("{n} {unit}"))),
        Just(Value::String("1e400".to_string())),
        Just(Value::String("NaN".to_string())),
    ]
}

/// Any leaf, extreme number, or small nested structure.
fn arb_field() -> impl Strategy<Value = Value> {
    prop_oneof![
        3 => arb_extreme_number(),
        2 => arb_leaf(),
        1 => arb_payload(),
    ]
}

fn arb_drive() -> impl Strategy<Value = Value> {
    (arb_field(), arb_field(), arb_field(), arb_field()).prop_map(|(name, capacity, free, internal)| {
        json!({
            "name": name,
            "capacity": capacity,
            "free_space": free,
            "is_internal": internal
        })
    })
}

fn arb_message_list() -> impl Strategy<Value = Value> {
    prop::collection::vec(
        prop_oneof![
            "[a-z ]{0,10}".prop_map(Value::String),
            arb_field(),
            arb_field().prop_map(|m| json!({"message": m})),
        ],
        0..5,
    )
    .prop_map(Value::Array)
}

fn arb_install_item() -> impl Strategy<Value = Value> {
    (arb_field(), arb_message_list(), arb_message_list()).prop_map(|(name, errors, warnings)| {
        json!({"name": name, "errors": errors, "warnings": warnings})
    })
}

/// A payload whose well-known paths carry hostile values.
pub fn arb_device_payload() -> impl Strategy<Value = Value> {
    (
        prop::sample::select(vec!["darwin", "Windows", "linux", ""]),
        prop::collection::vec(arb_drive(), 0..4),
        (arb_field(), arb_field(), arb_field(), arb_field()),
        (arb_field(), arb_field(), arb_field()),
        prop::collection::vec(arb_install_item(), 0..4),
        prop_oneof![Just(None), arb_message_list().prop_map(Some)],
        arb_payload(),
    )
        .prop_map(
            |(platform, drives, (cpu, gpu, memory, processor), (check_in, url, login), items, device_errors, extra)| {
                let mut installs = Map::new();
                installs.insert("items".to_string(), Value::Array(items));
                if let Some(errors) = device_errors {
                    installs.insert("errors".to_string(), errors);
                }
                let mut payload = json!({
                    "platform": platform,
                    "hardware": {
                        "cpu_cores": cpu,
                        "gpu_cores": gpu,
                        "memory": memory,
                        "processor": processor
                    },
                    "storage": drives,
                    "mdm_enrollment": {"server_url": url, "last_check_in": check_in},
                    "login_history": [{"user": "ada", "time": login}],
                    "installs": Value::Object(installs),
                });
                if let (Value::Object(target), Value::Object(noise)) = (&mut payload, extra) {
                    for (key, value) in noise {
                        target.entry(key).or_insert(value);
                    }
                }
                payload
            },
        )
}
