//! fleetnorm-core — fleet telemetry normalization library.
//!
//! This crate exposes the pipeline stages as public modules, plus the typed
//! summaries the extractors produce.
//!
//! # Architecture
//!
//! ```text
//! raw payload ──► decoder ──► keys ──► normalizer ──► extract ──► summaries
//!                                           │
//!                                           └──► aggregate (many devices)
//! ```
//!
//! Every operation is synchronous and pure: inputs are borrowed, outputs are
//! fresh values, and nothing logs. Diagnostics about undecodable embedded
//! objects are handed to a caller-supplied sink (see
//! [`normalizer::Normalizer::normalize_with`]).

pub mod aggregate;
pub mod coercion;
pub mod config;
pub mod decoder;
pub mod extract;
pub mod keys;
pub mod normalizer;
pub mod paths;
pub mod platform;
pub mod temporal;

pub use aggregate::{aggregate, messages_for_item, DeviceLabeler, DeviceRecord, DeviceRef, MessageGroup, NoLabels};
pub use config::Config;
pub use decoder::{DecodeError, Diagnostic};
pub use extract::{extract_device, DeviceSummary, Extractor, MessageKind};
pub use normalizer::{normalize_payload, Normalizer};
pub use platform::{detect_platform, Platform};
pub use temporal::{parse_temporal, TemporalParser, TemporalValue};
