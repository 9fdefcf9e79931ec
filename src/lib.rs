//! fleetnorm — fleet telemetry normalization.
//!
//! Turns raw Windows and macOS agent payloads into canonical device records
//! and fleet-wide message breakdowns. The engine lives in `fleetnorm-core`;
//! this crate adds file loading and the command implementations behind the
//! `fleetnorm` binary so integration tests can drive them directly.

pub mod commands;
