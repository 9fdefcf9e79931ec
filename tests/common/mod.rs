//! Shared test utilities for fleetnorm integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. Fixtures are plain `serde_json::Value` payloads so every
//! harness can feed them straight into the engine.

pub mod assertions;
pub mod builders;
pub mod fixtures;
pub mod strategies;

pub use builders::*;
pub use fixtures::*;
pub use strategies::*;
