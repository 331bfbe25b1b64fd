//! rigtwin-telemetry-core: telemetry snapshots and data-path resolution (engine-agnostic)
//!
//! Snapshots arrive as untyped records, either nested (`{"arm": {"j1": 3}}`) or
//! flattened (`{"arm.j1": 3}`). This crate gives them a typed shape and resolves
//! dotted data paths against either representation.

pub mod coercion;
pub mod json;
pub mod path;
pub mod resolve;
pub mod value;

pub use coercion::to_number;
pub use path::{DataPath, PathError, ROOT_TOKEN};
pub use resolve::{resolve, resolve_value, ResolveError};
pub use value::{TelemetryMap, TelemetrySnapshot, TelemetryValue};
