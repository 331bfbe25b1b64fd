//! Data-path resolution against nested, flat, or partially flattened snapshots.
//!
//! At each map level the resolver tries the immediate segment first (nested
//! lookup) and then progressively longer dot-joined runs of the remaining
//! segments, ending with all of them joined (flat lookup). The first run that
//! leads to a leaf wins. The same rule is applied again inside every nested
//! level, so a record may be flattened at any depth.

use std::borrow::Cow;

use thiserror::Error;

use crate::coercion::to_number;
use crate::{DataPath, TelemetryMap, TelemetrySnapshot, TelemetryValue};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("missing telemetry path '{path}'")]
    MissingTelemetryPath { path: String },
    #[error("telemetry path '{path}' holds a non-numeric {found} value")]
    InvalidNumericValue { path: String, found: &'static str },
}

impl ResolveError {
    pub fn path(&self) -> &str {
        match self {
            ResolveError::MissingTelemetryPath { path } => path,
            ResolveError::InvalidNumericValue { path, .. } => path,
        }
    }
}

/// Resolve a path to its raw leaf without coercion.
pub fn resolve_value<'a>(
    snapshot: &'a TelemetrySnapshot,
    path: &DataPath,
) -> Option<&'a TelemetryValue> {
    lookup_in_map(snapshot.as_map(), path.segments())
}

/// Resolve a path to a finite number.
pub fn resolve(snapshot: &TelemetrySnapshot, path: &DataPath) -> Result<f64, ResolveError> {
    let leaf = resolve_value(snapshot, path).ok_or_else(|| ResolveError::MissingTelemetryPath {
        path: path.to_string(),
    })?;
    to_number(leaf).ok_or_else(|| ResolveError::InvalidNumericValue {
        path: path.to_string(),
        found: leaf.kind_name(),
    })
}

fn lookup_in_map<'a>(map: &'a TelemetryMap, segs: &[String]) -> Option<&'a TelemetryValue> {
    for run in 1..=segs.len() {
        let key: Cow<'_, str> = if run == 1 {
            Cow::Borrowed(segs[0].as_str())
        } else {
            Cow::Owned(segs[..run].join("."))
        };
        let Some(found) = map.get(key.as_ref()) else {
            continue;
        };
        if run == segs.len() {
            return Some(found);
        }
        if let Some(leaf) = lookup_in(found, &segs[run..]) {
            return Some(leaf);
        }
    }
    None
}

fn lookup_in<'a>(value: &'a TelemetryValue, segs: &[String]) -> Option<&'a TelemetryValue> {
    match value {
        TelemetryValue::Map(m) => lookup_in_map(m, segs),
        TelemetryValue::List(items) => {
            let idx: usize = segs[0].parse().ok()?;
            let item = items.get(idx)?;
            if segs.len() == 1 {
                Some(item)
            } else {
                lookup_in(item, &segs[1..])
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(json: &str) -> TelemetrySnapshot {
        serde_json::from_str(json).unwrap()
    }

    fn path(s: &str) -> DataPath {
        DataPath::parse(s).unwrap()
    }

    #[test]
    fn nested_and_flat_resolve_the_same() {
        let nested = snap(r#"{"joint1": {"x": 3}}"#);
        let flat = snap(r#"{"joint1.x": 3}"#);
        assert_eq!(resolve(&nested, &path("root.joint1.x")), Ok(3.0));
        assert_eq!(resolve(&flat, &path("root.joint1.x")), Ok(3.0));
    }

    #[test]
    fn partially_flattened_inner_level() {
        let s = snap(r#"{"robot": {"arm.j2": 7, "base": {"yaw": 1}}}"#);
        assert_eq!(resolve(&s, &path("root.robot.arm.j2")), Ok(7.0));
        assert_eq!(resolve(&s, &path("root.robot.base.yaw")), Ok(1.0));
    }

    #[test]
    fn flat_prefix_then_nested_rest() {
        let s = snap(r#"{"robot.arm": {"j2": 5}}"#);
        assert_eq!(resolve(&s, &path("robot.arm.j2")), Ok(5.0));
    }

    #[test]
    fn nested_dead_end_falls_back_to_flat_key() {
        let s = snap(r#"{"a": {"other": 1}, "a.b": 2}"#);
        assert_eq!(resolve(&s, &path("a.b")), Ok(2.0));
    }

    #[test]
    fn list_items_are_indexed() {
        let s = snap(r#"{"joints": [10, 20, {"v": 30}]}"#);
        assert_eq!(resolve(&s, &path("joints.1")), Ok(20.0));
        assert_eq!(resolve(&s, &path("joints.2.v")), Ok(30.0));
        assert!(resolve(&s, &path("joints.9")).is_err());
    }

    #[test]
    fn missing_and_invalid_are_distinguished() {
        let s = snap(r#"{"j1": "abc", "j2": {"x": 1}}"#);
        assert_eq!(
            resolve(&s, &path("root.nope")),
            Err(ResolveError::MissingTelemetryPath {
                path: "root.nope".into()
            })
        );
        assert_eq!(
            resolve(&s, &path("root.j1")),
            Err(ResolveError::InvalidNumericValue {
                path: "root.j1".into(),
                found: "text"
            })
        );
        assert!(matches!(
            resolve(&s, &path("root.j2")),
            Err(ResolveError::InvalidNumericValue { found: "map", .. })
        ));
    }

    #[test]
    fn leaf_with_trailing_segments_is_missing() {
        let s = snap(r#"{"j1": 4}"#);
        assert!(matches!(
            resolve(&s, &path("j1.x")),
            Err(ResolveError::MissingTelemetryPath { .. })
        ));
    }
}
