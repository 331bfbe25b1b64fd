//! Telemetry values: the typed form of one untyped telemetry record.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// One level of a telemetry record, keyed by segment (or by a dot-joined
/// run of segments when the producer flattened part of the record).
pub type TelemetryMap = HashMap<String, TelemetryValue>;

/// A telemetry leaf or container.
///
/// Deserialises from plain JSON without tags: numbers, booleans, strings,
/// `null`, arrays and objects map onto the matching variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<TelemetryValue>),
    Map(TelemetryMap),
}

impl TelemetryValue {
    #[inline]
    pub fn as_map(&self) -> Option<&TelemetryMap> {
        match self {
            TelemetryValue::Map(m) => Some(m),
            _ => None,
        }
    }

    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, TelemetryValue::Map(_) | TelemetryValue::List(_))
    }

    /// Short, human-readable kind name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TelemetryValue::Null => "null",
            TelemetryValue::Bool(_) => "bool",
            TelemetryValue::Number(_) => "number",
            TelemetryValue::Text(_) => "text",
            TelemetryValue::List(_) => "list",
            TelemetryValue::Map(_) => "map",
        }
    }
}

impl From<f64> for TelemetryValue {
    fn from(v: f64) -> Self {
        TelemetryValue::Number(v)
    }
}

impl From<bool> for TelemetryValue {
    fn from(v: bool) -> Self {
        TelemetryValue::Bool(v)
    }
}

impl From<&str> for TelemetryValue {
    fn from(v: &str) -> Self {
        TelemetryValue::Text(v.to_string())
    }
}

impl From<TelemetryMap> for TelemetryValue {
    fn from(v: TelemetryMap) -> Self {
        TelemetryValue::Map(v)
    }
}

/// One telemetry record: the machine's joint state at an instant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TelemetrySnapshot(pub TelemetryMap);

impl TelemetrySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for tests and host glue.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<TelemetryValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<TelemetryValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&TelemetryValue> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &TelemetryMap {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Collapse every nested level into dot-joined keys at the top level.
    ///
    /// List items are keyed by their index. Empty containers are kept as
    /// leaves so that no key disappears from the record.
    pub fn flatten(&self) -> TelemetrySnapshot {
        let mut out = TelemetryMap::new();
        for (key, value) in self.0.iter() {
            flatten_into(&mut out, key, value);
        }
        TelemetrySnapshot(out)
    }
}

impl From<TelemetryMap> for TelemetrySnapshot {
    fn from(map: TelemetryMap) -> Self {
        TelemetrySnapshot(map)
    }
}

fn flatten_into(out: &mut TelemetryMap, prefix: &str, value: &TelemetryValue) {
    match value {
        TelemetryValue::Map(m) if !m.is_empty() => {
            for (k, v) in m.iter() {
                flatten_into(out, &format!("{prefix}.{k}"), v);
            }
        }
        TelemetryValue::List(items) if !items.is_empty() => {
            for (i, v) in items.iter().enumerate() {
                flatten_into(out, &format!("{prefix}.{i}"), v);
            }
        }
        leaf => {
            out.insert(prefix.to_string(), leaf.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_json_maps_onto_variants() {
        let v: TelemetryValue =
            serde_json::from_str(r#"{"a": 1.5, "b": true, "c": "x", "d": null, "e": [1, 2]}"#)
                .unwrap();
        let m = v.as_map().unwrap();
        assert_eq!(m.get("a"), Some(&TelemetryValue::Number(1.5)));
        assert_eq!(m.get("b"), Some(&TelemetryValue::Bool(true)));
        assert_eq!(m.get("c"), Some(&TelemetryValue::Text("x".into())));
        assert_eq!(m.get("d"), Some(&TelemetryValue::Null));
        assert!(matches!(m.get("e"), Some(TelemetryValue::List(items)) if items.len() == 2));
    }

    #[test]
    fn flatten_joins_nested_keys() {
        let snap: TelemetrySnapshot =
            serde_json::from_str(r#"{"arm": {"j1": 3, "wrist": {"roll": 4}}, "base": 1}"#).unwrap();
        let flat = snap.flatten();
        assert_eq!(flat.len(), 3);
        assert_eq!(flat.get("arm.j1"), Some(&TelemetryValue::Number(3.0)));
        assert_eq!(flat.get("arm.wrist.roll"), Some(&TelemetryValue::Number(4.0)));
        assert_eq!(flat.get("base"), Some(&TelemetryValue::Number(1.0)));
    }

    #[test]
    fn flatten_keeps_empty_containers() {
        let snap: TelemetrySnapshot = serde_json::from_str(r#"{"arm": {}}"#).unwrap();
        let flat = snap.flatten();
        assert_eq!(flat.get("arm"), Some(&TelemetryValue::Map(TelemetryMap::new())));
    }
}
