//! Driver configuration and machine rule tables.
//!
//! Rule tables are injected, never global: a host loads a [`RuleTable`] at
//! startup (typically from JSON shipped with the scene assets) and passes it
//! to a driver or passes rule slices directly into the pose operations.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::TwinError;
use crate::rule::JointRule;
use crate::tween::Easing;

/// Configuration for driver defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tween length used by `twin` when the caller gives none.
    pub default_duration_ms: f64,
    /// Sequence cadence used when the caller gives none.
    pub default_cadence_ms: f64,
    pub easing: Easing,
    /// Events beyond this count are dropped from one tick's outputs.
    pub max_events_per_tick: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_duration_ms: 500.0,
            default_cadence_ms: 500.0,
            easing: Easing::Linear,
            max_events_per_tick: 1024,
        }
    }
}

/// Reject a tween length that is negative or not finite. Zero lands on the first tick.
pub(crate) fn check_duration(what: &str, duration_ms: f64) -> Result<(), TwinError> {
    if duration_ms.is_finite() && duration_ms >= 0.0 {
        Ok(())
    } else {
        Err(TwinError::Config(format!(
            "{what} must be finite and >= 0, got {duration_ms}"
        )))
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), TwinError> {
        check_duration("default_duration_ms", self.default_duration_ms)?;
        if !(self.default_cadence_ms.is_finite() && self.default_cadence_ms > 0.0) {
            return Err(TwinError::Config(format!(
                "default_cadence_ms must be finite and > 0, got {}",
                self.default_cadence_ms
            )));
        }
        Ok(())
    }
}

/// Pacing of a chained playback.
///
/// `cadence_ms` is how often the next transition is scheduled;
/// `duration_ms` is how long each transition's tweens run. When `duration_ms`
/// is absent it equals the cadence, giving back-to-back transitions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequenceCfg {
    pub cadence_ms: f64,
    #[serde(default)]
    pub duration_ms: Option<f64>,
}

impl SequenceCfg {
    pub fn new(cadence_ms: f64) -> Self {
        Self {
            cadence_ms,
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration_ms.unwrap_or(self.cadence_ms)
    }

    /// Cadence must be finite and positive; duration finite and non-negative.
    pub fn validate(&self) -> Result<(), TwinError> {
        if !(self.cadence_ms.is_finite() && self.cadence_ms > 0.0) {
            return Err(TwinError::Config(format!(
                "cadence_ms must be finite and > 0, got {}",
                self.cadence_ms
            )));
        }
        check_duration("duration_ms", self.duration())
    }
}

/// Archetype name -> ordered joint rules.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable(HashMap<String, Vec<JointRule>>);

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(text: &str) -> Result<Self, TwinError> {
        let table: RuleTable =
            serde_json::from_str(text).map_err(|e| TwinError::Config(e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self, TwinError> {
        let table: RuleTable =
            serde_json::from_value(value).map_err(|e| TwinError::Config(e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    /// Reject rules that can never apply: empty node names and non-finite factors.
    pub fn validate(&self) -> Result<(), TwinError> {
        for (archetype, rules) in self.0.iter() {
            for (idx, rule) in rules.iter().enumerate() {
                if rule.node_name.is_empty() {
                    return Err(TwinError::Config(format!(
                        "{archetype}[{idx}]: empty nodeName"
                    )));
                }
                if !rule.reverse.is_finite() || !rule.correct.is_finite() {
                    return Err(TwinError::Config(format!(
                        "{archetype}[{idx}] ({}): reverse/correct must be finite",
                        rule.node_name
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, archetype: impl Into<String>, rules: Vec<JointRule>) {
        self.0.insert(archetype.into(), rules);
    }

    pub fn get(&self, archetype: &str) -> Option<&[JointRule]> {
        self.0.get(archetype).map(Vec::as_slice)
    }

    pub fn require(&self, archetype: &str) -> Result<&[JointRule], TwinError> {
        self.get(archetype)
            .ok_or_else(|| TwinError::UnknownArchetype(archetype.to_string()))
    }

    pub fn archetypes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Axis, MotionMode};

    #[test]
    fn config_defaults_fill_missing_fields() {
        let cfg: Config = serde_json::from_str(r#"{"default_duration_ms": 250}"#).unwrap();
        assert_eq!(cfg.default_duration_ms, 250.0);
        assert_eq!(cfg.default_cadence_ms, 500.0);
        assert_eq!(cfg.easing, Easing::Linear);
    }

    #[test]
    fn sequence_duration_defaults_to_cadence() {
        assert_eq!(SequenceCfg::new(200.0).duration(), 200.0);
        assert_eq!(SequenceCfg::new(200.0).with_duration(150.0).duration(), 150.0);
    }

    #[test]
    fn timing_must_be_finite() {
        assert!(Config::default().validate().is_ok());
        let nan_duration = Config {
            default_duration_ms: f64::NAN,
            ..Config::default()
        };
        assert!(matches!(nan_duration.validate(), Err(TwinError::Config(_))));
        let zero_cadence = Config {
            default_cadence_ms: 0.0,
            ..Config::default()
        };
        assert!(matches!(zero_cadence.validate(), Err(TwinError::Config(_))));

        assert!(SequenceCfg::new(100.0).with_duration(0.0).validate().is_ok());
        for bad in [
            SequenceCfg::new(f64::NAN),
            SequenceCfg::new(0.0),
            SequenceCfg::new(-5.0),
            SequenceCfg::new(f64::INFINITY),
            SequenceCfg::new(100.0).with_duration(f64::NAN),
            SequenceCfg::new(100.0).with_duration(-1.0),
        ] {
            assert!(matches!(bad.validate(), Err(TwinError::Config(_))), "{bad:?}");
        }
    }

    #[test]
    fn table_loads_and_looks_up() {
        let table = RuleTable::from_json_str(
            r#"{"slider": [{"nodeName": "carriage", "axis": "x", "mode": "move", "dataPath": "root.x"}]}"#,
        )
        .unwrap();
        let rules = table.require("slider").unwrap();
        assert_eq!(rules[0].axis, Axis::X);
        assert_eq!(rules[0].mode, MotionMode::Move);
        assert!(matches!(
            table.require("nope"),
            Err(TwinError::UnknownArchetype(a)) if a == "nope"
        ));
    }

    #[test]
    fn table_rejects_bad_rules() {
        assert!(matches!(
            RuleTable::from_json_str(r#"{"a": [{"nodeName": "", "axis": "x", "dataPath": "root.x"}]}"#),
            Err(TwinError::Config(_))
        ));
        assert!(matches!(
            RuleTable::from_json_str(r#"{"a": [{"nodeName": "n", "axis": "x"}]}"#),
            Err(TwinError::Config(_))
        ));
    }
}
