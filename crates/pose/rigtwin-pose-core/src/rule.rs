//! Joint rules: declarative mapping from one telemetry path to one axis of
//! motion on one named scene node.
//!
//! Rule tables are plain data, versioned alongside the scene assets. A rule
//! serialises with camelCase keys:
//!
//! ```json
//! { "nodeName": "elbow", "dataPath": "root.joints.j3", "axis": "z",
//!   "mode": "rotate", "reverse": -1, "correct": 0.0, "unit": "deg" }
//! ```

use serde::{Deserialize, Serialize};

use rigtwin_telemetry::{DataPath, PathError};

use crate::scene::{NodeTransform, Vec3};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Whether a rule drives the node's local position or local rotation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionMode {
    Move,
    #[default]
    Rotate,
}

/// Unit of raw telemetry for rotate rules. Ignored for move rules.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    #[default]
    Deg,
    Rad,
}

impl AngleUnit {
    /// Multiplier that turns a raw value in this unit into radians.
    #[inline]
    pub fn to_radians_factor(self) -> f64 {
        match self {
            AngleUnit::Deg => std::f64::consts::PI / 180.0,
            AngleUnit::Rad => 1.0,
        }
    }
}

fn default_reverse() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JointRule {
    pub node_name: String,
    pub data_path: DataPath,
    pub axis: Axis,
    #[serde(default)]
    pub mode: MotionMode,
    /// Sign applied to the raw value (normally +1 or -1).
    #[serde(default = "default_reverse")]
    pub reverse: f64,
    /// Additive offset applied after sign and unit conversion.
    #[serde(default)]
    pub correct: f64,
    #[serde(default)]
    pub unit: AngleUnit,
}

impl JointRule {
    pub fn new(
        node_name: impl Into<String>,
        data_path: &str,
        axis: Axis,
        mode: MotionMode,
    ) -> Result<Self, PathError> {
        Ok(Self {
            node_name: node_name.into(),
            data_path: DataPath::parse(data_path)?,
            axis,
            mode,
            reverse: 1.0,
            correct: 0.0,
            unit: AngleUnit::Deg,
        })
    }

    pub fn rotate(node_name: impl Into<String>, data_path: &str, axis: Axis) -> Result<Self, PathError> {
        Self::new(node_name, data_path, axis, MotionMode::Rotate)
    }

    pub fn translate(
        node_name: impl Into<String>,
        data_path: &str,
        axis: Axis,
    ) -> Result<Self, PathError> {
        Self::new(node_name, data_path, axis, MotionMode::Move)
    }

    pub fn with_reverse(mut self, reverse: f64) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn with_correct(mut self, correct: f64) -> Self {
        self.correct = correct;
        self
    }

    pub fn with_unit(mut self, unit: AngleUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Map a raw telemetry value onto the node channel value.
    ///
    /// move:   raw * reverse + correct
    /// rotate: raw * reverse * unit_factor + correct (radians)
    #[inline]
    pub fn joint_value(&self, raw: f64) -> f64 {
        match self.mode {
            MotionMode::Move => raw * self.reverse + self.correct,
            MotionMode::Rotate => raw * self.reverse * self.unit.to_radians_factor() + self.correct,
        }
    }

    /// Read the current value of this rule's channel.
    #[inline]
    pub fn read(&self, transform: &NodeTransform) -> f64 {
        channel_of(transform, self.mode).get(self.axis)
    }

    /// Write `value` on this rule's channel; the other two axes are untouched.
    #[inline]
    pub fn write(&self, transform: &mut NodeTransform, value: f64) {
        write_channel(transform, self.mode, self.axis, value);
    }
}

#[inline]
pub(crate) fn channel_of(transform: &NodeTransform, mode: MotionMode) -> &Vec3 {
    match mode {
        MotionMode::Move => &transform.position,
        MotionMode::Rotate => &transform.rotation,
    }
}

#[inline]
pub(crate) fn write_channel(transform: &mut NodeTransform, mode: MotionMode, axis: Axis, value: f64) {
    let target = match mode {
        MotionMode::Move => &mut transform.position,
        MotionMode::Rotate => &mut transform.rotation,
    };
    target.set(axis, value);
}
