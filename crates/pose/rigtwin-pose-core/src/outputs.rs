//! Output contracts from the driver.
//!
//! Outputs carry the channel writes made this tick, keyed by node name, and a
//! separate list of semantic events. Adapters mirror the writes onto the host
//! scene and forward events to whoever is listening.

use serde::{Deserialize, Serialize};

use crate::error::SkippedRule;
use crate::ids::{SequenceId, TaskId};
use crate::rule::{Axis, MotionMode};

/// One channel write on one node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub node: String,
    pub mode: MotionMode,
    pub axis: Axis,
    pub value: f64,
}

/// Discrete signals emitted while applying, twinning and sequencing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TwinEvent {
    TaskScheduled {
        task: TaskId,
        node: String,
        mode: MotionMode,
        axis: Axis,
        from: f64,
        to: f64,
        duration_ms: f64,
    },
    TaskCompleted {
        task: TaskId,
        node: String,
    },
    /// A newer task took over the same node channel.
    TaskSuperseded {
        task: TaskId,
        by: TaskId,
    },
    TaskCancelled {
        task: TaskId,
    },
    /// The task's node vanished from the scene before completion.
    TaskDropped {
        task: TaskId,
        node: String,
    },
    RuleSkipped(SkippedRule),
    SequenceStarted {
        sequence: SequenceId,
        transitions: usize,
    },
    SequenceStep {
        sequence: SequenceId,
        index: usize,
        scheduled: usize,
        skipped: usize,
    },
    SequenceFinished {
        sequence: SequenceId,
    },
    SequenceCancelled {
        sequence: SequenceId,
        index: usize,
    },
}

/// Outputs returned by `TwinDriver::update()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub events: Vec<TwinEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    #[inline]
    pub fn push_event(&mut self, event: TwinEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.events.is_empty()
    }
}
