//! Twinning: smooth, time-bounded transitions between two telemetry snapshots.
//!
//! Planning is pure: each rule is resolved against both snapshots, mapped
//! through the rule's sign/unit/offset, and kept only when the value actually
//! changes. Scheduling then hands each planned task to the [`Interpolator`].

use log::warn;
use serde::{Deserialize, Serialize};

use rigtwin_telemetry::{resolve, TelemetrySnapshot};

use crate::error::SkippedRule;
use crate::outputs::TwinEvent;
use crate::rule::JointRule;
use crate::scene::{NodeId, SceneGraph};
use crate::tween::{AnimationTask, Easing, Interpolator, ScheduledTask};

/// A task ready to be scheduled, with its resolved target node.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedTask {
    pub node: NodeId,
    pub task: AnimationTask,
}

/// Outcome of one `twin` call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TwinReport {
    pub scheduled: Vec<ScheduledTask>,
    pub skipped: Vec<SkippedRule>,
    /// Rules whose value is identical in both snapshots.
    pub unchanged: usize,
}

impl TwinReport {
    pub fn tasks(&self) -> impl Iterator<Item = &AnimationTask> {
        self.scheduled.iter().map(|s| &s.task)
    }

    /// Events describing this report, in scheduling order followed by skips.
    pub fn events(&self) -> Vec<TwinEvent> {
        let mut out = Vec::with_capacity(self.scheduled.len() + self.skipped.len());
        for s in &self.scheduled {
            if let Some(old) = s.superseded {
                out.push(TwinEvent::TaskSuperseded {
                    task: old,
                    by: s.id,
                });
            }
            out.push(TwinEvent::TaskScheduled {
                task: s.id,
                node: s.task.node_name.clone(),
                mode: s.task.mode,
                axis: s.task.axis,
                from: s.task.from,
                to: s.task.to,
                duration_ms: s.task.duration_ms,
            });
        }
        out.extend(self.skipped.iter().cloned().map(TwinEvent::RuleSkipped));
        out
    }
}

/// Compute per-rule tasks between `prev` and `cur` without scheduling anything.
///
/// Returns the planned tasks, the skipped rules, and the count of unchanged rules.
pub fn plan_twin<S: SceneGraph + ?Sized>(
    scene: &S,
    root: NodeId,
    rules: &[JointRule],
    prev: &TelemetrySnapshot,
    cur: &TelemetrySnapshot,
    duration_ms: f64,
) -> (Vec<PlannedTask>, Vec<SkippedRule>, usize) {
    let mut planned = Vec::new();
    let mut skipped = Vec::new();
    let mut unchanged = 0usize;

    for rule in rules {
        let raw = resolve(prev, &rule.data_path)
            .and_then(|p| resolve(cur, &rule.data_path).map(|c| (p, c)));
        let (raw_prev, raw_cur) = match raw {
            Ok(pair) => pair,
            Err(e) => {
                warn!("twin: skipping '{}': {}", rule.node_name, e);
                skipped.push(SkippedRule::telemetry(rule, &e));
                continue;
            }
        };
        let Some(node) = scene.find_node(root, &rule.node_name) else {
            warn!("twin: node '{}' not found; skipping", rule.node_name);
            skipped.push(SkippedRule::node_missing(rule));
            continue;
        };

        let from = rule.joint_value(raw_prev);
        let to = rule.joint_value(raw_cur);
        if from == to {
            unchanged += 1;
            continue;
        }
        planned.push(PlannedTask {
            node,
            task: AnimationTask {
                node_name: rule.node_name.clone(),
                axis: rule.axis,
                mode: rule.mode,
                from,
                to,
                duration_ms,
            },
        });
    }
    (planned, skipped, unchanged)
}

/// Plan a transition from `prev` to `cur` and schedule one tween per changed joint.
#[allow(clippy::too_many_arguments)]
pub fn twin<S: SceneGraph + ?Sized>(
    scene: &S,
    interp: &mut Interpolator,
    root: NodeId,
    rules: &[JointRule],
    prev: &TelemetrySnapshot,
    cur: &TelemetrySnapshot,
    duration_ms: f64,
    easing: Easing,
) -> TwinReport {
    let (planned, skipped, unchanged) = plan_twin(scene, root, rules, prev, cur, duration_ms);
    let scheduled = planned
        .into_iter()
        .map(|p| interp.schedule(p.node, p.task, easing))
        .collect();
    TwinReport {
        scheduled,
        skipped,
        unchanged,
    }
}
