//! Interpolator: the active set of scheduled channel tweens.
//!
//! Each [`AnimationTask`] moves one node channel (position or rotation, one
//! axis) from `from` to `to` over `duration_ms`. The host render loop calls
//! [`Interpolator::advance`] once per frame; every active task is evaluated at
//! its new elapsed time and written to the scene. Finished tasks leave the set
//! on the tick that lands them on `to`.
//!
//! At most one task is active per node channel. Scheduling a task on a
//! channel that is already animating supersedes the older task, so the writes
//! of one tick never depend on evaluation order.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::ids::{IdAllocator, TaskId};
use crate::outputs::{Change, Outputs, TwinEvent};
use crate::rule::{write_channel, Axis, MotionMode};
use crate::scene::{NodeId, SceneGraph};

/// Progress curve applied to normalized time.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "control", rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    /// CSS-style cubic bezier with control points (x1, y1, x2, y2).
    CubicBezier([f64; 4]),
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Invert the x curve by binary search, then evaluate y.
fn bezier_ease(t: f64, [x1, y1, x2, y2]: [f64; 4]) -> f64 {
    if x1 == 0.0 && y1 == 0.0 && x2 == 1.0 && y2 == 1.0 {
        return t;
    }
    let mut lo = 0.0f64;
    let mut hi = 1.0f64;
    let mut mid = t;
    for _ in 0..32 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-9 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}

impl Easing {
    /// Eased progress for `elapsed_ms` into a `duration_ms` tween, clamped to [0, 1].
    /// A non-positive or non-finite duration is complete immediately.
    pub fn progress(&self, elapsed_ms: f64, duration_ms: f64) -> f64 {
        if !(duration_ms > 0.0 && duration_ms.is_finite()) {
            return 1.0;
        }
        let t = (elapsed_ms / duration_ms).clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicBezier(ctrl) => {
                if t >= 1.0 {
                    1.0
                } else {
                    bezier_ease(t, *ctrl)
                }
            }
        }
    }
}

/// The unit of scheduled interpolation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationTask {
    pub node_name: String,
    pub axis: Axis,
    pub mode: MotionMode,
    pub from: f64,
    pub to: f64,
    pub duration_ms: f64,
}

impl AnimationTask {
    /// Channel value `t_ms` after the task started, with the given easing.
    pub fn value_at_eased(&self, t_ms: f64, easing: Easing) -> f64 {
        let p = easing.progress(t_ms, self.duration_ms);
        if p >= 1.0 {
            self.to
        } else {
            self.from + (self.to - self.from) * p
        }
    }

    /// Linear value `t_ms` after the task started.
    pub fn value_at(&self, t_ms: f64) -> f64 {
        self.value_at_eased(t_ms, Easing::Linear)
    }

    /// True once `t_ms` reaches the duration. Non-finite or non-positive durations are
    /// complete from the start.
    #[inline]
    pub fn is_complete_at(&self, t_ms: f64) -> bool {
        !(self.duration_ms > 0.0 && self.duration_ms.is_finite()) || t_ms >= self.duration_ms
    }

    #[inline]
    fn same_channel(&self, node: NodeId, other_node: NodeId, other: &AnimationTask) -> bool {
        node == other_node && self.mode == other.mode && self.axis == other.axis
    }
}

/// Result of handing a task to the interpolator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub task: AnimationTask,
    /// Task that was animating the same channel and was removed.
    #[serde(default)]
    pub superseded: Option<TaskId>,
}

#[derive(Clone, Debug)]
struct ActiveTask {
    id: TaskId,
    node: NodeId,
    task: AnimationTask,
    easing: Easing,
    elapsed_ms: f64,
}

#[derive(Debug, Default)]
pub struct Interpolator {
    ids: IdAllocator,
    active: Vec<ActiveTask>,
}

impl Interpolator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task targeting `node` to the active set.
    pub fn schedule(&mut self, node: NodeId, task: AnimationTask, easing: Easing) -> ScheduledTask {
        let id = self.ids.alloc_task();
        let superseded = self
            .active
            .iter()
            .position(|a| task.same_channel(node, a.node, &a.task))
            .map(|idx| self.active.remove(idx).id);
        debug!(
            "tween {:?}: {} {:?}.{:?} {} -> {} over {}ms",
            id, task.node_name, task.mode, task.axis, task.from, task.to, task.duration_ms
        );
        self.active.push(ActiveTask {
            id,
            node,
            task: task.clone(),
            easing,
            elapsed_ms: 0.0,
        });
        ScheduledTask {
            id,
            task,
            superseded,
        }
    }

    /// Advance every active task by `dt_ms`, write the new values into the
    /// scene, and drop tasks that reached their duration.
    pub fn advance<S: SceneGraph + ?Sized>(&mut self, dt_ms: f64, scene: &mut S, outputs: &mut Outputs) {
        let dt_ms = dt_ms.max(0.0);
        self.active.retain_mut(|a| {
            a.elapsed_ms += dt_ms;
            let value = a.task.value_at_eased(a.elapsed_ms, a.easing);
            let Some(transform) = scene.transform_mut(a.node) else {
                warn!(
                    "tween {:?}: node '{}' no longer in scene; dropping",
                    a.id, a.task.node_name
                );
                outputs.push_event(TwinEvent::TaskDropped {
                    task: a.id,
                    node: a.task.node_name.clone(),
                });
                return false;
            };
            write_channel(transform, a.task.mode, a.task.axis, value);
            outputs.push_change(Change {
                node: a.task.node_name.clone(),
                mode: a.task.mode,
                axis: a.task.axis,
                value,
            });
            if a.task.is_complete_at(a.elapsed_ms) {
                debug!("tween {:?}: completed at {}", a.id, value);
                outputs.push_event(TwinEvent::TaskCompleted {
                    task: a.id,
                    node: a.task.node_name.clone(),
                });
                return false;
            }
            true
        });
    }

    /// Remove one task before its next advance. Returns the task if it was active.
    pub fn cancel(&mut self, id: TaskId) -> Option<AnimationTask> {
        let idx = self.active.iter().position(|a| a.id == id)?;
        Some(self.active.remove(idx).task)
    }

    pub fn cancel_all(&mut self) -> Vec<TaskId> {
        self.active.drain(..).map(|a| a.id).collect()
    }

    pub fn get(&self, id: TaskId) -> Option<&AnimationTask> {
        self.active.iter().find(|a| a.id == id).map(|a| &a.task)
    }

    /// Elapsed time of an active task.
    pub fn elapsed_ms(&self, id: TaskId) -> Option<f64> {
        self.active.iter().find(|a| a.id == id).map(|a| a.elapsed_ms)
    }

    pub fn active(&self) -> impl Iterator<Item = (TaskId, &AnimationTask)> {
        self.active.iter().map(|a| (a.id, &a.task))
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
