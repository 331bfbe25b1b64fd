//! Chained playback of a snapshot list.
//!
//! A sequencer walks consecutive snapshot pairs and twins each pair on a fixed
//! wall-clock cadence, independent of when the previous transition's tweens
//! finish. It behaves like an interval timer: the first transition fires one
//! cadence after start, and `N` snapshots yield exactly `N - 1` transitions.
//! Cancelling stops further scheduling; tweens already handed to the
//! interpolator run to completion.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use rigtwin_telemetry::TelemetrySnapshot;

use crate::config::SequenceCfg;
use crate::error::TwinError;
use crate::ids::SequenceId;
use crate::outputs::{Outputs, TwinEvent};
use crate::rule::JointRule;
use crate::scene::{NodeId, SceneGraph};
use crate::tween::{Easing, Interpolator};
use crate::twin::twin;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceState {
    Running,
    Finished,
    Cancelled,
}

#[derive(Debug)]
pub struct Sequencer {
    id: SequenceId,
    root: NodeId,
    rules: Vec<JointRule>,
    frames: Vec<TelemetrySnapshot>,
    cfg: SequenceCfg,
    /// Index of the next pair's first snapshot.
    index: usize,
    since_last_ms: f64,
    state: SequenceState,
}

impl Sequencer {
    /// Fails with `InsufficientFrames` when fewer than two snapshots are given, and
    /// with `Config` when the cadence or duration is unusable.
    pub fn new(
        id: SequenceId,
        root: NodeId,
        rules: Vec<JointRule>,
        frames: Vec<TelemetrySnapshot>,
        cfg: SequenceCfg,
    ) -> Result<Self, TwinError> {
        if frames.len() < 2 {
            return Err(TwinError::InsufficientFrames(frames.len()));
        }
        cfg.validate()?;
        Ok(Self {
            id,
            root,
            rules,
            frames,
            cfg,
            index: 0,
            since_last_ms: 0.0,
            state: SequenceState::Running,
        })
    }

    pub fn id(&self) -> SequenceId {
        self.id
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SequenceState::Running
    }

    /// Transitions scheduled so far.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn transitions_total(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn cfg(&self) -> &SequenceCfg {
        &self.cfg
    }

    /// Stop scheduling further transitions. Returns false if already stopped.
    pub fn cancel(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = SequenceState::Cancelled;
        info!("sequence {:?}: cancelled after {} transitions", self.id, self.index);
        true
    }

    /// Advance the cadence clock by `dt_ms` and twin every pair that became due.
    /// Returns the number of transitions scheduled by this call.
    pub fn advance<S: SceneGraph + ?Sized>(
        &mut self,
        dt_ms: f64,
        scene: &S,
        interp: &mut Interpolator,
        easing: Easing,
        outputs: &mut Outputs,
    ) -> usize {
        if !self.is_running() {
            return 0;
        }
        self.since_last_ms += dt_ms.max(0.0);
        let mut fired = 0;
        while self.is_running() && self.since_last_ms >= self.cfg.cadence_ms {
            self.since_last_ms -= self.cfg.cadence_ms;
            let report = twin(
                scene,
                interp,
                self.root,
                &self.rules,
                &self.frames[self.index],
                &self.frames[self.index + 1],
                self.cfg.duration(),
                easing,
            );
            debug!(
                "sequence {:?}: transition {} -> {} scheduled {} tweens",
                self.id,
                self.index,
                self.index + 1,
                report.scheduled.len()
            );
            outputs.events.extend(report.events());
            outputs.push_event(TwinEvent::SequenceStep {
                sequence: self.id,
                index: self.index,
                scheduled: report.scheduled.len(),
                skipped: report.skipped.len(),
            });
            self.index += 1;
            fired += 1;
            if self.index >= self.transitions_total() {
                self.state = SequenceState::Finished;
                info!("sequence {:?}: finished", self.id);
                outputs.push_event(TwinEvent::SequenceFinished { sequence: self.id });
            }
        }
        fired
    }
}
