//! TwinDriver: owned state and public API tying rules, tweens and sequences together.
//!
//! Methods:
//! - apply_pose / twin / play_sequence (rule slices or archetype names)
//! - cancel_sequence / cancel_task
//! - update (one render-loop tick: advance tweens, then sequence cadences)
//! - capture_pose / restore_pose
//!
//! Events raised outside a tick (skips during `apply_pose`, tasks scheduled by
//! a direct `twin`) are queued and delivered with the next `update` outputs.

use std::collections::VecDeque;

use log::warn;

use rigtwin_telemetry::TelemetrySnapshot;

use crate::apply::{apply_pose, ApplyReport};
use crate::capture::{capture_pose, restore_pose, PoseRecord, RestoreReport};
use crate::config::{check_duration, Config, RuleTable, SequenceCfg};
use crate::error::TwinError;
use crate::ids::{IdAllocator, SequenceId, TaskId};
use crate::outputs::{Outputs, TwinEvent};
use crate::rule::JointRule;
use crate::scene::{NodeId, SceneGraph};
use crate::sequence::{SequenceState, Sequencer};
use crate::tween::Interpolator;
use crate::twin::{twin, TwinReport};

#[derive(Debug)]
pub struct TwinDriver {
    cfg: Config,
    rules: RuleTable,
    ids: IdAllocator,
    interp: Interpolator,
    sequences: Vec<Sequencer>,
    /// Terminal state of the most recently retired sequences, oldest first.
    retired: VecDeque<(SequenceId, SequenceState)>,
    pending: Vec<TwinEvent>,
    outputs: Outputs,
}

/// Retired sequences whose terminal state stays queryable.
const RETIRED_HISTORY: usize = 64;

impl Default for TwinDriver {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl TwinDriver {
    /// Fails with `Config` when the default duration or cadence is unusable.
    pub fn new(cfg: Config) -> Result<Self, TwinError> {
        cfg.validate()?;
        Ok(Self::with_config(cfg))
    }

    fn with_config(cfg: Config) -> Self {
        Self {
            cfg,
            rules: RuleTable::new(),
            ids: IdAllocator::new(),
            interp: Interpolator::new(),
            sequences: Vec::new(),
            retired: VecDeque::new(),
            pending: Vec::new(),
            outputs: Outputs::default(),
        }
    }

    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn set_rules(&mut self, rules: RuleTable) {
        self.rules = rules;
    }

    pub fn interpolator(&self) -> &Interpolator {
        &self.interp
    }

    /// Snap `root`'s model to `snapshot`.
    pub fn apply_pose<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &mut S,
        root: NodeId,
        rules: &[JointRule],
        snapshot: &TelemetrySnapshot,
    ) -> ApplyReport {
        let report = apply_pose(scene, root, rules, snapshot);
        self.pending
            .extend(report.skipped.iter().cloned().map(TwinEvent::RuleSkipped));
        report
    }

    pub fn apply_pose_archetype<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &mut S,
        root: NodeId,
        archetype: &str,
        snapshot: &TelemetrySnapshot,
    ) -> Result<ApplyReport, TwinError> {
        let rules = self.rules.require(archetype)?;
        let report = apply_pose(scene, root, rules, snapshot);
        self.pending
            .extend(report.skipped.iter().cloned().map(TwinEvent::RuleSkipped));
        Ok(report)
    }

    /// Schedule tweens from `prev` to `cur`. `duration_ms` defaults to the configured duration
    /// and must be finite and non-negative.
    pub fn twin<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &S,
        root: NodeId,
        rules: &[JointRule],
        prev: &TelemetrySnapshot,
        cur: &TelemetrySnapshot,
        duration_ms: Option<f64>,
    ) -> Result<TwinReport, TwinError> {
        let duration = duration_ms.unwrap_or(self.cfg.default_duration_ms);
        check_duration("twin duration_ms", duration)?;
        let report = twin(
            scene,
            &mut self.interp,
            root,
            rules,
            prev,
            cur,
            duration,
            self.cfg.easing,
        );
        self.pending.extend(report.events());
        Ok(report)
    }

    pub fn twin_archetype<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &S,
        root: NodeId,
        archetype: &str,
        prev: &TelemetrySnapshot,
        cur: &TelemetrySnapshot,
        duration_ms: Option<f64>,
    ) -> Result<TwinReport, TwinError> {
        let duration = duration_ms.unwrap_or(self.cfg.default_duration_ms);
        check_duration("twin duration_ms", duration)?;
        let rules = self.rules.require(archetype)?;
        let report = twin(
            scene,
            &mut self.interp,
            root,
            rules,
            prev,
            cur,
            duration,
            self.cfg.easing,
        );
        self.pending.extend(report.events());
        Ok(report)
    }

    /// Start chained playback over `frames`. `cfg` defaults to the configured cadence
    /// with duration equal to cadence. Fails with `InsufficientFrames` or, for a
    /// non-positive or non-finite cadence or duration, `Config`.
    pub fn play_sequence(
        &mut self,
        root: NodeId,
        rules: &[JointRule],
        frames: Vec<TelemetrySnapshot>,
        cfg: Option<SequenceCfg>,
    ) -> Result<SequenceId, TwinError> {
        let cfg = cfg.unwrap_or_else(|| SequenceCfg::new(self.cfg.default_cadence_ms));
        if frames.len() < 2 {
            warn!(
                "play_sequence: need at least two snapshots, got {}",
                frames.len()
            );
            return Err(TwinError::InsufficientFrames(frames.len()));
        }
        if let Err(e) = cfg.validate() {
            warn!("play_sequence: {e}");
            return Err(e);
        }
        let id = self.ids.alloc_sequence();
        let seq = Sequencer::new(id, root, rules.to_vec(), frames, cfg)?;
        self.pending.push(TwinEvent::SequenceStarted {
            sequence: id,
            transitions: seq.transitions_total(),
        });
        self.sequences.push(seq);
        Ok(id)
    }

    pub fn play_sequence_archetype(
        &mut self,
        root: NodeId,
        archetype: &str,
        frames: Vec<TelemetrySnapshot>,
        cfg: Option<SequenceCfg>,
    ) -> Result<SequenceId, TwinError> {
        let rules = self.rules.require(archetype)?.to_vec();
        self.play_sequence(root, &rules, frames, cfg)
    }

    /// Stop a running sequence. In-flight tweens are left to finish.
    pub fn cancel_sequence(&mut self, id: SequenceId) -> bool {
        let Some(seq) = self.sequences.iter_mut().find(|s| s.id() == id) else {
            return false;
        };
        if !seq.cancel() {
            return false;
        }
        self.pending.push(TwinEvent::SequenceCancelled {
            sequence: id,
            index: seq.index(),
        });
        true
    }

    /// State of a running or recently retired sequence. Only the last
    /// `RETIRED_HISTORY` retired sequences are remembered.
    pub fn sequence_state(&self, id: SequenceId) -> Option<SequenceState> {
        self.sequences
            .iter()
            .find(|s| s.id() == id)
            .map(Sequencer::state)
            .or_else(|| {
                self.retired
                    .iter()
                    .find(|(rid, _)| *rid == id)
                    .map(|(_, state)| *state)
            })
    }

    /// Remove one tween before its next advance.
    pub fn cancel_task(&mut self, id: TaskId) -> bool {
        if self.interp.cancel(id).is_none() {
            return false;
        }
        self.pending.push(TwinEvent::TaskCancelled { task: id });
        true
    }

    /// One host tick: advance every tween by `dt_ms`, then every sequence cadence.
    pub fn update<S: SceneGraph + ?Sized>(&mut self, dt_ms: f64, scene: &mut S) -> &Outputs {
        self.outputs.clear();
        self.outputs.events.append(&mut self.pending);

        self.interp.advance(dt_ms, scene, &mut self.outputs);
        for seq in self.sequences.iter_mut() {
            seq.advance(
                dt_ms,
                scene,
                &mut self.interp,
                self.cfg.easing,
                &mut self.outputs,
            );
        }

        let retired = &mut self.retired;
        self.sequences.retain(|s| {
            if s.is_running() {
                true
            } else {
                if retired.len() == RETIRED_HISTORY {
                    retired.pop_front();
                }
                retired.push_back((s.id(), s.state()));
                false
            }
        });

        let cap = self.cfg.max_events_per_tick;
        if self.outputs.events.len() > cap {
            warn!(
                "update: {} events exceed the per-tick cap of {}; dropping the rest",
                self.outputs.events.len(),
                cap
            );
            self.outputs.events.truncate(cap);
        }
        &self.outputs
    }

    pub fn active_sequences(&self) -> usize {
        self.sequences.len()
    }

    pub fn capture_pose<S: SceneGraph + ?Sized>(&self, scene: &S, root: NodeId) -> Vec<PoseRecord> {
        capture_pose(scene, root)
    }

    pub fn restore_pose<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &mut S,
        root: NodeId,
        records: &[PoseRecord],
    ) -> RestoreReport {
        restore_pose(scene, root, records)
    }
}
