//! rigtwin pose core (engine-agnostic)
//!
//! Maps telemetry snapshots onto the pose of a hierarchical scene through a
//! table of joint rules, and animates transitions between successive
//! snapshots. The scene itself is an external collaborator reached through the
//! [`SceneGraph`] capability trait; [`SceneTree`] is the in-memory implementation
//! used by adapters and tests.

pub mod apply;
pub mod capture;
pub mod config;
pub mod driver;
pub mod error;
pub mod ids;
pub mod outputs;
pub mod rule;
pub mod scene;
pub mod sequence;
pub mod tween;
pub mod twin;

// Re-exports for consumers (adapters)
pub use apply::{apply_pose, ApplyReport};
pub use capture::{capture_pose, restore_pose, PoseRecord, RestoreReport};
pub use config::{Config, RuleTable, SequenceCfg};
pub use driver::TwinDriver;
pub use error::{SkipReason, SkippedRule, TwinError};
pub use ids::{IdAllocator, SequenceId, TaskId};
pub use outputs::{Change, Outputs, TwinEvent};
pub use rule::{AngleUnit, Axis, JointRule, MotionMode};
pub use scene::{NodeDesc, NodeId, NodeTransform, SceneDesc, SceneGraph, SceneTree, Vec3};
pub use sequence::{SequenceState, Sequencer};
pub use tween::{AnimationTask, Easing, Interpolator, ScheduledTask};
pub use twin::{plan_twin, twin, PlannedTask, TwinReport};
pub use rigtwin_telemetry::{DataPath, TelemetrySnapshot, TelemetryValue};
