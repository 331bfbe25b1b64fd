//! Error taxonomy and per-rule skip records.
//!
//! Only `play_sequence` with too few frames fails a whole call. Everything
//! else is local to one rule or one record: it is logged, recorded as a
//! [`SkippedRule`], and the remaining rules proceed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rigtwin_telemetry::ResolveError;

use crate::rule::JointRule;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TwinError {
    #[error("missing telemetry path '{0}'")]
    MissingTelemetryPath(String),
    #[error("node '{0}' not found")]
    NodeNotFound(String),
    #[error("sequence needs at least two snapshots, got {0}")]
    InsufficientFrames(usize),
    #[error("telemetry path '{path}' holds a non-numeric {found} value")]
    InvalidNumericValue { path: String, found: String },
    #[error("unknown machine archetype '{0}'")]
    UnknownArchetype(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<ResolveError> for TwinError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::MissingTelemetryPath { path } => TwinError::MissingTelemetryPath(path),
            ResolveError::InvalidNumericValue { path, found } => TwinError::InvalidNumericValue {
                path,
                found: found.to_string(),
            },
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    MissingTelemetryPath,
    InvalidNumericValue,
    NodeNotFound,
}

/// One rule excluded from a pose application or twin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkippedRule {
    pub node_name: String,
    pub data_path: String,
    pub reason: SkipReason,
    pub message: String,
}

impl SkippedRule {
    pub(crate) fn telemetry(rule: &JointRule, err: &ResolveError) -> Self {
        let reason = match err {
            ResolveError::MissingTelemetryPath { .. } => SkipReason::MissingTelemetryPath,
            ResolveError::InvalidNumericValue { .. } => SkipReason::InvalidNumericValue,
        };
        Self {
            node_name: rule.node_name.clone(),
            data_path: rule.data_path.to_string(),
            reason,
            message: err.to_string(),
        }
    }

    pub(crate) fn node_missing(rule: &JointRule) -> Self {
        Self {
            node_name: rule.node_name.clone(),
            data_path: rule.data_path.to_string(),
            reason: SkipReason::NodeNotFound,
            message: TwinError::NodeNotFound(rule.node_name.clone()).to_string(),
        }
    }
}
