//! Instantaneous pose application ("snap to telemetry").

use log::warn;
use serde::{Deserialize, Serialize};

use rigtwin_telemetry::{resolve, TelemetrySnapshot};

use crate::error::SkippedRule;
use crate::outputs::Change;
use crate::rule::JointRule;
use crate::scene::{NodeId, SceneGraph};

/// What one `apply_pose` call wrote and what it skipped.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub writes: Vec<Change>,
    pub skipped: Vec<SkippedRule>,
}

/// Write every rule's mapped value directly onto its node under `root`.
///
/// A rule with unresolvable data or an unknown node is skipped and reported;
/// the other rules are still applied.
pub fn apply_pose<S: SceneGraph + ?Sized>(
    scene: &mut S,
    root: NodeId,
    rules: &[JointRule],
    snapshot: &TelemetrySnapshot,
) -> ApplyReport {
    let mut report = ApplyReport::default();
    for rule in rules {
        let raw = match resolve(snapshot, &rule.data_path) {
            Ok(v) => v,
            Err(e) => {
                warn!("apply_pose: skipping '{}': {}", rule.node_name, e);
                report.skipped.push(SkippedRule::telemetry(rule, &e));
                continue;
            }
        };
        let value = rule.joint_value(raw);

        let transform = scene
            .find_node(root, &rule.node_name)
            .and_then(|node| scene.transform_mut(node));
        let Some(transform) = transform else {
            warn!("apply_pose: node '{}' not found; skipping", rule.node_name);
            report.skipped.push(SkippedRule::node_missing(rule));
            continue;
        };
        rule.write(transform, value);
        report.writes.push(Change {
            node: rule.node_name.clone(),
            mode: rule.mode,
            axis: rule.axis,
            value,
        });
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkipReason;
    use crate::rule::Axis;
    use crate::scene::{NodeTransform, SceneTree, Vec3};

    fn scene() -> (SceneTree, NodeId) {
        let mut tree = SceneTree::new();
        let root = tree.add_node("root", None, NodeTransform::default()).unwrap();
        let mut slide = NodeTransform::default();
        slide.position = Vec3::new(5.0, 6.0, 7.0);
        tree.add_node("slide", Some(root), slide).unwrap();
        tree.add_node("joint1", Some(root), NodeTransform::default()).unwrap();
        (tree, root)
    }

    #[test]
    fn writes_only_the_declared_axis() {
        let (mut tree, root) = scene();
        let rules = vec![JointRule::translate("slide", "root.x", Axis::X).unwrap()];
        let snap = TelemetrySnapshot::new().with("x", 1.5);
        let report = apply_pose(&mut tree, root, &rules, &snap);

        assert!(report.skipped.is_empty());
        let slide = tree.find_node(root, "slide").unwrap();
        assert_eq!(tree.transform(slide).unwrap().position, Vec3::new(1.5, 6.0, 7.0));
    }

    #[test]
    fn missing_data_and_node_skip_only_that_rule() {
        let (mut tree, root) = scene();
        let rules = vec![
            JointRule::rotate("joint1", "root.j1", Axis::Y).unwrap(),
            JointRule::rotate("ghost", "root.j1", Axis::Y).unwrap(),
            JointRule::rotate("joint1", "root.absent", Axis::X).unwrap(),
        ];
        let snap = TelemetrySnapshot::new().with("j1", 90.0);
        let report = apply_pose(&mut tree, root, &rules, &snap);

        assert_eq!(report.writes.len(), 1);
        let reasons: Vec<SkipReason> = report.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(
            reasons,
            vec![SkipReason::NodeNotFound, SkipReason::MissingTelemetryPath]
        );
        let j1 = tree.find_node(root, "joint1").unwrap();
        let rot = tree.transform(j1).unwrap().rotation;
        assert!((rot.y - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(rot.x, 0.0);
    }
}
