//! Full-pose capture and partial restore.
//!
//! A capture copies each node's local position, rotation and scale plus its
//! world matrix at capture time. Restore writes back position and rotation
//! only: it replays joint articulation, not rigid-body state.
//!
//! Records are matched by node name. When a traversal capture holds several
//! records with one name, restore pairs the k-th record with the k-th node of
//! that name in pre-order, which is the order the capture produced them in.

use hashbrown::HashMap;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::scene::{NodeId, SceneGraph, Vec3};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseRecord {
    pub node_name: String,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    /// Column-major world transform as it was when captured.
    pub world_matrix: [f64; 16],
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RestoreReport {
    pub restored: Vec<String>,
    pub missing: Vec<String>,
}

fn record<S: SceneGraph + ?Sized>(scene: &S, node: NodeId, name: &str) -> Option<PoseRecord> {
    let t = scene.transform(node)?;
    Some(PoseRecord {
        node_name: name.to_string(),
        position: t.position,
        rotation: t.rotation,
        scale: t.scale,
        world_matrix: scene.world_matrix(node)?,
    })
}

/// Capture the pose of `root`'s model.
///
/// With a hierarchy descriptor on `root`, exactly the declared joints are
/// captured in declared order (undeclared nodes are ignored, missing ones
/// warned about). Without one, every node of the subtree is captured in
/// pre-order, `root` first.
pub fn capture_pose<S: SceneGraph + ?Sized>(scene: &S, root: NodeId) -> Vec<PoseRecord> {
    if let Some(names) = scene.hierarchy(root) {
        return names
            .iter()
            .filter_map(|name| {
                let found = scene
                    .find_node(root, name)
                    .and_then(|node| record(scene, node, name));
                if found.is_none() {
                    warn!("capture_pose: declared joint '{name}' not found; skipping");
                }
                found
            })
            .collect();
    }
    scene
        .descendants(root)
        .into_iter()
        .filter_map(|node| {
            let name = scene.node_name(node)?;
            record(scene, node, name)
        })
        .collect()
}

/// The `nth` node named `name` in the pre-order walk of `root`'s subtree.
fn nth_named<S: SceneGraph + ?Sized>(
    scene: &S,
    root: NodeId,
    name: &str,
    nth: usize,
) -> Option<NodeId> {
    scene
        .descendants(root)
        .into_iter()
        .filter(|node| scene.node_name(*node) == Some(name))
        .nth(nth)
}

/// Write captured position and rotation back onto the nodes under `root`.
pub fn restore_pose<S: SceneGraph + ?Sized>(
    scene: &mut S,
    root: NodeId,
    records: &[PoseRecord],
) -> RestoreReport {
    let mut report = RestoreReport::default();
    let mut totals: HashMap<&str, usize> = HashMap::new();
    for rec in records {
        *totals.entry(rec.node_name.as_str()).or_default() += 1;
    }
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for rec in records {
        let name = rec.node_name.as_str();
        let occurrence = seen.entry(name).or_default();
        let nth = *occurrence;
        *occurrence += 1;
        let node = if totals.get(name).copied().unwrap_or(0) > 1 {
            nth_named(&*scene, root, name, nth)
        } else {
            scene.find_node(root, name)
        };
        let transform = node.and_then(|node| scene.transform_mut(node));
        match transform {
            Some(t) => {
                t.position = rec.position;
                t.rotation = rec.rotation;
                report.restored.push(rec.node_name.clone());
            }
            None => {
                warn!("restore_pose: node '{}' not found; skipping", rec.node_name);
                report.missing.push(rec.node_name.clone());
            }
        }
    }
    report
}
