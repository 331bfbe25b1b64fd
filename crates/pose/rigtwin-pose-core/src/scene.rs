//! Scene capability consumed by the pose operations, and an in-memory tree.
//!
//! The renderer owns the real scene graph. Everything in this crate reaches it
//! through [`SceneGraph`], which exposes only what pose application needs:
//! scoped name lookup, local transforms, a world-matrix snapshot, traversal,
//! and an optional hierarchy descriptor on model roots.
//!
//! [`SceneTree`] implements the trait with an indexed name map so rule
//! application does not walk the subtree for every rule on every tick.

use glam::{DMat4, DQuat, DVec3, EulerRot};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::TwinError;
use crate::rule::Axis;

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const ONE: Vec3 = Vec3 {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    #[inline]
    pub fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }

    #[inline]
    fn to_dvec3(self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

/// Local transform of a node. Rotation is Euler angles in radians, XYZ order.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeTransform {
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl NodeTransform {
    pub fn local_matrix(&self) -> DMat4 {
        let rot = DQuat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        DMat4::from_scale_rotation_translation(
            self.scale.to_dvec3(),
            rot,
            self.position.to_dvec3(),
        )
    }
}

/// Opaque handle of a node inside one scene.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Minimal capability set the pose operations need from a scene graph.
pub trait SceneGraph {
    /// Find a node by exact name within the subtree rooted at `root` (root included).
    fn find_node(&self, root: NodeId, name: &str) -> Option<NodeId>;

    fn node_name(&self, node: NodeId) -> Option<&str>;

    fn transform(&self, node: NodeId) -> Option<&NodeTransform>;

    fn transform_mut(&mut self, node: NodeId) -> Option<&mut NodeTransform>;

    /// Current world transform, column-major. Returned by value: callers get a
    /// snapshot, never a live reference.
    fn world_matrix(&self, node: NodeId) -> Option<[f64; 16]>;

    /// Every node of the subtree in pre-order, starting with `root`.
    fn descendants(&self, root: NodeId) -> Vec<NodeId>;

    /// Declared joint order attached to a model root, if any.
    fn hierarchy(&self, root: NodeId) -> Option<&[String]>;
}

#[derive(Clone, Debug)]
struct SceneNode {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    transform: NodeTransform,
    hierarchy: Option<Vec<String>>,
}

/// Serializable description of one node for [`SceneDesc`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeDesc {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
}

/// Serializable description of a model: nodes listed parents-first, the first
/// node being the model root. `hierarchy` is attached to that root.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SceneDesc {
    pub nodes: Vec<NodeDesc>,
    #[serde(default)]
    pub hierarchy: Option<Vec<String>>,
}

/// In-memory scene graph with a name index.
///
/// Names need not be unique across the tree (two models of the same
/// archetype share joint names); lookups are scoped by root.
#[derive(Clone, Debug, Default)]
pub struct SceneTree {
    nodes: Vec<SceneNode>,
    by_name: HashMap<String, Vec<NodeId>>,
}

impl SceneTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree holding a single model.
    pub fn from_desc(desc: &SceneDesc) -> Result<(Self, NodeId), TwinError> {
        let mut tree = SceneTree::new();
        let root = tree.instantiate(desc, None)?;
        Ok((tree, root))
    }

    /// Add every node of `desc` under `parent` (or as a new root) and return the model root.
    pub fn instantiate(&mut self, desc: &SceneDesc, parent: Option<NodeId>) -> Result<NodeId, TwinError> {
        let first = desc
            .nodes
            .first()
            .ok_or_else(|| TwinError::Config("scene description has no nodes".to_string()))?;
        if first.parent.is_some() {
            return Err(TwinError::Config(format!(
                "first scene node '{}' must not declare a parent",
                first.name
            )));
        }

        let mut local: HashMap<&str, NodeId> = HashMap::new();
        let mut root = None;
        for nd in desc.nodes.iter() {
            let parent_id = match &nd.parent {
                Some(p) => Some(
                    *local
                        .get(p.as_str())
                        .ok_or_else(|| TwinError::NodeNotFound(p.clone()))?,
                ),
                None => parent,
            };
            let transform = NodeTransform {
                position: nd.position,
                rotation: nd.rotation,
                scale: nd.scale,
            };
            let id = self.add_node(nd.name.clone(), parent_id, transform)?;
            local.insert(nd.name.as_str(), id);
            root.get_or_insert(id);
        }

        let root = root.ok_or_else(|| TwinError::Config("scene description has no nodes".into()))?;
        if let Some(h) = &desc.hierarchy {
            self.set_hierarchy(root, h.clone())?;
        }
        Ok(root)
    }

    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
        transform: NodeTransform,
    ) -> Result<NodeId, TwinError> {
        let name = name.into();
        if let Some(p) = parent {
            if self.node(p).is_none() {
                return Err(TwinError::NodeNotFound(format!("#{}", p.0)));
            }
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SceneNode {
            name: name.clone(),
            parent,
            children: Vec::new(),
            transform,
            hierarchy: None,
        });
        if let Some(p) = parent {
            self.nodes[p.0 as usize].children.push(id);
        }
        self.by_name.entry(name).or_default().push(id);
        Ok(id)
    }

    pub fn set_hierarchy(&mut self, root: NodeId, names: Vec<String>) -> Result<(), TwinError> {
        let node = self
            .nodes
            .get_mut(root.0 as usize)
            .ok_or_else(|| TwinError::NodeNotFound(format!("#{}", root.0)))?;
        node.hierarchy = Some(names);
        Ok(())
    }

    /// First node carrying `name` anywhere in the tree.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).and_then(|ids| ids.first().copied())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0 as usize)
    }

    fn is_within(&self, node: NodeId, root: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == root {
                return true;
            }
            cur = self.parent(id);
        }
        false
    }

    fn world(&self, node: NodeId) -> Option<DMat4> {
        let mut m = self.node(node)?.transform.local_matrix();
        let mut cur = self.parent(node);
        while let Some(id) = cur {
            let n = self.node(id)?;
            m = n.transform.local_matrix() * m;
            cur = n.parent;
        }
        Some(m)
    }
}

impl SceneGraph for SceneTree {
    fn find_node(&self, root: NodeId, name: &str) -> Option<NodeId> {
        self.by_name
            .get(name)?
            .iter()
            .copied()
            .find(|id| self.is_within(*id, root))
    }

    fn node_name(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(|n| n.name.as_str())
    }

    fn transform(&self, node: NodeId) -> Option<&NodeTransform> {
        self.node(node).map(|n| &n.transform)
    }

    fn transform_mut(&mut self, node: NodeId) -> Option<&mut NodeTransform> {
        self.nodes.get_mut(node.0 as usize).map(|n| &mut n.transform)
    }

    fn world_matrix(&self, node: NodeId) -> Option<[f64; 16]> {
        self.world(node).map(|m| m.to_cols_array())
    }

    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.node(root).is_none() {
            return out;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(n) = self.node(id) {
                // reversed so children pop in insertion order
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    fn hierarchy(&self, root: NodeId) -> Option<&[String]> {
        self.node(root).and_then(|n| n.hierarchy.as_deref())
    }
}
