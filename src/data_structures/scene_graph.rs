//! Scene graph stored as an arena.
//!
//! Nodes live in a single `Vec` and refer to each other by [`NodeId`]; parent
//! and child links are plain index lists, so there are no ownership cycles
//! between nodes. Meshes are stored next to the nodes and referenced by
//! [`MeshId`] so that many nodes can share one mesh.
//!
//! Every mutation that the renderer needs to see is queued as a [`Render`]
//! command and handed out by [`SceneGraph::drain_render`].

use cgmath::{Quaternion, Vector3};
use image::RgbaImage;
use log::warn;

use crate::{
    data_structures::{
        mesh::{Aabb, Mesh},
        transform::Transform,
    },
    error::SceneError,
    render::Render,
};

/// Handle of a node in the arena. Handles are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of a mesh stored in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u32);

impl MeshId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of a texture stored in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u32);

impl TextureId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Surface appearance of a node: a packed RGBA tint, lit or unlit, with an
/// optional emissive texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub color: u32,
    pub unlit: bool,
    pub emissive: Option<TextureId>,
}

impl Material {
    pub fn lit(color: u32) -> Self {
        Self {
            color,
            unlit: false,
            emissive: None,
        }
    }

    pub fn unlit(color: u32) -> Self {
        Self {
            color,
            unlit: true,
            emissive: None,
        }
    }

    pub fn with_emissive(self, texture: TextureId) -> Self {
        Self {
            emissive: Some(texture),
            ..self
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    local: Transform,
    world: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    mesh: Option<MeshId>,
    material: Option<Material>,
    opacity: f32,
    dirty: bool,
}

impl Node {
    fn new(name: String, parent: Option<NodeId>) -> Self {
        Self {
            name,
            local: Transform::default(),
            world: Transform::default(),
            parent,
            children: Vec::new(),
            mesh: None,
            material: None,
            opacity: 1.0,
            dirty: true,
        }
    }

    pub fn local(&self) -> &Transform {
        &self.local
    }

    pub fn world(&self) -> &Transform {
        &self.world
    }

    pub fn mesh(&self) -> Option<MeshId> {
        self.mesh
    }

    pub fn material(&self) -> Option<Material> {
        self.material
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }
}

#[derive(Default)]
pub struct SceneGraph {
    nodes: Vec<Option<Node>>,
    meshes: Vec<Mesh>,
    textures: Vec<RgbaImage>,
    pending: Vec<Render>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(SceneError::UnknownNode(id))
    }

    /// Adds a node below `parent`, or as a root when `parent` is `None`.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, SceneError> {
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(SceneError::UnknownNode(parent));
            }
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(Node::new(name.into(), parent)));
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.push(id);
        }
        Ok(id)
    }

    /// Removes `id` and its whole subtree. Returns the removed ids.
    pub fn remove(&mut self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        let parent = self.node(id).ok_or(SceneError::UnknownNode(id))?.parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|&c| c != id);
        }
        let removed = self.descendants(id);
        for node in removed.iter() {
            self.nodes[node.index()] = None;
        }
        self.pending.push(Render::Detach { node: id });
        Ok(removed)
    }

    /// Moves `child` below `parent` (or to the roots). Attaching a node below
    /// one of its own descendants is rejected.
    pub fn reparent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<(), SceneError> {
        let old_parent = self.node(child).ok_or(SceneError::UnknownNode(child))?.parent;
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(SceneError::UnknownNode(parent));
            }
            if self.descendants(child).contains(&parent) {
                return Err(SceneError::Cycle { child, parent });
            }
            self.node_mut(parent)?.children.push(child);
        }
        if let Some(old_parent) = old_parent {
            self.node_mut(old_parent)?.children.retain(|&c| c != child);
        }
        let node = self.node_mut(child)?;
        node.parent = parent;
        node.dirty = true;
        Ok(())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().enumerate().filter_map(|(idx, node)| {
            node.as_ref()
                .filter(|n| n.parent.is_none())
                .map(|_| NodeId(idx as u32))
        })
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            out.push(parent);
            current = self.parent(parent);
        }
        out
    }

    /// `id` followed by all of its descendants in depth-first pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Descendants of `id` (excluding `id`) that carry a mesh.
    pub fn descendants_with_mesh(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .skip(1)
            .filter(|&n| self.node(n).is_some_and(|node| node.mesh.is_some()))
            .collect()
    }

    /// First node in the subtree of `root` whose name contains `pattern`.
    ///
    /// Name lookup is a debugging aid; scenes keep the ids they create.
    pub fn find_descendant(&self, root: NodeId, pattern: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&n| self.node(n).is_some_and(|node| node.name.contains(pattern)))
    }

    /// `id` itself or the nearest ancestor whose name starts with `prefix`.
    pub fn ancestor_with_prefix(&self, id: NodeId, prefix: &str) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&n| self.node(n).is_some_and(|node| node.name.starts_with(prefix)))
    }

    pub fn local_transform(&self, id: NodeId) -> Option<Transform> {
        self.node(id).map(|n| n.local)
    }

    /// World transform as of the last [`update_world_transforms`](Self::update_world_transforms).
    pub fn world_transform(&self, id: NodeId) -> Option<Transform> {
        self.node(id).map(|n| n.world)
    }

    pub fn set_local_transform(&mut self, id: NodeId, transform: Transform) -> Result<(), SceneError> {
        let node = self.node_mut(id)?;
        if node.local != transform {
            node.local = transform;
            node.dirty = true;
        }
        Ok(())
    }

    pub fn set_position(&mut self, id: NodeId, position: Vector3<f32>) -> Result<(), SceneError> {
        let mut local = self.node(id).ok_or(SceneError::UnknownNode(id))?.local;
        local.position = position;
        self.set_local_transform(id, local)
    }

    pub fn set_rotation(&mut self, id: NodeId, rotation: Quaternion<f32>) -> Result<(), SceneError> {
        let mut local = self.node(id).ok_or(SceneError::UnknownNode(id))?.local;
        local.rotation = rotation;
        self.set_local_transform(id, local)
    }

    pub fn set_scale(&mut self, id: NodeId, scale: Vector3<f32>) -> Result<(), SceneError> {
        let mut local = self.node(id).ok_or(SceneError::UnknownNode(id))?.local;
        local.scale = scale;
        self.set_local_transform(id, local)
    }

    /// Propagates local transforms down from every root.
    ///
    /// A node whose world transform changed queues a [`Render::Transform`].
    pub fn update_world_transforms(&mut self) {
        let roots: Vec<NodeId> = self.roots().collect();
        let mut stack: Vec<(NodeId, Transform, bool)> = roots
            .into_iter()
            .map(|root| (root, Transform::default(), false))
            .collect();
        while let Some((id, parent_world, parent_dirty)) = stack.pop() {
            let Some(Some(node)) = self.nodes.get_mut(id.index()) else {
                warn!("Scene node {:?} vanished during transform propagation", id);
                continue;
            };
            let dirty = parent_dirty || node.dirty;
            if dirty {
                let world = &parent_world * &node.local;
                node.dirty = false;
                if node.world != world {
                    node.world = world;
                    self.pending.push(Render::Transform {
                        node: id,
                        transform: world,
                    });
                }
            }
            let world = node.world;
            let children = node.children.clone();
            stack.extend(children.into_iter().map(|c| (c, world, dirty)));
        }
    }

    pub fn insert_mesh(&mut self, mesh: Mesh) -> MeshId {
        let id = MeshId(self.meshes.len() as u32);
        self.meshes.push(mesh);
        id
    }

    /// Swaps the geometry behind `id`; every node using it is re-sent.
    pub fn replace_mesh(&mut self, id: MeshId, mesh: Mesh) -> Result<(), SceneError> {
        let slot = self
            .meshes
            .get_mut(id.index())
            .ok_or(SceneError::UnknownMesh(id))?;
        *slot = mesh;
        let users: Vec<NodeId> = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, n)| {
                n.as_ref()
                    .filter(|n| n.mesh == Some(id))
                    .map(|_| NodeId(idx as u32))
            })
            .collect();
        self.pending
            .extend(users.into_iter().map(|node| Render::Mesh { node, mesh: id }));
        Ok(())
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.index())
    }

    pub fn set_mesh(&mut self, id: NodeId, mesh: MeshId) -> Result<(), SceneError> {
        if self.mesh(mesh).is_none() {
            return Err(SceneError::UnknownMesh(mesh));
        }
        self.node_mut(id)?.mesh = Some(mesh);
        self.pending.push(Render::Mesh { node: id, mesh });
        Ok(())
    }

    pub fn insert_texture(&mut self, texture: RgbaImage) -> TextureId {
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(texture);
        id
    }

    pub fn texture(&self, id: TextureId) -> Option<&RgbaImage> {
        self.textures.get(id.index())
    }

    /// Fails if the material refers to a texture that is not in the arena.
    pub fn set_material(&mut self, id: NodeId, material: Material) -> Result<(), SceneError> {
        if let Some(texture) = material.emissive {
            if self.texture(texture).is_none() {
                return Err(SceneError::UnknownTexture(texture));
            }
        }
        let node = self.node_mut(id)?;
        if node.material != Some(material) {
            node.material = Some(material);
            self.pending.push(Render::Material { node: id, material });
        }
        Ok(())
    }

    pub fn set_opacity(&mut self, id: NodeId, opacity: f32) -> Result<(), SceneError> {
        let opacity = opacity.clamp(0.0, 1.0);
        let node = self.node_mut(id)?;
        if node.opacity != opacity {
            node.opacity = opacity;
            self.pending.push(Render::Opacity { node: id, opacity });
        }
        Ok(())
    }

    /// Bounds of the meshes in the subtree of `id`, expressed in the frame of
    /// `id`'s parent (so they include `id`'s own local transform).
    pub fn bounds(&self, id: NodeId) -> Option<Aabb> {
        let local = self.local_transform(id)?;
        self.subtree_bounds(id, local)
    }

    fn subtree_bounds(&self, id: NodeId, relative: Transform) -> Option<Aabb> {
        let node = self.node(id)?;
        let own = node
            .mesh
            .and_then(|m| self.mesh(m))
            .map(|mesh| mesh.bounds().transformed(&relative));
        node.children
            .iter()
            .filter_map(|&child| {
                let child_local = self.node(child)?.local;
                self.subtree_bounds(child, &relative * &child_local)
            })
            .fold(own, |acc, b| Some(acc.map_or(b, |a| a.union(&b))))
    }

    /// Uniformly scales `id` so that its longest edge becomes `0.7 * max_length`.
    ///
    /// Nodes without geometry, or with degenerate bounds, are left unchanged.
    pub fn scale_to_fit(&mut self, id: NodeId, max_length: f32) -> Result<(), SceneError> {
        let local = self.local_transform(id).ok_or(SceneError::UnknownNode(id))?;
        let unscaled = Transform {
            scale: Vector3::new(1.0, 1.0, 1.0),
            ..local
        };
        let Some(bounds) = self.subtree_bounds(id, unscaled) else {
            return Ok(());
        };
        let size = bounds.extents();
        let longest_edge = size.x.max(size.y).max(size.z);
        if longest_edge <= 0.0 {
            return Ok(());
        }
        let factor = (max_length / longest_edge) * 0.7;
        self.set_scale(id, Vector3::new(factor, factor, factor))
    }

    /// Shifts `id` so the center of its bounds sits at the parent's origin.
    pub fn center_within_parent(&mut self, id: NodeId) -> Result<(), SceneError> {
        let local = self.local_transform(id).ok_or(SceneError::UnknownNode(id))?;
        let Some(bounds) = self.bounds(id) else {
            return Ok(());
        };
        self.set_position(id, local.position - bounds.center())
    }

    /// Takes every queued render command, oldest first.
    pub fn drain_render(&mut self) -> Vec<Render> {
        std::mem::take(&mut self.pending)
    }
}
