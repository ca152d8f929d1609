//! Scene graph: an arena of nodes forming a transform tree.
//!
//! Nodes live in a [`SlotMap`] and refer to each other by [`NodeId`]. Each
//! node may own one [`Shape`]. A node's world matrix is always its parent's
//! world matrix multiplied by its local matrix; every mutation that goes
//! through the graph recomputes the affected subtree top-down.

use crate::geometry::polygon_bounds;
use crate::matrix::Matrix;
use crate::render::RenderContext;
use crate::shapes::Shape;
use kurbo::{Point, Rect, Vec2};
use slotmap::SlotMap;
use thiserror::Error;

slotmap::new_key_type! {
    /// Stable handle to a scene node.
    pub struct NodeId;
}

/// Scene graph errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),
    #[error("Adding {child:?} under {parent:?} would create a cycle")]
    WouldCreateCycle { parent: NodeId, child: NodeId },
    #[error("The root node cannot be reparented")]
    RootNotMovable,
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },
}

pub type SceneResult<T> = Result<T, SceneError>;

/// A node of the transform tree.
#[derive(Debug, Clone)]
pub struct SceneNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    shape: Option<Shape>,
    /// Offset relative to the parent, applied after the shape transform.
    translation: Vec2,
    local_matrix: Matrix,
    world_matrix: Matrix,
}

impl SceneNode {
    fn new(shape: Option<Shape>) -> Self {
        let local_matrix = compose_local_matrix(shape.as_ref(), Vec2::ZERO);
        Self {
            parent: None,
            children: Vec::new(),
            shape,
            translation: Vec2::ZERO,
            local_matrix,
            world_matrix: local_matrix,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    pub fn translation(&self) -> Vec2 {
        self.translation
    }

    pub fn local_matrix(&self) -> Matrix {
        self.local_matrix
    }

    pub fn world_matrix(&self) -> Matrix {
        self.world_matrix
    }
}

/// Rotation and scale about `center`, flips folded into the scale.
pub fn pivot_matrix(center: Point, rotation: f64, scale: Vec2) -> Matrix {
    Matrix::translate(center.x, center.y)
        .multiply(&Matrix::rotate(rotation))
        .multiply(&Matrix::scale(scale.x, scale.y))
        .multiply(&Matrix::translate(-center.x, -center.y))
}

/// Local matrix of a node: the shape's rotation, scale and flips about its
/// visual center, followed by the node translation.
pub fn compose_local_matrix(shape: Option<&Shape>, translation: Vec2) -> Matrix {
    let offset = Matrix::translate(translation.x, translation.y);
    match shape {
        Some(shape) => {
            let transform = shape.transform();
            offset.multiply(&pivot_matrix(
                shape.visual_center(),
                transform.rotation,
                transform.effective_scale(),
            ))
        }
        None => offset,
    }
}

/// Arena-backed transform tree with a permanent root.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SceneNode::new(None));
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root remains.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    fn get(&self, id: NodeId) -> SceneResult<&SceneNode> {
        self.nodes.get(id).ok_or(SceneError::NodeNotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> SceneResult<&mut SceneNode> {
        self.nodes.get_mut(id).ok_or(SceneError::NodeNotFound(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn shape(&self, id: NodeId) -> Option<&Shape> {
        self.nodes.get(id).and_then(|n| n.shape.as_ref())
    }

    /// Direct access to a node's shape. Call [`SceneGraph::refresh`] after
    /// changing its geometry, or use [`SceneGraph::modify_shape`].
    pub fn shape_mut(&mut self, id: NodeId) -> Option<&mut Shape> {
        self.nodes.get_mut(id).and_then(|n| n.shape.as_mut())
    }

    pub fn world_matrix(&self, id: NodeId) -> Option<Matrix> {
        self.nodes.get(id).map(|n| n.world_matrix)
    }

    pub fn local_matrix(&self, id: NodeId) -> Option<Matrix> {
        self.nodes.get(id).map(|n| n.local_matrix)
    }

    /// World matrix of the node's parent (identity for detached nodes).
    pub fn parent_world_matrix(&self, id: NodeId) -> Matrix {
        self.parent(id)
            .and_then(|p| self.world_matrix(p))
            .unwrap_or_default()
    }

    /// Create a detached node owning `shape`.
    pub fn create_node(&mut self, shape: Option<Shape>) -> NodeId {
        let id = self.nodes.insert(SceneNode::new(shape));
        log::debug!("Created node {id:?}");
        id
    }

    /// Create a node owning `shape` and attach it under `parent`.
    pub fn insert(&mut self, parent: NodeId, shape: Shape) -> SceneResult<NodeId> {
        self.get(parent)?;
        let id = self.create_node(Some(shape));
        self.add_child_node(parent, id)?;
        Ok(id)
    }

    fn is_ancestor(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.parent(id) {
                Some(p) => id = p,
                None => return false,
            }
        }
    }

    /// Attach `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn add_child_node(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        self.get(parent)?;
        self.get(child)?;
        if child == self.root {
            log::warn!("Refusing to reparent the root node");
            return Err(SceneError::RootNotMovable);
        }
        if self.is_ancestor(child, parent) {
            log::warn!("Refusing to add {child:?} under its own descendant {parent:?}");
            return Err(SceneError::WouldCreateCycle { parent, child });
        }
        if let Some(old) = self.parent(child) {
            self.unlink(old, child);
        }
        self.get_mut(child)?.parent = Some(parent);
        self.get_mut(parent)?.children.push(child);
        self.refresh(child)
    }

    /// Detach `child` from `parent`. The child keeps its subtree and becomes
    /// a detached root of its own.
    pub fn remove_child_node(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        self.get(parent)?;
        if self.get(child)?.parent != Some(parent) {
            return Err(SceneError::NotAChild { parent, child });
        }
        self.unlink(parent, child);
        self.get_mut(child)?.parent = None;
        self.refresh(child)
    }

    fn unlink(&mut self, parent: NodeId, child: NodeId) {
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|c| *c != child);
        }
    }

    /// Recompute `id`'s local matrix, set its world matrix to
    /// `parent_world * local`, and recurse into its children.
    pub fn update_world_matrix(&mut self, id: NodeId, parent_world: &Matrix) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.local_matrix = compose_local_matrix(node.shape.as_ref(), node.translation);
        node.world_matrix = parent_world.multiply(&node.local_matrix);
        let world = node.world_matrix;
        let children = node.children.clone();
        for child in children {
            self.update_world_matrix(child, &world);
        }
    }

    /// Full top-down pass from the root.
    pub fn update_world_matrices(&mut self) {
        self.update_world_matrix(self.root, &Matrix::identity());
    }

    /// Recompute the subtree rooted at `id` from its parent's world matrix.
    pub fn refresh(&mut self, id: NodeId) -> SceneResult<()> {
        self.get(id)?;
        let parent_world = self.parent_world_matrix(id);
        self.update_world_matrix(id, &parent_world);
        Ok(())
    }

    /// Mutate a node's shape and refresh the node's subtree.
    pub fn modify_shape<R>(&mut self, id: NodeId, f: impl FnOnce(&mut Shape) -> R) -> SceneResult<Option<R>> {
        let result = self.get_mut(id)?.shape.as_mut().map(f);
        self.refresh(id)?;
        Ok(result)
    }

    /// Replace the shape owned by a node, returning the previous one.
    pub fn set_shape(&mut self, id: NodeId, shape: Option<Shape>) -> SceneResult<Option<Shape>> {
        let old = std::mem::replace(&mut self.get_mut(id)?.shape, shape);
        self.refresh(id)?;
        Ok(old)
    }

    /// Move a node's shape by a delta given in world space.
    pub fn move_shape(&mut self, id: NodeId, dx: f64, dy: f64) -> SceneResult<()> {
        let delta = self.world_to_parent_vector(id, Vec2::new(dx, dy));
        self.modify_shape(id, |shape| shape.move_shape(delta.x, delta.y))?;
        Ok(())
    }

    /// Offset a node (and its subtree) by a delta given in parent space.
    pub fn translate_node(&mut self, id: NodeId, dx: f64, dy: f64) -> SceneResult<()> {
        let translation = self.get(id)?.translation + Vec2::new(dx, dy);
        self.set_translation(id, translation)
    }

    pub fn set_translation(&mut self, id: NodeId, translation: Vec2) -> SceneResult<()> {
        self.get_mut(id)?.translation = translation;
        self.refresh(id)
    }

    /// Convert a world-space vector into the node's parent space.
    pub fn world_to_parent_vector(&self, id: NodeId, v: Vec2) -> Vec2 {
        self.parent_world_matrix(id)
            .inverse()
            .map(|inv| inv.apply_to_vector(v))
            .unwrap_or(v)
    }

    /// Convert a world-space point into the node's parent space.
    pub fn world_to_parent_point(&self, id: NodeId, p: Point) -> Point {
        self.parent_world_matrix(id)
            .inverse()
            .map(|inv| inv.apply_to_point(p.x, p.y))
            .unwrap_or(p)
    }

    /// Convert a world-space point into the node's local space.
    pub fn world_to_local_point(&self, id: NodeId, p: Point) -> Option<Point> {
        let inverse = self.world_matrix(id)?.inverse()?;
        Some(inverse.apply_to_point(p.x, p.y))
    }

    /// Destroy a node, its subtree and their shapes. The node is detached
    /// from its parent; no ancestor is touched otherwise. Destroying the
    /// root clears it but keeps it.
    pub fn destroy(&mut self, id: NodeId) -> SceneResult<()> {
        let parent = self.get(id)?.parent;
        if id == self.root {
            let children = std::mem::take(&mut self.get_mut(id)?.children);
            for child in children {
                self.destroy_subtree(child);
            }
            self.get_mut(id)?.shape = None;
            log::debug!("Cleared root node");
            return self.refresh(id);
        }
        if let Some(parent) = parent {
            self.unlink(parent, id);
        }
        self.destroy_subtree(id);
        Ok(())
    }

    fn destroy_subtree(&mut self, id: NodeId) {
        let Some(node) = self.nodes.remove(id) else {
            return;
        };
        log::debug!("Destroyed node {id:?}");
        for child in node.children {
            self.destroy_subtree(child);
        }
    }

    /// Nodes reachable from the root, in pre-order (back to front).
    pub fn draw_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    /// Topmost node whose shape contains the world-space `point`.
    pub fn hit_test(&self, point: Point) -> Option<NodeId> {
        self.draw_order().into_iter().rev().find(|id| {
            match (self.shape(*id), self.world_to_local_point(*id, point)) {
                (Some(shape), Some(local)) => shape.point_in_shape(local),
                _ => false,
            }
        })
    }

    /// Axis-aligned world-space bounds of a node's shape.
    pub fn world_bounds(&self, id: NodeId) -> Option<Rect> {
        let node = self.nodes.get(id)?;
        let rect = node.shape.as_ref()?.bounding_rect().as_rect();
        let corners: Vec<Point> = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ]
        .iter()
        .map(|p| node.world_matrix.apply_to_point(p.x, p.y))
        .collect();
        Some(polygon_bounds(&corners))
    }

    /// Draw every shape in draw order, each under its world matrix.
    pub fn render(&self, ctx: &mut RenderContext<'_>) {
        for id in self.draw_order() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            let Some(shape) = &node.shape else {
                continue;
            };
            ctx.scoped(|ctx| {
                ctx.surface.concat(&node.world_matrix);
                shape.draw(ctx);
            });
        }
    }
}
