//! Modifier handles: the resize, fillet and rotate controls around the
//! selected shape.
//!
//! Handles never own their position. It is derived from the shape's bounding
//! rect through [`Shape::get_modifiers_pos`] and cached until the next
//! [`ModifierHandles::update_resizer_positions`].

use crate::geometry::{angle_between, normalize_angle};
use crate::matrix::Matrix;
use crate::render::RenderContext;
use crate::scene::{NodeId, SceneError, SceneGraph, SceneResult, pivot_matrix};
use crate::shapes::{Shape, ShapeKind};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Distance between the top edge and the rotate handle.
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;

/// Symbolic position of a handle on the bounding rect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandlePosition {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl HandlePosition {
    pub const CORNERS: [HandlePosition; 4] = [
        HandlePosition::TopLeft,
        HandlePosition::TopRight,
        HandlePosition::BottomRight,
        HandlePosition::BottomLeft,
    ];

    pub const EDGES: [HandlePosition; 4] = [
        HandlePosition::Top,
        HandlePosition::Right,
        HandlePosition::Bottom,
        HandlePosition::Left,
    ];

    /// The position that stays fixed while this one is dragged.
    pub fn opposite(self) -> Self {
        match self {
            HandlePosition::TopLeft => HandlePosition::BottomRight,
            HandlePosition::Top => HandlePosition::Bottom,
            HandlePosition::TopRight => HandlePosition::BottomLeft,
            HandlePosition::Right => HandlePosition::Left,
            HandlePosition::BottomRight => HandlePosition::TopLeft,
            HandlePosition::Bottom => HandlePosition::Top,
            HandlePosition::BottomLeft => HandlePosition::TopRight,
            HandlePosition::Left => HandlePosition::Right,
        }
    }

    pub fn is_corner(self) -> bool {
        Self::CORNERS.contains(&self)
    }

    /// Whether dragging this handle changes the width / the height.
    fn axes(self) -> (bool, bool) {
        match self {
            HandlePosition::Top | HandlePosition::Bottom => (false, true),
            HandlePosition::Left | HandlePosition::Right => (true, false),
            _ => (true, true),
        }
    }

    /// The point of `rect` this position names.
    pub fn anchor_on(self, rect: Rect) -> Point {
        let c = rect.center();
        match self {
            HandlePosition::TopLeft => Point::new(rect.x0, rect.y0),
            HandlePosition::Top => Point::new(c.x, rect.y0),
            HandlePosition::TopRight => Point::new(rect.x1, rect.y0),
            HandlePosition::Right => Point::new(rect.x1, c.y),
            HandlePosition::BottomRight => Point::new(rect.x1, rect.y1),
            HandlePosition::Bottom => Point::new(c.x, rect.y1),
            HandlePosition::BottomLeft => Point::new(rect.x0, rect.y1),
            HandlePosition::Left => Point::new(rect.x0, c.y),
        }
    }
}

/// What dragging a handle does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleType {
    Size,
    Radius,
    Rotate,
}

/// Visual shape of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleShape {
    Square,
    Circle,
}

/// A single handle around the attached shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Handle {
    pub position: HandlePosition,
    pub handle_type: HandleType,
    /// Cached top-left corner in the shape's local space.
    pub local: Point,
    /// Cached center in world space.
    pub center: Point,
}

impl Handle {
    fn new(position: HandlePosition, handle_type: HandleType) -> Self {
        Self {
            position,
            handle_type,
            local: Point::ZERO,
            center: Point::ZERO,
        }
    }

    pub fn shape(&self) -> HandleShape {
        match self.handle_type {
            HandleType::Radius => HandleShape::Circle,
            HandleType::Size | HandleType::Rotate => HandleShape::Square,
        }
    }

    /// World-space hit test against a handle of side `size`.
    pub fn contains(&self, point: Point, size: f64) -> bool {
        let half = size / 2.0;
        let d = point - self.center;
        match self.shape() {
            HandleShape::Circle => d.hypot() <= half,
            HandleShape::Square => d.x.abs() <= half && d.y.abs() <= half,
        }
    }
}

/// Handles instantiated for each kind of shape.
pub fn handle_set(kind: ShapeKind) -> Vec<(HandlePosition, HandleType)> {
    let corners = HandlePosition::CORNERS.map(|p| (p, HandleType::Size));
    let mut set = corners.to_vec();
    match kind {
        ShapeKind::Oval | ShapeKind::Text => {}
        ShapeKind::Rectangle | ShapeKind::Image => {
            set.extend(HandlePosition::EDGES.map(|p| (p, HandleType::Size)));
            set.extend(HandlePosition::CORNERS.map(|p| (p, HandleType::Radius)));
        }
        ShapeKind::Polygon | ShapeKind::Star => {
            set.push((HandlePosition::Top, HandleType::Rotate));
        }
    }
    set
}

/// State captured when a handle drag begins.
#[derive(Debug, Clone)]
struct HandleDrag {
    handle: Handle,
    original: Shape,
    original_translation: Vec2,
}

/// The handle set of the currently attached node.
#[derive(Debug, Clone)]
pub struct ModifierHandles {
    target: Option<NodeId>,
    handles: Vec<Handle>,
    handle_size: f64,
    /// Rotation snapping step in radians.
    rotation_snap: f64,
    drag: Option<HandleDrag>,
}

impl ModifierHandles {
    pub fn new(handle_size: f64) -> Self {
        Self {
            target: None,
            handles: Vec::new(),
            handle_size,
            rotation_snap: 15f64.to_radians(),
            drag: None,
        }
    }

    pub fn with_rotation_snap(mut self, degrees: f64) -> Self {
        self.rotation_snap = degrees.to_radians();
        self
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn handles(&self) -> &[Handle] {
        &self.handles
    }

    pub fn handle_size(&self) -> f64 {
        self.handle_size
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Instantiate the handle set of `node`'s shape.
    pub fn attach(&mut self, scene: &SceneGraph, node: NodeId) -> SceneResult<()> {
        let shape = scene.shape(node).ok_or(SceneError::NodeNotFound(node))?;
        self.handles = handle_set(shape.kind())
            .into_iter()
            .map(|(position, handle_type)| Handle::new(position, handle_type))
            .collect();
        self.target = Some(node);
        self.drag = None;
        self.update_resizer_positions(scene);
        Ok(())
    }

    pub fn detach(&mut self) {
        self.target = None;
        self.handles.clear();
        self.drag = None;
    }

    /// Refresh every handle's cached position from the attached shape.
    pub fn update_resizer_positions(&mut self, scene: &SceneGraph) {
        let Some(target) = self.target else {
            return;
        };
        let (Some(shape), Some(world)) = (scene.shape(target), scene.world_matrix(target)) else {
            self.detach();
            return;
        };
        let half = self.handle_size / 2.0;
        for handle in &mut self.handles {
            handle.local = shape.get_modifiers_pos(handle.position, self.handle_size, handle.handle_type);
            handle.center = world.apply_to_point(handle.local.x + half, handle.local.y + half);
        }
    }

    /// Index of the topmost handle under a world-space point.
    pub fn hit_test(&self, point: Point) -> Option<usize> {
        self.handles
            .iter()
            .rposition(|h| h.contains(point, self.handle_size))
    }

    /// Start dragging the handle under `point`. Returns whether one was hit.
    pub fn begin_drag(&mut self, scene: &SceneGraph, point: Point) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        let Some(index) = self.hit_test(point) else {
            return false;
        };
        let (Some(shape), Some(node)) = (scene.shape(target), scene.node(target)) else {
            return false;
        };
        log::debug!("Begin {:?} drag at {:?}", self.handles[index].handle_type, self.handles[index].position);
        self.drag = Some(HandleDrag {
            handle: self.handles[index],
            original: shape.clone(),
            original_translation: node.translation(),
        });
        true
    }

    /// Apply the active drag for a pointer at world-space `point`. Every
    /// move re-applies the gesture to the shape as it was when the drag
    /// began. `shift` keeps the aspect ratio (size) or snaps the angle
    /// (rotate).
    pub fn drag_to(&mut self, scene: &mut SceneGraph, point: Point, shift: bool) -> SceneResult<()> {
        let (Some(target), Some(drag)) = (self.target, &self.drag) else {
            log::warn!("Handle drag update without an active drag");
            return Ok(());
        };
        let parent_point = scene.world_to_parent_point(target, point);
        let (shape, translation) = match drag.handle.handle_type {
            HandleType::Size => resize(drag, parent_point, shift),
            HandleType::Radius => (fillet(drag, parent_point), drag.original_translation),
            HandleType::Rotate => (rotate(drag, parent_point, shift, self.rotation_snap), drag.original_translation),
        };
        scene.set_shape(target, Some(shape))?;
        scene.set_translation(target, translation)?;
        self.update_resizer_positions(scene);
        Ok(())
    }

    /// Finish the drag, keeping the result.
    pub fn end_drag(&mut self, scene: &mut SceneGraph) {
        if self.drag.take().is_none() {
            return;
        }
        if let Some(target) = self.target {
            if let Some(text) = scene.shape_mut(target).and_then(Shape::as_text_mut) {
                text.commit_size();
            }
        }
        self.update_resizer_positions(scene);
    }

    /// Abort the drag and restore the shape as it was when it began.
    pub fn cancel_drag(&mut self, scene: &mut SceneGraph) -> SceneResult<()> {
        let (Some(target), Some(drag)) = (self.target, self.drag.take()) else {
            return Ok(());
        };
        scene.set_shape(target, Some(drag.original))?;
        scene.set_translation(target, drag.original_translation)?;
        self.update_resizer_positions(scene);
        Ok(())
    }

    /// Draw the handles at their world positions, unscaled.
    pub fn draw(&self, ctx: &mut RenderContext<'_>) {
        let half = self.handle_size / 2.0;
        for handle in &self.handles {
            let rect = Rect::new(
                handle.center.x - half,
                handle.center.y - half,
                handle.center.x + half,
                handle.center.y + half,
            );
            match handle.shape() {
                HandleShape::Square => ctx.surface.draw_rect(rect, &ctx.handle_paint),
                HandleShape::Circle => ctx.surface.draw_oval(rect, &ctx.handle_paint),
            }
        }
    }
}

/// Local pivot part of a shape's node matrix: rotation, scale and flips
/// about its visual center.
fn shape_frame(shape: &Shape) -> Matrix {
    let transform = shape.transform();
    pivot_matrix(shape.visual_center(), transform.rotation, transform.effective_scale())
}

/// Map a parent-space point into the original shape's local space.
fn original_local_point(drag: &HandleDrag, parent_point: Point) -> Point {
    let t = drag.original_translation;
    shape_frame(&drag.original)
        .inverse()
        .map(|inv| inv.apply_to_point(parent_point.x - t.x, parent_point.y - t.y))
        .unwrap_or(parent_point)
}

fn resize(drag: &HandleDrag, parent_point: Point, shift: bool) -> (Shape, Vec2) {
    let original = &drag.original;
    let bounds = original.bounding_rect().as_rect();
    let position = drag.handle.position;
    let anchor = position.opposite().anchor_on(bounds);
    let grabbed = position.anchor_on(bounds);
    let pointer = original_local_point(drag, parent_point);
    let (moves_x, moves_y) = position.axes();

    let mut dx = if moves_x { pointer.x - anchor.x } else { 0.0 };
    let mut dy = if moves_y { pointer.y - anchor.y } else { 0.0 };

    let keep_aspect = shift || original.as_image().is_some_and(|i| i.preserve_aspect_ratio);
    if keep_aspect && position.is_corner() && bounds.width() > f64::EPSILON && bounds.height() > f64::EPSILON {
        let factor = (dx.abs() / bounds.width()).max(dy.abs() / bounds.height());
        dx = (bounds.width() * factor).copysign(dx);
        dy = (bounds.height() * factor).copysign(dy);
    }

    let (x0, x1) = if moves_x {
        (anchor.x, anchor.x + dx)
    } else {
        (bounds.x0, bounds.x1)
    };
    let (y0, y1) = if moves_y {
        (anchor.y, anchor.y + dy)
    } else {
        (bounds.y0, bounds.y1)
    };
    let crossed_x = moves_x && (grabbed.x - anchor.x) * dx < 0.0;
    let crossed_y = moves_y && (grabbed.y - anchor.y) * dy < 0.0;

    let mut shape = original.clone();
    shape.fit_to_rect(Rect::new(x0, y0, x1, y1).abs());
    {
        let transform = shape.transform_mut();
        transform.flip_x ^= crossed_x;
        transform.flip_y ^= crossed_y;
    }

    // The new box is expressed in the original's frame. A pivot matrix fixes
    // its own center, so matching centers keeps the anchor on screen.
    let center = shape.visual_center();
    let translation = drag.original_translation + (shape_frame(original).apply_to_point(center.x, center.y) - center);
    (shape, translation)
}

fn fillet(drag: &HandleDrag, parent_point: Point) -> Shape {
    let original = &drag.original;
    let bounds = original.bounding_rect().as_rect();
    let position = drag.handle.position;
    let corner = position.anchor_on(bounds);
    let center = bounds.center();
    let pointer = original_local_point(drag, parent_point);
    let sx = if corner.x <= center.x { 1.0 } else { -1.0 };
    let sy = if corner.y <= center.y { 1.0 } else { -1.0 };
    // Distance along the corner's inward diagonal.
    let along = ((pointer.x - corner.x) * sx + (pointer.y - corner.y) * sy) / 2.0;
    let max = bounds.width().min(bounds.height()) / 2.0;
    let mut shape = original.clone();
    shape.set_corner_radius(position, along.clamp(0.0, max));
    shape
}

fn rotate(drag: &HandleDrag, parent_point: Point, snap: bool, step: f64) -> Shape {
    let original = &drag.original;
    let pivot = original.visual_center() + drag.original_translation;
    let mut angle = angle_between(pivot, parent_point) + FRAC_PI_2;
    if snap && step > 0.0 {
        angle = (angle / step).round() * step;
    }
    let mut shape = original.clone();
    shape.set_rotation(normalize_angle(angle));
    shape
}
