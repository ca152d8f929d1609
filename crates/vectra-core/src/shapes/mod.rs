//! Shape definitions for the drawing surface.

mod image;
mod oval;
mod polygon;
mod rectangle;
mod star;
mod text;

pub use crate::color::SerializableColor;
pub use image::{CornerRadii, Image};
pub use oval::Oval;
pub use polygon::Polygon;
pub use rectangle::Rectangle;
pub use star::Star;
pub use text::{FontSizing, Text};

use crate::modifiers::{HandlePosition, HandleType, ROTATE_HANDLE_OFFSET};
use crate::render::RenderContext;
use crate::text_runs::Span;
use kurbo::{Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Smallest magnitude a scale component may take.
pub const MIN_SCALE: f64 = 1e-3;

/// Style properties for shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Stroke color.
    pub stroke_color: SerializableColor,
    /// Stroke width (0 = no stroke).
    pub stroke_width: f64,
    /// Fill color (None = no fill).
    pub fill_color: Option<SerializableColor>,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl ShapeStyle {
    /// Get the stroke color as a peniko Color.
    pub fn stroke(&self) -> Color {
        self.stroke_color.into()
    }

    /// Get the fill color as a peniko Color.
    pub fn fill(&self) -> Option<Color> {
        self.fill_color.map(|c| c.into())
    }

    /// Set the stroke color from a peniko Color.
    pub fn set_stroke(&mut self, color: Color) {
        self.stroke_color = color.into();
    }

    /// Set the fill color from a peniko Color.
    pub fn set_fill(&mut self, color: Option<Color>) {
        self.fill_color = color.map(|c| c.into());
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            stroke_width: 2.0,
            fill_color: None,
            opacity: 1.0,
        }
    }
}

/// Rotation, scale and flip of a shape about its visual center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeTransform {
    /// Rotation in radians.
    pub rotation: f64,
    scale_x: f64,
    scale_y: f64,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Default for ShapeTransform {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            flip_x: false,
            flip_y: false,
        }
    }
}

impl ShapeTransform {
    pub fn scale(&self) -> Vec2 {
        Vec2::new(self.scale_x, self.scale_y)
    }

    /// Set the scale. Components are kept at least [`MIN_SCALE`] in
    /// magnitude so the transform stays invertible.
    pub fn set_scale(&mut self, sx: f64, sy: f64) {
        let guard = |s: f64| {
            if !s.is_finite() {
                1.0
            } else if s.abs() < MIN_SCALE {
                MIN_SCALE.copysign(s)
            } else {
                s
            }
        };
        self.scale_x = guard(sx);
        self.scale_y = guard(sy);
    }

    /// Scale with flips folded in as negative components.
    pub fn effective_scale(&self) -> Vec2 {
        Vec2::new(
            if self.flip_x { -self.scale_x } else { self.scale_x },
            if self.flip_y { -self.scale_y } else { self.scale_y },
        )
    }
}

/// Cached axis-aligned bounds of a shape in its local space.
///
/// Only shapes can produce one, from their current parametric state, in
/// their `calculate_bounding_rect` implementation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingRect {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl BoundingRect {
    pub(crate) fn enclosing(rect: Rect) -> Self {
        let rect = rect.abs();
        Self {
            left: rect.x0,
            top: rect.y0,
            right: rect.x1,
            bottom: rect.y1,
        }
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn right(&self) -> f64 {
        self.right
    }

    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Point {
        Point::new((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.right, self.bottom)
    }
}

/// The shape variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle,
    Oval,
    Polygon,
    Star,
    Image,
    Text,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Oval => "oval",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Star => "star",
            ShapeKind::Image => "image",
            ShapeKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// Kind-specific parameters exposed to property panels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeDetails {
    Rectangle {
        width: f64,
        height: f64,
        corner_radius: f64,
    },
    Oval {
        center: Point,
        radius_x: f64,
        radius_y: f64,
    },
    Polygon {
        center: Point,
        sides: usize,
        radius_x: f64,
        radius_y: f64,
        corner_radius: f64,
    },
    Star {
        center: Point,
        spikes: usize,
        radius_x: f64,
        radius_y: f64,
        ratio: f64,
        corner_radius: f64,
    },
    Image {
        width: f64,
        height: f64,
        aspect_ratio: f64,
        preserve_aspect_ratio: bool,
        corner_radii: CornerRadii,
        radius_locked: bool,
        loaded: bool,
    },
    Text {
        content: String,
        font_size: f64,
        cursor: usize,
        spans: Vec<Span>,
    },
}

/// Serializable snapshot of a shape's style and geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeProperties {
    pub id: ShapeId,
    pub kind: ShapeKind,
    pub bounds: Rect,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub flip_x: bool,
    pub flip_y: bool,
    pub style: ShapeStyle,
    pub details: ShapeDetails,
}

impl ShapeProperties {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Common contract for all shapes.
///
/// Geometry is expressed in the owning scene node's local space. Every
/// method that changes parametric geometry ends by calling
/// [`ShapeTrait::calculate_bounding_rect`]; nothing else writes the cached
/// bounds.
pub trait ShapeTrait {
    fn id(&self) -> ShapeId;

    fn kind(&self) -> ShapeKind;

    /// The cached bounds.
    fn bounding_rect(&self) -> BoundingRect;

    /// Recompute the cached bounds from the current parameters. Idempotent.
    fn calculate_bounding_rect(&mut self);

    /// Hit test in local space.
    fn point_in_shape(&self, point: Point) -> bool;

    /// Translate the shape.
    fn move_shape(&mut self, dx: f64, dy: f64);

    /// Update geometry from a creation drag from `drag_start` to the pointer.
    fn set_size(&mut self, drag_start: Point, current_x: f64, current_y: f64, constrain_square: bool);

    /// Make the shape occupy `rect` (used by size handles).
    fn fit_to_rect(&mut self, rect: Rect);

    /// The shape's anchor coordinate (origin or center, depending on kind).
    fn get_coord(&self) -> Point;

    /// Move the shape so its anchor coordinate becomes `coord`.
    fn set_coord(&mut self, coord: Point) {
        let current = self.get_coord();
        self.move_shape(coord.x - current.x, coord.y - current.y);
    }

    /// Emit draw commands in local space.
    fn draw(&self, ctx: &mut RenderContext<'_>);

    fn style(&self) -> &ShapeStyle;

    fn style_mut(&mut self) -> &mut ShapeStyle;

    fn transform(&self) -> &ShapeTransform;

    fn transform_mut(&mut self) -> &mut ShapeTransform;

    fn details(&self) -> ShapeDetails;
}

/// Closed set of shape variants.
#[derive(Debug, Clone, Serialize)]
pub enum Shape {
    Rectangle(Rectangle),
    Oval(Oval),
    Polygon(Polygon),
    Star(Star),
    Image(Image),
    Text(Text),
}

impl Shape {
    fn as_dyn(&self) -> &dyn ShapeTrait {
        match self {
            Shape::Rectangle(s) => s,
            Shape::Oval(s) => s,
            Shape::Polygon(s) => s,
            Shape::Star(s) => s,
            Shape::Image(s) => s,
            Shape::Text(s) => s,
        }
    }

    fn as_dyn_mut(&mut self) -> &mut dyn ShapeTrait {
        match self {
            Shape::Rectangle(s) => s,
            Shape::Oval(s) => s,
            Shape::Polygon(s) => s,
            Shape::Star(s) => s,
            Shape::Image(s) => s,
            Shape::Text(s) => s,
        }
    }

    pub fn id(&self) -> ShapeId {
        self.as_dyn().id()
    }

    pub fn kind(&self) -> ShapeKind {
        self.as_dyn().kind()
    }

    pub fn bounding_rect(&self) -> BoundingRect {
        self.as_dyn().bounding_rect()
    }

    pub fn calculate_bounding_rect(&mut self) {
        self.as_dyn_mut().calculate_bounding_rect()
    }

    pub fn point_in_shape(&self, point: Point) -> bool {
        self.as_dyn().point_in_shape(point)
    }

    pub fn move_shape(&mut self, dx: f64, dy: f64) {
        self.as_dyn_mut().move_shape(dx, dy)
    }

    pub fn set_size(&mut self, drag_start: Point, current_x: f64, current_y: f64, constrain_square: bool) {
        self.as_dyn_mut()
            .set_size(drag_start, current_x, current_y, constrain_square)
    }

    pub fn fit_to_rect(&mut self, rect: Rect) {
        self.as_dyn_mut().fit_to_rect(rect)
    }

    pub fn get_coord(&self) -> Point {
        self.as_dyn().get_coord()
    }

    pub fn set_coord(&mut self, coord: Point) {
        self.as_dyn_mut().set_coord(coord)
    }

    pub fn draw(&self, ctx: &mut RenderContext<'_>) {
        self.as_dyn().draw(ctx)
    }

    pub fn style(&self) -> &ShapeStyle {
        self.as_dyn().style()
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        self.as_dyn_mut().style_mut()
    }

    pub fn transform(&self) -> &ShapeTransform {
        self.as_dyn().transform()
    }

    pub fn transform_mut(&mut self) -> &mut ShapeTransform {
        self.as_dyn_mut().transform_mut()
    }

    /// Pivot for rotation and scale: the center of the bounding rect.
    pub fn visual_center(&self) -> Point {
        self.bounding_rect().center()
    }

    /// Get the rotation angle in radians.
    pub fn rotation(&self) -> f64 {
        self.transform().rotation
    }

    /// Set the rotation angle in radians.
    pub fn set_rotation(&mut self, rotation: f64) {
        self.transform_mut().rotation = rotation;
    }

    /// Fillet radius at a corner handle position.
    pub fn corner_radius(&self, position: HandlePosition) -> f64 {
        match self {
            Shape::Rectangle(r) => r.corner_radius(),
            Shape::Image(i) => i.corner_radii().get(position),
            Shape::Polygon(p) => p.corner_radius(),
            Shape::Star(s) => s.corner_radius(),
            Shape::Oval(_) | Shape::Text(_) => 0.0,
        }
    }

    /// Set the fillet radius at a corner. Shapes with a single radius (and
    /// images with locked radii) apply it to every corner.
    pub fn set_corner_radius(&mut self, position: HandlePosition, radius: f64) {
        match self {
            Shape::Rectangle(r) => r.set_corner_radius(radius),
            Shape::Image(i) => i.set_corner_radius(position, radius),
            Shape::Polygon(p) => p.set_corner_radius(radius),
            Shape::Star(s) => s.set_corner_radius(radius),
            Shape::Oval(_) | Shape::Text(_) => {}
        }
    }

    /// Top-left corner of a handle box in local space, derived from the
    /// bounding rect and the handle's position tag only.
    pub fn get_modifiers_pos(&self, position: HandlePosition, handle_size: f64, handle_type: HandleType) -> Point {
        let bounds = self.bounding_rect();
        let rect = bounds.as_rect();
        let half = handle_size / 2.0;
        match handle_type {
            HandleType::Size => {
                let p = position.anchor_on(rect);
                Point::new(p.x - half, p.y - half)
            }
            HandleType::Radius => {
                let corner = position.anchor_on(rect);
                let center = bounds.center();
                let inset = self
                    .corner_radius(position)
                    .max(handle_size * 1.5)
                    .min(bounds.width() / 2.0)
                    .min(bounds.height() / 2.0);
                let sx = if corner.x <= center.x { 1.0 } else { -1.0 };
                let sy = if corner.y <= center.y { 1.0 } else { -1.0 };
                Point::new(corner.x + sx * inset - half, corner.y + sy * inset - half)
            }
            HandleType::Rotate => {
                let top = HandlePosition::Top.anchor_on(rect);
                Point::new(top.x - half, top.y - ROTATE_HANDLE_OFFSET - half)
            }
        }
    }

    /// Snapshot for property panels.
    pub fn properties(&self) -> ShapeProperties {
        let transform = self.transform();
        let scale = transform.scale();
        ShapeProperties {
            id: self.id(),
            kind: self.kind(),
            bounds: self.bounding_rect().as_rect(),
            rotation: transform.rotation,
            scale_x: scale.x,
            scale_y: scale.y,
            flip_x: transform.flip_x,
            flip_y: transform.flip_y,
            style: self.style().clone(),
            details: self.as_dyn().details(),
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Shape::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Shape::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Shape::Image(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut Image> {
        match self {
            Shape::Image(i) => Some(i),
            _ => None,
        }
    }
}

/// Rect spanning two drag points, with per-axis flip flags recording a
/// negative drag direction.
pub(crate) fn drag_rect(drag_start: Point, current: Point) -> (Rect, bool, bool) {
    let rect = Rect::from_points(drag_start, current);
    (rect, current.x < drag_start.x, current.y < drag_start.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_kinds() -> Vec<Shape> {
        vec![
            Shape::Rectangle(Rectangle::new(Point::new(0.0, 0.0), 40.0, 20.0)),
            Shape::Oval(Oval::new(Point::new(20.0, 10.0), 20.0, 10.0)),
            Shape::Polygon(Polygon::new(Point::new(20.0, 10.0), 5, 20.0, 10.0)),
            Shape::Star(Star::new(Point::new(20.0, 10.0), 5, 20.0, 10.0, 0.5)),
            Shape::Image(Image::new(Point::new(0.0, 0.0), 40.0, 20.0)),
            Shape::Text(Text::new(Point::new(0.0, 0.0), "hello")),
        ]
    }

    #[test]
    fn test_calculate_bounding_rect_is_idempotent() {
        for mut shape in all_kinds() {
            shape.calculate_bounding_rect();
            let first = shape.bounding_rect();
            shape.calculate_bounding_rect();
            assert_eq!(first, shape.bounding_rect(), "{}", shape.kind());
        }
    }

    #[test]
    fn test_move_shape_translates_bounds() {
        for mut shape in all_kinds() {
            let before = shape.bounding_rect();
            shape.move_shape(5.0, -3.0);
            let after = shape.bounding_rect();
            assert!((after.left() - before.left() - 5.0).abs() < 1e-9, "{}", shape.kind());
            assert!((after.top() - before.top() + 3.0).abs() < 1e-9, "{}", shape.kind());
            assert!((after.width() - before.width()).abs() < 1e-9, "{}", shape.kind());
        }
    }

    #[test]
    fn test_set_coord_moves_anchor() {
        for mut shape in all_kinds() {
            shape.set_coord(Point::new(100.0, 200.0));
            let coord = shape.get_coord();
            assert!((coord.x - 100.0).abs() < 1e-9);
            assert!((coord.y - 200.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_modifier_positions_follow_bounds() {
        let shape = Shape::Rectangle(Rectangle::new(Point::new(10.0, 20.0), 100.0, 50.0));
        let p = shape.get_modifiers_pos(HandlePosition::TopLeft, 8.0, HandleType::Size);
        assert_eq!(p, Point::new(6.0, 16.0));
        let p = shape.get_modifiers_pos(HandlePosition::BottomRight, 8.0, HandleType::Size);
        assert_eq!(p, Point::new(106.0, 66.0));
        let p = shape.get_modifiers_pos(HandlePosition::Right, 8.0, HandleType::Size);
        assert_eq!(p, Point::new(106.0, 41.0));
        let p = shape.get_modifiers_pos(HandlePosition::Top, 8.0, HandleType::Rotate);
        assert_eq!(p, Point::new(56.0, 16.0 - ROTATE_HANDLE_OFFSET));
        // Radius handles sit inside the corner.
        let p = shape.get_modifiers_pos(HandlePosition::BottomRight, 8.0, HandleType::Radius);
        assert_eq!(p, Point::new(110.0 - 12.0 - 4.0, 70.0 - 12.0 - 4.0));
    }

    #[test]
    fn test_scale_never_reaches_zero() {
        let mut t = ShapeTransform::default();
        t.set_scale(0.0, -0.0);
        assert!(t.scale().x.abs() >= MIN_SCALE);
        assert!(t.scale().y.abs() >= MIN_SCALE);
        t.flip_x = true;
        t.set_scale(2.0, 3.0);
        assert_eq!(t.effective_scale(), Vec2::new(-2.0, 3.0));
    }

    #[test]
    fn test_properties_serialize() {
        let shape = Shape::Star(Star::new(Point::new(0.0, 0.0), 5, 10.0, 10.0, 0.4));
        let props = shape.properties();
        assert_eq!(props.kind, ShapeKind::Star);
        let json = props.to_json().unwrap();
        assert!(json.contains("\"star\""));
        assert!(json.contains("\"spikes\": 5"));
    }
}
