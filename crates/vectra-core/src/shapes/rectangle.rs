//! Rectangle shape.

use super::{BoundingRect, ShapeDetails, ShapeId, ShapeKind, ShapeStyle, ShapeTrait, ShapeTransform, drag_rect};
use crate::render::{Paint, RenderContext};
use kurbo::{Point, Rect};
use serde::Serialize;
use uuid::Uuid;

/// A rectangle shape with optional rounded corners.
#[derive(Debug, Clone, Serialize)]
pub struct Rectangle {
    id: ShapeId,
    /// Top-left corner position.
    position: Point,
    width: f64,
    height: f64,
    /// Corner radius (0 = sharp corners).
    corner_radius: f64,
    transform: ShapeTransform,
    style: ShapeStyle,
    bounds: BoundingRect,
}

impl Rectangle {
    /// Create a new rectangle.
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        let mut rect = Self {
            id: Uuid::new_v4(),
            position,
            width: width.abs(),
            height: height.abs(),
            corner_radius: 0.0,
            transform: ShapeTransform::default(),
            style: ShapeStyle::default(),
            bounds: BoundingRect::enclosing(Rect::ZERO),
        };
        rect.calculate_bounding_rect();
        rect
    }

    /// Create a rectangle from two corner points.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        let rect = Rect::from_points(p1, p2);
        Self::new(rect.origin(), rect.width(), rect.height())
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Get the rectangle as a kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::from_origin_size(self.position, (self.width, self.height))
    }

    pub fn corner_radius(&self) -> f64 {
        self.corner_radius
    }

    pub fn set_corner_radius(&mut self, radius: f64) {
        self.corner_radius = radius.max(0.0);
    }

    /// Corner radius actually drawn, at most half the smaller side.
    pub fn effective_corner_radius(&self) -> f64 {
        self.corner_radius.min(self.width.min(self.height) / 2.0)
    }

    /// Resize while keeping the top-left corner.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width.abs();
        self.height = height.abs();
        self.calculate_bounding_rect();
    }
}

/// Square drag: side `max(|dx|, |dy|)`, growing away from `drag_start` in
/// the direction of the pointer.
pub(crate) fn square_from_drag(drag_start: Point, current: Point) -> Rect {
    let dx = current.x - drag_start.x;
    let dy = current.y - drag_start.y;
    let side = dx.abs().max(dy.abs());
    let x = if dx < 0.0 { drag_start.x - side } else { drag_start.x };
    let y = if dy < 0.0 { drag_start.y - side } else { drag_start.y };
    Rect::new(x, y, x + side, y + side)
}

impl ShapeTrait for Rectangle {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::Rectangle
    }

    fn bounding_rect(&self) -> BoundingRect {
        self.bounds
    }

    fn calculate_bounding_rect(&mut self) {
        self.bounds = BoundingRect::enclosing(self.as_rect());
    }

    fn point_in_shape(&self, point: Point) -> bool {
        let rect = self.as_rect();
        point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
    }

    fn move_shape(&mut self, dx: f64, dy: f64) {
        self.position.x += dx;
        self.position.y += dy;
        self.calculate_bounding_rect();
    }

    fn set_size(&mut self, drag_start: Point, current_x: f64, current_y: f64, constrain_square: bool) {
        let current = Point::new(current_x, current_y);
        let (rect, flip_x, flip_y) = drag_rect(drag_start, current);
        let rect = if constrain_square {
            square_from_drag(drag_start, current)
        } else {
            rect
        };
        self.transform.flip_x = flip_x;
        self.transform.flip_y = flip_y;
        self.position = rect.origin();
        self.width = rect.width();
        self.height = rect.height();
        self.calculate_bounding_rect();
    }

    fn fit_to_rect(&mut self, rect: Rect) {
        let rect = rect.abs();
        self.position = rect.origin();
        self.width = rect.width();
        self.height = rect.height();
        self.calculate_bounding_rect();
    }

    fn get_coord(&self) -> Point {
        self.position
    }

    fn draw(&self, ctx: &mut RenderContext<'_>) {
        let paint = Paint::from_style(&self.style);
        if !paint.is_visible() {
            return;
        }
        let radius = self.effective_corner_radius();
        if radius > 0.0 {
            ctx.surface.draw_rounded_rect(self.as_rect(), radius, &paint);
        } else {
            ctx.surface.draw_rect(self.as_rect(), &paint);
        }
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&self) -> &ShapeTransform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut ShapeTransform {
        &mut self.transform
    }

    fn details(&self) -> ShapeDetails {
        ShapeDetails::Rectangle {
            width: self.width,
            height: self.height,
            corner_radius: self.corner_radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_creation() {
        let rect = Rectangle::new(Point::new(10.0, 20.0), 100.0, 50.0);
        assert!((rect.width() - 100.0).abs() < f64::EPSILON);
        assert!((rect.height() - 50.0).abs() < f64::EPSILON);
        assert_eq!(rect.bounding_rect().as_rect(), Rect::new(10.0, 20.0, 110.0, 70.0));
    }

    #[test]
    fn test_from_corners() {
        let rect = Rectangle::from_corners(Point::new(100.0, 100.0), Point::new(0.0, 0.0));
        assert_eq!(rect.position(), Point::new(0.0, 0.0));
        assert!((rect.width() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_size_spans_drag_in_every_direction() {
        let start = Point::new(50.0, 50.0);
        for (mx, my) in [(80.0, 90.0), (20.0, 90.0), (80.0, 10.0), (20.0, 10.0)] {
            let mut rect = Rectangle::new(start, 0.0, 0.0);
            rect.set_size(start, mx, my, false);
            let b = rect.bounding_rect();
            assert!((b.left() - start.x.min(mx)).abs() < f64::EPSILON);
            assert!((b.top() - start.y.min(my)).abs() < f64::EPSILON);
            assert!((b.right() - start.x.max(mx)).abs() < f64::EPSILON);
            assert!((b.bottom() - start.y.max(my)).abs() < f64::EPSILON);
            assert_eq!(rect.transform().flip_x, mx < start.x);
            assert_eq!(rect.transform().flip_y, my < start.y);
        }
    }

    #[test]
    fn test_set_size_square_anchors_at_drag_start() {
        let start = Point::new(50.0, 50.0);
        let mut rect = Rectangle::new(start, 0.0, 0.0);
        rect.set_size(start, 80.0, 60.0, true);
        assert_eq!(rect.bounding_rect().as_rect(), Rect::new(50.0, 50.0, 80.0, 80.0));

        // Dragging up-left grows the square toward the pointer.
        rect.set_size(start, 40.0, 20.0, true);
        assert_eq!(rect.bounding_rect().as_rect(), Rect::new(20.0, 20.0, 50.0, 50.0));
    }

    #[test]
    fn test_point_in_shape() {
        let rect = Rectangle::new(Point::new(0.0, 0.0), 10.0, 10.0);
        assert!(rect.point_in_shape(Point::new(5.0, 5.0)));
        assert!(rect.point_in_shape(Point::new(10.0, 10.0)));
        assert!(!rect.point_in_shape(Point::new(10.5, 5.0)));
    }

    #[test]
    fn test_effective_corner_radius_is_clamped() {
        let mut rect = Rectangle::new(Point::ZERO, 20.0, 10.0);
        rect.set_corner_radius(50.0);
        assert!((rect.effective_corner_radius() - 5.0).abs() < f64::EPSILON);
        rect.set_corner_radius(-3.0);
        assert!(rect.corner_radius().abs() < f64::EPSILON);
    }
}
