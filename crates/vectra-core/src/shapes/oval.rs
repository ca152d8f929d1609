//! Oval shape.

use super::{BoundingRect, ShapeDetails, ShapeId, ShapeKind, ShapeStyle, ShapeTrait, ShapeTransform, drag_rect};
use crate::render::{Paint, RenderContext};
use kurbo::{Point, Rect};
use serde::Serialize;
use uuid::Uuid;

/// An ellipse, or a circle when both radii agree.
#[derive(Debug, Clone, Serialize)]
pub struct Oval {
    id: ShapeId,
    /// Center point.
    center: Point,
    /// Horizontal radius.
    radius_x: f64,
    /// Vertical radius.
    radius_y: f64,
    transform: ShapeTransform,
    style: ShapeStyle,
    bounds: BoundingRect,
}

impl Oval {
    /// Create a new oval.
    pub fn new(center: Point, radius_x: f64, radius_y: f64) -> Self {
        let mut oval = Self {
            id: Uuid::new_v4(),
            center,
            radius_x: radius_x.abs(),
            radius_y: radius_y.abs(),
            transform: ShapeTransform::default(),
            style: ShapeStyle::default(),
            bounds: BoundingRect::enclosing(Rect::ZERO),
        };
        oval.calculate_bounding_rect();
        oval
    }

    /// Create a circle.
    pub fn circle(center: Point, radius: f64) -> Self {
        Self::new(center, radius, radius)
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn radius_x(&self) -> f64 {
        self.radius_x
    }

    pub fn radius_y(&self) -> f64 {
        self.radius_y
    }

    pub fn is_circle(&self) -> bool {
        (self.radius_x - self.radius_y).abs() < f64::EPSILON
    }

    fn as_rect(&self) -> Rect {
        Rect::new(
            self.center.x - self.radius_x,
            self.center.y - self.radius_y,
            self.center.x + self.radius_x,
            self.center.y + self.radius_y,
        )
    }
}

impl ShapeTrait for Oval {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::Oval
    }

    fn bounding_rect(&self) -> BoundingRect {
        self.bounds
    }

    fn calculate_bounding_rect(&mut self) {
        self.bounds = BoundingRect::enclosing(self.as_rect());
    }

    fn point_in_shape(&self, point: Point) -> bool {
        if self.radius_x < f64::EPSILON || self.radius_y < f64::EPSILON {
            return false;
        }
        let dx = (point.x - self.center.x) / self.radius_x;
        let dy = (point.y - self.center.y) / self.radius_y;
        dx * dx + dy * dy <= 1.0
    }

    fn move_shape(&mut self, dx: f64, dy: f64) {
        self.center.x += dx;
        self.center.y += dy;
        self.calculate_bounding_rect();
    }

    /// A free drag spans the drag rectangle. A constrained drag treats
    /// `drag_start` as the center of a circle, unlike rectangles which keep
    /// it as a corner.
    fn set_size(&mut self, drag_start: Point, current_x: f64, current_y: f64, constrain_square: bool) {
        let current = Point::new(current_x, current_y);
        if constrain_square {
            let radius = (current.x - drag_start.x)
                .abs()
                .max((current.y - drag_start.y).abs());
            self.center = drag_start;
            self.radius_x = radius;
            self.radius_y = radius;
        } else {
            let (rect, flip_x, flip_y) = drag_rect(drag_start, current);
            self.transform.flip_x = flip_x;
            self.transform.flip_y = flip_y;
            self.center = rect.center();
            self.radius_x = rect.width() / 2.0;
            self.radius_y = rect.height() / 2.0;
        }
        self.calculate_bounding_rect();
    }

    fn fit_to_rect(&mut self, rect: Rect) {
        let rect = rect.abs();
        self.center = rect.center();
        self.radius_x = rect.width() / 2.0;
        self.radius_y = rect.height() / 2.0;
        self.calculate_bounding_rect();
    }

    fn get_coord(&self) -> Point {
        self.center
    }

    fn draw(&self, ctx: &mut RenderContext<'_>) {
        let paint = Paint::from_style(&self.style);
        if paint.is_visible() {
            ctx.surface.draw_oval(self.as_rect(), &paint);
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
        ShapeDetails::Oval {
            center: self.center,
            radius_x: self.radius_x,
            radius_y: self.radius_y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_drag_uses_start_as_center() {
        let start = Point::new(100.0, 100.0);
        for (mx, my) in [(130.0, 110.0), (90.0, 60.0), (100.0, 100.0), (75.0, 140.0)] {
            let mut oval = Oval::circle(start, 0.0);
            oval.set_size(start, mx, my, true);
            let expected = (mx - start.x).abs().max((my - start.y).abs());
            assert_eq!(oval.center(), start);
            assert!((oval.radius_x() - expected).abs() < f64::EPSILON);
            assert!(oval.is_circle());
        }
    }

    #[test]
    fn test_free_drag_uses_midpoint() {
        let start = Point::new(0.0, 0.0);
        let mut oval = Oval::circle(start, 0.0);
        oval.set_size(start, -40.0, 20.0, false);
        assert_eq!(oval.center(), Point::new(-20.0, 10.0));
        assert!((oval.radius_x() - 20.0).abs() < f64::EPSILON);
        assert!((oval.radius_y() - 10.0).abs() < f64::EPSILON);
        assert!(oval.transform().flip_x);
        assert_eq!(oval.bounding_rect().as_rect(), Rect::new(-40.0, 0.0, 0.0, 20.0));
    }

    #[test]
    fn test_point_in_shape() {
        let oval = Oval::new(Point::new(0.0, 0.0), 20.0, 10.0);
        assert!(oval.point_in_shape(Point::new(0.0, 0.0)));
        assert!(oval.point_in_shape(Point::new(19.0, 0.0)));
        assert!(!oval.point_in_shape(Point::new(19.0, 9.0)));
        assert!(!Oval::circle(Point::ZERO, 0.0).point_in_shape(Point::ZERO));
    }
}
