//! Regular polygon shape.

use super::{BoundingRect, ShapeDetails, ShapeId, ShapeKind, ShapeStyle, ShapeTrait, ShapeTransform};
use crate::geometry::{FilletKind, point_in_polygon, polygon_bounds, rounded_polygon_path};
use crate::render::{Paint, RenderContext};
use kurbo::{BezPath, Point, Rect};
use serde::Serialize;
use std::f64::consts::{FRAC_PI_2, TAU};
use uuid::Uuid;

/// Fewest sides a polygon may have.
pub const MIN_SIDES: usize = 3;

/// `count` points around `center`, the first at the top, with the radius of
/// point `i` scaled by `radius_factor(i)`.
pub(crate) fn radial_points(
    center: Point,
    radius_x: f64,
    radius_y: f64,
    count: usize,
    radius_factor: impl Fn(usize) -> f64,
) -> Vec<Point> {
    (0..count)
        .map(|i| {
            let angle = i as f64 * (TAU / count as f64) - FRAC_PI_2;
            let k = radius_factor(i);
            Point::new(
                center.x + radius_x * k * angle.cos(),
                center.y + radius_y * k * angle.sin(),
            )
        })
        .collect()
}

/// Center and radii for which the `radial_points` vertices span `rect`.
pub(crate) fn fit_radial(rect: Rect, count: usize, radius_factor: impl Fn(usize) -> f64) -> (Point, f64, f64) {
    let rect = rect.abs();
    let unit = polygon_bounds(&radial_points(Point::ZERO, 1.0, 1.0, count, radius_factor));
    let radius_x = if unit.width() > 0.0 { rect.width() / unit.width() } else { 0.0 };
    let radius_y = if unit.height() > 0.0 { rect.height() / unit.height() } else { 0.0 };
    let center = Point::new(rect.x0 - unit.x0 * radius_x, rect.y0 - unit.y0 * radius_y);
    (center, radius_x, radius_y)
}

/// Closed outline through `points`, filleted when `corner_radius > 0`.
pub(crate) fn outline(kind: FilletKind, points: &[Point], side_count: usize, corner_radius: f64) -> BezPath {
    if corner_radius > 0.0 {
        return rounded_polygon_path(kind, points, side_count, &vec![corner_radius; points.len()]);
    }
    let mut path = BezPath::new();
    for (i, p) in points.iter().enumerate() {
        if i == 0 {
            path.move_to(*p);
        } else {
            path.line_to(*p);
        }
    }
    if !points.is_empty() {
        path.close_path();
    }
    path
}

/// A regular polygon inscribed in an ellipse.
#[derive(Debug, Clone, Serialize)]
pub struct Polygon {
    id: ShapeId,
    center: Point,
    sides: usize,
    radius_x: f64,
    radius_y: f64,
    corner_radius: f64,
    transform: ShapeTransform,
    style: ShapeStyle,
    bounds: BoundingRect,
}

impl Polygon {
    pub fn new(center: Point, sides: usize, radius_x: f64, radius_y: f64) -> Self {
        let mut polygon = Self {
            id: Uuid::new_v4(),
            center,
            sides: sides.max(MIN_SIDES),
            radius_x: radius_x.abs(),
            radius_y: radius_y.abs(),
            corner_radius: 0.0,
            transform: ShapeTransform::default(),
            style: ShapeStyle::default(),
            bounds: BoundingRect::enclosing(Rect::ZERO),
        };
        polygon.calculate_bounding_rect();
        polygon
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn sides(&self) -> usize {
        self.sides
    }

    pub fn set_sides(&mut self, sides: usize) {
        self.sides = sides.max(MIN_SIDES);
        self.calculate_bounding_rect();
    }

    pub fn radius_x(&self) -> f64 {
        self.radius_x
    }

    pub fn radius_y(&self) -> f64 {
        self.radius_y
    }

    pub fn corner_radius(&self) -> f64 {
        self.corner_radius
    }

    pub fn set_corner_radius(&mut self, radius: f64) {
        self.corner_radius = radius.max(0.0);
    }

    /// Vertex `i` at angle `i * 2π/N - π/2`.
    pub fn points(&self) -> Vec<Point> {
        radial_points(self.center, self.radius_x, self.radius_y, self.sides, |_| 1.0)
    }

    pub fn to_path(&self) -> BezPath {
        outline(FilletKind::Polygon, &self.points(), self.sides, self.corner_radius)
    }
}

impl ShapeTrait for Polygon {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::Polygon
    }

    fn bounding_rect(&self) -> BoundingRect {
        self.bounds
    }

    fn calculate_bounding_rect(&mut self) {
        self.bounds = BoundingRect::enclosing(polygon_bounds(&self.points()));
    }

    fn point_in_shape(&self, point: Point) -> bool {
        point_in_polygon(point, &self.points())
    }

    fn move_shape(&mut self, dx: f64, dy: f64) {
        self.center.x += dx;
        self.center.y += dy;
        self.calculate_bounding_rect();
    }

    fn set_size(&mut self, drag_start: Point, current_x: f64, current_y: f64, constrain_square: bool) {
        let rect = Rect::from_points(drag_start, Point::new(current_x, current_y));
        self.center = rect.center();
        self.radius_x = rect.width() / 2.0;
        self.radius_y = rect.height() / 2.0;
        if constrain_square {
            let r = self.radius_x.max(self.radius_y);
            self.radius_x = r;
            self.radius_y = r;
        }
        self.calculate_bounding_rect();
    }

    fn fit_to_rect(&mut self, rect: Rect) {
        (self.center, self.radius_x, self.radius_y) = fit_radial(rect, self.sides, |_| 1.0);
        self.calculate_bounding_rect();
    }

    fn get_coord(&self) -> Point {
        self.center
    }

    fn draw(&self, ctx: &mut RenderContext<'_>) {
        let paint = Paint::from_style(&self.style);
        if paint.is_visible() {
            ctx.surface.draw_path(&self.to_path(), &paint);
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
        ShapeDetails::Polygon {
            center: self.center,
            sides: self.sides,
            radius_x: self.radius_x,
            radius_y: self.radius_y,
            corner_radius: self.corner_radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pentagon_hit_test() {
        let pentagon = Polygon::new(Point::new(0.0, 0.0), 5, 10.0, 10.0);
        assert!(pentagon.point_in_shape(Point::new(0.0, 0.0)));
        assert!(!pentagon.point_in_shape(Point::new(100.0, 100.0)));
    }

    #[test]
    fn test_center_inside_for_any_side_count() {
        for sides in 3..12 {
            let polygon = Polygon::new(Point::new(5.0, -5.0), sides, 8.0, 3.0);
            assert!(polygon.point_in_shape(Point::new(5.0, -5.0)), "sides = {sides}");
        }
    }

    #[test]
    fn test_first_vertex_at_top() {
        let polygon = Polygon::new(Point::new(0.0, 0.0), 4, 10.0, 10.0);
        let pts = polygon.points();
        assert_eq!(pts.len(), 4);
        assert!(pts[0].x.abs() < 1e-9);
        assert!((pts[0].y + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_sides_clamped() {
        let mut polygon = Polygon::new(Point::ZERO, 1, 10.0, 10.0);
        assert_eq!(polygon.sides(), MIN_SIDES);
        polygon.set_sides(0);
        assert_eq!(polygon.sides(), MIN_SIDES);
    }

    #[test]
    fn test_set_size_from_drag() {
        let mut polygon = Polygon::new(Point::ZERO, 6, 0.0, 0.0);
        polygon.set_size(Point::new(10.0, 10.0), 50.0, 30.0, false);
        assert_eq!(polygon.center(), Point::new(30.0, 20.0));
        assert!((polygon.radius_x() - 20.0).abs() < f64::EPSILON);
        assert!((polygon.radius_y() - 10.0).abs() < f64::EPSILON);

        polygon.set_size(Point::new(10.0, 10.0), 50.0, 30.0, true);
        assert!((polygon.radius_y() - 20.0).abs() < f64::EPSILON);
        // Pointy-top hexagon: full height, width short of the circle by cos(30°).
        let bounds = polygon.bounding_rect();
        let half_width = 20.0 * 30f64.to_radians().cos();
        assert!((bounds.left() - (30.0 - half_width)).abs() < 1e-9);
        assert!((bounds.right() - (30.0 + half_width)).abs() < 1e-9);
        assert!(bounds.top().abs() < 1e-9);
        assert!((bounds.bottom() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_follow_vertices() {
        let pentagon = Polygon::new(Point::ZERO, 5, 10.0, 10.0);
        let bounds = pentagon.bounding_rect();
        let lowest = pentagon.points().iter().map(|p| p.y).fold(f64::MIN, f64::max);
        assert!((bounds.bottom() - lowest).abs() < 1e-9);
        assert!((bounds.bottom() - 10.0 * 54f64.to_radians().sin()).abs() < 1e-9);
        assert!((bounds.top() + 10.0).abs() < 1e-9);
        for p in pentagon.points() {
            assert!(bounds.as_rect().inflate(1e-9, 1e-9).contains(p));
        }
    }

    #[test]
    fn test_fit_to_rect_spans_vertices() {
        let mut pentagon = Polygon::new(Point::ZERO, 5, 10.0, 10.0);
        let target = Rect::new(10.0, 20.0, 70.0, 60.0);
        pentagon.fit_to_rect(target);
        let bounds = pentagon.bounding_rect().as_rect();
        assert!((bounds.x0 - target.x0).abs() < 1e-9);
        assert!((bounds.y0 - target.y0).abs() < 1e-9);
        assert!((bounds.x1 - target.x1).abs() < 1e-9);
        assert!((bounds.y1 - target.y1).abs() < 1e-9);
        // The top vertex sits on the top edge.
        assert!((pentagon.points()[0].y - 20.0).abs() < 1e-9);
    }
}
