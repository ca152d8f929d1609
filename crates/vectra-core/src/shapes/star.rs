//! Star shape.

use super::polygon::{MIN_SIDES, fit_radial, outline, radial_points};
use super::{BoundingRect, ShapeDetails, ShapeId, ShapeKind, ShapeStyle, ShapeTrait, ShapeTransform};
use crate::geometry::{FilletKind, point_in_polygon, polygon_bounds};
use crate::render::{Paint, RenderContext};
use kurbo::{BezPath, Point, Rect};
use serde::Serialize;
use uuid::Uuid;

/// A star with `spikes` outer points, the inner radius being `ratio` times
/// the outer one.
#[derive(Debug, Clone, Serialize)]
pub struct Star {
    id: ShapeId,
    center: Point,
    spikes: usize,
    /// Outer radii.
    radius_x: f64,
    radius_y: f64,
    /// Inner radius / outer radius, in `(0, 1]`.
    ratio: f64,
    corner_radius: f64,
    transform: ShapeTransform,
    style: ShapeStyle,
    bounds: BoundingRect,
}

impl Star {
    pub fn new(center: Point, spikes: usize, radius_x: f64, radius_y: f64, ratio: f64) -> Self {
        let mut star = Self {
            id: Uuid::new_v4(),
            center,
            spikes: spikes.max(MIN_SIDES),
            radius_x: radius_x.abs(),
            radius_y: radius_y.abs(),
            ratio: clamp_ratio(ratio),
            corner_radius: 0.0,
            transform: ShapeTransform::default(),
            style: ShapeStyle::default(),
            bounds: BoundingRect::enclosing(Rect::ZERO),
        };
        star.calculate_bounding_rect();
        star
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn spikes(&self) -> usize {
        self.spikes
    }

    pub fn set_spikes(&mut self, spikes: usize) {
        self.spikes = spikes.max(MIN_SIDES);
        self.calculate_bounding_rect();
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn set_ratio(&mut self, ratio: f64) {
        self.ratio = clamp_ratio(ratio);
        self.calculate_bounding_rect();
    }

    pub fn radius_x(&self) -> f64 {
        self.radius_x
    }

    pub fn radius_y(&self) -> f64 {
        self.radius_y
    }

    pub fn inner_radius_x(&self) -> f64 {
        self.radius_x * self.ratio
    }

    pub fn inner_radius_y(&self) -> f64 {
        self.radius_y * self.ratio
    }

    pub fn corner_radius(&self) -> f64 {
        self.corner_radius
    }

    pub fn set_corner_radius(&mut self, radius: f64) {
        self.corner_radius = radius.max(0.0);
    }

    /// `2 * spikes` points, outer at even indices and inner at odd ones.
    pub fn points(&self) -> Vec<Point> {
        let ratio = self.ratio;
        radial_points(self.center, self.radius_x, self.radius_y, self.spikes * 2, |i| {
            if i % 2 == 0 { 1.0 } else { ratio }
        })
    }

    pub fn to_path(&self) -> BezPath {
        outline(FilletKind::Star, &self.points(), self.spikes, self.corner_radius)
    }
}

fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() { ratio.clamp(0.01, 1.0) } else { 0.5 }
}

impl ShapeTrait for Star {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::Star
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
        let ratio = self.ratio;
        (self.center, self.radius_x, self.radius_y) =
            fit_radial(rect, self.spikes * 2, |i| if i % 2 == 0 { 1.0 } else { ratio });
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
        ShapeDetails::Star {
            center: self.center,
            spikes: self.spikes,
            radius_x: self.radius_x,
            radius_y: self.radius_y,
            ratio: self.ratio,
            corner_radius: self.corner_radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_alternate_radius() {
        let star = Star::new(Point::ZERO, 5, 10.0, 10.0, 0.5);
        let pts = star.points();
        assert_eq!(pts.len(), 10);
        for (i, p) in pts.iter().enumerate() {
            let r = p.to_vec2().hypot();
            let expected = if i % 2 == 0 { 10.0 } else { 5.0 };
            assert!((r - expected).abs() < 1e-9, "point {i}");
        }
    }

    #[test]
    fn test_hit_test_between_spikes() {
        let star = Star::new(Point::ZERO, 5, 10.0, 10.0, 0.3);
        assert!(star.point_in_shape(Point::ZERO));
        // Outer tip region is inside, the notch next to it is not.
        assert!(star.point_in_shape(Point::new(0.0, -8.0)));
        let notch = Point::new(6.0, -7.0);
        assert!(!star.point_in_shape(notch));
        assert!(star.bounding_rect().as_rect().contains(notch));
    }

    #[test]
    fn test_ratio_clamped() {
        let mut star = Star::new(Point::ZERO, 5, 10.0, 10.0, 3.0);
        assert!((star.ratio() - 1.0).abs() < f64::EPSILON);
        star.set_ratio(f64::NAN);
        assert!((star.ratio() - 0.5).abs() < f64::EPSILON);
        assert!((star.inner_radius_x() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rounded_star_path_stays_within_bounds() {
        let mut star = Star::new(Point::ZERO, 5, 10.0, 10.0, 0.5);
        star.set_corner_radius(100.0);
        let bounds = kurbo::Shape::bounding_box(&star.to_path());
        let outer = star.bounding_rect().as_rect().inflate(0.5, 0.5);
        assert!(outer.contains(bounds.origin()));
        assert!(outer.contains(Point::new(bounds.x1, bounds.y1)));
    }

    #[test]
    fn test_bounds_follow_outer_points() {
        let star = Star::new(Point::new(20.0, 20.0), 5, 20.0, 20.0, 0.5);
        let bounds = star.bounding_rect();
        let half_width = 20.0 * 18f64.to_radians().cos();
        assert!(bounds.top().abs() < 1e-9);
        assert!((bounds.bottom() - (20.0 + 20.0 * 54f64.to_radians().sin())).abs() < 1e-9);
        assert!((bounds.left() - (20.0 - half_width)).abs() < 1e-9);
        assert!((bounds.right() - (20.0 + half_width)).abs() < 1e-9);
    }

    #[test]
    fn test_fit_to_rect_spans_points() {
        let mut star = Star::new(Point::ZERO, 4, 10.0, 10.0, 0.3);
        star.set_spikes(5);
        let target = Rect::new(-30.0, 0.0, 30.0, 50.0);
        star.fit_to_rect(target);
        let bounds = star.bounding_rect().as_rect();
        assert!((bounds.x0 - target.x0).abs() < 1e-9);
        assert!((bounds.y0 - target.y0).abs() < 1e-9);
        assert!((bounds.x1 - target.x1).abs() < 1e-9);
        assert!((bounds.y1 - target.y1).abs() < 1e-9);
        assert!((star.ratio() - 0.3).abs() < f64::EPSILON);
    }
}
