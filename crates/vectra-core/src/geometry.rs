//! Point, angle and fillet helpers shared by the shape variants.

use kurbo::{Arc, BezPath, Point, Rect, Vec2};
use std::f64::consts::{PI, TAU};

/// Tolerance used when flattening arcs into cubic segments.
pub const ARC_TOLERANCE: f64 = 0.1;

const DEGENERATE_EPS: f64 = 1e-9;

/// Normalize an angle in radians to `[0, 2π)`.
pub fn normalize_angle(theta: f64) -> f64 {
    let a = theta.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if a >= TAU { 0.0 } else { a }
}

/// Direction angle of the vector `a → b`, normalized to `[0, 2π)`.
pub fn angle_between(a: Point, b: Point) -> f64 {
    normalize_angle((b.y - a.y).atan2(b.x - a.x))
}

/// Even-odd ray casting test.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y) {
            let x_cross = (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Axis-aligned bounds of a point list (`Rect::ZERO` when empty).
pub fn polygon_bounds(points: &[Point]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::ZERO;
    };
    points
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |r, p| {
            Rect::new(r.x0.min(p.x), r.y0.min(p.y), r.x1.max(p.x), r.y1.max(p.y))
        })
}

/// Which outline a fillet is being computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilletKind {
    /// `side_count` vertices.
    Polygon,
    /// `2 * side_count` vertices alternating outer (even) and inner (odd).
    Star,
    /// Four right-angle corners.
    Rectangle,
}

/// A vertex trimmed by a tangent arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedCorner {
    /// The original sharp vertex.
    pub vertex: Point,
    /// Tangent point on the edge arriving at the vertex.
    pub start: Point,
    /// Tangent point on the edge leaving the vertex.
    pub end: Point,
    /// Arc center.
    pub center: Point,
    /// Effective radius after clamping (0 = sharp corner).
    pub radius: f64,
}

impl RoundedCorner {
    fn sharp(vertex: Point) -> Self {
        Self {
            vertex,
            start: vertex,
            end: vertex,
            center: vertex,
            radius: 0.0,
        }
    }

    pub fn is_sharp(&self) -> bool {
        self.radius <= 0.0
    }
}

/// Compute the fillet of `vertices[vertex_index]`.
///
/// The effective radius is clamped to `min(len1, len2) / 2 * tan(angle / 2)`,
/// where `len1`/`len2` are the adjacent edge lengths and `angle` the angle
/// between them, so neighbouring fillets never overlap. Each star vertex
/// (outer at even indices, inner at odd) is clamped against its own edges.
/// Degenerate input (zero-length edge, collinear or folded edges) yields a
/// sharp corner with radius 0.
pub fn compute_rounded_corner(
    kind: FilletKind,
    vertex_index: usize,
    vertices: &[Point],
    side_count: usize,
    requested_radius: f64,
) -> RoundedCorner {
    let expected = match kind {
        FilletKind::Polygon => side_count,
        FilletKind::Star => side_count * 2,
        FilletKind::Rectangle => 4,
    };
    let n = expected.min(vertices.len());
    if n == 0 {
        return RoundedCorner::sharp(Point::ZERO);
    }
    let index = vertex_index % n;
    let vertex = vertices[index];
    if n < 3 || requested_radius <= 0.0 || !requested_radius.is_finite() {
        return RoundedCorner::sharp(vertex);
    }

    let prev = vertices[(index + n - 1) % n];
    let next = vertices[(index + 1) % n];
    let v1 = prev - vertex;
    let v2 = next - vertex;
    let len1 = v1.hypot();
    let len2 = v2.hypot();
    if len1 < DEGENERATE_EPS || len2 < DEGENERATE_EPS {
        return RoundedCorner::sharp(vertex);
    }
    let u1 = v1 / len1;
    let u2 = v2 / len2;

    let angle = u1.dot(u2).clamp(-1.0, 1.0).acos();
    if angle < DEGENERATE_EPS || (PI - angle) < DEGENERATE_EPS {
        return RoundedCorner::sharp(vertex);
    }
    let half = angle / 2.0;
    let tan_half = half.tan();
    if tan_half.abs() < DEGENERATE_EPS || !tan_half.is_finite() {
        return RoundedCorner::sharp(vertex);
    }

    let max_radius = len1.min(len2) / 2.0 * tan_half;
    let radius = requested_radius.min(max_radius);

    let tangent_dist = radius / tan_half;
    let start = vertex + u1 * tangent_dist;
    let end = vertex + u2 * tangent_dist;
    let bisector = (u1 + u2).normalize();
    let center = vertex + bisector * (radius / half.sin());

    RoundedCorner {
        vertex,
        start,
        end,
        center,
        radius,
    }
}

/// Append a corner to `path`: a line (or move, for the first corner) to the
/// incoming tangent point followed by the fillet arc.
pub fn append_fillet(path: &mut BezPath, corner: &RoundedCorner, first: bool) {
    if first {
        path.move_to(corner.start);
    } else {
        path.line_to(corner.start);
    }
    if corner.is_sharp() {
        return;
    }
    let a0 = (corner.start.y - corner.center.y).atan2(corner.start.x - corner.center.x);
    let a1 = (corner.end.y - corner.center.y).atan2(corner.end.x - corner.center.x);
    let mut sweep = a1 - a0;
    if sweep > PI {
        sweep -= TAU;
    } else if sweep <= -PI {
        sweep += TAU;
    }
    let arc = Arc {
        center: corner.center,
        radii: Vec2::new(corner.radius, corner.radius),
        start_angle: a0,
        sweep_angle: sweep,
        x_rotation: 0.0,
    };
    path.extend(arc.append_iter(ARC_TOLERANCE));
}

/// Closed outline through `vertices` with every corner filleted by up to
/// `radii[i]` (missing entries are treated as sharp).
pub fn rounded_polygon_path(kind: FilletKind, vertices: &[Point], side_count: usize, radii: &[f64]) -> BezPath {
    let mut path = BezPath::new();
    for i in 0..vertices.len() {
        let requested = radii.get(i).copied().unwrap_or(0.0);
        let corner = compute_rounded_corner(kind, i, vertices, side_count, requested);
        append_fillet(&mut path, &corner, i == 0);
    }
    if !vertices.is_empty() {
        path.close_path();
    }
    path
}
