//! 3×3 affine transform used by the scene graph.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// An affine transform in homogeneous 3×3 form.
///
/// Backed by a [`kurbo::Affine`]. The homogeneous row-major layout is
///
/// ```text
/// | a  c  e |
/// | b  d  f |
/// | 0  0  1 |
/// ```
///
/// Composition reads left to right the way a scene graph is walked:
/// `parent.multiply(&local)` maps a point through `local` first and then
/// through `parent`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix(Affine);

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    /// The identity transform.
    pub const IDENTITY: Matrix = Matrix(Affine::IDENTITY);

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self(Affine::translate(Vec2::new(tx, ty)))
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self(Affine::scale_non_uniform(sx, sy))
    }

    /// Rotation by `theta` radians around the origin.
    pub fn rotate(theta: f64) -> Self {
        Self(Affine::rotate(theta))
    }

    /// Rotation by `theta` radians around `center`.
    pub fn rotate_about(theta: f64, center: Point) -> Self {
        Self::translate(center.x, center.y)
            .multiply(&Self::rotate(theta))
            .multiply(&Self::translate(-center.x, -center.y))
    }

    /// Non-uniform scale around `center`.
    pub fn scale_about(sx: f64, sy: f64, center: Point) -> Self {
        Self::translate(center.x, center.y)
            .multiply(&Self::scale(sx, sy))
            .multiply(&Self::translate(-center.x, -center.y))
    }

    /// Standard matrix product `self × other`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix(self.0 * other.0)
    }

    pub fn apply_to_point(&self, x: f64, y: f64) -> Point {
        self.0 * Point::new(x, y)
    }

    /// Apply only the linear part (no translation) to a vector.
    pub fn apply_to_vector(&self, v: Vec2) -> Vec2 {
        let [a, b, c, d, _, _] = self.0.as_coeffs();
        Vec2::new(a * v.x + c * v.y, b * v.x + d * v.y)
    }

    pub fn determinant(&self) -> f64 {
        self.0.determinant()
    }

    /// The inverse transform, or `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON || !det.is_finite() {
            return None;
        }
        Some(Matrix(self.0.inverse()))
    }

    /// Row-major homogeneous representation.
    pub fn rows(&self) -> [[f64; 3]; 3] {
        let [a, b, c, d, e, f] = self.0.as_coeffs();
        [[a, c, e], [b, d, f], [0.0, 0.0, 1.0]]
    }

    pub fn as_affine(&self) -> Affine {
        self.0
    }

    /// Component-wise comparison with tolerance.
    pub fn approx_eq(&self, other: &Matrix, eps: f64) -> bool {
        self.0
            .as_coeffs()
            .iter()
            .zip(other.0.as_coeffs().iter())
            .all(|(a, b)| (a - b).abs() <= eps)
    }
}

impl From<Affine> for Matrix {
    fn from(affine: Affine) -> Self {
        Self(affine)
    }
}

impl From<Matrix> for Affine {
    fn from(matrix: Matrix) -> Self {
        matrix.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_identity_is_neutral() {
        let m = Matrix::translate(3.0, 4.0).multiply(&Matrix::rotate(0.3));
        assert!(Matrix::identity().multiply(&m).approx_eq(&m, EPS));
        assert!(m.multiply(&Matrix::identity()).approx_eq(&m, EPS));
    }

    #[test]
    fn test_composition_order() {
        let t = Matrix::translate(10.0, 0.0);
        let s = Matrix::scale(2.0, 2.0);
        // Scale first, then translate.
        let p = t.multiply(&s).apply_to_point(1.0, 1.0);
        assert!((p.x - 12.0).abs() < EPS);
        assert!((p.y - 2.0).abs() < EPS);
        // Translate first, then scale.
        let q = s.multiply(&t).apply_to_point(1.0, 1.0);
        assert!((q.x - 22.0).abs() < EPS);
        assert!((q.y - 2.0).abs() < EPS);
    }

    #[test]
    fn test_rotate_about_keeps_center_fixed() {
        let center = Point::new(50.0, 25.0);
        let m = Matrix::rotate_about(FRAC_PI_2, center);
        let c = m.apply_to_point(center.x, center.y);
        assert!((c.x - center.x).abs() < EPS);
        assert!((c.y - center.y).abs() < EPS);
        let p = m.apply_to_point(60.0, 25.0);
        assert!((p.x - 50.0).abs() < EPS);
        assert!((p.y - 35.0).abs() < EPS);
    }

    #[test]
    fn test_inverse_round_trip() {
        let m = Matrix::translate(5.0, -3.0)
            .multiply(&Matrix::rotate(0.7))
            .multiply(&Matrix::scale(2.0, 0.5));
        let inv = m.inverse().unwrap();
        assert!(m.multiply(&inv).approx_eq(&Matrix::identity(), 1e-9));
    }

    #[test]
    fn test_singular_has_no_inverse() {
        assert!(Matrix::scale(0.0, 0.0).inverse().is_none());
        assert!(Matrix::scale(0.0, 3.0).inverse().is_none());
    }

    #[test]
    fn test_rows_layout() {
        let rows = Matrix::translate(7.0, 8.0).rows();
        assert_eq!(rows[0], [1.0, 0.0, 7.0]);
        assert_eq!(rows[1], [0.0, 1.0, 8.0]);
        assert_eq!(rows[2], [0.0, 0.0, 1.0]);
    }
}
