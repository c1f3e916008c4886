//! Homogeneous 2D transforms, rays and corner checks used by the region locator
//!
//! Matrices follow the row-vector convention: a point `p` maps to `p · M`, so
//! `A * B` applies `A` first.

use crate::models::Vector2;
use std::ops::Mul;

/// Threshold below which lengths and determinants count as zero
pub const ALMOST_ZERO: f64 = 0.000001;

/// 3x3 homogeneous transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3(pub [[f64; 3]; 3]);

impl Default for Matrix3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix3 {
    /// Identity transform
    pub fn identity() -> Self {
        Self::translate(0.0, 0.0)
    }

    /// Translation by (tx, ty)
    pub fn translate(tx: f64, ty: f64) -> Self {
        Matrix3([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [tx, ty, 1.0]])
    }

    /// Counter-clockwise rotation by `angle` radians
    pub fn rotate(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Matrix3([[cos, sin, 0.0], [-sin, cos, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Axis scaling
    pub fn scale(sx: f64, sy: f64) -> Self {
        Matrix3([[sx, 0.0, 0.0], [0.0, sy, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Shear: x gains `shx · y`, y gains `shy · x`
    pub fn shear(shx: f64, shy: f64) -> Self {
        Matrix3([[1.0, shy, 0.0], [shx, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Projective skew mapping a top edge of length `b0` onto length `b1`
    pub fn line_skew_top(b0: f64, b1: f64, sz: f64) -> Option<Self> {
        if b0 < ALMOST_ZERO {
            return None;
        }
        Some(Matrix3([
            [b1 / b0, 0.0, (b1 - b0) / (sz * b0)],
            [0.0, sz / b0, 0.0],
            [0.0, 0.0, 1.0],
        ]))
    }

    /// Inverse of [`Matrix3::line_skew_top`]
    pub fn line_skew_top_inv(b0: f64, b1: f64, sz: f64) -> Option<Self> {
        if b1 < ALMOST_ZERO {
            return None;
        }
        Some(Matrix3([
            [b0 / b1, 0.0, (b0 - b1) / (sz * b1)],
            [0.0, b0 / sz, 0.0],
            [0.0, 0.0, 1.0],
        ]))
    }

    /// Projective skew mapping a side edge of length `b0` onto length `b1`
    pub fn line_skew_side(b0: f64, b1: f64, sz: f64) -> Option<Self> {
        if b0 < ALMOST_ZERO {
            return None;
        }
        Some(Matrix3([
            [sz / b0, 0.0, 0.0],
            [0.0, b1 / b0, (b1 - b0) / (sz * b0)],
            [0.0, 0.0, 1.0],
        ]))
    }

    /// Inverse of [`Matrix3::line_skew_side`]
    pub fn line_skew_side_inv(b0: f64, b1: f64, sz: f64) -> Option<Self> {
        if b1 < ALMOST_ZERO {
            return None;
        }
        Some(Matrix3([
            [b0 / sz, 0.0, 0.0],
            [0.0, b0 / b1, (b0 - b1) / (sz * b1)],
            [0.0, 0.0, 1.0],
        ]))
    }

    /// Map a point through the transform; `None` when it lands at infinity
    pub fn apply(&self, v: Vector2) -> Option<Vector2> {
        let m = &self.0;
        let w = (v.x * m[0][2] + v.y * m[1][2] + m[2][2]).abs();
        if w <= ALMOST_ZERO {
            return None;
        }
        Some(Vector2::new(
            (v.x * m[0][0] + v.y * m[1][0] + m[2][0]) / w,
            (v.x * m[0][1] + v.y * m[1][1] + m[2][1]) / w,
        ))
    }
}

impl Mul for Matrix3 {
    type Output = Matrix3;

    fn mul(self, rhs: Matrix3) -> Matrix3 {
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.0[i][k] * rhs.0[k][j]).sum();
            }
        }
        Matrix3(out)
    }
}

/// Half-line from `p` along the unit vector `v`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ray2 {
    /// Origin
    pub p: Vector2,
    /// Unit direction
    pub v: Vector2,
}

impl Ray2 {
    /// Ray through `p` at `degrees` from the x axis
    pub fn from_angle(p: Vector2, degrees: i32) -> Self {
        let radians = degrees as f64 * std::f64::consts::PI / 180.0;
        Self {
            p,
            v: Vector2::new(radians.cos(), radians.sin()),
        }
    }

    /// Point at parameter `t`
    pub fn point_at(&self, t: f64) -> Vector2 {
        self.p.add(&self.v.scale(t))
    }

    /// Signed perpendicular distance of `q` from the ray
    pub fn distance_from(&self, q: Vector2) -> f64 {
        self.v.cross(&q.sub(&self.p))
    }

    /// Distance of `q` along the ray
    pub fn distance_along(&self, q: Vector2) -> f64 {
        q.sub(&self.p).dot(&self.v)
    }
}

/// Intersection of two rays, `None` when they are parallel
pub fn intersect(r0: &Ray2, r1: &Ray2) -> Option<Vector2> {
    let denominator = r1.v.cross(&r0.v);
    if denominator.abs() < ALMOST_ZERO {
        return None;
    }
    let numerator = r1.v.cross(&r1.p.sub(&r0.p));
    Some(r0.point_at(numerator / denominator))
}

/// Cosine-like score of how close the corner c0-c1-c2 is to `angle`; 1.0 is exact
pub fn right_angle_trueness(c0: Vector2, c1: Vector2, c2: Vector2, angle: f64) -> f64 {
    let (Some(va), Some(vb)) = (c0.sub(&c1).norm(), c2.sub(&c1).norm()) else {
        return -1.0;
    };
    match Matrix3::rotate(angle).apply(vb) {
        Some(vb) => va.dot(&vb),
        None => -1.0,
    }
}
