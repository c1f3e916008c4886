use crate::utils::geometry::ALMOST_ZERO;

/// 2D vector with double precision, used for fitted-space and raw-space coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Vector2 {
    /// Create a new vector
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`
    pub fn sub(&self, other: &Vector2) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    /// Component-wise sum
    pub fn add(&self, other: &Vector2) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    /// Scale both components
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Z component of the 3D cross product
    pub fn cross(&self, other: &Vector2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Dot product
    pub fn dot(&self, other: &Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Euclidean length
    pub fn mag(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, `None` for (near) zero vectors
    pub fn norm(&self) -> Option<Self> {
        let mag = self.mag();
        if mag <= ALMOST_ZERO {
            return None;
        }
        Some(self.scale(1.0 / mag))
    }

    /// Distance to another point
    pub fn distance(&self, other: &Vector2) -> f64 {
        self.sub(other).mag()
    }

    /// Round to the nearest pixel the way the sampler addresses pixels
    pub fn to_pixel(&self) -> PixelLoc {
        PixelLoc::new((self.x + 0.5) as i32, (self.y + 0.5) as i32)
    }
}

/// Integer pixel location (bottom-up image coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PixelLoc {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
}

impl PixelLoc {
    /// Create a new pixel location
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by (dx, dy)
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Squared distance (no sqrt)
    pub fn distance_squared(&self, other: &PixelLoc) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// Location as a floating point vector
    pub fn to_vector(&self) -> Vector2 {
        Vector2::new(self.x as f64, self.y as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_and_norm() {
        let a = Vector2::new(1.0, 0.0);
        let b = Vector2::new(0.0, 2.0);
        assert_eq!(a.cross(&b), 2.0);
        assert_eq!(b.cross(&a), -2.0);
        let n = b.norm().unwrap();
        assert!((n.mag() - 1.0).abs() < 1e-12);
        assert!(Vector2::default().norm().is_none());
    }

    #[test]
    fn test_to_pixel_rounds() {
        assert_eq!(Vector2::new(2.4, 2.6).to_pixel(), PixelLoc::new(2, 3));
        assert_eq!(PixelLoc::new(3, 4).distance_squared(&PixelLoc::default()), 25);
    }
}
