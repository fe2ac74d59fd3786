//! 2D vector math.
//!
//! The host reports positions as doubles, so the whole core works in `f64`.
//! Every operation is total: degenerate inputs (zero-length vectors) yield
//! zero vectors or a zero angle instead of NaN.

use serde::{Deserialize, Serialize};

/// A point or displacement on the arena plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate (grows to the right).
    pub x: f64,
    /// Y coordinate (grows downwards).
    pub y: f64,
}

impl Vec2 {
    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared length (avoids sqrt for comparisons).
    #[must_use]
    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product.
    #[must_use]
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - other.x * self.y
    }

    /// Multiply both components by `factor`.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Rotate counter-clockwise (in a y-up frame) by `angle` radians.
    #[must_use]
    pub fn rotate(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Unit vector in the same direction, or zero for the zero vector.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            return Self::ZERO;
        }
        self.scale(1.0 / len)
    }

    /// Shorten the vector to at most `max_length`, keeping its direction.
    #[must_use]
    pub fn clamp_length(self, max_length: f64) -> Self {
        let len = self.length();
        if len > max_length && len > 0.0 {
            self.scale(max_length / len)
        } else {
            self
        }
    }

    /// Signed angle from `self` to `other` in `(-π, π]`.
    ///
    /// Positive when `other` lies counter-clockwise of `self`. Returns 0 when
    /// either vector has zero length.
    #[must_use]
    pub fn signed_angle_to(self, other: Self) -> f64 {
        if self.length_squared() == 0.0 || other.length_squared() == 0.0 {
            return 0.0;
        }
        self.cross(other).atan2(self.dot(other))
    }

    /// Point `distance` along the direction from `self` to `toward`.
    ///
    /// Negative distances move away from `toward`. Returns `self` when the
    /// two points coincide.
    #[must_use]
    pub fn step_toward(self, toward: Self, distance: f64) -> Self {
        self + (toward - self).normalize().scale(distance)
    }

    /// Whether the vector is exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Arithmetic mean of a set of points, `None` for an empty set.
pub fn mean<I>(points: I) -> Option<Vec2>
where
    I: IntoIterator<Item = Vec2>,
{
    let (sum, count) = points
        .into_iter()
        .fold((Vec2::ZERO, 0_usize), |(sum, count), p| (sum + p, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum.scale(1.0 / count as f64))
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

impl std::ops::Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}
