//! Segment and circle geometry used by the collision planner.
//!
//! Pure functions over finite doubles. Degenerate segments (coincident end
//! points) behave like points; nothing here divides by zero.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Sentinel distance returned when a perpendicular foot falls outside a segment.
pub const FAR_DISTANCE: f64 = 999_999.0;

/// A straight path between two points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Segment {
    /// Start point.
    pub from: Vec2,
    /// End point.
    pub to: Vec2,
}

impl Segment {
    /// Create a segment.
    #[must_use]
    pub const fn new(from: Vec2, to: Vec2) -> Self {
        Self { from, to }
    }

    /// Displacement from start to end.
    #[must_use]
    pub fn vector(&self) -> Vec2 {
        self.to - self.from
    }

    /// Segment length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.vector().length()
    }

    /// Whether both ends coincide.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.from == self.to
    }

    /// Whether `p` lies inside the axis-aligned box spanned by the segment.
    fn bounds_contain(&self, p: Vec2) -> bool {
        p.x >= self.from.x.min(self.to.x)
            && p.x <= self.from.x.max(self.to.x)
            && p.y >= self.from.y.min(self.to.y)
            && p.y <= self.from.y.max(self.to.y)
    }
}

/// Implicit line `a·x + b·y + c = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// X coefficient.
    pub a: f64,
    /// Y coefficient.
    pub b: f64,
    /// Constant term.
    pub c: f64,
}

impl Line {
    /// Line through two points.
    #[must_use]
    pub fn through(p: Vec2, q: Vec2) -> Self {
        Self {
            a: p.y - q.y,
            b: q.x - p.x,
            c: p.x * q.y - q.x * p.y,
        }
    }

    /// Intersection point with another line, `None` if parallel or degenerate.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Vec2> {
        let det = self.a * other.b - other.a * self.b;
        if det == 0.0 {
            return None;
        }
        Some(Vec2::new(
            (other.c * self.b - self.c * other.b) / det,
            (self.c * other.a - other.c * self.a) / det,
        ))
    }
}

/// Rotate `v` by `angle` radians.
#[must_use]
pub fn rotate(v: Vec2, angle: f64) -> Vec2 {
    v.rotate(angle)
}

/// Distance between two points.
#[must_use]
pub fn distance(a: Vec2, b: Vec2) -> f64 {
    a.distance(b)
}

/// Foot of the perpendicular from `c` onto the line through `a` and `b`.
///
/// When `a == b` the line is undefined and `a` is returned.
#[must_use]
pub fn segment_point_projection(a: Vec2, b: Vec2, c: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return a;
    }
    a + ab.scale((c - a).dot(ab) / len_sq)
}

/// Distance from `p` to its perpendicular foot on `segment`, or
/// [`FAR_DISTANCE`] when the foot lies outside the segment.
#[must_use]
pub fn perpendicular_distance_within(segment: &Segment, p: Vec2) -> f64 {
    let foot = segment_point_projection(segment.from, segment.to, p);
    if segment.bounds_contain(foot) {
        foot.distance(p)
    } else {
        FAR_DISTANCE
    }
}

/// Shortest distance from `p` to any point of `segment`.
#[must_use]
pub fn distance_point_to_segment(p: Vec2, segment: &Segment) -> f64 {
    perpendicular_distance_within(segment, p)
        .min(p.distance(segment.from))
        .min(p.distance(segment.to))
}

fn orientation(a: Vec2, b: Vec2, c: Vec2) -> f64 {
    (b - a).cross(c - a)
}

/// Whether two segments share at least one point.
#[must_use]
pub fn segments_cross(s1: &Segment, s2: &Segment) -> bool {
    let d1 = orientation(s2.from, s2.to, s1.from);
    let d2 = orientation(s2.from, s2.to, s1.to);
    let d3 = orientation(s1.from, s1.to, s2.from);
    let d4 = orientation(s1.from, s1.to, s2.to);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && s2.bounds_contain(s1.from))
        || (d2 == 0.0 && s2.bounds_contain(s1.to))
        || (d3 == 0.0 && s1.bounds_contain(s2.from))
        || (d4 == 0.0 && s1.bounds_contain(s2.to))
}

/// Minimum distance between two segments; 0 when they cross.
#[must_use]
pub fn distance_segment_to_segment(s1: &Segment, s2: &Segment) -> f64 {
    if segments_cross(s1, s2) {
        return 0.0;
    }

    let endpoints = [
        s1.from.distance(s2.from),
        s1.from.distance(s2.to),
        s1.to.distance(s2.from),
        s1.to.distance(s2.to),
        perpendicular_distance_within(s1, s2.from),
        perpendicular_distance_within(s1, s2.to),
        perpendicular_distance_within(s2, s1.from),
        perpendicular_distance_within(s2, s1.to),
    ];
    endpoints.into_iter().fold(f64::INFINITY, f64::min)
}

/// Whether `segment` passes strictly within `radius` of `center`.
#[must_use]
pub fn circle_intersects_segment(center: Vec2, radius: f64, segment: &Segment) -> bool {
    center.distance(segment.from) < radius
        || center.distance(segment.to) < radius
        || perpendicular_distance_within(segment, center) < radius
}
