//! 2D vector arithmetic for the depixelizing pipeline.
//!
//! World coordinates have their origin at the top-left of the padded raster,
//! x rightward and y downward. Scaling to SVG units happens only at
//! serialization time.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// A 2D point or direction in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint of `self` and `other`.
    pub fn midpoint(self, other: Vec2) -> Vec2 {
        (self + other) / 2.0
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl fmt::Display for Vec2 {
    /// Formats as `(x, y)`, the form SVG transform attributes expect.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, scalar: f64) -> Vec2 {
        Vec2::new(self.x * scalar, self.y * scalar)
    }
}

impl Div<f64> for Vec2 {
    type Output = Vec2;
    fn div(self, scalar: f64) -> Vec2 {
        assert!(scalar != 0.0, "cannot divide a vector by zero");
        Vec2::new(self.x / scalar, self.y / scalar)
    }
}

/// A quadratic Bézier arc: start, control, end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadBezier {
    pub p0: Vec2,
    pub p1: Vec2,
    pub p2: Vec2,
}

impl QuadBezier {
    pub fn new(p0: Vec2, p1: Vec2, p2: Vec2) -> Self {
        Self { p0, p1, p2 }
    }

    pub fn points(&self) -> [Vec2; 3] {
        [self.p0, self.p1, self.p2]
    }
}

/// Intersection of the infinite line through `p1`/`p2` with the infinite line
/// through `p3`/`p4`. Returns `None` when the lines are parallel.
pub fn line_intersection(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> Option<Vec2> {
    let d1 = p2 - p1;
    let d2 = p4 - p3;
    let denom = d1.x * d2.y - d1.y * d2.x;
    if denom.abs() < 1e-12 {
        return None;
    }
    let offset = p3 - p1;
    let t = (offset.x * d2.y - offset.y * d2.x) / denom;
    Some(p1 + d1 * t)
}

/// Signed shoelace area of a polygon. With y pointing down, a clockwise
/// winding on screen yields a positive value.
pub fn polygon_area(points: &[Vec2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vec2_arithmetic() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, -1.0);
        assert_eq!(a + b, Vec2::new(4.0, 1.0));
        assert_eq!(a - b, Vec2::new(-2.0, 3.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
        assert_eq!(b / 2.0, Vec2::new(1.5, -0.5));
    }

    #[test]
    #[should_panic(expected = "divide a vector by zero")]
    fn test_vec2_division_by_zero_panics() {
        let _ = Vec2::new(1.0, 1.0) / 0.0;
    }

    #[test]
    fn test_vec2_display_matches_svg_form() {
        assert_eq!(Vec2::new(40.0, 60.0).to_string(), "(40, 60)");
        assert_eq!(Vec2::new(0.5, 1.25).to_string(), "(0.5, 1.25)");
    }

    #[test]
    fn test_midpoint() {
        let m = Vec2::new(1.0, 1.0).midpoint(Vec2::new(3.0, 5.0));
        assert_eq!(m, Vec2::new(2.0, 3.0));
    }

    #[test]
    fn test_line_intersection_crossing() {
        // x axis crossed by a vertical line at x = 2
        let p = line_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, -1.0),
            Vec2::new(2.0, 1.0),
        )
        .unwrap();
        assert_relative_eq!(p.x, 2.0);
        assert_relative_eq!(p.y, 0.0);
    }

    #[test]
    fn test_line_intersection_parallel_is_none() {
        let p = line_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 2.0),
        );
        assert!(p.is_none());
    }

    #[test]
    fn test_polygon_area_unit_square() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        assert_relative_eq!(polygon_area(&square).abs(), 1.0);
    }

    #[test]
    fn test_polygon_area_degenerate() {
        assert_eq!(polygon_area(&[Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)]), 0.0);
    }
}
