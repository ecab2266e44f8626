use super::{Point2d, Vector2d};
use cgmath::EuclideanSpace;
use std::f64::consts::PI;

/// Wraps an angle into the interval `(-π, π]`.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

/// Rotates a vector by `theta` radians in the heading convention,
/// where a heading of 0 points along +y and π/2 points along +x.
pub fn rotate_heading(vec: Vector2d, theta: f64) -> Vector2d {
    let (sin, cos) = theta.sin_cos();
    Vector2d::new(vec.x * cos + vec.y * sin, -vec.x * sin + vec.y * cos)
}

/// The heading of a vector, the inverse of [rotate_heading] applied to the +y axis.
pub fn heading_of(vec: Vector2d) -> f64 {
    vec.x.atan2(vec.y)
}

/// The mean of a set of points.
pub fn centroid(points: &[Point2d]) -> Point2d {
    let sum = points
        .iter()
        .fold(Vector2d::new(0.0, 0.0), |acc, p| acc + p.to_vec());
    Point2d::from_vec(sum / points.len() as f64)
}
