use super::{heading_of, Point2d, Vector2d};
use cgmath::prelude::*;

/// Tolerance used when testing for collinearity and parallel segments.
pub const SMALL: f64 = 0.001;

/// A straight line segment between two points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment2d {
    pub start: Point2d,
    pub end: Point2d,
}

impl LineSegment2d {
    /// Creates a line segment from its two end points.
    pub fn from_ends(start: Point2d, end: Point2d) -> Self {
        Self { start, end }
    }

    /// The vector from the start to the end of the segment.
    pub fn direction(&self) -> Vector2d {
        self.end - self.start
    }

    /// The length of the segment.
    pub fn length(&self) -> f64 {
        self.direction().magnitude()
    }

    /// The 2D cross product of the directions of two segments.
    pub fn cross(&self, other: &Self) -> f64 {
        self.direction().perp_dot(other.direction())
    }

    /// Returns true if `point` lies on the line through this segment
    /// and strictly between its two ends.
    pub fn contains_point(&self, point: Point2d) -> bool {
        let to_start = LineSegment2d::from_ends(point, self.start);
        if self.cross(&to_start).abs() > SMALL {
            return false;
        }
        self.spans(point)
    }

    /// Given a point already known to be on the line through this segment,
    /// returns true if it lies strictly between the two ends.
    pub fn spans(&self, point: Point2d) -> bool {
        let length = self.length();
        length > self.start.distance(point) && length > self.end.distance(point)
    }

    /// Checks whether two segments intersect.
    ///
    /// Segments whose directions are parallel or collinear (cross product
    /// below [SMALL]) are reported as intersecting.
    pub fn intersects(&self, other: &Self) -> bool {
        let cross = self.cross(other);
        if cross.abs() < SMALL {
            return true;
        }

        let d1 = self.direction();
        let d2 = other.direction();
        let det1 = self.start.x * self.end.y - self.start.y * self.end.x;
        let det2 = other.start.x * other.end.y - other.start.y * other.end.x;

        let point = Point2d::new(
            (det1 * d2.x - d1.x * det2) / -cross,
            (det1 * d2.y - d1.y * det2) / -cross,
        );

        self.spans(point) && other.spans(point)
    }

    /// Returns a copy of this segment with its end points ordered so that
    /// the start has the smaller y coordinate.
    pub fn top_first(self) -> Self {
        if self.start.y < self.end.y {
            self
        } else {
            Self::from_ends(self.end, self.start)
        }
    }

    /// The perpendicular distance from `point` to the infinite line through this segment.
    pub fn distance_to_line(&self, point: Point2d) -> f64 {
        let d = self.direction();
        let offset = d.perp_dot(point - self.start);
        offset.abs() / d.magnitude()
    }

    /// The heading of the segment from start to end.
    pub fn angle(&self) -> f64 {
        heading_of(self.direction())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn seg(a: (f64, f64), b: (f64, f64)) -> LineSegment2d {
        LineSegment2d::from_ends(Point2d::new(a.0, a.1), Point2d::new(b.0, b.1))
    }

    #[test]
    fn crossing_segments_intersect() {
        assert!(seg((0.0, 0.0), (10.0, 10.0)).intersects(&seg((0.0, 10.0), (10.0, 0.0))));
        assert!(seg((0.0, 0.0), (150.0, 200.0)).intersects(&seg((100.0, 300.0), (100.0, 100.0))));
    }

    #[test]
    fn disjoint_segments_do_not_intersect() {
        assert!(!seg((0.0, 0.0), (1.0, 1.0)).intersects(&seg((5.0, 0.0), (5.0, 10.0))));
        // The lines cross, but beyond the end of the first segment
        assert!(!seg((0.0, 0.0), (150.0, 200.0)).intersects(&seg((200.0, 100.0), (200.0, 300.0))));
    }

    #[test]
    fn touching_an_end_point_is_not_an_intersection() {
        assert!(!seg((0.0, 0.0), (100.0, 100.0)).intersects(&seg((100.0, 100.0), (200.0, 100.0))));
    }

    #[test]
    fn parallel_segments_report_intersection() {
        assert!(seg((0.0, 0.0), (10.0, 0.0)).intersects(&seg((0.0, 5.0), (10.0, 5.0))));
        assert!(seg((0.0, 0.0), (10.0, 0.0)).intersects(&seg((50.0, 0.0), (60.0, 0.0))));
    }

    #[test]
    fn point_on_segment() {
        let s = seg((0.0, 0.0), (10.0, 10.0));
        assert!(s.contains_point(Point2d::new(5.0, 5.0)));
        assert!(!s.contains_point(Point2d::new(5.0, 6.0)));
        assert!(!s.contains_point(Point2d::new(10.0, 10.0)));
        assert!(!s.contains_point(Point2d::new(11.0, 11.0)));
    }

    #[test]
    fn line_distance_and_angle() {
        let s = seg((100.0, 500.0), (100.0, 0.0)).top_first();
        assert_eq!(s.start, Point2d::new(100.0, 0.0));
        assert_approx_eq!(s.angle(), 0.0);
        assert_approx_eq!(s.distance_to_line(Point2d::new(130.0, 250.0)), 30.0);
        assert_approx_eq!(s.distance_to_line(Point2d::new(70.0, 900.0)), 30.0);
    }
}
