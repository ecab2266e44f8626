use crate::error::GeometryError;
use crate::math::{centroid, heading_of, rotate_heading, LineSegment2d, Point2d, Vector2d};
use cgmath::prelude::*;

/// A rectangle with an arbitrary orientation, represented by its four corners.
///
/// The corners are ordered around the perimeter. The orientation of the box is the
/// heading of the edge from the second to the third corner, using the same convention
/// as vehicle headings: 0 points along +y, π/2 along +x. On a screen with the y axis
/// pointing down, positive rotations are counter-clockwise.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox {
    /// The corners, in perimeter order.
    corners: [Point2d; 4],
    /// The edges between consecutive corners, recomputed after every transform.
    edges: [LineSegment2d; 4],
    /// The length of the first edge, fixed at construction.
    width: f64,
    /// The length of the second edge, fixed at construction.
    height: f64,
}

impl BoundingBox {
    /// Creates a bounding box from a list of points.
    ///
    /// Fails unless there are exactly four points with two coordinates each.
    pub fn new<P: AsRef<[f64]>>(points: &[P]) -> Result<Self, GeometryError> {
        if points.len() != 4 {
            return Err(GeometryError::CornerCount(points.len()));
        }
        let mut corners = [Point2d::origin(); 4];
        for (index, (corner, point)) in corners.iter_mut().zip(points).enumerate() {
            match point.as_ref() {
                &[x, y] => *corner = Point2d::new(x, y),
                coords => {
                    return Err(GeometryError::CornerDimension {
                        index,
                        dims: coords.len(),
                    })
                }
            }
        }
        Ok(Self::from_corners(corners))
    }

    /// Creates a bounding box from four corners in perimeter order.
    pub fn from_corners(corners: [Point2d; 4]) -> Self {
        let width = corners[0].distance(corners[1]);
        let height = corners[1].distance(corners[2]);
        Self {
            corners,
            edges: Self::edges_of(&corners),
            width,
            height,
        }
    }

    /// Creates a box of the given width and length, centred on the origin
    /// with a heading of 0 (length along the y axis).
    pub fn centred(width: f64, length: f64) -> Self {
        let (hw, hl) = (0.5 * width, 0.5 * length);
        Self::from_corners([
            Point2d::new(-hw, -hl),
            Point2d::new(hw, -hl),
            Point2d::new(hw, hl),
            Point2d::new(-hw, hl),
        ])
    }

    /// Creates an axis-aligned box from its top-left corner and size.
    pub fn from_corner_and_size(corner: Point2d, size: Vector2d) -> Self {
        Self::from_corners([
            corner,
            Point2d::new(corner.x + size.x, corner.y),
            corner + size,
            Point2d::new(corner.x, corner.y + size.y),
        ])
    }

    fn edges_of(corners: &[Point2d; 4]) -> [LineSegment2d; 4] {
        [0, 1, 2, 3].map(|i| LineSegment2d::from_ends(corners[i], corners[(i + 1) % 4]))
    }

    fn update_edges(&mut self) {
        self.edges = Self::edges_of(&self.corners);
    }

    /// The corners in perimeter order.
    pub fn corners(&self) -> &[Point2d; 4] {
        &self.corners
    }

    /// The four edges of the box.
    pub fn edges(&self) -> &[LineSegment2d; 4] {
        &self.edges
    }

    /// The length of the edge between the first two corners.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// The length of the edge between the second and third corners.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The centroid of the corners.
    pub fn centre(&self) -> Point2d {
        centroid(&self.corners)
    }

    /// The orientation of the box.
    pub fn angle(&self) -> f64 {
        heading_of(self.corners[2] - self.corners[1])
    }

    /// Translates the box.
    pub fn shift(&mut self, dx: f64, dy: f64) {
        let delta = Vector2d::new(dx, dy);
        for corner in &mut self.corners {
            *corner += delta;
        }
        self.update_edges();
    }

    /// Rotates the box about its centroid by `theta` radians.
    pub fn rotate(&mut self, theta: f64) {
        let centre = self.centre();
        for corner in &mut self.corners {
            *corner = centre + rotate_heading(*corner - centre, theta);
        }
        self.update_edges();
    }

    /// Rotates the box by `dtheta` and then translates it by `(dx, dy)`.
    pub fn transform(&mut self, dx: f64, dy: f64, dtheta: f64) {
        self.rotate(dtheta);
        self.shift(dx, dy);
    }

    /// Moves the box so that its centroid is at `(x, y)` with orientation `theta`,
    /// as a single rigid transform.
    pub fn move_to(&mut self, x: f64, y: f64, theta: f64) {
        let centre = self.centre();
        let angle = self.angle();
        self.transform(x - centre.x, y - centre.y, theta - angle);
    }

    /// Checks whether a point lies inside the box, by casting a ray from
    /// the origin to the point and counting how many times it crosses the perimeter.
    ///
    /// Points on the perimeter are outside.
    pub fn contains(&self, point: Point2d) -> bool {
        let ray = LineSegment2d::from_ends(Point2d::origin(), point);

        let edge_crossings = self.edges.iter().filter(|edge| ray.intersects(edge)).count();

        // A ray passing exactly through a corner is not seen by the edge tests
        let corner_crossings = self
            .corners
            .iter()
            .filter(|corner| ray.contains_point(**corner))
            .count();

        (edge_crossings + corner_crossings) % 2 == 1
    }

    /// Checks whether any corner of `other` lies inside this box.
    ///
    /// Boxes whose edges cross without either containing a corner of the
    /// other are not detected.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        other.corners.iter().any(|corner| self.contains(*corner))
    }
}
