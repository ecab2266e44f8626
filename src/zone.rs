use crate::bounding_box::BoundingBox;
use crate::math::{LineSegment2d, Point2d};
use crate::util::is_close;

/// Tolerance for treating two colour channels as equal.
const CHANNEL_TOLERANCE: f64 = 0.05;

/// A static rectangular region of the map.
#[derive(Clone, Debug)]
pub struct Zone {
    kind: ZoneKind,
    /// The index of the zone among the zones of the same kind, in map order.
    id: usize,
    bbox: BoundingBox,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneKind {
    Lane,
    Intersection,
}

/// The classification of a point on the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneClass {
    Lane(usize),
    Intersection(usize),
    /// On the road, but outside any lane or intersection.
    OnRoad,
    OffRoad,
}

/// A normalized RGB colour.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Colour {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// The colour classes of the terrain image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerrainColour {
    Grey,
    Black,
    White,
    Green,
    Unknown,
}

/// A straight lane marking, stored with its top end (smaller y) first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneMarker {
    line: LineSegment2d,
}

impl Zone {
    pub fn new(kind: ZoneKind, id: usize, bbox: BoundingBox) -> Self {
        Self { kind, id, bbox }
    }

    pub fn kind(&self) -> ZoneKind {
        self.kind
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Whether the point lies strictly inside the zone.
    pub fn contains(&self, point: Point2d) -> bool {
        self.bbox.contains(point)
    }

    /// The classification of a point inside this zone.
    pub fn class(&self) -> ZoneClass {
        match self.kind {
            ZoneKind::Lane => ZoneClass::Lane(self.id),
            ZoneKind::Intersection => ZoneClass::Intersection(self.id),
        }
    }
}

impl ZoneClass {
    /// The zone as a `(name, id)` pair, with an id of 0 for the road classes.
    pub fn as_tuple(&self) -> (&'static str, usize) {
        match *self {
            ZoneClass::Lane(id) => ("lane", id),
            ZoneClass::Intersection(id) => ("intersection", id),
            ZoneClass::OnRoad => ("on_road", 0),
            ZoneClass::OffRoad => ("off_road", 0),
        }
    }
}

impl Colour {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

impl TerrainColour {
    /// Buckets a colour by hue and luminance.
    pub fn classify(colour: Colour) -> Self {
        let Colour { r, g, b } = colour;

        if is_close(r, g, CHANNEL_TOLERANCE) && is_close(g, b, CHANNEL_TOLERANCE) {
            return if r > 0.1 && r < 0.9 {
                TerrainColour::Grey
            } else if r <= 0.1 {
                TerrainColour::Black
            } else {
                TerrainColour::White
            };
        }

        if g - r > 0.2 && g - b > 0.2 {
            return TerrainColour::Green;
        }

        TerrainColour::Unknown
    }

    /// Whether vehicles may drive on terrain of this colour.
    pub fn is_road(&self) -> bool {
        matches!(self, TerrainColour::Grey | TerrainColour::White)
    }
}

impl LaneMarker {
    pub fn new(a: Point2d, b: Point2d) -> Self {
        Self {
            line: LineSegment2d::from_ends(a, b).top_first(),
        }
    }

    pub fn line(&self) -> &LineSegment2d {
        &self.line
    }

    /// The perpendicular distance from a point to the marker's line.
    pub fn distance_to(&self, point: Point2d) -> f64 {
        self.line.distance_to_line(point)
    }

    /// The heading of the marker, from its top end to its bottom end.
    pub fn angle(&self) -> f64 {
        self.line.angle()
    }
}
