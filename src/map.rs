//! The static layout of a map.

use crate::bounding_box::BoundingBox;
use crate::error::ConfigError;
use crate::math::{Point2d, Vector2d};
use crate::zone::{LaneMarker, Zone, ZoneKind};
use serde::Deserialize;
use std::f64::consts::{FRAC_PI_2, PI};
use std::fs;
use std::path::Path;

/// A map description as written in a map file.
#[derive(Clone, Debug, Deserialize)]
pub struct MapDescription {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub zones: Vec<ZoneDescription>,
    #[serde(default)]
    pub lane_markers: Vec<LaneMarkerDescription>,
    pub agent_start: AgentStart,
    #[serde(default)]
    pub starts: Vec<SpawnPoint>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ZoneDescription {
    /// Either `lane` or `intersection`.
    pub label: String,
    /// The top left corner.
    pub corner: [f64; 2],
    pub size: [f64; 2],
}

#[derive(Clone, Debug, Deserialize)]
pub struct LaneMarkerDescription {
    /// Only `straight` is supported.
    pub shape: String,
    pub points: Vec<[f64; 2]>,
}

/// The default pose of the agent.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct AgentStart {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub theta: f64,
}

/// A point at which new vehicles enter the map.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct SpawnPoint {
    pub position: [f64; 2],
    pub orientation: Orientation,
}

/// The direction a vehicle faces when it enters the map, on a screen with the y axis pointing down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Up,
    Down,
    Left,
    Right,
}

impl Orientation {
    pub fn heading(&self) -> f64 {
        match self {
            Orientation::Down => 0.0,
            Orientation::Right => FRAC_PI_2,
            Orientation::Up => PI,
            Orientation::Left => -FRAC_PI_2,
        }
    }
}

impl MapDescription {
    /// Reads a map description from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A validated map.
#[derive(Clone, Debug)]
pub struct Map {
    width: f64,
    height: f64,
    zones: Vec<Zone>,
    markers: Vec<LaneMarker>,
    agent_start: AgentStart,
    starts: Vec<SpawnPoint>,
}

impl Map {
    /// Builds a map from its description.
    ///
    /// Fails on unknown zone labels and lane marker shapes.
    pub fn new(desc: &MapDescription) -> Result<Self, ConfigError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(ConfigError::Invalid("the map must have a non-zero size".to_string()));
        }

        let mut zones = Vec::with_capacity(desc.zones.len());
        let (mut lanes, mut intersections) = (0, 0);
        for zone in &desc.zones {
            let kind = match zone.label.as_str() {
                "lane" => ZoneKind::Lane,
                "intersection" => ZoneKind::Intersection,
                label => return Err(ConfigError::UnsupportedZone(label.to_string())),
            };
            let counter = match kind {
                ZoneKind::Lane => &mut lanes,
                ZoneKind::Intersection => &mut intersections,
            };
            let bbox = BoundingBox::from_corner_and_size(
                Point2d::new(zone.corner[0], zone.corner[1]),
                Vector2d::new(zone.size[0], zone.size[1]),
            );
            zones.push(Zone::new(kind, *counter, bbox));
            *counter += 1;
        }

        let markers = desc
            .lane_markers
            .iter()
            .map(|marker| match (marker.shape.as_str(), marker.points.as_slice()) {
                ("straight", &[a, b]) => Ok(LaneMarker::new(
                    Point2d::new(a[0], a[1]),
                    Point2d::new(b[0], b[1]),
                )),
                ("straight", points) => Err(ConfigError::Invalid(format!(
                    "a straight lane marker needs 2 points, got {}",
                    points.len()
                ))),
                (shape, _) => Err(ConfigError::UnsupportedLaneMarker(shape.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            width: desc.width as f64,
            height: desc.height as f64,
            zones,
            markers,
            agent_start: desc.agent_start,
            starts: desc.starts.clone(),
        })
    }

    /// Loads and validates a map file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::new(&MapDescription::from_file(path)?)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// The zones of the given kind, in map order.
    pub fn zones_of(&self, kind: ZoneKind) -> impl Iterator<Item = &Zone> {
        self.zones.iter().filter(move |zone| zone.kind() == kind)
    }

    pub fn markers(&self) -> &[LaneMarker] {
        &self.markers
    }

    pub fn agent_start(&self) -> &AgentStart {
        &self.agent_start
    }

    pub fn starts(&self) -> &[SpawnPoint] {
        &self.starts
    }
}
