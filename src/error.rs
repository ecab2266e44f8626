//! Error types.

use std::path::PathBuf;
use thiserror::Error;

/// A malformed [BoundingBox](crate::BoundingBox) construction.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GeometryError {
    #[error("a bounding box needs exactly 4 corners, got {0}")]
    CornerCount(usize),

    #[error("corner {index} has {dims} coordinates, expected 2")]
    CornerDimension { index: usize, dims: usize },
}

/// An invalid map description, configuration or environment option.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unsupported zone label: {0}")]
    UnsupportedZone(String),

    #[error("unsupported lane marker shape: {0}")]
    UnsupportedLaneMarker(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
