pub use bounding_box::BoundingBox;
pub use cgmath;
pub use config::{Action, Config, FeatureFn, Options, RewardFn};
pub use error::{ConfigError, GeometryError};
pub use map::{Map, MapDescription, Orientation, SpawnPoint};
pub use render::{CarSprite, Renderer, Terrain, TerrainImage};
pub use simulation::{Simulation, StepResult};
pub use traffic::TrafficManager;
pub use util::Interval;
pub use vehicle::{CrashState, Displacement, KinematicState, Unicycle, Vehicle, VehicleKind};
pub use zone::{Colour, LaneMarker, TerrainColour, Zone, ZoneClass, ZoneKind};

mod bounding_box;
pub mod config;
mod debug;
mod error;
pub mod map;
pub mod math;
mod render;
mod simulation;
mod traffic;
mod util;
mod vehicle;
mod zone;
