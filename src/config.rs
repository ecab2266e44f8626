//! Simulation constants and environment options.

use crate::error::ConfigError;
use crate::vehicle::KinematicState;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::fs;
use std::path::Path;

/// A control input of `[acceleration, steering]`, each expected within `[-1, 1]`.
pub type Action = [f64; 2];

/// Computes the reward for an observation.
pub type RewardFn = Box<dyn Fn(&[f64]) -> f64>;

/// Transforms an observation into a feature vector.
pub type FeatureFn = Box<dyn Fn(Vec<f64>) -> Vec<f64>>;

/// The constants of a simulation run, loaded once and never modified.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub global: GlobalParams,
    pub init: AgentParams,
    pub visualization: ScreenParams,
    pub traffic: TrafficParams,
    pub obstacle: ObstacleParams,
    pub vehicle: VehicleDimensions,
}

/// Limits shared by every vehicle.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalParams {
    /// Ticks per second.
    pub fps: f64,
    /// The maximum steering angle in radians.
    pub max_angle: f64,
    /// The maximum acceleration in pixels/tick<sup>2</sup>.
    pub max_acc: f64,
    /// The maximum agent speed in pixels/tick.
    pub max_speed: f64,
}

/// The initial state of the agent.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentParams {
    /// Use this pose rather than the one given by the map.
    pub use_pos: bool,
    pub x: f64,
    pub y: f64,
    pub theta: f64,
    pub speed: f64,
    /// Add Gaussian noise to the initial state on every reset.
    pub add_noise: bool,
    pub std_x: f64,
    pub std_y: f64,
    pub std_theta: f64,
    pub std_speed: f64,
}

/// The size of the rendered view.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenParams {
    pub width: u32,
    pub height: u32,
}

/// Parameters of the NPC population.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficParams {
    /// The expected number of new vehicles per second.
    pub freq: f64,
    /// The maximum number of vehicles, not counting the obstacle.
    pub max_cars: usize,
    /// The initial speed of new vehicles in pixels/tick.
    pub speed: f64,
    /// The sprites new vehicles are drawn with.
    pub types: Vec<String>,
}

/// Parameters of the scripted obstacle vehicle.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleParams {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
    pub speed: f64,
    /// Whether the obstacle may crash at all.
    pub crash: bool,
    /// The probability that the obstacle crashes in an episode.
    pub prob_crash: f64,
    /// The y coordinate at which a crash begins.
    pub crash_y: f64,
    /// Add Gaussian noise to the initial state.
    pub noise: bool,
    pub std_x: f64,
    pub std_y: f64,
    pub std_speed: f64,
}

/// The footprint of every vehicle, in pixels.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleDimensions {
    pub width: f64,
    pub length: f64,
}

/// The options of a [Simulation](crate::Simulation).
pub struct Options {
    /// Draw every tick through the renderer.
    pub render: bool,
    /// Return the rendered frame as the observation.
    pub vision: bool,
    /// Add the scripted obstacle vehicle.
    pub obstacle: bool,
    /// Round observations to this many decimal places.
    pub decimals: Option<u32>,
    pub reward_function: RewardFn,
    pub feature_function: FeatureFn,
    /// Sleep for one tick period after each step.
    pub tick: bool,
    /// Flip the rendered view vertically.
    pub flip: bool,
    /// Have the rendered view follow the agent.
    pub scroll: bool,
    /// Seed of the random number generator; drawn from entropy if `None`.
    pub seed: Option<u64>,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            fps: 30.0,
            max_angle: 0.5,
            max_acc: 0.5,
            max_speed: 10.0,
        }
    }
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            use_pos: false,
            x: 250.0,
            y: 50.0,
            theta: 0.0,
            speed: 0.0,
            add_noise: false,
            std_x: 5.0,
            std_y: 5.0,
            std_theta: 0.05,
            std_speed: 0.2,
        }
    }
}

impl Default for ScreenParams {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
        }
    }
}

impl Default for TrafficParams {
    fn default() -> Self {
        Self {
            freq: 1.0,
            max_cars: 4,
            speed: 3.0,
            types: ["blue_car", "green_car", "pink_car", "teal_car", "white_car", "yellow_car"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl Default for ObstacleParams {
    fn default() -> Self {
        Self {
            x: 300.0,
            y: 150.0,
            theta: 0.0,
            speed: 2.0,
            crash: false,
            prob_crash: 0.5,
            crash_y: 400.0,
            noise: false,
            std_x: 2.0,
            std_y: 10.0,
            std_speed: 0.2,
        }
    }
}

impl Default for VehicleDimensions {
    fn default() -> Self {
        Self {
            width: 20.0,
            length: 40.0,
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            render: false,
            vision: false,
            obstacle: false,
            decimals: None,
            reward_function: Box::new(|_: &[f64]| 0.0),
            feature_function: Box::new(|observation: Vec<f64>| observation),
            tick: false,
            flip: false,
            scroll: true,
            seed: None,
        }
    }
}

impl Config {
    /// Loads a configuration from a YAML file and validates it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the constants describe a usable simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        let global = &self.global;
        if !(global.fps > 0.0) {
            return invalid("global.fps must be positive");
        }
        if !(global.max_angle > 0.0 && global.max_angle < FRAC_PI_2) {
            return invalid("global.max_angle must be within (0, pi/2)");
        }
        if !(global.max_acc >= 0.0) || !(global.max_speed >= 0.0) {
            return invalid("global.max_acc and global.max_speed must not be negative");
        }
        if !(self.traffic.freq >= 0.0) {
            return invalid("traffic.freq must not be negative");
        }
        if self.traffic.types.is_empty() {
            return invalid("traffic.types must name at least one sprite");
        }
        if !(0.0..=1.0).contains(&self.obstacle.prob_crash) {
            return invalid("obstacle.prob_crash must be within [0, 1]");
        }
        if !(self.vehicle.width > 0.0 && self.vehicle.length > 0.0) {
            return invalid("vehicle dimensions must be positive");
        }
        let deviations = [
            self.init.std_x,
            self.init.std_y,
            self.init.std_theta,
            self.init.std_speed,
            self.obstacle.std_x,
            self.obstacle.std_y,
            self.obstacle.std_speed,
        ];
        if deviations.iter().any(|std| !(*std >= 0.0 && std.is_finite())) {
            return invalid("noise standard deviations must be finite and not negative");
        }
        Ok(())
    }

    /// The probability of attempting to spawn a vehicle on any given tick.
    pub fn spawn_probability(&self) -> f64 {
        (self.traffic.freq / self.global.fps).min(1.0)
    }

    /// The agent's initial state as configured.
    pub fn agent_start(&self) -> KinematicState {
        KinematicState::new(self.init.x, self.init.y, self.init.theta, self.init.speed)
    }
}

impl GlobalParams {
    /// Clamps an action to `[-1, 1]` and scales it to an acceleration and steering angle.
    pub fn to_controls(&self, action: Action) -> (f64, f64) {
        let acc = action[0].clamp(-1.0, 1.0) * self.max_acc;
        let steering = action[1].clamp(-1.0, 1.0) * self.max_angle;
        (acc, steering)
    }
}

impl Options {
    /// Checks that the options are consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if matches!(self.decimals, Some(d) if d > 15) {
            return Err(ConfigError::Invalid(
                "decimals must be at most 15".to_string(),
            ));
        }
        Ok(())
    }
}
