use crate::config::{Action, Config, Options};
#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::debug::debug_box;
use crate::error::ConfigError;
use crate::map::Map;
use crate::render::{CarSprite, Renderer, Terrain};
use crate::traffic::TrafficManager;
use crate::util::{add_noise, round_to, Interval};
use crate::vehicle::{KinematicState, Vehicle, VehicleKind};
use crate::zone::{TerrainColour, ZoneClass, ZoneKind};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

/// The sprite the agent is drawn with.
const AGENT_SPRITE: &str = "red_car";

/// The number of elements in an [Action].
const ACTION_LEN: usize = 2;

/// A driving environment: one agent and the surrounding traffic on a static map.
pub struct Simulation {
    /// The simulation constants.
    config: Config,
    /// The environment options.
    options: Options,
    /// The static layout.
    map: Map,
    /// The vehicle controlled through [Simulation::step].
    agent: Vehicle,
    /// The other vehicles.
    traffic: TrafficManager,
    /// The source of all randomness.
    rng: StdRng,
    /// Draws the simulation in render and vision modes.
    renderer: Option<Box<dyn Renderer>>,
    /// The ground colours used for road classification.
    terrain: Option<Box<dyn Terrain>>,
    /// The number of steps since the simulation was created.
    frame: usize,
    /// Whether the current episode has ended.
    done: bool,
    /// Debugging information from the previously simulated frame.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

/// The outcome of a single [Simulation::step].
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    /// The observation, followed by the collision flag and, if the obstacle
    /// is used, its crashing flag.
    pub observation: Vec<f64>,
    pub reward: f64,
    /// Whether the agent left the map or collided.
    pub done: bool,
    /// Whether the agent collided with another vehicle.
    pub collision: bool,
}

impl Simulation {
    /// Creates a simulation without a renderer.
    ///
    /// Fails if the configuration or options are invalid, or if they ask for rendering.
    pub fn new(config: Config, map: Map, options: Options) -> Result<Self, ConfigError> {
        Self::build(config, map, options, None)
    }

    /// Creates a simulation which draws itself through `renderer`.
    pub fn with_renderer(
        config: Config,
        map: Map,
        options: Options,
        renderer: Box<dyn Renderer>,
    ) -> Result<Self, ConfigError> {
        Self::build(config, map, options, Some(renderer))
    }

    fn build(
        config: Config,
        map: Map,
        options: Options,
        renderer: Option<Box<dyn Renderer>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        options.validate()?;
        if (options.render || options.vision) && renderer.is_none() {
            return Err(ConfigError::Invalid(
                "render and vision modes need a renderer".to_string(),
            ));
        }

        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let start = if config.init.use_pos {
            config.agent_start()
        } else {
            let pos = map.agent_start();
            KinematicState::new(pos.x, pos.y, pos.theta, config.init.speed)
        };
        let agent = Vehicle::new(VehicleKind::Agent, AGENT_SPRITE, start, config.vehicle);

        let traffic = TrafficManager::new(
            &config,
            map.starts().to_vec(),
            (map.width(), map.height()),
            options.obstacle,
            &mut rng,
        );

        log::info!(
            "Created a {}x{} environment with {} zones, {} start points and up to {} vehicles",
            map.width(),
            map.height(),
            map.zones().len(),
            map.starts().len(),
            traffic.capacity(),
        );

        let mut sim = Self {
            config,
            options,
            map,
            agent,
            traffic,
            rng,
            renderer,
            terrain: None,
            frame: 0,
            done: false,
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
        };
        sim.reset_agent();
        sim.keep_agent_in_map();
        Ok(sim)
    }

    /// Uses `terrain` to tell road from off-road in [Simulation::get_zone].
    pub fn with_terrain(mut self, terrain: Box<dyn Terrain>) -> Self {
        self.terrain = Some(terrain);
        self
    }

    /// Starts a new episode and returns the initial observation.
    ///
    /// # Parameters
    /// * `state` - Overrides the states of the agent and the first other vehicle,
    ///   as `[x, y, heading, speed]` for each
    pub fn reset(&mut self, state: Option<&[f64; 8]>) -> Vec<f64> {
        self.reset_agent();
        self.keep_agent_in_map();
        self.traffic.reset(&mut self.rng);
        self.draw();

        if let Some(state) = state {
            self.set_state(state);
        }

        self.done = false;
        log::debug!(
            "Reset with the agent at ({:.1}, {:.1})",
            self.agent.x(),
            self.agent.y()
        );
        self.observation()
    }

    /// Advances the simulation by one tick.
    ///
    /// # Parameters
    /// * `action` - The agent's `[acceleration, steering]`, each within `[-1, 1]`
    /// * `npc_actions` - Actions for the other vehicles, in roster order
    pub fn step(&mut self, action: Action, npc_actions: Option<&[Action]>) -> StepResult {
        let (acc, steering) = self.config.global.to_controls(action);
        self.agent.drive(acc, steering);

        let max_speed = self.config.global.max_speed;
        self.agent
            .set_speed(self.agent.speed().clamp(-max_speed, max_speed));

        self.traffic
            .step(self.agent.bbox(), npc_actions, &mut self.rng);

        self.draw();
        let observation = self.observation();

        if self.options.tick {
            std::thread::sleep(Duration::from_secs_f64(1.0 / self.config.global.fps));
        }

        let outside = !self.agent.in_map(self.map.width(), self.map.height());
        let collision = self.collided();
        if collision {
            log::debug!("Collision at ({:.1}, {:.1})", self.agent.x(), self.agent.y());
            debug_box("agent", self.agent.bbox());
        }
        self.done = outside || collision;

        // The observation may show the agent outside the map, but it never stays there
        self.keep_agent_in_map();

        let reward = (self.options.reward_function)(&observation);

        let mut observation = observation;
        observation.push(flag(collision));
        if self.traffic.uses_obstacle() {
            let crashing = self.traffic.obstacle().map_or(false, |v| v.is_crashing());
            observation.push(flag(crashing));
        }

        self.frame += 1;

        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }

        StepResult {
            observation,
            reward,
            done: self.done,
            collision,
        }
    }

    /// The current observation, without the collision and crashing flags.
    ///
    /// In vision mode, this is the last rendered frame. Otherwise it is the state of the
    /// agent followed by the state of each other vehicle, padded with zeros to a fixed length.
    pub fn observation(&self) -> Vec<f64> {
        if self.options.vision {
            if let Some(renderer) = &self.renderer {
                return renderer.frame();
            }
        }

        let len = 4 * (1 + self.traffic.capacity());
        let mut observation = Vec::with_capacity(len);
        observation.extend(self.agent.state().to_array());
        for vehicle in self.traffic.iter() {
            observation.extend(vehicle.state().to_array());
        }
        observation.resize(len, 0.0);

        if let Some(decimals) = self.options.decimals {
            for value in &mut observation {
                *value = round_to(*value, decimals);
            }
        }

        (self.options.feature_function)(observation)
    }

    /// The length of the observations returned by [Simulation::step].
    pub fn observation_len(&self) -> usize {
        self.observation().len() + 1 + usize::from(self.traffic.uses_obstacle())
    }

    pub fn action_len(&self) -> usize {
        ACTION_LEN
    }

    /// Overwrites the states of the agent and the first other vehicle,
    /// as `[x, y, heading, speed]` for each.
    pub fn set_state(&mut self, state: &[f64; 8]) {
        let [x, y, heading, speed, npc_x, npc_y, npc_heading, npc_speed] = *state;
        self.agent
            .set_state(KinematicState::new(x, y, heading, speed));

        match self.traffic.first_mut() {
            Some(vehicle) => {
                vehicle.set_state(KinematicState::new(npc_x, npc_y, npc_heading, npc_speed))
            }
            None => log::warn!("No vehicle to apply the state {:?} to", &state[4..]),
        }
    }

    /// Classifies the agent's position.
    pub fn get_zone(&self) -> ZoneClass {
        let pos = self.agent.position();
        for kind in [ZoneKind::Lane, ZoneKind::Intersection] {
            if let Some(zone) = self.map.zones_of(kind).find(|zone| zone.contains(pos)) {
                return zone.class();
            }
        }

        if self.terrain_colour().is_road() {
            ZoneClass::OnRoad
        } else {
            ZoneClass::OffRoad
        }
    }

    /// Whether the agent is anywhere on the road.
    pub fn on_road(&self) -> bool {
        self.get_zone() != ZoneClass::OffRoad
    }

    /// The colour class of the ground under the agent.
    pub fn terrain_colour(&self) -> TerrainColour {
        match &self.terrain {
            Some(terrain) => {
                TerrainColour::classify(terrain.colour(self.agent.x(), self.agent.y()))
            }
            None => TerrainColour::Unknown,
        }
    }

    /// Whether the agent overlaps another vehicle.
    pub fn collided(&self) -> bool {
        self.traffic.check_collision(self.agent.bbox())
    }

    /// Finds the lane marker closest to the agent.
    ///
    /// Returns the distance to the marker and its angle relative to the agent's heading.
    pub fn closest_marker(&self) -> Option<(f64, f64)> {
        let pos = self.agent.position();
        self.map
            .markers()
            .iter()
            .map(|marker| (marker.distance_to(pos), marker))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(dist, marker)| (dist, marker.angle() - self.agent.heading()))
    }

    /// Finds the vehicle closest to the agent and its distance.
    pub fn closest_npc(&self) -> Option<(&Vehicle, f64)> {
        self.traffic.get_closest(self.agent.position())
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Whether the current episode has ended.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn agent(&self) -> &Vehicle {
        &self.agent
    }

    pub fn traffic(&self) -> &TrafficManager {
        &self.traffic
    }

    /// Returns an iterator over the vehicles other than the agent.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.traffic.iter()
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Gets the debugging information for the previously simulated frame as JSON array.
    #[cfg(feature = "debug")]
    pub fn debug(&mut self) -> serde_json::Value {
        self.debug.clone()
    }

    /// Returns the agent to its initial state, with noise if enabled.
    fn reset_agent(&mut self) {
        let init = &self.config.init;
        let mut state = *self.agent.initial_state();
        if init.add_noise {
            let rng = &mut self.rng;
            state = KinematicState::new(
                add_noise(state.x, init.std_x, rng),
                add_noise(state.y, init.std_y, rng),
                add_noise(state.heading, init.std_theta, rng),
                add_noise(state.speed, init.std_speed, rng),
            );
        }
        self.agent.set_state(state);
    }

    /// Limits the agent's position to the map.
    fn keep_agent_in_map(&mut self) {
        let x = Interval::new(0.0, self.map.width()).clamp(self.agent.x());
        let y = Interval::new(0.0, self.map.height()).clamp(self.agent.y());
        if x != self.agent.x() || y != self.agent.y() {
            self.agent.set_position(x, y);
        }
    }

    /// Redraws the view in render and vision modes.
    fn draw(&mut self) {
        if !(self.options.render || self.options.vision) {
            return;
        }
        let cars = std::iter::once(&self.agent)
            .chain(self.traffic.iter())
            .map(|vehicle| CarSprite {
                sprite: vehicle.sprite(),
                x: vehicle.x(),
                y: vehicle.y(),
                heading: vehicle.heading(),
            })
            .collect::<Vec<_>>();
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.update(self.agent.x(), self.agent.y(), &cars);
        }
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::MapDescription;
    use crate::render::TerrainImage;
    use assert_approx_eq::assert_approx_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    const CROSSROADS: &str = "
width: 400
height: 400
zones:
  - label: lane
    corner: [150, 0]
    size: [50, 150]
  - label: intersection
    corner: [150, 150]
    size: [100, 100]
lane_markers:
  - shape: straight
    points: [[200, 0], [200, 150]]
  - shape: straight
    points: [[0, 300], [400, 300]]
agent_start:
  x: 175
  y: 50
starts: []
";

    fn map() -> Map {
        let desc: MapDescription = serde_yaml::from_str(CROSSROADS).unwrap();
        Map::new(&desc).unwrap()
    }

    fn options() -> Options {
        Options {
            seed: Some(11),
            ..Default::default()
        }
    }

    /// Records what it is asked to draw.
    struct Recorder {
        drawn: Rc<RefCell<Vec<(f64, f64, usize)>>>,
    }

    impl Renderer for Recorder {
        fn update(&mut self, agent_x: f64, agent_y: f64, cars: &[CarSprite]) {
            assert_eq!(cars[0].sprite, AGENT_SPRITE);
            self.drawn.borrow_mut().push((agent_x, agent_y, cars.len()));
        }

        fn frame(&self) -> Vec<f64> {
            vec![0.5; 12]
        }
    }

    #[test]
    fn zones_are_checked_in_order() {
        let mut terrain = TerrainImage::filled(400, 400, [40, 180, 40]);
        terrain.fill_rect(0, 280, 400, 40, [120, 120, 120]);
        let mut sim = Simulation::new(Config::default(), map(), options())
            .unwrap()
            .with_terrain(Box::new(terrain));

        assert_eq!(sim.get_zone(), ZoneClass::Lane(0));
        sim.set_state(&[210.0, 190.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(sim.get_zone(), ZoneClass::Intersection(0));
        sim.set_state(&[100.0, 300.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(sim.get_zone(), ZoneClass::OnRoad);
        assert!(sim.on_road());
        sim.set_state(&[100.0, 100.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(sim.get_zone().as_tuple(), ("off_road", 0));
        assert!(!sim.on_road());
    }

    #[test]
    fn without_terrain_everything_is_off_road() {
        let mut sim = Simulation::new(Config::default(), map(), options()).unwrap();
        sim.set_state(&[100.0, 300.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(sim.terrain_colour(), TerrainColour::Unknown);
        assert_eq!(sim.get_zone(), ZoneClass::OffRoad);
    }

    #[test]
    fn closest_marker() {
        let mut sim = Simulation::new(Config::default(), map(), options()).unwrap();
        sim.set_state(&[190.0, 100.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let (dist, angle) = sim.closest_marker().unwrap();
        assert_approx_eq!(dist, 10.0);
        assert_approx_eq!(angle, -0.5);

        sim.set_state(&[50.0, 290.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let (dist, angle) = sim.closest_marker().unwrap();
        assert_approx_eq!(dist, 10.0);
        // Horizontal markers run from right to left
        assert_approx_eq!(angle, -std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn rendering_needs_a_renderer() {
        let options = Options {
            render: true,
            ..options()
        };
        assert!(matches!(
            Simulation::new(Config::default(), map(), options),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn vision_observes_the_frame() {
        let drawn = Rc::new(RefCell::new(vec![]));
        let options = Options {
            vision: true,
            ..options()
        };
        let renderer = Recorder {
            drawn: drawn.clone(),
        };
        let mut sim = Simulation::with_renderer(Config::default(), map(), options, Box::new(renderer)).unwrap();

        assert_eq!(sim.reset(None), vec![0.5; 12]);
        let result = sim.step([0.0, 0.0], None);
        assert_eq!(result.observation.len(), 13);
        assert_eq!(drawn.borrow().len(), 2);
        assert_eq!(drawn.borrow()[1], (175.0, 50.0, 1));
    }

    #[test]
    fn rounding_and_features() {
        let mut config = Config::default();
        config.traffic.max_cars = 1;
        let options = Options {
            decimals: Some(1),
            feature_function: Box::new(|observation: Vec<f64>| observation[..2].to_vec()),
            reward_function: Box::new(|observation: &[f64]| observation[0] + observation[1]),
            ..options()
        };
        let mut sim = Simulation::new(config, map(), options).unwrap();
        sim.set_state(&[175.04, 50.06, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(sim.observation(), vec![175.0, 50.1]);
        assert_eq!(sim.observation_len(), 3);

        let result = sim.step([0.0, 0.0], None);
        assert_eq!(result.observation, vec![175.0, 50.1, 0.0]);
        assert_approx_eq!(result.reward, 225.1);
    }

    #[test]
    fn agent_is_clamped_after_leaving() {
        let mut config = Config::default();
        config.global.max_speed = 5.0;
        let mut sim = Simulation::new(config, map(), options()).unwrap();
        sim.reset(Some(&[175.0, 398.0, 0.0, 20.0, 0.0, 0.0, 0.0, 0.0]));

        let result = sim.step([0.0, 0.0], None);
        // Speed is limited only after the move
        assert_approx_eq!(result.observation[1], 418.0);
        assert_eq!(result.observation[3], 5.0);
        assert!(result.done);
        assert!(!result.collision);
        assert_eq!(sim.agent().y(), 400.0);
        assert_approx_eq!(sim.agent().bbox().centre().y, 400.0, 1e-9);
        assert_eq!(sim.frame(), 1);
    }
}
