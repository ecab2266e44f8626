use crate::bounding_box::BoundingBox;
use crate::config::{Action, Config};
use crate::debug::debug_box;
use crate::map::SpawnPoint;
use crate::math::Point2d;
use crate::util::add_noise;
use crate::vehicle::{CrashState, KinematicState, Vehicle, VehicleKind};
use cgmath::MetricSpace;
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;

/// Manages the population of non-player vehicles.
pub struct TrafficManager {
    /// The live vehicles, in the order they were spawned.
    vehicles: Vec<Vehicle>,
    /// The points new vehicles may be spawned at.
    starts: Vec<SpawnPoint>,
    /// The width and height of the map.
    bounds: (f64, f64),
    /// The simulation constants.
    config: Config,
    /// Whether the roster includes the scripted obstacle.
    use_obstacle: bool,
    /// Whether the obstacle has left the map this episode.
    obstacle_gone: bool,
}

impl TrafficManager {
    /// Creates a traffic manager, spawning the obstacle if one is used.
    ///
    /// # Parameters
    /// * `config` - The simulation constants
    /// * `starts` - The points new vehicles may be spawned at
    /// * `bounds` - The width and height of the map
    /// * `use_obstacle` - Whether to add the scripted obstacle vehicle
    /// * `rng` - The source of randomness for the obstacle's initial state
    pub fn new(
        config: &Config,
        starts: Vec<SpawnPoint>,
        bounds: (f64, f64),
        use_obstacle: bool,
        rng: &mut impl Rng,
    ) -> Self {
        let mut manager = Self {
            vehicles: vec![],
            starts,
            bounds,
            config: config.clone(),
            use_obstacle,
            obstacle_gone: false,
        };
        manager.reset(rng);
        manager
    }

    /// The maximum number of live vehicles, including the obstacle.
    pub fn capacity(&self) -> usize {
        self.config.traffic.max_cars + usize::from(self.use_obstacle)
    }

    /// The probability of attempting a spawn on each tick.
    pub fn spawn_probability(&self) -> f64 {
        self.config.spawn_probability()
    }

    /// Whether the scripted obstacle is part of this simulation.
    pub fn uses_obstacle(&self) -> bool {
        self.use_obstacle
    }

    /// Returns an iterator over the live vehicles, in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.iter()
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// The first vehicle in the roster.
    pub fn first_mut(&mut self) -> Option<&mut Vehicle> {
        self.vehicles.first_mut()
    }

    /// The obstacle, if it is used and has not left the map.
    pub fn obstacle(&self) -> Option<&Vehicle> {
        if self.obstacle_gone {
            return None;
        }
        self.vehicles.iter().find(|vehicle| vehicle.is_obstacle())
    }

    /// Whether the obstacle has left the map this episode.
    pub fn obstacle_gone(&self) -> bool {
        self.obstacle_gone
    }

    /// Advances the traffic by one tick.
    ///
    /// # Parameters
    /// * `agent_bbox` - The agent's footprint, which new vehicles must not overlap
    /// * `actions` - One action per vehicle in roster order; missing actions are zero
    /// * `rng` - The source of randomness for spawning
    pub fn step(&mut self, agent_bbox: &BoundingBox, actions: Option<&[Action]>, rng: &mut impl Rng) {
        self.drive_vehicles(actions.unwrap_or(&[]));

        if rng.gen::<f64>() < self.spawn_probability() {
            self.try_spawn(agent_bbox, rng);
        }

        self.remove_exited();
    }

    /// Applies one action to each vehicle.
    fn drive_vehicles(&mut self, actions: &[Action]) {
        let count = self.vehicles.len();
        let actions = actions
            .iter()
            .copied()
            .take(count)
            .pad_using(count, |_| [0.0, 0.0]);

        for (vehicle, action) in self.vehicles.iter_mut().zip(actions) {
            let (acc, steering) = self.config.global.to_controls(action);
            vehicle.drive(acc, steering);
        }
    }

    /// Spawns a vehicle at a random start point, unless the roster is full or
    /// the new vehicle would overlap another.
    fn try_spawn(&mut self, agent_bbox: &BoundingBox, rng: &mut impl Rng) {
        if self.vehicles.len() >= self.capacity() || self.starts.is_empty() {
            return;
        }

        let start = self.starts[rng.gen_range(0..self.starts.len())];
        let sprite = self.random_sprite(rng);
        let state = KinematicState::new(
            start.position[0],
            start.position[1],
            start.orientation.heading(),
            self.config.traffic.speed,
        );
        let vehicle = Vehicle::new(VehicleKind::Npc, &sprite, state, self.config.vehicle);

        if self.check_collision(vehicle.bbox()) || vehicle.bbox().overlaps(agent_bbox) {
            log::debug!("Spawn at ({:.0}, {:.0}) blocked", state.x, state.y);
            debug_box("blocked spawn", vehicle.bbox());
            return;
        }

        log::debug!("Spawned {} at ({:.0}, {:.0})", sprite, state.x, state.y);
        self.vehicles.push(vehicle);
    }

    /// Removes the vehicles that have left the map.
    fn remove_exited(&mut self) {
        let (width, height) = self.bounds;
        let mut obstacle_gone = false;
        self.vehicles.retain(|vehicle| {
            let inside = vehicle.in_map(width, height);
            if !inside {
                log::debug!("{} left the map", vehicle.sprite());
                obstacle_gone |= vehicle.is_obstacle();
            }
            inside
        });
        self.obstacle_gone |= obstacle_gone;
    }

    fn random_sprite(&self, rng: &mut impl Rng) -> String {
        self.config
            .traffic
            .types
            .choose(rng)
            .cloned()
            .unwrap_or_default()
    }

    /// Checks whether any live vehicle overlaps the given footprint.
    pub fn check_collision(&self, bbox: &BoundingBox) -> bool {
        self.vehicles.iter().any(|vehicle| vehicle.bbox().overlaps(bbox))
    }

    /// Finds the vehicle closest to `pos` and its distance.
    /// The first vehicle in the roster wins ties.
    pub fn get_closest(&self, pos: Point2d) -> Option<(&Vehicle, f64)> {
        self.vehicles
            .iter()
            .map(|vehicle| (vehicle, pos.distance(vehicle.position())))
            .fold(None, |closest, (vehicle, dist)| match closest {
                Some((_, min_dist)) if min_dist <= dist => closest,
                _ => Some((vehicle, dist)),
            })
    }

    /// Removes all vehicles and spawns a fresh obstacle if one is used.
    pub fn reset(&mut self, rng: &mut impl Rng) {
        self.vehicles.clear();
        self.obstacle_gone = false;
        if self.use_obstacle {
            let obstacle = self.new_obstacle(rng);
            self.vehicles.push(obstacle);
        }
    }

    /// Creates the obstacle at its configured initial state, with noise if enabled.
    fn new_obstacle(&self, rng: &mut impl Rng) -> Vehicle {
        let params = &self.config.obstacle;
        let sprite = self.random_sprite(rng);

        let (x, y, speed) = if params.noise {
            (
                add_noise(params.x, params.std_x, rng),
                add_noise(params.y, params.std_y, rng),
                add_noise(params.speed, params.std_speed, rng),
            )
        } else {
            (params.x, params.y, params.speed)
        };

        let crash = CrashState {
            enabled: params.crash && rng.gen::<f64>() < params.prob_crash,
            trigger_y: params.crash_y,
            crashing: false,
        };
        log::debug!("Obstacle at ({:.0}, {:.0}), crash: {}", x, y, crash.enabled);

        Vehicle::new(
            VehicleKind::Obstacle(crash),
            &sprite,
            KinematicState::new(x, y, params.theta, speed),
            self.config.vehicle,
        )
    }
}
