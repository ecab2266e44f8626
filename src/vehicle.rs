pub use self::dynamics::{Displacement, KinematicState, Unicycle};
use crate::bounding_box::BoundingBox;
use crate::config::VehicleDimensions;
use crate::math::Point2d;
use crate::util::Interval;

mod dynamics;

/// The deceleration applied to a crashing obstacle, in pixels/tick<sup>2</sup>.
const CRASH_DECELERATION: f64 = 2.0;

/// A simulated vehicle.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// What controls the vehicle.
    kind: VehicleKind,
    /// The motion model.
    model: Unicycle,
    /// The footprint of the vehicle, kept in sync with its pose.
    bbox: BoundingBox,
    /// The name of the sprite the vehicle is drawn with.
    sprite: String,
    /// The state the vehicle returns to when reset without noise.
    initial: KinematicState,
}

/// The role of a vehicle in the simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VehicleKind {
    /// The vehicle controlled by the user or policy.
    Agent,
    /// A vehicle spawned by the traffic manager.
    Npc,
    /// A scripted NPC which may crash.
    Obstacle(CrashState),
}

/// The crash state of an obstacle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CrashState {
    /// Whether the obstacle will crash this episode.
    pub enabled: bool,
    /// The y coordinate at which the crash begins.
    pub trigger_y: f64,
    /// Whether the obstacle is currently crashing.
    pub crashing: bool,
}

impl Vehicle {
    /// Creates a new vehicle with its footprint placed at `state`.
    pub fn new(
        kind: VehicleKind,
        sprite: &str,
        state: KinematicState,
        dims: VehicleDimensions,
    ) -> Self {
        let mut bbox = BoundingBox::centred(dims.width, dims.length);
        bbox.move_to(state.x, state.y, state.heading);
        Self {
            kind,
            model: Unicycle::new(state),
            bbox,
            sprite: sprite.to_string(),
            initial: state,
        }
    }

    pub fn kind(&self) -> &VehicleKind {
        &self.kind
    }

    pub fn is_obstacle(&self) -> bool {
        matches!(self.kind, VehicleKind::Obstacle(_))
    }

    /// The crash state, if this vehicle is an obstacle.
    pub fn crash_state(&self) -> Option<&CrashState> {
        match &self.kind {
            VehicleKind::Obstacle(crash) => Some(crash),
            _ => None,
        }
    }

    /// Whether this vehicle is an obstacle that is currently crashing.
    pub fn is_crashing(&self) -> bool {
        self.crash_state().map_or(false, |crash| crash.crashing)
    }

    pub fn sprite(&self) -> &str {
        &self.sprite
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn state(&self) -> &KinematicState {
        self.model.state()
    }

    /// The state the vehicle was created with.
    pub fn initial_state(&self) -> &KinematicState {
        &self.initial
    }

    pub fn x(&self) -> f64 {
        self.state().x
    }

    pub fn y(&self) -> f64 {
        self.state().y
    }

    pub fn position(&self) -> Point2d {
        self.state().position()
    }

    pub fn heading(&self) -> f64 {
        self.state().heading
    }

    pub fn speed(&self) -> f64 {
        self.state().speed
    }

    /// Sets the speed without changing the pose.
    pub fn set_speed(&mut self, speed: f64) {
        self.model.set_speed(speed);
    }

    /// Sets the state, moving the footprint to the new pose.
    pub fn set_state(&mut self, state: KinematicState) {
        self.model.set_state(state);
        self.bbox.move_to(state.x, state.y, state.heading);
    }

    /// Moves the vehicle to a new position, keeping its heading and speed.
    pub fn set_position(&mut self, x: f64, y: f64) {
        let state = KinematicState { x, y, ..*self.state() };
        self.set_state(state);
    }

    /// Drives the vehicle for one tick and moves its footprint by the same amount.
    ///
    /// # Parameters
    /// * `acc` - The acceleration in pixels/tick<sup>2</sup>
    /// * `steering` - The steering angle in radians
    pub fn drive(&mut self, acc: f64, steering: f64) -> Displacement {
        let (acc, steering) = self.override_controls(acc, steering);
        let d = self.model.step(acc, steering);
        self.bbox.transform(d.dx, d.dy, d.dheading);
        d
    }

    /// Replaces the control input of a crashing obstacle with a fixed deceleration
    /// while it is still moving forward.
    fn override_controls(&mut self, acc: f64, steering: f64) -> (f64, f64) {
        let state = *self.model.state();
        if let VehicleKind::Obstacle(crash) = &mut self.kind {
            if crash.enabled && !crash.crashing && state.y >= crash.trigger_y {
                log::debug!("Obstacle crashing at y = {:.1}", state.y);
                crash.crashing = true;
            }
            if crash.crashing && state.speed > 0.0 {
                return (-CRASH_DECELERATION, 0.0);
            }
        }
        (acc, steering)
    }

    /// Whether the vehicle's position lies within a map of the given size.
    pub fn in_map(&self, width: f64, height: f64) -> bool {
        Interval::new(0.0, width).contains(self.x()) && Interval::new(0.0, height).contains(self.y())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::PI;

    const DIMS: VehicleDimensions = VehicleDimensions {
        width: 20.0,
        length: 40.0,
    };

    fn assert_bbox_follows(vehicle: &Vehicle) {
        let centre = vehicle.bbox().centre();
        assert_approx_eq!(centre.x, vehicle.x(), 1e-6);
        assert_approx_eq!(centre.y, vehicle.y(), 1e-6);
        let diff = vehicle.bbox().angle() - vehicle.heading();
        assert_approx_eq!(diff.sin(), 0.0, 1e-6);
        assert_approx_eq!(diff.cos(), 1.0, 1e-6);
    }

    #[test]
    fn bbox_follows_motion() {
        let state = KinematicState::new(200.0, 100.0, 0.3, 2.0);
        let mut vehicle = Vehicle::new(VehicleKind::Agent, "red_car", state, DIMS);
        assert_bbox_follows(&vehicle);
        for i in 0..200 {
            let steering = if i < 100 { 0.4 } else { -0.3 };
            vehicle.drive(0.01, steering);
            assert_bbox_follows(&vehicle);
        }
    }

    #[test]
    fn bbox_follows_set_state() {
        let mut vehicle = Vehicle::new(VehicleKind::Npc, "blue_car", KinematicState::default(), DIMS);
        vehicle.set_state(KinematicState::new(50.0, 60.0, PI / 2.0, 1.0));
        assert_bbox_follows(&vehicle);
        vehicle.set_position(10.0, 20.0);
        assert_bbox_follows(&vehicle);
        assert_eq!(vehicle.speed(), 1.0);
    }

    #[test]
    fn in_map_includes_edges() {
        let mut vehicle = Vehicle::new(VehicleKind::Agent, "red_car", KinematicState::default(), DIMS);
        assert!(vehicle.in_map(500.0, 500.0));
        vehicle.set_position(500.0, 500.0);
        assert!(vehicle.in_map(500.0, 500.0));
        vehicle.set_position(501.0, 250.0);
        assert!(!vehicle.in_map(500.0, 500.0));
        vehicle.set_position(250.0, -0.5);
        assert!(!vehicle.in_map(500.0, 500.0));
    }

    #[test]
    fn obstacle_decelerates_after_trigger() {
        let crash = CrashState {
            enabled: true,
            trigger_y: 105.0,
            crashing: false,
        };
        let state = KinematicState::new(100.0, 100.0, 0.0, 5.0);
        let mut obstacle = Vehicle::new(VehicleKind::Obstacle(crash), "white_car", state, DIMS);

        // Not yet at the trigger point
        obstacle.drive(0.5, 0.0);
        assert!(!obstacle.is_crashing());
        assert_approx_eq!(obstacle.speed(), 5.5);

        obstacle.drive(0.5, 0.0);
        assert!(obstacle.is_crashing());
        assert_approx_eq!(obstacle.speed(), 3.5);

        obstacle.drive(0.5, 0.3);
        assert_approx_eq!(obstacle.speed(), 1.5);
        assert_approx_eq!(obstacle.heading(), 0.0);

        // The deceleration is fixed, so it can overshoot
        obstacle.drive(0.5, 0.0);
        assert_approx_eq!(obstacle.speed(), -0.5);

        // Once no longer moving forward, the supplied input applies again
        obstacle.drive(0.5, 0.0);
        assert_approx_eq!(obstacle.speed(), 0.0);
        obstacle.drive(0.5, 0.3);
        assert_approx_eq!(obstacle.speed(), 0.5);
        assert!(obstacle.heading() > 0.0);
        assert!(obstacle.is_crashing());

        obstacle.drive(0.5, 0.0);
        assert_approx_eq!(obstacle.speed(), -1.5);
    }

    #[test]
    fn crash_from_slow_speed_overshoots() {
        let crash = CrashState {
            enabled: true,
            trigger_y: 0.0,
            crashing: false,
        };
        let state = KinematicState::new(100.0, 100.0, 0.0, 1.5);
        let mut obstacle = Vehicle::new(VehicleKind::Obstacle(crash), "white_car", state, DIMS);

        obstacle.drive(0.5, 0.0);
        assert!(obstacle.is_crashing());
        assert_approx_eq!(obstacle.speed(), -0.5);

        obstacle.drive(0.5, 0.3);
        assert_approx_eq!(obstacle.speed(), 0.0);
        obstacle.drive(0.5, 0.3);
        assert_approx_eq!(obstacle.speed(), 0.5);
        assert_approx_eq!(obstacle.heading(), 0.5 * 0.3f64.tan() / 50.0);
    }

    #[test]
    fn disabled_obstacle_ignores_trigger() {
        let crash = CrashState {
            enabled: false,
            trigger_y: 0.0,
            crashing: false,
        };
        let state = KinematicState::new(100.0, 100.0, 0.0, 5.0);
        let mut obstacle = Vehicle::new(VehicleKind::Obstacle(crash), "white_car", state, DIMS);
        obstacle.drive(0.5, 0.0);
        assert!(!obstacle.is_crashing());
        assert_approx_eq!(obstacle.speed(), 5.5);
    }
}
