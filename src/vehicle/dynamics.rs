use crate::math::{normalize_angle, Point2d};

/// Converts `speed * tan(steering)` into a change of heading per tick.
const STEERING_SCALE: f64 = 50.0;

/// The pose and speed of a body.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KinematicState {
    /// The x coordinate in pixels.
    pub x: f64,
    /// The y coordinate in pixels.
    pub y: f64,
    /// The heading in radians; 0 points along +y and π/2 along +x.
    pub heading: f64,
    /// The speed in pixels per tick.
    pub speed: f64,
}

/// The change in pose produced by one tick of motion.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Displacement {
    pub dx: f64,
    pub dy: f64,
    pub dheading: f64,
}

/// A unicycle motion model, advanced one tick at a time.
#[derive(Clone, Debug)]
pub struct Unicycle {
    state: KinematicState,
}

impl KinematicState {
    pub const fn new(x: f64, y: f64, heading: f64, speed: f64) -> Self {
        Self {
            x,
            y,
            heading,
            speed,
        }
    }

    /// Creates a state from an `[x, y, heading, speed]` array.
    pub fn from_array(values: [f64; 4]) -> Self {
        let [x, y, heading, speed] = values;
        Self::new(x, y, heading, speed)
    }

    /// The state as an `[x, y, heading, speed]` array.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x, self.y, self.heading, self.speed]
    }

    pub fn position(&self) -> Point2d {
        Point2d::new(self.x, self.y)
    }
}

impl Unicycle {
    pub fn new(state: KinematicState) -> Self {
        Self { state }
    }

    /// Advances the body by one tick.
    ///
    /// # Parameters
    /// * `acc` - The change in speed, in pixels/tick.
    /// * `steering` - The steering angle in radians. Must stay away from ±π/2.
    pub fn step(&mut self, acc: f64, steering: f64) -> Displacement {
        let state = &mut self.state;
        state.speed += acc;

        let dheading = state.speed * steering.tan() / STEERING_SCALE;
        state.heading = normalize_angle(state.heading + dheading);

        // One tick, so the displacement is the speed
        let dx = state.speed * state.heading.sin();
        let dy = state.speed * state.heading.cos();
        state.x += dx;
        state.y += dy;

        Displacement { dx, dy, dheading }
    }

    pub fn state(&self) -> &KinematicState {
        &self.state
    }

    pub fn set_state(&mut self, state: KinematicState) {
        self.state = state;
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.state.speed = speed;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::PI;

    #[test]
    fn drives_straight() {
        let mut model = Unicycle::new(KinematicState::new(100.0, 100.0, 0.0, 0.0));
        let d = model.step(2.0, 0.0);
        assert_eq!(d, Displacement { dx: 0.0, dy: 2.0, dheading: 0.0 });
        model.step(0.0, 0.0);
        let state = model.state();
        assert_approx_eq!(state.x, 100.0);
        assert_approx_eq!(state.y, 104.0);
        assert_approx_eq!(state.speed, 2.0);
    }

    #[test]
    fn stationary_without_input() {
        let mut model = Unicycle::new(KinematicState::new(10.0, 20.0, 0.4, 0.0));
        for _ in 0..50 {
            let d = model.step(0.0, 0.3);
            assert_eq!(d.dx, 0.0);
            assert_eq!(d.dy, 0.0);
        }
        let state = model.state();
        assert_eq!((state.x, state.y, state.speed), (10.0, 20.0, 0.0));
        assert_approx_eq!(state.heading, 0.4);
    }

    #[test]
    fn steering_turns_towards_positive_x() {
        let mut model = Unicycle::new(KinematicState::new(0.0, 0.0, 0.0, 10.0));
        let d = model.step(0.0, PI / 4.0);
        assert_approx_eq!(d.dheading, 10.0 / 50.0);
        assert_approx_eq!(model.state().heading, 0.2);
        assert!(d.dx > 0.0);
        assert_approx_eq!(d.dx, 10.0 * 0.2f64.sin());
        assert_approx_eq!(d.dy, 10.0 * 0.2f64.cos());
    }

    #[test]
    fn heading_stays_normalized() {
        let mut model = Unicycle::new(KinematicState::new(0.0, 0.0, 3.0, 20.0));
        for _ in 0..100 {
            model.step(0.0, 1.2);
            let heading = model.state().heading;
            assert!(heading > -PI && heading <= PI);
        }
    }

    #[test]
    fn negative_speed_reverses() {
        let mut model = Unicycle::new(KinematicState::new(0.0, 0.0, 0.0, -3.0));
        model.step(0.0, 0.0);
        assert_approx_eq!(model.state().y, -3.0);
    }
}
