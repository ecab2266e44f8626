//! Miscellaneous utility structs and functions.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::fmt::Debug;

/// A closed interval on the real number line.
#[derive(Copy, Clone, Default, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    /// Creates a new interval.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns true if this interval contains the value, including its end points.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Limits a value to the interval.
    pub fn clamp(&self, value: f64) -> f64 {
        f64::max(self.min, f64::min(self.max, value))
    }
}

impl Debug for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interval({:?}, {:?})", &self.min, &self.max)
    }
}

/// Samples a value from a normal distribution centred on `value`.
///
/// Returns `value` unchanged if `std` is not a valid standard deviation.
pub fn add_noise(value: f64, std: f64, rng: &mut impl Rng) -> f64 {
    match Normal::new(value, std) {
        Ok(distr) => distr.sample(rng),
        Err(_) => value,
    }
}

/// Rounds a value to the given number of decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Returns true if `x` is within `tol` of `y`.
pub fn is_close(x: f64, y: f64, tol: f64) -> bool {
    (x - y).abs() <= tol
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn interval_clamp() {
        let interval = Interval::new(0.0, 500.0);
        assert_eq!(interval.clamp(-3.0), 0.0);
        assert_eq!(interval.clamp(501.0), 500.0);
        assert_eq!(interval.clamp(20.5), 20.5);
        assert!(interval.contains(500.0));
        assert!(!interval.contains(500.1));
    }

    #[test]
    fn noise_is_reproducible() {
        let mut a = rand::rngs::StdRng::seed_from_u64(3);
        let mut b = rand::rngs::StdRng::seed_from_u64(3);
        for _ in 0..10 {
            assert_eq!(add_noise(100.0, 5.0, &mut a), add_noise(100.0, 5.0, &mut b));
        }
        assert_eq!(add_noise(100.0, 0.0, &mut a), 100.0);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(-0.5, 0), -1.0);
        assert_eq!(round_to(7.0, 3), 7.0);
    }
}
