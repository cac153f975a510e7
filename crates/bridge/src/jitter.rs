//! Input Jitter
//!
//! Randomized coordinate and timing perturbation applied to synthetic taps
//! and swipes so input does not land in perfectly deterministic patterns.
//! The RNG is created per call; a fixed seed makes every sample reproducible
//! for tests.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Jitter source scoped to one bridge instance.
#[derive(Debug, Clone)]
pub struct Jitter {
    seed: Option<u64>,
}

impl Jitter {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Apply an independent uniform offset in `[-max_offset, max_offset]`
    /// to each coordinate. `max_offset == 0` is the identity.
    pub fn jittered_point(&self, x: i32, y: i32, max_offset: i32) -> (i32, i32) {
        if max_offset <= 0 {
            return (x, y);
        }
        let mut rng = self.rng();
        let dx = rng.gen_range(-max_offset..=max_offset);
        let dy = rng.gen_range(-max_offset..=max_offset);
        (x + dx, y + dy)
    }

    /// Sample a uniform delay in `[min_ms, max_ms]`.
    pub fn delay(&self, min_ms: u64, max_ms: u64) -> Duration {
        if max_ms <= min_ms {
            return Duration::from_millis(min_ms);
        }
        let mut rng = self.rng();
        Duration::from_millis(rng.gen_range(min_ms..=max_ms))
    }
}

/// Options for a single tap.
#[derive(Debug, Clone)]
pub struct TapOptions {
    /// Maximum random offset in pixels, per axis
    pub max_offset: i32,
    /// Minimum random pre-command delay in milliseconds
    pub min_delay_ms: u64,
    /// Maximum random pre-command delay in milliseconds
    pub max_delay_ms: u64,
    /// Sleep a fixed interval before the tap
    pub before_sleep: bool,
    /// Sleep a fixed interval after the tap
    pub after_sleep: bool,
    /// Fixed pre-tap sleep in milliseconds
    pub before_sleep_ms: u64,
    /// Fixed post-tap sleep in milliseconds
    pub after_sleep_ms: u64,
}

impl Default for TapOptions {
    fn default() -> Self {
        Self {
            max_offset: 10,
            min_delay_ms: 100,
            max_delay_ms: 500,
            before_sleep: false,
            after_sleep: true,
            before_sleep_ms: 2000,
            after_sleep_ms: 2000,
        }
    }
}

impl TapOptions {
    /// Fully deterministic options: no offset, no delays.
    pub fn exact() -> Self {
        Self {
            max_offset: 0,
            min_delay_ms: 0,
            max_delay_ms: 0,
            before_sleep: false,
            after_sleep: false,
            before_sleep_ms: 0,
            after_sleep_ms: 0,
        }
    }
}

/// Options for a single swipe.
#[derive(Debug, Clone)]
pub struct SwipeOptions {
    /// Maximum random endpoint offset in pixels, per axis
    pub max_offset: i32,
    /// Minimum random pre-command delay in milliseconds
    pub min_delay_ms: u64,
    /// Maximum random pre-command delay in milliseconds
    pub max_delay_ms: u64,
}

impl Default for SwipeOptions {
    fn default() -> Self {
        Self {
            max_offset: 5,
            min_delay_ms: 100,
            max_delay_ms: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_offset_is_identity() {
        let jitter = Jitter::new(None);
        assert_eq!(jitter.jittered_point(500, 500, 0), (500, 500));
    }

    #[test]
    fn test_offset_stays_in_bounds() {
        let jitter = Jitter::new(None);
        for _ in 0..64 {
            let (x, y) = jitter.jittered_point(100, 200, 10);
            assert!((90..=110).contains(&x));
            assert!((190..=210).contains(&y));
        }
    }

    #[test]
    fn test_seeded_samples_are_reproducible() {
        let a = Jitter::new(Some(7));
        let b = Jitter::new(Some(7));
        assert_eq!(a.jittered_point(100, 100, 10), b.jittered_point(100, 100, 10));
        assert_eq!(a.delay(100, 500), b.delay(100, 500));
    }

    #[test]
    fn test_delay_bounds() {
        let jitter = Jitter::new(None);
        assert_eq!(jitter.delay(0, 0), Duration::from_millis(0));
        let d = jitter.delay(100, 500);
        assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(500));
    }
}
