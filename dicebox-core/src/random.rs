/// Random source owned by the dice simulation
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::transform::Axis;

/// Pseudo-random generator that can be re-seeded from the clock.
///
/// A clock-driven source picks a fresh seed on every [`reseed`](Self::reseed).
/// A [`seeded`](Self::seeded) source ignores reseeds so runs are repeatable.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: StdRng,
    from_clock: bool,
}

impl RandomSource {
    pub fn from_clock() -> Self {
        Self {
            rng: StdRng::seed_from_u64(clock_seed()),
            from_clock: true,
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            from_clock: false,
        }
    }

    pub fn is_deterministic(&self) -> bool {
        !self.from_clock
    }

    pub fn reseed(&mut self) {
        if self.from_clock {
            self.rng = StdRng::seed_from_u64(clock_seed());
        }
    }

    /// Uniform integer in `[lo, hi]`
    pub fn uniform_int(&mut self, lo: i64, hi: i64) -> i64 {
        if hi < lo {
            return lo;
        }
        self.rng.gen_range(lo..=hi)
    }

    /// Uniform float in `[lo, hi)`; an empty or non-finite range yields `lo`
    pub fn uniform_real(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo || !(hi - lo).is_finite() {
            return lo;
        }
        self.rng.gen_range(lo..hi)
    }

    pub fn choose_axis(&mut self) -> Axis {
        let index = self.uniform_int(0, Axis::ALL.len() as i64 - 1);
        Axis::ALL[index as usize]
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_clock()
    }
}

/// Monotonic nanoseconds since the first seed, mixed with the wall clock and
/// a draw counter so two reseeds within one clock tick still differ.
fn clock_seed() -> u64 {
    static ANCHOR: OnceLock<Instant> = OnceLock::new();
    static DRAWS: AtomicU64 = AtomicU64::new(0);

    let monotonic = ANCHOR.get_or_init(Instant::now).elapsed().as_nanos() as u64;
    // A clock before the epoch still has to give us something to seed with.
    let wall = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_nanos(),
        Err(err) => err.duration().as_nanos(),
    } as u64;
    let draw = DRAWS.fetch_add(1, Ordering::Relaxed);

    monotonic ^ wall.rotate_left(32) ^ draw.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_int_is_inclusive() {
        let mut rng = RandomSource::seeded(7);
        let mut seen = [false; 7];
        for _ in 0..500 {
            let value = rng.uniform_int(1, 6);
            assert!((1..=6).contains(&value));
            seen[value as usize] = true;
        }
        assert!(!seen[0]);
        assert!(seen[1..].iter().all(|&hit| hit));
    }

    #[test]
    fn test_empty_ranges_do_not_panic() {
        let mut rng = RandomSource::seeded(1);
        assert_eq!(rng.uniform_real(0.0, 0.0), 0.0);
        assert_eq!(rng.uniform_int(5, 4), 5);
    }

    #[test]
    fn test_seeded_sources_repeat() {
        let mut a = RandomSource::seeded(42);
        let mut b = RandomSource::seeded(42);
        a.reseed();
        for _ in 0..10 {
            assert_eq!(a.uniform_real(-1.0, 1.0), b.uniform_real(-1.0, 1.0));
        }
        assert!(a.is_deterministic());
        assert!(!RandomSource::from_clock().is_deterministic());
    }

    #[test]
    fn test_back_to_back_clock_seeds_differ() {
        let seeds: Vec<u64> = (0..64).map(|_| clock_seed()).collect();
        for (index, seed) in seeds.iter().enumerate() {
            assert!(!seeds[index + 1..].contains(seed), "seed {seed} repeated");
        }

        let mut a = RandomSource::from_clock();
        let mut b = RandomSource::from_clock();
        let draws_a: Vec<f32> = (0..4).map(|_| a.uniform_real(0.0, 1.0)).collect();
        let draws_b: Vec<f32> = (0..4).map(|_| b.uniform_real(0.0, 1.0)).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn test_choose_axis_reaches_every_axis() {
        let mut rng = RandomSource::seeded(3);
        let mut seen = [false; 3];
        for _ in 0..100 {
            seen[rng.choose_axis().index()] = true;
        }
        assert_eq!(seen, [true; 3]);
    }
}
