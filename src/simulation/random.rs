//! Seedable uniform random source owned by the simulation engine.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform random generator with an optional fixed seed.
///
/// With a configured seed every reseed is derived from it (`seed + n` for
/// the n-th reseed), so a seeded run including resets is reproducible.
/// Without one the generator reseeds from OS entropy.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: StdRng,
    seed: Option<u64>,
    reseeds: u64,
}

impl RandomSource {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: Self::make_rng(seed),
            seed,
            reseeds: 0,
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(None)
    }

    fn make_rng(seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Replace the generator with a freshly seeded one
    pub fn reseed(&mut self) {
        self.reseeds += 1;
        let next = self.seed.map(|s| s.wrapping_add(self.reseeds));
        self.rng = Self::make_rng(next);
    }

    /// Replace the generator and make `seed` the new base seed
    pub fn reseed_with(&mut self, seed: u64) {
        self.seed = Some(seed);
        self.reseeds = 0;
        self.rng = Self::make_rng(Some(seed));
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Uniform sample in `[0, 1)`
    pub fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform sample in `[lo, hi)`; returns `lo` when the interval is empty
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.unit()
    }

    /// Uniform sample in `[-amplitude, amplitude)`
    pub fn symmetric(&mut self, amplitude: f64) -> f64 {
        (self.unit() * 2.0 - 1.0) * amplitude
    }

    /// Bernoulli trial with success probability `p`
    pub fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }
}
