//! Bernoulli thinning of mesh loops

use meshcloud_core::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Independent keep/drop trials with a fixed probability.
///
/// Every (face, loop) pair gets its own trial, so a vertex shared by N faces
/// is tried N times.
#[derive(Debug, Clone)]
pub struct RetentionSampler {
    keep_prob: f64,
    rng: StdRng,
}

impl RetentionSampler {
    /// Create a sampler; a seed makes the trial sequence reproducible
    pub fn new(keep_prob: f64, seed: Option<u64>) -> Result<Self> {
        if !(0.0..=1.0).contains(&keep_prob) {
            return Err(Error::InvalidData(format!(
                "keep probability must be within [0, 1], got {keep_prob}"
            )));
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self { keep_prob, rng })
    }

    pub fn keep_prob(&self) -> f64 {
        self.keep_prob
    }

    /// Run one trial
    pub fn keep(&mut self) -> bool {
        self.rng.gen_bool(self.keep_prob)
    }
}
