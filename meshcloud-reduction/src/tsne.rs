//! t-SNE through `linfa-tsne`
//!
//! Gradients are exact by default. The Barnes-Hut path of the backend builds
//! its neighbour tree from an unseeded generator, so only `approx_threshold = 0`
//! repeats exactly for a fixed seed.

use crate::array::points_to_array;
use crate::{Reducer, MIN_POINTS};
use linfa::prelude::*;
use linfa_tsne::TSneParams;
use meshcloud_core::{Error, Point3f, Result};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Reduction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReduceConfig {
    /// Neighbourhood size; the backend considers `3 * perplexity` neighbours,
    /// so the perplexity is a third of this
    pub neighbors: usize,
    /// Seed of the initial embedding
    pub seed: u64,
    pub max_iter: usize,
    /// Barnes-Hut accuracy; 0 computes exact gradients and is the only
    /// setting that is reproducible
    pub approx_threshold: f64,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        Self {
            neighbors: 15,
            seed: 42,
            max_iter: 1000,
            approx_threshold: 0.0,
        }
    }
}

impl ReduceConfig {
    pub fn perplexity(&self) -> f64 {
        self.neighbors as f64 / 3.0
    }

    pub fn validate(&self) -> Result<()> {
        if self.neighbors < 3 {
            return Err(Error::Algorithm(format!(
                "neighbourhood size must be at least 3, got {}",
                self.neighbors
            )));
        }
        if !(self.approx_threshold >= 0.0 && self.approx_threshold.is_finite()) {
            return Err(Error::Algorithm(format!(
                "approximation threshold must be non-negative, got {}",
                self.approx_threshold
            )));
        }
        if self.max_iter == 0 {
            return Err(Error::Algorithm("max_iter must be positive".to_string()));
        }
        if self.approx_threshold > 0.0 {
            warn!(
                "Barnes-Hut threshold {} does not repeat across runs with seed {}",
                self.approx_threshold, self.seed
            );
        }
        Ok(())
    }

    /// Smallest point count that fits the neighbourhood size
    pub fn min_points(&self) -> usize {
        (3.0 * self.perplexity()).ceil() as usize + 1
    }
}

/// t-SNE embedding into two components
#[derive(Debug, Clone)]
pub struct TsneReducer {
    config: ReduceConfig,
}

impl TsneReducer {
    pub fn new(config: ReduceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ReduceConfig {
        &self.config
    }

    fn check_size(&self, n: usize) -> Result<()> {
        if n < MIN_POINTS {
            return Err(Error::Algorithm(format!(
                "need at least {MIN_POINTS} points to reduce, got {n}"
            )));
        }
        if n < self.config.min_points() {
            return Err(Error::Algorithm(format!(
                "perplexity {:.2} is too large for {n} points (need at least {})",
                self.config.perplexity(),
                self.config.min_points()
            )));
        }
        Ok(())
    }

    fn embed(&self, data: Array2<f64>) -> Result<Array2<f64>> {
        let rng = StdRng::seed_from_u64(self.config.seed);
        let params = TSneParams::embedding_size_with_rng(2, rng)
            .perplexity(self.config.perplexity())
            .approx_threshold(self.config.approx_threshold)
            .max_iter(self.config.max_iter)
            .check()
            .map_err(|e| Error::Algorithm(format!("invalid t-SNE parameters: {e}")))?;

        params
            .transform(data)
            .map_err(|e| Error::Algorithm(format!("t-SNE failed: {e}")))
    }
}

impl Default for TsneReducer {
    fn default() -> Self {
        Self {
            config: ReduceConfig::default(),
        }
    }
}

impl Reducer for TsneReducer {
    fn reduce(&self, points: &[Point3f]) -> Result<Array2<f64>> {
        self.check_size(points.len())?;
        let data = points_to_array(points);
        debug!(
            "t-SNE on {} points, perplexity {:.2}, seed {}",
            points.len(),
            self.config.perplexity(),
            self.config.seed
        );

        // summation order inside the backend depends on the thread count
        let pool = ThreadPoolBuilder::new()
            .num_threads(1)
            .thread_name(|i| format!("meshcloud-tsne-{i}"))
            .build()
            .map_err(|e| Error::Algorithm(format!("failed to build thread pool: {e}")))?;
        let embedding = pool.install(|| self.embed(data))?;

        info!("Reduced {} points to {:?}", points.len(), embedding.dim());
        Ok(embedding)
    }

    fn component_labels(&self) -> [String; 2] {
        ["t-SNE-1".to_string(), "t-SNE-2".to_string()]
    }

    fn name(&self) -> &str {
        "t-SNE"
    }
}
