//! Uniform manifold approximation and projection
//!
//! Builds a fuzzy k-nearest-neighbour graph over the positions and lays it out
//! in two dimensions by stochastic gradient descent with negative sampling.
//! Every random draw comes from one seeded `StdRng` and the optimisation runs
//! on the calling thread, so a fixed seed repeats exactly.

use crate::{Reducer, MIN_POINTS};
use meshcloud_core::{Error, Point3f, Result};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

const SMOOTH_K_TOLERANCE: f64 = 1e-5;
const BANDWIDTH_ITERATIONS: usize = 64;
const MIN_K_DIST_SCALE: f64 = 1e-3;
/// Samples of the target curve fitted for `a` and `b`
const CURVE_SAMPLES: usize = 300;
const GRADIENT_CLIP: f64 = 4.0;
/// Size of the square the initial layout is scaled into
const INIT_EXTENT: f64 = 10.0;
/// Above this many points the default epoch count drops
const LARGE_DATASET: usize = 10_000;

/// UMAP settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UmapConfig {
    /// Neighbourhood size, counting the point itself
    pub neighbors: usize,
    /// Smallest distance between embedded points
    pub min_dist: f64,
    /// Scale of the embedded clusters
    pub spread: f64,
    pub seed: u64,
    /// Optimisation epochs; `None` uses 500 up to 10 000 points and 200 above
    pub epochs: Option<usize>,
    pub learning_rate: f64,
    /// Negative samples drawn per positive sample
    pub negative_sample_rate: usize,
    /// Weight of the repulsive term
    pub repulsion_strength: f64,
}

impl Default for UmapConfig {
    fn default() -> Self {
        Self {
            neighbors: 15,
            min_dist: 0.1,
            spread: 1.0,
            seed: 42,
            epochs: None,
            learning_rate: 1.0,
            negative_sample_rate: 5,
            repulsion_strength: 1.0,
        }
    }
}

impl UmapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.neighbors < 2 {
            return Err(Error::Algorithm(format!(
                "neighbourhood size must be at least 2, got {}",
                self.neighbors
            )));
        }
        if !(self.spread > 0.0 && self.spread.is_finite()) {
            return Err(Error::Algorithm(format!("spread must be positive, got {}", self.spread)));
        }
        if !(self.min_dist >= 0.0 && self.min_dist <= self.spread) {
            return Err(Error::Algorithm(format!(
                "min_dist must be within [0, spread], got {}",
                self.min_dist
            )));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(Error::Algorithm(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.epochs == Some(0) {
            return Err(Error::Algorithm("epochs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn epochs_for(&self, n: usize) -> usize {
        self.epochs.unwrap_or(if n <= LARGE_DATASET { 500 } else { 200 })
    }
}

/// k nearest neighbours of every point, the point itself first
#[derive(Debug, Clone)]
struct NeighborGraph {
    indices: Vec<Vec<usize>>,
    distances: Vec<Vec<f64>>,
}

fn squared_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

/// Exhaustive search; ties are broken by putting the query first, then by index
fn nearest_neighbors(points: &[[f64; 3]], k: usize) -> NeighborGraph {
    let mut indices = Vec::with_capacity(points.len());
    let mut distances = Vec::with_capacity(points.len());

    for (i, query) in points.iter().enumerate() {
        let mut candidates: Vec<(usize, f64)> = points
            .iter()
            .enumerate()
            .map(|(j, p)| (j, squared_distance(query, p).sqrt()))
            .collect();
        let order = |a: &(usize, f64), b: &(usize, f64)| -> Ordering {
            a.1.total_cmp(&b.1)
                .then((a.0 != i).cmp(&(b.0 != i)))
                .then(a.0.cmp(&b.0))
        };
        if k < candidates.len() {
            candidates.select_nth_unstable_by(k, order);
            candidates.truncate(k);
        }
        candidates.sort_by(order);

        indices.push(candidates.iter().map(|c| c.0).collect());
        distances.push(candidates.iter().map(|c| c.1).collect());
    }

    NeighborGraph { indices, distances }
}

/// Per point: distance to the nearest distinct neighbour (`rho`) and the
/// bandwidth (`sigma`) that makes the membership weights sum to `log2(k)`
fn smooth_distances(distances: &[Vec<f64>]) -> Vec<(f64, f64)> {
    let count: usize = distances.iter().map(Vec::len).sum();
    let mean_all = if count == 0 {
        0.0
    } else {
        distances.iter().flatten().sum::<f64>() / count as f64
    };

    distances
        .iter()
        .map(|row| {
            let target = (row.len() as f64).log2();
            let rho = row.iter().copied().find(|&d| d > 0.0).unwrap_or(0.0);

            let (mut lo, mut hi, mut mid) = (0.0_f64, f64::INFINITY, 1.0_f64);
            for _ in 0..BANDWIDTH_ITERATIONS {
                let psum: f64 = row
                    .iter()
                    .skip(1)
                    .map(|&d| {
                        let d = d - rho;
                        if d > 0.0 {
                            (-d / mid).exp()
                        } else {
                            1.0
                        }
                    })
                    .sum();
                if (psum - target).abs() < SMOOTH_K_TOLERANCE {
                    break;
                }
                if psum > target {
                    hi = mid;
                    mid = (lo + hi) / 2.0;
                } else {
                    lo = mid;
                    mid = if hi.is_infinite() { mid * 2.0 } else { (lo + hi) / 2.0 };
                }
            }

            let floor = if rho > 0.0 {
                MIN_K_DIST_SCALE * row.iter().sum::<f64>() / row.len() as f64
            } else {
                MIN_K_DIST_SCALE * mean_all
            };
            (rho, mid.max(floor))
        })
        .collect()
}

/// Fuzzy union of the directed membership graph: `w + wᵀ - w ∘ wᵀ`
fn fuzzy_graph(graph: &NeighborGraph) -> BTreeMap<(usize, usize), f64> {
    let smoothing = smooth_distances(&graph.distances);
    let mut directed = BTreeMap::new();

    for (i, (row, dists)) in graph.indices.iter().zip(&graph.distances).enumerate() {
        let (rho, sigma) = smoothing[i];
        for (&j, &d) in row.iter().zip(dists) {
            if j == i {
                continue;
            }
            let w = if d - rho <= 0.0 || sigma == 0.0 {
                1.0
            } else {
                (-(d - rho) / sigma).exp()
            };
            directed.insert((i, j), w);
        }
    }

    let mut symmetric = BTreeMap::new();
    for (&(i, j), &w) in &directed {
        let wt = directed.get(&(j, i)).copied().unwrap_or(0.0);
        let union = w + wt - w * wt;
        if union > 0.0 {
            symmetric.insert((i, j), union);
            symmetric.insert((j, i), union);
        }
    }
    symmetric
}

/// Least-squares fit of `1 / (1 + a x^(2b))` to the offset exponential
/// defined by `spread` and `min_dist` (Levenberg-Marquardt)
pub fn fit_curve(spread: f64, min_dist: f64) -> (f64, f64) {
    let samples: Vec<(f64, f64)> = (0..CURVE_SAMPLES)
        .map(|i| {
            let x = 3.0 * spread * i as f64 / (CURVE_SAMPLES - 1) as f64;
            let y = if x < min_dist {
                1.0
            } else {
                (-(x - min_dist) / spread).exp()
            };
            (x, y)
        })
        .collect();

    let cost = |a: f64, b: f64| -> f64 {
        samples
            .iter()
            .map(|&(x, y)| {
                let r = 1.0 / (1.0 + a * x.powf(2.0 * b)) - y;
                r * r
            })
            .sum()
    };

    let (mut a, mut b) = (1.0_f64, 1.0_f64);
    let mut current = cost(a, b);
    let mut lambda = 1e-3;

    for _ in 0..500 {
        let (mut jaa, mut jab, mut jbb, mut ga, mut gb) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for &(x, y) in &samples {
            if x <= 0.0 {
                continue;
            }
            let u = x.powf(2.0 * b);
            let g = 1.0 / (1.0 + a * u);
            let r = g - y;
            let da = -u * g * g;
            let db = -2.0 * a * u * x.ln() * g * g;
            jaa += da * da;
            jab += da * db;
            jbb += db * db;
            ga += da * r;
            gb += db * r;
        }

        let (maa, mbb) = (jaa * (1.0 + lambda), jbb * (1.0 + lambda));
        let det = maa * mbb - jab * jab;
        if det.abs() < f64::MIN_POSITIVE {
            break;
        }
        let step_a = -(mbb * ga - jab * gb) / det;
        let step_b = -(maa * gb - jab * ga) / det;
        let (na, nb) = (a + step_a, b + step_b);

        let candidate = if na > 0.0 && nb > 0.0 { cost(na, nb) } else { f64::INFINITY };
        if candidate < current {
            let gain = current - candidate;
            a = na;
            b = nb;
            current = candidate;
            lambda *= 0.1;
            if gain < 1e-14 {
                break;
            }
        } else {
            lambda *= 10.0;
            if lambda > 1e12 {
                break;
            }
        }
    }

    (a, b)
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    head: usize,
    tail: usize,
    epochs_per_sample: f64,
}

/// UMAP embedding into two components
#[derive(Debug, Clone)]
pub struct UmapReducer {
    config: UmapConfig,
}

impl UmapReducer {
    pub fn new(config: UmapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &UmapConfig {
        &self.config
    }

    /// Neighbourhood size actually used for `n` points
    fn neighbors_for(&self, n: usize) -> usize {
        if n <= self.config.neighbors {
            warn!(
                "neighbourhood size {} exceeds the {} points; using {}",
                self.config.neighbors,
                n,
                n - 1
            );
            n - 1
        } else {
            self.config.neighbors
        }
    }

    /// Edges that survive pruning, with their sampling period in epochs
    fn edges(graph: &BTreeMap<(usize, usize), f64>, epochs: usize) -> Vec<Edge> {
        let max = graph.values().copied().fold(0.0_f64, f64::max);
        if max <= 0.0 {
            return Vec::new();
        }
        graph
            .iter()
            .filter(|&(_, &w)| w >= max / epochs as f64)
            .map(|(&(head, tail), &w)| Edge {
                head,
                tail,
                epochs_per_sample: max / w,
            })
            .collect()
    }

    /// Uniform layout in `[-10, 10]²`, rescaled into `[0, 10]²`
    fn initial_layout(n: usize, rng: &mut StdRng) -> Vec<[f64; 2]> {
        let mut layout: Vec<[f64; 2]> = (0..n)
            .map(|_| [rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0)])
            .collect();
        for d in 0..2 {
            let (lo, hi) = layout
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p[d]), hi.max(p[d])));
            let range = hi - lo;
            if range > 0.0 {
                for p in &mut layout {
                    p[d] = INIT_EXTENT * (p[d] - lo) / range;
                }
            }
        }
        layout
    }

    fn optimize(&self, layout: &mut [[f64; 2]], edges: &[Edge], epochs: usize, rng: &mut StdRng) {
        let (a, b) = fit_curve(self.config.spread, self.config.min_dist);
        let gamma = self.config.repulsion_strength;
        let n = layout.len();
        let negative_rate = self.config.negative_sample_rate as f64;

        let per_negative: Vec<f64> = edges
            .iter()
            .map(|e| e.epochs_per_sample / negative_rate.max(f64::MIN_POSITIVE))
            .collect();
        let mut next_sample: Vec<f64> = edges.iter().map(|e| e.epochs_per_sample).collect();
        let mut next_negative = per_negative.clone();

        for epoch in 0..epochs {
            let alpha = self.config.learning_rate * (1.0 - epoch as f64 / epochs as f64);
            let now = epoch as f64;

            for (e, edge) in edges.iter().enumerate() {
                if next_sample[e] > now {
                    continue;
                }
                let (j, k) = (edge.head, edge.tail);

                let (current, other) = (layout[j], layout[k]);
                let d2 = (current[0] - other[0]).powi(2) + (current[1] - other[1]).powi(2);
                let coeff = if d2 > 0.0 {
                    -2.0 * a * b * d2.powf(b - 1.0) / (a * d2.powf(b) + 1.0)
                } else {
                    0.0
                };
                for d in 0..2 {
                    let grad = (coeff * (current[d] - other[d])).clamp(-GRADIENT_CLIP, GRADIENT_CLIP);
                    layout[j][d] += grad * alpha;
                    layout[k][d] -= grad * alpha;
                }
                next_sample[e] += edge.epochs_per_sample;

                if self.config.negative_sample_rate == 0 {
                    continue;
                }
                let negatives = ((now - next_negative[e]) / per_negative[e]).max(0.0) as usize;
                for _ in 0..negatives {
                    let k = rng.gen_range(0..n);
                    if k == j {
                        continue;
                    }
                    let (current, other) = (layout[j], layout[k]);
                    let d2 = (current[0] - other[0]).powi(2) + (current[1] - other[1]).powi(2);
                    for d in 0..2 {
                        let grad = if d2 > 0.0 {
                            let coeff = 2.0 * gamma * b / ((0.001 + d2) * (a * d2.powf(b) + 1.0));
                            (coeff * (current[d] - other[d])).clamp(-GRADIENT_CLIP, GRADIENT_CLIP)
                        } else {
                            GRADIENT_CLIP
                        };
                        layout[j][d] += grad * alpha;
                    }
                }
                next_negative[e] += negatives as f64 * per_negative[e];
            }
        }
    }
}

impl Default for UmapReducer {
    fn default() -> Self {
        Self {
            config: UmapConfig::default(),
        }
    }
}

impl Reducer for UmapReducer {
    fn reduce(&self, points: &[Point3f]) -> Result<Array2<f64>> {
        let n = points.len();
        if n < MIN_POINTS {
            return Err(Error::Algorithm(format!(
                "need at least {MIN_POINTS} points to reduce, got {n}"
            )));
        }

        let data: Vec<[f64; 3]> = points
            .iter()
            .map(|p| [f64::from(p.x), f64::from(p.y), f64::from(p.z)])
            .collect();
        let k = self.neighbors_for(n);
        let epochs = self.config.epochs_for(n);
        debug!(
            "UMAP on {} points, {} neighbours, min_dist {}, seed {}",
            n, k, self.config.min_dist, self.config.seed
        );

        let graph = fuzzy_graph(&nearest_neighbors(&data, k));
        let edges = Self::edges(&graph, epochs);
        debug!("{} graph edges over {} epochs", edges.len(), epochs);

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut layout = Self::initial_layout(n, &mut rng);
        self.optimize(&mut layout, &edges, epochs, &mut rng);

        let embedding = Array2::from_shape_fn((n, 2), |(i, d)| layout[i][d]);
        info!("Reduced {} points to {:?}", n, embedding.dim());
        Ok(embedding)
    }

    fn component_labels(&self) -> [String; 2] {
        ["UMAP-1".to_string(), "UMAP-2".to_string()]
    }

    fn name(&self) -> &str {
        "UMAP"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line(n: usize) -> Vec<[f64; 3]> {
        (0..n).map(|i| [i as f64, 0.0, 0.0]).collect()
    }

    #[test]
    fn test_default_config() {
        let config = UmapConfig::default();
        assert_eq!(config.neighbors, 15);
        assert_eq!(config.min_dist, 0.1);
        assert_eq!(config.seed, 42);
        assert_eq!(config.epochs_for(100), 500);
        assert_eq!(config.epochs_for(20_000), 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let too_far = UmapConfig {
            min_dist: 2.0,
            ..UmapConfig::default()
        };
        assert!(UmapReducer::new(too_far).is_err());

        let no_neighbors = UmapConfig {
            neighbors: 1,
            ..UmapConfig::default()
        };
        assert!(UmapReducer::new(no_neighbors).is_err());
    }

    #[test]
    fn test_curve_fit_for_default_min_dist() {
        let (a, b) = fit_curve(1.0, 0.1);
        assert_relative_eq!(a, 1.577, epsilon = 0.02);
        assert_relative_eq!(b, 0.895, epsilon = 0.01);
    }

    #[test]
    fn test_nearest_neighbors_start_with_self() {
        let graph = nearest_neighbors(&line(6), 3);
        assert_eq!(graph.indices[0], vec![0, 1, 2]);
        assert_eq!(graph.indices[3], vec![3, 2, 4]);
        assert_eq!(graph.distances[3], vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_duplicates_keep_query_first() {
        let points = [[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let graph = nearest_neighbors(&points, 2);
        assert_eq!(graph.indices[1], vec![1, 0]);
    }

    #[test]
    fn test_bandwidth_meets_target() {
        let graph = nearest_neighbors(&line(20), 5);
        let smoothing = smooth_distances(&graph.distances);
        for (row, &(rho, sigma)) in graph.distances.iter().zip(&smoothing) {
            assert_eq!(rho, 1.0);
            let psum: f64 = row[1..].iter().map(|&d| (-(d - rho).max(0.0) / sigma).exp()).sum();
            assert_relative_eq!(psum, 5.0_f64.log2(), epsilon = 1e-3);
        }
    }

    #[test]
    fn test_fuzzy_graph_is_symmetric() {
        let graph = fuzzy_graph(&nearest_neighbors(&line(10), 4));
        for (&(i, j), &w) in &graph {
            assert!(w > 0.0 && w <= 1.0 + 1e-12);
            assert_eq!(graph.get(&(j, i)), Some(&w));
        }
        // nearest neighbours are fully connected
        assert_eq!(graph.get(&(4, 5)), Some(&1.0));
    }

    #[test]
    fn test_too_few_points() {
        let reducer = UmapReducer::default();
        let points = vec![Point3f::origin(); 3];
        assert!(matches!(reducer.reduce(&points), Err(Error::Algorithm(_))));
    }

    #[test]
    fn test_small_set_clamps_neighbors() {
        let reducer = UmapReducer::new(UmapConfig {
            epochs: Some(50),
            ..UmapConfig::default()
        })
        .unwrap();
        let points: Vec<Point3f> = (0..6).map(|i| Point3f::new(i as f32, 0.0, 0.0)).collect();
        let embedding = reducer.reduce(&points).unwrap();
        assert_eq!(embedding.dim(), (6, 2));
        assert!(embedding.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_separated_clusters_stay_apart() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut points = Vec::new();
        for offset in [0.0_f32, 100.0] {
            for _ in 0..30 {
                points.push(Point3f::new(
                    offset + rng.gen::<f32>(),
                    rng.gen::<f32>(),
                    rng.gen::<f32>(),
                ));
            }
        }

        let embedding = UmapReducer::default().reduce(&points).unwrap();
        let centroid = |range: std::ops::Range<usize>| {
            let len = range.len() as f64;
            range.fold([0.0, 0.0], |acc, i| {
                [acc[0] + embedding[[i, 0]] / len, acc[1] + embedding[[i, 1]] / len]
            })
        };
        let spread = |range: std::ops::Range<usize>, c: [f64; 2]| {
            let len = range.len() as f64;
            range
                .map(|i| ((embedding[[i, 0]] - c[0]).powi(2) + (embedding[[i, 1]] - c[1]).powi(2)).sqrt())
                .sum::<f64>()
                / len
        };

        let (ca, cb) = (centroid(0..30), centroid(30..60));
        let gap = ((ca[0] - cb[0]).powi(2) + (ca[1] - cb[1]).powi(2)).sqrt();
        assert!(gap > spread(0..30, ca));
        assert!(gap > spread(30..60, cb));
    }

    #[test]
    fn test_labels() {
        let reducer = UmapReducer::default();
        assert_eq!(reducer.component_labels(), ["UMAP-1", "UMAP-2"]);
        assert_eq!(reducer.name(), "UMAP");
    }
}
