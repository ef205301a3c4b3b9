//! Dimensionality reduction of vertex point sets
//!
//! Projects N×3 positions to N×2 with a neighbourhood-preserving embedding:
//! - UMAP, the default, with a seeded single-threaded optimiser
//! - t-SNE through `linfa-tsne`, with exact gradients in a one-thread pool
//!
//! Both repeat exactly for a fixed seed.

pub mod array;
pub mod tsne;
pub mod umap;

pub use array::*;
pub use tsne::*;
pub use umap::*;

use meshcloud_core::{Point3f, Result};
use ndarray::Array2;

/// Smallest point count any reducer accepts
pub const MIN_POINTS: usize = 4;

/// A projection of 3D points to two components
pub trait Reducer {
    /// Embed `points`, returning an N×2 array
    fn reduce(&self, points: &[Point3f]) -> Result<Array2<f64>>;

    /// Axis labels of the two output components
    fn component_labels(&self) -> [String; 2];

    /// Short name of the technique, used in plot titles
    fn name(&self) -> &str;
}
