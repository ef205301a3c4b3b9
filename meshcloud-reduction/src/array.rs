//! Conversions between point lists and ndarray matrices

use meshcloud_core::{Error, Point3f, Result};
use ndarray::Array2;

/// N×3 matrix of positions
pub fn points_to_array(points: &[Point3f]) -> Array2<f64> {
    Array2::from_shape_fn((points.len(), 3), |(i, j)| f64::from(points[i][j]))
}

/// Rows of an N×2 embedding
pub fn embedding_rows(embedding: &Array2<f64>) -> Result<Vec<[f64; 2]>> {
    if embedding.ncols() != 2 {
        return Err(Error::Algorithm(format!(
            "expected 2 embedding columns, found {}",
            embedding.ncols()
        )));
    }
    Ok(embedding.rows().into_iter().map(|r| [r[0], r[1]]).collect())
}
