//! Point cloud rendering for meshcloud
//!
//! Everything is rasterised in software:
//! - Static 3D scatter with an orbit camera
//! - Settling animation with fading ghost trails
//! - 2D scatter of reduced points with title and axis labels
//! - Frame sinks for on-disk sequences, a native live window and a PNG preview

pub mod view_box;
pub mod camera;
pub mod canvas;
pub mod scatter3d;
pub mod animation;
pub mod player;
pub mod scatter2d;
pub mod text;
pub mod window;

pub use view_box::*;
pub use camera::*;
pub use canvas::*;
pub use scatter3d::*;
pub use animation::*;
pub use player::*;
pub use scatter2d::*;
pub use text::*;
pub use window::*;

use meshcloud_core::{PointSet, Result};
use std::path::Path;

/// Render a static 3D scatter of `points` and save it to `path`
pub fn save_scatter_3d<P: AsRef<Path>>(points: &PointSet, config: RenderConfig, path: P) -> Result<()> {
    let scatter = Scatter3d::for_points(config, points)?;
    scatter.render(points)?.save(path.as_ref())?;
    tracing::info!("Saved 3D scatter to {}", path.as_ref().display());
    Ok(())
}
