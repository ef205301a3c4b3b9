//! Host scene abstraction

use crate::texture::PixelBuffer;
use meshcloud_core::{Point3f, WorldTransform};
use std::path::PathBuf;

/// One (face, vertex) incidence of a polygon mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshLoop {
    pub face_index: usize,
    pub vertex_index: usize,
    /// Vertex position in object-local space
    pub position: Point3f,
    /// Texture coordinate of this loop, if the mesh has a UV layer. A loop
    /// of a UV mesh may still lack one (an OBJ corner without a `vt` index);
    /// the extractor samples the texture origin for it and counts it.
    pub uv: Option<[f32; 2]>,
}

/// Where an image node's pixels come from
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// An image file, re-read from disk every time it is resolved
    File(PathBuf),
    /// Pixels already held in memory
    Pixels(PixelBuffer),
}

/// An image node of an object's active material
#[derive(Debug, Clone)]
pub struct ImageNode {
    /// Image name as the host reports it, usually a file name
    pub image_name: String,
    pub source: ImageSource,
}

impl ImageNode {
    /// Node backed by an image file
    pub fn file(image_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            image_name: image_name.into(),
            source: ImageSource::File(path.into()),
        }
    }

    /// Node backed by in-memory pixels
    pub fn pixels(image_name: impl Into<String>, pixels: PixelBuffer) -> Self {
        Self {
            image_name: image_name.into(),
            source: ImageSource::Pixels(pixels),
        }
    }
}

/// A source of (polygon, loop, vertex, UV, world-transform) tuples
pub trait MeshSource {
    /// Object name in the host scene
    fn name(&self) -> &str;

    /// Object-to-world matrix
    fn world_transform(&self) -> WorldTransform;

    /// Whether the mesh carries a UV layer
    fn has_uv_layer(&self) -> bool;

    /// Loops in polygon order, local-space positions
    fn loops(&self) -> Box<dyn Iterator<Item = MeshLoop> + '_>;

    /// Image nodes of the object's active material
    fn image_nodes(&self) -> &[ImageNode];
}

/// Named-object lookup in a host scene
pub trait SceneGraph {
    /// Mesh objects under `root` in traversal order.
    ///
    /// A mesh root yields itself (followed by any mesh children); a container
    /// root yields its mesh descendants depth first. `None` when no object
    /// named `root` exists.
    fn collect_meshes(&self, root: &str) -> Option<Vec<&dyn MeshSource>>;
}
