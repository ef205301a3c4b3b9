//! Vertex extraction from 3D scenes
//!
//! The extractor walks the mesh objects under a named root, thins their
//! (face, loop) pairs with a Bernoulli sampler, optionally samples a texture
//! colour at each loop's UV and writes the result as a vertex table.
//!
//! Scenes are reached through the [`SceneGraph`] and [`MeshSource`] traits so
//! the host binding is an adapter: [`MemoryScene`] for programmatic scenes and
//! [`ObjScene`] for Wavefront OBJ files.

pub mod scene;
pub mod texture;
pub mod sampling;
pub mod extractor;
pub mod memory;
pub mod obj_scene;

pub use scene::*;
pub use texture::*;
pub use sampling::*;
pub use extractor::*;
pub use memory::*;
pub use obj_scene::*;
