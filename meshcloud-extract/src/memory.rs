//! In-memory scene adapter

use crate::scene::{ImageNode, MeshLoop, MeshSource, SceneGraph};
use meshcloud_core::{Error, Point3f, Result, WorldTransform};

/// A polygon mesh held in memory
#[derive(Debug, Clone)]
pub struct MemoryMesh {
    name: String,
    world: WorldTransform,
    vertices: Vec<Point3f>,
    polygons: Vec<Vec<usize>>,
    /// One UV per loop, in polygon order
    uvs: Option<Vec<[f32; 2]>>,
    images: Vec<ImageNode>,
}

impl MemoryMesh {
    /// Create a mesh; every polygon index must refer to a vertex
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Point3f>,
        polygons: Vec<Vec<usize>>,
    ) -> Result<Self> {
        let name = name.into();
        if let Some(bad) = polygons.iter().flatten().find(|&&i| i >= vertices.len()) {
            return Err(Error::InvalidData(format!(
                "mesh {name}: vertex index {bad} out of range ({} vertices)",
                vertices.len()
            )));
        }

        Ok(Self {
            name,
            world: WorldTransform::identity(),
            vertices,
            polygons,
            uvs: None,
            images: Vec::new(),
        })
    }

    /// Attach a UV layer with one coordinate per loop
    pub fn with_uvs(mut self, uvs: Vec<[f32; 2]>) -> Result<Self> {
        let loop_count = self.loop_count();
        if uvs.len() != loop_count {
            return Err(Error::InvalidData(format!(
                "mesh {}: {} UVs for {} loops",
                self.name,
                uvs.len(),
                loop_count
            )));
        }
        self.uvs = Some(uvs);
        Ok(self)
    }

    /// Set the object-to-world matrix
    pub fn with_world_transform(mut self, world: WorldTransform) -> Self {
        self.world = world;
        self
    }

    /// Add an image node to the mesh's material
    pub fn with_image(mut self, node: ImageNode) -> Self {
        self.images.push(node);
        self
    }

    /// Total number of (face, vertex) incidences
    pub fn loop_count(&self) -> usize {
        self.polygons.iter().map(Vec::len).sum()
    }
}

impl MeshSource for MemoryMesh {
    fn name(&self) -> &str {
        &self.name
    }

    fn world_transform(&self) -> WorldTransform {
        self.world
    }

    fn has_uv_layer(&self) -> bool {
        self.uvs.is_some()
    }

    fn loops(&self) -> Box<dyn Iterator<Item = MeshLoop> + '_> {
        let loops = self
            .polygons
            .iter()
            .enumerate()
            .flat_map(|(face_index, poly)| poly.iter().map(move |&v| (face_index, v)))
            .enumerate()
            .map(move |(loop_index, (face_index, vertex_index))| MeshLoop {
                face_index,
                vertex_index,
                position: self.vertices[vertex_index],
                uv: self.uvs.as_ref().map(|uvs| uvs[loop_index]),
            });
        Box::new(loops)
    }

    fn image_nodes(&self) -> &[ImageNode] {
        &self.images
    }
}

/// What a scene node holds
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A container with no geometry of its own
    Empty,
    Mesh(MemoryMesh),
}

/// A named node with children
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// An empty container node
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Empty,
            children: Vec::new(),
        }
    }

    /// A mesh node, named after its mesh
    pub fn mesh(mesh: MemoryMesh) -> Self {
        Self {
            name: mesh.name.clone(),
            kind: NodeKind::Mesh(mesh),
            children: Vec::new(),
        }
    }

    /// Append a child node
    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    fn collect_meshes<'a>(&'a self, out: &mut Vec<&'a dyn MeshSource>) {
        if let NodeKind::Mesh(mesh) = &self.kind {
            out.push(mesh);
        }
        for child in &self.children {
            child.collect_meshes(out);
        }
    }
}

/// A scene tree built in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    pub roots: Vec<SceneNode>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self { roots: Vec::new() }
    }

    /// Add a top-level node
    pub fn with_root(mut self, node: SceneNode) -> Self {
        self.roots.push(node);
        self
    }
}

impl SceneGraph for MemoryScene {
    fn collect_meshes(&self, root: &str) -> Option<Vec<&dyn MeshSource>> {
        let node = self.roots.iter().find_map(|n| n.find(root))?;
        let mut meshes = Vec::new();
        node.collect_meshes(&mut meshes);
        Some(meshes)
    }
}
