//! Wavefront OBJ scene adapter
//!
//! The file itself acts as the container root (named after the file stem);
//! every `o` object inside it is a mesh. UVs come from the `vt` indices of
//! each face corner and the image nodes are the `map_Kd` textures of the
//! materials the object's groups use.

use crate::scene::{ImageNode, ImageSource, MeshLoop, MeshSource, SceneGraph};
use meshcloud_core::{Error, Point3f, Result, WorldTransform};
use obj::{Obj, ObjMaterial};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One object of an OBJ file
#[derive(Debug, Clone)]
pub struct ObjMesh {
    name: String,
    loops: Vec<MeshLoop>,
    has_uv: bool,
    images: Vec<ImageNode>,
}

impl ObjMesh {
    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }
}

impl MeshSource for ObjMesh {
    fn name(&self) -> &str {
        &self.name
    }

    fn world_transform(&self) -> WorldTransform {
        WorldTransform::identity()
    }

    fn has_uv_layer(&self) -> bool {
        self.has_uv
    }

    fn loops(&self) -> Box<dyn Iterator<Item = MeshLoop> + '_> {
        Box::new(self.loops.iter().copied())
    }

    fn image_nodes(&self) -> &[ImageNode] {
        &self.images
    }
}

/// A scene loaded from an OBJ file
#[derive(Debug, Clone)]
pub struct ObjScene {
    name: String,
    meshes: Vec<ObjMesh>,
}

impl ObjScene {
    /// Load an OBJ file and its material libraries
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("OBJ file not found: {}", path.display()),
            )));
        }

        let mut obj = Obj::load(path)
            .map_err(|e| Error::InvalidData(format!("failed to parse {}: {}", path.display(), e)))?;
        if let Err(e) = obj.load_mtls() {
            warn!("Some material libraries of {} failed to load: {:?}", path.display(), e);
        }

        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("scene")
            .to_string();

        let meshes = Self::convert(&obj, &base_dir)?;
        info!("Loaded {} objects from {}", meshes.len(), path.display());

        Ok(Self { name, meshes })
    }

    fn convert(obj: &Obj, base_dir: &Path) -> Result<Vec<ObjMesh>> {
        let data = &obj.data;
        let mut meshes = Vec::with_capacity(data.objects.len());

        for object in &data.objects {
            let mut loops = Vec::new();
            let mut has_uv = false;
            let mut images: Vec<ImageNode> = Vec::new();
            let mut face_index = 0;

            for group in &object.groups {
                if let Some(ObjMaterial::Mtl(material)) = &group.material {
                    if let Some(map_kd) = &material.map_kd {
                        let texture_path: PathBuf = base_dir.join(map_kd);
                        let already_listed = images.iter().any(|n| {
                            matches!(&n.source, ImageSource::File(p) if *p == texture_path)
                        });
                        if !already_listed {
                            images.push(ImageNode::file(image_file_name(map_kd), texture_path));
                        }
                    }
                }

                for poly in &group.polys {
                    for tuple in &poly.0 {
                        let position = data.position.get(tuple.0).ok_or_else(|| {
                            Error::InvalidData(format!(
                                "object {}: position index {} out of range",
                                object.name, tuple.0
                            ))
                        })?;
                        let uv = tuple.1.and_then(|t| data.texture.get(t)).copied();
                        has_uv |= uv.is_some();

                        loops.push(MeshLoop {
                            face_index,
                            vertex_index: tuple.0,
                            position: Point3f::new(position[0], position[1], position[2]),
                            uv,
                        });
                    }
                    face_index += 1;
                }
            }

            debug!(
                "OBJ object {}: {} faces, {} loops, uv layer: {}",
                object.name,
                face_index,
                loops.len(),
                has_uv
            );
            meshes.push(ObjMesh {
                name: object.name.clone(),
                loops,
                has_uv,
                images,
            });
        }

        Ok(meshes)
    }

    /// Container name (the file stem)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meshes(&self) -> &[ObjMesh] {
        &self.meshes
    }
}

/// Image name as a host would show it: the file name of a texture path
fn image_file_name(map: &str) -> String {
    Path::new(map)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(map)
        .to_string()
}

impl SceneGraph for ObjScene {
    fn collect_meshes(&self, root: &str) -> Option<Vec<&dyn MeshSource>> {
        if root == self.name {
            return Some(self.meshes.iter().map(|m| m as &dyn MeshSource).collect());
        }
        self.meshes
            .iter()
            .find(|m| m.name == root)
            .map(|m| vec![m as &dyn MeshSource])
    }
}
