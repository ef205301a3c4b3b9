//! The extraction pipeline

use crate::sampling::RetentionSampler;
use crate::scene::{MeshSource, SceneGraph};
use crate::texture::{PixelBuffer, TextureResolver};
use meshcloud_core::{Error, Result, VertexRecord, VertexTable};
use meshcloud_io::{CsvSchema, OutputLayout, VertexCsvWriter, DEFAULT_OUTPUT_DIR};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// What to do when an object's texture cannot be found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingTexturePolicy {
    /// Emit no rows for the object and carry on
    #[default]
    SkipObject,
    /// Abort the extraction with [`Error::TextureNotFound`]
    Fail,
}

/// Extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Name of the root object; containers expand to their mesh descendants
    pub root_object: String,
    /// Texture name per mesh, paired positionally with the traversal order
    pub texture_names: Vec<String>,
    /// Probability of keeping each (face, loop) pair
    pub keep_prob: f64,
    /// Seed for the retention sampler; entropy-seeded when unset
    pub seed: Option<u64>,
    /// Sample a texture colour per loop and write the coloured schema
    pub sample_colors: bool,
    pub missing_texture: MissingTexturePolicy,
    /// Directory receiving `vertices.csv`
    pub output_dir: PathBuf,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            root_object: "Cube".to_string(),
            texture_names: Vec::new(),
            keep_prob: 1.0,
            seed: None,
            sample_colors: true,
            missing_texture: MissingTexturePolicy::SkipObject,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl ExtractConfig {
    /// Check that the settings are usable
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.keep_prob) {
            return Err(Error::InvalidData(format!(
                "keep_prob must be within [0, 1], got {}",
                self.keep_prob
            )));
        }
        if self.root_object.is_empty() {
            return Err(Error::InvalidData("root object name is empty".to_string()));
        }
        Ok(())
    }

    /// Output locations derived from `output_dir`
    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.output_dir)
    }
}

/// How one mesh object was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectOutcome {
    /// Rows were emitted (possibly zero after thinning). `missing_uv` counts
    /// kept loops without a texture coordinate; they sample the texture
    /// origin.
    Extracted {
        loops: usize,
        rows: usize,
        missing_uv: usize,
    },
    /// The mesh has no UV layer
    SkippedNoUv,
    /// The texture lookup missed under [`MissingTexturePolicy::SkipObject`]
    SkippedNoTexture,
}

/// Per-object record of an extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectReport {
    pub name: String,
    pub outcome: ObjectOutcome,
}

/// Result of [`Extractor::extract`]
#[derive(Debug, Clone, Default)]
pub struct ExtractReport {
    pub table: VertexTable,
    pub objects: Vec<ObjectReport>,
}

impl ExtractReport {
    /// Number of objects that produced rows
    pub fn extracted_objects(&self) -> usize {
        self.objects
            .iter()
            .filter(|o| matches!(o.outcome, ObjectOutcome::Extracted { .. }))
            .count()
    }
}

/// Walks a scene and builds the vertex table
#[derive(Debug, Clone)]
pub struct Extractor {
    config: ExtractConfig,
}

impl Extractor {
    /// Create an extractor from validated settings
    pub fn new(config: ExtractConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Build the vertex table without touching the filesystem.
    ///
    /// Fails with [`Error::ObjectNotFound`] when the root is missing.
    pub fn extract<S, R>(&self, scene: &S, resolver: &R) -> Result<ExtractReport>
    where
        S: SceneGraph + ?Sized,
        R: TextureResolver + ?Sized,
    {
        let root = &self.config.root_object;
        let meshes = scene
            .collect_meshes(root)
            .ok_or_else(|| Error::ObjectNotFound(root.clone()))?;
        info!("Extracting {} mesh objects under {}", meshes.len(), root);

        let mut sampler = RetentionSampler::new(self.config.keep_prob, self.config.seed)?;
        let mut report = ExtractReport::default();

        for (i, mesh) in meshes.into_iter().enumerate() {
            let outcome = self.extract_mesh(i, mesh, resolver, &mut sampler, &mut report.table)?;
            report.objects.push(ObjectReport {
                name: mesh.name().to_string(),
                outcome,
            });
        }

        info!(
            "Extracted {} rows from {} of {} objects",
            report.table.len(),
            report.extracted_objects(),
            report.objects.len()
        );
        Ok(report)
    }

    fn extract_mesh<R>(
        &self,
        position: usize,
        mesh: &dyn MeshSource,
        resolver: &R,
        sampler: &mut RetentionSampler,
        table: &mut VertexTable,
    ) -> Result<ObjectOutcome>
    where
        R: TextureResolver + ?Sized,
    {
        if !mesh.has_uv_layer() {
            debug!("Skipping {}: no UV layer", mesh.name());
            return Ok(ObjectOutcome::SkippedNoUv);
        }

        let texture = if self.config.sample_colors {
            match self.resolve_texture(position, mesh, resolver)? {
                Some(texture) => Some(texture),
                None => return Ok(ObjectOutcome::SkippedNoTexture),
            }
        } else {
            None
        };

        let world = mesh.world_transform();
        let mut loops = 0;
        let mut rows = 0;
        let mut missing_uv = 0;
        for mesh_loop in mesh.loops() {
            loops += 1;
            if !sampler.keep() {
                continue;
            }

            let mut record = VertexRecord::new(
                mesh.name(),
                mesh_loop.face_index,
                mesh_loop.vertex_index,
                world.apply(&mesh_loop.position),
            );
            if let Some(texture) = &texture {
                let [u, v] = mesh_loop.uv.unwrap_or_else(|| {
                    missing_uv += 1;
                    [0.0, 0.0]
                });
                record.color = Some(texture.sample(u, v));
            }
            table.push(record);
            rows += 1;
        }

        if missing_uv > 0 {
            debug!(
                "{}: {} loops have no UV and sample the texture origin",
                mesh.name(),
                missing_uv
            );
        }
        debug!("{}: kept {} of {} loops", mesh.name(), rows, loops);
        Ok(ObjectOutcome::Extracted {
            loops,
            rows,
            missing_uv,
        })
    }

    /// Resolve the texture paired with the mesh at `position`, applying the
    /// missing-texture policy. `Ok(None)` means skip the object.
    fn resolve_texture<R>(
        &self,
        position: usize,
        mesh: &dyn MeshSource,
        resolver: &R,
    ) -> Result<Option<PixelBuffer>>
    where
        R: TextureResolver + ?Sized,
    {
        let name = self.config.texture_names.get(position);
        let texture = match name {
            Some(name) => resolver.resolve(mesh, name)?,
            None => None,
        };
        if texture.is_some() {
            return Ok(texture);
        }

        let wanted = name.cloned().unwrap_or_default();
        match self.config.missing_texture {
            MissingTexturePolicy::Fail => Err(Error::TextureNotFound {
                object: mesh.name().to_string(),
                texture: wanted,
            }),
            MissingTexturePolicy::SkipObject => {
                if name.is_some() {
                    warn!("Texture '{}' not found for {}; skipping object", wanted, mesh.name());
                } else {
                    warn!("No texture name paired with {}; skipping object", mesh.name());
                }
                Ok(None)
            }
        }
    }

    /// Extract and write `vertices.csv`, returning its path.
    ///
    /// Nothing is written when the root object is missing.
    pub fn run<S, R>(&self, scene: &S, resolver: &R) -> Result<PathBuf>
    where
        S: SceneGraph + ?Sized,
        R: TextureResolver + ?Sized,
    {
        let report = self.extract(scene, resolver)?;
        let path = self.config.layout().vertices_csv();

        let schema = if self.config.sample_colors {
            CsvSchema::colored()
        } else {
            CsvSchema::position_only()
        };
        VertexCsvWriter::write_with_schema(&report.table, &path, &schema)?;

        info!("CSV saved: {}", path.display());
        Ok(path)
    }
}
