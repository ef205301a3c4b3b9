//! Texture pixel buffers, nearest-pixel sampling and texture resolution

use crate::scene::{ImageNode, ImageSource, MeshSource};
use image::{DynamicImage, Rgba, RgbaImage};
use meshcloud_core::{Color3f, Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// RGBA float pixels stored bottom row first, so row `y` corresponds to `v`
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<f32>,
}

impl PixelBuffer {
    /// Wrap a raw RGBA buffer of `width * height * 4` floats
    pub fn new(width: u32, height: u32, pixels: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidData("texture has zero size".to_string()));
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::InvalidData(format!(
                "texture buffer has {} values, expected {}",
                pixels.len(),
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A buffer filled with one colour
    pub fn solid(width: u32, height: u32, color: [f32; 4]) -> Result<Self> {
        let pixels = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::new(width, height, pixels)
    }

    /// Convert a decoded image; rows are flipped so that `v = 0` is the bottom row
    pub fn from_image(image: &DynamicImage) -> Result<Self> {
        let rgba = image.flipv().to_rgba32f();
        let (width, height) = rgba.dimensions();
        Self::new(width, height, rgba.into_raw())
    }

    /// Back to an 8-bit image in top-down row order
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let row = self.height - 1 - y;
            let i = (row as usize * self.width as usize + x as usize) * 4;
            let channel = |c: usize| (self.pixels[i + c].clamp(0.0, 1.0) * 255.0).round() as u8;
            Rgba([channel(0), channel(1), channel(2), channel(3)])
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Linear index of the first channel of the pixel nearest to `(u, v)`.
    ///
    /// UVs are clamped to `[0, 1]`; `x = floor(u * (W - 1))`,
    /// `y = floor(v * (H - 1))`, index `(y * W + x) * 4`.
    pub fn pixel_index(&self, u: f32, v: f32) -> usize {
        let u = clamp_unit(u);
        let v = clamp_unit(v);
        let x = (u * (self.width - 1) as f32).floor() as usize;
        let y = (v * (self.height - 1) as f32).floor() as usize;
        (y * self.width as usize + x) * 4
    }

    /// RGB of the nearest pixel; no interpolation
    pub fn sample(&self, u: f32, v: f32) -> Color3f {
        let i = self.pixel_index(u, v);
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }
}

fn clamp_unit(t: f32) -> f32 {
    if t.is_nan() {
        0.0
    } else {
        t.clamp(0.0, 1.0)
    }
}

/// Compare an image name, with its extension stripped, against a target
/// texture name, ignoring ASCII case. The target is taken as given, so an
/// exact full-name match also counts.
pub fn image_name_matches(image_name: &str, target: &str) -> bool {
    strip_extension(image_name).eq_ignore_ascii_case(target) || image_name.eq_ignore_ascii_case(target)
}

fn strip_extension(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

/// Named-texture-to-pixel-buffer resolver
pub trait TextureResolver {
    /// Find `texture_name` for `mesh`. `Ok(None)` means the lookup missed.
    fn resolve(&self, mesh: &dyn MeshSource, texture_name: &str) -> Result<Option<PixelBuffer>>;
}

/// Resolves textures by searching a mesh's material image nodes.
///
/// File-backed nodes are re-read from disk on every resolve. When an export
/// directory is set, a PNG copy of every resolved texture is saved there.
#[derive(Debug, Clone, Default)]
pub struct ImageNodeResolver {
    export_dir: Option<PathBuf>,
}

impl ImageNodeResolver {
    /// Resolver that does not export copies
    pub fn new() -> Self {
        Self { export_dir: None }
    }

    /// Resolver that saves a copy of each resolved texture into `dir`
    pub fn exporting_to(dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: Some(dir.into()),
        }
    }

    fn load(node: &ImageNode) -> Result<PixelBuffer> {
        match &node.source {
            ImageSource::File(path) => {
                debug!("Reloading texture {} from {}", node.image_name, path.display());
                let image = image::open(path)?;
                PixelBuffer::from_image(&image)
            }
            ImageSource::Pixels(pixels) => Ok(pixels.clone()),
        }
    }

    fn export(&self, node: &ImageNode, pixels: &PixelBuffer) -> Result<()> {
        let Some(dir) = &self.export_dir else {
            return Ok(());
        };
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.png", strip_extension(&node.image_name)));
        pixels.to_image().save(&path)?;
        info!("Saved texture copy to {}", path.display());
        Ok(())
    }
}

impl TextureResolver for ImageNodeResolver {
    fn resolve(&self, mesh: &dyn MeshSource, texture_name: &str) -> Result<Option<PixelBuffer>> {
        let Some(node) = mesh
            .image_nodes()
            .iter()
            .find(|node| image_name_matches(&node.image_name, texture_name))
        else {
            debug!("No image node named {} on {}", texture_name, mesh.name());
            return Ok(None);
        };

        let pixels = Self::load(node)?;
        self.export(node, &pixels)?;
        Ok(Some(pixels))
    }
}
