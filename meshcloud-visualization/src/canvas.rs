//! RGBA raster with alpha blending

use image::{Rgba, RgbaImage};
use meshcloud_core::{Color3f, Error, Result};
use std::fs;
use std::path::Path;

/// matplotlib's default marker colour (#1f77b4)
pub const DEFAULT_MARKER_COLOR: Color3f = [31.0 / 255.0, 119.0 / 255.0, 180.0 / 255.0];

pub const WHITE: Color3f = [1.0, 1.0, 1.0];
pub const BLACK: Color3f = [0.0, 0.0, 0.0];

/// An opaque image that markers and lines are blended onto
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    image: RgbaImage,
}

fn to_byte(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Canvas {
    /// A canvas filled with `background`
    pub fn new(width: u32, height: u32, background: Color3f) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Visualization(format!(
                "canvas size must be non-zero, got {width}x{height}"
            )));
        }
        let fill = Rgba([to_byte(background[0]), to_byte(background[1]), to_byte(background[2]), 255]);
        Ok(Self {
            image: RgbaImage::from_pixel(width, height, fill),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Source-over blend of one pixel; out-of-bounds pixels are ignored
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: Color3f, alpha: f32) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        for (channel, src) in pixel.0.iter_mut().zip(color) {
            let dst = *channel as f32 / 255.0;
            *channel = to_byte(src.clamp(0.0, 1.0) * alpha + dst * (1.0 - alpha));
        }
    }

    /// Square marker of side `size` centred on `(x, y)`
    pub fn fill_square(&mut self, x: f32, y: f32, size: u32, color: Color3f, alpha: f32) {
        let size = size.max(1) as i64;
        let x0 = (x - size as f32 / 2.0).round() as i64;
        let y0 = (y - size as f32 / 2.0).round() as i64;
        for dy in 0..size {
            for dx in 0..size {
                self.blend_pixel(x0 + dx, y0 + dy, color, alpha);
            }
        }
    }

    /// One-pixel line using Bresenham's algorithm
    pub fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), color: Color3f, alpha: f32) {
        let (mut x0, mut y0) = (from.0.round() as i64, from.1.round() as i64);
        let (x1, y1) = (to.0.round() as i64, to.1.round() as i64);

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.blend_pixel(x0, y0, color, alpha);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Save as an image file, creating the parent directory
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        self.image.save(path)?;
        Ok(())
    }
}
