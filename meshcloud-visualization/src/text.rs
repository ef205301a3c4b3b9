//! Plot titles and axis labels
//!
//! Glyphs come from the proportional font bundled with egui and are
//! rasterised with `ab_glyph` into a coverage mask, which is then blended onto
//! a [`Canvas`], optionally turned a quarter for vertical axis labels.

use crate::canvas::Canvas;
use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};
use egui::FontDefinitions;
use meshcloud_core::{Color3f, Error, Result};
use std::borrow::Cow;

/// egui's default proportional face
const LABEL_FONT: &str = "Ubuntu-Light";

/// Size of titles, in pixels
pub const TITLE_SIZE: f32 = 16.0;
/// Size of axis labels, in pixels
pub const LABEL_SIZE: f32 = 13.0;

/// How text is laid onto the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Horizontal,
    /// Turned a quarter counter-clockwise, reading bottom to top
    Vertical,
}

/// Anti-aliased coverage of a rendered string, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct TextMask {
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<f32>,
}

impl TextMask {
    fn coverage_at(&self, x: u32, y: u32) -> f32 {
        self.coverage[(y * self.width + x) as usize]
    }
}

/// Rasterises strings in one font
#[derive(Debug, Clone)]
pub struct TextPainter {
    font: FontArc,
}

impl TextPainter {
    /// Painter using egui's bundled proportional font
    pub fn new() -> Result<Self> {
        let mut fonts = FontDefinitions::default();
        let data = fonts
            .font_data
            .remove(LABEL_FONT)
            .ok_or_else(|| Error::Visualization(format!("font {LABEL_FONT} is not bundled")))?;
        let font = match data.font {
            Cow::Borrowed(bytes) => FontArc::try_from_slice(bytes),
            Cow::Owned(bytes) => FontArc::try_from_vec(bytes),
        }
        .map_err(|e| Error::Visualization(format!("failed to parse font {LABEL_FONT}: {e}")))?;
        Ok(Self { font })
    }

    /// Coverage mask of `text` at `size` pixels
    pub fn rasterize(&self, text: &str, size: f32) -> TextMask {
        let scaled = self.font.as_scaled(PxScale::from(size));
        let ascent = scaled.ascent();
        let height = (ascent - scaled.descent()).ceil().max(1.0) as u32;

        let mut glyphs = Vec::new();
        let mut caret = 0.0_f32;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(previous) = previous {
                caret += scaled.kern(previous, id);
            }
            glyphs.push(id.with_scale_and_position(size, point(caret, ascent)));
            caret += scaled.h_advance(id);
            previous = Some(id);
        }

        let width = caret.ceil().max(1.0) as u32;
        let mut coverage = vec![0.0_f32; (width * height) as usize];
        for glyph in glyphs {
            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, c| {
                let x = bounds.min.x as i64 + gx as i64;
                let y = bounds.min.y as i64 + gy as i64;
                if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                    let i = (y as u32 * width + x as u32) as usize;
                    coverage[i] = coverage[i].max(c);
                }
            });
        }

        TextMask {
            width,
            height,
            coverage,
        }
    }

    /// Draw `text` centred on `center`
    pub fn draw_centered(
        &self,
        canvas: &mut Canvas,
        text: &str,
        center: (f32, f32),
        size: f32,
        color: Color3f,
        orientation: Orientation,
    ) {
        if text.is_empty() {
            return;
        }
        let mask = self.rasterize(text, size);
        let (w, h) = match orientation {
            Orientation::Horizontal => (mask.width, mask.height),
            Orientation::Vertical => (mask.height, mask.width),
        };
        let left = (center.0 - w as f32 / 2.0).round() as i64;
        let top = (center.1 - h as f32 / 2.0).round() as i64;

        for my in 0..mask.height {
            for mx in 0..mask.width {
                let c = mask.coverage_at(mx, my);
                if c <= 0.0 {
                    continue;
                }
                let (x, y) = match orientation {
                    Orientation::Horizontal => (mx as i64, my as i64),
                    Orientation::Vertical => (my as i64, (mask.width - 1 - mx) as i64),
                };
                canvas.blend_pixel(left + x, top + y, color, c);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, WHITE};

    fn inked(canvas: &Canvas) -> usize {
        canvas.image().pixels().filter(|p| p.0 != [255, 255, 255, 255]).count()
    }

    #[test]
    fn test_wider_text_makes_wider_mask() {
        let painter = TextPainter::new().unwrap();
        let short = painter.rasterize("X", LABEL_SIZE);
        let long = painter.rasterize("UMAP-1", LABEL_SIZE);
        assert!(long.width > short.width);
        assert_eq!(long.height, short.height);
        assert!(long.coverage.iter().any(|&c| c > 0.5));
    }

    #[test]
    fn test_blank_text_leaves_canvas() {
        let painter = TextPainter::new().unwrap();
        let mut canvas = Canvas::new(40, 40, WHITE).unwrap();
        painter.draw_centered(&mut canvas, "", (20.0, 20.0), LABEL_SIZE, BLACK, Orientation::Horizontal);
        painter.draw_centered(&mut canvas, " ", (20.0, 20.0), LABEL_SIZE, BLACK, Orientation::Horizontal);
        assert_eq!(inked(&canvas), 0);
    }

    #[test]
    fn test_vertical_text_is_tall() {
        let painter = TextPainter::new().unwrap();
        let mut canvas = Canvas::new(100, 100, WHITE).unwrap();
        painter.draw_centered(&mut canvas, "UMAP-2", (50.0, 50.0), LABEL_SIZE, BLACK, Orientation::Vertical);

        let (mut min_x, mut max_x, mut min_y, mut max_y) = (u32::MAX, 0, u32::MAX, 0);
        for (x, y, p) in canvas.image().enumerate_pixels() {
            if p.0 != [255, 255, 255, 255] {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }
        assert!(max_y - min_y > max_x - min_x);
    }
}
