//! 2D scatter of projected points

use crate::canvas::{Canvas, BLACK};
use crate::scatter3d::RenderConfig;
use crate::text::{Orientation, TextPainter, LABEL_SIZE, TITLE_SIZE};
use meshcloud_core::{Color3f, Error, Result};
use tracing::info;

/// Blank border around the plot area, in pixels
const MARGIN: f32 = 40.0;
/// Fraction of the data range added on each side
const PADDING: f64 = 0.05;
const TICK_COUNT: usize = 5;
const TICK_LENGTH: f32 = 5.0;

/// A rendered 2D scatter and the text it carries
#[derive(Debug, Clone)]
pub struct Plot2d {
    pub canvas: Canvas,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

/// Plots N×2 points inside an axis frame, with a title above and the
/// component labels beside the axes
#[derive(Debug, Clone)]
pub struct Scatter2d {
    config: RenderConfig,
    text: TextPainter,
}

/// Data limits of one axis, padded and never empty
fn axis_limits(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    let range = hi - lo;
    if range <= f64::EPSILON {
        return (lo - 0.5, hi + 0.5);
    }
    (lo - range * PADDING, hi + range * PADDING)
}

impl Scatter2d {
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            text: TextPainter::new()?,
        })
    }

    /// Render `points`, coloured per point when `colors` is given and colour
    /// is enabled. `labels` name the two components.
    pub fn render(
        &self,
        points: &[[f64; 2]],
        colors: Option<&[Color3f]>,
        labels: &[String; 2],
        title: &str,
    ) -> Result<Plot2d> {
        if let Some(colors) = colors {
            if colors.len() != points.len() {
                return Err(Error::Visualization(format!(
                    "{} points but {} colours",
                    points.len(),
                    colors.len()
                )));
            }
        }

        let (width, height) = (self.config.width as f32, self.config.height as f32);
        if width <= 2.0 * MARGIN || height <= 2.0 * MARGIN {
            return Err(Error::Visualization(format!(
                "image {}x{} is too small for the plot margins",
                self.config.width, self.config.height
            )));
        }

        let mut canvas = Canvas::new(self.config.width, self.config.height, self.config.background)?;
        let (left, right) = (MARGIN, width - MARGIN);
        let (top, bottom) = (MARGIN, height - MARGIN);

        let (x_min, x_max) = axis_limits(points.iter().map(|p| p[0]));
        let (y_min, y_max) = axis_limits(points.iter().map(|p| p[1]));
        let to_screen = |p: &[f64; 2]| {
            let tx = ((p[0] - x_min) / (x_max - x_min)) as f32;
            let ty = ((p[1] - y_min) / (y_max - y_min)) as f32;
            (left + tx * (right - left), bottom - ty * (bottom - top))
        };

        // axis frame and ticks along the bottom and left edges
        canvas.draw_line((left, top), (right, top), BLACK, 1.0);
        canvas.draw_line((right, top), (right, bottom), BLACK, 1.0);
        canvas.draw_line((right, bottom), (left, bottom), BLACK, 1.0);
        canvas.draw_line((left, bottom), (left, top), BLACK, 1.0);
        for i in 0..TICK_COUNT {
            let t = i as f32 / (TICK_COUNT - 1) as f32;
            let x = left + t * (right - left);
            let y = bottom - t * (bottom - top);
            canvas.draw_line((x, bottom), (x, bottom + TICK_LENGTH), BLACK, 1.0);
            canvas.draw_line((left - TICK_LENGTH, y), (left, y), BLACK, 1.0);
        }

        let x_label_y = bottom + TICK_LENGTH + (MARGIN - TICK_LENGTH) / 2.0;
        let y_label_x = (left - TICK_LENGTH) / 2.0;
        let middle = ((left + right) / 2.0, (top + bottom) / 2.0);
        self.text
            .draw_centered(&mut canvas, title, (middle.0, top / 2.0), TITLE_SIZE, BLACK, Orientation::Horizontal);
        self.text.draw_centered(
            &mut canvas,
            &labels[0],
            (middle.0, x_label_y),
            LABEL_SIZE,
            BLACK,
            Orientation::Horizontal,
        );
        self.text.draw_centered(
            &mut canvas,
            &labels[1],
            (y_label_x, middle.1),
            LABEL_SIZE,
            BLACK,
            Orientation::Vertical,
        );

        let use_colors = self.config.color_points;
        for (i, p) in points.iter().enumerate() {
            let color = colors
                .filter(|_| use_colors)
                .map(|c| c[i])
                .unwrap_or(self.config.default_color);
            let (x, y) = to_screen(p);
            canvas.fill_square(x, y, self.config.point_size, color, 1.0);
        }

        info!(
            "{}: {} points, x axis {}, y axis {}",
            title,
            points.len(),
            labels[0],
            labels[1]
        );

        Ok(Plot2d {
            canvas,
            title: title.to_string(),
            x_label: labels[0].clone(),
            y_label: labels[1].clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> [String; 2] {
        ["UMAP-1".to_string(), "UMAP-2".to_string()]
    }

    fn ink_in(plot: &Plot2d, x: std::ops::Range<u32>, y: std::ops::Range<u32>) -> usize {
        plot.canvas
            .image()
            .enumerate_pixels()
            .filter(|(px, py, p)| x.contains(px) && y.contains(py) && p.0 != [255, 255, 255, 255])
            .count()
    }

    #[test]
    fn test_axis_limits() {
        let (lo, hi) = axis_limits([0.0, 10.0].into_iter());
        assert_eq!((lo, hi), (-0.5, 10.5));
        assert_eq!(axis_limits([3.0, 3.0].into_iter()), (2.5, 3.5));
        assert_eq!(axis_limits(std::iter::empty()), (-1.0, 1.0));
    }

    #[test]
    fn test_render_colored_points() {
        let scatter = Scatter2d::new(RenderConfig {
            width: 200,
            height: 200,
            ..RenderConfig::default()
        })
        .unwrap();
        let points = [[0.0, 0.0], [1.0, 1.0]];
        let colors = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let plot = scatter.render(&points, Some(&colors[..]), &labels(), "projection").unwrap();

        assert_eq!(plot.x_label, "UMAP-1");
        let image = plot.canvas.image();
        assert!(image.pixels().any(|p| p.0 == [255, 0, 0, 255]));
        assert!(image.pixels().any(|p| p.0 == [0, 255, 0, 255]));
    }

    #[test]
    fn test_labels_and_title_are_drawn() {
        let scatter = Scatter2d::new(RenderConfig {
            width: 300,
            height: 300,
            ..RenderConfig::default()
        })
        .unwrap();
        let points = [[0.0, 0.0], [1.0, 1.0]];
        let blank = ["".to_string(), "".to_string()];
        let unlabelled = scatter.render(&points, None, &blank, "").unwrap();
        let labelled = scatter.render(&points, None, &labels(), "UMAP 2D Projection").unwrap();

        assert_ne!(labelled.canvas, unlabelled.canvas);
        // title band, x label band under the ticks, y label band left of them
        assert_eq!(ink_in(&unlabelled, 0..300, 0..35), 0);
        assert!(ink_in(&labelled, 0..300, 0..35) > 0);
        assert!(ink_in(&labelled, 60..240, 266..300) > 0);
        assert!(ink_in(&labelled, 0..34, 60..240) > 0);
        assert_eq!(ink_in(&unlabelled, 0..34, 60..240), 0);
    }

    #[test]
    fn test_color_length_mismatch() {
        let scatter = Scatter2d::new(RenderConfig::default()).unwrap();
        let result = scatter.render(&[[0.0, 0.0]], Some(&[][..]), &labels(), "projection");
        assert!(result.is_err());
    }

    #[test]
    fn test_too_small_for_margins() {
        let scatter = Scatter2d::new(RenderConfig {
            width: 50,
            height: 50,
            ..RenderConfig::default()
        })
        .unwrap();
        assert!(scatter.render(&[], None, &labels(), "projection").is_err());
    }
}
