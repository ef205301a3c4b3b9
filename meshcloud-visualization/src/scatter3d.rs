//! Static 3D scatter rendering

use crate::camera::{Camera, Viewport};
use crate::canvas::{Canvas, BLACK, DEFAULT_MARKER_COLOR, WHITE};
use crate::text::{Orientation, TextPainter, LABEL_SIZE, TITLE_SIZE};
use crate::view_box::ViewBox;
use meshcloud_core::{Bounded, Color3f, Error, Point3f, PointSet, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Shared settings of the 3D and 2D renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Draw the box wireframe, axes, ticks, axis labels and the title
    pub verbose: bool,
    /// Use per-point colours when the data has them
    pub color_points: bool,
    /// Divides the view box half-range; values below 1 zoom out
    pub zoom: f32,
    /// Marker side in pixels
    pub point_size: u32,
    pub width: u32,
    pub height: u32,
    /// Camera elevation in degrees
    pub elevation: f32,
    /// Camera azimuth in degrees
    pub azimuth: f32,
    pub background: Color3f,
    /// Marker colour when per-point colours are off or absent
    pub default_color: Color3f,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            color_points: true,
            zoom: 0.5,
            point_size: 2,
            width: 600,
            height: 600,
            elevation: 30.0,
            azimuth: -60.0,
            background: WHITE,
            default_color: DEFAULT_MARKER_COLOR,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Visualization(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return Err(Error::Visualization(format!("zoom must be positive, got {}", self.zoom)));
        }
        Ok(())
    }

    /// Colour of point `i`
    pub fn point_color(&self, points: &PointSet, i: usize) -> Color3f {
        if self.color_points {
            points.color(i).unwrap_or(self.default_color)
        } else {
            self.default_color
        }
    }
}

/// A point to draw with its colour and opacity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub position: Point3f,
    pub color: Color3f,
    pub alpha: f32,
}

const AXIS_COLORS: [Color3f; 3] = [[0.85, 0.1, 0.1], [0.1, 0.6, 0.1], [0.1, 0.2, 0.85]];
const FRAME_COLOR: Color3f = [0.6, 0.6, 0.6];
const TICK_COUNT: usize = 5;
/// Tick length in normalised view units
const TICK_LENGTH: f32 = 0.03;
/// Axis labels sit this far outside the box, in normalised view units
const LABEL_OFFSET: f32 = 0.15;
const AXIS_NAMES: [&str; 3] = ["X", "Y", "Z"];
const TITLE: &str = "3D points";

/// Renders markers inside a [`ViewBox`] seen through an orbit camera
#[derive(Debug, Clone)]
pub struct Scatter3d {
    config: RenderConfig,
    view: ViewBox,
    viewport: Viewport,
    text: TextPainter,
}

impl Scatter3d {
    /// Create a renderer for an explicit view box
    pub fn new(config: RenderConfig, view: ViewBox) -> Result<Self> {
        config.validate()?;
        let camera = Camera::orbit(
            config.elevation,
            config.azimuth,
            config.width as f32 / config.height as f32,
        );
        let viewport = camera.viewport(config.width, config.height);
        Ok(Self {
            config,
            view,
            viewport,
            text: TextPainter::new()?,
        })
    }

    /// Create a renderer whose view box fits `points` with equal aspect
    pub fn for_points(config: RenderConfig, points: &PointSet) -> Result<Self> {
        let view = ViewBox::equal_aspect(&points.bounding_box(), config.zoom)?;
        Self::new(config, view)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn view(&self) -> &ViewBox {
        &self.view
    }

    /// Opaque markers for every point
    pub fn markers(&self, points: &PointSet) -> Vec<Marker> {
        points
            .positions
            .iter()
            .enumerate()
            .map(|(i, p)| Marker {
                position: *p,
                color: self.config.point_color(points, i),
                alpha: 1.0,
            })
            .collect()
    }

    /// Draw markers far to near onto a fresh canvas
    pub fn draw(&self, markers: &[Marker]) -> Result<Canvas> {
        let mut canvas = Canvas::new(self.config.width, self.config.height, self.config.background)?;
        if self.config.verbose {
            self.draw_frame(&mut canvas);
            self.draw_labels(&mut canvas);
        }

        let mut projected: Vec<_> = markers
            .iter()
            .filter_map(|m| {
                self.viewport
                    .project(&self.view.normalize(&m.position))
                    .map(|s| (s, m))
            })
            .collect();
        projected.sort_by(|a, b| b.0.depth.total_cmp(&a.0.depth));

        for (screen, marker) in &projected {
            canvas.fill_square(screen.x, screen.y, self.config.point_size, marker.color, marker.alpha);
        }

        debug!("Drew {} of {} markers", projected.len(), markers.len());
        Ok(canvas)
    }

    /// Static render of a point set
    pub fn render(&self, points: &PointSet) -> Result<Canvas> {
        if self.config.verbose {
            info!("{}", TITLE);
        }
        self.draw(&self.markers(points))
    }

    fn line(&self, canvas: &mut Canvas, a: &Point3f, b: &Point3f, color: Color3f) {
        if let (Some(a), Some(b)) = (self.viewport.project(a), self.viewport.project(b)) {
            canvas.draw_line((a.x, a.y), (b.x, b.y), color, 1.0);
        }
    }

    /// Box wireframe, the three axes from the minimum corner and their ticks
    fn draw_frame(&self, canvas: &mut Canvas) {
        let corners = ViewBox::unit_corners();
        for (a, b) in ViewBox::unit_edges() {
            self.line(canvas, &corners[a], &corners[b], FRAME_COLOR);
        }

        let origin = corners[0];
        for axis in 0..3 {
            let mut end = origin;
            end[axis] = 0.5;
            self.line(canvas, &origin, &end, AXIS_COLORS[axis]);

            // ticks point away from the box along the next axis
            let across = (axis + 1) % 3;
            for tick in self.view.ticks(axis, TICK_COUNT) {
                let mut data = self.view.min;
                data[axis] = tick;
                let start = self.view.normalize(&data);
                let mut stop = start;
                stop[across] -= TICK_LENGTH;
                self.line(canvas, &start, &stop, AXIS_COLORS[axis]);
            }
        }
    }

    /// Axis names beside the middle of each axis, and the title
    fn draw_labels(&self, canvas: &mut Canvas) {
        let origin = ViewBox::unit_corners()[0];
        for axis in 0..3 {
            let across = (axis + 1) % 3;
            let mut anchor = origin;
            anchor[axis] = 0.0;
            anchor[across] -= LABEL_OFFSET;
            if let Some(screen) = self.viewport.project(&anchor) {
                self.text.draw_centered(
                    canvas,
                    AXIS_NAMES[axis],
                    (screen.x, screen.y),
                    LABEL_SIZE,
                    AXIS_COLORS[axis],
                    Orientation::Horizontal,
                );
            }
        }

        let center = (self.config.width as f32 / 2.0, TITLE_SIZE);
        self.text
            .draw_centered(canvas, TITLE, center, TITLE_SIZE, BLACK, Orientation::Horizontal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud() -> PointSet {
        PointSet::from_positions(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 1.0),
        ])
    }

    fn non_background(canvas: &Canvas) -> usize {
        canvas.image().pixels().filter(|p| p.0 != [255, 255, 255, 255]).count()
    }

    #[test]
    fn test_default_render_config() {
        let config = RenderConfig::default();
        assert_eq!(config.zoom, 0.5);
        assert!(config.color_points);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_render_draws_markers() {
        let scatter = Scatter3d::for_points(RenderConfig::default(), &cloud()).unwrap();
        let canvas = scatter.render(&cloud()).unwrap();
        assert_eq!(canvas.width(), 600);
        let drawn = non_background(&canvas);
        assert!(drawn > 0 && drawn <= 3 * 4, "drew {drawn} pixels");
    }

    #[test]
    fn test_verbose_adds_frame() {
        let quiet = Scatter3d::for_points(RenderConfig::default(), &cloud()).unwrap();
        let verbose_config = RenderConfig {
            verbose: true,
            ..RenderConfig::default()
        };
        let verbose = Scatter3d::for_points(verbose_config, &cloud()).unwrap();

        let empty = PointSet::default();
        assert_eq!(non_background(&quiet.render(&empty).unwrap()), 0);
        assert!(non_background(&verbose.render(&empty).unwrap()) > 100);
    }

    #[test]
    fn test_verbose_draws_text() {
        let config = RenderConfig {
            verbose: true,
            ..RenderConfig::default()
        };
        let scatter = Scatter3d::for_points(config, &cloud()).unwrap();

        let mut unlabelled = Canvas::new(600, 600, WHITE).unwrap();
        scatter.draw_frame(&mut unlabelled);
        let mut labelled = unlabelled.clone();
        scatter.draw_labels(&mut labelled);

        assert_ne!(labelled, unlabelled);
        assert!(non_background(&labelled) > non_background(&unlabelled));
        // the title sits in the top rows, above the box
        let title_ink = labelled
            .image()
            .enumerate_pixels()
            .filter(|(_, y, p)| *y < 2 * TITLE_SIZE as u32 && p.0 != [255, 255, 255, 255])
            .count();
        assert!(title_ink > 0);
    }

    #[test]
    fn test_point_colors() {
        let colored = PointSet::with_colors(cloud().positions, vec![[1.0, 0.0, 0.0]; 3]).unwrap();
        let config = RenderConfig::default();
        assert_eq!(config.point_color(&colored, 1), [1.0, 0.0, 0.0]);
        assert_eq!(config.point_color(&cloud(), 1), DEFAULT_MARKER_COLOR);

        let plain = RenderConfig {
            color_points: false,
            ..RenderConfig::default()
        };
        assert_eq!(plain.point_color(&colored, 1), DEFAULT_MARKER_COLOR);
    }

    #[test]
    fn test_near_markers_drawn_last() {
        let config = RenderConfig {
            point_size: 9,
            ..RenderConfig::default()
        };
        let view = ViewBox {
            min: Point3f::new(-0.5, -0.5, -0.5),
            max: Point3f::new(0.5, 0.5, 0.5),
        };
        let scatter = Scatter3d::new(config, view).unwrap();
        let camera = Camera::orbit(30.0, -60.0, 1.0);
        let toward = Point3f::from(camera.position.coords.normalize() * 0.2);

        // near red listed first, far blue second; red must win the overlap
        let markers = [
            Marker { position: toward, color: [1.0, 0.0, 0.0], alpha: 1.0 },
            Marker { position: Point3f::from(-toward.coords), color: [0.0, 0.0, 1.0], alpha: 1.0 },
        ];
        let canvas = scatter.draw(&markers).unwrap();
        assert_eq!(canvas.image().get_pixel(300, 300).0, [255, 0, 0, 255]);
    }
}
