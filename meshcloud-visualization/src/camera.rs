//! Camera utilities for 3D scatter rendering

use meshcloud_core::{Point3f, Vector3f};
use nalgebra::{Matrix4, Perspective3, Point3, Vector3};

/// Distance from the camera to the centre of the unit view cube
const ORBIT_DISTANCE: f32 = 2.6;

/// A perspective camera looking at the normalised view cube
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(
        position: Point3<f32>,
        target: Point3<f32>,
        up: Vector3<f32>,
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Camera orbiting the origin, z up. Angles are in degrees: `elevation`
    /// above the xy plane and `azimuth` around the z axis from +x.
    pub fn orbit(elevation: f32, azimuth: f32, aspect_ratio: f32) -> Self {
        let (el, az) = (elevation.to_radians(), azimuth.to_radians());
        let direction = Vector3f::new(el.cos() * az.cos(), el.cos() * az.sin(), el.sin());
        Self::new(
            Point3f::origin() + direction * ORBIT_DISTANCE,
            Point3f::origin(),
            Vector3::z(),
            std::f32::consts::FRAC_PI_4,
            aspect_ratio,
            0.1,
            10.0,
        )
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let perspective = Perspective3::new(self.aspect_ratio, self.fov, self.near, self.far);
        perspective.into_inner()
    }

    /// Bind the camera to an image size
    pub fn viewport(&self, width: u32, height: u32) -> Viewport {
        Viewport {
            matrix: self.projection_matrix() * self.view_matrix(),
            width: width as f32,
            height: height as f32,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::orbit(30.0, -60.0, 1.0)
    }
}

/// A projected point in pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    /// Normalised device depth; larger is farther
    pub depth: f32,
}

/// Combined view-projection bound to an image size
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    matrix: Matrix4<f32>,
    width: f32,
    height: f32,
}

impl Viewport {
    /// Project a point to pixel coordinates, `None` when it lies behind the camera
    pub fn project(&self, p: &Point3f) -> Option<ScreenPoint> {
        let clip = self.matrix * p.to_homogeneous();
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        Some(ScreenPoint {
            x: (ndc.x + 1.0) * 0.5 * self.width,
            y: (1.0 - ndc.y) * 0.5 * self.height,
            depth: ndc.z,
        })
    }
}
