//! Object-to-world transforms

use crate::record::Point3f;
use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// The world matrix of a scene object, applied to local vertex coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldTransform {
    pub matrix: Matrix4<f32>,
}

impl WorldTransform {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&translation),
        }
    }

    /// Create a uniform scaling transformation
    pub fn uniform_scaling(scale: f32) -> Self {
        Self {
            matrix: Matrix4::new_scaling(scale),
        }
    }

    /// Build a location/rotation/scale transform the way scene objects store it
    pub fn from_location_rotation_scale(
        location: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        let matrix = Matrix4::new_translation(&location)
            * rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&scale);
        Self { matrix }
    }

    /// Map a local-space point into world space
    pub fn apply(&self, point: &Point3f) -> Point3f {
        self.matrix.transform_point(point)
    }

    /// Parent-then-child composition: `parent.then(child)` maps child-local to world
    pub fn then(self, child: Self) -> Self {
        Self {
            matrix: self.matrix * child.matrix,
        }
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Matrix4<f32>> for WorldTransform {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }
}
