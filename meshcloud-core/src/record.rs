//! Vertex record types

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with single precision coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with single precision components
pub type Vector3f = Vector3<f32>;

/// An RGB colour with channels in `[0, 1]`
pub type Color3f = [f32; 3];

/// One extracted (face, loop) occurrence of a mesh vertex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    /// Name of the scene object the vertex belongs to
    pub object_name: String,
    /// Index of the polygon within its mesh
    pub face_index: usize,
    /// Index of the vertex within its mesh
    pub vertex_index: usize,
    /// World-space position
    pub position: Point3f,
    /// Colour sampled from the object's texture, if sampling was enabled
    pub color: Option<Color3f>,
}

impl VertexRecord {
    /// Create a record without colour
    pub fn new(
        object_name: impl Into<String>,
        face_index: usize,
        vertex_index: usize,
        position: Point3f,
    ) -> Self {
        Self {
            object_name: object_name.into(),
            face_index,
            vertex_index,
            position,
            color: None,
        }
    }

    /// Attach a sampled colour to the record
    pub fn with_color(mut self, color: Color3f) -> Self {
        self.color = Some(color);
        self
    }

    /// Whether the record carries a colour
    pub fn has_color(&self) -> bool {
        self.color.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = VertexRecord::new("Cube", 2, 7, Point3f::new(1.0, 2.0, 3.0));
        assert_eq!(record.object_name, "Cube");
        assert!(!record.has_color());

        let colored = record.with_color([0.5, 0.25, 1.0]);
        assert_eq!(colored.color, Some([0.5, 0.25, 1.0]));
    }
}
