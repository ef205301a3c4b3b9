//! Core data structures for meshcloud
//!
//! This crate provides the types shared by the extraction and visualisation
//! pipelines: vertex records and tables, point sets, bounding boxes, world
//! transforms and the common error type.

pub mod record;
pub mod table;
pub mod bounds;
pub mod transform;
pub mod error;

pub use record::*;
pub use table::*;
pub use bounds::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4};
