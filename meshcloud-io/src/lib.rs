//! I/O for meshcloud vertex tables
//!
//! This crate reads and writes the CSV file shared by the extractor and the
//! visualiser, and knows where every output artefact lives on disk.

pub mod vertex_csv;
pub mod layout;
pub mod error;

pub use vertex_csv::*;
pub use layout::*;
pub use error::*;
