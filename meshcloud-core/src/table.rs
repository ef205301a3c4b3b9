//! Vertex tables and the point sets split out of them

use crate::error::{Error, Result};
use crate::record::*;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// An ordered table of vertex records, one row per (face, loop) occurrence.
///
/// Vertices shared between faces appear once per incident face; the table
/// never deduplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexTable {
    pub records: Vec<VertexRecord>,
}

impl VertexTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Create a table from a vector of records
    pub fn from_records(records: Vec<VertexRecord>) -> Self {
        Self { records }
    }

    /// Get the number of rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a row
    pub fn push(&mut self, record: VertexRecord) {
        self.records.push(record);
    }

    /// Get an iterator over the rows
    pub fn iter(&self) -> std::slice::Iter<'_, VertexRecord> {
        self.records.iter()
    }

    /// True when the table is non-empty and every row carries a colour
    pub fn is_colored(&self) -> bool {
        !self.records.is_empty() && self.records.iter().all(VertexRecord::has_color)
    }

    /// World-space positions, one per row (the N×3 position matrix)
    pub fn positions(&self) -> Vec<Point3f> {
        self.records.iter().map(|r| r.position).collect()
    }

    /// Row colours (the N×3 colour matrix), `None` unless every row is coloured
    pub fn colors(&self) -> Option<Vec<Color3f>> {
        self.records.iter().map(|r| r.color).collect()
    }

    /// Split the table into a point set, optionally keeping colours.
    ///
    /// Asking for colours from a table without them is an error.
    pub fn to_point_set(&self, with_colors: bool) -> Result<PointSet> {
        let colors = if with_colors {
            let colors = self.colors().ok_or_else(|| {
                Error::InvalidData("vertex table has no r,g,b columns".to_string())
            })?;
            Some(colors)
        } else {
            None
        };

        Ok(PointSet {
            positions: self.positions(),
            colors,
        })
    }
}

impl Index<usize> for VertexTable {
    type Output = VertexRecord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a VertexTable {
    type Item = &'a VertexRecord;
    type IntoIter = std::slice::Iter<'a, VertexRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Extend<VertexRecord> for VertexTable {
    fn extend<I: IntoIterator<Item = VertexRecord>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}

impl FromIterator<VertexRecord> for VertexTable {
    fn from_iter<I: IntoIterator<Item = VertexRecord>>(iter: I) -> Self {
        Self {
            records: Vec::from_iter(iter),
        }
    }
}

/// Positions with optional per-point colours, ready for rendering
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    pub positions: Vec<Point3f>,
    pub colors: Option<Vec<Color3f>>,
}

impl PointSet {
    /// Create an uncoloured point set
    pub fn from_positions(positions: Vec<Point3f>) -> Self {
        Self {
            positions,
            colors: None,
        }
    }

    /// Create a coloured point set; lengths must match
    pub fn with_colors(positions: Vec<Point3f>, colors: Vec<Color3f>) -> Result<Self> {
        if positions.len() != colors.len() {
            return Err(Error::InvalidData(format!(
                "{} positions but {} colors",
                positions.len(),
                colors.len()
            )));
        }
        Ok(Self {
            positions,
            colors: Some(colors),
        })
    }

    /// Get the number of points
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Colour of point `i`, if colours are present
    pub fn color(&self, i: usize) -> Option<Color3f> {
        self.colors.as_ref().and_then(|c| c.get(i).copied())
    }
}
