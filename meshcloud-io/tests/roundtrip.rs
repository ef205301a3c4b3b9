//! Round-trip tests for the vertex table CSV format

use approx::assert_relative_eq;
use meshcloud_core::{Point3f, VertexRecord, VertexTable};
use meshcloud_io::{OutputLayout, VertexCsvReader, VertexCsvWriter};
use std::fs;
use std::path::PathBuf;

fn temp_root(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("meshcloud_roundtrip_{}_{}", std::process::id(), name))
}

/// A table with a shared vertex appearing once per incident face
fn two_triangle_table(colored: bool) -> VertexTable {
    let corners = [
        Point3f::new(0.0, 0.0, 0.0),
        Point3f::new(1.25, 0.0, -0.5),
        Point3f::new(0.0, 1.0, 3.75),
        Point3f::new(1.0, 1.0, 1e-3),
    ];
    let faces = [[0usize, 1, 2], [1, 3, 2]];

    let mut table = VertexTable::new();
    for (face_index, face) in faces.iter().enumerate() {
        for &v in face {
            let record = VertexRecord::new("Plane, left", face_index, v, corners[v]);
            table.push(if colored {
                record.with_color([v as f32 / 3.0, 0.5, 1.0 - v as f32 / 3.0])
            } else {
                record
            });
        }
    }
    table
}

#[test]
fn test_colored_roundtrip() {
    let root = temp_root("colored");
    let layout = OutputLayout::new(&root);
    let table = two_triangle_table(true);

    VertexCsvWriter::write(&table, layout.vertices_csv()).unwrap();
    let loaded = VertexCsvReader::read_table(layout.vertices_csv()).unwrap();

    assert_eq!(loaded.len(), table.len());
    for (original, loaded) in table.iter().zip(loaded.iter()) {
        assert_eq!(original.object_name, loaded.object_name);
        assert_eq!(original.face_index, loaded.face_index);
        assert_eq!(original.vertex_index, loaded.vertex_index);
        assert_relative_eq!(original.position, loaded.position, epsilon = 1e-6);

        let (a, b) = (original.color.unwrap(), loaded.color.unwrap());
        for c in 0..3 {
            assert_relative_eq!(a[c], b[c], epsilon = 1e-6);
        }
    }

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn test_position_only_roundtrip() {
    let root = temp_root("plain");
    let layout = OutputLayout::new(&root);
    let table = two_triangle_table(false);

    VertexCsvWriter::write(&table, layout.vertices_csv()).unwrap();

    let content = fs::read_to_string(layout.vertices_csv()).unwrap();
    assert!(content.starts_with("face_index,vert_index,x,y,z\n"));
    assert_eq!(content.lines().count(), 1 + 6);

    let points = VertexCsvReader::read_points(layout.vertices_csv(), false).unwrap();
    assert_eq!(points.len(), 6);
    assert!(points.colors.is_none());
    for (original, loaded) in table.positions().iter().zip(points.positions.iter()) {
        assert_relative_eq!(*original, *loaded, epsilon = 1e-6);
    }

    // colours cannot be split out of a position-only file
    assert!(VertexCsvReader::read_points(layout.vertices_csv(), true).is_err());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn test_read_points_with_colors() {
    let root = temp_root("points");
    let layout = OutputLayout::new(&root);
    VertexCsvWriter::write(&two_triangle_table(true), layout.vertices_csv()).unwrap();

    let points = VertexCsvReader::read_points(layout.vertices_csv(), true).unwrap();
    let colors = points.colors.as_ref().unwrap();
    assert_eq!(colors.len(), points.positions.len());
    assert_relative_eq!(colors[0][1], 0.5);

    let _ = fs::remove_dir_all(&root);
}
