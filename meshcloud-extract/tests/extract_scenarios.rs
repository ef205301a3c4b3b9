//! End-to-end extraction tests
//!
//! These exercise the extractor against in-memory and OBJ scenes and check
//! what lands in the CSV file.

use approx::assert_relative_eq;
use image::{Rgba, RgbaImage};
use meshcloud_core::{Error, Point3f, Vector3f, WorldTransform};
use meshcloud_extract::*;
use meshcloud_io::VertexCsvReader;
use std::fs;
use std::path::PathBuf;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("meshcloud_extract_{}_{}", std::process::id(), name))
}

/// Two triangles sharing an edge: 4 distinct vertices, 6 loops
fn two_triangles(name: &str) -> MemoryMesh {
    MemoryMesh::new(
        name,
        vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(1.0, 1.0, 0.5),
        ],
        vec![vec![0, 1, 2], vec![1, 3, 2]],
    )
    .unwrap()
}

fn loop_uvs() -> Vec<[f32; 2]> {
    vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]
}

/// 2x2 texture: bottom row red/green, top row blue/white
fn quadrant_texture() -> PixelBuffer {
    PixelBuffer::new(
        2,
        2,
        vec![
            1.0, 0.0, 0.0, 1.0, //
            0.0, 1.0, 0.0, 1.0, //
            0.0, 0.0, 1.0, 1.0, //
            1.0, 1.0, 1.0, 1.0,
        ],
    )
    .unwrap()
}

fn config(output_dir: PathBuf, root: &str, textures: &[&str]) -> ExtractConfig {
    ExtractConfig {
        root_object: root.to_string(),
        texture_names: textures.iter().map(|s| s.to_string()).collect(),
        keep_prob: 1.0,
        seed: Some(42),
        sample_colors: true,
        missing_texture: MissingTexturePolicy::SkipObject,
        output_dir,
    }
}

#[test]
fn test_mesh_without_uv_layer_emits_no_rows() {
    let dir = temp_dir("no_uv");
    let scene = MemoryScene::new().with_root(SceneNode::mesh(two_triangles("Cube")));
    let extractor = Extractor::new(config(dir.clone(), "Cube", &["wood"])).unwrap();

    let path = extractor.run(&scene, &ImageNodeResolver::new()).unwrap();
    let table = VertexCsvReader::read_table(&path).unwrap();
    assert_eq!(table.len(), 0);

    let report = extractor.extract(&scene, &ImageNodeResolver::new()).unwrap();
    assert_eq!(report.objects[0].outcome, ObjectOutcome::SkippedNoUv);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_texture_miss_skips_object_by_default() {
    let dir = temp_dir("texture_miss");
    let mesh = two_triangles("Cube")
        .with_uvs(loop_uvs())
        .unwrap()
        .with_image(ImageNode::pixels("bark.png", quadrant_texture()));
    let scene = MemoryScene::new().with_root(SceneNode::mesh(mesh));
    let extractor = Extractor::new(config(dir.clone(), "Cube", &["wood"])).unwrap();

    let report = extractor.extract(&scene, &ImageNodeResolver::new()).unwrap();
    assert!(report.table.is_empty());
    assert_eq!(report.objects[0].outcome, ObjectOutcome::SkippedNoTexture);

    // the file still carries the coloured header and no corrupt rows
    let path = extractor.run(&scene, &ImageNodeResolver::new()).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "object_name,face_index,vert_index,x,y,z,r,g,b\n");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_texture_miss_fails_under_strict_policy() {
    let dir = temp_dir("texture_strict");
    let mesh = two_triangles("Cube").with_uvs(loop_uvs()).unwrap();
    let scene = MemoryScene::new().with_root(SceneNode::mesh(mesh));
    let mut cfg = config(dir.clone(), "Cube", &["wood"]);
    cfg.missing_texture = MissingTexturePolicy::Fail;

    let result = Extractor::new(cfg).unwrap().run(&scene, &ImageNodeResolver::new());
    assert!(matches!(result, Err(Error::TextureNotFound { .. })));
    assert!(!dir.join("vertices.csv").exists());
}

#[test]
fn test_missing_root_writes_nothing() {
    let dir = temp_dir("missing_root");
    let scene = MemoryScene::new().with_root(SceneNode::mesh(two_triangles("Cube")));
    let extractor = Extractor::new(config(dir.clone(), "Sphere", &[])).unwrap();

    let result = extractor.run(&scene, &ImageNodeResolver::new());
    assert!(matches!(result, Err(Error::ObjectNotFound(name)) if name == "Sphere"));
    assert!(!dir.exists());
}

#[test]
fn test_colored_extraction_with_world_transform() {
    let dir = temp_dir("colored");
    let mesh = two_triangles("Cube")
        .with_uvs(loop_uvs())
        .unwrap()
        .with_world_transform(WorldTransform::translation(Vector3f::new(0.0, 0.0, 10.0)))
        .with_image(ImageNode::pixels("Wood.png", quadrant_texture()));
    let scene = MemoryScene::new().with_root(SceneNode::mesh(mesh));
    let extractor = Extractor::new(config(dir.clone(), "Cube", &["wood"])).unwrap();

    let path = extractor.run(&scene, &ImageNodeResolver::exporting_to(&dir)).unwrap();
    let table = VertexCsvReader::read_table(&path).unwrap();

    // one row per loop, shared vertices duplicated
    assert_eq!(table.len(), 6);
    assert_eq!(table.iter().filter(|r| r.vertex_index == 2).count(), 2);
    assert_eq!(table[0].object_name, "Cube");
    assert_relative_eq!(table[4].position, Point3f::new(1.0, 1.0, 10.5));

    assert_eq!(table[0].color, Some([1.0, 0.0, 0.0]));
    assert_eq!(table[1].color, Some([0.0, 1.0, 0.0]));
    assert_eq!(table[2].color, Some([0.0, 0.0, 1.0]));
    assert_eq!(table[4].color, Some([1.0, 1.0, 1.0]));

    // a copy of the texture is exported next to the CSV
    assert!(dir.join("Wood.png").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_container_pairs_textures_positionally() {
    let dir = temp_dir("container");
    let left = two_triangles("Left")
        .with_uvs(loop_uvs())
        .unwrap()
        .with_image(ImageNode::pixels("left.png", PixelBuffer::solid(1, 1, [0.25, 0.0, 0.0, 1.0]).unwrap()));
    let right = two_triangles("Right")
        .with_uvs(loop_uvs())
        .unwrap()
        .with_image(ImageNode::pixels("right.png", PixelBuffer::solid(1, 1, [0.0, 0.0, 0.75, 1.0]).unwrap()));
    let scene = MemoryScene::new().with_root(
        SceneNode::empty("Group")
            .with_child(SceneNode::mesh(left))
            .with_child(SceneNode::mesh(right)),
    );

    let report = Extractor::new(config(dir, "Group", &["LEFT", "right"]))
        .unwrap()
        .extract(&scene, &ImageNodeResolver::new())
        .unwrap();

    assert_eq!(report.table.len(), 12);
    assert!(report.table.iter().take(6).all(|r| r.object_name == "Left" && r.color == Some([0.25, 0.0, 0.0])));
    assert!(report.table.iter().skip(6).all(|r| r.object_name == "Right" && r.color == Some([0.0, 0.0, 0.75])));
}

#[test]
fn test_unpaired_mesh_is_skipped() {
    let mesh = |name: &str| {
        two_triangles(name)
            .with_uvs(loop_uvs())
            .unwrap()
            .with_image(ImageNode::pixels("tex.png", quadrant_texture()))
    };
    let scene = MemoryScene::new().with_root(
        SceneNode::empty("Group")
            .with_child(SceneNode::mesh(mesh("A")))
            .with_child(SceneNode::mesh(mesh("B"))),
    );

    let report = Extractor::new(config(temp_dir("unpaired"), "Group", &["tex"]))
        .unwrap()
        .extract(&scene, &ImageNodeResolver::new())
        .unwrap();

    assert_eq!(report.extracted_objects(), 1);
    assert_eq!(report.objects[1].outcome, ObjectOutcome::SkippedNoTexture);
    assert_eq!(report.table.len(), 6);
}

#[test]
fn test_position_only_extraction() {
    let dir = temp_dir("positions");
    let mesh = two_triangles("Cube").with_uvs(loop_uvs()).unwrap();
    let scene = MemoryScene::new().with_root(SceneNode::mesh(mesh));
    let mut cfg = config(dir.clone(), "Cube", &[]);
    cfg.sample_colors = false;

    let path = Extractor::new(cfg).unwrap().run(&scene, &ImageNodeResolver::new()).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("face_index,vert_index,x,y,z"));
    assert_eq!(lines.next(), Some("0,0,0,0,0"));
    assert_eq!(lines.count(), 5);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_thinning_is_seeded_and_per_loop() {
    let vertices: Vec<Point3f> = (0..101).map(|i| Point3f::new(i as f32, 0.0, 0.0)).collect();
    // a fan of 100 triangles around vertex 0: vertex 0 has 100 loops
    let polygons: Vec<Vec<usize>> = (1..101).map(|i| vec![0, i, (i % 100) + 1]).collect();
    let uvs = vec![[0.5, 0.5]; 300];
    let mesh = MemoryMesh::new("Fan", vertices, polygons)
        .unwrap()
        .with_uvs(uvs)
        .unwrap();
    let scene = MemoryScene::new().with_root(SceneNode::mesh(mesh));

    let mut cfg = config(temp_dir("thinning"), "Fan", &[]);
    cfg.sample_colors = false;
    cfg.keep_prob = 0.5;

    let first = Extractor::new(cfg.clone()).unwrap().extract(&scene, &ImageNodeResolver::new()).unwrap();
    let second = Extractor::new(cfg).unwrap().extract(&scene, &ImageNodeResolver::new()).unwrap();
    assert_eq!(first.table, second.table);

    let kept = first.table.len();
    assert!(kept > 100 && kept < 200, "kept {kept} of 300 loops");

    // the hub vertex is tried once per face, so some but not all of its loops survive
    let hub_rows = first.table.iter().filter(|r| r.vertex_index == 0).count();
    assert!(hub_rows > 0 && hub_rows < 100);
}

#[test]
fn test_obj_scene_with_material_texture() {
    let dir = temp_dir("obj");
    let out = dir.join("output");
    fs::create_dir_all(&dir).unwrap();

    let mut img = RgbaImage::new(2, 1);
    img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    img.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
    img.save(dir.join("Wood.png")).unwrap();

    fs::write(dir.join("scene.mtl"), "newmtl wood\nKd 1 1 1\nmap_Kd Wood.png\n").unwrap();
    fs::write(
        dir.join("scene.obj"),
        "mtllib scene.mtl\n\
         o Cube\n\
         v 0 0 0\nv 1 0 0\nv 0 1 0\n\
         vt 0 0\nvt 1 0\nvt 0 1\n\
         usemtl wood\n\
         f 1/1 2/2 3/3\n",
    )
    .unwrap();

    let scene = ObjScene::load(dir.join("scene.obj")).unwrap();
    let extractor = Extractor::new(config(out.clone(), "scene", &["wood"])).unwrap();
    let path = extractor.run(&scene, &ImageNodeResolver::exporting_to(&out)).unwrap();

    let table = VertexCsvReader::read_table(&path).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table[0].color, Some([1.0, 0.0, 0.0]));
    assert_eq!(table[1].color, Some([0.0, 0.0, 1.0]));
    assert!(out.join("Wood.png").exists());

    let _ = fs::remove_dir_all(&dir);
}
