//! The committed OBJ assets parse cleanly and carry well-formed geometry.
//! Pure CPU: file read, parse, tangent pass, no device.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use cyber_run::data_structures::model::ModelVertex;
use cyber_run::resources::mesh::compute_tangents;
use cyber_run::resources::obj::parse_obj;

fn load_asset(name: &str) -> (Vec<ModelVertex>, Vec<u32>) {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join(name);
    let text = fs::read_to_string(&path).unwrap();
    parse_obj(&text).unwrap()
}

fn sub3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot3(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn len3(v: [f32; 3]) -> f32 {
    dot3(v, v).sqrt()
}

#[test]
fn cube_parses_to_24_corners_and_12_triangles() {
    let (vertices, indices) = load_asset("cube.obj");
    assert_eq!(vertices.len(), 24);
    assert_eq!(indices.len(), 36);
    for vertex in &vertices {
        for coord in vertex.position {
            assert_eq!(coord.abs(), 0.5);
        }
        // Face normals are unit length and axis-aligned.
        assert!((len3(vertex.normal) - 1.0).abs() < 1e-6);
        assert_eq!(
            vertex.normal.iter().filter(|c| c.abs() == 1.0).count(),
            1
        );
    }
}

#[test]
fn asset_triangles_wind_counter_clockwise() {
    for name in ["cube.obj", "sphere.obj"] {
        let (vertices, indices) = load_asset(name);
        for triangle in indices.chunks(3) {
            let a = &vertices[triangle[0] as usize];
            let b = &vertices[triangle[1] as usize];
            let c = &vertices[triangle[2] as usize];
            let winding = cross3(sub3(b.position, a.position), sub3(c.position, a.position));
            // The geometric winding normal agrees with the authored normals,
            // so back-face culling keeps the outside visible.
            assert!(
                dot3(winding, a.normal) > 0.0,
                "{name}: triangle {triangle:?} winds against its normal"
            );
        }
    }
}

#[test]
fn sphere_positions_sit_on_the_radius() {
    let (vertices, indices) = load_asset("sphere.obj");
    assert_eq!(indices.len() % 3, 0);
    for vertex in &vertices {
        assert!((len3(vertex.position) - 0.5).abs() < 1e-4);
        assert!((len3(vertex.normal) - 1.0).abs() < 1e-4);
        // Normals point outward, colinear with the position.
        assert!(dot3(vertex.normal, vertex.position) > 0.49);
    }
}

#[test]
fn referenced_vertices_get_unit_orthogonal_tangents() {
    for name in ["cube.obj", "sphere.obj"] {
        let (mut vertices, indices) = load_asset(name);
        compute_tangents(&mut vertices, &indices);

        let referenced: HashSet<usize> = indices.iter().map(|&i| i as usize).collect();
        for index in referenced {
            let vertex = &vertices[index];
            let length = len3(vertex.tangent);
            assert!(
                (length - 1.0).abs() < 1e-3,
                "{name} vertex {index}: tangent length {length}"
            );
            let alignment = dot3(vertex.tangent, vertex.normal);
            assert!(
                alignment.abs() < 1e-3,
                "{name} vertex {index}: tangent leans into the normal by {alignment}"
            );
        }
    }
}

#[test]
fn indices_stay_in_bounds() {
    for name in ["cube.obj", "sphere.obj"] {
        let (vertices, indices) = load_asset(name);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }
}
