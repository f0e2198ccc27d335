use std::collections::HashSet;

use cgmath::{InnerSpace, Vector3};
use rand::{SeedableRng, rngs::StdRng};
use spatial_ngin::{
    data_structures::mesh::{Mesh, Vertex, VertexFormat, WHITE},
    error::MeshError,
    resources::{
        LeafParams, build_leaf_mesh, build_leaf_mesh_with, build_plane, build_sphere,
        place_on_lattice, red_noise_texture, sphere_triangle_count,
    },
};

use crate::common::test_utils::{EPSILON, assert_near};

mod common;

fn assert_indices_in_range(mesh: &Mesh) {
    let count = mesh.vertex_count() as u32;
    assert!(mesh.indices().iter().all(|&i| i < count));
    assert_eq!(mesh.index_count() % 3, 0);
}

/// Unnormalized face normal, counter-clockwise winding.
fn face_normal(mesh: &Mesh, [a, b, c]: [u32; 3]) -> Vector3<f32> {
    let p = |i: u32| mesh.vertices()[i as usize].position();
    (p(b) - p(a)).cross(p(c) - p(a))
}

#[test]
fn leaf_has_expected_topology() {
    let mesh = build_leaf_mesh(0.1).unwrap();
    let params = LeafParams::default();
    assert_eq!(mesh.vertex_count(), 156);
    assert_eq!(mesh.index_count(), 3 * 12 * 12 + 12 * 12);
    assert_eq!(mesh.vertex_count(), params.vertex_count());
    assert_eq!(mesh.index_count(), params.index_count());
    assert_eq!(mesh.format(), VertexFormat::Position);
    assert_indices_in_range(&mesh);
}

#[test]
fn leaf_topology_follows_parameters() {
    for (w, h) in [(1, 1), (2, 5), (7, 3)] {
        let params = LeafParams {
            width_segments: w,
            height_segments: h,
            ..LeafParams::default()
        };
        for height in [0.01, 1.0, 42.0] {
            let mesh = build_leaf_mesh_with(height, &params).unwrap();
            assert_eq!(mesh.index_count(), (w * h * 12 + h * 12) as usize);
            assert_indices_in_range(&mesh);
        }
    }
}

#[test]
fn leaf_is_centered_vertically_and_has_depth() {
    let mesh = build_leaf_mesh(2.0).unwrap();
    let bounds = mesh.bounds();
    assert_near(bounds.min.y, -1.0, EPSILON);
    assert_near(bounds.max.y, 1.0, EPSILON);
    // two surfaces half a depth on either side of the bowed spine
    assert!(bounds.extents().z >= LeafParams::default().depth - EPSILON);
}

#[test]
fn leaf_rejects_invalid_parameters() {
    assert!(matches!(
        build_leaf_mesh(0.0),
        Err(MeshError::InvalidParameter { name: "height", .. })
    ));
    assert!(build_leaf_mesh(-1.0).is_err());
    assert!(build_leaf_mesh(f32::NAN).is_err());
    let params = LeafParams {
        width_segments: 0,
        ..LeafParams::default()
    };
    assert!(matches!(
        build_leaf_mesh_with(1.0, &params),
        Err(MeshError::InvalidParameter {
            name: "width_segments",
            ..
        })
    ));
}

#[test]
fn leaf_surfaces_are_wound_in_opposite_directions() {
    let params = LeafParams::default();
    let mesh = build_leaf_mesh_with(1.0, &params).unwrap();
    let per_surface = (params.width_segments * params.height_segments * 2) as usize;
    let triangles: Vec<[u32; 3]> = mesh.triangles().collect();
    let (front, rest) = triangles.split_at(per_surface);
    let back = &rest[..per_surface];

    let z_signs = |surface: &[[u32; 3]]| -> Vec<f32> {
        surface
            .iter()
            .map(|&tri| face_normal(&mesh, tri))
            // the pointed ends collapse some triangles to a line
            .filter(|n| n.magnitude() > 1e-7)
            .map(|n| n.z.signum())
            .collect()
    };
    let front = z_signs(front);
    let back = z_signs(back);
    assert!(front.len() > per_surface / 2);
    assert_eq!(front.len(), back.len());
    let front_sign = front[0];
    assert!(front.iter().all(|&s| s == front_sign));
    assert!(back.iter().all(|&s| s == -front_sign));
}

#[test]
fn sphere_triangle_count_matches_bands() {
    let mesh = build_sphere(0.25, 15, 15).unwrap();
    assert_eq!(mesh.triangle_count(), 450);
    assert_eq!(sphere_triangle_count(15, 15), 450);
    for (lat, long) in [(1, 1), (1, 8), (3, 4), (32, 16)] {
        let mesh = build_sphere(1.0, lat, long).unwrap();
        assert_eq!(mesh.triangle_count(), sphere_triangle_count(lat, long));
        assert_indices_in_range(&mesh);
    }
}

#[test]
fn sphere_vertices_lie_on_the_surface() {
    let mesh = build_sphere(0.5, 8, 12).unwrap();
    assert_eq!(mesh.format(), VertexFormat::PositionColor);
    for vertex in mesh.vertices() {
        assert_near(vertex.position().magnitude(), 0.5, EPSILON);
        assert_eq!(vertex.color, WHITE);
    }
    let bounds = mesh.bounds();
    assert_near(bounds.max.y, 0.5, EPSILON);
    assert_near(bounds.min.y, -0.5, EPSILON);
}

#[test]
fn sphere_triangles_all_face_the_same_way() {
    let mesh = build_sphere(1.0, 8, 16).unwrap();
    let facing: Vec<f32> = mesh
        .triangles()
        .filter_map(|tri| {
            let normal = face_normal(&mesh, tri);
            // pole caps have two coincident corners
            if normal.magnitude() < 1e-6 {
                return None;
            }
            let centroid = tri
                .iter()
                .map(|&i| mesh.vertices()[i as usize].position())
                .fold(Vector3::new(0.0, 0.0, 0.0), |acc, p| acc + p)
                / 3.0;
            Some(normal.dot(centroid).signum())
        })
        .collect();
    assert!(facing.len() >= mesh.triangle_count() - 2 * 16);
    let first = facing[0];
    assert!(facing.iter().all(|&s| s == first));
}

#[test]
fn sphere_rejects_invalid_parameters() {
    assert!(build_sphere(0.0, 15, 15).is_err());
    assert!(build_sphere(1.0, 0, 15).is_err());
    assert!(build_sphere(1.0, 15, 0).is_err());
}

#[test]
fn lattice_points_are_on_the_sphere_and_distinct() {
    let radius = 0.45;
    let points = place_on_lattice(60, radius);
    assert_eq!(points.len(), 60);
    for p in points.iter() {
        assert_near(p.magnitude(), radius, EPSILON);
    }
    for (i, a) in points.iter().enumerate() {
        for b in points.iter().skip(i + 1) {
            assert!((*a - *b).magnitude() > 1e-3, "{a:?} and {b:?} coincide");
        }
    }
    assert!(place_on_lattice(0, radius).is_empty());
}

#[test]
fn plane_is_a_flat_quad_facing_up() {
    let mesh = build_plane(2.0, 1.0).unwrap();
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.triangle_count(), 2);
    let bounds = mesh.bounds();
    assert_near(bounds.extents().x, 2.0, EPSILON);
    assert_near(bounds.extents().y, 0.0, EPSILON);
    assert_near(bounds.extents().z, 1.0, EPSILON);

    for [a, b, c] in mesh.triangles() {
        let v = mesh.vertices();
        let (a, b, c) = (
            v[a as usize].position(),
            v[b as usize].position(),
            v[c as usize].position(),
        );
        assert!((b - a).cross(c - a).y > 0.0);
    }
    assert!(build_plane(0.0, 1.0).is_err());
}

#[test]
fn mesh_validation_rejects_bad_indices() {
    let vertices = vec![Vertex::new([0.0, 0.0, 0.0].into()); 3];
    assert_eq!(
        Mesh::new("bad", vertices.clone(), vec![0, 1, 3], VertexFormat::Position),
        Err(MeshError::IndexOutOfBounds {
            index: 3,
            vertex_count: 3
        })
    );
    assert_eq!(
        Mesh::new("bad", vertices, vec![0, 1], VertexFormat::Position),
        Err(MeshError::PartialTriangle(2))
    );
}

#[test]
fn mesh_bytes_match_buffers() {
    let mesh = build_sphere(1.0, 2, 3).unwrap();
    assert_eq!(mesh.vertex_bytes().len(), mesh.vertex_count() * 16);
    assert_eq!(mesh.index_bytes().len(), mesh.index_count() * 4);
}

#[test]
fn noise_texture_stays_in_the_red_range() {
    let mut rng = StdRng::seed_from_u64(3);
    let texture = red_noise_texture(50, 10, &mut rng).unwrap();
    assert_eq!(texture.dimensions(), (50, 10));
    let mut distinct = HashSet::new();
    for pixel in texture.pixels() {
        let [r, g, b, a] = pixel.0;
        assert!(r >= 127, "red {r}");
        assert!(g <= 128, "green {g}");
        assert!(b <= 96, "blue {b}");
        assert_eq!(a, 255);
        distinct.insert(pixel.0);
    }
    assert!(distinct.len() > 1);
    assert!(red_noise_texture(0, 10, &mut rng).is_err());
}
