use std::f32::consts::PI;

use cgmath::Vector3;

use crate::{
    data_structures::mesh::{Mesh, Vertex, VertexFormat, WHITE},
    error::{MeshError, ensure_positive, ensure_segments},
};

/// Number of triangles [`build_sphere`] emits for the given band counts.
pub fn sphere_triangle_count(latitude_bands: u32, longitude_bands: u32) -> usize {
    latitude_bands as usize * longitude_bands as usize * 2
}

/// UV sphere centered at the origin with white vertex colors.
///
/// Vertices form a `(latitude_bands + 1) x (longitude_bands + 1)` grid; the
/// seam column is duplicated so every cell is a plain quad.
pub fn build_sphere(radius: f32, latitude_bands: u32, longitude_bands: u32) -> Result<Mesh, MeshError> {
    ensure_positive("radius", radius)?;
    ensure_segments("latitude_bands", latitude_bands)?;
    ensure_segments("longitude_bands", longitude_bands)?;

    let vertex_count = (latitude_bands as usize + 1) * (longitude_bands as usize + 1);
    let mut vertices = Vec::with_capacity(vertex_count);
    for lat in 0..=latitude_bands {
        let theta = lat as f32 * PI / latitude_bands as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();
        for long in 0..=longitude_bands {
            let phi = long as f32 * 2.0 * PI / longitude_bands as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();
            let normal = Vector3::new(cos_phi * sin_theta, cos_theta, sin_phi * sin_theta);
            vertices.push(Vertex::with_color(normal * radius, WHITE));
        }
    }

    let mut indices = Vec::with_capacity(sphere_triangle_count(latitude_bands, longitude_bands) * 3);
    for lat in 0..latitude_bands {
        for long in 0..longitude_bands {
            let first = lat * (longitude_bands + 1) + long;
            let second = first + longitude_bands + 1;
            indices.extend_from_slice(&[first, second, first + 1]);
            indices.extend_from_slice(&[second, second + 1, first + 1]);
        }
    }

    Mesh::new("sphere", vertices, indices, VertexFormat::PositionColor)
}
