//! Leaf blade mesh.
//!
//! The blade is sampled over `v` (along the spine, bottom to top) and `u`
//! (across the blade). Two surfaces offset by half the depth are stitched
//! together by a strip of side quads along both edges.

use std::f32::consts::PI;

use cgmath::Vector3;

use crate::{
    data_structures::mesh::{Mesh, Vertex, VertexFormat},
    error::{MeshError, ensure_positive, ensure_segments},
};

/// Tessellation and proportions of a leaf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafParams {
    pub width_segments: u32,
    pub height_segments: u32,
    /// Blade width as a fraction of its height.
    pub width_ratio: f32,
    /// Distance between the two surfaces.
    pub depth: f32,
}

impl Default for LeafParams {
    fn default() -> Self {
        Self {
            width_segments: 3,
            height_segments: 12,
            width_ratio: 0.5,
            depth: 0.05,
        }
    }
}

impl LeafParams {
    pub fn vertex_count(&self) -> usize {
        let w = self.width_segments as usize;
        let h = self.height_segments as usize;
        (w + 1) * (h + 1) * 2 + (h + 1) * 4
    }

    pub fn index_count(&self) -> usize {
        let w = self.width_segments as usize;
        let h = self.height_segments as usize;
        w * h * 12 + h * 12
    }
}

/// Silhouette of the blade: rounded top, pointed bottom.
fn curve(v: f32) -> f32 {
    let top_adjust = (1.0 - v).powi(2) * 0.3;
    let bottom_adjust = v.powi(2) * 0.9;
    (v * PI).sin() * (1.0 - top_adjust - bottom_adjust)
}

/// Bow of the spine towards +Z.
fn bow(v: f32) -> f32 {
    (v * PI).sin() * 0.15
}

pub fn build_leaf_mesh(height: f32) -> Result<Mesh, MeshError> {
    build_leaf_mesh_with(height, &LeafParams::default())
}

pub fn build_leaf_mesh_with(height: f32, params: &LeafParams) -> Result<Mesh, MeshError> {
    ensure_positive("height", height)?;
    ensure_segments("width_segments", params.width_segments)?;
    ensure_segments("height_segments", params.height_segments)?;
    ensure_positive("width_ratio", params.width_ratio)?;
    ensure_positive("depth", params.depth)?;

    let width = height * params.width_ratio;
    let w = params.width_segments;
    let h = params.height_segments;
    let half_depth = params.depth / 2.0;

    let mut vertices = Vec::with_capacity(params.vertex_count());
    let mut indices = Vec::with_capacity(params.index_count());

    let point = |u: f32, v: f32, z_offset: f32| {
        let c = curve(v);
        Vector3::new((u - 0.5) * c * width, v * height - height / 2.0, bow(v) + z_offset)
    };

    // front (+depth/2) then back (-depth/2)
    for (surface, z_offset) in [half_depth, -half_depth].into_iter().enumerate() {
        let base = vertices.len() as u32;
        for i in 0..=h {
            let v = i as f32 / h as f32;
            for j in 0..=w {
                let u = j as f32 / w as f32;
                vertices.push(Vertex::new(point(u, v, z_offset)));
            }
        }
        for i in 0..h {
            for j in 0..w {
                let a = base + i * (w + 1) + j;
                let b = a + 1;
                let c = a + w + 1;
                let d = c + 1;
                if surface == 0 {
                    indices.extend_from_slice(&[a, c, b, c, d, b]);
                } else {
                    indices.extend_from_slice(&[a, b, c, c, b, d]);
                }
            }
        }
    }

    // per row: left front, left back, right front, right back
    let side_start = vertices.len() as u32;
    for i in 0..=h {
        let v = i as f32 / h as f32;
        vertices.push(Vertex::new(point(0.0, v, half_depth)));
        vertices.push(Vertex::new(point(0.0, v, -half_depth)));
        vertices.push(Vertex::new(point(1.0, v, half_depth)));
        vertices.push(Vertex::new(point(1.0, v, -half_depth)));
    }
    for i in 0..h {
        let a = side_start + i * 4;
        let b = a + 1;
        let c = a + 4;
        let d = c + 1;
        indices.extend_from_slice(&[a, c, b, b, c, d]);
        indices.extend_from_slice(&[a + 2, b + 2, c + 2, b + 2, d + 2, c + 2]);
    }

    Mesh::new("leaf", vertices, indices, VertexFormat::Position)
}
