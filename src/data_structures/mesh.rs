//! CPU-side mesh data handed to the renderer.
//!
//! A [`Mesh`] is a triangle list: a vertex buffer, a `u32` index buffer and the
//! axis-aligned bounds of its positions. Meshes are validated on construction,
//! so every index a renderer sees is within the vertex buffer.

use cgmath::{ElementWise, Vector3};

use crate::{data_structures::transform::Transform, error::MeshError};

/// Packs four colour channels in R, G, B, A memory order.
pub fn pack_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    u32::from_le_bytes([r, g, b, a])
}

/// Opaque white in the packed layout used by [`Vertex::color`].
pub const WHITE: u32 = 0xFFFF_FFFF;

/// A single vertex as it is laid out in the vertex buffer.
///
/// `color` is only meaningful for meshes with [`VertexFormat::PositionColor`].
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: u32,
}

impl Vertex {
    pub fn new(position: Vector3<f32>) -> Self {
        Self {
            position: position.into(),
            color: 0,
        }
    }

    pub fn with_color(position: Vector3<f32>, color: u32) -> Self {
        Self {
            position: position.into(),
            color,
        }
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position.into()
    }
}

/// Which vertex attributes the renderer should bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    Position,
    PositionColor,
}

/// Axis-aligned bounding box given by its min and max corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Smallest box containing all points, `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vector3<f32>>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |acc, p| Self {
            min: Vector3::new(acc.min.x.min(p.x), acc.min.y.min(p.y), acc.min.z.min(p.z)),
            max: Vector3::new(acc.max.x.max(p.x), acc.max.y.max(p.y), acc.max.z.max(p.z)),
        }))
    }

    pub fn extents(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: Vector3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Vector3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Bounds of the eight transformed corners.
    pub fn transformed(&self, transform: &Transform) -> Aabb {
        let corners = (0..8).map(|i| {
            let pick = Vector3::new(
                if i & 1 == 0 { 0.0 } else { 1.0 },
                if i & 2 == 0 { 0.0 } else { 1.0 },
                if i & 4 == 0 { 0.0 } else { 1.0 },
            );
            let corner = self.min + self.extents().mul_element_wise(pick);
            transform.transform_point(corner)
        });
        // eight corners, never empty
        Self::from_points(corners).unwrap_or(*self)
    }

    pub fn contains(&self, point: Vector3<f32>) -> bool {
        point.x >= self.min.x
            && point.y >= self.min.y
            && point.z >= self.min.z
            && point.x <= self.max.x
            && point.y <= self.max.y
            && point.z <= self.max.z
    }
}

/// A validated triangle-list mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    bounds: Aabb,
    format: VertexFormat,
}

impl Mesh {
    /// Builds a mesh after checking that the indices form whole triangles
    /// within the vertex buffer. Bounds are computed from the positions.
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        format: VertexFormat,
    ) -> Result<Self, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::PartialTriangle(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(MeshError::IndexOutOfBounds {
                index,
                vertex_count: vertices.len(),
            });
        }
        let bounds = Aabb::from_points(vertices.iter().map(Vertex::position))
            .unwrap_or(Aabb::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0)));
        Ok(Self {
            name: name.into(),
            vertices,
            indices,
            bounds,
            format,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn format(&self) -> VertexFormat {
        self.format
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }

    /// Raw vertex buffer contents.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw `u32` index buffer contents.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
