use cgmath::Vector3;

use crate::{
    data_structures::mesh::{Mesh, Vertex, VertexFormat},
    error::{MeshError, ensure_positive},
};

/// A flat quad on the XZ plane centered at the origin, facing +Y.
pub fn build_plane(width: f32, depth: f32) -> Result<Mesh, MeshError> {
    ensure_positive("width", width)?;
    ensure_positive("depth", depth)?;
    let (x, z) = (width / 2.0, depth / 2.0);
    let vertices = vec![
        Vertex::new(Vector3::new(-x, 0.0, -z)),
        Vertex::new(Vector3::new(x, 0.0, -z)),
        Vertex::new(Vector3::new(-x, 0.0, z)),
        Vertex::new(Vector3::new(x, 0.0, z)),
    ];
    // counter-clockwise seen from +Y
    let indices = vec![0, 2, 1, 1, 2, 3];
    Mesh::new("plane", vertices, indices, VertexFormat::Position)
}
