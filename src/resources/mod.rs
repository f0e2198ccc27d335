//! Procedural resources: meshes, point layouts and textures generated in code.
//!
//! All generators are pure. They validate their parameters first and either
//! return a complete [`Mesh`](crate::data_structures::mesh::Mesh) or an error.

#[cfg(feature = "gpu")]
pub mod gpu;
pub mod lattice;
pub mod leaf;
pub mod plane;
pub mod sphere;
pub mod texture;

pub use lattice::place_on_lattice;
pub use leaf::{LeafParams, build_leaf_mesh, build_leaf_mesh_with};
pub use plane::build_plane;
pub use sphere::{build_sphere, sphere_triangle_count};
pub use texture::{floor_tile_texture, red_noise_texture};
