//! Engine data structures: meshes, transforms and the scene arena.
//!
//! - `mesh` holds validated CPU-side vertex/index buffers and their bounds
//! - `transform` holds node transforms and their composition
//! - `scene_graph` is the node arena that owns hierarchy, meshes and materials

pub mod mesh;
pub mod scene_graph;
pub mod transform;
