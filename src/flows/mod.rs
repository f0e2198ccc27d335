//! Ready-made flows.
//!
//! - `target_practice`: finger-gun shooting at floating spheres
//! - `breathing`: leaves on a sphere lattice that breathe and spin
//! - `anchors`: detected planes mirrored as tinted quads
//! - `portal`: a portal growing in the largest detected ceiling
//! - `reconstruction`: reconstructed room meshes in translucent blue
//! - `image_markers`: a marker sphere on each detected reference image
//! - `tile_floor`: a textured tile floor around the origin

pub mod anchors;
pub mod breathing;
pub mod image_markers;
pub mod portal;
pub mod reconstruction;
pub mod target_practice;
pub mod tile_floor;
