//! spatial-ngin
//!
//! A small engine for hand-tracked mixed-reality scenes. Tracking providers
//! feed anchor events (hands, planes, meshes, images) into an [`flow::App`], whose flows build
//! and animate a scene graph. Every frame the scene emits render commands
//! for whatever surface draws them.
//!
//! High-level modules
//! - `context`: the scene, configuration and frame clock shared by flows
//! - `data_structures`: meshes, transforms and the scene graph arena
//! - `flow`: the flow trait and the frame scheduler
//! - `flows`: target practice, breathing leaves, anchor mirrors, ceiling portal, tile floor
//! - `hand`, `pose`, `gesture`: hand skeletons, pose matching and gesture gates
//! - `pick`, `targets`, `aim`: aim rays, target state and the laser/gun indicator
//! - `resources`: procedural meshes, textures and (with `gpu`) buffer uploads
//! - `render`: render commands and the surface trait
//! - `tracking`: events delivered by the tracking provider
//!

pub mod aim;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod flows;
pub mod gesture;
pub mod hand;
pub mod pick;
pub mod pose;
pub mod render;
pub mod resources;
pub mod targets;
pub mod tracking;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use config::EngineConfig;
pub use flow::{App, Flow, FlowConstructor, Out};
