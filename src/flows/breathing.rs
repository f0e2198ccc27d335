//! Leaves on a Fibonacci sphere that slowly breathe in and out.
//!
//! Each leaf remembers its lattice position. Every frame the whole sphere is
//! scaled by a cosine "breath", each leaf spins about an axis perpendicular to
//! its spoke and the root keeps tumbling around all three axes.

use std::f32::consts::PI;

use anyhow::Context as _;
use cgmath::{InnerSpace, One, Quaternion, Rad, Rotation3, Vector3, Zero};
use image::RgbaImage;
use instant::Duration;
use log::{debug, warn};
use rand::{Rng, seq::SliceRandom};

use crate::{
    config::BreathingConfig,
    context::{Context, InitContext},
    data_structures::{
        mesh::{Mesh, pack_rgba},
        scene_graph::{Material, NodeId, TextureId},
    },
    error::SceneError,
    flow::{Flow, FlowConstructor, Out},
    resources::{build_leaf_mesh, place_on_lattice, red_noise_texture},
};

const LEAF_OPACITY: f32 = 0.75;

/// A leaf and the lattice position it breathes around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticePoint {
    pub node: NodeId,
    pub initial: Vector3<f32>,
}

/// Breathing scale at time `t` (seconds).
pub fn breath_scale(t: f32, amplitude: f32, period_secs: f32) -> f32 {
    1.0 + amplitude * -(t * 2.0 * PI / period_secs).cos()
}

/// Spin of a leaf at lattice position `initial`: about `normalize(initial × X)`
/// by `t * spin_speed * scale * 0.5`. Leaves on the X axis do not spin.
pub fn leaf_rotation(initial: Vector3<f32>, t: f32, spin_speed: f32, scale: f32) -> Quaternion<f32> {
    let axis = initial.cross(Vector3::unit_x());
    if axis.magnitude2() <= f32::EPSILON {
        return Quaternion::one();
    }
    Quaternion::from_axis_angle(axis.normalize(), Rad(t * spin_speed * scale * 0.5))
}

pub struct BreathingLeaves {
    config: BreathingConfig,
    positions: Vec<Vector3<f32>>,
    leaf_mesh: Option<Mesh>,
    texture: Option<RgbaImage>,
    emissive: Option<TextureId>,
    root: Option<NodeId>,
    leaves: Vec<LatticePoint>,
    time: f32,
    root_angles: Vector3<f32>,
}

impl BreathingLeaves {
    pub fn new<R: Rng + ?Sized>(config: &BreathingConfig, rng: &mut R) -> anyhow::Result<Self> {
        let leaf_height = config.bounds[1] * config.leaf_height_factor;
        let leaf_mesh = build_leaf_mesh(leaf_height).context("Failed to build the leaf mesh")?;
        let texture = red_noise_texture(50, 10, rng).context("Failed to build the leaf texture")?;
        let mut positions = place_on_lattice(config.leaf_count, config.bounds[2] * config.radius_factor);
        if config.shuffle {
            positions.shuffle(rng);
        }
        Ok(Self {
            config: config.clone(),
            positions,
            leaf_mesh: Some(leaf_mesh),
            texture: Some(texture),
            emissive: None,
            root: None,
            leaves: Vec::new(),
            time: 0.0,
            root_angles: Vector3::zero(),
        })
    }

    pub fn constructor<S: 'static, E: 'static>() -> FlowConstructor<S, E> {
        let constructor: FlowConstructor<S, E> = Box::new(|init: InitContext| {
            Box::pin(async move {
                let mut rng = init.rng();
                let flow: Box<dyn Flow<S, E>> =
                    Box::new(BreathingLeaves::new(&init.config.breathing, &mut rng)?);
                anyhow::Ok(flow)
            })
        });
        constructor
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn leaves(&self) -> &[LatticePoint] {
        &self.leaves
    }

    /// Emissive noise texture of the leaf material, once the scene is built.
    pub fn emissive(&self) -> Option<TextureId> {
        self.emissive
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    fn build_scene(&mut self, ctx: &mut Context) -> Result<(), SceneError> {
        let scene = &mut ctx.scene;
        let root = scene.add_node("breathing-leaves", None)?;
        self.root = Some(root);
        let Some(mesh) = self.leaf_mesh.take() else {
            return Ok(());
        };
        let mesh = scene.insert_mesh(mesh);
        let mut material = Material::lit(pack_rgba(255, 0, 0, 255));
        if let Some(texture) = self.texture.take() {
            let texture = scene.insert_texture(texture);
            self.emissive = Some(texture);
            material = material.with_emissive(texture);
        }
        let z_scale = self.config.bounds[1] * self.config.leaf_height_factor;
        for (i, &initial) in self.positions.iter().enumerate() {
            let node = scene.add_node(format!("leaf-{i}"), Some(root))?;
            scene.set_mesh(node, mesh)?;
            scene.set_material(node, material)?;
            scene.set_opacity(node, LEAF_OPACITY)?;
            scene.set_position(node, initial)?;
            scene.set_scale(node, Vector3::new(1.0, 1.0, z_scale))?;
            self.leaves.push(LatticePoint { node, initial });
        }
        debug!("Placed {} leaves", self.leaves.len());
        Ok(())
    }

    fn animate(&mut self, ctx: &mut Context, dt: Duration) -> Result<(), SceneError> {
        let dt = dt.as_secs_f32();
        self.time += dt;
        let c = &self.config;
        let scale = breath_scale(self.time, c.amplitude, c.period_secs);
        for leaf in self.leaves.iter() {
            ctx.scene.set_position(leaf.node, leaf.initial * scale)?;
            ctx.scene.set_rotation(
                leaf.node,
                leaf_rotation(leaf.initial, self.time, c.spin_speed, scale),
            )?;
        }

        self.root_angles += Vector3::from(c.root_spin) * dt;
        let rotation = Quaternion::from_angle_x(Rad(self.root_angles.x))
            * Quaternion::from_angle_y(Rad(self.root_angles.y))
            * Quaternion::from_angle_z(Rad(self.root_angles.z));
        if let Some(root) = self.root {
            ctx.scene.set_rotation(root, rotation)?;
        }
        Ok(())
    }
}

impl<S, E> Flow<S, E> for BreathingLeaves {
    fn on_init(&mut self, ctx: &mut Context, _: &mut S) -> Out<S, E> {
        if let Err(e) = self.build_scene(ctx) {
            warn!("Could not build the breathing leaves: {}", e);
        }
        Out::Empty
    }

    fn on_update(&mut self, ctx: &mut Context, _: &mut S, dt: Duration) -> Out<S, E> {
        if let Err(e) = self.animate(ctx, dt) {
            warn!("Breathing animation skipped a frame: {}", e);
        }
        Out::Empty
    }
}
