//! A textured tile floor laid out on the XZ plane.

use anyhow::Context as _;
use cgmath::Vector3;
use image::RgbaImage;
use log::{debug, warn};

use crate::{
    config::TileFloorConfig,
    context::{Context, InitContext},
    data_structures::{
        mesh::{Mesh, WHITE},
        scene_graph::{Material, MeshId, NodeId, TextureId},
    },
    error::SceneError,
    flow::{Flow, FlowConstructor, Out},
    resources::{build_plane, floor_tile_texture},
};

/// Center of the tile in `row`, `column` of a `grid_size` grid of `tile_size`
/// tiles. The grid is centered on the origin at floor height.
pub fn tile_position(row: usize, column: usize, grid_size: usize, tile_size: f32) -> Vector3<f32> {
    let offset = (grid_size as f32 - 1.0) * tile_size / 2.0;
    Vector3::new(
        column as f32 * tile_size - offset,
        0.0,
        row as f32 * tile_size - offset,
    )
}

/// Every tile shares one plane mesh and one texture.
pub struct TileFloor {
    config: TileFloorConfig,
    tile_mesh: Option<Mesh>,
    texture: Option<RgbaImage>,
    root: Option<NodeId>,
    mesh: Option<MeshId>,
    emissive: Option<TextureId>,
    tiles: Vec<NodeId>,
}

impl TileFloor {
    pub fn new(config: &TileFloorConfig) -> anyhow::Result<Self> {
        let tile_mesh =
            build_plane(config.tile_size, config.tile_size).context("Failed to build the tile mesh")?;
        let texture =
            floor_tile_texture(config.texture_size).context("Failed to build the tile texture")?;
        Ok(Self {
            config: config.clone(),
            tile_mesh: Some(tile_mesh),
            texture: Some(texture),
            root: None,
            mesh: None,
            emissive: None,
            tiles: Vec::new(),
        })
    }

    pub fn constructor<S: 'static, E: 'static>() -> FlowConstructor<S, E> {
        let constructor: FlowConstructor<S, E> = Box::new(|init: InitContext| {
            Box::pin(async move {
                let flow: Box<dyn Flow<S, E>> = Box::new(TileFloor::new(&init.config.tile_floor)?);
                anyhow::Ok(flow)
            })
        });
        constructor
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn mesh(&self) -> Option<MeshId> {
        self.mesh
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.emissive
    }

    /// Tiles in row-major order.
    pub fn tiles(&self) -> &[NodeId] {
        &self.tiles
    }

    fn build_scene(&mut self, ctx: &mut Context) -> Result<(), SceneError> {
        let scene = &mut ctx.scene;
        let root = scene.add_node("tile-floor", None)?;
        self.root = Some(root);
        let (Some(mesh), Some(texture)) = (self.tile_mesh.take(), self.texture.take()) else {
            return Ok(());
        };
        let mesh = scene.insert_mesh(mesh);
        let texture = scene.insert_texture(texture);
        self.mesh = Some(mesh);
        self.emissive = Some(texture);
        let material = Material::unlit(WHITE).with_emissive(texture);

        let n = self.config.grid_size;
        for row in 0..n {
            for column in 0..n {
                let tile = scene.add_node(format!("tile-{row}-{column}"), Some(root))?;
                scene.set_mesh(tile, mesh)?;
                scene.set_material(tile, material)?;
                scene.set_position(tile, tile_position(row, column, n, self.config.tile_size))?;
                self.tiles.push(tile);
            }
        }
        debug!("Laid {} floor tiles", self.tiles.len());
        Ok(())
    }
}

impl<S, E> Flow<S, E> for TileFloor {
    fn on_init(&mut self, ctx: &mut Context, _: &mut S) -> Out<S, E> {
        if let Err(e) = self.build_scene(ctx) {
            warn!("Could not lay the tile floor: {}", e);
        }
        Out::Empty
    }

    fn on_update(&mut self, _: &mut Context, _: &mut S, _: instant::Duration) -> Out<S, E> {
        Out::Empty
    }
}
