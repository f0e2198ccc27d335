//! Engine configuration.
//!
//! Every tunable of the interaction loop lives here instead of in constants.
//! Defaults match values tuned on real hand-tracking hardware; a TOML file only
//! needs to name the fields it changes.

use std::{f32::consts::PI, fs, path::Path};

use anyhow::{Context as _, Result, ensure};
use instant::Duration;
use serde::{Deserialize, Serialize};

use crate::hand::Chirality;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Interval of `Flow::on_tick`.
    pub tick_duration_millis: u64,
    /// Frame interval of `App::run`.
    pub frame_interval_millis: u64,
    /// Seed for every random placement. `None` seeds from the OS.
    pub seed: Option<u64>,
    pub interaction: InteractionConfig,
    pub gesture: GestureConfig,
    pub breathing: BreathingConfig,
    pub portal: PortalConfig,
    pub tile_floor: TileFloorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_duration_millis: 100,
            frame_interval_millis: 8,
            seed: None,
            interaction: InteractionConfig::default(),
            gesture: GestureConfig::default(),
            breathing: BreathingConfig::default(),
            portal: PortalConfig::default(),
            tile_floor: TileFloorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlayVolumeConfig {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Default for PlayVolumeConfig {
    fn default() -> Self {
        Self {
            min: [-1.0, 0.25, -5.0],
            max: [1.0, 1.75, -2.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub target_count: usize,
    pub target_radius: f32,
    /// How long after leaving a target a shot still counts as a hit.
    pub on_target_validity_secs: f32,
    /// Length of the laser when nothing is hit.
    pub default_ray_length: f32,
    /// Downward correction subtracted from the wrist-to-palm direction.
    pub ray_tilt: f32,
    /// Which hand aims.
    pub chirality: Chirality,
    pub play_volume: PlayVolumeConfig,
    pub laser_default_opacity: f32,
    pub laser_flash_opacity: f32,
    pub laser_flash_secs: f32,
    pub gun_scale: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            target_count: 3,
            target_radius: 0.25,
            on_target_validity_secs: 0.1,
            default_ray_length: 10.0,
            ray_tilt: PI * 0.05,
            chirality: Chirality::Right,
            play_volume: PlayVolumeConfig::default(),
            laser_default_opacity: 0.25,
            laser_flash_opacity: 1.0,
            laser_flash_secs: 0.25,
            gun_scale: 0.1,
        }
    }
}

impl InteractionConfig {
    pub fn on_target_validity(&self) -> Duration {
        Duration::from_secs_f32(self.on_target_validity_secs)
    }

    pub fn laser_flash(&self) -> Duration {
        Duration::from_secs_f32(self.laser_flash_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GestureConfig {
    pub ready_threshold: f32,
    pub trigger_threshold: f32,
    pub debounce_secs: f32,
    pub cooldown_secs: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            ready_threshold: 0.95,
            trigger_threshold: 0.9,
            debounce_secs: 0.125,
            cooldown_secs: 0.25,
        }
    }
}

impl GestureConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_secs_f32(self.debounce_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f32(self.cooldown_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BreathingConfig {
    pub leaf_count: usize,
    /// Size of the volume the leaf sphere has to fit in.
    pub bounds: [f32; 3],
    /// Lattice radius as a fraction of `bounds[2]`.
    pub radius_factor: f32,
    /// Leaf height as a fraction of `bounds[1]`.
    pub leaf_height_factor: f32,
    pub amplitude: f32,
    pub period_secs: f32,
    pub spin_speed: f32,
    /// Radians per second around X, Y and Z.
    pub root_spin: [f32; 3],
    pub shuffle: bool,
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            leaf_count: 60,
            bounds: [1.0, 1.0, 1.0],
            radius_factor: 0.45,
            leaf_height_factor: 0.1,
            amplitude: 0.45,
            period_secs: 7.0,
            spin_speed: 0.1,
            root_spin: [0.25, 0.15, 0.1],
            shuffle: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PortalConfig {
    pub detection_secs: f32,
    pub grow_secs: f32,
    pub radius_factor: f32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            detection_secs: 2.0,
            grow_secs: 5.0,
            radius_factor: 0.8,
        }
    }
}

impl PortalConfig {
    pub fn detection(&self) -> Duration {
        Duration::from_secs_f32(self.detection_secs)
    }
}

/// Square floor of `grid_size` x `grid_size` tiles centered under the origin.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TileFloorConfig {
    pub grid_size: usize,
    /// Edge length of one tile in meters.
    pub tile_size: f32,
    /// Pixel size of the generated tile texture.
    pub texture_size: u32,
}

impl Default for TileFloorConfig {
    fn default() -> Self {
        Self {
            grid_size: 16,
            tile_size: 1.0,
            texture_size: 64,
        }
    }
}

fn ensure_unit(name: &str, value: f32) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&value),
        "{name} must be within [0, 1], got {value}"
    );
    Ok(())
}

fn ensure_positive(name: &str, value: f32) -> Result<()> {
    ensure!(
        value.is_finite() && value > 0.0,
        "{name} must be > 0, got {value}"
    );
    Ok(())
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(contents).context("Failed to parse engine config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.tick_duration_millis > 0, "tick_duration_millis must be > 0");
        ensure!(self.frame_interval_millis > 0, "frame_interval_millis must be > 0");

        let i = &self.interaction;
        ensure_positive("interaction.target_radius", i.target_radius)?;
        ensure_positive("interaction.on_target_validity_secs", i.on_target_validity_secs)?;
        ensure_positive("interaction.default_ray_length", i.default_ray_length)?;
        ensure_positive("interaction.laser_flash_secs", i.laser_flash_secs)?;
        ensure_positive("interaction.gun_scale", i.gun_scale)?;
        ensure_unit("interaction.laser_default_opacity", i.laser_default_opacity)?;
        ensure_unit("interaction.laser_flash_opacity", i.laser_flash_opacity)?;
        ensure!(i.ray_tilt.is_finite(), "interaction.ray_tilt must be finite");
        for axis in 0..3 {
            ensure!(
                i.play_volume.min[axis] <= i.play_volume.max[axis],
                "interaction.play_volume is inverted on axis {axis}"
            );
        }

        let g = &self.gesture;
        ensure_unit("gesture.ready_threshold", g.ready_threshold)?;
        ensure_unit("gesture.trigger_threshold", g.trigger_threshold)?;
        ensure_positive("gesture.debounce_secs", g.debounce_secs)?;
        ensure_positive("gesture.cooldown_secs", g.cooldown_secs)?;

        let b = &self.breathing;
        for (name, size) in ["breathing.bounds.x", "breathing.bounds.y", "breathing.bounds.z"]
            .into_iter()
            .zip(b.bounds)
        {
            ensure_positive(name, size)?;
        }
        ensure_positive("breathing.radius_factor", b.radius_factor)?;
        ensure_positive("breathing.leaf_height_factor", b.leaf_height_factor)?;
        ensure_positive("breathing.period_secs", b.period_secs)?;

        let p = &self.portal;
        ensure_positive("portal.detection_secs", p.detection_secs)?;
        ensure_positive("portal.grow_secs", p.grow_secs)?;
        ensure_positive("portal.radius_factor", p.radius_factor)?;

        let t = &self.tile_floor;
        ensure!(t.grid_size > 0, "tile_floor.grid_size must be > 0");
        ensure_positive("tile_floor.tile_size", t.tile_size)?;
        ensure!(
            t.texture_size >= 4,
            "tile_floor.texture_size must be at least 4, got {}",
            t.texture_size
        );
        Ok(())
    }
}
