//! The aim indicator: a laser beam from the wrist and a gun model on the hand.

use std::f32::consts::FRAC_PI_2;

use cgmath::{InnerSpace, Quaternion, Rad, Rotation3, Vector3};
use instant::{Duration, Instant};

use crate::{
    config::InteractionConfig,
    data_structures::transform::{Transform, rotation_aligning_y},
};

/// Transform of a unit-height, Y-aligned beam stretched from `start` to `end`.
pub fn laser_transform(start: Vector3<f32>, end: Vector3<f32>) -> Transform {
    let direction = end - start;
    Transform {
        position: (start + end) / 2.0,
        rotation: rotation_aligning_y(direction),
        scale: Vector3::new(1.0, direction.magnitude(), 1.0),
    }
}

/// Transform of the gun model held at `start` and pointing at `end`.
pub fn gun_transform(start: Vector3<f32>, end: Vector3<f32>, scale: f32) -> Transform {
    let align = rotation_aligning_y(end - start);
    let roll = Quaternion::from_axis_angle(Vector3::unit_z(), Rad(FRAC_PI_2));
    let pitch = Quaternion::from_axis_angle(Vector3::unit_x(), Rad(-FRAC_PI_2));
    Transform {
        position: start,
        rotation: align * roll * pitch,
        scale: Vector3::new(scale, scale, scale),
    }
}

/// Visibility and flash state of the laser.
#[derive(Debug, Clone)]
pub struct AimIndicator {
    pub default_opacity: f32,
    pub flash_opacity: f32,
    pub flash_duration: Duration,
    pub gun_scale: f32,
    visible: bool,
    flash_until: Option<Instant>,
}

impl AimIndicator {
    pub fn new(config: &InteractionConfig) -> Self {
        Self {
            default_opacity: config.laser_default_opacity,
            flash_opacity: config.laser_flash_opacity,
            flash_duration: config.laser_flash(),
            gun_scale: config.gun_scale,
            visible: false,
            flash_until: None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_flashing(&self) -> bool {
        self.flash_until.is_some()
    }

    pub fn flash(&mut self, now: Instant) {
        self.flash_until = Some(now + self.flash_duration);
    }

    /// Ends an expired flash.
    pub fn tick(&mut self, now: Instant) {
        if self.flash_until.is_some_and(|until| now >= until) {
            self.flash_until = None;
        }
    }

    /// Laser opacity to render this frame.
    pub fn opacity(&self) -> f32 {
        match (self.visible, self.flash_until.is_some()) {
            (false, _) => 0.0,
            (true, true) => self.flash_opacity,
            (true, false) => self.default_opacity,
        }
    }

    pub fn laser(&self, start: Vector3<f32>, end: Vector3<f32>) -> Transform {
        laser_transform(start, end)
    }

    pub fn gun(&self, start: Vector3<f32>, end: Vector3<f32>) -> Transform {
        gun_transform(start, end, self.gun_scale)
    }
}
