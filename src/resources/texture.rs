use image::{Rgba, RgbaImage};
use rand::Rng;

use crate::error::MeshError;

/// Warm red noise used as the leaf material's base color.
///
/// Every pixel draws red from `[0.5, 1]`, green from `[0, 0.5]` and blue from
/// `[0, 0.375]`; alpha is opaque.
pub fn red_noise_texture<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    rng: &mut R,
) -> Result<RgbaImage, MeshError> {
    if width == 0 || height == 0 {
        return Err(MeshError::invalid(
            "dimensions",
            format!("texture must not be empty, got {width}x{height}"),
        ));
    }
    let mut texture = RgbaImage::new(width, height);
    for pixel in texture.pixels_mut() {
        let red: f32 = rng.gen_range(0.5..=1.0);
        let green: f32 = rng.gen_range(0.0..=0.5);
        let blue: f32 = rng.gen_range(0.0..=0.375);
        *pixel = Rgba([to_byte(red), to_byte(green), to_byte(blue), u8::MAX]);
    }
    Ok(texture)
}

fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Light stone tile framed by a darker grout line.
///
/// The grout is `size / 16` pixels wide (at least one) on every edge, so
/// neighbouring tiles share a seam twice that width.
pub fn floor_tile_texture(size: u32) -> Result<RgbaImage, MeshError> {
    if size < 4 {
        return Err(MeshError::invalid(
            "size",
            format!("tile texture needs at least 4x4 pixels, got {size}"),
        ));
    }
    let grout = (size / 16).max(1);
    let texture = RgbaImage::from_fn(size, size, |x, y| {
        let edge = x.min(y).min(size - 1 - x).min(size - 1 - y);
        if edge < grout {
            Rgba([96, 92, 88, u8::MAX])
        } else {
            Rgba([214, 208, 196, u8::MAX])
        }
    });
    Ok(texture)
}
