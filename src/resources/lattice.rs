use std::f32::consts::PI;

use cgmath::Vector3;

/// Places `count` points on a sphere of `radius` along a golden-angle spiral.
///
/// The order is deterministic; shuffle the result for visual variety.
pub fn place_on_lattice(count: usize, radius: f32) -> Vec<Vector3<f32>> {
    let golden = PI * (1.0 + 5.0_f32.sqrt());
    (0..count)
        .map(|i| {
            let theta = (1.0 - 2.0 * (i as f32 + 1.0) / (count as f32 + 1.0)).acos();
            let phi = i as f32 * golden;
            Vector3::new(
                radius * theta.sin() * phi.cos(),
                radius * theta.sin() * phi.sin(),
                radius * theta.cos(),
            )
        })
        .collect()
}
