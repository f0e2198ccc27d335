//! Ray picking against spheres.
//!
//! Picking answers "what does the hand point at": an aim [`Ray`] is tested
//! against every target sphere and the hit closest to the ray origin wins.
//! A miss is a normal outcome and is reported as `None`.

use cgmath::{InnerSpace, Vector3};

/// A half-line with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vector3<f32>,
    direction: Vector3<f32>,
}

impl Ray {
    /// Builds a ray, normalizing `direction`. Returns `None` for a zero or
    /// non-finite direction.
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Option<Self> {
        let length = direction.magnitude();
        if !length.is_finite() || length <= f32::EPSILON {
            return None;
        }
        Some(Self {
            origin,
            direction: direction / length,
        })
    }

    pub fn direction(&self) -> Vector3<f32> {
        self.direction
    }

    /// Point at distance `t` along the ray.
    pub fn at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }
}

/// Nearest forward intersection of a ray with a sphere.
///
/// `direction` does not have to be normalized. Returns `None` when the ray
/// misses, when the nearest root lies behind the origin (which includes an
/// origin inside the sphere), or when `direction` is zero.
pub fn intersect_sphere(
    origin: Vector3<f32>,
    direction: Vector3<f32>,
    center: Vector3<f32>,
    radius: f32,
) -> Option<Vector3<f32>> {
    let oc = origin - center;
    let a = direction.dot(direction);
    if a <= f32::EPSILON {
        return None;
    }
    let b = 2.0 * oc.dot(direction);
    let c = oc.dot(oc) - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    if t < 0.0 {
        return None;
    }
    Some(origin + direction * t)
}

/// A sphere hit by [`pick_nearest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereHit {
    /// Position of the sphere in the slice passed to [`pick_nearest`].
    pub index: usize,
    pub point: Vector3<f32>,
    /// Distance from the ray origin to `point`.
    pub distance: f32,
}

/// Closest sphere hit along `ray` among `(center, radius)` pairs.
pub fn pick_nearest<I>(ray: &Ray, spheres: I) -> Option<SphereHit>
where
    I: IntoIterator<Item = (Vector3<f32>, f32)>,
{
    spheres
        .into_iter()
        .enumerate()
        .filter_map(|(index, (center, radius))| {
            let point = intersect_sphere(ray.origin, ray.direction, center, radius)?;
            Some(SphereHit {
                index,
                point,
                distance: (point - ray.origin).magnitude(),
            })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}
