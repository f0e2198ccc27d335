//! Node transforms: position, rotation and scale.
//!
//! Transforms compose like scene-graph matrices (`parent * child`) without
//! leaving the decomposed form, so world transforms stay cheap to propagate
//! and easy to hand to the renderer.

use std::ops::Mul;

use cgmath::{
    InnerSpace, Matrix3, Matrix4, One, Quaternion, SquareMatrix, Vector3, Zero,
};

/// Position, rotation (as quaternion) and non-uniform scale of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    /// Identity transform (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_position(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }

    /// Decomposes an affine matrix without shear, such as an anchor pose.
    ///
    /// Zero-length basis columns keep their scale at zero and fall back to the
    /// identity rotation.
    pub fn from_matrix(matrix: &Matrix4<f32>) -> Self {
        let position = matrix.w.truncate();
        let x = matrix.x.truncate();
        let y = matrix.y.truncate();
        let z = matrix.z.truncate();
        let scale = Vector3::new(x.magnitude(), y.magnitude(), z.magnitude());
        if scale.x <= f32::EPSILON || scale.y <= f32::EPSILON || scale.z <= f32::EPSILON {
            return Self {
                position,
                rotation: Quaternion::one(),
                scale,
            };
        }
        let basis = Matrix3::from_cols(x / scale.x, y / scale.y, z / scale.z);
        Self {
            position,
            rotation: Quaternion::from(basis).normalize(),
            scale,
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> TransformRaw {
        let world_matrix = self.to_matrix();
        TransformRaw {
            model: world_matrix.into(),
            normal: Matrix3::from(self.rotation).into(),
            handedness: world_matrix.determinant().signum(),
        }
    }

    pub fn transform_point(&self, point: Vector3<f32>) -> Vector3<f32> {
        let scaled = Vector3::new(
            self.scale.x * point.x,
            self.scale.y * point.y,
            self.scale.z * point.z,
        );
        self.position + self.rotation * scaled
    }

    /// The node's local +Z axis expressed in its parent frame.
    pub fn forward(&self) -> Vector3<f32> {
        (self.rotation * Vector3::unit_z()).normalize()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vector3<f32>> for Transform {
    fn from(position: Vector3<f32>) -> Self {
        Self::from_position(position)
    }
}

impl<'a, 'b> Mul<&'b Transform> for &'a Transform {
    type Output = Transform;

    fn mul(self, rhs: &'b Transform) -> Self::Output {
        let scaled_rhs_pos = Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        Transform {
            position: self.position + (self.rotation * scaled_rhs_pos),
            rotation: self.rotation * rhs.rotation,
            scale: Vector3::new(
                self.scale.x * rhs.scale.x,
                self.scale.y * rhs.scale.y,
                self.scale.z * rhs.scale.z,
            ),
        }
    }
}

impl Mul<Transform> for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Self::Output {
        &self * &rhs
    }
}

/// Rotation whose local +Y axis points along `direction`.
///
/// The basis is built as `x = normalize(up × y)`, `z = x × y`; when `direction`
/// is parallel to +Y the world +X axis stands in for `up × y`.
pub fn rotation_aligning_y(direction: Vector3<f32>) -> Quaternion<f32> {
    if direction.magnitude2() <= f32::EPSILON {
        return Quaternion::one();
    }
    let y_axis = direction.normalize();
    let cross = Vector3::unit_y().cross(y_axis);
    let x_axis = if cross.magnitude2() <= 1e-10 {
        Vector3::unit_x()
    } else {
        cross.normalize()
    };
    let z_axis = x_axis.cross(y_axis);
    Quaternion::from(Matrix3::from_cols(x_axis, y_axis, z_axis)).normalize()
}

/// Transform data as a renderer uploads it per node.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformRaw {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 3]; 3],
    pub handedness: f32,
}
