/// 3D transformation matrices and rotation state
use std::f32::consts::TAU;

use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

/// One of the three rotation axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Wrap an angle in radians into `[0, 2π)`
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round a tiny negative input up to exactly TAU
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Advance a single axis and keep it inside `[0, 2π)`
    pub fn advance(&mut self, axis: Axis, delta: f32) {
        let angle = match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        };
        *angle = wrap_angle(*angle + delta);
    }

    pub fn wrap(&mut self) {
        self.x = wrap_angle(self.x);
        self.y = wrap_angle(self.y);
        self.z = wrap_angle(self.z);
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Rotation applied as X, then Y, then Z in object space (`Rx * Ry * Rz`)
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(rotation.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, rotation.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, rotation.z));

        rx * ry * rz
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Pose of one die: `base * translate * scale * Rx * Ry * Rz`
    pub fn die_model_matrix(
        base: &Matrix4<f32>,
        translation: &Point3<f32>,
        scale: f32,
        rotation: &RotationState,
    ) -> Matrix4<f32> {
        base * Self::translation_matrix(translation.x, translation.y, translation.z)
            * Matrix4::new_scaling(scale)
            * Self::rotation_matrix(rotation)
    }

    /// Inverse transpose of the upper 3x3 of `view * model`, if it is invertible
    pub fn normal_matrix(view: &Matrix4<f32>, model: &Matrix4<f32>) -> Option<Matrix3<f32>> {
        let model_view: Matrix3<f32> = (view * model).fixed_view::<3, 3>(0, 0).into_owned();
        model_view.try_inverse().map(|inverse| inverse.transpose())
    }
}
