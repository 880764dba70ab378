//! Position, rotation and scale of scene nodes

use cgmath::{Matrix4, Rad, Vector3, Zero};

/// Rotation matrix for Euler angles applied in XYZ order
///
/// The resulting matrix is `Rx * Ry * Rz`, so a vector is rotated about Z
/// first and about X last.
pub fn euler_xyz_matrix(rotation: Vector3<f32>) -> Matrix4<f32> {
    Matrix4::from_angle_x(Rad(rotation.x))
        * Matrix4::from_angle_y(Rad(rotation.y))
        * Matrix4::from_angle_z(Rad(rotation.z))
}

/// Translation, Euler rotation (radians, XYZ order) and per-axis scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Vector3::zero(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_position(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Vector3<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vector3::new(scale, scale, scale);
        self
    }

    /// Model matrix: T * R * S
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * euler_xyz_matrix(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}
