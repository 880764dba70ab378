//! Falling snow: flake state and per-instance GPU data
//!
//! Flakes are only ever moved, never created or destroyed after startup. The
//! whole field additionally spins about Y by `group_yaw`.

use cgmath::{Matrix4, Rad, Vector3};
use rand::Rng;

use super::transform::euler_xyz_matrix;

/// Edge lengths of the box flakes are scattered in, centred on the origin
pub const SNOW_EXTENT: [f32; 3] = [40.0, 20.0, 40.0];

/// One snow flake
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnowFlake {
    /// Slot in the flake array, fixed for the flake's lifetime
    pub index: usize,
    pub position: Vector3<f32>,
    /// Euler angles in radians, XYZ order
    pub rotation: Vector3<f32>,
}

/// Per-instance vertex data for the snow pass
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SnowInstance {
    pub model: [[f32; 4]; 4],
}

impl SnowInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SnowInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// The flake array plus the rotation of the whole group about Y
#[derive(Debug, Clone, Default)]
pub struct SnowField {
    flakes: Vec<SnowFlake>,
    /// Accumulated in f64; tiny per-frame steps vanish in f32 after a few radians
    pub group_yaw: f64,
}

impl SnowField {
    /// Scatters `count` flakes uniformly in the snow box with zero rotation
    pub fn scatter<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        let flakes = (0..count)
            .map(|index| SnowFlake {
                index,
                position: Vector3::new(
                    (rng.random::<f32>() - 0.5) * SNOW_EXTENT[0],
                    (rng.random::<f32>() - 0.5) * SNOW_EXTENT[1],
                    (rng.random::<f32>() - 0.5) * SNOW_EXTENT[2],
                ),
                rotation: Vector3::new(0.0, 0.0, 0.0),
            })
            .collect();

        Self {
            flakes,
            group_yaw: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.flakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flakes.is_empty()
    }

    pub fn flakes(&self) -> &[SnowFlake] {
        &self.flakes
    }

    /// Flakes `[0, n/2)` and `[n/2, n)`, which animate differently
    pub fn halves_mut(&mut self) -> (&mut [SnowFlake], &mut [SnowFlake]) {
        let mid = self.flakes.len() / 2;
        self.flakes.split_at_mut(mid)
    }

    /// Model matrix of one flake: group yaw, then its own translation and rotation
    pub fn flake_matrix(&self, flake: &SnowFlake) -> Matrix4<f32> {
        Matrix4::from_angle_y(Rad(self.group_yaw as f32))
            * Matrix4::from_translation(flake.position)
            * euler_xyz_matrix(flake.rotation)
    }

    pub fn instance_data(&self) -> Vec<SnowInstance> {
        self.flakes
            .iter()
            .map(|flake| SnowInstance {
                model: self.flake_matrix(flake).into(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_scatter_stays_in_box() {
        let mut rng = StdRng::seed_from_u64(7);
        let field = SnowField::scatter(12000, &mut rng);
        assert_eq!(field.len(), 12000);
        for (i, flake) in field.flakes().iter().enumerate() {
            assert_eq!(flake.index, i);
            assert!(flake.position.x >= -20.0 && flake.position.x < 20.0);
            assert!(flake.position.y >= -10.0 && flake.position.y < 10.0);
            assert!(flake.position.z >= -20.0 && flake.position.z < 20.0);
        }
    }

    #[test]
    fn test_halves_split_by_index() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut field = SnowField::scatter(7, &mut rng);
        let (first, second) = field.halves_mut();
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 4);
        assert_eq!(second[0].index, 3);
    }

    #[test]
    fn test_instance_data_applies_group_yaw() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut field = SnowField::scatter(1, &mut rng);
        let position = field.flakes()[0].position;

        let data = field.instance_data();
        assert_eq!(data[0].model[3][0], position.x);
        assert_eq!(data[0].model[3][2], position.z);

        field.group_yaw = std::f64::consts::PI;
        let data = field.instance_data();
        assert!((data[0].model[3][0] + position.x).abs() < 1e-4);
        assert!((data[0].model[3][1] - position.y).abs() < 1e-4);
        assert!((data[0].model[3][2] + position.z).abs() < 1e-4);
    }

    #[test]
    fn test_instance_stride() {
        assert_eq!(SnowInstance::desc().array_stride, 64);
    }
}
