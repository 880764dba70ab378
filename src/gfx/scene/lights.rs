//! Scene light rig: bulb, sky, ambient fill and spot
//!
//! Intensities use the renderer's physical light units. For the point light,
//! intensity and power are the same number; the shader divides by 4π when
//! converting power to radiant intensity.

use cgmath::{Matrix4, Point3, Rad, Vector3};

use crate::gfx::camera::OPENGL_TO_WGPU_MATRIX;

/// Converts a `0xRRGGBB` literal into RGB components in 0..1
pub fn color_from_hex(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// Omnidirectional light with inverse-square falloff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: [f32; 3],
    pub intensity: f32,
    /// Cutoff distance; 0 means unlimited
    pub distance: f32,
    pub decay: f32,
    pub position: Vector3<f32>,
    pub cast_shadow: bool,
}

impl PointLight {
    /// Vertical field of view of the downward shadow frustum
    pub const SHADOW_FOV_DEGREES: f32 = 150.0;
    pub const SHADOW_NEAR: f32 = 0.05;
    pub const SHADOW_FAR: f32 = 25.0;

    pub fn power(&self) -> f32 {
        self.intensity
    }

    pub fn set_power(&mut self, power: f32) {
        self.intensity = power;
    }

    /// View-projection of the shadow frustum looking straight down from the light
    pub fn shadow_view_proj(&self) -> Matrix4<f32> {
        let eye = Point3::new(self.position.x, self.position.y, self.position.z);
        let target = eye - Vector3::unit_y();
        let view = Matrix4::look_at_rh(eye, target, Vector3::unit_z());
        let proj = cgmath::perspective(
            Rad(Self::SHADOW_FOV_DEGREES.to_radians()),
            1.0,
            Self::SHADOW_NEAR,
            Self::SHADOW_FAR,
        );
        OPENGL_TO_WGPU_MATRIX * proj * view
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: color_from_hex(0xffee88),
            intensity: 1.0,
            distance: 100.0,
            decay: 2.0,
            position: Vector3::new(0.0, 2.0, 0.0),
            cast_shadow: true,
        }
    }
}

/// Sky/ground gradient lighting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HemisphereLight {
    pub sky_color: [f32; 3],
    pub ground_color: [f32; 3],
    pub intensity: f32,
}

impl Default for HemisphereLight {
    fn default() -> Self {
        Self {
            sky_color: color_from_hex(0xddeeff),
            ground_color: color_from_hex(0x0f0e0d),
            intensity: 0.02,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 0.5,
        }
    }
}

/// Cone light aimed at a target point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub color: [f32; 3],
    pub intensity: f32,
    /// Cutoff distance; 0 means unlimited
    pub distance: f32,
    /// Half-angle of the cone in radians
    pub angle: f32,
    /// Fraction of the cone over which the edge fades out
    pub penumbra: f32,
    pub decay: f32,
    pub position: Vector3<f32>,
    pub target: Vector3<f32>,
    pub cast_shadow: bool,
}

impl SpotLight {
    pub fn direction(&self) -> Vector3<f32> {
        use cgmath::InnerSpace;
        let dir = self.target - self.position;
        if dir.magnitude2() > 0.0 {
            dir.normalize()
        } else {
            -Vector3::unit_y()
        }
    }

    /// Cosines of the outer cone edge and of the start of the penumbra
    pub fn cone_cosines(&self) -> (f32, f32) {
        let outer = self.angle.cos();
        let inner = (self.angle * (1.0 - self.penumbra)).cos();
        (outer, inner)
    }
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 10.0,
            distance: 0.0,
            angle: 0.4,
            penumbra: 0.0,
            decay: 2.0,
            position: Vector3::new(-2.0, 4.0, 0.6),
            target: Vector3::new(0.0, 0.0, 0.0),
            cast_shadow: false,
        }
    }
}

/// Every light in the scene
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightRig {
    pub point: PointLight,
    pub hemisphere: HemisphereLight,
    pub ambient: AmbientLight,
    pub spot: SpotLight,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector4};

    #[test]
    fn test_color_from_hex() {
        assert_eq!(color_from_hex(0xffffff), [1.0, 1.0, 1.0]);
        assert_eq!(color_from_hex(0x000000), [0.0, 0.0, 0.0]);
        let c = color_from_hex(0xffee88);
        assert_eq!(c[0], 1.0);
        assert!((c[1] - 238.0 / 255.0).abs() < 1e-6);
        assert!((c[2] - 136.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_default_rig() {
        let rig = LightRig::default();
        assert_eq!(rig.point.distance, 100.0);
        assert_eq!(rig.point.decay, 2.0);
        assert!(rig.point.cast_shadow);
        assert_eq!(rig.hemisphere.intensity, 0.02);
        assert_eq!(rig.ambient.intensity, 0.5);
        assert_eq!(rig.spot.intensity, 10.0);
        assert!(!rig.spot.cast_shadow);
    }

    #[test]
    fn test_power_is_intensity() {
        let mut light = PointLight::default();
        light.set_power(400.0);
        assert_eq!(light.intensity, 400.0);
        assert_eq!(light.power(), 400.0);
    }

    #[test]
    fn test_spot_aims_at_target() {
        let spot = SpotLight::default();
        let expected = (-Vector3::new(-2.0, 4.0, 0.6)).normalize();
        assert!((spot.direction() - expected).magnitude() < 1e-6);
        let (outer, inner) = spot.cone_cosines();
        assert_eq!(outer, inner);
        assert!((outer - 0.4f32.cos()).abs() < 1e-6);
    }

    #[test]
    fn test_shadow_frustum_sees_floor_below() {
        let light = PointLight::default();
        let clip = light.shadow_view_proj() * Vector4::new(0.5, 0.0, 0.5, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(clip.w > 0.0);
        assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
        assert!(ndc.z >= 0.0 && ndc.z <= 1.0);
    }
}
