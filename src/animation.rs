//! Per-frame scene animation
//!
//! [`AnimationDriver::tick`] copies the tunables into the light rig and
//! render settings, swings the bulb up and down and advances the snow.

use cgmath::Vector3;

use crate::config::Tunables;
use crate::gfx::scene::{Scene, SnowFlake};

/// Flakes falling below this height wrap back to the top
pub const FLOOR_Y: f32 = -4.0;

/// Bulb emitter area (radius squared) used to turn light power into emission
pub const BULB_AREA: f32 = 0.02 * 0.02;

pub const GROUP_YAW_STEP: f64 = 0.000_000_2;

/// How the snow group yaw accumulates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupYawPolicy {
    /// One step per frame
    #[default]
    PerFrame,
    /// One step per second-half flake per frame
    PerParticle,
}

/// Spin, fall speed and wrap offset shared by one half of the flakes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlakeMotion {
    pub spin: Vector3<f32>,
    pub fall: f32,
    pub wrap: f32,
}

pub const FIRST_HALF_MOTION: FlakeMotion = FlakeMotion {
    spin: Vector3 {
        x: 0.02,
        y: 0.01,
        z: 0.03,
    },
    fall: 0.018,
    wrap: 10.0,
};

pub const SECOND_HALF_MOTION: FlakeMotion = FlakeMotion {
    spin: Vector3 {
        x: -0.03,
        y: -0.03,
        z: -0.02,
    },
    fall: 0.016,
    wrap: 9.5,
};

impl FlakeMotion {
    pub fn apply(&self, flake: &mut SnowFlake) {
        flake.rotation += self.spin;
        flake.position.y -= self.fall;
        if flake.position.y < FLOOR_Y {
            flake.position.y += self.wrap;
        }
    }
}

/// Height of the bulb at `now_millis`, always within [0.5, 2.0]
pub fn bulb_height(now_millis: f64) -> f32 {
    let t = now_millis * 0.0005;
    (t.cos() * 0.75 + 1.25) as f32
}

pub fn curved_exposure(exposure: f32) -> f32 {
    exposure.powf(5.0)
}

#[derive(Debug, Clone, Default)]
pub struct AnimationDriver {
    previous_shadows: bool,
    yaw_policy: GroupYawPolicy,
}

impl AnimationDriver {
    pub fn new(yaw_policy: GroupYawPolicy) -> Self {
        Self {
            previous_shadows: false,
            yaw_policy,
        }
    }

    pub fn previous_shadows(&self) -> bool {
        self.previous_shadows
    }

    pub fn yaw_policy(&self) -> GroupYawPolicy {
        self.yaw_policy
    }

    /// Advances the scene by one frame
    ///
    /// Returns `true` when the shadow mode changed this frame.
    pub fn tick(&mut self, tunables: Tunables, now_millis: f64, scene: &mut Scene) -> bool {
        scene.settings.exposure = curved_exposure(tunables.exposure);
        scene.settings.shadow_map_enabled = tunables.shadows_enabled;
        scene.lights.point.cast_shadow = tunables.shadows_enabled;

        let toggled = tunables.shadows_enabled != self.previous_shadows;
        if toggled {
            let marked = scene.mark_shadow_dependent_materials();
            log::debug!(
                "Shadows {}, {} materials marked for update",
                if tunables.shadows_enabled { "on" } else { "off" },
                marked
            );
            self.previous_shadows = tunables.shadows_enabled;
        }

        scene.lights.point.set_power(tunables.bulb_power);
        let intensity = scene.lights.point.intensity;
        if let Some(bulb) = scene.bulb_material_mut() {
            bulb.emissive_intensity = intensity / BULB_AREA;
        }

        scene.lights.hemisphere.intensity = tunables.sky_irradiance;
        scene.lights.point.position.y = bulb_height(now_millis);

        let (first, second) = scene.snow.halves_mut();
        for flake in first.iter_mut() {
            FIRST_HALF_MOTION.apply(flake);
        }
        for flake in second.iter_mut() {
            SECOND_HALF_MOTION.apply(flake);
        }
        let second_len = second.len();

        match self.yaw_policy {
            GroupYawPolicy::PerFrame if second_len > 0 => scene.snow.group_yaw -= GROUP_YAW_STEP,
            GroupYawPolicy::PerFrame => {}
            GroupYawPolicy::PerParticle => {
                for _ in 0..second_len {
                    scene.snow.group_yaw -= GROUP_YAW_STEP;
                }
            }
        }

        scene.update();
        toggled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::scene_builder::{build_scene, ids};
    use rand::{rngs::StdRng, SeedableRng};

    fn test_scene(flake_count: usize) -> Scene {
        let config = SceneConfig {
            asset_root: "does-not-exist".into(),
            flake_count,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        build_scene(&config, &mut rng).scene
    }

    fn clear_flags(scene: &mut Scene) {
        scene.material_manager.clear_update_flags();
    }

    #[test]
    fn test_exposure_curve() {
        for step in 1..=20 {
            let exposure = step as f32 / 20.0;
            let mut scene = test_scene(0);
            let tunables = Tunables {
                exposure,
                ..Default::default()
            };
            AnimationDriver::default().tick(tunables, 0.0, &mut scene);
            assert!((scene.settings.exposure - exposure.powi(5)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_bulb_height_range() {
        for step in 0..2000 {
            let y = bulb_height(step as f64 * 97.3);
            assert!((0.5..=2.0).contains(&y), "y = {}", y);
        }
        assert!((bulb_height(0.0) - 2.0).abs() < 1e-6);
        assert!((bulb_height(std::f64::consts::PI / 0.0005) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_first_half_fall_and_wrap() {
        let mut flake = SnowFlake {
            index: 0,
            position: Vector3::new(0.0, 1.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
        };
        FIRST_HALF_MOTION.apply(&mut flake);
        assert!((flake.position.y - 0.982).abs() < 1e-6);
        assert!((flake.rotation.x - 0.02).abs() < 1e-6);
        assert!((flake.rotation.y - 0.01).abs() < 1e-6);
        assert!((flake.rotation.z - 0.03).abs() < 1e-6);

        flake.position.y = -3.99;
        FIRST_HALF_MOTION.apply(&mut flake);
        assert!((flake.position.y - (-3.99 - 0.018 + 10.0)).abs() < 1e-5);
    }

    #[test]
    fn test_second_half_fall_and_wrap() {
        let mut flake = SnowFlake {
            index: 1,
            position: Vector3::new(0.0, -3.99, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
        };
        SECOND_HALF_MOTION.apply(&mut flake);
        assert!((flake.position.y - (-3.99 - 0.016 + 9.5)).abs() < 1e-5);
        assert!((flake.rotation.y + 0.03).abs() < 1e-6);

        flake.position.y = 0.0;
        SECOND_HALF_MOTION.apply(&mut flake);
        assert!((flake.position.y + 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_halves_move_differently() {
        let mut scene = test_scene(10);
        let before: Vec<f32> = scene.snow.flakes().iter().map(|f| f.position.y).collect();
        AnimationDriver::default().tick(Tunables::default(), 0.0, &mut scene);

        for (flake, old_y) in scene.snow.flakes().iter().zip(before) {
            let motion = if flake.index < 5 {
                FIRST_HALF_MOTION
            } else {
                SECOND_HALF_MOTION
            };
            let mut expected = old_y - motion.fall;
            if expected < FLOOR_Y {
                expected += motion.wrap;
            }
            assert!((flake.position.y - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_shadow_toggle_marks_exactly_three_materials_once() {
        let mut scene = test_scene(0);
        let mut driver = AnimationDriver::default();
        assert!(!driver.previous_shadows());
        clear_flags(&mut scene);

        // First frame with shadows on counts as a toggle
        assert!(driver.tick(Tunables::default(), 0.0, &mut scene));
        assert_eq!(
            scene.material_manager.pending_updates(),
            vec![ids::BALL, ids::CUBE, ids::FLOOR]
        );

        clear_flags(&mut scene);
        assert!(!driver.tick(Tunables::default(), 16.0, &mut scene));
        assert!(scene.material_manager.pending_updates().is_empty());

        let off = Tunables {
            shadows_enabled: false,
            ..Default::default()
        };
        assert!(driver.tick(off, 32.0, &mut scene));
        assert!(!scene.settings.shadow_map_enabled);
        assert!(!scene.lights.point.cast_shadow);
        assert_eq!(
            scene.material_manager.pending_updates(),
            vec![ids::BALL, ids::CUBE, ids::FLOOR]
        );

        clear_flags(&mut scene);
        assert!(!driver.tick(off, 48.0, &mut scene));
        assert!(scene.material_manager.pending_updates().is_empty());
    }

    #[test]
    fn test_emissive_follows_power() {
        let mut scene = test_scene(0);
        for power in [0.0, 1.0, 400.0, 1700.0, 2999.5, 3000.0] {
            let tunables = Tunables {
                bulb_power: power,
                ..Default::default()
            };
            AnimationDriver::default().tick(tunables, 0.0, &mut scene);

            assert_eq!(scene.lights.point.power(), power);
            let bulb = scene.bulb_material_mut().unwrap();
            assert_eq!(bulb.emissive_intensity, power / 0.0004);
        }
    }

    #[test]
    fn test_group_yaw_policies() {
        let mut scene = test_scene(10);
        AnimationDriver::new(GroupYawPolicy::PerFrame).tick(Tunables::default(), 0.0, &mut scene);
        assert_eq!(scene.snow.group_yaw, -GROUP_YAW_STEP);

        let mut scene = test_scene(10);
        AnimationDriver::new(GroupYawPolicy::PerParticle).tick(
            Tunables::default(),
            0.0,
            &mut scene,
        );
        let mut expected = 0.0;
        for _ in 0..5 {
            expected -= GROUP_YAW_STEP;
        }
        assert_eq!(scene.snow.group_yaw, expected);

        let mut scene = test_scene(0);
        AnimationDriver::new(GroupYawPolicy::PerFrame).tick(Tunables::default(), 0.0, &mut scene);
        assert_eq!(scene.snow.group_yaw, 0.0);
    }

    #[test]
    fn test_group_yaw_keeps_turning_after_many_hours() {
        let mut scene = test_scene(2);
        let mut driver = AnimationDriver::new(GroupYawPolicy::PerFrame);
        // Past the point where f32 stops changing, a few days in at 60 fps
        scene.snow.group_yaw = -4.5;

        let before = scene.snow.group_yaw;
        driver.tick(Tunables::default(), 0.0, &mut scene);
        assert!(scene.snow.group_yaw < before);
        assert!((before - scene.snow.group_yaw - GROUP_YAW_STEP).abs() < 1e-12);

        // Same step in f32 is lost to rounding
        assert_eq!(before as f32 - GROUP_YAW_STEP as f32, before as f32);
    }

    #[test]
    fn test_first_frame_end_to_end() {
        let mut scene = test_scene(100);
        let tunables = Tunables {
            shadows_enabled: true,
            exposure: 0.68,
            bulb_power: 400.0,
            sky_irradiance: 0.5,
        };
        AnimationDriver::default().tick(tunables, 0.0, &mut scene);

        assert!((scene.lights.point.position.y - 2.0).abs() < 1e-6);
        assert!((scene.settings.exposure - 0.1454).abs() < 1e-4);
        assert_eq!(scene.lights.hemisphere.intensity, 0.5);
        assert!(scene.settings.shadow_map_enabled);

        // Bulb emitter tracks the light
        let bulb = scene.find_object(ids::BULB).unwrap();
        assert_eq!(bulb.transform.position, scene.lights.point.position);
    }
}
