//! Assembles the stock scene
//!
//! Camera, light rig, materials, primitives, the imported model and the snow
//! field. Textures are not loaded here; they come back as
//! [`TextureRequest`]s for the [`TexturePipeline`](crate::texture_pipeline::TexturePipeline).

use std::f32::consts::PI;

use cgmath::Vector3;
use rand::Rng;

use crate::config::SceneConfig;
use crate::error::report;
use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
use crate::gfx::geometry::{generate_box, generate_plane, generate_sphere, generate_torus};
use crate::gfx::resources::{Material, TextureSettings, TextureSlot, WrapMode};
use crate::gfx::scene::{color_from_hex, Object, Scene, SnowField, Transform};
use crate::texture_pipeline::TextureRequest;

/// Material and object names used by the stock scene
pub mod ids {
    pub const FLOOR: &str = "floor";
    pub const CUBE: &str = "cube";
    pub const BALL: &str = "ball";
    pub const TORUS: &str = "torus";
    pub const BULB: &str = "bulb";
    pub const SNOW: &str = "snow";
}

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

pub struct BuiltScene {
    pub scene: Scene,
    pub texture_requests: Vec<TextureRequest>,
}

pub fn build_scene<R: Rng + ?Sized>(config: &SceneConfig, rng: &mut R) -> BuiltScene {
    let camera = OrbitCamera::looking_at(
        Vector3::new(-4.0, 2.0, 4.0),
        Vector3::new(0.0, 0.0, 0.0),
        config.aspect(),
    );
    let mut scene = Scene::new(CameraManager::new(camera, CameraController::new(0.005, 0.1)));

    add_materials(&mut scene);
    add_primitives(&mut scene);

    let mut texture_requests = material_textures(config);

    let model_path = config.model_file();
    let placement = Transform::from_position(Vector3::new(1.0, -0.5, 0.0)).with_uniform_scale(0.05);
    match scene.load_model(&model_path, placement) {
        Ok(import) => {
            log::info!(
                "Loaded model {} ({} parts)",
                model_path.display(),
                import.objects.len()
            );
            let settings = TextureSettings::default().with_srgb().with_anisotropy(4);
            texture_requests.extend(import.diffuse_textures.into_iter().map(|(material, path)| {
                TextureRequest {
                    material,
                    slot: TextureSlot::Map,
                    path,
                    settings,
                }
            }));
        }
        Err(err) => log::warn!("Skipping model: {}", report(&err)),
    }

    scene.snow = SnowField::scatter(config.flake_count, rng);
    scene.snow_material = Some(ids::SNOW.to_string());

    scene.set_shadow_dependent_materials(vec![
        ids::BALL.to_string(),
        ids::CUBE.to_string(),
        ids::FLOOR.to_string(),
    ]);
    scene.update();

    log::info!(
        "Scene built: {} objects, {} flakes, {} textures queued",
        scene.objects.len(),
        scene.snow.len(),
        texture_requests.len()
    );

    BuiltScene {
        scene,
        texture_requests,
    }
}

fn add_materials(scene: &mut Scene) {
    let materials = [
        Material::new(ids::FLOOR, WHITE, 0.2, 0.8).with_bump_scale(0.0005),
        Material::new(ids::CUBE, WHITE, 0.2, 0.7).with_bump_scale(0.002),
        Material::new(ids::BALL, WHITE, 1.0, 0.5),
        Material::new(ids::TORUS, WHITE, 0.2, 0.7).with_bump_scale(0.002),
        Material::new(ids::BULB, [0.0, 0.0, 0.0, 1.0], 0.0, 1.0)
            .with_emission(color_from_hex(0xffffee))
            .with_emissive_intensity(1.0),
        Material::new(ids::SNOW, WHITE, 0.0, 0.6),
    ];
    for material in materials {
        scene.material_manager.add_material(material);
    }
}

fn add_primitives(scene: &mut Scene) {
    scene.add_object(
        Object::from_geometry(ids::FLOOR, &generate_plane(10.0, 10.0, 1, 1))
            .with_transform(Transform::default().with_rotation(Vector3::new(-PI / 2.0, 0.0, 0.0)))
            .with_material(ids::FLOOR)
            .receiving_shadow(),
    );

    scene.add_object(
        Object::from_geometry(ids::BALL, &generate_sphere(0.25, 32, 32))
            .with_transform(
                Transform::from_position(Vector3::new(1.0, 0.25, 1.0))
                    .with_rotation(Vector3::new(0.0, PI, 0.0)),
            )
            .with_material(ids::BALL)
            .casting_shadow(),
    );

    scene.add_object(
        Object::from_geometry(ids::CUBE, &generate_box(0.5, 0.5, 0.5))
            .with_transform(Transform::from_position(Vector3::new(-0.5, 0.25, -1.0)))
            .with_material(ids::CUBE)
            .casting_shadow(),
    );

    scene.add_object(
        Object::from_geometry(ids::TORUS, &generate_torus(0.3, 0.1, 10, 100))
            .with_transform(Transform::from_position(Vector3::new(1.0, 1.0, -1.0)))
            .with_material(ids::TORUS)
            .casting_shadow(),
    );

    let bulb = scene.add_object(
        Object::from_geometry(ids::BULB, &generate_sphere(0.02, 16, 8))
            .with_transform(Transform::from_position(scene.lights.point.position))
            .with_material(ids::BULB),
    );
    scene.attach_bulb(bulb, ids::BULB);
}

fn material_textures(config: &SceneConfig) -> Vec<TextureRequest> {
    let floor = TextureSettings::tiled(10.0, 24.0);
    let tiled = TextureSettings::tiled(1.0, 1.0);
    let clamped = TextureSettings {
        wrap: WrapMode::ClampToEdge,
        ..TextureSettings::default()
    }
    .with_anisotropy(4);

    let table = [
        (ids::FLOOR, TextureSlot::Map, "hardwood2_diffuse.jpg", floor.with_srgb()),
        (ids::FLOOR, TextureSlot::BumpMap, "hardwood2_bump.jpg", floor),
        (ids::FLOOR, TextureSlot::RoughnessMap, "hardwood2_roughness.jpg", floor),
        (ids::CUBE, TextureSlot::Map, "brick_diffuse.jpg", tiled.with_srgb()),
        (ids::CUBE, TextureSlot::BumpMap, "brick_bump.jpg", tiled),
        (ids::BALL, TextureSlot::Map, "earth_atmos_2048.jpg", clamped.with_srgb()),
        (ids::BALL, TextureSlot::MetalnessMap, "earth_specular_2048.jpg", clamped.with_srgb()),
        (ids::TORUS, TextureSlot::Map, "organic_diffuse.jpg", tiled.with_srgb()),
        (ids::TORUS, TextureSlot::BumpMap, "organic_bump.png", tiled),
    ];

    table
        .into_iter()
        .map(|(material, slot, file, settings)| TextureRequest {
            material: material.to_string(),
            slot,
            path: config.texture_path(file),
            settings,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn config_without_assets() -> SceneConfig {
        SceneConfig {
            asset_root: "no-assets-here".into(),
            flake_count: 64,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_model_keeps_primitives() {
        let mut rng = StdRng::seed_from_u64(1);
        let built = build_scene(&config_without_assets(), &mut rng);
        let scene = &built.scene;

        assert_eq!(scene.objects.len(), 5);
        for name in [ids::FLOOR, ids::BALL, ids::CUBE, ids::TORUS, ids::BULB] {
            assert!(scene.find_object(name).is_some(), "missing {}", name);
        }
        assert_eq!(scene.snow.len(), 64);
        assert_eq!(scene.snow_material.as_deref(), Some(ids::SNOW));
    }

    #[test]
    fn test_default_gltf_model_is_loaded() {
        let root = std::env::temp_dir().join(format!("snowlight-assets-{}", std::process::id()));
        let objects = root.join("objects");
        std::fs::create_dir_all(&objects).unwrap();
        crate::gfx::scene::model::write_triangle_gltf(&objects, "scene.gltf");

        let config = SceneConfig {
            asset_root: root.clone(),
            flake_count: 0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let scene = build_scene(&config, &mut rng).scene;

        assert_eq!(scene.objects.len(), 6);
        let model = scene.find_object("scene/tri").unwrap();
        assert_eq!(model.transform.position, Vector3::new(1.0, -0.5, 0.0));
        assert_eq!(model.transform.scale, Vector3::new(0.05, 0.05, 0.05));
        assert!(scene.material_manager.get_material("scene/stone").is_some());

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_shadow_flags() {
        let mut rng = StdRng::seed_from_u64(1);
        let scene = build_scene(&config_without_assets(), &mut rng).scene;

        assert!(scene.find_object(ids::FLOOR).unwrap().receive_shadow);
        assert!(!scene.find_object(ids::FLOOR).unwrap().cast_shadow);
        for name in [ids::BALL, ids::CUBE, ids::TORUS] {
            assert!(scene.find_object(name).unwrap().cast_shadow);
        }
        assert!(!scene.find_object(ids::BULB).unwrap().cast_shadow);
        assert_eq!(scene.shadow_dependent_materials().len(), 3);
    }

    #[test]
    fn test_material_parameters() {
        let mut rng = StdRng::seed_from_u64(1);
        let scene = build_scene(&config_without_assets(), &mut rng).scene;
        let materials = &scene.material_manager;

        let floor = materials.get_material(ids::FLOOR).unwrap();
        assert_eq!(floor.roughness, 0.8);
        assert_eq!(floor.metallic, 0.2);
        assert_eq!(floor.bump_scale, 0.0005);

        let ball = materials.get_material(ids::BALL).unwrap();
        assert_eq!(ball.metallic, 1.0);
        assert_eq!(ball.roughness, 0.5);

        let bulb = materials.get_material(ids::BULB).unwrap();
        assert_eq!(bulb.base_color[0], 0.0);
        assert_eq!(bulb.emissive, color_from_hex(0xffffee));
    }

    #[test]
    fn test_texture_requests() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = config_without_assets();
        let requests = build_scene(&config, &mut rng).texture_requests;

        assert_eq!(requests.len(), 9);

        let floor_bump = requests
            .iter()
            .find(|r| r.material == ids::FLOOR && r.slot == TextureSlot::BumpMap)
            .unwrap();
        assert_eq!(floor_bump.settings.repeat, [10.0, 24.0]);
        assert_eq!(floor_bump.settings.wrap, WrapMode::Repeat);
        assert!(!floor_bump.settings.srgb);
        assert_eq!(floor_bump.path, config.texture_path("hardwood2_bump.jpg"));

        let earth = requests
            .iter()
            .find(|r| r.material == ids::BALL && r.slot == TextureSlot::MetalnessMap)
            .unwrap();
        assert_eq!(earth.settings.wrap, WrapMode::ClampToEdge);
        assert!(earth.settings.srgb);

        assert!(requests.iter().all(|r| r.settings.anisotropy == 4));
        assert!(requests
            .iter()
            .filter(|r| r.slot == TextureSlot::Map)
            .all(|r| r.settings.srgb));
    }

    #[test]
    fn test_bulb_starts_at_light() {
        let mut rng = StdRng::seed_from_u64(1);
        let scene = build_scene(&config_without_assets(), &mut rng).scene;
        assert_eq!(
            scene.find_object(ids::BULB).unwrap().transform.position,
            Vector3::new(0.0, 2.0, 0.0)
        );
        assert_eq!(scene.lights.point.position, Vector3::new(0.0, 2.0, 0.0));
    }
}
