//! Background texture decoding
//!
//! Each request decodes on its own worker thread. Finished images travel back
//! over an unbounded channel and are only applied to materials from the event
//! loop thread, in [`TexturePipeline::poll`].

use std::path::PathBuf;
use std::thread;

use futures::channel::mpsc::{self, UnboundedReceiver};

use crate::error::{report, Result};
use crate::gfx::resources::{MaterialId, MaterialManager, TextureImage, TextureSettings, TextureSlot};

#[derive(Debug, Clone)]
pub struct TextureRequest {
    pub material: MaterialId,
    pub slot: TextureSlot,
    pub path: PathBuf,
    pub settings: TextureSettings,
}

/// A finished (or failed) decode, routed back to its material slot
#[derive(Debug)]
pub struct TextureCompletion {
    pub material: MaterialId,
    pub slot: TextureSlot,
    pub path: PathBuf,
    pub result: Result<TextureImage>,
}

impl TextureCompletion {
    fn decode(request: TextureRequest) -> Self {
        let result = TextureImage::decode(&request.path, request.settings);
        Self {
            material: request.material,
            slot: request.slot,
            path: request.path,
            result,
        }
    }
}

pub struct TexturePipeline {
    receiver: UnboundedReceiver<TextureCompletion>,
    pending: usize,
}

impl TexturePipeline {
    pub fn spawn(requests: Vec<TextureRequest>) -> Self {
        let (sender, receiver) = mpsc::unbounded();
        let mut pending = 0;

        for request in requests {
            let sender = sender.clone();
            let name = format!(
                "texture-{}",
                request
                    .path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default()
            );
            let path = request.path.clone();

            let spawned = thread::Builder::new().name(name).spawn(move || {
                // The receiver may already be gone at shutdown
                let _ = sender.unbounded_send(TextureCompletion::decode(request));
            });
            match spawned {
                Ok(_) => pending += 1,
                Err(err) => log::warn!("Could not start decoder for {}: {}", path.display(), err),
            }
        }

        log::info!("Decoding {} textures in the background", pending);
        Self { receiver, pending }
    }

    /// Applies every completion that has arrived, returns how many were applied
    pub fn poll(&mut self, materials: &mut MaterialManager) -> usize {
        let mut applied = 0;
        while self.pending > 0 {
            match self.receiver.try_next() {
                Ok(Some(completion)) => {
                    self.pending -= 1;
                    if apply_completion(materials, completion) {
                        applied += 1;
                    }
                }
                // Every worker has exited
                Ok(None) => {
                    self.pending = 0;
                    break;
                }
                Err(_) => break,
            }
        }
        applied
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn is_finished(&self) -> bool {
        self.pending == 0
    }
}

/// Stores a decoded image in its material slot and marks the material dirty
///
/// Failures leave the material on its default texture.
pub fn apply_completion(materials: &mut MaterialManager, completion: TextureCompletion) -> bool {
    let TextureCompletion {
        material,
        slot,
        path,
        result,
    } = completion;

    let image = match result {
        Ok(image) => image,
        Err(err) => {
            log::warn!("Keeping default {} for '{}': {}", slot.name(), material, report(&err));
            return false;
        }
    };

    match materials.get_material_mut(&material) {
        Some(target) => {
            log::debug!(
                "Loaded {} for '{}' from {} ({}x{})",
                slot.name(),
                material,
                path.display(),
                image.width,
                image.height
            );
            target.set_texture(slot, image);
            true
        }
        None => {
            log::warn!("Texture {} targets unknown material '{}'", path.display(), material);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SceneError;
    use crate::gfx::resources::Material;
    use std::time::{Duration, Instant};

    fn manager_with(name: &str) -> MaterialManager {
        let mut manager = MaterialManager::new();
        manager.add_material(Material::new(name, [1.0; 4], 0.0, 0.5));
        manager.clear_update_flags();
        manager
    }

    fn temp_png(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("snowlight-textures-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        image::RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        path
    }

    fn poll_until_done(pipeline: &mut TexturePipeline, materials: &mut MaterialManager) -> usize {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut applied = 0;
        while !pipeline.is_finished() && Instant::now() < deadline {
            applied += pipeline.poll(materials);
            std::thread::sleep(Duration::from_millis(5));
        }
        applied
    }

    #[test]
    fn test_apply_sets_slot_and_dirty_flag() {
        let mut materials = manager_with("cube");
        let completion = TextureCompletion {
            material: "cube".into(),
            slot: TextureSlot::BumpMap,
            path: PathBuf::from("brick_bump.jpg"),
            result: Ok(TextureImage::solid([1, 2, 3, 255], TextureSettings::tiled(1.0, 1.0))),
        };

        assert!(apply_completion(&mut materials, completion));
        let cube = materials.get_material("cube").unwrap();
        assert!(cube.needs_update);
        assert!(cube.texture(TextureSlot::BumpMap).is_some());
        assert!(cube.texture(TextureSlot::Map).is_none());
    }

    #[test]
    fn test_apply_failure_keeps_default() {
        let mut materials = manager_with("cube");
        let path = PathBuf::from("missing.jpg");
        let result = TextureImage::decode(&path, TextureSettings::default());
        assert!(matches!(result, Err(SceneError::Texture { .. })));

        let completion = TextureCompletion {
            material: "cube".into(),
            slot: TextureSlot::Map,
            path,
            result,
        };
        assert!(!apply_completion(&mut materials, completion));
        let cube = materials.get_material("cube").unwrap();
        assert!(!cube.needs_update);
        assert!(cube.texture(TextureSlot::Map).is_none());
    }

    #[test]
    fn test_apply_unknown_material() {
        let mut materials = manager_with("cube");
        let completion = TextureCompletion {
            material: "nope".into(),
            slot: TextureSlot::Map,
            path: PathBuf::from("x.png"),
            result: Ok(TextureImage::solid([0; 4], TextureSettings::default())),
        };
        assert!(!apply_completion(&mut materials, completion));
    }

    #[test]
    fn test_pipeline_decodes_in_background() {
        let mut materials = manager_with("torus");
        let good = temp_png("organic_bump.png");
        let requests = vec![
            TextureRequest {
                material: "torus".into(),
                slot: TextureSlot::BumpMap,
                path: good,
                settings: TextureSettings::tiled(1.0, 1.0),
            },
            TextureRequest {
                material: "torus".into(),
                slot: TextureSlot::Map,
                path: PathBuf::from("definitely-missing.jpg"),
                settings: TextureSettings::default().with_srgb(),
            },
        ];

        let mut pipeline = TexturePipeline::spawn(requests);
        assert_eq!(pipeline.pending(), 2);

        let applied = poll_until_done(&mut pipeline, &mut materials);
        assert_eq!(applied, 1);
        assert!(pipeline.is_finished());

        let torus = materials.get_material("torus").unwrap();
        let bump = torus.texture(TextureSlot::BumpMap).unwrap();
        assert_eq!((bump.width, bump.height), (2, 3));
        assert_eq!(&bump.rgba[..4], &[10, 20, 30, 255]);
        assert!(torus.texture(TextureSlot::Map).is_none());
    }

    #[test]
    fn test_empty_pipeline_is_finished() {
        let mut materials = MaterialManager::new();
        let mut pipeline = TexturePipeline::spawn(Vec::new());
        assert!(pipeline.is_finished());
        assert_eq!(pipeline.poll(&mut materials), 0);
    }
}
