//! Startup configuration
//!
//! Everything has a default, so an absent config file (or an empty JSON
//! object) yields the stock scene. A config file is picked from the first
//! command line argument, falling back to the `SNOWLIGHT_CONFIG` variable.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::animation::GroupYawPolicy;
use crate::error::{Result, SceneError};

pub const CONFIG_ENV_VAR: &str = "SNOWLIGHT_CONFIG";

/// Values the light-rig panel edits at runtime
///
/// Read once per frame as a snapshot. Nothing is clamped.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Tunables {
    #[serde(alias = "shadows")]
    pub shadows_enabled: bool,
    pub exposure: f32,
    #[serde(alias = "bulbPower")]
    pub bulb_power: f32,
    #[serde(alias = "hemiIrradiance")]
    pub sky_irradiance: f32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            shadows_enabled: true,
            exposure: 0.68,
            bulb_power: 400.0,
            sky_irradiance: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Directory holding `textures/` and `objects/`
    pub asset_root: PathBuf,
    /// Model file, relative to `asset_root`
    pub model_path: PathBuf,
    pub flake_count: usize,
    pub window_width: u32,
    pub window_height: u32,
    /// Accumulate the snow group yaw once per second-half flake instead of once per frame
    pub legacy_group_yaw: bool,
    pub tunables: Tunables,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            model_path: PathBuf::from("objects/scene.gltf"),
            flake_count: 12_000,
            window_width: 1280,
            window_height: 720,
            legacy_group_yaw: false,
            tunables: Tunables::default(),
        }
    }
}

impl SceneConfig {
    /// Parses a JSON document; `origin` only labels errors
    pub fn from_json_str(json: &str, origin: &Path) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| SceneError::ConfigParse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| SceneError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json, path)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Picks the config file from the process arguments (program name
    /// already skipped) or the environment variable value
    pub fn locate<I>(mut args: I, env_value: Option<String>) -> Option<PathBuf>
    where
        I: Iterator<Item = String>,
    {
        args.next()
            .or(env_value)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    }

    /// Loads the located config file, or the defaults when none was given
    pub fn from_env() -> Result<Self> {
        let env_value = std::env::var(CONFIG_ENV_VAR).ok();
        match Self::locate(std::env::args().skip(1), env_value) {
            Some(path) => Self::load(&path),
            None => {
                log::info!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Resolves an asset path against `asset_root`
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.asset_root.join(relative)
    }

    pub fn texture_path(&self, file_name: &str) -> PathBuf {
        self.resolve(Path::new("textures").join(file_name))
    }

    pub fn model_file(&self) -> PathBuf {
        self.resolve(&self.model_path)
    }

    pub fn group_yaw_policy(&self) -> GroupYawPolicy {
        if self.legacy_group_yaw {
            GroupYawPolicy::PerParticle
        } else {
            GroupYawPolicy::PerFrame
        }
    }

    pub fn aspect(&self) -> f32 {
        self.window_width.max(1) as f32 / self.window_height.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SceneConfig::default();
        assert_eq!(config.flake_count, 12_000);
        assert_eq!(config.model_path, PathBuf::from("objects/scene.gltf"));
        assert_eq!(config.tunables, Tunables::default());
        assert_eq!(config.group_yaw_policy(), GroupYawPolicy::PerFrame);

        let tunables = Tunables::default();
        assert!(tunables.shadows_enabled);
        assert_eq!(tunables.exposure, 0.68);
        assert_eq!(tunables.bulb_power, 400.0);
        assert_eq!(tunables.sky_irradiance, 0.5);
    }

    #[test]
    fn test_empty_object_is_default() {
        let config = SceneConfig::from_json_str("{}", Path::new("inline")).unwrap();
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let json = r#"{
            "asset_root": "assets",
            "flake_count": 100,
            "legacy_group_yaw": true,
            "tunables": { "bulbPower": 1200.0, "shadows": false }
        }"#;
        let config = SceneConfig::from_json_str(json, Path::new("inline")).unwrap();

        assert_eq!(config.flake_count, 100);
        assert_eq!(config.group_yaw_policy(), GroupYawPolicy::PerParticle);
        assert_eq!(config.tunables.bulb_power, 1200.0);
        assert!(!config.tunables.shadows_enabled);
        // Untouched fields keep their defaults
        assert_eq!(config.tunables.exposure, 0.68);
        assert_eq!(config.window_width, 1280);
        assert_eq!(
            config.model_file(),
            PathBuf::from("assets").join("objects/scene.gltf")
        );
        assert_eq!(
            config.texture_path("brick_bump.jpg"),
            PathBuf::from("assets").join("textures").join("brick_bump.jpg")
        );
    }

    #[test]
    fn test_invalid_json() {
        let err = SceneConfig::from_json_str("{ flake_count: ", Path::new("bad.json")).unwrap_err();
        assert!(matches!(err, SceneError::ConfigParse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = SceneConfig::load(Path::new("definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, SceneError::ConfigIo { .. }));
    }

    #[test]
    fn test_locate_prefers_argument() {
        let args = vec!["scene.json".to_string()];
        assert_eq!(
            SceneConfig::locate(args.into_iter(), Some("env.json".into())),
            Some(PathBuf::from("scene.json"))
        );
        assert_eq!(
            SceneConfig::locate(std::iter::empty(), Some("env.json".into())),
            Some(PathBuf::from("env.json"))
        );
        assert_eq!(SceneConfig::locate(std::iter::empty(), None), None);
        assert_eq!(
            SceneConfig::locate(std::iter::empty(), Some(String::new())),
            None
        );
    }

    #[test]
    fn test_aspect() {
        let config = SceneConfig {
            window_width: 1600,
            window_height: 800,
            ..Default::default()
        };
        assert_eq!(config.aspect(), 2.0);
    }
}
