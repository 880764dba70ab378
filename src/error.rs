//! Error types for scene assembly and asset loading

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while loading configuration or assets
///
/// Asset errors never abort the application: callers log them and keep the
/// default texture or skip the model.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to read config file '{path}'")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{path}'")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load texture '{path}'")]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load model '{path}'")]
    Model {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to load glTF model '{path}'")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("unsupported model format '{path}' (expected .gltf, .glb or .obj)")]
    UnsupportedModel { path: PathBuf },

    #[error("model '{path}' contains no meshes")]
    EmptyModel { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, SceneError>;

/// Formats an error with its source chain, `outer: inner: ...`
pub fn report(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_includes_source() {
        let error = SceneError::ConfigIo {
            path: PathBuf::from("missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(
            report(&error),
            "failed to read config file 'missing.json': no such file"
        );
    }
}
