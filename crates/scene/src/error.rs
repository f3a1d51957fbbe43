use explorer_assets::AssetError;
use explorer_render::ShaderError;
use std::path::PathBuf;

/// Everything that can abort scene startup. There is no runtime recovery:
/// once a [`crate::Game`] exists, per-frame work cannot fail.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error("failed to read scene config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scene config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
    #[error("texture {0} was not loaded")]
    MissingTexture(String),
    #[error("invalid scene config: {0}")]
    InvalidConfig(String),
}
