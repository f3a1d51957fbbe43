//! Asset loading: shader sources and decoded textures.
//!
//! Assets are addressed by paths relative to an asset root. Everything here
//! runs before any GPU resource exists, so failures abort startup cleanly.

use explorer_common::ImageData;
use image::RgbaImage;
use image::imageops::FilterType;
use std::path::{Path, PathBuf};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    ResourceLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl AssetError {
    pub fn path(&self) -> &Path {
        match self {
            Self::ResourceLoad { path, .. } | Self::Decode { path, .. } => path,
        }
    }
}

/// Reads assets relative to a root directory.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Read a UTF-8 text file wholesale. No preprocessing is applied.
    pub fn load_text(&self, relative: impl AsRef<Path>) -> Result<String, AssetError> {
        let path = self.resolve(relative);
        let text = std::fs::read_to_string(&path).map_err(|source| AssetError::ResourceLoad {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "loaded text asset");
        Ok(text)
    }

    /// Read and decode an image file into RGBA8 pixels.
    pub fn load_image(&self, relative: impl AsRef<Path>) -> Result<ImageData, AssetError> {
        let path = self.resolve(relative);
        let bytes = std::fs::read(&path).map_err(|source| AssetError::ResourceLoad {
            path: path.clone(),
            source,
        })?;
        let image = decode_rgba8(&bytes).map_err(|source| AssetError::Decode {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "decoded image asset"
        );
        Ok(image)
    }
}

/// Decode in-memory image file contents (PNG, JPEG) to RGBA8.
pub fn decode_rgba8(bytes: &[u8]) -> Result<ImageData, image::ImageError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    ImageData::from_rgba8(width, height, rgba.into_raw()).ok_or_else(|| {
        image::ImageError::Limits(image::error::LimitError::from_kind(
            image::error::LimitErrorKind::DimensionError,
        ))
    })
}

/// Number of mip levels down to 1x1, base level included.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Full mip chain for an image, base level first. Each level halves both
/// dimensions (never below 1) using a triangle filter.
pub fn mip_chain(base: &ImageData) -> Vec<ImageData> {
    let count = mip_level_count(base.width(), base.height());
    let mut levels = Vec::with_capacity(count as usize);
    levels.push(base.clone());

    let Some(mut current) =
        RgbaImage::from_raw(base.width(), base.height(), base.pixels().to_vec())
    else {
        return levels;
    };

    for _ in 1..count {
        let width = (current.width() / 2).max(1);
        let height = (current.height() / 2).max(1);
        current = image::imageops::resize(&current, width, height, FilterType::Triangle);
        match ImageData::from_rgba8(width, height, current.as_raw().clone()) {
            Some(level) => levels.push(level),
            None => break,
        }
    }
    levels
}

pub fn crate_info() -> &'static str {
    "explorer-assets v0.1.0"
}
