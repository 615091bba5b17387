use std::io;
use std::path::{Path, PathBuf};

/// Decoded RGBA8 pixel data ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows, top row first.
    pub rgba: Vec<u8>,
}

/// Why an image could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadErrorKind {
    #[error("not found")]
    NotFound,
    #[error("decode failure: {0}")]
    DecodeFailure(String),
}

/// An image asset failed to load. Fatal to the entity being constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to load image `{}`: {kind}", .path.display())]
pub struct ResourceLoadError {
    pub path: PathBuf,
    pub kind: LoadErrorKind,
}

impl ResourceLoadError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: LoadErrorKind::NotFound,
        }
    }

    pub fn decode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: LoadErrorKind::DecodeFailure(reason.into()),
        }
    }
}

/// Image loading contract: path in, pixels or a typed failure out.
pub trait ImageLoader {
    fn load(&self, path: &Path) -> Result<RawImage, ResourceLoadError>;
}

/// Loads images from the filesystem and decodes them with the `image` crate.
///
/// Relative paths are resolved against `root`.
#[derive(Debug, Clone, Default)]
pub struct FileImageLoader {
    root: PathBuf,
}

impl FileImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, path: &Path) -> Result<RawImage, ResourceLoadError> {
        let full = self.resolve(path);

        let bytes = std::fs::read(&full).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ResourceLoadError::not_found(&full),
            _ => ResourceLoadError::decode(&full, format!("read failed: {e}")),
        })?;

        decode_rgba(&full, &bytes)
    }
}

/// Decodes encoded image bytes (format sniffed from the data) into RGBA8.
fn decode_rgba(path: &Path, bytes: &[u8]) -> Result<RawImage, ResourceLoadError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ResourceLoadError::decode(path, e.to_string()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    if width == 0 || height == 0 {
        return Err(ResourceLoadError::decode(path, "image has zero size"));
    }

    Ok(RawImage {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}
