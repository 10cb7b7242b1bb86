pub mod worker;

use crate::blob::{Blob, BlobStore};
use crate::error::LoadError;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Where a sprite sheet comes from
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Encoded image bytes (png, jpeg, gif, ...)
    Bytes(Vec<u8>),
    /// A blob handed over directly
    Blob(Blob),
    /// A loadable reference: `data:` URI, `blob:` handle, http(s) URL or file path
    Reference(String),
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

impl From<&[u8]> for ImageSource {
    fn from(bytes: &[u8]) -> Self {
        ImageSource::Bytes(bytes.to_vec())
    }
}

impl From<Blob> for ImageSource {
    fn from(blob: Blob) -> Self {
        ImageSource::Blob(blob)
    }
}

impl From<String> for ImageSource {
    fn from(reference: String) -> Self {
        ImageSource::Reference(reference)
    }
}

impl From<&str> for ImageSource {
    fn from(reference: &str) -> Self {
        ImageSource::Reference(reference.to_owned())
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Reference(path.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::from(path.as_path())
    }
}

/// Decoded sprite sheet, RGBA8. Never mutated after load.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Turns an [`ImageSource`] into a [`SourceImage`].
///
/// `blob:` references are resolved against the loader's store.
#[derive(Debug, Clone, Default)]
pub struct ImageLoader {
    blobs: BlobStore,
}

impl ImageLoader {
    pub fn new(blobs: BlobStore) -> Self {
        Self { blobs }
    }

    /// Read and decode `source` on a blocking thread.
    ///
    /// A single failure is terminal; there are no retries.
    pub async fn load(&self, source: ImageSource) -> Result<SourceImage, LoadError> {
        let start = Instant::now();
        let blobs = self.blobs.clone();

        let image = smol::unblock(move || worker::load_source(source, &blobs)).await?;

        log::info!(
            "Loaded sprite sheet {}x{} in {:?}",
            image.width(),
            image.height(),
            start.elapsed()
        );
        Ok(image)
    }
}
