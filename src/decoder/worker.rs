use super::{ImageSource, SourceImage};
use crate::blob::{Blob, BlobStore, BLOB_SCHEME};
use crate::error::LoadError;
use crate::util::data_url::parse_data_url;
use image::ImageFormat;
use std::path::Path;

/// Resolve `source` to bytes and decode it. Blocking.
pub fn load_source(source: ImageSource, blobs: &BlobStore) -> Result<SourceImage, LoadError> {
    match source {
        ImageSource::Bytes(bytes) => decode_rgba(&bytes, None),
        ImageSource::Blob(blob) => decode_rgba(blob.bytes(), blob.mime()),
        ImageSource::Reference(reference) => {
            let blob = resolve_reference(&reference, blobs)?;
            decode_rgba(blob.bytes(), blob.mime())
        }
    }
}

/// Decode encoded image bytes into an RGBA8 bitmap.
///
/// The format is sniffed from the content first. Formats without a
/// signature (e.g. TGA) are decoded using the declared MIME type instead.
pub fn decode_rgba(bytes: &[u8], mime: Option<&str>) -> Result<SourceImage, LoadError> {
    let guessed = image::guess_format(bytes).ok();
    let declared = mime
        .and_then(|m| m.split(';').next())
        .and_then(|m| ImageFormat::from_mime_type(m.trim()))
        .filter(|format| Some(*format) != guessed);

    let mut last_error = format!("unrecognised image format (declared {:?})", mime);
    for format in [guessed, declared].into_iter().flatten() {
        log::debug!("Decoding {} bytes as {:?}", bytes.len(), format);
        match image::load_from_memory_with_format(bytes, format) {
            Ok(decoded) => return Ok(SourceImage::new(decoded.to_rgba8())),
            Err(e) => {
                log::debug!("{:?} decode failed: {}", format, e);
                last_error = e.to_string();
            }
        }
    }

    Err(LoadError::Decode(last_error))
}

/// Turn a string reference into its bytes
fn resolve_reference(reference: &str, blobs: &BlobStore) -> Result<Blob, LoadError> {
    let trimmed = reference.trim();
    let lower = trimmed.get(..8).unwrap_or(trimmed).to_ascii_lowercase();

    if lower.starts_with("data:") {
        let parsed = parse_data_url(trimmed).map_err(|e| LoadError::Read(e.to_string()))?;
        return Ok(Blob::new(parsed.data, parsed.mime.as_deref()));
    }

    if lower.starts_with(BLOB_SCHEME) {
        return blobs
            .get(trimmed)
            .ok_or_else(|| LoadError::Read(format!("unknown or revoked blob handle: {}", trimmed)));
    }

    if lower.starts_with("http://") || lower.starts_with("https://") {
        return fetch_url(trimmed);
    }

    let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
    read_file(Path::new(path))
}

fn fetch_url(url: &str) -> Result<Blob, LoadError> {
    log::info!("Downloading sprite sheet from URL: {}", url);

    let response = reqwest::blocking::get(url).map_err(|e| LoadError::Read(e.to_string()))?;
    if !response.status().is_success() {
        return Err(LoadError::Read(format!("HTTP error: {}", response.status())));
    }

    let mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = response.bytes().map_err(|e| LoadError::Read(e.to_string()))?;

    log::info!("Downloaded {} bytes", bytes.len());
    Ok(Blob::new(bytes.to_vec(), mime.as_deref()))
}

fn read_file(path: &Path) -> Result<Blob, LoadError> {
    log::info!("Opening sprite sheet: {:?}", path);
    let bytes = std::fs::read(path)
        .map_err(|e| LoadError::Read(format!("{}: {}", path.display(), e)))?;
    let mime = ImageFormat::from_path(path).ok().map(|f| f.to_mime_type());
    Ok(Blob::new(bytes, mime))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::data_url::to_data_url;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        encoded(width, height, ImageFormat::Png)
    }

    #[test]
    fn test_bytes_source() {
        let image = load_source(ImageSource::Bytes(png_bytes(6, 4)), &BlobStore::new()).unwrap();
        assert_eq!((image.width(), image.height()), (6, 4));
        assert_eq!(image.pixels().get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_data_url_source() {
        let url = to_data_url("image/png", &png_bytes(3, 5));
        let image = load_source(ImageSource::Reference(url), &BlobStore::new()).unwrap();
        assert_eq!((image.width(), image.height()), (3, 5));
    }

    #[test]
    fn test_blob_handle_source() {
        let store = BlobStore::new();
        let url = store.insert(Blob::new(png_bytes(2, 2), Some("image/png")));
        let image = load_source(ImageSource::Reference(url.to_string()), &store).unwrap();
        assert_eq!(image.width(), 2);

        store.revoke(&url);
        let err = load_source(ImageSource::Reference(url.to_string()), &store).unwrap_err();
        assert!(matches!(err, LoadError::Read(_)));
    }

    #[test]
    fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.png");
        std::fs::write(&path, png_bytes(8, 8)).unwrap();

        let image = load_source(ImageSource::from(path.as_path()), &BlobStore::new()).unwrap();
        assert_eq!(image.height(), 8);

        let file_url = format!("file://{}", path.display());
        assert!(load_source(ImageSource::Reference(file_url), &BlobStore::new()).is_ok());
    }

    #[test]
    fn test_missing_file_is_read_failure() {
        let err = load_source(
            ImageSource::Reference("/definitely/not/here.png".into()),
            &BlobStore::new(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Read(_)));
        assert!(err.to_string().starts_with("read failed"));
    }

    #[test]
    fn test_garbage_is_decode_failure() {
        let err = decode_rgba(b"not an image at all", None).unwrap_err();
        assert!(matches!(err, LoadError::Decode(_)));

        // Valid signature, truncated body.
        let mut truncated = png_bytes(4, 4);
        truncated.truncate(24);
        assert!(matches!(decode_rgba(&truncated, None), Err(LoadError::Decode(_))));
    }

    #[test]
    fn test_signatureless_format_uses_declared_mime() {
        let tga = encoded(5, 3, ImageFormat::Tga);
        assert!(matches!(decode_rgba(&tga, None), Err(LoadError::Decode(_))));

        let url = to_data_url(ImageFormat::Tga.to_mime_type(), &tga);
        let image = load_source(ImageSource::Reference(url), &BlobStore::new()).unwrap();
        assert_eq!((image.width(), image.height()), (5, 3));
        assert_eq!(image.pixels().get_pixel(4, 2), &Rgba([10, 20, 30, 255]));

        let image = decode_rgba(&tga, Some("image/x-tga; charset=binary")).unwrap();
        assert_eq!(image.width(), 5);
    }

    #[test]
    fn test_signatureless_file_uses_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.tga");
        std::fs::write(&path, encoded(4, 2, ImageFormat::Tga)).unwrap();

        let image = load_source(ImageSource::from(path.as_path()), &BlobStore::new()).unwrap();
        assert_eq!((image.width(), image.height()), (4, 2));
    }

    #[test]
    fn test_mismatched_mime_still_sniffs_content() {
        let image = decode_rgba(&png_bytes(2, 3), Some("image/jpeg")).unwrap();
        assert_eq!(image.height(), 3);
    }

    #[test]
    fn test_bad_data_url_is_read_failure() {
        let err = load_source(
            ImageSource::Reference("data:image/png;base64,!!!".into()),
            &BlobStore::new(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Read(_)));
    }
}
