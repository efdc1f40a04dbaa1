//! Turning raw bytes, files and URLs into assets.

use crate::asset::{Asset, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// Import errors.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Could not read {name}: {message}")]
    Unreadable { name: String, message: String },
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("Unknown asset: {0}")]
    UnknownAsset(uuid::Uuid),
}

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Source of remote image bytes.
///
/// Network access lives outside the core crate; callers inject it.
pub trait ImageFetcher {
    /// Download `url`, returning the body and an optional content type.
    fn fetch(&self, url: &str) -> Result<(Vec<u8>, Option<String>), String>;
}

/// Decode enough of `data` to build an asset.
///
/// The format is taken from the magic bytes, falling back to the name's
/// extension. Only the header is parsed to obtain the natural size.
pub fn decode_asset(name: &str, data: Vec<u8>) -> ImportResult<Asset> {
    let format = ImageFormat::from_magic_bytes(&data)
        .or_else(|| {
            Path::new(name)
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(ImageFormat::from_extension)
        })
        .ok_or_else(|| ImportError::UnsupportedFormat(name.to_string()))?;

    let (width, height) = image::ImageReader::new(Cursor::new(&data))
        .with_guessed_format()
        .map_err(|e| ImportError::Unreadable {
            name: name.to_string(),
            message: e.to_string(),
        })?
        .into_dimensions()
        .map_err(|e| ImportError::Unreadable {
            name: name.to_string(),
            message: e.to_string(),
        })?;

    Ok(Asset::new(name, data, width, height, format))
}

/// Fetch and decode a remote image.
pub fn fetch_asset(url: &str, fetcher: &dyn ImageFetcher) -> ImportResult<Asset> {
    let (data, content_type) = fetcher.fetch(url).map_err(|message| ImportError::Fetch {
        url: url.to_string(),
        message,
    })?;

    if let Some(mime) = content_type.as_deref() {
        if mime.starts_with("image/") && ImageFormat::from_mime_type(mime).is_none() {
            return Err(ImportError::UnsupportedFormat(mime.to_string()));
        }
    }

    decode_asset(name_from_url(url), data)
}

/// Last path segment of a URL, without query or fragment.
fn name_from_url(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
}

/// Check whether a path has a supported image extension.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageFormat::from_extension)
        .is_some()
}

/// Read and decode an image file.
pub fn read_image_file(path: &Path) -> ImportResult<Asset> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let data = std::fs::read(path).map_err(|e| ImportError::Unreadable {
        name: name.clone(),
        message: e.to_string(),
    })?;
    decode_asset(&name, data)
}

#[cfg(test)]
pub(crate) mod test_images {
    use image::{ImageFormat as Codec, Rgba, RgbaImage};
    use std::io::Cursor;

    /// Encode a solid-colour PNG of the given size.
    pub fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, Codec::Png).unwrap();
        out.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticFetcher(Result<Vec<u8>, String>);

    impl ImageFetcher for StaticFetcher {
        fn fetch(&self, _url: &str) -> Result<(Vec<u8>, Option<String>), String> {
            self.0.clone().map(|data| (data, Some("image/png".to_string())))
        }
    }

    #[test]
    fn test_decode_reads_dimensions() {
        let asset = decode_asset("red.png", test_images::png(30, 20, [255, 0, 0, 255])).unwrap();
        assert_eq!((asset.width, asset.height), (30, 20));
        assert_eq!(asset.format, ImageFormat::Png);
        assert_eq!(asset.name, "red.png");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode_asset("notes.txt", b"hello world".to_vec());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));

        // Right extension, broken payload
        let result = decode_asset("broken.png", b"not really a png".to_vec());
        assert!(matches!(result, Err(ImportError::Unreadable { .. })));
    }

    #[test]
    fn test_fetch_asset() {
        let fetcher = StaticFetcher(Ok(test_images::png(4, 4, [0, 0, 0, 255])));
        let asset = fetch_asset("https://example.com/img/cat.png?size=large", &fetcher).unwrap();
        assert_eq!(asset.name, "cat.png");

        let failing = StaticFetcher(Err("connection refused".to_string()));
        let result = fetch_asset("https://example.com/cat.png", &failing);
        assert!(matches!(result, Err(ImportError::Fetch { .. })));
    }

    #[test]
    fn test_read_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, test_images::png(8, 6, [0, 128, 0, 255])).unwrap();

        assert!(is_image_path(&path));
        assert!(!is_image_path(Path::new("notes.txt")));

        let asset = read_image_file(&path).unwrap();
        assert_eq!((asset.width, asset.height), (8, 6));

        let missing = read_image_file(&dir.path().join("missing.png"));
        assert!(matches!(missing, Err(ImportError::Unreadable { .. })));
    }
}
