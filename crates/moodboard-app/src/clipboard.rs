//! Clipboard image paste.

use crate::error::{AppError, AppResult};

/// Name given to pasted images.
pub const PASTED_IMAGE_NAME: &str = "clipboard.png";

/// Encode raw RGBA pixels as PNG.
pub fn rgba_to_png(width: u32, height: u32, rgba: &[u8]) -> AppResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| AppError::Clipboard(format!("Failed to write PNG header: {}", e)))?;
        writer
            .write_image_data(rgba)
            .map_err(|e| AppError::Clipboard(format!("Failed to encode clipboard image: {}", e)))?;
    }
    Ok(png_data)
}

/// Read the clipboard image as PNG bytes.
#[cfg(feature = "native")]
pub fn read_image_png() -> AppResult<Vec<u8>> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| AppError::Clipboard(e.to_string()))?;
    let image = clipboard
        .get_image()
        .map_err(|_| AppError::Clipboard("No image in clipboard".to_string()))?;
    log::info!("Pasted image from clipboard: {}x{}", image.width, image.height);
    rgba_to_png(image.width as u32, image.height as u32, &image.bytes)
}

#[cfg(not(feature = "native"))]
pub fn read_image_png() -> AppResult<Vec<u8>> {
    Err(AppError::Unsupported(
        "Clipboard access needs the native feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_to_png() {
        let pixels = [255, 0, 0, 255, 0, 255, 0, 128];
        let png = rgba_to_png(2, 1, &pixels).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoder = png::Decoder::new(std::io::Cursor::new(png));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        assert_eq!((info.width, info.height), (2, 1));
        assert_eq!(&buf[..info.buffer_size()], &pixels);
    }

    #[test]
    fn test_short_buffer_is_an_error() {
        assert!(matches!(rgba_to_png(4, 4, &[0; 8]), Err(AppError::Clipboard(_))));
    }
}
