//! Raster and document encoders for exported snapshots.

use crate::pdf;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// JPEG quality used for exports.
pub const JPEG_QUALITY: u8 = 95;
/// Stem of suggested export file names.
pub const EXPORT_STEM: &str = "moodboard";

/// Encoding errors.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Export file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    WebP,
    Pdf,
}

impl ExportFormat {
    /// All formats in menu order.
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Png,
        ExportFormat::Jpeg,
        ExportFormat::WebP,
        ExportFormat::Pdf,
    ];

    /// File extension.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::WebP => "webp",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// MIME type.
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::WebP => "image/webp",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// Suggested file name, `moodboard.<ext>`.
    pub fn file_name(self) -> String {
        format!("{}.{}", EXPORT_STEM, self.extension())
    }

    /// Whether this is a plain image format.
    pub fn is_raster(self) -> bool {
        self != ExportFormat::Pdf
    }

    /// Encode a snapshot.
    pub fn encode(self, image: &RgbaImage) -> Result<Vec<u8>, EncodeError> {
        match self {
            ExportFormat::Png => encode_png(image),
            ExportFormat::Jpeg => encode_jpeg(image, JPEG_QUALITY),
            ExportFormat::WebP => encode_webp(image),
            ExportFormat::Pdf => Ok(pdf::encode_pdf(image)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            "webp" => Ok(ExportFormat::WebP),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("Unknown export format: {}", other)),
        }
    }
}

/// Encode RGBA pixel data to PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, EncodeError> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(image.as_raw())?;
    }
    Ok(png_data)
}

/// Encode as baseline JPEG, compositing transparency onto white.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let rgb = pdf::flatten_rgb(image);
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality).write_image(
        &rgb,
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}

/// Encode as lossless WEBP.
pub fn encode_webp(image: &RgbaImage) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    WebPEncoder::new_lossless(&mut out).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}
