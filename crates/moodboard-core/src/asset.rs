//! Imported source images and the deduplicating asset store.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Unique identifier for an asset.
pub type AssetId = Uuid;

/// Aspect ratio used when an image has no usable dimensions.
pub const DEFAULT_ASPECT: f64 = 4.0 / 3.0;

/// Encoded image format of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format.
    Png,
    /// JPEG format.
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format (first frame is rendered).
    Gif,
    /// Windows bitmap.
    Bmp,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
        }
    }

    /// File extension used for archive entries.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::WebP => "webp",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            "gif" => Some(ImageFormat::Gif),
            "bmp" => Some(ImageFormat::Bmp),
            _ => None,
        }
    }

    /// Detect format from a MIME type such as `image/png`.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/webp" => Some(ImageFormat::WebP),
            "image/gif" => Some(ImageFormat::Gif),
            "image/bmp" => Some(ImageFormat::Bmp),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        if data.starts_with(b"GIF8") {
            return Some(ImageFormat::Gif);
        }

        if data.starts_with(b"BM") {
            return Some(ImageFormat::Bmp);
        }

        None
    }
}

/// Encode raw bytes as a `data:` URL.
pub fn encode_data_url(format: ImageFormat, data: &[u8]) -> String {
    format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(data))
}

/// Decode a base64 `data:` URL into its format and raw bytes.
///
/// Returns `None` for non-base64 URLs or unknown image MIME types.
pub fn decode_data_url(url: &str) -> Option<(ImageFormat, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    let format = ImageFormat::from_mime_type(mime)?;
    let data = STANDARD.decode(payload.trim()).ok()?;
    Some((format, data))
}

/// A unique imported image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub(crate) id: AssetId,
    /// Display name (usually the source file name).
    pub name: String,
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// Encoded format of `data`.
    pub format: ImageFormat,
    data: Vec<u8>,
}

impl Asset {
    /// Create a new asset from encoded image bytes.
    pub fn new(
        name: impl Into<String>,
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: ImageFormat,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), name, data, width, height, format)
    }

    /// Create an asset with a known id (used when restoring projects).
    pub fn with_id(
        id: AssetId,
        name: impl Into<String>,
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: ImageFormat,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            width,
            height,
            format,
            data,
        }
    }

    /// The asset id.
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Encoded image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Size of the encoded payload in bytes.
    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    /// Width divided by height, falling back to 4:3 for degenerate sizes.
    pub fn aspect_ratio(&self) -> f64 {
        if self.width == 0 || self.height == 0 {
            DEFAULT_ASPECT
        } else {
            self.width as f64 / self.height as f64
        }
    }

    /// Encode the asset as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        encode_data_url(self.format, &self.data)
    }

    fn digest(data: &[u8]) -> u64 {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        hasher.finish()
    }
}

/// Holds every imported image exactly once.
///
/// Importing bytes that are already present returns the existing asset id.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    assets: HashMap<AssetId, Asset>,
    /// Insertion order, for stable listing.
    order: Vec<AssetId>,
    /// Content digest to candidate ids.
    by_digest: HashMap<u64, Vec<AssetId>>,
}

impl AssetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Find an existing asset with exactly these bytes.
    pub fn find_duplicate(&self, data: &[u8]) -> Option<AssetId> {
        let digest = Asset::digest(data);
        self.by_digest.get(&digest)?.iter().copied().find(|id| {
            self.assets
                .get(id)
                .map(|existing| existing.data == data)
                .unwrap_or(false)
        })
    }

    /// Insert an asset, returning the id under which it is stored.
    ///
    /// If identical bytes are already stored, or an asset with the same id
    /// exists, the new asset is dropped and the existing id is returned.
    pub fn insert(&mut self, asset: Asset) -> AssetId {
        if self.assets.contains_key(&asset.id) {
            return asset.id;
        }
        if let Some(existing) = self.find_duplicate(&asset.data) {
            return existing;
        }
        let id = asset.id;
        self.by_digest
            .entry(Asset::digest(&asset.data))
            .or_default()
            .push(id);
        self.order.push(id);
        self.assets.insert(id, asset);
        id
    }

    /// Get an asset by id.
    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(&id)
    }

    /// Check whether an asset exists.
    pub fn contains(&self, id: AssetId) -> bool {
        self.assets.contains_key(&id)
    }

    /// Remove an asset.
    pub fn remove(&mut self, id: AssetId) -> Option<Asset> {
        let asset = self.assets.remove(&id)?;
        self.order.retain(|&a| a != id);
        let digest = Asset::digest(&asset.data);
        if let Some(ids) = self.by_digest.get_mut(&digest) {
            ids.retain(|&a| a != id);
            if ids.is_empty() {
                self.by_digest.remove(&digest);
            }
        }
        Some(asset)
    }

    /// Iterate assets in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.order.iter().filter_map(|id| self.assets.get(id))
    }

    /// Assets whose name contains `query` (case-insensitive).
    pub fn search<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a Asset> + 'a {
        let needle = query.to_lowercase();
        self.iter()
            .filter(move |asset| asset.name.to_lowercase().contains(&needle))
    }

    /// Number of stored assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Remove all assets.
    pub fn clear(&mut self) {
        self.assets.clear();
        self.order.clear();
        self.by_digest.clear();
    }
}
