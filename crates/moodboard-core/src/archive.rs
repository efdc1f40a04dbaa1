//! `.board` project files: a stored ZIP with `meta.json` and the image files.

use crate::asset::{Asset, AssetId, ImageFormat};
use crate::board::{BoardItem, BoardState, ItemId};
use crate::config::BoardConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Newest project schema this build reads and the one it writes.
pub const SCHEMA_VERSION: u32 = 1;
/// Metadata entry name.
pub const META_ENTRY: &str = "meta.json";
/// Directory holding image files.
pub const ASSET_DIR: &str = "assets";
/// File stem used for the logo image.
pub const LOGO_STEM: &str = "logo";
/// Project file extension.
pub const PROJECT_EXTENSION: &str = "board";
/// Version recorded in written projects.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Project file errors.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Unsupported project version: {0}")]
    UnsupportedVersion(String),
    #[error("Invalid project metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("Missing archive entry: {0}")]
    MissingEntry(String),
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for project file operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Contents of `meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub schema: u32,
    #[serde(default)]
    pub app_version: String,
    pub board: BoardMeta,
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
}

/// Board section of the metadata: config fields plus the item list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardMeta {
    #[serde(flatten)]
    pub config: BoardConfig,
    #[serde(default)]
    pub images: Vec<BoardItem>,
    /// Insertion order of the items, restored by a reset.
    #[serde(default, rename = "originalOrder", skip_serializing_if = "Vec::is_empty")]
    pub original_order: Vec<ItemId>,
}

/// One image file in the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub w: u32,
    #[serde(default)]
    pub h: u32,
    pub file: String,
}

impl AssetRecord {
    fn new(asset: &Asset, file: String) -> Self {
        Self {
            id: asset.id(),
            name: asset.name.clone(),
            w: asset.width,
            h: asset.height,
            file,
        }
    }
}

/// Serialize a board into project bytes.
pub fn pack(board: &BoardState) -> ArchiveResult<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let mut files: Vec<(String, &Asset)> = Vec::new();
    let mut packed = HashSet::new();
    for item in board.items() {
        if !packed.insert(item.asset_id) {
            continue;
        }
        match board.assets().get(item.asset_id) {
            Some(asset) => files.push((
                format!("{}/{}.{}", ASSET_DIR, asset.id(), asset.format.extension()),
                asset,
            )),
            None => log::warn!("Item {} references missing asset {}", item.id, item.asset_id),
        }
    }
    if let Some(logo) = board.logo() {
        files.push((
            format!("{}/{}.{}", ASSET_DIR, LOGO_STEM, logo.format.extension()),
            logo,
        ));
    }

    let meta = ProjectMeta {
        schema: SCHEMA_VERSION,
        app_version: APP_VERSION.to_string(),
        board: BoardMeta {
            config: board.config.clone(),
            images: board.items().to_vec(),
            original_order: board.original_order().to_vec(),
        },
        assets: files
            .iter()
            .map(|(file, asset)| AssetRecord::new(asset, file.clone()))
            .collect(),
    };

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file(META_ENTRY, options)?;
    zip.write_all(&serde_json::to_vec_pretty(&meta)?)?;
    for (file, asset) in &files {
        zip.start_file(file.as_str(), options)?;
        zip.write_all(asset.data())?;
    }
    let bytes = zip.finish()?.into_inner();

    log::info!(
        "Packed project with {} item(s) and {} file(s), {} bytes",
        board.items().len(),
        files.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Check the schema before any typed parsing.
fn check_schema(meta: &serde_json::Value) -> ArchiveResult<()> {
    match meta.get("schema").and_then(|s| s.as_u64()) {
        Some(version) if version >= 1 && version <= SCHEMA_VERSION as u64 => Ok(()),
        Some(version) => Err(ArchiveError::UnsupportedVersion(version.to_string())),
        None => Err(ArchiveError::UnsupportedVersion(
            meta.get("schema")
                .map(|s| s.to_string())
                .unwrap_or_else(|| "missing".to_string()),
        )),
    }
}

/// Parse project bytes into a new board.
pub fn unpack(bytes: &[u8]) -> ArchiveResult<BoardState> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))?;

    let mut json = String::new();
    match zip.by_name(META_ENTRY) {
        Ok(mut entry) => {
            entry.read_to_string(&mut json)?;
        }
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ArchiveError::MissingEntry(META_ENTRY.to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    let value: serde_json::Value = serde_json::from_str(&json)?;
    check_schema(&value)?;
    let meta: ProjectMeta = serde_json::from_value(value)?;

    let mut board = BoardState::new();
    for record in &meta.assets {
        if board.assets.contains(record.id) {
            continue;
        }
        let mut data = Vec::new();
        match zip.by_name(&record.file) {
            Ok(mut entry) => {
                entry.read_to_end(&mut data)?;
            }
            Err(zip::result::ZipError::FileNotFound) => {
                log::warn!("Project is missing {}, skipping asset {}", record.file, record.id);
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        let format = Path::new(&record.file)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ImageFormat::from_extension)
            .or_else(|| ImageFormat::from_magic_bytes(&data));
        let Some(format) = format else {
            log::warn!("Unknown image type for {}, skipping", record.file);
            continue;
        };

        board.assets.insert(Asset::with_id(
            record.id,
            record.name.clone(),
            data,
            record.w,
            record.h,
            format,
        ));
    }

    let mut seen = HashSet::new();
    for mut item in meta.board.images {
        if !seen.insert(item.id) {
            log::warn!("Duplicate item {} in project, skipping", item.id);
            continue;
        }
        if !board.assets.contains(item.asset_id) {
            log::warn!("Item {} has no image, keeping as placeholder", item.id);
        }
        item.crop = item.crop.clamped();
        item.col_span = item.col_span.max(1);
        item.row_span = item.row_span.max(1);
        board.items.push(item);
    }

    // Saved order first, then anything it misses in image order
    let mut ordered = HashSet::new();
    board.original_order = meta
        .board
        .original_order
        .iter()
        .chain(board.items.iter().map(|item| &item.id))
        .copied()
        .filter(|id| seen.contains(id) && ordered.insert(*id))
        .collect();

    board.config = meta.board.config;
    board.config.normalize();
    if let Some(logo) = &board.config.logo {
        if !board.assets.contains(logo.asset_id) {
            log::warn!("Logo image missing from project, clearing logo");
            board.config.logo = None;
        }
    }

    log::info!(
        "Loaded project (app {}) with {} item(s) and {} asset(s)",
        if meta.app_version.is_empty() { "unknown" } else { meta.app_version.as_str() },
        board.items.len(),
        board.assets.len()
    );
    Ok(board)
}

impl BoardState {
    /// Serialize into project bytes.
    pub fn to_archive(&self) -> ArchiveResult<Vec<u8>> {
        pack(self)
    }

    /// Build a board from project bytes.
    pub fn from_archive(bytes: &[u8]) -> ArchiveResult<Self> {
        unpack(bytes)
    }

    /// Replace this board with the project in `bytes`.
    ///
    /// On error the board is left untouched.
    pub fn load_archive(&mut self, bytes: &[u8]) -> ArchiveResult<()> {
        *self = unpack(bytes)?;
        Ok(())
    }

    /// Write the project to a file.
    pub fn save_to_path(&self, path: &Path) -> ArchiveResult<()> {
        let bytes = pack(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a project from a file.
    pub fn open_path(path: &Path) -> ArchiveResult<Self> {
        let bytes = std::fs::read(path)?;
        unpack(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LayoutMode, LogoConfig};
    use crate::crop::CropState;
    use crate::import::test_images;

    fn sample_board() -> BoardState {
        let mut board = BoardState::new();
        let a = board.import("a.png", test_images::png(6, 4, [255, 0, 0, 255])).unwrap();
        let b = board.import("b.png", test_images::png(3, 9, [0, 0, 255, 255])).unwrap();
        let logo = board.add_asset(
            crate::import::decode_asset("logo.png", test_images::png(2, 2, [0, 0, 0, 255]))
                .unwrap(),
        );
        board.update_config(|c| {
            c.title = "Autumn".to_string();
            c.layout_mode = LayoutMode::Square;
            c.gap = 6;
            c.logo = Some(LogoConfig {
                asset_id: logo,
                size: 48,
                rounded: false,
            });
        });
        board.set_span(a, 2, 3);
        board.apply_crop(b, CropState::new(10.0, 80.0, 1.5));
        board.move_before(b, a);
        board
    }

    fn rewrite_meta(bytes: &[u8], mut edit: impl FnMut(&mut serde_json::Value)) -> Vec<u8> {
        let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).unwrap();
            let name = entry.name().to_string();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            if name == META_ENTRY {
                let mut value: serde_json::Value = serde_json::from_slice(&data).unwrap();
                edit(&mut value);
                data = serde_json::to_vec(&value).unwrap();
            }
            out.start_file(name.as_str(), options).unwrap();
            out.write_all(&data).unwrap();
        }
        out.finish().unwrap().into_inner()
    }

    #[test]
    fn test_round_trip() {
        let board = sample_board();
        let bytes = board.to_archive().unwrap();
        let loaded = BoardState::from_archive(&bytes).unwrap();

        assert_eq!(loaded.config, board.config);
        assert_eq!(loaded.items(), board.items());
        for item in board.items() {
            let original = board.resolve(item).unwrap();
            let restored = loaded.resolve(item).unwrap();
            assert_eq!(restored.data(), original.data());
            assert_eq!((restored.width, restored.height), (original.width, original.height));
        }
        assert_eq!(loaded.logo().unwrap().data(), board.logo().unwrap().data());
    }

    #[test]
    fn test_layout_of_archive() {
        let board = sample_board();
        let bytes = board.to_archive().unwrap();
        let mut zip = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();

        assert_eq!(zip.by_index(0).unwrap().name(), META_ENTRY);
        assert!(zip.by_name("assets/logo.png").is_ok());
        for item in board.items() {
            let name = format!("assets/{}.png", item.asset_id);
            let entry = zip.by_name(&name).unwrap();
            assert_eq!(entry.compression(), zip::CompressionMethod::Stored);
        }

        let mut json = String::new();
        zip.by_name(META_ENTRY).unwrap().read_to_string(&mut json).unwrap();
        let meta: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(meta["schema"], 1);
        assert_eq!(meta["board"]["layoutMode"], "square");
        assert!(meta["board"]["images"][0]["colSpan"].is_number());
        assert!(meta["assets"][0]["w"].is_number());
    }

    #[test]
    fn test_unassigned_assets_are_not_packed() {
        let mut board = sample_board();
        let stray = board.add_asset(
            crate::import::decode_asset("stray.png", test_images::png(1, 1, [9, 9, 9, 255]))
                .unwrap(),
        );
        let loaded = BoardState::from_archive(&board.to_archive().unwrap()).unwrap();
        assert!(!loaded.assets().contains(stray));
    }

    #[test]
    fn test_newer_schema_rejected_without_touching_state() {
        let mut board = sample_board();
        let before = board.items().to_vec();
        let bytes = rewrite_meta(&BoardState::new().to_archive().unwrap(), |meta| {
            meta["schema"] = serde_json::json!(2);
        });

        let result = board.load_archive(&bytes);
        assert!(matches!(result, Err(ArchiveError::UnsupportedVersion(v)) if v == "2"));
        assert_eq!(board.items(), before.as_slice());
    }

    #[test]
    fn test_missing_schema_rejected() {
        let bytes = rewrite_meta(&BoardState::new().to_archive().unwrap(), |meta| {
            meta.as_object_mut().unwrap().remove("schema");
        });
        assert!(matches!(
            BoardState::from_archive(&bytes),
            Err(ArchiveError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_old_files_get_defaults() {
        let bytes = rewrite_meta(&sample_board().to_archive().unwrap(), |meta| {
            let board = meta["board"].as_object_mut().unwrap();
            board.remove("shadow");
            board.remove("padding");
            board.insert("showText".to_string(), serde_json::json!(0));
            for image in board["images"].as_array_mut().unwrap() {
                image.as_object_mut().unwrap().remove("crop");
            }
        });
        let loaded = BoardState::from_archive(&bytes).unwrap();
        assert!(loaded.config.shadow);
        assert_eq!(loaded.config.padding, 24);
        assert!(!loaded.config.show_text);
        assert!(loaded.items().iter().all(|i| i.crop == CropState::default()));
    }

    #[test]
    fn test_missing_asset_file_is_skipped() {
        let board = sample_board();
        let victim = board.items()[0].asset_id;
        let bytes = rewrite_meta(&board.to_archive().unwrap(), |meta| {
            for record in meta["assets"].as_array_mut().unwrap() {
                if record["id"] == victim.to_string() {
                    record["file"] = serde_json::json!("assets/gone.png");
                }
            }
        });

        let loaded = BoardState::from_archive(&bytes).unwrap();
        assert_eq!(loaded.items().len(), 2);
        assert!(loaded.resolve(&loaded.items()[0]).is_none());
        assert!(loaded.resolve(&loaded.items()[1]).is_some());
    }

    #[test]
    fn test_original_order_survives_reopen() {
        let board = sample_board();
        let original = board.original_order().to_vec();
        assert_ne!(board.items()[0].id, original[0]);

        let mut loaded = BoardState::from_archive(&board.to_archive().unwrap()).unwrap();
        assert_eq!(loaded.original_order(), original.as_slice());
        loaded.reset_order();
        let ids: Vec<_> = loaded.items().iter().map(|i| i.id).collect();
        assert_eq!(ids, original);
    }

    #[test]
    fn test_original_order_defaults_and_drops_stale_ids() {
        let board = sample_board();
        let item_ids: Vec<String> = board.items().iter().map(|i| i.id.to_string()).collect();

        let without = rewrite_meta(&board.to_archive().unwrap(), |meta| {
            meta["board"].as_object_mut().unwrap().remove("originalOrder");
        });
        let loaded = BoardState::from_archive(&without).unwrap();
        let ids: Vec<_> = loaded.items().iter().map(|i| i.id).collect();
        assert_eq!(loaded.original_order(), ids.as_slice());

        let stale = rewrite_meta(&board.to_archive().unwrap(), |meta| {
            meta["board"]["originalOrder"] =
                serde_json::json!([uuid::Uuid::new_v4().to_string(), item_ids[1]]);
        });
        let loaded = BoardState::from_archive(&stale).unwrap();
        let order: Vec<String> = loaded.original_order().iter().map(|id| id.to_string()).collect();
        assert_eq!(order, vec![item_ids[1].clone(), item_ids[0].clone()]);
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            BoardState::from_archive(b"definitely not a zip"),
            Err(ArchiveError::Zip(_))
        ));
    }

    #[test]
    fn test_save_and_open_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spring.board");
        let board = sample_board();
        board.save_to_path(&path).unwrap();
        let loaded = BoardState::open_path(&path).unwrap();
        assert_eq!(loaded.items(), board.items());
    }
}
