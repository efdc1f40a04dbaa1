//! The board aggregate: assets, ordered items and configuration.

use crate::asset::{Asset, AssetId, AssetStore};
use crate::config::{BoardConfig, LogoConfig, Template};
use crate::crop::{CropEditor, CropState};
use crate::import::{self, ImageFetcher, ImportError, ImportResult};
use crate::reorder::{self, HasId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a board item.
pub type ItemId = Uuid;

fn one() -> u32 {
    1
}

/// One placement of an asset on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardItem {
    pub id: ItemId,
    pub asset_id: AssetId,
    #[serde(default = "one")]
    pub col_span: u32,
    #[serde(default = "one")]
    pub row_span: u32,
    #[serde(default)]
    pub crop: CropState,
}

impl BoardItem {
    /// Create a 1×1 item with a centered crop.
    pub fn new(asset_id: AssetId) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset_id,
            col_span: 1,
            row_span: 1,
            crop: CropState::default(),
        }
    }
}

impl HasId for BoardItem {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Complete editable state of a board.
#[derive(Debug, Clone, Default)]
pub struct BoardState {
    pub config: BoardConfig,
    pub(crate) assets: AssetStore,
    pub(crate) items: Vec<BoardItem>,
    /// Insertion order of item ids, used by "reset order".
    pub(crate) original_order: Vec<ItemId>,
}

impl BoardState {
    /// Create an empty board with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Items in placement order.
    pub fn items(&self) -> &[BoardItem] {
        &self.items
    }

    /// Look up an item.
    pub fn item(&self, id: ItemId) -> Option<&BoardItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// The asset store.
    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// Item ids in insertion order.
    pub fn original_order(&self) -> &[ItemId] {
        &self.original_order
    }

    /// Resolve an item's asset. `None` for orphaned items.
    pub fn resolve(&self, item: &BoardItem) -> Option<&Asset> {
        self.assets.get(item.asset_id)
    }

    /// Edit the configuration, then clamp it and drop a dangling logo.
    pub fn update_config(&mut self, edit: impl FnOnce(&mut BoardConfig)) {
        edit(&mut self.config);
        self.config.normalize();
        if let Some(logo) = &self.config.logo {
            if !self.assets.contains(logo.asset_id) {
                log::warn!("Logo asset {} is not in the store, clearing logo", logo.asset_id);
                self.config.logo = None;
            }
        }
    }

    /// Apply a canvas preset.
    pub fn apply_template(&mut self, template: Template) {
        self.update_config(|config| config.apply_template(template));
    }

    /// Add an asset to the store without placing it.
    pub fn add_asset(&mut self, asset: Asset) -> AssetId {
        self.assets.insert(asset)
    }

    /// Place an existing asset as a new item at the end of the board.
    pub fn place_asset(&mut self, asset_id: AssetId) -> ImportResult<ItemId> {
        if !self.assets.contains(asset_id) {
            return Err(ImportError::UnknownAsset(asset_id));
        }
        let item = BoardItem::new(asset_id);
        let id = item.id;
        self.items.push(item);
        self.original_order.push(id);
        Ok(id)
    }

    /// Decode bytes into an asset and append an item for it.
    pub fn import(&mut self, name: &str, data: Vec<u8>) -> ImportResult<ItemId> {
        let asset = import::decode_asset(name, data)?;
        let asset_id = self.add_asset(asset);
        let item_id = self.place_asset(asset_id)?;
        log::info!("Imported {} as item {}", name, item_id);
        Ok(item_id)
    }

    /// Import several files, keeping their order and continuing past failures.
    pub fn import_batch<I, N>(&mut self, files: I) -> Vec<ImportResult<ItemId>>
    where
        I: IntoIterator<Item = (N, Vec<u8>)>,
        N: AsRef<str>,
    {
        files
            .into_iter()
            .map(|(name, data)| {
                let result = self.import(name.as_ref(), data);
                if let Err(e) = &result {
                    log::error!("Import failed: {}", e);
                }
                result
            })
            .collect()
    }

    /// Fetch a remote image and append it. Nothing is added on failure.
    pub fn import_url(&mut self, url: &str, fetcher: &dyn ImageFetcher) -> ImportResult<ItemId> {
        let asset = import::fetch_asset(url, fetcher)?;
        let asset_id = self.add_asset(asset);
        self.place_asset(asset_id)
    }

    /// Remove one item. Its asset stays in the store.
    pub fn remove_item(&mut self, id: ItemId) -> Option<BoardItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        self.original_order.retain(|&i| i != id);
        Some(self.items.remove(index))
    }

    /// Remove an asset and every item that uses it.
    pub fn remove_asset(&mut self, id: AssetId) -> Option<Asset> {
        let asset = self.assets.remove(id)?;
        let removed: Vec<ItemId> = self
            .items
            .iter()
            .filter(|item| item.asset_id == id)
            .map(|item| item.id)
            .collect();
        self.items.retain(|item| item.asset_id != id);
        self.original_order.retain(|i| !removed.contains(i));
        if self.config.logo.as_ref().is_some_and(|logo| logo.asset_id == id) {
            self.config.logo = None;
        }
        log::info!("Removed asset {} and {} item(s)", id, removed.len());
        Some(asset)
    }

    /// Remove every item. Assets are kept.
    pub fn clear(&mut self) {
        self.items.clear();
        self.original_order.clear();
    }

    /// Move item `src` in front of item `dest`.
    ///
    /// Ignored in auto layout, where placement is computed.
    pub fn move_before(&mut self, src: ItemId, dest: ItemId) -> bool {
        if !self.config.layout_mode.allows_reorder() {
            return false;
        }
        reorder::move_before(&mut self.items, src, dest)
    }

    /// Restore insertion order. Ignored in auto layout.
    pub fn reset_order(&mut self) -> bool {
        if !self.config.layout_mode.allows_reorder() || self.original_order.is_empty() {
            return false;
        }
        reorder::sort_by_order(&mut self.items, &self.original_order);
        true
    }

    /// Set an item's spans. Columns are clamped to the board's column count.
    pub fn set_span(&mut self, id: ItemId, col_span: u32, row_span: u32) -> bool {
        let columns = self.config.columns.max(1);
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return false;
        };
        item.col_span = col_span.clamp(1, columns);
        item.row_span = row_span.max(1);
        true
    }

    /// Open a crop editor on an item's current crop.
    pub fn crop_editor(&self, id: ItemId) -> Option<CropEditor> {
        self.item(id).map(|item| CropEditor::new(id, item.crop))
    }

    /// Commit a crop to an item.
    pub fn apply_crop(&mut self, id: ItemId, crop: CropState) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return false;
        };
        item.crop = crop.clamped();
        true
    }

    /// Use an asset as the header logo.
    pub fn set_logo(&mut self, asset_id: AssetId) -> ImportResult<()> {
        if !self.assets.contains(asset_id) {
            return Err(ImportError::UnknownAsset(asset_id));
        }
        let (size, rounded) = self
            .config
            .logo
            .as_ref()
            .map(|logo| (logo.size, logo.rounded))
            .unwrap_or((crate::config::DEFAULT_LOGO_SIZE, true));
        self.config.logo = Some(LogoConfig {
            asset_id,
            size,
            rounded,
        });
        Ok(())
    }

    /// Remove the header logo. The asset stays in the store.
    pub fn clear_logo(&mut self) {
        self.config.logo = None;
    }

    /// The logo asset, if set and present.
    pub fn logo(&self) -> Option<&Asset> {
        self.config
            .logo
            .as_ref()
            .and_then(|logo| self.assets.get(logo.asset_id))
    }
}
