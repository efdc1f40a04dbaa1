//! Local cache of imported images and the last open board.
//!
//! Cache writes never block editing: when the backend runs out of space
//! the failure is logged and the in-memory board keeps working.

use crate::asset::{Asset, AssetId};
use crate::board::BoardState;
use crate::storage::{Storage, StorageError, StorageResult};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Key for the last open board archive.
pub const LAST_BOARD_KEY: &str = "__last_board__";

const ASSET_KEY_PREFIX: &str = "asset_";

fn asset_key(id: AssetId) -> String {
    format!("{}{}", ASSET_KEY_PREFIX, id)
}

/// Persists assets and periodically the whole board.
pub struct AssetCache<S: Storage> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    /// Whether the board has unsaved changes.
    dirty: bool,
}

impl<S: Storage> AssetCache<S> {
    /// Create a cache over the given storage backend.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            dirty: false,
        }
    }

    /// Set the auto-save interval.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Get the auto-save interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Mark the board as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Check if the board has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Store an asset's bytes.
    ///
    /// Quota failures are logged and reported as `Ok(false)`.
    pub async fn store_asset(&self, asset: &Asset) -> StorageResult<bool> {
        match self.storage.save(&asset_key(asset.id()), asset.data()).await {
            Ok(()) => Ok(true),
            Err(StorageError::QuotaExceeded { needed, available }) => {
                log::warn!(
                    "Cache full, not caching {} ({} bytes, {} available)",
                    asset.name,
                    needed,
                    available
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Load cached bytes for an asset.
    pub async fn load_asset(&self, id: AssetId) -> StorageResult<Vec<u8>> {
        self.storage.load(&asset_key(id)).await
    }

    /// Drop an asset from the cache.
    pub async fn forget_asset(&self, id: AssetId) -> StorageResult<()> {
        self.storage.delete(&asset_key(id)).await
    }

    /// Ids of every cached asset.
    pub async fn cached_assets(&self) -> StorageResult<Vec<AssetId>> {
        let keys = self.storage.list().await?;
        Ok(keys
            .iter()
            .filter_map(|key| key.strip_prefix(ASSET_KEY_PREFIX))
            .filter_map(|id| id.parse().ok())
            .collect())
    }

    /// Check if enough time has passed for an auto-save.
    pub fn should_save(&self) -> bool {
        if !self.dirty {
            return false;
        }

        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save the board if needed (dirty + interval elapsed).
    /// Returns true if a save was performed.
    pub async fn maybe_save(&mut self, board: &BoardState) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        self.save(board).await
    }

    /// Save the board immediately.
    ///
    /// Returns false when the cache had no room for it.
    pub async fn save(&mut self, board: &BoardState) -> StorageResult<bool> {
        let bytes = board
            .to_archive()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let stored = match self.storage.save(LAST_BOARD_KEY, &bytes).await {
            Ok(()) => true,
            Err(StorageError::QuotaExceeded { needed, available }) => {
                log::warn!(
                    "Cache full, board not saved ({} bytes, {} available)",
                    needed,
                    available
                );
                false
            }
            Err(e) => return Err(e),
        };

        self.last_save = Some(Instant::now());
        self.dirty = false;
        Ok(stored)
    }

    /// Try to restore the last saved board.
    /// Returns None if nothing usable was saved.
    pub async fn load_last(&mut self) -> Option<BoardState> {
        let bytes = self.storage.load(LAST_BOARD_KEY).await.ok()?;
        match BoardState::from_archive(&bytes) {
            Ok(board) => {
                self.dirty = false;
                self.last_save = Some(Instant::now());
                Some(board)
            }
            Err(e) => {
                log::warn!("Discarding unreadable cached board: {}", e);
                None
            }
        }
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

/// Create a cache over the default on-disk location.
pub fn create_default_cache() -> StorageResult<AssetCache<crate::storage::FileStorage>> {
    let storage = crate::storage::FileStorage::default_location()?;
    Ok(AssetCache::new(Arc::new(storage)))
}
