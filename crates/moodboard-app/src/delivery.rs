//! Getting exported files to the user.
//!
//! With a desktop session the native save dialog is used. Otherwise the
//! file is written straight into the downloads directory.

use crate::config::AppConfig;
use moodboard_render::{Delivery, DeliveryError, DeliveryOutcome};
use std::path::{Path, PathBuf};

/// Writes exports into a directory without asking.
pub struct DownloadDelivery {
    dir: PathBuf,
}

impl DownloadDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First free path for `name`, appending ` (n)` to the stem.
    fn free_path(&self, name: &str) -> PathBuf {
        let candidate = self.dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) => (stem, format!(".{}", ext)),
            None => (name, String::new()),
        };
        (1..)
            .map(|n| self.dir.join(format!("{} ({}){}", stem, n, ext)))
            .find(|path| !path.exists())
            .unwrap_or(candidate)
    }
}

impl Delivery for DownloadDelivery {
    fn save(&mut self, bytes: &[u8], suggested_name: &str) -> Result<DeliveryOutcome, DeliveryError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.free_path(suggested_name);
        std::fs::write(&path, bytes)?;
        Ok(DeliveryOutcome::Saved(path))
    }
}

/// Asks where to save with the native file dialog.
#[cfg(feature = "native")]
pub struct SaveDialogDelivery {
    start_dir: Option<PathBuf>,
}

#[cfg(feature = "native")]
impl SaveDialogDelivery {
    pub fn new(start_dir: Option<PathBuf>) -> Self {
        Self { start_dir }
    }
}

#[cfg(feature = "native")]
impl Delivery for SaveDialogDelivery {
    fn save(&mut self, bytes: &[u8], suggested_name: &str) -> Result<DeliveryOutcome, DeliveryError> {
        let ext = Path::new(suggested_name)
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut dialog = rfd::FileDialog::new()
            .set_title("Export Moodboard")
            .set_file_name(suggested_name)
            .add_filter(ext.to_uppercase(), &[ext.as_str()]);
        if let Some(dir) = &self.start_dir {
            dialog = dialog.set_directory(dir);
        }

        match dialog.save_file() {
            Some(path) => {
                std::fs::write(&path, bytes)?;
                Ok(DeliveryOutcome::Saved(path))
            }
            None => Ok(DeliveryOutcome::Cancelled),
        }
    }
}

/// Whether a graphical session is available, given an environment lookup.
pub fn has_desktop_session_with(lookup: impl Fn(&str) -> Option<String>) -> bool {
    if cfg!(any(target_os = "macos", target_os = "windows")) {
        return true;
    }
    ["WAYLAND_DISPLAY", "DISPLAY"]
        .iter()
        .any(|var| lookup(var).is_some_and(|value| !value.is_empty()))
}

/// Whether a graphical session is available right now.
pub fn has_desktop_session() -> bool {
    has_desktop_session_with(|var| std::env::var(var).ok())
}

/// Pick a delivery for the current environment. Checked on every call.
pub fn detect_delivery(config: &AppConfig) -> Box<dyn Delivery> {
    #[cfg(feature = "native")]
    if has_desktop_session() {
        log::debug!("Desktop session found, using save dialog");
        return Box::new(SaveDialogDelivery::new(config.output_dir.clone()));
    }
    let dir = config.download_dir();
    log::debug!("Saving exports into {}", dir.display());
    Box::new(DownloadDelivery::new(dir))
}
