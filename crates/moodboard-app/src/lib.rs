//! Moodboard Application
//!
//! Command-line shell over board project files: editing commands,
//! clipboard paste, keyboard shortcuts and export delivery.

mod cli;
mod clipboard;
mod commands;
mod config;
mod delivery;
mod error;
mod shortcuts;

pub use cli::{Cli, Commands, DEFAULT_BOARD, SetArgs};
pub use commands::{App, find_asset, find_item};
pub use config::AppConfig;
pub use delivery::{DownloadDelivery, detect_delivery, has_desktop_session};
pub use error::{AppError, AppResult};
pub use shortcuts::{Shortcut, ShortcutAction, ShortcutRegistry};

#[cfg(feature = "native")]
pub use delivery::SaveDialogDelivery;

use moodboard_core::storage::create_default_cache;

/// Load config and the asset cache, then run the parsed command.
pub fn run(cli: Cli) -> AppResult<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };
    let cache = if cli.no_cache {
        None
    } else {
        match create_default_cache() {
            Ok(cache) => Some(cache),
            Err(e) => {
                log::warn!("Asset cache unavailable: {}", e);
                None
            }
        }
    };
    App::new(config, cache).execute(&cli.board, cli.command)
}
