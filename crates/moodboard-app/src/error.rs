//! Application error type.

use moodboard_core::storage::StorageError;
use moodboard_core::{ArchiveError, ImportError};
use moodboard_render::{ExportError, RendererError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to the user by the command line.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Render(#[from] RendererError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Invalid config file: {0}")]
    Config(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Board file not found: {}", .0.display())]
    BoardNotFound(PathBuf),
    #[error("{} already exists (use --force to overwrite)", .0.display())]
    BoardExists(PathBuf),
    #[error("No item matches '{0}'")]
    UnknownItem(String),
    #[error("'{0}' matches more than one item")]
    AmbiguousItem(String),
    #[error("No asset matches '{0}'")]
    UnknownAsset(String),
    #[error("Clipboard error: {0}")]
    Clipboard(String),
    #[error("{0}")]
    Unsupported(String),
}

/// Result type for application operations.
pub type AppResult<T> = Result<T, AppError>;
