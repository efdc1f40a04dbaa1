//! Moodboard Core Library
//!
//! Platform-agnostic data structures and logic for the Moodboard editor:
//! assets, board items, layout, crop, reordering and project files.

pub mod archive;
pub mod asset;
pub mod board;
pub mod config;
pub mod crop;
pub mod import;
pub mod layout;
pub mod reorder;
pub mod storage;
pub mod view;

pub use archive::{ArchiveError, ArchiveResult, PROJECT_EXTENSION};
pub use asset::{Asset, AssetId, AssetStore, ImageFormat};
pub use board::{BoardItem, BoardState, ItemId};
pub use config::{BoardConfig, LayoutMode, LogoConfig, Template};
pub use crop::{CropCommand, CropEditor, CropKey, CropState, NudgeDirection};
pub use import::{ImageFetcher, ImportError, ImportResult};
pub use layout::{
    BoardLayout, ContainerDirective, ImageFit, ItemPlacement, LayoutEngine, Surface,
    compute_layout,
};
pub use view::ViewState;
