//! Snapshot export: freeze the view, rasterize, encode, deliver, restore.

use crate::encode::{EncodeError, ExportFormat};
use crate::renderer::{RenderContext, Rasterizer, RendererError};
use moodboard_core::{BoardState, ViewState};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Output pixels per CSS pixel for exports.
pub const EXPORT_PIXEL_RATIO: f64 = 2.0;

/// Delivery errors.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Unavailable(String),
}

/// What happened to the exported bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Written to this file.
    Saved(PathBuf),
    /// The user dismissed the save prompt.
    Cancelled,
}

/// Hands finished export bytes to the user.
pub trait Delivery {
    /// Save `bytes`, proposing `suggested_name` as the file name.
    fn save(&mut self, bytes: &[u8], suggested_name: &str) -> Result<DeliveryOutcome, DeliveryError>;
}

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export failed. Try smaller board or local images.")]
    EmptyRaster,
    #[error("An export is already in progress")]
    Busy,
    #[error("Render failed: {0}")]
    Render(#[from] RendererError),
    #[error("Encoding failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("Could not save export: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Shared "export in progress" flag.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an export is running.
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Mark busy, or `None` if already busy. Dropping the guard clears the flag.
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard(self.0.clone()))
    }
}

/// Clears the busy flag on drop.
#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A view switched to export settings. Dropping it restores the view.
pub struct Snapshot<'a> {
    view: &'a mut ViewState,
    saved: Option<ViewState>,
}

impl<'a> Snapshot<'a> {
    /// Freeze `view` at the board's resolved export size.
    pub fn freeze(view: &'a mut ViewState, board: &BoardState) -> Self {
        let saved = view.freeze(board);
        Self {
            view,
            saved: Some(saved),
        }
    }

    /// The frozen view.
    pub fn view(&self) -> &ViewState {
        self.view
    }
}

impl Drop for Snapshot<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.view.restore(saved);
        }
    }
}

/// Summary of a finished export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub format: ExportFormat,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
    pub outcome: DeliveryOutcome,
}

/// Runs exports with a rasterizer.
pub struct Exporter<R: Rasterizer> {
    rasterizer: R,
    busy: BusyFlag,
    pixel_ratio: f64,
}

impl<R: Rasterizer> Exporter<R> {
    /// Create an exporter rendering at the export pixel ratio.
    pub fn new(rasterizer: R) -> Self {
        Self {
            rasterizer,
            busy: BusyFlag::new(),
            pixel_ratio: EXPORT_PIXEL_RATIO,
        }
    }

    /// Share a busy flag with UI code.
    pub fn with_busy_flag(mut self, busy: BusyFlag) -> Self {
        self.busy = busy;
        self
    }

    /// Override the pixel ratio.
    pub fn with_pixel_ratio(mut self, pixel_ratio: f64) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    /// A handle to the busy flag.
    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    /// Check if an export is running.
    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Rasterize and encode without delivering. Returns bytes and pixel size.
    pub fn render(
        &mut self,
        board: &BoardState,
        view: &mut ViewState,
        format: ExportFormat,
    ) -> Result<(Vec<u8>, (u32, u32)), ExportError> {
        let _busy = self.busy.try_acquire().ok_or(ExportError::Busy)?;
        self.render_frozen(board, view, format)
    }

    fn render_frozen(
        &mut self,
        board: &BoardState,
        view: &mut ViewState,
        format: ExportFormat,
    ) -> Result<(Vec<u8>, (u32, u32)), ExportError> {
        let snapshot = Snapshot::freeze(view, board);
        let ctx = RenderContext::new(board, snapshot.view())
            .with_pixel_ratio(self.pixel_ratio)
            .with_overlays(false);
        let image = self.rasterizer.rasterize(&ctx)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(ExportError::EmptyRaster);
        }
        let bytes = format.encode(&image)?;
        Ok((bytes, image.dimensions()))
    }

    /// Export the board and hand the file to `delivery`.
    ///
    /// The view is restored before delivery and on every failure.
    pub fn export(
        &mut self,
        board: &BoardState,
        view: &mut ViewState,
        format: ExportFormat,
        delivery: &mut dyn Delivery,
    ) -> Result<ExportReport, ExportError> {
        let result = self.try_export(board, view, format, delivery);
        match &result {
            Ok(report) => log::info!(
                "Exported {} ({}x{}, {} bytes): {:?}",
                report.file_name,
                report.width,
                report.height,
                report.bytes,
                report.outcome
            ),
            Err(e) => log::error!("Export failed: {}", e),
        }
        result
    }

    fn try_export(
        &mut self,
        board: &BoardState,
        view: &mut ViewState,
        format: ExportFormat,
        delivery: &mut dyn Delivery,
    ) -> Result<ExportReport, ExportError> {
        let _busy = self.busy.try_acquire().ok_or(ExportError::Busy)?;
        let (bytes, (width, height)) = self.render_frozen(board, view, format)?;
        let file_name = format.file_name();
        let outcome = delivery.save(&bytes, &file_name)?;
        Ok(ExportReport {
            format,
            file_name,
            width,
            height,
            bytes: bytes.len(),
            outcome,
        })
    }
}
