//! Rasterizer trait abstraction.

use image::RgbaImage;
use kurbo::{Rect, Size};
use moodboard_core::config::LayoutMode;
use moodboard_core::layout::BoardLayout;
use moodboard_core::{BoardState, ItemId, ViewState};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Font error: {0}")]
    Font(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Tile corner radius when rounding is on.
pub const TILE_RADIUS: f64 = 12.0;
/// Logo corner radius when it is not drawn as a circle.
pub const LOGO_RADIUS: f64 = 12.0;
/// Vertical shadow offset.
pub const SHADOW_OFFSET_Y: f64 = 8.0;
/// Shadow blur radius.
pub const SHADOW_BLUR: f64 = 24.0;
/// Shadow opacity.
pub const SHADOW_ALPHA: f64 = 0.08;
/// Delete and crop button diameter.
pub const BUTTON_SIZE: f64 = 32.0;
/// Distance of buttons and chips from the tile edge.
pub const OVERLAY_INSET: f64 = 8.0;
/// Resize handle edge length.
pub const RESIZE_HANDLE_SIZE: f64 = 22.0;
/// Resize handle distance from the bottom-right corner.
pub const RESIZE_HANDLE_INSET: f64 = 6.0;
/// Drag chip size.
pub const DRAG_CHIP_SIZE: Size = Size::new(28.0, 20.0);

/// Editing affordances drawn on top of the board.
///
/// None of these appear in exports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Overlay {
    DragHandle(Rect),
    DeleteButton(Rect),
    CropButton(Rect),
    ResizeHandle(Rect),
    SafeMargin(Rect),
}

/// Overlays for the current layout and view.
pub fn overlays(layout: &BoardLayout, mode: LayoutMode, view: &ViewState) -> Vec<Overlay> {
    let mut out = Vec::new();
    for placement in &layout.items {
        let rect = placement.rect;
        if mode.allows_reorder() {
            out.push(Overlay::DragHandle(Rect::from_origin_size(
                (rect.x0 + OVERLAY_INSET, rect.y0 + OVERLAY_INSET),
                DRAG_CHIP_SIZE,
            )));
        }
        let delete = Rect::from_origin_size(
            (rect.x1 - OVERLAY_INSET - BUTTON_SIZE, rect.y0 + OVERLAY_INSET),
            (BUTTON_SIZE, BUTTON_SIZE),
        );
        out.push(Overlay::DeleteButton(delete));
        if mode == LayoutMode::Square {
            out.push(Overlay::CropButton(delete - kurbo::Vec2::new(BUTTON_SIZE + 4.0, 0.0)));
            out.push(Overlay::ResizeHandle(Rect::new(
                rect.x1 - RESIZE_HANDLE_INSET - RESIZE_HANDLE_SIZE,
                rect.y1 - RESIZE_HANDLE_INSET - RESIZE_HANDLE_SIZE,
                rect.x1 - RESIZE_HANDLE_INSET,
                rect.y1 - RESIZE_HANDLE_INSET,
            )));
        }
    }
    if let Some(guide) = view.safe_margin_rect(layout.size) {
        out.push(Overlay::SafeMargin(guide));
    }
    out
}

/// Context for a single rasterization.
pub struct RenderContext<'a> {
    /// The board to draw.
    pub board: &'a BoardState,
    /// View settings (zoom, lazy loading, surface override).
    pub view: &'a ViewState,
    /// Output pixels per CSS pixel.
    pub pixel_ratio: f64,
    /// Background color.
    pub background: Color,
    /// Draw editing affordances.
    pub include_overlays: bool,
    /// Item to highlight.
    pub selected: Option<ItemId>,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context using the board's background color.
    pub fn new(board: &'a BoardState, view: &'a ViewState) -> Self {
        let [r, g, b, a] = board.config.background_rgba();
        Self {
            board,
            view,
            pixel_ratio: 1.0,
            background: Color::from_rgba8(r, g, b, a),
            include_overlays: true,
            selected: None,
        }
    }

    /// Set the output pixel ratio.
    pub fn with_pixel_ratio(mut self, pixel_ratio: f64) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    /// Enable or disable editing overlays.
    pub fn with_overlays(mut self, include: bool) -> Self {
        self.include_overlays = include;
        self
    }

    /// Highlight an item.
    pub fn with_selection(mut self, selected: Option<ItemId>) -> Self {
        self.selected = selected;
        self
    }

    /// Output pixels per CSS pixel after view zoom.
    pub fn scale(&self) -> f64 {
        self.pixel_ratio * self.view.zoom as f64 / 100.0
    }

    /// Board geometry as this context sees it.
    pub fn layout(&self) -> BoardLayout {
        self.view.layout(self.board)
    }
}

/// Trait for rasterizing backends.
pub trait Rasterizer {
    /// Draw the board into an RGBA image.
    ///
    /// A surface with no area yields a 0×0 image rather than an error.
    fn rasterize(&mut self, ctx: &RenderContext) -> RenderResult<RgbaImage>;
}
