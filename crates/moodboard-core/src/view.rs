//! Interactive view state that export temporarily overrides.

use crate::board::{BoardState, ItemId};
use crate::config::BoardConfig;
use crate::layout::{self, BoardLayout, Surface};
use kurbo::{Rect, Size};
use std::collections::HashSet;

/// Default container width in CSS pixels.
pub const DEFAULT_CONTAINER_WIDTH: f64 = 1000.0;
/// Items closer than this to the viewport are loaded ahead of time.
pub const LAZY_MARGIN: f64 = 200.0;
/// Safe-margin guide inset as a fraction of the surface.
pub const SAFE_MARGIN_INSET: f64 = 0.05;

/// How the board is currently being looked at.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub container_width: f64,
    /// Zoom in percent.
    pub zoom: u32,
    /// Skip images that have not been near the viewport yet.
    pub lazy_render: bool,
    seen: HashSet<ItemId>,
    /// Fixed surface used while exporting.
    pub surface_override: Option<Surface>,
    /// Inset fraction of the safe-margin guide, if shown.
    pub safe_margin: Option<f64>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            container_width: DEFAULT_CONTAINER_WIDTH,
            zoom: 100,
            lazy_render: true,
            seen: HashSet::new(),
            surface_override: None,
            safe_margin: None,
        }
    }
}

impl ViewState {
    /// Create a view for a container width.
    pub fn new(container_width: f64) -> Self {
        Self {
            container_width,
            ..Default::default()
        }
    }

    /// Create a view picking up the board's zoom.
    pub fn from_config(container_width: f64, config: &BoardConfig) -> Self {
        Self {
            zoom: config.zoom,
            ..Self::new(container_width)
        }
    }

    pub fn with_lazy_render(mut self, lazy_render: bool) -> Self {
        self.lazy_render = lazy_render;
        self
    }

    pub fn with_zoom(mut self, zoom: u32) -> Self {
        self.zoom = zoom;
        self
    }

    /// Show the safe-margin guide at `inset` of the surface.
    pub fn with_safe_margin(mut self, inset: f64) -> Self {
        self.safe_margin = Some(inset);
        self
    }

    /// Whether an item's image should be drawn.
    pub fn is_rendered(&self, id: ItemId) -> bool {
        !self.lazy_render || self.seen.contains(&id)
    }

    /// Record items within the look-ahead margin of `viewport`.
    ///
    /// Returns the number of newly seen items.
    pub fn mark_visible(&mut self, layout: &BoardLayout, viewport: Rect) -> usize {
        let area = viewport.inflate(LAZY_MARGIN, LAZY_MARGIN);
        let before = self.seen.len();
        for placement in &layout.items {
            if !placement.rect.intersect(area).is_zero_area() {
                self.seen.insert(placement.item_id);
            }
        }
        self.seen.len() - before
    }

    /// Surface the board is laid out into.
    pub fn surface(&self, config: &BoardConfig) -> Surface {
        self.surface_override
            .unwrap_or_else(|| layout::resolve_surface(config, self.container_width))
    }

    /// Lay out the board as this view shows it.
    pub fn layout(&self, board: &BoardState) -> BoardLayout {
        layout::compute_layout(board, self.surface(&board.config))
    }

    /// Switch to export settings, returning the previous view.
    ///
    /// Lazy loading is off, zoom is 100% and the surface is pinned to
    /// the board's resolved width. Height stays natural unless the board
    /// sets a height or aspect ratio.
    pub fn freeze(&mut self, board: &BoardState) -> ViewState {
        let target = layout::resolve_surface(&board.config, self.container_width);
        let saved = self.clone();
        self.lazy_render = false;
        self.zoom = 100;
        self.safe_margin = None;
        self.surface_override = Some(target);
        saved
    }

    /// Put back a view saved by [`ViewState::freeze`].
    pub fn restore(&mut self, saved: ViewState) {
        *self = saved;
    }

    /// Safe-margin guide rectangle for a surface of `size`.
    pub fn safe_margin_rect(&self, size: Size) -> Option<Rect> {
        self.safe_margin.map(|inset| {
            let dx = size.width * inset;
            let dy = size.height * inset;
            Rect::new(dx, dy, size.width - dx, size.height - dy)
        })
    }
}
