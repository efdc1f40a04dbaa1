//! Per-item pan and zoom into the source image.

use crate::board::ItemId;
use kurbo::{Affine, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum crop zoom (no magnification).
pub const MIN_ZOOM: f64 = 1.0;
/// Maximum crop zoom.
pub const MAX_ZOOM: f64 = 4.0;
/// Zoom change per wheel tick.
pub const ZOOM_STEP: f64 = 0.05;
/// Pan change per arrow key press.
pub const NUDGE_STEP: f64 = 0.5;
/// Pan change per arrow key press with the modifier held.
pub const NUDGE_STEP_FAST: f64 = 2.0;

fn center() -> f64 {
    50.0
}

fn min_zoom() -> f64 {
    MIN_ZOOM
}

/// Focal point (percent of the source image) and magnification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropState {
    /// Horizontal focal point, 0..=100.
    #[serde(default = "center")]
    pub x: f64,
    /// Vertical focal point, 0..=100.
    #[serde(default = "center")]
    pub y: f64,
    /// Magnification, 1..=4.
    #[serde(default = "min_zoom")]
    pub zoom: f64,
}

impl Default for CropState {
    fn default() -> Self {
        Self {
            x: 50.0,
            y: 50.0,
            zoom: MIN_ZOOM,
        }
    }
}

fn clamp_pan(v: f64) -> f64 {
    if v.is_nan() { 50.0 } else { v.clamp(0.0, 100.0) }
}

fn clamp_zoom(v: f64) -> f64 {
    if v.is_nan() { MIN_ZOOM } else { v.clamp(MIN_ZOOM, MAX_ZOOM) }
}

impl CropState {
    /// Create a crop state, clamping every component into range.
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self {
            x: clamp_pan(x),
            y: clamp_pan(y),
            zoom: clamp_zoom(zoom),
        }
    }

    /// Return a copy with all components clamped.
    pub fn clamped(self) -> Self {
        Self::new(self.x, self.y, self.zoom)
    }

    /// Check that all components are within range.
    pub fn is_valid(&self) -> bool {
        (0.0..=100.0).contains(&self.x)
            && (0.0..=100.0).contains(&self.y)
            && (MIN_ZOOM..=MAX_ZOOM).contains(&self.zoom)
    }

    /// Transform mapping source image pixels into `dest`.
    ///
    /// The image is scaled to cover the box, positioned so that `x%`/`y%`
    /// of the overflow lies left/above it, then magnified by `zoom` about
    /// the box centre. The caller clips to `dest`.
    pub fn transform(&self, image: Size, dest: Rect) -> Affine {
        let origin = Affine::translate(Vec2::new(dest.x0, dest.y0));
        if image.width <= 0.0 || image.height <= 0.0 {
            return origin;
        }

        let box_size = dest.size();
        let cover = (box_size.width / image.width).max(box_size.height / image.height);
        let scaled = Size::new(image.width * cover, image.height * cover);
        let offset = Vec2::new(
            (box_size.width - scaled.width) * self.x / 100.0,
            (box_size.height - scaled.height) * self.y / 100.0,
        );
        let center = Vec2::new(box_size.width / 2.0, box_size.height / 2.0);

        origin
            * Affine::translate(center)
            * Affine::scale(self.zoom)
            * Affine::translate(-center)
            * Affine::translate(offset)
            * Affine::scale(cover)
    }

    /// Region of the source image (in source pixels) visible in a box of `dest` size.
    pub fn visible_region(&self, image: Size, dest: Size) -> Rect {
        let bounds = Rect::from_origin_size((0.0, 0.0), image);
        let affine = self.transform(image, Rect::from_origin_size((0.0, 0.0), dest));
        let window = affine
            .inverse()
            .transform_rect_bbox(Rect::from_origin_size((0.0, 0.0), dest));
        window.intersect(bounds)
    }
}

/// Direction of a keyboard nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Keys understood by the crop editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropKey {
    Escape,
    Enter,
    Arrow(NudgeDirection),
    Other,
}

/// Result of feeding a key to the crop editor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropCommand {
    /// Keep editing.
    Continue,
    /// Commit this crop to the item.
    Apply(CropState),
    /// Discard the working copy.
    Cancel,
}

/// Modal crop adjustment on a working copy of an item's crop.
#[derive(Debug, Clone)]
pub struct CropEditor {
    item_id: ItemId,
    original: CropState,
    working: CropState,
    /// Working crop captured when the current drag began.
    drag_start: Option<CropState>,
}

impl CropEditor {
    /// Start editing from the item's persisted crop.
    pub fn new(item_id: ItemId, crop: CropState) -> Self {
        let crop = crop.clamped();
        Self {
            item_id,
            original: crop,
            working: crop,
            drag_start: None,
        }
    }

    /// The item being edited.
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// Current working copy.
    pub fn working(&self) -> CropState {
        self.working
    }

    /// Begin a drag-to-pan gesture.
    pub fn begin_drag(&mut self) {
        self.drag_start = Some(self.working);
    }

    /// Update the pan from the pointer delta since the drag began.
    ///
    /// Deltas are converted to percentages of the preview box.
    pub fn drag_to(&mut self, delta: Vec2, preview: Size) {
        let Some(start) = self.drag_start else {
            return;
        };
        if preview.width <= 0.0 || preview.height <= 0.0 {
            return;
        }
        self.working.x = clamp_pan(start.x + delta.x / preview.width * 100.0);
        self.working.y = clamp_pan(start.y + delta.y / preview.height * 100.0);
    }

    /// Finish the drag gesture.
    pub fn end_drag(&mut self) {
        self.drag_start = None;
    }

    /// Check if a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag_start.is_some()
    }

    /// Apply one wheel tick; scrolling down zooms out.
    pub fn wheel(&mut self, delta_y: f64) {
        let step = if delta_y > 0.0 { -ZOOM_STEP } else { ZOOM_STEP };
        self.working.zoom = clamp_zoom(self.working.zoom + step);
    }

    /// Move the pan by one keyboard step.
    pub fn nudge(&mut self, direction: NudgeDirection, fast: bool) {
        let step = if fast { NUDGE_STEP_FAST } else { NUDGE_STEP };
        match direction {
            NudgeDirection::Left => self.working.x = clamp_pan(self.working.x - step),
            NudgeDirection::Right => self.working.x = clamp_pan(self.working.x + step),
            NudgeDirection::Up => self.working.y = clamp_pan(self.working.y - step),
            NudgeDirection::Down => self.working.y = clamp_pan(self.working.y + step),
        }
    }

    /// Slider setter for zoom.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.working.zoom = clamp_zoom(zoom);
    }

    /// Slider setter for the focal point.
    pub fn set_pan(&mut self, x: f64, y: f64) {
        self.working.x = clamp_pan(x);
        self.working.y = clamp_pan(y);
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: CropKey, modifier: bool) -> CropCommand {
        match key {
            CropKey::Escape => CropCommand::Cancel,
            CropKey::Enter => CropCommand::Apply(self.working),
            CropKey::Arrow(direction) => {
                self.nudge(direction, modifier);
                CropCommand::Continue
            }
            CropKey::Other => CropCommand::Continue,
        }
    }

    /// Finish editing, returning the crop to commit.
    pub fn apply(self) -> CropState {
        self.working
    }

    /// Discard the working copy, returning the crop the item already had.
    pub fn cancel(self) -> CropState {
        self.original
    }
}
