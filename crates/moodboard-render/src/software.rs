//! CPU rasterizer built on tiny-skia, with fontdue for header text.

use crate::renderer::{
    LOGO_RADIUS, Overlay, RenderContext, RenderResult, Rasterizer, RendererError, SHADOW_ALPHA,
    SHADOW_BLUR, SHADOW_OFFSET_Y, TILE_RADIUS, overlays,
};
use fontdue::{Font, FontSettings};
use image::RgbaImage;
use kurbo::{Affine, Circle, PathEl, Point, Rect, RoundedRect, Shape, Size};
use moodboard_core::crop::CropState;
use moodboard_core::layout::{HeaderLayout, TextBox};
use moodboard_core::{AssetId, BoardState};
use std::collections::HashMap;
use std::path::Path as FsPath;
use tiny_skia::{
    Color, ColorU8, FillRule, FilterQuality, Paint, Path, PathBuilder, Pattern, Pixmap,
    PremultipliedColorU8, SpreadMode, Stroke, Transform,
};

/// Largest surface edge in output pixels.
const MAX_DIMENSION: f64 = 16384.0;
/// Layers used to approximate the blurred shadow.
const SHADOW_STEPS: usize = 6;
const TITLE_COLOR: [u8; 3] = [0x11, 0x11, 0x11];
const DESCRIPTION_COLOR: [u8; 3] = [0x66, 0x66, 0x66];

/// Embedded DejaVu Sans, used for header text unless another font is loaded.
static DEFAULT_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Software rasterizer.
pub struct SoftwareRasterizer {
    /// Decoded images keyed by asset. `None` marks undecodable data.
    image_cache: HashMap<AssetId, Option<Pixmap>>,
    /// Font for header text. Text is skipped without one.
    font: Option<Font>,
}

impl Default for SoftwareRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

fn to_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn to_path(shape: &impl Shape) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for el in shape.path_elements(0.1) {
        match el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32),
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

fn solid(r: u8, g: u8, b: u8, a: u8) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

fn rgba_to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

fn pixmap_to_rgba(pixmap: &Pixmap) -> RenderResult<RgbaImage> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .ok_or_else(|| RendererError::RenderFailed("Pixel buffer size mismatch".to_string()))
}

/// Source-over blend of a coverage mask in a solid colour.
fn blend_coverage(
    pixmap: &mut Pixmap,
    origin: (i32, i32),
    size: (usize, usize),
    coverage: &[u8],
    color: [u8; 3],
    clip_x1: i32,
) {
    let width = pixmap.width() as i32;
    let height = pixmap.height() as i32;
    let right = clip_x1.min(width);
    let pixels = pixmap.pixels_mut();

    for row in 0..size.1 {
        let y = origin.1 + row as i32;
        if y < 0 || y >= height {
            continue;
        }
        for col in 0..size.0 {
            let x = origin.0 + col as i32;
            if x < 0 || x >= right {
                continue;
            }
            let alpha = coverage[row * size.0 + col] as f32 / 255.0;
            if alpha <= 0.0 {
                continue;
            }
            let index = (y * width + x) as usize;
            let dst = pixels[index];
            let inv = 1.0 - alpha;
            let a = (alpha * 255.0 + dst.alpha() as f32 * inv).round().min(255.0) as u8;
            let channel = |src: u8, dst: u8| -> u8 {
                ((src as f32 * alpha + dst as f32 * inv).round() as u8).min(a)
            };
            if let Some(blended) = PremultipliedColorU8::from_rgba(
                channel(color[0], dst.red()),
                channel(color[1], dst.green()),
                channel(color[2], dst.blue()),
                a,
            ) {
                pixels[index] = blended;
            }
        }
    }
}

impl SoftwareRasterizer {
    /// Create a rasterizer using the embedded font.
    pub fn new() -> Self {
        let font = Font::from_bytes(DEFAULT_FONT, FontSettings::default())
            .map_err(|e| log::error!("Embedded font failed to load: {}", e))
            .ok();
        Self {
            image_cache: HashMap::new(),
            font,
        }
    }

    /// Create a rasterizer that skips header text.
    pub fn without_font() -> Self {
        Self {
            image_cache: HashMap::new(),
            font: None,
        }
    }

    /// Create a rasterizer that draws header text with the given font.
    pub fn with_font(bytes: Vec<u8>) -> RenderResult<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| RendererError::Font(e.to_string()))?;
        Ok(Self {
            image_cache: HashMap::new(),
            font: Some(font),
        })
    }

    /// Load a TTF/OTF font file.
    pub fn load_font(path: &FsPath) -> RenderResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| RendererError::Font(format!("{}: {}", path.display(), e)))?;
        Self::with_font(bytes)
    }

    /// Whether header text can be drawn.
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Drop cached decodes.
    pub fn clear_cache(&mut self) {
        self.image_cache.clear();
    }

    fn ensure_decoded(&mut self, board: &BoardState, id: AssetId) {
        if self.image_cache.contains_key(&id) {
            return;
        }
        let Some(asset) = board.assets().get(id) else {
            return;
        };
        let decoded = match image::load_from_memory(asset.data()) {
            Ok(decoded) => rgba_to_pixmap(&decoded.to_rgba8()),
            Err(e) => {
                log::warn!("Failed to decode {}: {}", asset.name, e);
                None
            }
        };
        self.image_cache.insert(id, decoded);
    }

    fn cached(&self, id: AssetId) -> Option<&Pixmap> {
        self.image_cache.get(&id).and_then(Option::as_ref)
    }

    /// Fill `clip` with an image positioned by `crop` inside `rect`.
    fn draw_image(
        &self,
        pixmap: &mut Pixmap,
        id: AssetId,
        clip: &Path,
        rect: Rect,
        crop: CropState,
        base: Transform,
    ) -> bool {
        let Some(image) = self.cached(id) else {
            return false;
        };
        let affine = crop.transform(
            Size::new(image.width() as f64, image.height() as f64),
            rect,
        );
        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.shader = Pattern::new(
            image.as_ref(),
            SpreadMode::Pad,
            FilterQuality::Bilinear,
            1.0,
            to_transform(affine),
        );
        pixmap.fill_path(clip, &paint, FillRule::Winding, base, None);
        true
    }

    /// Gray box with an X for images that cannot be shown.
    fn draw_placeholder(&self, pixmap: &mut Pixmap, clip: &Path, rect: Rect, base: Transform) {
        pixmap.fill_path(clip, &solid(200, 200, 200, 255), FillRule::Winding, base, None);

        let mut pb = PathBuilder::new();
        pb.move_to(rect.x0 as f32, rect.y0 as f32);
        pb.line_to(rect.x1 as f32, rect.y1 as f32);
        pb.move_to(rect.x1 as f32, rect.y0 as f32);
        pb.line_to(rect.x0 as f32, rect.y1 as f32);
        let stroke = Stroke {
            width: 2.0,
            ..Default::default()
        };
        if let Some(cross) = pb.finish() {
            pixmap.stroke_path(&cross, &solid(150, 150, 150, 255), &stroke, base, None);
        }
        pixmap.stroke_path(clip, &solid(100, 100, 100, 255), &stroke, base, None);
    }

    fn draw_shadow(&self, pixmap: &mut Pixmap, rect: Rect, radius: f64, base: Transform) {
        let alpha = (SHADOW_ALPHA / SHADOW_STEPS as f64) as f32;
        let offset = rect + kurbo::Vec2::new(0.0, SHADOW_OFFSET_Y);
        for step in 0..SHADOW_STEPS {
            let spread = SHADOW_BLUR / 2.0 * (1.0 - step as f64 / SHADOW_STEPS as f64);
            let layer = RoundedRect::from_rect(offset.inflate(spread, spread), radius + spread);
            let Some(path) = to_path(&layer) else {
                continue;
            };
            let mut paint = Paint::default();
            paint.anti_alias = true;
            if let Some(color) = Color::from_rgba(0.0, 0.0, 0.0, alpha) {
                paint.set_color(color);
            }
            pixmap.fill_path(&path, &paint, FillRule::Winding, base, None);
        }
    }

    fn draw_text(&self, pixmap: &mut Pixmap, text: &TextBox, color: [u8; 3], scale: f64) {
        let Some(font) = &self.font else {
            return;
        };
        let px = (text.font_size * scale) as f32;
        let Some(line) = font.horizontal_line_metrics(px) else {
            return;
        };
        let line_height = (text.line_height * scale) as f32;
        let baseline =
            (text.rect.y0 * scale) as f32 + (line_height - (line.ascent - line.descent)) / 2.0 + line.ascent;
        let clip_x1 = (text.rect.x1 * scale).floor() as i32;
        let mut pen_x = (text.rect.x0 * scale) as f32;

        for ch in text.text.chars() {
            let (metrics, coverage) = font.rasterize(ch, px);
            let x = (pen_x + metrics.xmin as f32).round() as i32;
            let y = (baseline - metrics.height as f32 - metrics.ymin as f32).round() as i32;
            if x >= clip_x1 {
                break;
            }
            blend_coverage(
                pixmap,
                (x, y),
                (metrics.width, metrics.height),
                &coverage,
                color,
                clip_x1,
            );
            pen_x += metrics.advance_width;
        }
    }

    fn draw_header(&self, pixmap: &mut Pixmap, header: &HeaderLayout, base: Transform, scale: f64) {
        if let Some((id, rect, rounded)) = header.logo {
            let clip = if rounded {
                to_path(&Circle::new(rect.center(), rect.width() / 2.0))
            } else {
                to_path(&RoundedRect::from_rect(rect, LOGO_RADIUS))
            };
            if let Some(clip) = clip {
                if !self.draw_image(pixmap, id, &clip, rect, CropState::default(), base) {
                    self.draw_placeholder(pixmap, &clip, rect, base);
                }
            }
        }
        if let Some(title) = &header.title {
            self.draw_text(pixmap, title, TITLE_COLOR, scale);
        }
        if let Some(description) = &header.description {
            self.draw_text(pixmap, description, DESCRIPTION_COLOR, scale);
        }
    }

    fn draw_overlay(&self, pixmap: &mut Pixmap, overlay: Overlay, base: Transform) {
        let stroke = Stroke {
            width: 2.0,
            ..Default::default()
        };
        match overlay {
            Overlay::DragHandle(rect) => {
                if let Some(path) = to_path(&RoundedRect::from_rect(rect, 6.0)) {
                    pixmap.fill_path(&path, &solid(255, 255, 255, 230), FillRule::Winding, base, None);
                }
                for row in 0..2 {
                    for col in 0..3 {
                        let center = Point::new(
                            rect.x0 + rect.width() * (col as f64 + 1.0) / 4.0,
                            rect.y0 + rect.height() * (row as f64 + 1.0) / 3.0,
                        );
                        if let Some(dot) = to_path(&Circle::new(center, 1.5)) {
                            pixmap.fill_path(&dot, &solid(120, 120, 120, 255), FillRule::Winding, base, None);
                        }
                    }
                }
            }
            Overlay::DeleteButton(rect) | Overlay::CropButton(rect) => {
                if let Some(path) = to_path(&Circle::new(rect.center(), rect.width() / 2.0)) {
                    pixmap.fill_path(&path, &solid(0, 0, 0, 150), FillRule::Winding, base, None);
                }
                let glyph = rect.inset(-10.0);
                let mut pb = PathBuilder::new();
                if matches!(overlay, Overlay::DeleteButton(_)) {
                    pb.move_to(glyph.x0 as f32, glyph.y0 as f32);
                    pb.line_to(glyph.x1 as f32, glyph.y1 as f32);
                    pb.move_to(glyph.x1 as f32, glyph.y0 as f32);
                    pb.line_to(glyph.x0 as f32, glyph.y1 as f32);
                } else if let Some(frame) = tiny_skia::Rect::from_ltrb(
                    glyph.x0 as f32,
                    glyph.y0 as f32,
                    glyph.x1 as f32,
                    glyph.y1 as f32,
                ) {
                    pb.push_rect(frame);
                }
                if let Some(path) = pb.finish() {
                    pixmap.stroke_path(&path, &solid(255, 255, 255, 255), &stroke, base, None);
                }
            }
            Overlay::ResizeHandle(rect) => {
                if let Some(path) = to_path(&RoundedRect::from_rect(rect, 4.0)) {
                    pixmap.fill_path(&path, &solid(255, 255, 255, 255), FillRule::Winding, base, None);
                    let border = Stroke {
                        width: 1.0,
                        ..Default::default()
                    };
                    pixmap.stroke_path(&path, &solid(0xdd, 0xdd, 0xdd, 255), &border, base, None);
                }
            }
            Overlay::SafeMargin(rect) => {
                if let Some(path) = to_path(&rect) {
                    pixmap.stroke_path(&path, &solid(255, 0, 0, 102), &stroke, base, None);
                }
            }
        }
    }
}

impl Rasterizer for SoftwareRasterizer {
    fn rasterize(&mut self, ctx: &RenderContext) -> RenderResult<RgbaImage> {
        let layout = ctx.layout();
        let scale = ctx.scale();
        let width = (layout.size.width * scale).round();
        let height = (layout.size.height * scale).round();

        if !(width >= 1.0 && height >= 1.0) {
            log::debug!("Nothing to rasterize: {}x{}", width, height);
            return Ok(RgbaImage::new(0, 0));
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(RendererError::RenderFailed(format!(
                "Surface {}x{} exceeds {} pixels",
                width, height, MAX_DIMENSION
            )));
        }

        let mut pixmap = Pixmap::new(width as u32, height as u32).ok_or_else(|| {
            RendererError::RenderFailed(format!("Could not allocate {}x{} surface", width, height))
        })?;
        let bg = ctx.background.to_rgba8();
        pixmap.fill(Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));

        for placement in &layout.items {
            if ctx.view.is_rendered(placement.item_id) {
                self.ensure_decoded(ctx.board, placement.asset_id);
            }
        }
        if let Some((id, _, _)) = layout.header.as_ref().and_then(|h| h.logo) {
            self.ensure_decoded(ctx.board, id);
        }

        let base = Transform::from_scale(scale as f32, scale as f32);
        let config = &ctx.board.config;
        let radius = if config.rounded { TILE_RADIUS } else { 0.0 };

        if let Some(header) = &layout.header {
            self.draw_header(&mut pixmap, header, base, scale);
        }

        for placement in &layout.items {
            let rect = placement.rect;
            let Some(clip) = to_path(&RoundedRect::from_rect(rect, radius)) else {
                continue;
            };
            if config.shadow {
                self.draw_shadow(&mut pixmap, rect, radius, base);
            }
            pixmap.fill_path(&clip, &solid(255, 255, 255, 255), FillRule::Winding, base, None);

            if !ctx.view.is_rendered(placement.item_id) {
                continue;
            }
            let drawn = self.draw_image(
                &mut pixmap,
                placement.asset_id,
                &clip,
                rect,
                placement.fit.crop_state(),
                base,
            );
            if !drawn {
                self.draw_placeholder(&mut pixmap, &clip, rect, base);
            }
        }

        if ctx.include_overlays {
            if let Some(selected) = ctx.selected.and_then(|id| layout.placement(id)) {
                if let Some(path) = to_path(&RoundedRect::from_rect(selected.rect, radius)) {
                    let stroke = Stroke {
                        width: 3.0,
                        ..Default::default()
                    };
                    pixmap.stroke_path(&path, &solid(59, 130, 246, 255), &stroke, base, None);
                }
            }
            for overlay in overlays(&layout, config.layout_mode, ctx.view) {
                self.draw_overlay(&mut pixmap, overlay, base);
            }
        }

        pixmap_to_rgba(&pixmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodboard_core::config::LayoutMode;
    use moodboard_core::{ItemId, ViewState};
    use std::io::Cursor;

    fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba(color));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn flat_board(mode: LayoutMode) -> (BoardState, ItemId) {
        let mut board = BoardState::new();
        board.update_config(|c| {
            c.layout_mode = mode;
            c.columns = 1;
            c.gap = 0;
            c.padding = 0;
            c.shadow = false;
            c.rounded = false;
        });
        let id = board.import("red.png", png(10, 10, [255, 0, 0, 255])).unwrap();
        (board, id)
    }

    fn eager_view(width: f64) -> ViewState {
        ViewState::new(width).with_lazy_render(false)
    }

    #[test]
    fn test_pixel_ratio_scales_output() {
        let (board, _) = flat_board(LayoutMode::Grid);
        let view = eager_view(100.0);
        let ctx = RenderContext::new(&board, &view).with_pixel_ratio(2.0).with_overlays(false);

        let img = SoftwareRasterizer::new().rasterize(&ctx).unwrap();
        assert_eq!(img.dimensions(), (200, 200));
        assert_eq!(img.get_pixel(100, 100).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_zero_width_gives_empty_image() {
        let (board, _) = flat_board(LayoutMode::Grid);
        let view = eager_view(0.0);
        let img = SoftwareRasterizer::new()
            .rasterize(&RenderContext::new(&board, &view))
            .unwrap();
        assert_eq!(img.dimensions(), (0, 0));
    }

    #[test]
    fn test_overlays_only_when_requested() {
        let (board, _) = flat_board(LayoutMode::Square);
        let view = eager_view(100.0);
        // Resize handle centre: 100 - 6 - 11
        let (x, y) = (83, 83);

        let mut rasterizer = SoftwareRasterizer::new();
        let with = rasterizer
            .rasterize(&RenderContext::new(&board, &view).with_overlays(true))
            .unwrap();
        let without = rasterizer
            .rasterize(&RenderContext::new(&board, &view).with_overlays(false))
            .unwrap();

        assert_eq!(with.get_pixel(x, y).0, [255, 255, 255, 255]);
        assert_eq!(without.get_pixel(x, y).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_undecodable_asset_draws_placeholder() {
        let mut board = flat_board(LayoutMode::Grid).0;
        board.clear();
        let broken = board.add_asset(moodboard_core::Asset::new(
            "broken.png",
            vec![0x89, b'P', b'N', b'G', 0, 0],
            10,
            10,
            moodboard_core::ImageFormat::Png,
        ));
        board.place_asset(broken).unwrap();

        let view = eager_view(100.0);
        let ctx = RenderContext::new(&board, &view).with_overlays(false);
        let img = SoftwareRasterizer::new().rasterize(&ctx).unwrap();
        // Off the diagonals the placeholder is plain gray
        assert_eq!(img.get_pixel(25, 50).0, [200, 200, 200, 255]);
    }

    #[test]
    fn test_default_font_draws_title() {
        let (mut board, _) = flat_board(LayoutMode::Grid);
        board.update_config(|c| {
            c.title = "Summer palette".to_string();
            c.padding = 10;
        });
        let view = eager_view(400.0);
        let title = view.layout(&board).header.unwrap().title.unwrap().rect;
        let ctx = RenderContext::new(&board, &view).with_overlays(false);

        let mut rasterizer = SoftwareRasterizer::new();
        assert!(rasterizer.has_font());
        let img = rasterizer.rasterize(&ctx).unwrap();
        let background = img.get_pixel(0, 0).0;
        let inked = (title.x0 as u32..title.x1 as u32)
            .flat_map(|x| (title.y0 as u32..title.y1 as u32).map(move |y| (x, y)))
            .filter(|&(x, y)| img.get_pixel(x, y).0 != background)
            .count();
        assert!(inked > 50, "only {inked} title pixels drawn");

        let blank = SoftwareRasterizer::without_font().rasterize(&ctx).unwrap();
        assert!(
            (title.x0 as u32..title.x1 as u32)
                .all(|x| blank.get_pixel(x, title.y0 as u32 + 15).0 == background)
        );
    }

    #[test]
    fn test_lazy_items_show_empty_tile() {
        let (board, id) = flat_board(LayoutMode::Grid);
        let mut view = ViewState::new(100.0);
        let mut rasterizer = SoftwareRasterizer::new();

        let ctx = RenderContext::new(&board, &view).with_overlays(false);
        let img = rasterizer.rasterize(&ctx).unwrap();
        assert_eq!(img.get_pixel(50, 50).0, [255, 255, 255, 255]);

        let layout = view.layout(&board);
        view.mark_visible(&layout, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert!(view.is_rendered(id));
        let ctx = RenderContext::new(&board, &view).with_overlays(false);
        let img = rasterizer.rasterize(&ctx).unwrap();
        assert_eq!(img.get_pixel(50, 50).0, [255, 0, 0, 255]);
    }
}
