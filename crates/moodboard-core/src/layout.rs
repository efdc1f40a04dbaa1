//! Board geometry: header, masonry columns, fixed grid and flexible grid.
//!
//! All values are CSS pixels. [`compute_layout`] is pure; [`LayoutEngine`]
//! tracks the container width and derived cell size between frames.

use crate::asset::{AssetId, DEFAULT_ASPECT};
use crate::board::{BoardState, ItemId};
use crate::config::{BoardConfig, LayoutMode};
use crate::crop::CropState;
use kurbo::{Point, Rect, Size, Vec2};

/// Space below the header.
pub const HEADER_MARGIN: f64 = 24.0;
/// Title font size.
pub const TITLE_FONT_SIZE: f64 = 24.0;
/// Title line box height.
pub const TITLE_LINE_HEIGHT: f64 = 30.0;
/// Space between title and description.
pub const TITLE_MARGIN: f64 = 4.0;
/// Description font size.
pub const DESCRIPTION_FONT_SIZE: f64 = 14.0;
/// Description line box height.
pub const DESCRIPTION_LINE_HEIGHT: f64 = 20.0;
/// Space between logo and text.
pub const LOGO_GAP: f64 = 12.0;
/// Lower bound for the flexible grid cell size.
pub const MIN_CELL_PX: f64 = 40.0;

/// Size the board is laid out into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub width: f64,
    /// Fixed height, or `None` to grow with the content.
    pub height: Option<f64>,
}

impl Surface {
    pub fn new(width: f64) -> Self {
        Self {
            width,
            height: None,
        }
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }
}

/// How the item container arranges its children.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContainerDirective {
    /// Balanced columns; items flow into the shortest.
    Columns { count: u32, gap: f64 },
    /// Fixed tracks, row-major.
    Grid { columns: u32, rows: u32, gap: f64 },
    /// Square-cell tracks with spans.
    FlexGrid {
        columns: u32,
        gap: f64,
        row_height: f64,
    },
}

/// Per-item layout hints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemDirective {
    pub margin_bottom: f64,
    /// Never split across columns.
    pub keep_whole: bool,
    pub col_span: u32,
    pub row_span: u32,
}

impl Default for ItemDirective {
    fn default() -> Self {
        Self {
            margin_bottom: 0.0,
            keep_whole: false,
            col_span: 1,
            row_span: 1,
        }
    }
}

/// How the image fills its box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageFit {
    /// Box already has the image's aspect ratio.
    Natural,
    /// Centered cover crop.
    Cover,
    /// Cover crop positioned by the item's crop.
    Crop(CropState),
}

impl ImageFit {
    /// The crop used to draw this fit.
    pub fn crop_state(&self) -> CropState {
        match self {
            ImageFit::Natural | ImageFit::Cover => CropState::default(),
            ImageFit::Crop(crop) => *crop,
        }
    }
}

/// A single line of header text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub text: String,
    pub rect: Rect,
    pub font_size: f64,
    pub line_height: f64,
}

/// Header geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLayout {
    pub rect: Rect,
    /// Logo asset, box and whether it is drawn as a circle.
    pub logo: Option<(AssetId, Rect, bool)>,
    pub title: Option<TextBox>,
    pub description: Option<TextBox>,
}

/// Where one item goes.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPlacement {
    pub item_id: ItemId,
    pub asset_id: AssetId,
    pub rect: Rect,
    pub directive: ItemDirective,
    pub fit: ImageFit,
}

/// Complete board geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardLayout {
    /// Resolved surface size.
    pub size: Size,
    pub container: ContainerDirective,
    /// Area occupied by the item container.
    pub content: Rect,
    pub header: Option<HeaderLayout>,
    /// Flexible grid cell size, square mode only.
    pub cell_px: Option<f64>,
    pub items: Vec<ItemPlacement>,
}

impl BoardLayout {
    /// Topmost item under `point`.
    pub fn hit_test(&self, point: Point) -> Option<ItemId> {
        self.items
            .iter()
            .rev()
            .find(|placement| placement.rect.contains(point))
            .map(|placement| placement.item_id)
    }

    /// Placement of an item.
    pub fn placement(&self, id: ItemId) -> Option<&ItemPlacement> {
        self.items.iter().find(|placement| placement.item_id == id)
    }
}

/// Width of one fractional track.
pub fn track_width(inner_width: f64, columns: u32, gap: f64) -> f64 {
    let columns = columns.max(1) as f64;
    ((inner_width - gap * (columns - 1.0)) / columns).max(0.0)
}

/// Flexible grid cell size: the track width floored, never below 40px.
pub fn cell_size(inner_width: f64, columns: u32, gap: f64) -> f64 {
    let columns = columns.max(1) as f64;
    ((inner_width - gap * (columns - 1.0)) / columns)
        .floor()
        .max(MIN_CELL_PX)
}

/// Surface for a container of `container_width`.
///
/// Width comes from the configured canvas width, else the container.
/// Height is the explicit canvas height, else width / aspect, else natural.
pub fn resolve_surface(config: &BoardConfig, container_width: f64) -> Surface {
    let width = config.width.unwrap_or(container_width);
    let height = config
        .height
        .or_else(|| config.aspect.map(|aspect| width / aspect));
    Surface { width, height }
}

/// Final pixel size the board occupies in a container of `container_width`.
pub fn resolve_surface_size(board: &BoardState, container_width: f64) -> Size {
    compute_layout(board, resolve_surface(&board.config, container_width)).size
}

/// Convert a resize-handle drag into spans.
pub fn span_from_drag(
    base: (u32, u32),
    delta: Vec2,
    cell_px: f64,
    gap: f64,
    columns: u32,
) -> (u32, u32) {
    let pitch = cell_px + gap;
    if pitch <= 0.0 {
        return base;
    }
    let dc = (delta.x / pitch).round() as i64;
    let dr = (delta.y / pitch).round() as i64;
    let col_span = (base.0 as i64 + dc).clamp(1, columns.max(1) as i64) as u32;
    let row_span = (base.1 as i64 + dr).max(1) as u32;
    (col_span, row_span)
}

fn header_layout(config: &BoardConfig, origin: Point, inner_width: f64) -> Option<HeaderLayout> {
    if !config.shows_header() {
        return None;
    }

    let logo_size = config.logo.as_ref().map(|logo| logo.size as f64);
    let has_title = !config.title.is_empty();
    let has_description = !config.description.is_empty();

    let mut text_height = 0.0;
    if has_title {
        text_height += TITLE_LINE_HEIGHT;
    }
    if has_title && has_description {
        text_height += TITLE_MARGIN;
    }
    if has_description {
        text_height += DESCRIPTION_LINE_HEIGHT;
    }

    let height = logo_size.unwrap_or(0.0).max(text_height);
    let rect = Rect::from_origin_size(origin, (inner_width, height));

    let logo = config.logo.as_ref().map(|logo| {
        let size = logo.size as f64;
        let y = origin.y + (height - size) / 2.0;
        (
            logo.asset_id,
            Rect::from_origin_size((origin.x, y), (size, size)),
            logo.rounded,
        )
    });

    let text_x = match logo_size {
        Some(size) => origin.x + size + LOGO_GAP,
        None => origin.x,
    };
    let text_width = (rect.x1 - text_x).max(0.0);
    let mut y = origin.y + (height - text_height) / 2.0;

    let title = has_title.then(|| {
        let text_box = TextBox {
            text: config.title.clone(),
            rect: Rect::from_origin_size((text_x, y), (text_width, TITLE_LINE_HEIGHT)),
            font_size: TITLE_FONT_SIZE,
            line_height: TITLE_LINE_HEIGHT,
        };
        y += TITLE_LINE_HEIGHT + if has_description { TITLE_MARGIN } else { 0.0 };
        text_box
    });
    let description = has_description.then(|| TextBox {
        text: config.description.clone(),
        rect: Rect::from_origin_size((text_x, y), (text_width, DESCRIPTION_LINE_HEIGHT)),
        font_size: DESCRIPTION_FONT_SIZE,
        line_height: DESCRIPTION_LINE_HEIGHT,
    });

    Some(HeaderLayout {
        rect,
        logo,
        title,
        description,
    })
}

fn aspect_of(board: &BoardState, asset_id: AssetId) -> f64 {
    board
        .assets()
        .get(asset_id)
        .map(|asset| asset.aspect_ratio())
        .unwrap_or(DEFAULT_ASPECT)
}

/// Lay out the whole board into `surface`.
pub fn compute_layout(board: &BoardState, surface: Surface) -> BoardLayout {
    let config = &board.config;
    let padding = config.padding as f64;
    let gap = config.gap as f64;
    let columns = config.columns.max(1);

    let inner_width = (surface.width - 2.0 * padding).max(0.0);
    let header = header_layout(config, Point::new(padding, padding), inner_width);
    let content_top = match &header {
        Some(header) => header.rect.y1 + HEADER_MARGIN,
        None => padding,
    };
    let content_origin = Point::new(padding, content_top);
    let available_height = surface
        .height
        .map(|height| (height - content_top - padding).max(0.0));

    let (container, items, content_height, cell_px) = match config.layout_mode {
        LayoutMode::Auto => {
            let (items, height) = layout_masonry(board, content_origin, inner_width, columns, gap);
            (
                ContainerDirective::Columns {
                    count: columns,
                    gap,
                },
                items,
                height,
                None,
            )
        }
        LayoutMode::Grid => {
            let (items, height, rows) = layout_grid(
                board,
                content_origin,
                inner_width,
                available_height,
                columns,
                gap,
            );
            (
                ContainerDirective::Grid { columns, rows, gap },
                items,
                height,
                None,
            )
        }
        LayoutMode::Square => {
            let cell = cell_size(inner_width, columns, gap);
            let (items, height) =
                layout_flex_grid(board, content_origin, inner_width, columns, gap, cell);
            (
                ContainerDirective::FlexGrid {
                    columns,
                    gap,
                    row_height: cell,
                },
                items,
                height,
                Some(cell),
            )
        }
    };

    let natural_height = content_top + content_height + padding;
    let size = Size::new(surface.width, surface.height.unwrap_or(natural_height));
    let content = Rect::from_origin_size(
        content_origin,
        (inner_width, available_height.unwrap_or(content_height)),
    );

    log::debug!(
        "Layout {} with {} item(s): {}x{}",
        config.layout_mode,
        items.len(),
        size.width,
        size.height
    );

    BoardLayout {
        size,
        container,
        content,
        header,
        cell_px,
        items,
    }
}

fn layout_masonry(
    board: &BoardState,
    origin: Point,
    inner_width: f64,
    columns: u32,
    gap: f64,
) -> (Vec<ItemPlacement>, f64) {
    let column_width = track_width(inner_width, columns, gap);
    let mut heights = vec![0.0f64; columns as usize];
    let mut placements = Vec::with_capacity(board.items().len());

    for item in board.items() {
        let mut column = 0;
        for (i, &h) in heights.iter().enumerate() {
            if h < heights[column] {
                column = i;
            }
        }
        let height = column_width / aspect_of(board, item.asset_id);
        let x = origin.x + column as f64 * (column_width + gap);
        let y = origin.y + heights[column];
        heights[column] += height + gap;

        placements.push(ItemPlacement {
            item_id: item.id,
            asset_id: item.asset_id,
            rect: Rect::from_origin_size((x, y), (column_width, height)),
            directive: ItemDirective {
                margin_bottom: gap,
                keep_whole: true,
                ..Default::default()
            },
            fit: ImageFit::Natural,
        });
    }

    // The trailing margin of each column is not part of the content box
    let tallest = heights
        .iter()
        .map(|&h| if h > 0.0 { h - gap } else { 0.0 })
        .fold(0.0, f64::max);
    (placements, tallest)
}

fn layout_grid(
    board: &BoardState,
    origin: Point,
    inner_width: f64,
    available_height: Option<f64>,
    columns: u32,
    gap: f64,
) -> (Vec<ItemPlacement>, f64, u32) {
    let config = &board.config;
    let column_width = track_width(inner_width, columns, gap);
    let count = board.items().len() as u32;
    let used_rows = count.div_ceil(columns);

    let row_heights: Vec<f64> = match available_height {
        Some(height) => {
            let rows = config.rows.max(used_rows).max(1);
            let track = track_width(height, rows, gap);
            vec![track; rows as usize]
        }
        None => board
            .items()
            .chunks(columns as usize)
            .map(|row| {
                row.iter()
                    .map(|item| column_width / aspect_of(board, item.asset_id))
                    .fold(0.0, f64::max)
            })
            .collect(),
    };

    let mut row_tops = Vec::with_capacity(row_heights.len());
    let mut y = origin.y;
    for height in &row_heights {
        row_tops.push(y);
        y += height + gap;
    }
    let content_height = if row_heights.is_empty() {
        0.0
    } else {
        y - origin.y - gap
    };

    let placements = board
        .items()
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let row = index / columns as usize;
            let column = index % columns as usize;
            let x = origin.x + column as f64 * (column_width + gap);
            let height = match available_height {
                Some(_) => row_heights.get(row).copied().unwrap_or(0.0),
                None => column_width / aspect_of(board, item.asset_id),
            };
            let top = row_tops.get(row).copied().unwrap_or(origin.y);
            ItemPlacement {
                item_id: item.id,
                asset_id: item.asset_id,
                rect: Rect::from_origin_size((x, top), (column_width, height)),
                directive: ItemDirective::default(),
                fit: ImageFit::Cover,
            }
        })
        .collect();

    (placements, content_height, row_heights.len() as u32)
}

fn layout_flex_grid(
    board: &BoardState,
    origin: Point,
    inner_width: f64,
    columns: u32,
    gap: f64,
    cell_px: f64,
) -> (Vec<ItemPlacement>, f64) {
    let track = track_width(inner_width, columns, gap);
    let columns = columns as usize;
    let mut occupied: Vec<Vec<bool>> = Vec::new();
    let mut cursor = (0usize, 0usize);
    let mut placements = Vec::with_capacity(board.items().len());

    let fits = |occupied: &Vec<Vec<bool>>, row: usize, col: usize, cs: usize, rs: usize| {
        (row..row + rs).all(|r| {
            occupied
                .get(r)
                .map(|cells| cells[col..col + cs].iter().all(|&taken| !taken))
                .unwrap_or(true)
        })
    };

    for item in board.items() {
        let col_span = (item.col_span as usize).clamp(1, columns);
        let row_span = (item.row_span as usize).max(1);

        let (mut row, mut col) = cursor;
        loop {
            if col + col_span > columns {
                row += 1;
                col = 0;
                continue;
            }
            if fits(&occupied, row, col, col_span, row_span) {
                break;
            }
            col += 1;
        }

        while occupied.len() < row + row_span {
            occupied.push(vec![false; columns]);
        }
        for cells in &mut occupied[row..row + row_span] {
            for cell in &mut cells[col..col + col_span] {
                *cell = true;
            }
        }
        cursor = (row, col + col_span);

        let x = origin.x + col as f64 * (track + gap);
        let y = origin.y + row as f64 * (cell_px + gap);
        let width = col_span as f64 * track + gap * (col_span as f64 - 1.0);
        let height = row_span as f64 * cell_px + gap * (row_span as f64 - 1.0);

        placements.push(ItemPlacement {
            item_id: item.id,
            asset_id: item.asset_id,
            rect: Rect::from_origin_size((x, y), (width, height)),
            directive: ItemDirective {
                col_span: col_span as u32,
                row_span: row_span as u32,
                ..Default::default()
            },
            fit: ImageFit::Crop(item.crop),
        });
    }

    let rows = occupied.len() as f64;
    let height = if rows > 0.0 {
        rows * cell_px + gap * (rows - 1.0)
    } else {
        0.0
    };
    (placements, height)
}

/// Tracks container width and the derived flexible grid cell size.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEngine {
    container_width: f64,
    columns: u32,
    gap: u32,
    padding: u32,
    cell_px: f64,
}

impl LayoutEngine {
    /// Create an engine for a container and the board's current config.
    pub fn new(container_width: f64, config: &BoardConfig) -> Self {
        let mut engine = Self {
            container_width,
            columns: config.columns,
            gap: config.gap,
            padding: config.padding,
            cell_px: 0.0,
        };
        engine.recompute();
        engine
    }

    /// Current container width.
    pub fn container_width(&self) -> f64 {
        self.container_width
    }

    /// Current flexible grid cell size.
    pub fn cell_px(&self) -> f64 {
        self.cell_px
    }

    fn recompute(&mut self) -> bool {
        let inner = (self.container_width - 2.0 * self.padding as f64).max(0.0);
        let cell = cell_size(inner, self.columns, self.gap as f64);
        let changed = cell != self.cell_px;
        if changed {
            log::debug!("Cell size {} -> {}", self.cell_px, cell);
        }
        self.cell_px = cell;
        changed
    }

    /// The container was resized. Returns whether the cell size changed.
    pub fn observe_resize(&mut self, width: f64) -> bool {
        self.container_width = width.max(0.0);
        self.recompute()
    }

    /// Pick up column, gap and padding changes. Returns whether the cell size changed.
    pub fn sync(&mut self, config: &BoardConfig) -> bool {
        if self.columns == config.columns && self.gap == config.gap && self.padding == config.padding
        {
            return false;
        }
        self.columns = config.columns;
        self.gap = config.gap;
        self.padding = config.padding;
        self.recompute()
    }

    /// Lay out the board in the tracked container.
    pub fn layout(&self, board: &BoardState) -> BoardLayout {
        compute_layout(board, resolve_surface(&board.config, self.container_width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{Asset, ImageFormat};
    use crate::config::LogoConfig;

    fn add_sized(board: &mut BoardState, width: u32, height: u32) -> ItemId {
        // Distinct bytes per asset so they are not deduplicated
        let data = uuid::Uuid::new_v4().as_bytes().to_vec();
        let asset_id = board.add_asset(Asset::new("x.png", data, width, height, ImageFormat::Png));
        board.place_asset(asset_id).unwrap()
    }

    fn bare_board(mode: LayoutMode) -> BoardState {
        let mut board = BoardState::new();
        board.update_config(|c| {
            c.layout_mode = mode;
            c.padding = 0;
            c.gap = 10;
            c.columns = 3;
            c.show_text = false;
        });
        board
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    #[test]
    fn test_cell_size() {
        assert_eq!(cell_size(1000.0, 4, 12.0), 241.0);
        assert_eq!(cell_size(100.0, 12, 12.0), 40.0);
        assert_eq!(cell_size(0.0, 1, 0.0), 40.0);
    }

    #[test]
    fn test_masonry_shortest_column() {
        let mut board = bare_board(LayoutMode::Auto);
        // Column width (320 - 20) / 3 = 100
        let tall = add_sized(&mut board, 100, 300);
        let a = add_sized(&mut board, 100, 100);
        let b = add_sized(&mut board, 100, 100);
        let c = add_sized(&mut board, 100, 50);

        let layout = compute_layout(&board, Surface::new(320.0));
        let rect = |id| layout.placement(id).unwrap().rect;

        assert_close(rect(tall).height(), 300.0);
        assert_close(rect(a).x0, 110.0);
        assert_close(rect(b).x0, 220.0);
        // Columns 2 and 3 tie at 110; the leftmost wins
        assert_close(rect(c).x0, 110.0);
        assert_close(rect(c).y0, 110.0);
        assert_close(layout.size.height, 300.0);
        assert!(matches!(layout.container, ContainerDirective::Columns { count: 3, .. }));
        assert!(layout.items.iter().all(|p| p.directive.keep_whole));
    }

    #[test]
    fn test_masonry_unresolved_asset_uses_default_aspect() {
        let mut board = bare_board(LayoutMode::Auto);
        let id = add_sized(&mut board, 100, 100);
        let asset = board.items()[0].asset_id;
        board.assets.remove(asset);

        let layout = compute_layout(&board, Surface::new(320.0));
        assert_close(layout.placement(id).unwrap().rect.height(), 75.0);
    }

    #[test]
    fn test_grid_natural_rows() {
        let mut board = bare_board(LayoutMode::Grid);
        let ids: Vec<_> = [(100, 100), (100, 50), (100, 200), (100, 100)]
            .into_iter()
            .map(|(w, h)| add_sized(&mut board, w, h))
            .collect();

        let layout = compute_layout(&board, Surface::new(320.0));
        // First row is as tall as the 100x200 image
        assert_close(layout.placement(ids[3]).unwrap().rect.y0, 210.0);
        assert_close(layout.size.height, 310.0);
        assert!(layout.items.iter().all(|p| p.fit == ImageFit::Cover));
    }

    #[test]
    fn test_grid_fixed_height_tracks() {
        let mut board = bare_board(LayoutMode::Grid);
        board.update_config(|c| c.rows = 2);
        for _ in 0..7 {
            add_sized(&mut board, 100, 100);
        }

        // 7 items in 3 columns need 3 rows, more than the configured 2
        let layout = compute_layout(&board, Surface::new(320.0).with_height(320.0));
        assert!(matches!(layout.container, ContainerDirective::Grid { rows: 3, .. }));
        assert_close(layout.items[0].rect.height(), 100.0);
        assert_close(layout.items[6].rect.y0, 220.0);
        assert_close(layout.size.height, 320.0);
    }

    #[test]
    fn test_square_spans() {
        let mut board = bare_board(LayoutMode::Square);
        let wide = add_sized(&mut board, 100, 100);
        let small = add_sized(&mut board, 100, 100);
        let big = add_sized(&mut board, 100, 100);
        board.set_span(wide, 2, 1);
        board.set_span(big, 3, 2);

        let layout = compute_layout(&board, Surface::new(320.0));
        assert_eq!(layout.cell_px, Some(100.0));

        let wide_rect = layout.placement(wide).unwrap().rect;
        assert_close(wide_rect.width(), 210.0);
        assert_close(wide_rect.height(), 100.0);

        let small_rect = layout.placement(small).unwrap().rect;
        assert_close(small_rect.x0, 220.0);

        let big_rect = layout.placement(big).unwrap().rect;
        assert_close(big_rect.y0, 110.0);
        assert_close(big_rect.width(), 320.0);
        assert_close(big_rect.height(), 210.0);
        assert_close(layout.size.height, 320.0);
    }

    #[test]
    fn test_square_sparse_cursor_does_not_backfill() {
        let mut board = bare_board(LayoutMode::Square);
        let a = add_sized(&mut board, 1, 1);
        let wide = add_sized(&mut board, 1, 1);
        let b = add_sized(&mut board, 1, 1);
        board.set_span(wide, 3, 1);

        let layout = compute_layout(&board, Surface::new(320.0));
        // The wide item wraps to row 1; b follows it instead of filling row 0
        assert_close(layout.placement(a).unwrap().rect.y0, 0.0);
        assert_close(layout.placement(wide).unwrap().rect.y0, 110.0);
        assert_close(layout.placement(b).unwrap().rect.y0, 220.0);
    }

    #[test]
    fn test_header_offsets_content() {
        let mut board = BoardState::new();
        let logo = add_sized(&mut board, 10, 10);
        let logo_asset = board.item(logo).unwrap().asset_id;
        board.update_config(|c| {
            c.title = "Spring".to_string();
            c.description = "Palette".to_string();
            c.logo = Some(LogoConfig {
                asset_id: logo_asset,
                size: 64,
                rounded: true,
            });
        });

        let layout = compute_layout(&board, Surface::new(1000.0));
        let header = layout.header.as_ref().unwrap();
        // Logo (64) is taller than the text block (30 + 4 + 20)
        assert_close(header.rect.height(), 64.0);
        assert_close(layout.content.y0, 24.0 + 64.0 + 24.0);
        let title = header.title.as_ref().unwrap();
        assert_close(title.rect.x0, 24.0 + 64.0 + 12.0);

        board.update_config(|c| c.show_text = false);
        let layout = compute_layout(&board, Surface::new(1000.0));
        assert!(layout.header.is_none());
        assert_close(layout.content.y0, 24.0);
    }

    #[test]
    fn test_resolve_surface_priority() {
        let mut config = BoardConfig::default();
        assert_eq!(resolve_surface(&config, 800.0), Surface::new(800.0));

        config.aspect = Some(2.0);
        assert_eq!(resolve_surface(&config, 800.0).height, Some(400.0));

        config.height = Some(500.0);
        config.width = Some(1000.0);
        assert_eq!(
            resolve_surface(&config, 800.0),
            Surface::new(1000.0).with_height(500.0)
        );
    }

    #[test]
    fn test_span_from_drag() {
        assert_eq!(span_from_drag((1, 1), Vec2::new(112.0, 0.0), 100.0, 12.0, 4), (2, 1));
        assert_eq!(span_from_drag((1, 1), Vec2::new(50.0, 60.0), 100.0, 12.0, 4), (1, 2));
        assert_eq!(span_from_drag((2, 2), Vec2::new(9000.0, -9000.0), 100.0, 12.0, 4), (4, 1));
        assert_eq!(span_from_drag((2, 2), Vec2::new(-500.0, 0.0), 100.0, 12.0, 4), (1, 2));
    }

    #[test]
    fn test_engine_recomputes_on_change() {
        let config = BoardConfig {
            padding: 0,
            ..Default::default()
        };
        let mut engine = LayoutEngine::new(1000.0, &config);
        assert_eq!(engine.cell_px(), 241.0);

        assert!(!engine.observe_resize(1001.0));
        assert!(engine.observe_resize(500.0));
        assert_eq!(engine.cell_px(), 116.0);

        assert!(!engine.sync(&config));
        let narrower = BoardConfig {
            columns: 2,
            ..config.clone()
        };
        assert!(engine.sync(&narrower));
        assert_eq!(engine.cell_px(), 244.0);
    }

    #[test]
    fn test_hit_test() {
        let mut board = bare_board(LayoutMode::Grid);
        let a = add_sized(&mut board, 100, 100);
        let b = add_sized(&mut board, 100, 100);
        let layout = compute_layout(&board, Surface::new(320.0));
        assert_eq!(layout.hit_test(Point::new(50.0, 50.0)), Some(a));
        assert_eq!(layout.hit_test(Point::new(150.0, 50.0)), Some(b));
        assert_eq!(layout.hit_test(Point::new(105.0, 50.0)), None);
    }
}
