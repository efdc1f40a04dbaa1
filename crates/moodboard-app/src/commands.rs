//! Executes command-line commands against a board file.

use crate::cli::{Commands, SetArgs};
use crate::clipboard;
use crate::config::AppConfig;
use crate::delivery::{DownloadDelivery, detect_delivery};
use crate::error::{AppError, AppResult};
use crate::shortcuts::{ShortcutAction, ShortcutRegistry};
use moodboard_core::import::{is_image_path, read_image_file};
use moodboard_core::storage::{AssetCache, Storage};
use moodboard_core::{AssetId, BoardState, CropState, ItemId, ViewState};
use moodboard_render::{Delivery, DeliveryOutcome, ExportFormat, Exporter, SoftwareRasterizer};
use std::path::{Path, PathBuf};

/// Command runner holding config and the optional asset cache.
pub struct App<S: Storage> {
    config: AppConfig,
    cache: Option<AssetCache<S>>,
}

impl<S: Storage> App<S> {
    pub fn new(config: AppConfig, cache: Option<AssetCache<S>>) -> Self {
        Self { config, cache }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run one command on the board at `path`.
    pub fn execute(&mut self, path: &Path, command: Commands) -> AppResult<()> {
        match command {
            Commands::New {
                title,
                template,
                force,
            } => {
                if path.exists() && !force {
                    return Err(AppError::BoardExists(path.to_path_buf()));
                }
                let mut board = BoardState::new();
                if let Some(template) = template {
                    board.apply_template(template);
                }
                if let Some(title) = title {
                    board.update_config(|c| c.title = title);
                }
                self.commit(path, &board)?;
                println!("Created {}", path.display());
            }
            Commands::Add { files } => {
                let mut board = open(path)?;
                let added = self.add_files(&mut board, &files)?;
                self.commit(path, &board)?;
                println!("Added {} image(s)", added);
            }
            Commands::Paste => {
                let mut board = open(path)?;
                let png = clipboard::read_image_png()?;
                let item = board.import(clipboard::PASTED_IMAGE_NAME, png)?;
                self.cache_item_asset(&board, item);
                self.commit(path, &board)?;
                println!("Pasted image as item {}", short_id(item));
            }
            Commands::Place { asset } => {
                let mut board = open(path)?;
                let asset_id = find_asset(&board, &asset)?;
                let item = board.place_asset(asset_id)?;
                self.commit(path, &board)?;
                println!("Placed asset as item {}", short_id(item));
            }
            Commands::Set(args) => {
                let mut board = open(path)?;
                apply_settings(&mut board, args);
                self.commit(path, &board)?;
            }
            Commands::Template { template } => {
                let mut board = open(path)?;
                board.apply_template(template);
                self.commit(path, &board)?;
                println!("Applied template {}", template.name());
            }
            Commands::Logo {
                file,
                clear,
                size,
                rounded,
            } => {
                let mut board = open(path)?;
                if clear {
                    board.clear_logo();
                } else if let Some(file) = file {
                    let asset = read_image_file(&file)?;
                    let asset_id = board.add_asset(asset);
                    self.cache_asset(&board, asset_id);
                    board.set_logo(asset_id)?;
                }
                board.update_config(|c| {
                    if let Some(logo) = c.logo.as_mut() {
                        if let Some(size) = size {
                            logo.size = size;
                        }
                        if let Some(rounded) = rounded {
                            logo.rounded = rounded;
                        }
                    }
                });
                self.commit(path, &board)?;
            }
            Commands::List => {
                let board = open(path)?;
                print_board(&board);
            }
            Commands::Move { item, before } => {
                let mut board = open(path)?;
                let src = find_item(&board, &item)?;
                let dest = find_item(&board, &before)?;
                if !board.move_before(src, dest) {
                    return Err(AppError::Unsupported(format!(
                        "Items can't be reordered in {} layout",
                        board.config.layout_mode
                    )));
                }
                self.commit(path, &board)?;
            }
            Commands::ResetOrder => {
                let mut board = open(path)?;
                if !board.reset_order() {
                    return Err(AppError::Unsupported(
                        "Nothing to reset in this layout".to_string(),
                    ));
                }
                self.commit(path, &board)?;
            }
            Commands::Remove { item } => {
                let mut board = open(path)?;
                let id = find_item(&board, &item)?;
                board.remove_item(id);
                self.commit(path, &board)?;
            }
            Commands::RemoveAsset { asset } => {
                let mut board = open(path)?;
                let id = find_asset(&board, &asset)?;
                board.remove_asset(id);
                if let Some(cache) = &self.cache {
                    if let Err(e) = pollster::block_on(cache.forget_asset(id)) {
                        log::warn!("Failed to drop cached asset {}: {}", id, e);
                    }
                }
                self.commit(path, &board)?;
            }
            Commands::Span { item, cols, rows } => {
                let mut board = open(path)?;
                let id = find_item(&board, &item)?;
                self.require_square(&board, "Spans")?;
                board.set_span(id, cols, rows);
                self.commit(path, &board)?;
            }
            Commands::Crop { item, x, y, zoom } => {
                let mut board = open(path)?;
                let id = find_item(&board, &item)?;
                self.require_square(&board, "Crops")?;
                let mut editor = board
                    .crop_editor(id)
                    .ok_or_else(|| AppError::UnknownItem(item.clone()))?;
                editor.set_pan(x, y);
                editor.set_zoom(zoom);
                let crop: CropState = editor.apply();
                board.apply_crop(id, crop);
                self.commit(path, &board)?;
            }
            Commands::Export { format, out_dir } => {
                let board = open(path)?;
                let format = format.unwrap_or(self.config.export_format);
                let mut delivery: Box<dyn Delivery> = match out_dir {
                    Some(dir) => Box::new(DownloadDelivery::new(dir)),
                    None => detect_delivery(&self.config),
                };
                self.export(&board, format, delivery.as_mut())?;
            }
            Commands::Key { combo } => {
                let action = ShortcutRegistry::resolve_combo(&combo)
                    .ok_or_else(|| AppError::Unsupported(format!("No shortcut bound to {}", combo)))?;
                self.run_shortcut(path, action)?;
            }
            Commands::Shortcuts => ShortcutRegistry::print_all(),
            Commands::Restore { force } => {
                if path.exists() && !force {
                    return Err(AppError::BoardExists(path.to_path_buf()));
                }
                let cache = self.cache.as_mut().ok_or_else(|| {
                    AppError::Unsupported("The local cache is disabled".to_string())
                })?;
                let board = pollster::block_on(cache.load_last())
                    .ok_or_else(|| AppError::Unsupported("Nothing cached to restore".to_string()))?;
                board.save_to_path(path)?;
                println!("Restored {} item(s) into {}", board.items().len(), path.display());
            }
        }
        Ok(())
    }

    fn run_shortcut(&mut self, path: &Path, action: ShortcutAction) -> AppResult<()> {
        match action {
            ShortcutAction::QuickExport => {
                let format = if self.config.export_format.is_raster() {
                    self.config.export_format
                } else {
                    ExportFormat::Png
                };
                let board = open(path)?;
                let mut delivery = detect_delivery(&self.config);
                self.export(&board, format, delivery.as_mut())
            }
            ShortcutAction::PasteImage => self.execute(path, Commands::Paste),
            other => Err(AppError::Unsupported(format!(
                "{:?} is only available in the editor",
                other
            ))),
        }
    }

    fn require_square(&self, board: &BoardState, what: &str) -> AppResult<()> {
        if board.config.layout_mode == moodboard_core::LayoutMode::Square {
            Ok(())
        } else {
            Err(AppError::Unsupported(format!(
                "{} only apply in square layout",
                what
            )))
        }
    }

    fn add_files(&mut self, board: &mut BoardState, files: &[PathBuf]) -> AppResult<usize> {
        let mut paths = Vec::new();
        for file in files {
            if file.is_dir() {
                let mut entries: Vec<PathBuf> = std::fs::read_dir(file)?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| p.is_file() && is_image_path(p))
                    .collect();
                entries.sort();
                paths.extend(entries);
            } else {
                paths.push(file.clone());
            }
        }

        let mut batch = Vec::with_capacity(paths.len());
        for path in &paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            match std::fs::read(path) {
                Ok(data) => batch.push((name, data)),
                Err(e) => eprintln!("Skipping {}: {}", path.display(), e),
            }
        }

        let mut added = 0;
        for result in board.import_batch(batch) {
            match result {
                Ok(item) => {
                    self.cache_item_asset(board, item);
                    added += 1;
                }
                Err(e) => eprintln!("Skipped: {}", e),
            }
        }
        Ok(added)
    }

    fn export(
        &mut self,
        board: &BoardState,
        format: ExportFormat,
        delivery: &mut dyn Delivery,
    ) -> AppResult<()> {
        let rasterizer = match &self.config.font_path {
            Some(font) => SoftwareRasterizer::load_font(font).unwrap_or_else(|e| {
                log::warn!("Using the embedded font: {}", e);
                SoftwareRasterizer::new()
            }),
            None => SoftwareRasterizer::new(),
        };
        let mut view = ViewState::from_config(self.config.view_width, &board.config);
        let report = Exporter::new(rasterizer)
            .with_pixel_ratio(self.config.pixel_ratio)
            .export(board, &mut view, format, delivery)?;
        match report.outcome {
            DeliveryOutcome::Saved(path) => println!(
                "Exported {}x{} {} to {}",
                report.width,
                report.height,
                report.format,
                path.display()
            ),
            DeliveryOutcome::Cancelled => println!("Export cancelled"),
        }
        Ok(())
    }

    fn cache_item_asset(&self, board: &BoardState, item: ItemId) {
        if let Some(asset_id) = board.item(item).map(|i| i.asset_id) {
            self.cache_asset(board, asset_id);
        }
    }

    fn cache_asset(&self, board: &BoardState, asset_id: AssetId) {
        let (Some(cache), Some(asset)) = (&self.cache, board.assets().get(asset_id)) else {
            return;
        };
        if let Err(e) = pollster::block_on(cache.store_asset(asset)) {
            log::warn!("Failed to cache {}: {}", asset.name, e);
        }
    }

    /// Write the board file and refresh the cached copy.
    fn commit(&mut self, path: &Path, board: &BoardState) -> AppResult<()> {
        board.save_to_path(path)?;
        if let Some(cache) = self.cache.as_mut() {
            cache.mark_dirty();
            if let Err(e) = pollster::block_on(cache.save(board)) {
                log::warn!("Failed to cache board: {}", e);
            }
        }
        Ok(())
    }
}

fn open(path: &Path) -> AppResult<BoardState> {
    if !path.exists() {
        return Err(AppError::BoardNotFound(path.to_path_buf()));
    }
    Ok(BoardState::open_path(path)?)
}

fn short_id(id: uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Find an item by 1-based position or id prefix.
pub fn find_item(board: &BoardState, needle: &str) -> AppResult<ItemId> {
    if let Ok(index) = needle.parse::<usize>() {
        if let Some(item) = index.checked_sub(1).and_then(|i| board.items().get(i)) {
            return Ok(item.id);
        }
    }
    let needle_lower = needle.to_ascii_lowercase();
    let mut matches = board
        .items()
        .iter()
        .filter(|item| item.id.to_string().starts_with(&needle_lower));
    match (matches.next(), matches.next()) {
        (Some(item), None) => Ok(item.id),
        (Some(_), Some(_)) => Err(AppError::AmbiguousItem(needle.to_string())),
        _ => Err(AppError::UnknownItem(needle.to_string())),
    }
}

/// Find an asset by id prefix or exact name.
pub fn find_asset(board: &BoardState, needle: &str) -> AppResult<AssetId> {
    let needle_lower = needle.to_ascii_lowercase();
    let matches: Vec<AssetId> = board
        .assets()
        .iter()
        .filter(|a| a.id().to_string().starts_with(&needle_lower) || a.name == needle)
        .map(|a| a.id())
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(AppError::UnknownAsset(needle.to_string())),
        _ => Err(AppError::AmbiguousItem(needle.to_string())),
    }
}

fn positive(value: f64) -> Option<f64> {
    (value > 0.0).then_some(value)
}

fn apply_settings(board: &mut BoardState, args: SetArgs) {
    board.update_config(|c| {
        if let Some(title) = args.title {
            c.title = title;
        }
        if let Some(description) = args.description {
            c.description = description;
        }
        if let Some(show_text) = args.show_text {
            c.show_text = show_text;
        }
        if let Some(layout) = args.layout {
            c.layout_mode = layout;
        }
        if let Some(columns) = args.columns {
            c.columns = columns;
        }
        if let Some(rows) = args.rows {
            c.rows = rows;
        }
        if let Some(gap) = args.gap {
            c.gap = gap;
        }
        if let Some(padding) = args.padding {
            c.padding = padding;
        }
        if let Some(rounded) = args.rounded {
            c.rounded = rounded;
        }
        if let Some(shadow) = args.shadow {
            c.shadow = shadow;
        }
        if let Some(background) = args.background {
            c.background = background;
        }
        if let Some(width) = args.width {
            c.width = positive(width);
        }
        if let Some(height) = args.height {
            c.height = positive(height);
        }
        if let Some(aspect) = args.aspect {
            c.aspect = positive(aspect);
        }
        if let Some(zoom) = args.zoom {
            c.zoom = zoom;
        }
    });
}

fn print_board(board: &BoardState) {
    let c = &board.config;
    println!("Title:       {}", if c.title.is_empty() { "(none)" } else { &c.title });
    if !c.description.is_empty() {
        println!("Description: {}", c.description);
    }
    println!(
        "Layout:      {} ({} cols, {} rows, gap {}, padding {})",
        c.layout_mode, c.columns, c.rows, c.gap, c.padding
    );
    println!("Template:    {}", c.template.name());
    if let Some(logo) = board.logo() {
        println!("Logo:        {}", logo.name);
    }
    println!("Assets:      {}", board.assets().len());
    println!();
    for (index, item) in board.items().iter().enumerate() {
        let name = board
            .resolve(item)
            .map(|a| a.name.as_str())
            .unwrap_or("(missing)");
        println!(
            "{:3}. {}  {:24} span {}x{}  crop {:.0},{:.0} @{:.2}",
            index + 1,
            short_id(item.id),
            name,
            item.col_span,
            item.row_span,
            item.crop.x,
            item.crop.y,
            item.crop.zoom
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodboard_core::LayoutMode;
    use moodboard_core::storage::MemoryStorage;
    use std::sync::Arc;

    fn write_png(path: &Path, color: [u8; 4]) {
        std::fs::write(path, png_bytes(color)).unwrap();
    }

    fn png_bytes(color: [u8; 4]) -> Vec<u8> {
        let pixels: Vec<u8> = std::iter::repeat_n(color, 12).flatten().collect();
        crate::clipboard::rgba_to_png(4, 3, &pixels).unwrap()
    }

    fn app() -> App<MemoryStorage> {
        let cache = AssetCache::new(Arc::new(MemoryStorage::new()));
        App::new(AppConfig::default(), Some(cache))
    }

    fn setup(dir: &Path, images: usize) -> (App<MemoryStorage>, PathBuf) {
        let board = dir.join("test.board");
        let mut app = app();
        app.execute(
            &board,
            Commands::New {
                title: Some("Test".to_string()),
                template: None,
                force: false,
            },
        )
        .unwrap();
        let files: Vec<PathBuf> = (0..images)
            .map(|i| {
                let file = dir.join(format!("{i}.png"));
                write_png(&file, [i as u8 * 40, 0, 0, 255]);
                file
            })
            .collect();
        if !files.is_empty() {
            app.execute(&board, Commands::Add { files }).unwrap();
        }
        (app, board)
    }

    #[test]
    fn test_new_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, board) = setup(dir.path(), 0);
        let again = app.execute(
            &board,
            Commands::New {
                title: None,
                template: None,
                force: false,
            },
        );
        assert!(matches!(again, Err(AppError::BoardExists(_))));
    }

    #[test]
    fn test_add_keeps_order_and_caches() {
        let dir = tempfile::tempdir().unwrap();
        let (app, board) = setup(dir.path(), 3);

        let state = BoardState::open_path(&board).unwrap();
        let names: Vec<_> = state
            .items()
            .iter()
            .filter_map(|i| state.resolve(i))
            .map(|a| a.name.clone())
            .collect();
        assert_eq!(names, ["0.png", "1.png", "2.png"]);

        let cache = app.cache.as_ref().unwrap();
        let cached = pollster::block_on(cache.cached_assets()).unwrap();
        assert_eq!(cached.len(), 3);
    }

    #[test]
    fn test_add_directory_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, board) = setup(dir.path(), 0);
        let images = dir.path().join("images");
        std::fs::create_dir(&images).unwrap();
        write_png(&images.join("b.png"), [0, 0, 255, 255]);
        write_png(&images.join("a.png"), [0, 255, 0, 255]);
        std::fs::write(images.join("notes.txt"), "hi").unwrap();

        app.execute(&board, Commands::Add { files: vec![images] }).unwrap();
        let state = BoardState::open_path(&board).unwrap();
        let first = state.resolve(&state.items()[0]).unwrap();
        assert_eq!(state.items().len(), 2);
        assert_eq!(first.name, "a.png");
    }

    #[test]
    fn test_move_needs_manual_layout() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, board) = setup(dir.path(), 3);

        let auto = app.execute(
            &board,
            Commands::Move {
                item: "3".to_string(),
                before: "1".to_string(),
            },
        );
        assert!(matches!(auto, Err(AppError::Unsupported(_))));

        app.execute(
            &board,
            Commands::Set(SetArgs {
                layout: Some(LayoutMode::Grid),
                ..Default::default()
            }),
        )
        .unwrap();
        let before = BoardState::open_path(&board).unwrap();
        let ids: Vec<_> = before.items().iter().map(|i| i.id).collect();

        app.execute(
            &board,
            Commands::Move {
                item: "3".to_string(),
                before: "1".to_string(),
            },
        )
        .unwrap();
        let after = BoardState::open_path(&board).unwrap();
        let moved: Vec<_> = after.items().iter().map(|i| i.id).collect();
        assert_eq!(moved, [ids[2], ids[0], ids[1]]);

        app.execute(&board, Commands::ResetOrder).unwrap();
        let reset = BoardState::open_path(&board).unwrap();
        let restored: Vec<_> = reset.items().iter().map(|i| i.id).collect();
        assert_eq!(restored, ids);
    }

    #[test]
    fn test_span_and_crop_in_square_layout() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, board) = setup(dir.path(), 1);

        let span = Commands::Span {
            item: "1".to_string(),
            cols: 2,
            rows: 2,
        };
        assert!(app.execute(&board, span.clone()).is_err());

        app.execute(
            &board,
            Commands::Set(SetArgs {
                layout: Some(LayoutMode::Square),
                ..Default::default()
            }),
        )
        .unwrap();
        app.execute(&board, span).unwrap();
        app.execute(
            &board,
            Commands::Crop {
                item: "1".to_string(),
                x: 150.0,
                y: 20.0,
                zoom: 9.0,
            },
        )
        .unwrap();

        let state = BoardState::open_path(&board).unwrap();
        let item = &state.items()[0];
        assert_eq!((item.col_span, item.row_span), (2, 2));
        assert_eq!(item.crop, CropState::new(100.0, 20.0, 4.0));
    }

    #[test]
    fn test_remove_asset_cascades() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, board) = setup(dir.path(), 2);
        let state = BoardState::open_path(&board).unwrap();
        let asset = state.items()[0].asset_id;

        app.execute(
            &board,
            Commands::RemoveAsset {
                asset: asset.to_string(),
            },
        )
        .unwrap();
        let state = BoardState::open_path(&board).unwrap();
        assert_eq!(state.items().len(), 1);
        assert!(!state.assets().contains(asset));
    }

    #[test]
    fn test_export_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, board) = setup(dir.path(), 2);
        let out = dir.path().join("exports");

        app.execute(
            &board,
            Commands::Export {
                format: Some(ExportFormat::Pdf),
                out_dir: Some(out.clone()),
            },
        )
        .unwrap();
        let pdf = std::fs::read(out.join("moodboard.pdf")).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_quick_export_uses_configured_format() {
        let dir = tempfile::tempdir().unwrap();
        let (_, board) = setup(dir.path(), 1);
        let out = dir.path().join("downloads");
        let config = AppConfig {
            export_format: ExportFormat::WebP,
            output_dir: Some(out.clone()),
            ..Default::default()
        };
        let mut app: App<MemoryStorage> = App::new(config, None);

        // Only the download path is deterministic in tests
        if crate::delivery::has_desktop_session() {
            return;
        }
        app.execute(
            &board,
            Commands::Key {
                combo: "Ctrl+S".to_string(),
            },
        )
        .unwrap();
        let bytes = std::fs::read(out.join("moodboard.webp")).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
    }

    #[test]
    fn test_restore_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, board) = setup(dir.path(), 2);
        std::fs::remove_file(&board).unwrap();

        app.execute(&board, Commands::Restore { force: false }).unwrap();
        let state = BoardState::open_path(&board).unwrap();
        assert_eq!(state.items().len(), 2);
        assert_eq!(state.config.title, "Test");
    }

    #[test]
    fn test_find_item() {
        let mut board = BoardState::new();
        let a = board.import("a.png", png_bytes([1, 2, 3, 255])).unwrap();
        let b = board.import("b.png", png_bytes([4, 5, 6, 255])).unwrap();

        assert_eq!(find_item(&board, "1").unwrap(), a);
        assert_eq!(find_item(&board, "2").unwrap(), b);
        assert_eq!(find_item(&board, &b.to_string()[..8]).unwrap(), b);
        assert!(matches!(find_item(&board, "zz"), Err(AppError::UnknownItem(_))));
        assert!(matches!(find_item(&board, ""), Err(AppError::AmbiguousItem(_))));
        assert_eq!(find_asset(&board, "a.png").unwrap(), board.items()[0].asset_id);
    }

    #[test]
    fn test_missing_board() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app();
        let result = app.execute(&dir.path().join("nope.board"), Commands::List);
        assert!(matches!(result, Err(AppError::BoardNotFound(_))));
    }
}
