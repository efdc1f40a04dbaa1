//! Command-line interface definition.

use clap::{Parser, Subcommand};
use moodboard_core::{LayoutMode, Template};
use moodboard_render::ExportFormat;
use std::path::PathBuf;

/// Default board file in the working directory.
pub const DEFAULT_BOARD: &str = "moodboard.board";

#[derive(Parser, Debug)]
#[command(name = "moodboard", version, about = "Build image moodboards and export them")]
pub struct Cli {
    #[arg(help = "Board project file", short, long, default_value = DEFAULT_BOARD, global = true)]
    pub board: PathBuf,

    #[arg(help = "Config file to use instead of the default one", long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(help = "Don't write to the local asset cache", long, default_value_t = false, global = true)]
    pub no_cache: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(about = "Create an empty board")]
    New {
        #[arg(help = "Board title", long)]
        title: Option<String>,
        #[arg(help = "Canvas preset: custom, ig-square, 16-9, pinterest", long)]
        template: Option<Template>,
        #[arg(help = "Overwrite an existing file", long, default_value_t = false)]
        force: bool,
    },

    #[command(about = "Add image files (directories are scanned for images)")]
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    #[command(about = "Add the image currently on the clipboard")]
    Paste,

    #[command(about = "Place an already imported asset again")]
    Place {
        #[arg(help = "Asset id or id prefix")]
        asset: String,
    },

    #[command(about = "Change board settings")]
    Set(SetArgs),

    #[command(about = "Apply a canvas preset")]
    Template { template: Template },

    #[command(about = "Set or clear the header logo")]
    Logo {
        #[arg(help = "Image file for the logo")]
        file: Option<PathBuf>,
        #[arg(help = "Remove the logo", long, default_value_t = false, conflicts_with = "file")]
        clear: bool,
        #[arg(help = "Logo size in pixels (16-128)", long)]
        size: Option<u32>,
        #[arg(help = "Draw the logo as a circle", long)]
        rounded: Option<bool>,
    },

    #[command(about = "Show board settings and items")]
    List,

    #[command(about = "Move an item in front of another (grid and square layouts)")]
    Move {
        #[arg(help = "Item to move (index or id prefix)")]
        item: String,
        #[arg(help = "Item to place it before")]
        before: String,
    },

    #[command(about = "Restore the original item order")]
    ResetOrder,

    #[command(about = "Remove an item from the board")]
    Remove { item: String },

    #[command(about = "Remove an asset and every item that shows it")]
    RemoveAsset { asset: String },

    #[command(about = "Set how many cells an item spans (square layout)")]
    Span { item: String, cols: u32, rows: u32 },

    #[command(about = "Set an item's crop (square layout)")]
    Crop {
        item: String,
        #[arg(help = "Horizontal focus, 0-100", long, default_value_t = 50.0)]
        x: f64,
        #[arg(help = "Vertical focus, 0-100", long, default_value_t = 50.0)]
        y: f64,
        #[arg(help = "Zoom factor, 1-4", long, default_value_t = 1.0)]
        zoom: f64,
    },

    #[command(about = "Export the board as an image or PDF")]
    Export {
        #[arg(help = "png, jpeg, webp or pdf (defaults to the configured format)", short, long)]
        format: Option<ExportFormat>,
        #[arg(help = "Write into this directory instead of asking", long)]
        out_dir: Option<PathBuf>,
    },

    #[command(about = "Run a keyboard shortcut, e.g. Ctrl+S")]
    Key { combo: String },

    #[command(about = "List keyboard shortcuts")]
    Shortcuts,

    #[command(about = "Recover the last board from the local cache")]
    Restore {
        #[arg(help = "Overwrite an existing file", long, default_value_t = false)]
        force: bool,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SetArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(help = "Show title and description", long)]
    pub show_text: Option<bool>,
    #[arg(help = "auto, grid or square", long)]
    pub layout: Option<LayoutMode>,
    #[arg(long)]
    pub columns: Option<u32>,
    #[arg(long)]
    pub rows: Option<u32>,
    #[arg(help = "Gap between items (0-48)", long)]
    pub gap: Option<u32>,
    #[arg(help = "Outer padding (0-96)", long)]
    pub padding: Option<u32>,
    #[arg(long)]
    pub rounded: Option<bool>,
    #[arg(long)]
    pub shadow: Option<bool>,
    #[arg(help = "Background colour, e.g. #f5f5f5", long)]
    pub background: Option<String>,
    #[arg(help = "Canvas width in pixels (0 clears)", long)]
    pub width: Option<f64>,
    #[arg(help = "Canvas height in pixels (0 clears)", long)]
    pub height: Option<f64>,
    #[arg(help = "Width/height ratio (0 clears)", long)]
    pub aspect: Option<f64>,
    #[arg(help = "View zoom in percent", long)]
    pub zoom: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_export() {
        let cli = Cli::parse_from(["moodboard", "-b", "x.board", "export", "-f", "jpeg"]);
        assert_eq!(cli.board, PathBuf::from("x.board"));
        assert!(matches!(
            cli.command,
            Commands::Export {
                format: Some(ExportFormat::Jpeg),
                out_dir: None
            }
        ));
    }

    #[test]
    fn test_parse_set() {
        let cli = Cli::parse_from(["moodboard", "set", "--layout", "square", "--columns", "6"]);
        let Commands::Set(args) = cli.command else {
            panic!("expected set");
        };
        assert_eq!(args.layout, Some(LayoutMode::Square));
        assert_eq!(args.columns, Some(6));
        assert_eq!(cli.board, PathBuf::from(DEFAULT_BOARD));
    }
}
