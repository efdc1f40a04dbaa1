//! Global board layout and branding parameters.

use crate::asset::AssetId;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_GAP: u32 = 12;
pub const MAX_GAP: u32 = 48;
pub const DEFAULT_COLUMNS: u32 = 4;
pub const DEFAULT_ROWS: u32 = 3;
pub const MAX_TRACKS: u32 = 12;
pub const DEFAULT_PADDING: u32 = 24;
pub const MAX_PADDING: u32 = 96;
pub const DEFAULT_LOGO_SIZE: u32 = 40;
pub const MIN_LOGO_SIZE: u32 = 16;
pub const MAX_LOGO_SIZE: u32 = 128;
pub const DEFAULT_ZOOM: u32 = 100;
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// How items are arranged on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Masonry columns in natural aspect ratio.
    #[default]
    Auto,
    /// Fixed rows × columns, cover-cropped.
    Grid,
    /// Resizable tiles on a square-cell grid with per-item crop.
    Square,
}

impl LayoutMode {
    /// Manual reordering is disabled for masonry layouts.
    pub fn allows_reorder(self) -> bool {
        self != LayoutMode::Auto
    }

    /// Name used in files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            LayoutMode::Auto => "auto",
            LayoutMode::Grid => "grid",
            LayoutMode::Square => "square",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" | "masonry" => Ok(LayoutMode::Auto),
            "grid" => Ok(LayoutMode::Grid),
            "square" | "flexible" => Ok(LayoutMode::Square),
            other => Err(format!("Unknown layout mode: {}", other)),
        }
    }
}

/// Canvas presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Template {
    #[default]
    #[serde(rename = "custom")]
    Custom,
    #[serde(rename = "ig-square")]
    IgSquare,
    #[serde(rename = "16-9")]
    Widescreen,
    #[serde(rename = "pinterest")]
    Pinterest,
}

/// Parameters a template applies to the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateSpec {
    pub columns: u32,
    pub gap: u32,
    pub padding: u32,
    pub width: f64,
    pub height: f64,
    pub aspect: Option<f64>,
}

impl Template {
    /// All templates in menu order.
    pub const ALL: [Template; 4] = [
        Template::Custom,
        Template::IgSquare,
        Template::Widescreen,
        Template::Pinterest,
    ];

    /// Identifier used in files and on the command line.
    pub fn id(self) -> &'static str {
        match self {
            Template::Custom => "custom",
            Template::IgSquare => "ig-square",
            Template::Widescreen => "16-9",
            Template::Pinterest => "pinterest",
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Template::Custom => "Custom",
            Template::IgSquare => "IG Square",
            Template::Widescreen => "16:9",
            Template::Pinterest => "Pinterest",
        }
    }

    /// Canvas parameters, `None` for the free-form template.
    pub fn spec(self) -> Option<TemplateSpec> {
        match self {
            Template::Custom => None,
            Template::IgSquare => Some(TemplateSpec {
                columns: 3,
                gap: 4,
                padding: 0,
                width: 1080.0,
                height: 1080.0,
                aspect: None,
            }),
            Template::Widescreen => Some(TemplateSpec {
                columns: 4,
                gap: 12,
                padding: 24,
                width: 1920.0,
                height: 1080.0,
                aspect: Some(16.0 / 9.0),
            }),
            Template::Pinterest => Some(TemplateSpec {
                columns: 3,
                gap: 8,
                padding: 20,
                width: 1000.0,
                height: 1500.0,
                aspect: Some(2.0 / 3.0),
            }),
        }
    }
}

impl FromStr for Template {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::ALL
            .into_iter()
            .find(|t| t.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown template: {}", s))
    }
}

/// Logo shown in the board header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoConfig {
    pub asset_id: AssetId,
    #[serde(default = "default_logo_size")]
    pub size: u32,
    #[serde(default = "default_true")]
    pub rounded: bool,
}

/// Board-wide layout and branding parameters.
///
/// Every field has a default so that projects written by older versions
/// load with sensible values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardConfig {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true", deserialize_with = "deserialize_truthy")]
    pub show_text: bool,
    #[serde(default)]
    pub logo: Option<LogoConfig>,
    #[serde(default = "default_gap")]
    pub gap: u32,
    #[serde(default = "default_columns")]
    pub columns: u32,
    #[serde(default = "default_rows")]
    pub rows: u32,
    #[serde(default)]
    pub layout_mode: LayoutMode,
    #[serde(default = "default_true")]
    pub rounded: bool,
    #[serde(default = "default_true")]
    pub shadow: bool,
    #[serde(default = "default_padding")]
    pub padding: u32,
    #[serde(default = "default_background")]
    pub background: String,
    /// Fixed canvas width in CSS pixels.
    #[serde(default)]
    pub width: Option<f64>,
    /// Fixed canvas height in CSS pixels.
    #[serde(default)]
    pub height: Option<f64>,
    /// Width / height ratio used when no explicit height is set.
    #[serde(default)]
    pub aspect: Option<f64>,
    /// Interactive view zoom in percent. Not applied to exports.
    #[serde(default = "default_zoom")]
    pub zoom: u32,
    #[serde(default)]
    pub template: Template,
}

fn default_true() -> bool {
    true
}

fn default_gap() -> u32 {
    DEFAULT_GAP
}

fn default_columns() -> u32 {
    DEFAULT_COLUMNS
}

fn default_rows() -> u32 {
    DEFAULT_ROWS
}

fn default_padding() -> u32 {
    DEFAULT_PADDING
}

fn default_logo_size() -> u32 {
    DEFAULT_LOGO_SIZE
}

fn default_zoom() -> u32 {
    DEFAULT_ZOOM
}

fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}

/// Accept any JSON value and interpret it by truthiness.
fn deserialize_truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    })
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            show_text: true,
            logo: None,
            gap: DEFAULT_GAP,
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            layout_mode: LayoutMode::Auto,
            rounded: true,
            shadow: true,
            padding: DEFAULT_PADDING,
            background: default_background(),
            width: None,
            height: None,
            aspect: None,
            zoom: DEFAULT_ZOOM,
            template: Template::Custom,
        }
    }
}

impl BoardConfig {
    /// Clamp every numeric field into its supported range.
    pub fn normalize(&mut self) {
        self.gap = self.gap.min(MAX_GAP);
        self.columns = self.columns.clamp(1, MAX_TRACKS);
        self.rows = self.rows.clamp(1, MAX_TRACKS);
        self.padding = self.padding.min(MAX_PADDING);
        self.zoom = self.zoom.clamp(10, 400);
        if let Some(logo) = &mut self.logo {
            logo.size = logo.size.clamp(MIN_LOGO_SIZE, MAX_LOGO_SIZE);
        }
        self.width = self.width.filter(|w| w.is_finite() && *w > 0.0);
        self.height = self.height.filter(|h| h.is_finite() && *h > 0.0);
        self.aspect = self.aspect.filter(|a| a.is_finite() && *a > 0.0);
        if parse_hex_color(&self.background).is_none() {
            log::warn!("Invalid background color {:?}, using {}", self.background, DEFAULT_BACKGROUND);
            self.background = default_background();
        }
    }

    /// Whether the header (logo, title, description) is rendered.
    pub fn shows_header(&self) -> bool {
        self.show_text
            && (!self.title.is_empty() || !self.description.is_empty() || self.logo.is_some())
    }

    /// Copy a template's parameters into the config.
    ///
    /// The custom template removes any fixed canvas size.
    pub fn apply_template(&mut self, template: Template) {
        self.template = template;
        match template.spec() {
            Some(spec) => {
                self.columns = spec.columns;
                self.gap = spec.gap;
                self.padding = spec.padding;
                self.width = Some(spec.width);
                self.height = Some(spec.height);
                self.aspect = spec.aspect;
            }
            None => {
                self.width = None;
                self.height = None;
                self.aspect = None;
            }
        }
    }

    /// Background color as RGBA8.
    pub fn background_rgba(&self) -> [u8; 4] {
        parse_hex_color(&self.background).unwrap_or([255, 255, 255, 255])
    }
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` into RGBA8.
pub fn parse_hex_color(s: &str) -> Option<[u8; 4]> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => {
            let mut out = [255u8; 4];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 17;
            }
            Some(out)
        }
        6 => Some([channel(0)?, channel(2)?, channel(4)?, 255]),
        8 => Some([channel(0)?, channel(2)?, channel(4)?, channel(6)?]),
        _ => None,
    }
}
