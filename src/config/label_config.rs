//! LabelConfig data structure
//!
//! Page geometry, raster options, label layout and export settings.
//! Every field has a default, so an empty JSON object is a valid config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::document::{Orientation, PageFormat};
use crate::render::RasterOptions;
use crate::utils::color::parse_hex_color;

/// Page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// Page width in millimetres
    #[serde(default = "default_page_mm")]
    pub width_mm: f32,

    /// Page height in millimetres
    #[serde(default = "default_page_mm")]
    pub height_mm: f32,

    #[serde(default)]
    pub orientation: Orientation,
}

fn default_page_mm() -> f32 {
    100.0
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            width_mm: default_page_mm(),
            height_mm: default_page_mm(),
            orientation: Orientation::default(),
        }
    }
}

impl PageConfig {
    pub fn format(&self) -> PageFormat {
        PageFormat::new(self.width_mm, self.height_mm, self.orientation)
    }
}

/// Rasterizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterConfig {
    /// Oversampling factor applied to the logical label size
    #[serde(default = "default_scale")]
    pub scale: u32,

    /// Fill colour for transparent areas, "#RRGGBB"
    #[serde(default = "default_background_color")]
    pub background_color: String,
}

fn default_scale() -> u32 {
    3
}

fn default_background_color() -> String {
    "#FFFFFF".to_string()
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            background_color: default_background_color(),
        }
    }
}

impl RasterConfig {
    /// Build rasterizer options, falling back to white on a malformed colour
    pub fn options(&self) -> RasterOptions {
        let background = parse_hex_color(&self.background_color).unwrap_or((255, 255, 255));
        RasterOptions {
            scale: self.scale.max(1),
            background: [background.0, background.1, background.2],
        }
    }
}

/// Label layout in logical pixels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Edge length of the square label
    #[serde(default = "default_label_size")]
    pub size: u32,

    #[serde(default = "default_padding")]
    pub padding: f32,

    /// Edge length of each QR code
    #[serde(default = "default_qr_size")]
    pub qr_size: f32,

    /// White margin between the QR modules and its frame
    #[serde(default = "default_qr_frame_padding")]
    pub qr_frame_padding: f32,

    #[serde(default = "default_qr_frame_color")]
    pub qr_frame_color: String,

    #[serde(default = "default_qr_color")]
    pub qr_color: String,

    #[serde(default = "default_section_label_size")]
    pub section_label_size: f32,

    #[serde(default = "default_section_label_color")]
    pub section_label_color: String,

    #[serde(default = "default_value_text_size")]
    pub value_text_size: f32,

    #[serde(default = "default_value_text_color")]
    pub value_text_color: String,

    /// Line height as a multiple of the value text size
    #[serde(default = "default_value_line_height")]
    pub value_line_height: f32,

    /// Horizontal inset of the value text inside the padded area
    #[serde(default = "default_value_inset")]
    pub value_inset: f32,

    /// Vertical gap between the parts of one section
    #[serde(default = "default_element_gap")]
    pub element_gap: f32,

    /// Vertical gap between the two sections (may be negative)
    #[serde(default = "default_section_gap")]
    pub section_gap: f32,

    /// Value text is truncated with an ellipsis after this many lines
    #[serde(default = "default_max_value_lines")]
    pub max_value_lines: usize,

    #[serde(default = "default_username_label")]
    pub username_label: String,

    #[serde(default = "default_password_label")]
    pub password_label: String,

    /// Shown instead of an empty value
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_label_size() -> u32 {
    400
}

fn default_padding() -> f32 {
    24.0
}

fn default_qr_size() -> f32 {
    130.0
}

fn default_qr_frame_padding() -> f32 {
    8.0
}

fn default_qr_frame_color() -> String {
    "#F3F4F6".to_string()
}

fn default_qr_color() -> String {
    "#000000".to_string()
}

fn default_section_label_size() -> f32 {
    10.0
}

fn default_section_label_color() -> String {
    "#9CA3AF".to_string()
}

fn default_value_text_size() -> f32 {
    14.0
}

fn default_value_text_color() -> String {
    "#374151".to_string()
}

fn default_value_line_height() -> f32 {
    1.25
}

fn default_value_inset() -> f32 {
    16.0
}

fn default_element_gap() -> f32 {
    4.0
}

fn default_section_gap() -> f32 {
    -4.0
}

fn default_max_value_lines() -> usize {
    2
}

fn default_username_label() -> String {
    "USUÁRIO".to_string()
}

fn default_password_label() -> String {
    "SENHA".to_string()
}

fn default_placeholder() -> String {
    "Aguardando...".to_string()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            size: default_label_size(),
            padding: default_padding(),
            qr_size: default_qr_size(),
            qr_frame_padding: default_qr_frame_padding(),
            qr_frame_color: default_qr_frame_color(),
            qr_color: default_qr_color(),
            section_label_size: default_section_label_size(),
            section_label_color: default_section_label_color(),
            value_text_size: default_value_text_size(),
            value_text_color: default_value_text_color(),
            value_line_height: default_value_line_height(),
            value_inset: default_value_inset(),
            element_gap: default_element_gap(),
            section_gap: default_section_gap(),
            max_value_lines: default_max_value_lines(),
            username_label: default_username_label(),
            password_label: default_password_label(),
            placeholder: default_placeholder(),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory receiving the generated PDFs
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Upper bound for a batch item to finish rendering, in milliseconds
    #[serde(default = "default_settle_timeout_ms")]
    pub settle_timeout_ms: u64,

    #[serde(default = "default_single_prefix")]
    pub single_prefix: String,

    /// Filename stem used when the username sanitizes to nothing
    #[serde(default = "default_fallback_name")]
    pub fallback_name: String,

    #[serde(default = "default_batch_prefix")]
    pub batch_prefix: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_settle_timeout_ms() -> u64 {
    150
}

fn default_single_prefix() -> String {
    "etiqueta".to_string()
}

fn default_fallback_name() -> String {
    "credencial".to_string()
}

fn default_batch_prefix() -> String {
    "lote-etiquetas".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            settle_timeout_ms: default_settle_timeout_ms(),
            single_prefix: default_single_prefix(),
            fallback_name: default_fallback_name(),
            batch_prefix: default_batch_prefix(),
        }
    }
}

impl ExportConfig {
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LabelConfig {
    #[serde(default)]
    pub page: PageConfig,

    #[serde(default)]
    pub raster: RasterConfig,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub export: ExportConfig,

    /// TrueType font replacing the embedded face
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
}

impl LabelConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: LabelConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LabelConfig::default();
        assert_eq!(config.page.width_mm, 100.0);
        assert_eq!(config.page.height_mm, 100.0);
        assert_eq!(config.raster.scale, 3);
        assert_eq!(config.layout.size, 400);
        assert_eq!(config.export.settle_timeout(), Duration::from_millis(150));
        assert!(config.font_path.is_none());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: LabelConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.layout.placeholder, "Aguardando...");
        assert_eq!(config.export.single_prefix, "etiqueta");
        assert_eq!(config.export.batch_prefix, "lote-etiquetas");
    }

    #[test]
    fn test_partial_json() {
        let json = r##"{ "raster": { "scale": 2 }, "page": { "orientation": "landscape" } }"##;
        let config: LabelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.raster.scale, 2);
        assert_eq!(config.raster.background_color, "#FFFFFF");
        assert_eq!(config.page.orientation, Orientation::Landscape);
    }

    #[test]
    fn test_raster_options() {
        let raster = RasterConfig {
            scale: 0,
            background_color: "#102030".to_string(),
        };
        let options = raster.options();
        assert_eq!(options.scale, 1);
        assert_eq!(options.background, [0x10, 0x20, 0x30]);

        let broken = RasterConfig {
            scale: 3,
            background_color: "nope".to_string(),
        };
        assert_eq!(broken.options().background, [255, 255, 255]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = LabelConfig::load_from_file("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
