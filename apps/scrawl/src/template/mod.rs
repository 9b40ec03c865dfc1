//! Page templates: geometry and ink styling for a handwritten page.
#![allow(dead_code)]
//!
//! Templates are stored as loosely-typed [`TemplateRecord`]s (the on-disk form) and
//! validated into a [`Template`] before any layout work starts. Validation is the only
//! place a bad writing style or an unusable page area is detected; both are fatal.
//!
//! All derived metrics (`usable_width`, `line_height`, ...) are computed from the
//! fields on every call, so they can never go stale after a font-size or margin edit.

pub mod catalog;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::glyphs::GLYPH_EM;

pub use catalog::TemplateCatalog;

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Template configuration problems. Always fatal to a generation run.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("template '{template}' has writing style '{style}', expected Pen, Pencil or Marker")]
    UnknownWritingStyle { template: String, style: String },

    #[error("template '{template}' has non-positive font size {font_size}")]
    NonPositiveFontSize { template: String, font_size: f64 },

    #[error("template '{template}' has invalid background size {width}x{height}")]
    InvalidBackgroundSize {
        template: String,
        width: f64,
        height: f64,
    },

    #[error("template '{template}' has a negative margin")]
    NegativeMargin { template: String },

    #[error("template '{template}' leaves no usable writing area")]
    NoUsableArea { template: String },

    #[error("template '{template}' text color component {value} is outside 0..=1")]
    ColorOutOfRange { template: String, value: f32 },

    #[error("unknown template '{0}'")]
    UnknownTemplate(String),

    #[error("template name '{0}' must be letters, digits, '-' or '_'")]
    InvalidTemplateName(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Styles
// ────────────────────────────────────────────────────────────────────────────

/// Ink model used when rasterizing strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WritingStyle {
    Pen,
    Pencil,
    Marker,
}

impl WritingStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            WritingStyle::Pen => "Pen",
            WritingStyle::Pencil => "Pencil",
            WritingStyle::Marker => "Marker",
        }
    }
}

impl fmt::Display for WritingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse failure for a writing style name; carries the rejected input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStyle(pub String);

impl FromStr for WritingStyle {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pen" => Ok(WritingStyle::Pen),
            "Pencil" => Ok(WritingStyle::Pencil),
            "Marker" => Ok(WritingStyle::Marker),
            other => Err(UnknownStyle(other.to_string())),
        }
    }
}

/// Procedural paper drawn when a template has no background image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperStyle {
    #[default]
    Blank,
    /// Faint horizontal rules under each text line.
    Lined,
}

// ────────────────────────────────────────────────────────────────────────────
// Stored record
// ────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_BACKGROUND_SIZE: [f64; 2] = [600.0, 800.0];

fn default_background_size() -> [f64; 2] {
    DEFAULT_BACKGROUND_SIZE
}

fn default_text_color() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn default_writing_style() -> String {
    WritingStyle::Pen.as_str().to_string()
}

/// A template as persisted in the catalog. Nothing here is trusted until
/// [`TemplateRecord::validate`] succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub name: String,
    pub font_size: f64,
    /// `[left, right, top, bottom]` in page pixels.
    pub margins: [f64; 4],
    /// `[width, height]` in page pixels.
    #[serde(default = "default_background_size")]
    pub background_size: [f64; 2],
    /// RGBA, each component in `0.0..=1.0`.
    #[serde(default = "default_text_color")]
    pub text_color: [f32; 4],
    #[serde(default = "default_writing_style")]
    pub writing_style: String,
    #[serde(default)]
    pub paper: PaperStyle,
    /// PNG drawn under the strokes, stretched to `background_size`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<PathBuf>,
}

impl TemplateRecord {
    pub fn new(name: &str, margins: [f64; 4], font_size: f64) -> Self {
        Self {
            name: name.to_string(),
            font_size,
            margins,
            background_size: DEFAULT_BACKGROUND_SIZE,
            text_color: default_text_color(),
            writing_style: default_writing_style(),
            paper: PaperStyle::Blank,
            background_image: None,
        }
    }

    /// Checks every invariant and produces the typed [`Template`].
    pub fn validate(&self) -> Result<Template, ConfigError> {
        let template = self.name.clone();

        let writing_style = self.writing_style.parse::<WritingStyle>().map_err(|e| {
            ConfigError::UnknownWritingStyle {
                template: template.clone(),
                style: e.0,
            }
        })?;

        if !(self.font_size > 0.0) {
            return Err(ConfigError::NonPositiveFontSize {
                template,
                font_size: self.font_size,
            });
        }

        let [width, height] = self.background_size;
        if !(width > 0.0 && height > 0.0) {
            return Err(ConfigError::InvalidBackgroundSize {
                template,
                width,
                height,
            });
        }

        if self.margins.iter().any(|m| !(*m >= 0.0)) {
            return Err(ConfigError::NegativeMargin { template });
        }

        if let Some(value) = self
            .text_color
            .iter()
            .copied()
            .find(|c| !(0.0..=1.0).contains(c))
        {
            return Err(ConfigError::ColorOutOfRange { template, value });
        }

        let validated = Template {
            name: self.name.clone(),
            font_size: self.font_size,
            margins: self.margins,
            background_size: self.background_size,
            text_color: self.text_color,
            writing_style,
            paper: self.paper,
            background_image: self.background_image.clone(),
        };

        // Room for at least one word-end buffer horizontally and one line vertically.
        let content_width = validated.usable_width() - validated.left_margin();
        let content_height = validated.usable_height() - validated.top_margin();
        if content_width <= validated.line_end_buffer()
            || content_height <= validated.line_height()
        {
            return Err(ConfigError::NoUsableArea { template });
        }

        Ok(validated)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Validated template
// ────────────────────────────────────────────────────────────────────────────

/// A validated page template. Fields are read-only; build a new record to change them.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    name: String,
    font_size: f64,
    margins: [f64; 4],
    background_size: [f64; 2],
    text_color: [f32; 4],
    writing_style: WritingStyle,
    paper: PaperStyle,
    background_image: Option<PathBuf>,
}

impl Template {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    pub fn left_margin(&self) -> f64 {
        self.margins[0]
    }

    pub fn right_margin(&self) -> f64 {
        self.margins[1]
    }

    pub fn top_margin(&self) -> f64 {
        self.margins[2]
    }

    pub fn bottom_margin(&self) -> f64 {
        self.margins[3]
    }

    pub fn background_width(&self) -> f64 {
        self.background_size[0]
    }

    pub fn background_height(&self) -> f64 {
        self.background_size[1]
    }

    pub fn text_color(&self) -> [f32; 4] {
        self.text_color
    }

    pub fn writing_style(&self) -> WritingStyle {
        self.writing_style
    }

    pub fn paper(&self) -> PaperStyle {
        self.paper
    }

    pub fn background_image(&self) -> Option<&PathBuf> {
        self.background_image.as_ref()
    }

    /// Right edge a word reservation must stay under.
    pub fn usable_width(&self) -> f64 {
        self.background_width() - self.right_margin()
    }

    /// A line starting at or below this y value moves to the next page.
    pub fn usable_height(&self) -> f64 {
        self.background_height() - self.top_margin() - self.bottom_margin()
    }

    pub fn line_height(&self) -> f64 {
        self.font_size + 4.0
    }

    pub fn space_width(&self) -> f64 {
        (self.font_size * 0.5).round()
    }

    pub fn line_end_buffer(&self) -> f64 {
        self.font_size
    }

    /// Glyph space → page space.
    pub fn glyph_scale(&self) -> f64 {
        self.font_size / GLYPH_EM
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record() -> TemplateRecord {
        TemplateRecord::new("test", [40.0, 40.0, 40.0, 40.0], 28.0)
    }

    #[test]
    fn test_derived_metrics_for_reference_page() {
        let t = make_record().validate().unwrap();
        assert_eq!(t.usable_width(), 560.0);
        assert_eq!(t.usable_height(), 720.0);
        assert_eq!(t.line_height(), 32.0);
        assert_eq!(t.space_width(), 14.0);
        assert_eq!(t.line_end_buffer(), 28.0);
        assert!((t.glyph_scale() - 28.0 / 256.0).abs() < 1e-12);
    }

    #[test]
    fn test_space_width_rounds() {
        let mut record = make_record();
        record.font_size = 27.0;
        assert_eq!(record.validate().unwrap().space_width(), 14.0);
        record.font_size = 25.0;
        assert_eq!(record.validate().unwrap().space_width(), 13.0);
    }

    #[test]
    fn test_metrics_follow_font_size_change() {
        let mut record = make_record();
        record.font_size = 40.0;
        let t = record.validate().unwrap();
        assert_eq!(t.line_height(), 44.0);
        assert_eq!(t.space_width(), 20.0);
    }

    #[test]
    fn test_writing_styles_parse() {
        for (name, style) in [
            ("Pen", WritingStyle::Pen),
            ("Pencil", WritingStyle::Pencil),
            ("Marker", WritingStyle::Marker),
        ] {
            let mut record = make_record();
            record.writing_style = name.to_string();
            assert_eq!(record.validate().unwrap().writing_style(), style);
        }
    }

    #[test]
    fn test_unknown_writing_style_is_config_error() {
        let mut record = make_record();
        record.writing_style = "Crayon".to_string();
        assert_eq!(
            record.validate().unwrap_err(),
            ConfigError::UnknownWritingStyle {
                template: "test".to_string(),
                style: "Crayon".to_string()
            }
        );
    }

    #[test]
    fn test_margins_swallowing_page_rejected() {
        let mut record = make_record();
        record.margins = [300.0, 300.0, 40.0, 40.0];
        assert!(matches!(
            record.validate(),
            Err(ConfigError::NoUsableArea { .. })
        ));

        let mut record = make_record();
        record.margins = [40.0, 40.0, 400.0, 400.0];
        assert!(matches!(
            record.validate(),
            Err(ConfigError::NoUsableArea { .. })
        ));
    }

    #[test]
    fn test_non_positive_font_size_rejected() {
        let mut record = make_record();
        record.font_size = 0.0;
        assert!(matches!(
            record.validate(),
            Err(ConfigError::NonPositiveFontSize { .. })
        ));
    }

    #[test]
    fn test_nan_font_size_rejected() {
        let mut record = make_record();
        record.font_size = f64::NAN;
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_color_out_of_range_rejected() {
        let mut record = make_record();
        record.text_color = [0.0, 1.5, 0.0, 1.0];
        assert!(matches!(
            record.validate(),
            Err(ConfigError::ColorOutOfRange { value, .. }) if value == 1.5
        ));
    }

    #[test]
    fn test_negative_margin_rejected() {
        let mut record = make_record();
        record.margins[1] = -5.0;
        assert!(matches!(
            record.validate(),
            Err(ConfigError::NegativeMargin { .. })
        ));
    }

    #[test]
    fn test_record_json_defaults() {
        let record: TemplateRecord =
            serde_json::from_str(r#"{"name": "x", "font_size": 20, "margins": [10, 10, 10, 10]}"#)
                .unwrap();
        assert_eq!(record.background_size, DEFAULT_BACKGROUND_SIZE);
        assert_eq!(record.writing_style, "Pen");
        assert_eq!(record.paper, PaperStyle::Blank);
        assert!(record.background_image.is_none());
    }
}
