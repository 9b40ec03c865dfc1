//! Page rasterization: background plus ink strokes into a `tiny_skia::Pixmap`.
#![allow(dead_code)]
//!
//! Page coordinates are template pixels; the output pixmap is `background_size * scale`.
//! Each stroke segment is drawn on its own so per-point ink width survives. A stroke
//! with a single point is drawn as a dot.

pub mod sink;

use std::path::PathBuf;

use thiserror::Error;
use tiny_skia::{
    Color, FillRule, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint,
    Stroke, Transform,
};
use tracing::debug;

use crate::layout::{Page, PlacedStroke};
use crate::template::{PaperStyle, Template, WritingStyle};

pub use sink::{DirectorySink, OutputSink, SinkError};
#[cfg(test)]
pub use sink::MemorySink;

pub const DEFAULT_OUTPUT_SCALE: f64 = 5.0;

const RULE_COLOR: [f32; 4] = [0.62, 0.74, 0.88, 1.0];
const RULE_WIDTH: f32 = 1.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Output scale must be positive and finite, got {0}")]
    InvalidScale(f64),

    #[error("Cannot allocate a {width}x{height} pixmap")]
    PixmapSize { width: u32, height: u32 },

    #[error("Failed to load background {path}: {message}")]
    Background { path: PathBuf, message: String },

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Ink presets
// ────────────────────────────────────────────────────────────────────────────

/// How a writing style lays ink down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InkPreset {
    pub opacity: f32,
    pub width_factor: f32,
    pub line_cap: LineCap,
}

impl InkPreset {
    pub fn for_style(style: WritingStyle) -> Self {
        match style {
            WritingStyle::Pen => Self {
                opacity: 1.0,
                width_factor: 1.0,
                line_cap: LineCap::Round,
            },
            WritingStyle::Pencil => Self {
                opacity: 0.7,
                width_factor: 0.8,
                line_cap: LineCap::Butt,
            },
            WritingStyle::Marker => Self {
                opacity: 0.85,
                width_factor: 2.5,
                line_cap: LineCap::Square,
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rasterizer
// ────────────────────────────────────────────────────────────────────────────

/// A rendered page ready for a sink.
#[derive(Debug, Clone)]
pub struct RasterPage {
    pub index: usize,
    pub pixmap: Pixmap,
}

impl RasterPage {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(e.to_string()))
    }
}

/// Renders pages for one template at a fixed output scale. The background image,
/// if any, is decoded once up front.
#[derive(Debug)]
pub struct PageRasterizer {
    scale: f64,
    background: Option<Pixmap>,
}

impl PageRasterizer {
    pub fn new(template: &Template, scale: f64) -> Result<Self, RenderError> {
        if !(scale > 0.0 && scale.is_finite()) {
            return Err(RenderError::InvalidScale(scale));
        }

        let background = match template.background_image() {
            Some(path) => {
                let pixmap = Pixmap::load_png(path).map_err(|e| RenderError::Background {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                debug!(
                    path = %path.display(),
                    width = pixmap.width(),
                    height = pixmap.height(),
                    "background loaded"
                );
                Some(pixmap)
            }
            None => None,
        };

        Ok(Self { scale, background })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn render(&self, template: &Template, page: &Page) -> Result<RasterPage, RenderError> {
        let width = (template.background_width() * self.scale).round() as u32;
        let height = (template.background_height() * self.scale).round() as u32;
        let mut pixmap =
            Pixmap::new(width, height).ok_or(RenderError::PixmapSize { width, height })?;
        pixmap.fill(Color::WHITE);

        let to_device = Transform::from_scale(self.scale as f32, self.scale as f32);

        match &self.background {
            Some(image) => draw_background(&mut pixmap, image),
            None if template.paper() == PaperStyle::Lined => {
                draw_rules(&mut pixmap, template, to_device)
            }
            None => {}
        }

        let preset = InkPreset::for_style(template.writing_style());
        let paint = ink_paint(template.text_color(), preset.opacity);
        for placed in page.strokes() {
            draw_stroke(&mut pixmap, placed, &paint, preset, to_device);
        }

        Ok(RasterPage {
            index: page.index(),
            pixmap,
        })
    }
}

fn draw_background(pixmap: &mut Pixmap, image: &Pixmap) {
    let sx = pixmap.width() as f32 / image.width() as f32;
    let sy = pixmap.height() as f32 / image.height() as f32;
    let mut paint = PixmapPaint::default();
    paint.quality = FilterQuality::Bilinear;
    pixmap.draw_pixmap(0, 0, image.as_ref(), &paint, Transform::from_scale(sx, sy), None);
}

/// Faint ruling under each text line, from the top margin down to the bottom margin.
fn draw_rules(pixmap: &mut Pixmap, template: &Template, to_device: Transform) {
    let paint = ink_paint(RULE_COLOR, 1.0);
    let stroke = Stroke {
        width: RULE_WIDTH,
        ..Stroke::default()
    };
    let left = 0.0;
    let right = template.background_width() as f32;
    let bottom = template.background_height() - template.bottom_margin();

    let mut y = template.top_margin() + template.font_size();
    while y < bottom {
        let mut pb = PathBuilder::new();
        pb.move_to(left, y as f32);
        pb.line_to(right, y as f32);
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &stroke, to_device, None);
        }
        y += template.line_height();
    }
}

fn draw_stroke(
    pixmap: &mut Pixmap,
    placed: &PlacedStroke,
    paint: &Paint<'_>,
    preset: InkPreset,
    to_device: Transform,
) {
    let points = &placed.stroke.points;

    if let [only] = points.as_slice() {
        let radius = (only.width as f32 * preset.width_factor / 2.0).max(0.5);
        if let Some(dot) = PathBuilder::from_circle(only.x as f32, only.y as f32, radius) {
            pixmap.fill_path(&dot, paint, FillRule::Winding, to_device, None);
        }
        return;
    }

    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let mut pb = PathBuilder::new();
        pb.move_to(a.x as f32, a.y as f32);
        pb.line_to(b.x as f32, b.y as f32);
        let Some(path) = pb.finish() else {
            continue;
        };
        let stroke = Stroke {
            width: ((a.width + b.width) as f32 / 2.0 * preset.width_factor).max(0.0),
            line_cap: preset.line_cap,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, paint, &stroke, to_device, None);
    }
}

fn ink_paint(rgba: [f32; 4], opacity: f32) -> Paint<'static> {
    let [r, g, b, a] = rgba.map(|c| c.clamp(0.0, 1.0));
    let mut paint = Paint::default();
    paint.set_color(
        Color::from_rgba(r, g, b, (a * opacity).clamp(0.0, 1.0)).unwrap_or(Color::BLACK),
    );
    paint.anti_alias = true;
    paint
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
