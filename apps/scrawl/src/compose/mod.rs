//! Stroke composition: turns normalized glyphs into page-space ink.
//!
//! # Placement
//! A glyph is shifted so its leftmost ink sits at x = 0, scaled uniformly by
//! `font_size / 256`, and translated to the pen position plus the current baseline
//! wobble. The pen then advances by the placed ink width, ±1 px of jitter, the set's
//! letter spacing and up to 0.2 px more, and the wobble drifts by ±0.125 px. The
//! advance never goes below zero, so the pen only moves right along a line.
//!
//! # Emphasis
//! - Bold doubles every point's ink width; coordinates and stroke count are unchanged.
//! - Underline / strikethrough collect one anchor per placed letter and join them into
//!   a single connector stroke after the word.

pub mod jitter;

use kurbo::{Affine, Rect, Vec2};

use crate::glyphs::{Glyph, Stroke, StrokePoint};
use crate::layout::markup::MarkupStyle;
use crate::layout::page::{LayoutCursor, PageBuffer, PlacedStroke, StrokeKind};

pub use jitter::{JitterSource, RandomJitter};
#[cfg(test)]
pub use jitter::NoJitter;

const ADVANCE_JITTER: f64 = 1.0;
const SPACING_JITTER_MAX: f64 = 0.2;
const BASELINE_DRIFT: f64 = 0.125;
const BOLD_WIDTH_FACTOR: f64 = 2.0;

const UNDERLINE_DROP: f64 = 4.0;
const CONNECTOR_WIDTH: f64 = 3.0;
const CONNECTOR_JITTER: f64 = 2.0;
const CONNECTOR_SMOOTHING: f64 = 0.1;

/// Result of placing one glyph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Page-space bounds of the placed ink (zero-size at the pen for blank glyphs).
    pub bounds: Rect,
    /// How far the pen moved.
    pub advance: f64,
}

/// Maps a glyph from normalized space to the page at `origin`.
pub fn glyph_transform(glyph_bounds: Option<Rect>, scale: f64, origin: Vec2) -> Affine {
    let min_x = glyph_bounds.map_or(0.0, |b| b.x0);
    Affine::translate(origin) * Affine::scale(scale) * Affine::translate((-min_x, 0.0))
}

/// Copies `strokes` with emphasis applied. Bold widens ink only.
pub fn emphasize(strokes: &[Stroke], bold: bool) -> Vec<PlacedStroke> {
    strokes
        .iter()
        .map(|stroke| {
            if bold {
                PlacedStroke {
                    kind: StrokeKind::Bold,
                    stroke: stroke.with_width_scaled(BOLD_WIDTH_FACTOR),
                }
            } else {
                PlacedStroke {
                    kind: StrokeKind::Glyph,
                    stroke: stroke.clone(),
                }
            }
        })
        .collect()
}

/// Places glyphs for one template / glyph-set pairing.
#[derive(Debug, Clone, Copy)]
pub struct StrokeComposer {
    scale: f64,
    letter_spacing: f64,
    force_multiplier: f64,
}

impl StrokeComposer {
    pub fn new(scale: f64, letter_spacing: i32, force_multiplier: f64) -> Self {
        Self {
            scale,
            letter_spacing: f64::from(letter_spacing),
            force_multiplier,
        }
    }

    /// Places `glyph` at the cursor, appends its strokes to `page`, and advances the
    /// cursor. Returns the placed bounds and the advance taken.
    pub fn place(
        &self,
        glyph: &Glyph,
        bold: bool,
        cursor: &mut LayoutCursor,
        page: &mut PageBuffer,
        jitter: &mut dyn JitterSource,
    ) -> Placement {
        let origin = Vec2::new(cursor.x, cursor.y + cursor.line_offset);
        let affine = glyph_transform(glyph.bounds(), self.scale, origin);

        let placed: Vec<Stroke> = glyph
            .strokes
            .iter()
            .map(|s| s.transformed(affine).with_width_scaled(self.force_multiplier))
            .collect();

        let bounds = placed
            .iter()
            .filter_map(Stroke::bounds)
            .reduce(|acc, r| acc.union(r))
            .unwrap_or_else(|| Rect::from_origin_size(origin.to_point(), (0.0, 0.0)));

        page.push_glyph((cursor.x, cursor.y), emphasize(&placed, bold));

        let advance = (bounds.width()
            + jitter.symmetric(ADVANCE_JITTER)
            + self.letter_spacing
            + jitter.between(0.0, SPACING_JITTER_MAX))
        .max(0.0);
        cursor.x += advance;
        cursor.nudge_line_offset(jitter.symmetric(BASELINE_DRIFT));

        Placement { bounds, advance }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Underline / strikethrough connector
// ────────────────────────────────────────────────────────────────────────────

/// Collects connector anchors while a decorated word is being placed.
#[derive(Debug, Clone)]
pub struct DecorationTrace {
    style: MarkupStyle,
    anchors: Vec<StrokePoint>,
    path_y: Option<f64>,
}

impl DecorationTrace {
    pub fn new(style: MarkupStyle) -> Self {
        Self {
            style,
            anchors: Vec::new(),
            path_y: None,
        }
    }

    /// Adds the anchor for one placed letter.
    pub fn record(&mut self, bounds: Rect, jitter: &mut dyn JitterSource) {
        let ideal_y = match self.style {
            MarkupStyle::Strikethrough => bounds.center().y,
            _ => bounds.y1 + UNDERLINE_DROP,
        };
        let y = match self.path_y {
            None => ideal_y,
            Some(prev) => {
                let wandered = prev + jitter.symmetric(CONNECTOR_JITTER);
                wandered * (1.0 - CONNECTOR_SMOOTHING) + ideal_y * CONNECTOR_SMOOTHING
            }
        };
        self.path_y = Some(y);
        self.anchors
            .push(StrokePoint::new(bounds.center().x, y, CONNECTOR_WIDTH));
    }

    #[cfg(test)]
    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    /// The connector stroke, or `None` when no letter was placed.
    pub fn finish(self) -> Option<Stroke> {
        if self.anchors.is_empty() {
            None
        } else {
            Some(Stroke::new(self.anchors))
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
