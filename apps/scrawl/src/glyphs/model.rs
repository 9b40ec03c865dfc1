//! Stroke-based glyph representation.
//!
//! Glyphs are captured on a canonical 256×256 canvas. Every point carries its own
//! ink width so that pressure-sensitive handwriting survives the round trip to disk.

use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};

/// Side length of the normalized glyph canvas.
pub const GLYPH_EM: f64 = 256.0;

fn default_point_width() -> f64 {
    4.0
}

fn default_force() -> f64 {
    1.0
}

/// A single sampled point of a handwritten stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
    /// Rendered ink thickness at this point.
    #[serde(default = "default_point_width")]
    pub width: f64,
    /// Pen pressure as captured. Carried through layout untouched.
    #[serde(default = "default_force")]
    pub force: f64,
    /// Seconds since the stroke began.
    #[serde(default)]
    pub time_offset: f64,
}

impl StrokePoint {
    pub fn new(x: f64, y: f64, width: f64) -> Self {
        Self {
            x,
            y,
            width,
            force: 1.0,
            time_offset: 0.0,
        }
    }

    pub fn location(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// An ordered sequence of points drawn without lifting the pen.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<StrokePoint>,
}

impl Stroke {
    pub fn new(points: Vec<StrokePoint>) -> Self {
        Self { points }
    }

    /// Bounding box of the stroke's centerline, or `None` for an empty stroke.
    pub fn bounds(&self) -> Option<Rect> {
        let first = self.points.first()?.location();
        let rect = self
            .points
            .iter()
            .skip(1)
            .fold(Rect::from_points(first, first), |acc, p| {
                acc.union_pt(p.location())
            });
        Some(rect)
    }

    /// Returns a copy mapped through `affine`. Ink width follows the affine's
    /// uniform scale so thickness stays proportional to the glyph.
    pub fn transformed(&self, affine: Affine) -> Stroke {
        let width_scale = affine.determinant().abs().sqrt();
        let points = self
            .points
            .iter()
            .map(|p| {
                let moved = affine * p.location();
                StrokePoint {
                    x: moved.x,
                    y: moved.y,
                    width: p.width * width_scale,
                    ..*p
                }
            })
            .collect();
        Stroke { points }
    }

    /// Returns a copy with every point's ink width multiplied by `factor`.
    /// Coordinates are left alone.
    pub fn with_width_scaled(&self, factor: f64) -> Stroke {
        let points = self
            .points
            .iter()
            .map(|p| StrokePoint {
                width: p.width * factor,
                ..*p
            })
            .collect();
        Stroke { points }
    }
}

/// The handwritten form of one character in normalized glyph space.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Glyph {
    pub strokes: Vec<Stroke>,
    /// Explicit advance in glyph units. Derived from the ink extent when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    advance_width: Option<f64>,
}

impl Glyph {
    pub fn new(strokes: Vec<Stroke>) -> Self {
        Self {
            strokes,
            advance_width: None,
        }
    }

    #[cfg(test)]
    pub fn with_advance_width(mut self, advance_width: f64) -> Self {
        self.advance_width = Some(advance_width);
        self
    }

    /// Union of all stroke bounds, or `None` if the glyph holds no points.
    pub fn bounds(&self) -> Option<Rect> {
        self.strokes
            .iter()
            .filter_map(Stroke::bounds)
            .reduce(|acc, r| acc.union(r))
    }

    /// Natural advance width in glyph units.
    pub fn advance_width(&self) -> f64 {
        self.advance_width
            .unwrap_or_else(|| self.bounds().map_or(0.0, |b| b.width()))
    }

    pub fn point_count(&self) -> usize {
        self.strokes.iter().map(|s| s.points.len()).sum()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
