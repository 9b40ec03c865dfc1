//! Page buffers, finished pages, and the per-page layout cursor.

use kurbo::Rect;
use serde::Serialize;

use crate::glyphs::Stroke;

/// Where a placed stroke came from. The rasterizer inks every kind with the
/// template color; `Bold` is the placeholder tag for thickened letter strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StrokeKind {
    Glyph,
    Bold,
    /// Synthesized underline or strikethrough joining a word's letters.
    Connector,
}

/// A stroke already transformed into page coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedStroke {
    pub kind: StrokeKind,
    pub stroke: Stroke,
}

/// Transient pen position for the page being filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    pub x: f64,
    pub y: f64,
    /// Accumulated baseline wobble, kept within `-4.0..=4.0`.
    pub line_offset: f64,
    pub page_index: usize,
}

impl LayoutCursor {
    pub const MAX_LINE_OFFSET: f64 = 4.0;

    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            line_offset: 0.0,
            page_index: 0,
        }
    }

    pub fn nudge_line_offset(&mut self, delta: f64) {
        self.line_offset =
            (self.line_offset + delta).clamp(-Self::MAX_LINE_OFFSET, Self::MAX_LINE_OFFSET);
    }
}

/// Mutable stroke accumulator for the page currently being laid out.
#[derive(Debug, Default)]
pub struct PageBuffer {
    index: usize,
    strokes: Vec<PlacedStroke>,
    glyph_origins: Vec<(f64, f64)>,
}

impl PageBuffer {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Appends the strokes of one placed character.
    pub fn push_glyph(&mut self, origin: (f64, f64), strokes: impl IntoIterator<Item = PlacedStroke>) {
        self.strokes.extend(strokes);
        self.glyph_origins.push(origin);
    }

    pub fn push_connector(&mut self, stroke: Stroke) {
        self.strokes.push(PlacedStroke {
            kind: StrokeKind::Connector,
            stroke,
        });
    }

    /// Seals the buffer into an immutable [`Page`].
    pub fn finish(self) -> Page {
        Page {
            index: self.index,
            strokes: self.strokes,
            glyph_origins: self.glyph_origins,
        }
    }
}

/// A fully laid-out page. Immutable once produced by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    index: usize,
    strokes: Vec<PlacedStroke>,
    /// Pen position of every placed character, in placement order.
    glyph_origins: Vec<(f64, f64)>,
}

impl Page {
    /// Zero-based page number within the document.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn strokes(&self) -> &[PlacedStroke] {
        &self.strokes
    }

    pub fn glyph_count(&self) -> usize {
        self.glyph_origins.len()
    }

    /// Pen position `(x, y)` at which each glyph was placed, in placement order.
    #[cfg(test)]
    pub fn glyph_origins(&self) -> &[(f64, f64)] {
        &self.glyph_origins
    }

    pub fn connector_count(&self) -> usize {
        self.strokes_of(StrokeKind::Connector).count()
    }

    pub fn strokes_of(&self, kind: StrokeKind) -> impl Iterator<Item = &PlacedStroke> {
        self.strokes.iter().filter(move |s| s.kind == kind)
    }

    /// Union of every stroke's bounds, or `None` for a blank page.
    #[cfg(test)]
    pub fn ink_bounds(&self) -> Option<Rect> {
        self.strokes
            .iter()
            .filter_map(|s| s.stroke.bounds())
            .reduce(|acc, r| acc.union(r))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
