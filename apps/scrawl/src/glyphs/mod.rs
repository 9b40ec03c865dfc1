// Glyph storage: stroke model, glyph sets, and the lookup trait the layout engine reads.

pub mod model;
pub mod store;

pub use model::{Glyph, Stroke, StrokePoint, GLYPH_EM};
pub use store::{GlyphSet, GlyphSetError, GlyphSource};
