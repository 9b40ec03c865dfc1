//! Glyph sets: the character → handwriting lookup consumed by the layout engine.
#![allow(dead_code)]
//!
//! A set may hold several handwritten variants of the same character. The layout
//! engine picks one per placement so repeated letters do not look stamped.
//! Characters without any variant are never an error; layout leaves a space-wide gap.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::glyphs::model::Glyph;
use crate::layout::markup::is_delimiter;

/// Accepted range for the ink thickness multiplier.
pub const FORCE_MULTIPLIER_RANGE: std::ops::RangeInclusive<f64> = 0.5..=5.0;

#[derive(Debug, Error)]
pub enum GlyphSetError {
    #[error("failed to access glyph set {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed glyph set: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("force multiplier {0} is outside 0.5..=5.0")]
    InvalidForceMultiplier(f64),
}

// ────────────────────────────────────────────────────────────────────────────
// Glyph source trait
// ────────────────────────────────────────────────────────────────────────────

/// Read-only glyph lookup. Implement this to feed the engine from something
/// other than an on-disk [`GlyphSet`].
pub trait GlyphSource {
    /// All handwritten variants recorded for `ch`; empty when the character is missing.
    fn variants(&self, ch: char) -> &[Glyph];

    /// Extra spacing, in page pixels, inserted after every placed character.
    fn letter_spacing(&self) -> i32;

    /// Scale applied to every stroke's ink width.
    fn force_multiplier(&self) -> f64 {
        1.0
    }

    fn lookup(&self, ch: char) -> Option<&Glyph> {
        self.variants(ch).first()
    }

    /// Mean natural advance across the variants of `ch`, in glyph units.
    fn advance_width(&self, ch: char) -> Option<f64> {
        let variants = self.variants(ch);
        if variants.is_empty() {
            return None;
        }
        let total: f64 = variants.iter().map(Glyph::advance_width).sum();
        Some(total / variants.len() as f64)
    }

    /// True iff every character of `text` that needs ink has a glyph.
    /// Whitespace and markup delimiters are always covered.
    fn is_complete(&self, text: &str) -> bool {
        text.chars()
            .filter(|c| needs_ink(*c))
            .all(|c| self.lookup(c).is_some())
    }

    /// Distinct uncovered characters, in order of first appearance.
    fn missing_chars(&self, text: &str) -> Vec<char> {
        let mut missing: Vec<char> = Vec::new();
        for c in text.chars().filter(|c| needs_ink(*c)) {
            if self.lookup(c).is_none() && !missing.contains(&c) {
                missing.push(c);
            }
        }
        missing
    }
}

fn needs_ink(c: char) -> bool {
    !c.is_whitespace() && !is_delimiter(c)
}

// ────────────────────────────────────────────────────────────────────────────
// GlyphSet
// ────────────────────────────────────────────────────────────────────────────

fn default_letter_spacing() -> i32 {
    4
}

fn default_force_multiplier() -> f64 {
    1.0
}

/// A user's handwriting: glyph variants per character plus spacing and thickness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphSet {
    #[serde(default = "default_letter_spacing")]
    pub letter_spacing: i32,
    #[serde(default = "default_force_multiplier")]
    pub force_multiplier: f64,
    #[serde(default)]
    glyphs: BTreeMap<char, Vec<Glyph>>,
}

impl Default for GlyphSet {
    fn default() -> Self {
        Self {
            letter_spacing: default_letter_spacing(),
            force_multiplier: default_force_multiplier(),
            glyphs: BTreeMap::new(),
        }
    }
}

impl GlyphSet {
    /// Reads and validates a glyph set file.
    pub fn load(path: &Path) -> Result<Self, GlyphSetError> {
        let raw = fs::read_to_string(path).map_err(|source| GlyphSetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let set = Self::from_json(&raw)?;
        debug!(
            path = %path.display(),
            characters = set.glyphs.len(),
            letter_spacing = set.letter_spacing,
            "Loaded glyph set"
        );
        Ok(set)
    }

    pub fn from_json(raw: &str) -> Result<Self, GlyphSetError> {
        let set: GlyphSet = serde_json::from_str(raw)?;
        set.validate()?;
        Ok(set)
    }

    pub fn save(&self, path: &Path) -> Result<(), GlyphSetError> {
        let data = serde_json::to_vec(self)?;
        fs::write(path, data).map_err(|source| GlyphSetError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), GlyphSetError> {
        if !FORCE_MULTIPLIER_RANGE.contains(&self.force_multiplier) {
            return Err(GlyphSetError::InvalidForceMultiplier(self.force_multiplier));
        }
        for (ch, variants) in &self.glyphs {
            let blank = variants.iter().filter(|g| g.point_count() == 0).count();
            if blank > 0 {
                warn!(character = %ch, blank, "Glyph set holds variants without ink");
            }
        }
        Ok(())
    }

    /// Records another handwritten variant of `ch`.
    pub fn insert(&mut self, ch: char, glyph: Glyph) {
        self.glyphs.entry(ch).or_default().push(glyph);
    }

    /// Erases every variant of each character in `chars`.
    pub fn remove_chars(&mut self, chars: &str) {
        for c in chars.chars() {
            self.glyphs.remove(&c);
        }
    }

    pub fn variant_count(&self, ch: char) -> usize {
        self.glyphs.get(&ch).map_or(0, Vec::len)
    }

    pub fn characters(&self) -> impl Iterator<Item = char> + '_ {
        self.glyphs.keys().copied()
    }
}

impl GlyphSource for GlyphSet {
    fn variants(&self, ch: char) -> &[Glyph] {
        self.glyphs.get(&ch).map(Vec::as_slice).unwrap_or(&[])
    }

    fn letter_spacing(&self) -> i32 {
        self.letter_spacing
    }

    fn force_multiplier(&self) -> f64 {
        self.force_multiplier
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyphs::model::{Stroke, StrokePoint};

    fn make_glyph(width: f64) -> Glyph {
        Glyph::new(vec![Stroke::new(vec![
            StrokePoint::new(0.0, 0.0, 4.0),
            StrokePoint::new(width, 100.0, 4.0),
        ])])
    }

    fn make_set(chars: &str) -> GlyphSet {
        let mut set = GlyphSet::default();
        for c in chars.chars() {
            set.insert(c, make_glyph(100.0));
        }
        set
    }

    #[test]
    fn test_lookup_missing_char_is_none() {
        let set = make_set("ab");
        assert!(set.lookup('a').is_some());
        assert!(set.lookup('z').is_none());
        assert!(set.advance_width('z').is_none());
    }

    #[test]
    fn test_advance_width_is_mean_of_variants() {
        let mut set = GlyphSet::default();
        set.insert('a', make_glyph(100.0));
        set.insert('a', make_glyph(200.0));
        assert_eq!(set.variant_count('a'), 2);
        assert!((set.advance_width('a').unwrap() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_is_complete_ignores_whitespace_and_delimiters() {
        let set = make_set("Hithere");
        assert!(set.is_complete("Hi there"));
        assert!(set.is_complete("*Hi*\t_there_\n~Hi~"));
        assert!(!set.is_complete("Hi there!"));
    }

    #[test]
    fn test_is_complete_empty_text() {
        assert!(make_set("a").is_complete(""));
    }

    #[test]
    fn test_missing_chars_distinct_in_order() {
        let set = make_set("ab");
        assert_eq!(set.missing_chars("a?b!c?!"), vec!['?', '!', 'c']);
    }

    #[test]
    fn test_remove_chars_erases_all_variants() {
        let mut set = make_set("abc");
        set.insert('a', make_glyph(50.0));
        set.remove_chars("ab");
        assert_eq!(set.variant_count('a'), 0);
        assert_eq!(set.characters().collect::<Vec<_>>(), vec!['c']);
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let set = GlyphSet::from_json(
            r#"{"glyphs": {"a": [{"strokes": [{"points": [{"x": 0, "y": 0}, {"x": 90, "y": 10}]}]}]}}"#,
        )
        .unwrap();
        assert_eq!(set.letter_spacing, 4);
        assert_eq!(set.force_multiplier, 1.0);
        assert!((set.advance_width('a').unwrap() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_json_rejects_out_of_range_multiplier() {
        let err = GlyphSet::from_json(r#"{"force_multiplier": 9.0}"#).unwrap_err();
        assert!(matches!(err, GlyphSetError::InvalidForceMultiplier(m) if m == 9.0));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mine.glyphs.json");
        let mut set = make_set("xy");
        set.letter_spacing = 7;
        set.save(&path).unwrap();

        let loaded = GlyphSet::load(&path).unwrap();
        assert_eq!(loaded, set);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = GlyphSet::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, GlyphSetError::Io { .. }));
    }
}
