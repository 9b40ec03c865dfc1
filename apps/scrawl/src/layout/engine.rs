//! Pagination and word-wrap state machine.
//!
//! # Architecture
//! - One forward scan over [`Tokenizer`] output. The only lookahead is the tokenizer's
//!   search for a span's closing delimiter.
//! - Before a word or markup span is placed, its expected width is reserved against
//!   the right edge. If it does not fit, the line breaks first. Nothing is re-checked
//!   while the run is being placed, and standalone symbols are never pre-checked.
//! - Every finished page is moved into the caller's page handler as soon as it fills,
//!   so rendering can start before layout ends.
//!
//! Progress is reported after every source character (markup delimiters included);
//! cancellation is checked between tokens.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::compose::{DecorationTrace, JitterSource, StrokeComposer};
use crate::glyphs::{GlyphSource, GLYPH_EM};
use crate::layout::markup::{MarkupStyle, Token, Tokenizer};
use crate::layout::page::{LayoutCursor, Page, PageBuffer};
use crate::layout::progress::{CancelToken, Progress};
use crate::template::Template;

/// Line-start x is `left_margin` scaled by up to ±10%.
const LINE_START_JITTER: f64 = 0.1;
const TAB_SPACES: f64 = 4.0;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("Layout cancelled after {consumed} characters")]
    Cancelled { consumed: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutState {
    InWord,
    InWhitespace,
    InMarkup,
    AtLineBreak,
    AtPageBreak,
    Done,
}

/// Totals for one completed layout run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LayoutSummary {
    pub pages: usize,
    pub glyphs_placed: usize,
    pub connectors: usize,
    pub characters: usize,
}

pub struct LayoutEngine<'a> {
    template: &'a Template,
    glyphs: &'a dyn GlyphSource,
    composer: StrokeComposer,
    jitter: &'a mut dyn JitterSource,
    cancel: CancelToken,
    state: LayoutState,
    cursor: LayoutCursor,
    page: PageBuffer,
    consumed: usize,
    total: usize,
    summary: LayoutSummary,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(
        template: &'a Template,
        glyphs: &'a dyn GlyphSource,
        jitter: &'a mut dyn JitterSource,
    ) -> Self {
        let composer = StrokeComposer::new(
            template.glyph_scale(),
            glyphs.letter_spacing(),
            glyphs.force_multiplier(),
        );
        Self {
            template,
            glyphs,
            composer,
            jitter,
            cancel: CancelToken::new(),
            state: LayoutState::InWhitespace,
            cursor: LayoutCursor::new(template.left_margin(), template.top_margin()),
            page: PageBuffer::new(0),
            consumed: 0,
            total: 0,
            summary: LayoutSummary::default(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[cfg(test)]
    pub fn state(&self) -> LayoutState {
        self.state
    }

    /// Lays out `text`, handing each finished page to `on_page` in order.
    ///
    /// An empty document still produces one blank page. On cancellation the page
    /// in progress is dropped and no further pages are emitted.
    pub fn layout(
        &mut self,
        text: &str,
        on_progress: &mut dyn FnMut(Progress),
        on_page: &mut dyn FnMut(Page),
    ) -> Result<LayoutSummary, LayoutError> {
        self.reset(text);
        on_progress(Progress::running(0.0));

        for token in Tokenizer::new(text) {
            if self.cancel.is_cancelled() {
                debug!(
                    consumed = self.consumed,
                    total = self.total,
                    state = ?self.state,
                    "layout cancelled"
                );
                return Err(LayoutError::Cancelled {
                    consumed: self.consumed,
                });
            }

            match token {
                Token::Space => {
                    self.state = LayoutState::InWhitespace;
                    self.cursor.x += self.template.space_width();
                }
                Token::Tab => {
                    self.state = LayoutState::InWhitespace;
                    self.cursor.x += self.template.space_width() * TAB_SPACES;
                }
                Token::Newline => self.break_line(on_page),
                Token::Word(word) => {
                    self.state = LayoutState::InWord;
                    self.place_run(word, None, on_page);
                }
                Token::Span { style, word } => {
                    self.state = LayoutState::InMarkup;
                    self.place_run(word, Some(style), on_page);
                }
                Token::Symbol(c) => {
                    self.state = LayoutState::InWord;
                    self.place_char(c, false);
                }
            }

            for _ in 0..token.char_len() {
                self.consumed += 1;
                on_progress(Progress::running(self.consumed as f64 / self.total as f64));
            }
        }

        self.finish_page(on_page);
        self.state = LayoutState::Done;
        on_progress(Progress::finished());
        Ok(self.summary)
    }

    fn reset(&mut self, text: &str) {
        self.state = LayoutState::InWhitespace;
        self.cursor = LayoutCursor::new(self.template.left_margin(), self.template.top_margin());
        self.page = PageBuffer::new(0);
        self.consumed = 0;
        self.total = text.chars().count();
        self.summary = LayoutSummary {
            characters: self.total,
            ..LayoutSummary::default()
        };
    }

    /// Width a run is expected to occupy, including the trailing space and the
    /// line-end buffer.
    fn expected_length(&self, word: &str) -> f64 {
        let scale = self.template.font_size() / GLYPH_EM;
        let spacing = f64::from(self.glyphs.letter_spacing());
        let letters: f64 = word
            .chars()
            .map(|c| match self.glyphs.advance_width(c) {
                Some(advance) => (advance + spacing) * scale,
                None => self.template.space_width(),
            })
            .sum();
        letters + self.template.space_width() + self.template.line_end_buffer()
    }

    fn place_run(&mut self, word: &str, style: Option<MarkupStyle>, on_page: &mut dyn FnMut(Page)) {
        if self.cursor.x + self.expected_length(word) >= self.template.usable_width() {
            self.break_line(on_page);
            self.state = if style.is_some() {
                LayoutState::InMarkup
            } else {
                LayoutState::InWord
            };
        }

        let bold = style == Some(MarkupStyle::Bold);
        let mut trace = style
            .filter(MarkupStyle::draws_connector)
            .map(DecorationTrace::new);

        for c in word.chars() {
            if let Some(bounds) = self.place_char(c, bold) {
                if let Some(trace) = trace.as_mut() {
                    trace.record(bounds, &mut *self.jitter);
                }
            }
        }

        if let Some(connector) = trace.and_then(DecorationTrace::finish) {
            self.page.push_connector(connector);
        }
    }

    /// Places one character, or leaves a space-wide gap when it has no glyph.
    /// Returns the placed ink bounds.
    fn place_char(&mut self, c: char, bold: bool) -> Option<kurbo::Rect> {
        let glyphs = self.glyphs;
        let variants = glyphs.variants(c);
        if variants.is_empty() {
            self.cursor.x += self.template.space_width();
            return None;
        }

        let glyph = &variants[self.jitter.pick(variants.len())];
        let placement = self.composer.place(
            glyph,
            bold,
            &mut self.cursor,
            &mut self.page,
            &mut *self.jitter,
        );
        debug_assert!(placement.advance >= 0.0, "pen moved left by {}", placement.advance);
        Some(placement.bounds)
    }

    fn break_line(&mut self, on_page: &mut dyn FnMut(Page)) {
        self.state = LayoutState::AtLineBreak;
        let left = self.template.left_margin();
        self.cursor.x = left * (1.0 + self.jitter.symmetric(LINE_START_JITTER));
        self.cursor.y += self.template.line_height();

        if self.cursor.y >= self.template.usable_height() {
            self.break_page(on_page);
        }
    }

    fn break_page(&mut self, on_page: &mut dyn FnMut(Page)) {
        self.state = LayoutState::AtPageBreak;
        self.finish_page(on_page);
        self.cursor.page_index += 1;
        self.cursor.y = self.template.top_margin();
        self.cursor.line_offset = 0.0;
    }

    fn finish_page(&mut self, on_page: &mut dyn FnMut(Page)) {
        let next = PageBuffer::new(self.cursor.page_index + 1);
        let page = std::mem::replace(&mut self.page, next).finish();

        self.summary.pages += 1;
        self.summary.glyphs_placed += page.glyph_count();
        self.summary.connectors += page.connector_count();
        debug!(
            page = page.index(),
            glyphs = page.glyph_count(),
            strokes = page.strokes().len(),
            "page finalized"
        );
        on_page(page);
    }
}

/// Runs a layout and collects every page. Progress is discarded.
#[cfg(test)]
pub fn layout_pages(
    template: &Template,
    glyphs: &dyn GlyphSource,
    jitter: &mut dyn JitterSource,
    text: &str,
) -> Result<Vec<Page>, LayoutError> {
    let mut pages = Vec::new();
    LayoutEngine::new(template, glyphs, jitter).layout(text, &mut |_| {}, &mut |page| {
        pages.push(page)
    })?;
    Ok(pages)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{NoJitter, RandomJitter};
    use crate::glyphs::{Glyph, GlyphSet, Stroke, StrokePoint};
    use crate::layout::page::StrokeKind;
    use crate::template::TemplateRecord;

    /// 600×800 page, 40 px margins, 28 px font: usable width 560, usable height 720,
    /// line height 32, space 14.
    fn make_template() -> Template {
        TemplateRecord::new("test", [40.0, 40.0, 40.0, 40.0], 28.0)
            .validate()
            .unwrap()
    }

    /// 128 units wide, so 14 px at 28 px font size.
    fn make_glyph() -> Glyph {
        Glyph::new(vec![
            Stroke::new(vec![
                StrokePoint::new(0.0, 40.0, 8.0),
                StrokePoint::new(128.0, 220.0, 8.0),
            ]),
            Stroke::new(vec![StrokePoint::new(64.0, 128.0, 8.0)]),
        ])
    }

    fn make_set(chars: &str) -> GlyphSet {
        let mut set = GlyphSet::default();
        for c in chars.chars() {
            set.insert(c, make_glyph());
        }
        set
    }

    fn run(text: &str, set: &GlyphSet, jitter: &mut dyn JitterSource) -> Vec<Page> {
        layout_pages(&make_template(), set, jitter, text).unwrap()
    }

    #[test]
    fn test_hi_there_single_page() {
        let set = make_set("Hithere");
        let pages = run("Hi there", &set, &mut NoJitter);

        assert_eq!(pages.len(), 1, "short text must fit on one page");
        let origins = pages[0].glyph_origins();
        assert_eq!(origins.len(), 7);
        assert!(
            origins.windows(2).all(|w| w[1].0 >= w[0].0),
            "x must not decrease on a single line: {origins:?}"
        );
        assert!(origins.iter().all(|o| o.1 == 40.0));

        // 'i' advances 14 + letter spacing 4; the space adds exactly 14 more.
        let gap = origins[2].0 - (origins[1].0 + 18.0);
        assert!((gap - 14.0).abs() < 1e-9, "space gap was {gap}");
    }

    #[test]
    fn test_empty_document_yields_one_blank_page() {
        let set = make_set("a");
        let mut pages = Vec::new();
        let summary = LayoutEngine::new(&make_template(), &set, &mut NoJitter)
            .layout("", &mut |_| {}, &mut |p| pages.push(p))
            .unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].strokes().is_empty());
        assert_eq!(summary.pages, 1);
        assert_eq!(summary.characters, 0);
    }

    #[test]
    fn test_missing_char_advances_space_width() {
        let set = make_set("a");
        let pages = run("a#a", &set, &mut NoJitter);
        let origins = pages[0].glyph_origins();
        assert_eq!(origins.len(), 2, "missing char must not place strokes");
        assert!((origins[1].0 - origins[0].0 - (18.0 + 14.0)).abs() < 1e-9);

        // Inside a word too.
        let pages = run("aza", &set, &mut NoJitter);
        let origins = pages[0].glyph_origins();
        assert!((origins[1].0 - origins[0].0 - (18.0 + 14.0)).abs() < 1e-9);
    }

    #[test]
    fn test_tab_advances_four_spaces() {
        let set = make_set("a");
        let pages = run("a\ta", &set, &mut NoJitter);
        let origins = pages[0].glyph_origins();
        assert_eq!(origins.len(), 2);
        // 40 + 'a' (14 + spacing 4) + 4 × 14
        assert_eq!(origins[1], (114.0, 40.0));
    }

    /// Always draws the low end of every range.
    struct LowJitter;

    impl JitterSource for LowJitter {
        fn unit(&mut self) -> f64 {
            0.0
        }
    }

    fn make_stem_set(chars: &str) -> GlyphSet {
        let mut set = GlyphSet::default();
        set.letter_spacing = 0;
        for c in chars.chars() {
            set.insert(
                c,
                Glyph::new(vec![Stroke::new(vec![
                    StrokePoint::new(128.0, 20.0, 8.0),
                    StrokePoint::new(128.0, 230.0, 8.0),
                ])]),
            );
        }
        set
    }

    #[test]
    fn test_thin_glyphs_never_move_pen_left() {
        let set = make_stem_set("li");
        let pages = run("llll", &set, &mut LowJitter);
        let origins = pages[0].glyph_origins();
        assert_eq!(origins.len(), 4);
        assert!(origins.iter().all(|&o| o == (40.0, 40.0)), "{origins:?}");

        let pages = run("lilililililili", &set, &mut RandomJitter::seeded(1));
        let origins = pages[0].glyph_origins();
        assert_eq!(origins.len(), 14);
        assert!(
            origins.windows(2).all(|w| w[1].0 >= w[0].0),
            "x must not decrease: {origins:?}"
        );
    }

    #[test]
    fn test_bold_doubles_width_without_extra_strokes() {
        let set = make_set("bold");
        let plain = run("bold", &set, &mut NoJitter);
        let bold = run("*bold*", &set, &mut NoJitter);

        assert_eq!(bold[0].glyph_count(), 4);
        assert_eq!(bold[0].connector_count(), 0);
        assert_eq!(plain[0].strokes().len(), bold[0].strokes().len());
        for (p, b) in plain[0].strokes().iter().zip(bold[0].strokes()) {
            assert_eq!(b.kind, StrokeKind::Bold);
            for (pp, bp) in p.stroke.points.iter().zip(&b.stroke.points) {
                assert_eq!(pp.location(), bp.location());
                assert!((bp.width - 2.0 * pp.width).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_underline_adds_one_connector_after_letters() {
        let set = make_set("under");
        let pages = run("_under_", &set, &mut NoJitter);
        let page = &pages[0];

        assert_eq!(page.glyph_count(), 5);
        assert_eq!(page.connector_count(), 1);
        let last = page.strokes().last().unwrap();
        assert_eq!(last.kind, StrokeKind::Connector);
        assert_eq!(last.stroke.points.len(), 5, "one anchor per placed glyph");
    }

    #[test]
    fn test_strikethrough_anchor_count_skips_missing_chars() {
        let set = make_set("ab");
        let pages = run("~azb~", &set, &mut RandomJitter::seeded(5));
        let connector = pages[0].strokes_of(StrokeKind::Connector).next().unwrap();
        assert_eq!(connector.stroke.points.len(), 2);
    }

    #[test]
    fn test_malformed_markup_places_delimiter_as_symbol() {
        let set = make_set("ab*");
        let pages = run("*ab", &set, &mut NoJitter);
        assert_eq!(pages[0].glyph_count(), 3);
        assert!(pages[0].strokes_of(StrokeKind::Bold).next().is_none());
    }

    #[test]
    fn test_long_text_paginates_within_usable_height() {
        let set = make_set("word");
        let text = "word ".repeat(300);
        let template = make_template();
        let pages = run(&text, &set, &mut RandomJitter::seeded(11));

        assert!(pages.len() > 1, "expected several pages, got {}", pages.len());
        for (i, page) in pages.iter().enumerate() {
            assert_eq!(page.index(), i);
            for (_, y) in page.glyph_origins() {
                assert!(*y < template.usable_height(), "origin y {y} on page {i}");
            }
        }
        let placed: usize = pages.iter().map(Page::glyph_count).sum();
        assert_eq!(placed, 1200);
    }

    #[test]
    fn test_forced_wrap_resets_x_near_left_margin() {
        let set = make_set("word");
        let text = "word ".repeat(40);
        let pages = run(&text, &set, &mut RandomJitter::seeded(21));
        let origins = pages[0].glyph_origins();

        let line_starts: Vec<f64> = origins
            .windows(2)
            .filter(|w| w[1].1 != w[0].1)
            .map(|w| w[1].0)
            .collect();
        assert!(!line_starts.is_empty(), "text should wrap at least once");
        for x in line_starts {
            assert!((36.0..=44.0).contains(&x), "line start x {x} outside left ±10%");
        }
    }

    #[test]
    fn test_newlines_page_break_resets_to_top_margin() {
        let set = make_set("a");
        let text = "a\n".repeat(40);
        let pages = run(&text, &set, &mut NoJitter);

        // 40 + 32 * 22 = 744 ≥ 720 triggers the first break.
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].glyph_count(), 22);
        assert_eq!(pages[1].glyph_origins()[0], (40.0, 40.0));
    }

    #[test]
    fn test_overlong_word_not_rewrapped() {
        let set = make_set("x");
        let word = "x".repeat(40);
        let pages = run(&word, &set, &mut NoJitter);
        let origins = pages[0].glyph_origins();

        // The reservation fails at the first line, so the whole word moves down once.
        assert!(origins.iter().all(|o| o.1 == 72.0));
        assert!(origins.last().unwrap().0 > 560.0);
    }

    #[test]
    fn test_symbols_have_no_reservation() {
        let set = make_set("!");
        let pages = run(&"!".repeat(60), &set, &mut NoJitter);
        assert!(pages[0].glyph_origins().iter().all(|o| o.1 == 40.0));
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let set = make_set("Thequickbrownfox");
        let text = "The quick _brown_ *fox*\nThe ~quick~ fox ".repeat(20);
        let first = run(&text, &set, &mut RandomJitter::seeded(99));
        let second = run(&text, &set, &mut RandomJitter::seeded(99));
        assert_eq!(first, second);
    }

    #[test]
    fn test_variant_chosen_through_jitter() {
        let mut set = make_set("a");
        let wide = Glyph::new(vec![Stroke::new(vec![
            StrokePoint::new(0.0, 0.0, 4.0),
            StrokePoint::new(256.0, 256.0, 4.0),
        ])]);
        set.insert('a', wide);
        assert_eq!(set.variant_count('a'), 2);

        // NoJitter always takes the first variant.
        let pages = run("a", &set, &mut NoJitter);
        let bounds = pages[0].ink_bounds().unwrap();
        assert!((bounds.width() - 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_progress_sequence() {
        let set = make_set("ab");
        let mut seen = Vec::new();
        LayoutEngine::new(&make_template(), &set, &mut NoJitter)
            .layout("ab c", &mut |p| seen.push(p), &mut |_| {})
            .unwrap();

        assert_eq!(seen.len(), 6);
        assert_eq!(seen[0], Progress::running(0.0));
        assert_eq!(seen[4], Progress::running(1.0));
        assert_eq!(seen[5], Progress::finished());
        assert!(seen[..5].windows(2).all(|w| w[1].fraction >= w[0].fraction));
    }

    #[test]
    fn test_progress_counts_delimiters() {
        let set = make_set("ab");
        let mut count = 0;
        LayoutEngine::new(&make_template(), &set, &mut NoJitter)
            .layout("*ab*", &mut |p| count += usize::from(p.running), &mut |_| {})
            .unwrap();
        // initial report plus four characters
        assert_eq!(count, 5);
    }

    #[test]
    fn test_cancel_before_start_emits_nothing() {
        let set = make_set("ab");
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut pages = Vec::new();
        let result = LayoutEngine::new(&make_template(), &set, &mut NoJitter)
            .with_cancel(cancel)
            .layout("ab ab", &mut |_| {}, &mut |p| pages.push(p));

        assert_eq!(result, Err(LayoutError::Cancelled { consumed: 0 }));
        assert!(pages.is_empty());
    }

    #[test]
    fn test_cancel_mid_run_stops_early() {
        let set = make_set("ab");
        let template = make_template();
        let mut jitter = NoJitter;
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let mut engine = LayoutEngine::new(&template, &set, &mut jitter).with_cancel(cancel);

        let result = engine.layout(
            "ab ab ab ab",
            &mut |p| {
                if p.fraction >= 0.5 {
                    trigger.cancel();
                }
            },
            &mut |_| {},
        );

        match result {
            Err(LayoutError::Cancelled { consumed }) => assert!(consumed < 11),
            other => panic!("expected cancellation, got {other:?}"),
        }
        assert_ne!(engine.state(), LayoutState::Done);
    }

    #[test]
    fn test_summary_totals() {
        let set = make_set("ab");
        let template = make_template();
        let mut jitter = NoJitter;
        let mut engine = LayoutEngine::new(&template, &set, &mut jitter);
        let summary = engine
            .layout("_ab_ b", &mut |_| {}, &mut |_| {})
            .unwrap();
        assert_eq!(
            summary,
            LayoutSummary { pages: 1, glyphs_placed: 3, connectors: 1, characters: 6 }
        );
        assert_eq!(engine.state(), LayoutState::Done);
    }
}
