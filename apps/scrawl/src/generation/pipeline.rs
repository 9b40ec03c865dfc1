//! Generation pipeline: drives layout, rendering and output for one document.
//!
//! Flow: validate template → build rasterizer → coverage warning → layout, rendering
//! and sinking each page as soon as the engine finalizes it → report.
//!
//! Configuration problems abort before any layout work. A page that fails to render
//! or to reach the sink is logged and recorded in the report, and the run continues.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::compose::RandomJitter;
use crate::errors::AppError;
use crate::glyphs::GlyphSource;
use crate::layout::{CancelToken, LayoutEngine, LayoutSummary, Page, Progress};
use crate::render::{OutputSink, PageRasterizer, DEFAULT_OUTPUT_SCALE};
use crate::template::{TemplateRecord, WritingStyle};

/// Per-run knobs that are not part of the template.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Identifies the run in logs and output file names.
    pub run_id: Uuid,
    pub output_scale: f64,
    /// Fixes all jitter when set.
    pub seed: Option<u64>,
    pub cancel: CancelToken,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            output_scale: DEFAULT_OUTPUT_SCALE,
            seed: None,
            cancel: CancelToken::new(),
        }
    }
}

/// A page that was laid out but did not make it to the sink.
#[derive(Debug, Clone, Serialize)]
pub struct PageFailure {
    pub page: usize,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub run_id: Uuid,
    pub template: String,
    pub writing_style: WritingStyle,
    pub seed: Option<u64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub layout: LayoutSummary,
    pub pages_written: usize,
    pub failures: Vec<PageFailure>,
    /// Characters of the document the glyph set cannot draw.
    pub missing_chars: Vec<char>,
}

/// Runs one generation. Blocking; call from `spawn_blocking` on the async side.
pub fn generate(
    text: &str,
    glyphs: &dyn GlyphSource,
    record: &TemplateRecord,
    options: &GenerationOptions,
    sink: &mut dyn OutputSink,
    on_progress: &mut dyn FnMut(Progress),
) -> Result<GenerationReport, AppError> {
    let started_at = Utc::now();
    let template = record.validate()?;
    let rasterizer = PageRasterizer::new(&template, options.output_scale)?;

    let missing_chars = glyphs.missing_chars(text);
    if !missing_chars.is_empty() {
        let missing: String = missing_chars.iter().collect();
        warn!(
            run_id = %options.run_id,
            missing = %missing,
            "Glyph set is incomplete for this document; missing characters leave gaps"
        );
    }

    info!(
        run_id = %options.run_id,
        template = template.name(),
        style = %template.writing_style(),
        chars = text.chars().count(),
        "Generation started"
    );

    let mut pages_written = 0usize;
    let mut failures: Vec<PageFailure> = Vec::new();
    let mut handle_page = |page: Page| {
        let index = page.index();
        let outcome = rasterizer
            .render(&template, &page)
            .map_err(AppError::from)
            .and_then(|raster| sink.accept(raster).map_err(AppError::from));
        match outcome {
            Ok(()) => pages_written += 1,
            Err(e) => {
                warn!(run_id = %options.run_id, page = index, "Page output failed: {e}");
                failures.push(PageFailure {
                    page: index,
                    error: e.to_string(),
                });
            }
        }
    };

    let mut jitter = RandomJitter::new(options.seed);
    let layout = LayoutEngine::new(&template, glyphs, &mut jitter)
        .with_cancel(options.cancel.clone())
        .layout(text, on_progress, &mut handle_page)?;

    let finished_at = Utc::now();
    info!(
        run_id = %options.run_id,
        pages = layout.pages,
        glyphs = layout.glyphs_placed,
        written = pages_written,
        failed = failures.len(),
        elapsed_ms = (finished_at - started_at).num_milliseconds(),
        "Generation complete"
    );

    Ok(GenerationReport {
        run_id: options.run_id,
        template: template.name().to_string(),
        writing_style: template.writing_style(),
        seed: options.seed,
        started_at,
        finished_at,
        layout,
        pages_written,
        failures,
        missing_chars,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
