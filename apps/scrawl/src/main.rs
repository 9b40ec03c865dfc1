mod compose;
mod config;
mod errors;
mod generation;
mod glyphs;
mod layout;
mod render;
mod template;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::generation::{generate, load_document, GenerationOptions};
use crate::glyphs::GlyphSet;
use crate::layout::{CancelToken, Progress};
use crate::render::DirectorySink;
use crate::template::TemplateCatalog;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting scrawl v{}", env!("CARGO_PKG_VERSION"));

    // Inputs
    let text = load_document(&config.input)?;
    let glyphs = GlyphSet::load(&config.glyph_set)
        .with_context(|| format!("loading glyph set {}", config.glyph_set.display()))?;
    info!(
        path = %config.glyph_set.display(),
        characters = glyphs.characters().count(),
        "Glyph set loaded"
    );

    // Templates: built-ins, overlaid with the configured directory
    let mut catalog = TemplateCatalog::new();
    if let Some(dir) = &config.template_dir {
        catalog.load_dir(dir);
    }
    let record = catalog.resolve(config.template.as_deref())?.clone();

    let options = GenerationOptions {
        run_id: Uuid::new_v4(),
        output_scale: config.output_scale,
        seed: config.seed,
        cancel: CancelToken::new(),
    };
    let mut sink = DirectorySink::create(&config.output_dir, &options.run_id.to_string())?;
    info!(
        run_id = %options.run_id,
        output = %config.output_dir.display(),
        "Writing pages"
    );

    // Ctrl-C stops layout at the next token boundary
    let cancel = options.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling generation");
            cancel.cancel();
        }
    });

    // Layout and rasterization are CPU-bound; run them off the async executor.
    let report = tokio::task::spawn_blocking(move || {
        let mut last_step = 0u32;
        let mut log_progress = |p: Progress| {
            let step = (p.fraction * 10.0) as u32;
            if p.running && step > last_step {
                last_step = step;
                info!(percent = step * 10, "Layout progress");
            }
        };
        generate(&text, &glyphs, &record, &options, &mut sink, &mut log_progress)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in generation: {e}")))?;

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            warn!(code = e.code(), "Generation failed: {e}");
            return Err(e.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
