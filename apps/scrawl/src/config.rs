use std::path::PathBuf;

use anyhow::{ensure, Context, Result};

use crate::render::DEFAULT_OUTPUT_SCALE;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a value does not parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Plain-text / markup document to lay out.
    pub input: PathBuf,
    pub glyph_set: PathBuf,
    /// Template name; the catalog's primary template when unset.
    pub template: Option<String>,
    /// Directory holding `templates.txt` and `<name>.template` records.
    pub template_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub output_scale: f64,
    pub seed: Option<u64>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let output_scale = match lookup("SCRAWL_OUTPUT_SCALE") {
            Some(raw) => raw
                .parse::<f64>()
                .context("SCRAWL_OUTPUT_SCALE must be a number")?,
            None => DEFAULT_OUTPUT_SCALE,
        };
        ensure!(
            output_scale > 0.0 && output_scale.is_finite(),
            "SCRAWL_OUTPUT_SCALE must be positive, got {output_scale}"
        );

        let seed = lookup("SCRAWL_SEED")
            .map(|raw| raw.parse::<u64>())
            .transpose()
            .context("SCRAWL_SEED must be an unsigned integer")?;

        Ok(Config {
            input: require(&lookup, "SCRAWL_INPUT")?.into(),
            glyph_set: require(&lookup, "SCRAWL_GLYPH_SET")?.into(),
            template: lookup("SCRAWL_TEMPLATE").filter(|s| !s.is_empty()),
            template_dir: lookup("SCRAWL_TEMPLATE_DIR").map(PathBuf::from),
            output_dir: lookup("SCRAWL_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./pages")),
            output_scale,
            seed,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
