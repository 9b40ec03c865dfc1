#![allow(dead_code)]

use std::path::PathBuf;

use thiserror::Error;

use crate::glyphs::GlyphSetError;
use crate::layout::LayoutError;
use crate::render::{RenderError, SinkError};
use crate::template::ConfigError;

/// Application-level error type.
/// Every fallible stage of a generation run converts into this with `?`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Glyph set error: {0}")]
    GlyphSet(#[from] GlyphSetError),

    #[error("Cannot read document {path}: {message}")]
    Document { path: PathBuf, message: String },

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Output error: {0}")]
    Sink(#[from] SinkError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code, printed alongside the message on failure.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::GlyphSet(_) => "GLYPH_SET_ERROR",
            AppError::Document { .. } => "DOCUMENT_ERROR",
            AppError::Layout(LayoutError::Cancelled { .. }) => "CANCELLED",
            AppError::Render(_) => "RENDER_ERROR",
            AppError::Sink(_) => "OUTPUT_ERROR",
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "INTERNAL_ERROR"
            }
        }
    }
}
