//! Output sinks for rendered pages.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::{RasterPage, RenderError};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Encode(#[from] RenderError),
}

/// Destination for finished pages. Called once per page, in page order.
pub trait OutputSink {
    fn accept(&mut self, page: RasterPage) -> Result<(), SinkError>;
}

/// Writes each page as `<prefix>-<NNN>.png`, numbered from 001.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    prefix: String,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Creates `dir` (and parents) if needed.
    pub fn create(dir: &Path, prefix: &str) -> Result<Self, SinkError> {
        std::fs::create_dir_all(dir).map_err(|source| SinkError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
            written: Vec::new(),
        })
    }

    pub fn page_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}-{:03}.png", self.prefix, index + 1))
    }

    /// Files written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl OutputSink for DirectorySink {
    fn accept(&mut self, page: RasterPage) -> Result<(), SinkError> {
        let path = self.page_path(page.index);
        let png = page.encode_png()?;
        std::fs::write(&path, &png).map_err(|source| SinkError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), bytes = png.len(), "page written");
        self.written.push(path);
        Ok(())
    }
}

/// Keeps pages in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySink {
    pages: Vec<RasterPage>,
}

#[cfg(test)]
impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> &[RasterPage] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<RasterPage> {
        self.pages
    }
}

#[cfg(test)]
impl OutputSink for MemorySink {
    fn accept(&mut self, page: RasterPage) -> Result<(), SinkError> {
        self.pages.push(page);
        Ok(())
    }
}
