// Generation: one run from document text to rendered pages in a sink.
// validate template → check glyph coverage → layout → render each page → sink → report.
// The run is synchronous; the binary executes it inside tokio::task::spawn_blocking.

pub mod document;
pub mod pipeline;

pub use document::load_document;
pub use pipeline::{generate, GenerationOptions};
