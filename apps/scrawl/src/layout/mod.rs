// Layout: markup tokenizer, pagination / word-wrap state machine, page buffers.
// Everything here is synchronous and CPU-bound; callers on the async side wrap the
// run in tokio::task::spawn_blocking.

pub mod engine;
pub mod markup;
pub mod page;
pub mod progress;

// Re-export the API consumed by the pipeline and the rasterizer.
pub use engine::{LayoutEngine, LayoutError, LayoutSummary};
pub use page::{Page, PlacedStroke};
pub use progress::{CancelToken, Progress};
