//! Progress reporting and cooperative cancellation for a layout run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// One progress notification. `fraction` is characters consumed over total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub fraction: f64,
    pub running: bool,
    pub finished: bool,
}

impl Progress {
    pub fn running(fraction: f64) -> Self {
        Self {
            fraction,
            running: true,
            finished: false,
        }
    }

    pub fn finished() -> Self {
        Self {
            fraction: 0.0,
            running: false,
            finished: true,
        }
    }
}

/// Shared flag checked by the engine between tokens.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
