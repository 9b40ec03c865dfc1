use std::path::Path;

use tracing::debug;

use crate::errors::AppError;

/// Reads a UTF-8 document. Invalid UTF-8 is rejected rather than replaced.
pub fn load_document(path: &Path) -> Result<String, AppError> {
    let bytes = std::fs::read(path).map_err(|e| AppError::Document {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let text = String::from_utf8(bytes).map_err(|e| AppError::Document {
        path: path.to_path_buf(),
        message: format!("not valid UTF-8: {}", e.utf8_error()),
    })?;
    debug!(path = %path.display(), chars = text.chars().count(), "document loaded");
    Ok(text)
}
