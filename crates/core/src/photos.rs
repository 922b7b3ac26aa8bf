//! Upload constraints for inspection photos.

use crate::error::CoreError;

/// Accepted image extensions (lowercase, without the dot).
pub const SUPPORTED_PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "heic"];

/// Largest accepted upload (10 MiB).
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// Validate an upload and return its normalized extension.
pub fn validate_photo(filename: &str, size: usize) -> Result<String, CoreError> {
    if size == 0 {
        return Err(CoreError::Validation("Photo file is empty".into()));
    }
    if size > MAX_PHOTO_BYTES {
        return Err(CoreError::Validation(format!(
            "Photo is {size} bytes; the limit is {MAX_PHOTO_BYTES}"
        )));
    }

    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_PHOTO_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CoreError::Validation(format!(
            "Unsupported photo format '{filename}'. Supported: {SUPPORTED_PHOTO_EXTENSIONS:?}"
        )));
    }
    Ok(ext)
}
