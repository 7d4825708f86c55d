use pixelpress_imaging::ImageFormat;

use crate::error::{PipelineError, PipelineResult};

/// The user-facing rejection for anything outside the allow-list. Names the
/// accepted set so the caller can act on it.
pub const UNSUPPORTED_MESSAGE: &str =
    "Invalid file type. Only images (JPEG, PNG, WebP, GIF) are allowed.";

/// Gate every source through the fixed MIME allow-list before any transform
/// is attempted. Absent or unrecognized types are rejected.
pub fn validate_mime(mime: Option<&str>) -> PipelineResult<ImageFormat> {
    mime.and_then(ImageFormat::from_mime)
        .ok_or_else(|| PipelineError::UnsupportedFormat(UNSUPPORTED_MESSAGE.to_string()))
}
