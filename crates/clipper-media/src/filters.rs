//! FFmpeg video filter definitions.

use clipper_models::{VERTICAL_HEIGHT, VERTICAL_WIDTH};

/// Scale to fit inside the vertical frame, keeping aspect ratio, then pad the
/// rest with black bars centered on both axes.
pub const FILTER_VERTICAL_FIT: &str = concat!(
    "scale=1080:1920:force_original_aspect_ratio=decrease,",
    "pad=1080:1920:(ow-iw)/2:(oh-ih)/2"
);

/// Fit-and-pad filter for an arbitrary target frame.
pub fn filter_fit_and_pad(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
        w = width,
        h = height
    )
}

/// Filter used for every cut clip.
pub fn vertical_filter() -> String {
    filter_fit_and_pad(VERTICAL_WIDTH, VERTICAL_HEIGHT)
}
