//! Still-image decoding for `submit_image` payloads.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::frame::Frame;

/// Decode a base64-encoded PNG or JPEG payload into an RGB frame.
pub fn decode_image(encoded: &str) -> Result<Frame> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .context("image payload is not valid base64")?;
    let decoded = image::load_from_memory(&bytes).context("image payload did not decode")?;
    let rgb = decoded.to_rgb8();
    let (width, height) = (rgb.width(), rgb.height());
    Frame::new(rgb.into_raw(), width, height)
}
