//! Owned RGB frames handed from sources to the pipeline.
//!
//! A `Frame` is the unit every source produces: decoded still images and
//! camera captures both arrive here as tightly packed RGB24. The pipeline
//! borrows the pixels for the duration of one inference call and never
//! retains them across passes.

use anyhow::{anyhow, Result};

/// A decoded RGB frame (3 bytes per pixel, row-major).
pub struct Frame {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    /// Build a frame, validating that the pixel buffer matches the claimed
    /// dimensions.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rejects_mismatched_buffer() {
        assert!(Frame::new(vec![0u8; 12], 2, 2).is_ok());
        assert!(Frame::new(vec![0u8; 11], 2, 2).is_err());
        assert!(Frame::new(vec![], u32::MAX, u32::MAX).is_err());
    }
}
