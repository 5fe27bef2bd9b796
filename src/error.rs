//! Error taxonomy for the overlay kernel.
//!
//! Seam implementations (engines, cameras) report failures as `anyhow::Error`
//! with context; the session maps them into this taxonomy at its boundary so
//! hosts can distinguish the failures they must react to. `ModelLoad` and
//! `DeviceAcquisition` are always surfaced through the session error
//! callback; inference failures during a pass are logged and the pipeline
//! returns to idle.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KernelError {
    /// Model or weights unreachable, malformed, or warm-up inference failed.
    #[error("model load failed: {0}")]
    ModelLoad(#[source] anyhow::Error),

    /// The inference engine rejected or failed a detection call.
    #[error("inference failed: {0}")]
    Inference(#[source] anyhow::Error),

    /// Camera unavailable or acquisition denied by the platform.
    #[error("camera acquisition failed: {0}")]
    DeviceAcquisition(#[source] anyhow::Error),

    /// A class index with no entry in the label table.
    #[error("class index {index} has no entry in a label table of {len} entries")]
    OutOfRangeLabel { index: usize, len: usize },

    /// Submitted image payload could not be decoded.
    #[error("image decode failed: {0}")]
    Decode(#[source] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn display_carries_the_failure_site() {
        let err = KernelError::DeviceAcquisition(anyhow!("/dev/video0 busy"));
        assert!(err.to_string().contains("camera acquisition failed"));

        let err = KernelError::OutOfRangeLabel { index: 91, len: 81 };
        assert!(err.to_string().contains("91"));
        assert!(err.to_string().contains("81"));
    }
}
