//! Camera seam and the synthetic stub camera.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::frame::Frame;

/// Camera facing preference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Facing {
    Front,
    Back,
}

impl Facing {
    pub fn opposite(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }
}

/// Camera device seam.
///
/// `acquire` hands out at most one live stream at a time; callers must drop
/// (or `stop`) the previous stream before re-acquiring. Implementations may
/// reject a second acquisition outright.
pub trait Camera {
    fn acquire(&mut self, facing: Facing) -> Result<Box<dyn CameraStream>>;
}

/// A live camera stream.
pub trait CameraStream {
    /// Capture the next frame.
    fn frame(&mut self) -> Result<Frame>;

    /// Native capture dimensions.
    fn native_width(&self) -> u32;
    fn native_height(&self) -> u32;

    /// Stop capturing. Dropping the stream also releases the device.
    fn stop(&mut self);
}

/// Configuration for the synthetic camera.
#[derive(Clone, Debug)]
pub struct SyntheticCameraConfig {
    /// Device path. Must be a `stub://` path; `stub://denied` simulates a
    /// platform that rejects acquisition.
    pub device: String,
    pub width: u32,
    pub height: u32,
}

impl Default for SyntheticCameraConfig {
    fn default() -> Self {
        Self {
            device: "stub://camera".to_string(),
            width: 640,
            height: 480,
        }
    }
}

/// Synthetic camera for tests and demos.
///
/// Generates deterministic frames that vary per capture and per facing, and
/// counts live streams so the at-most-one-stream invariant is checkable (a
/// second acquisition while one stream is live is an error, matching real
/// device handles).
pub struct SyntheticCamera {
    config: SyntheticCameraConfig,
    live: Arc<AtomicUsize>,
}

impl SyntheticCamera {
    pub fn new(config: SyntheticCameraConfig) -> Result<Self> {
        if !config.device.starts_with("stub://") {
            return Err(anyhow!(
                "synthetic camera only supports stub:// devices, got {}",
                config.device
            ));
        }
        Ok(Self {
            config,
            live: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Number of currently live streams.
    pub fn live_streams(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl Camera for SyntheticCamera {
    fn acquire(&mut self, facing: Facing) -> Result<Box<dyn CameraStream>> {
        if self.config.device == "stub://denied" {
            return Err(anyhow!("camera access denied by platform"));
        }
        if self.live.load(Ordering::SeqCst) > 0 {
            return Err(anyhow!(
                "a live stream already holds {}; release it before re-acquiring",
                self.config.device
            ));
        }
        self.live.fetch_add(1, Ordering::SeqCst);
        log::info!(
            "SyntheticCamera: acquired {} facing {:?}",
            self.config.device,
            facing
        );
        Ok(Box::new(SyntheticStream {
            facing,
            width: self.config.width,
            height: self.config.height,
            frame_count: 0,
            stopped: false,
            live: Arc::clone(&self.live),
        }))
    }
}

struct SyntheticStream {
    facing: Facing,
    width: u32,
    height: u32,
    frame_count: u64,
    stopped: bool,
    live: Arc<AtomicUsize>,
}

impl SyntheticStream {
    fn release(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl CameraStream for SyntheticStream {
    fn frame(&mut self) -> Result<Frame> {
        if self.stopped {
            return Err(anyhow!("stream is stopped"));
        }
        self.frame_count += 1;
        let pixel_count = (self.width * self.height * 3) as usize;
        let facing_salt: u64 = match self.facing {
            Facing::Front => 17,
            Facing::Back => 0,
        };
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count + facing_salt) % 256) as u8;
        }
        Frame::new(pixels, self.width, self.height)
    }

    fn native_width(&self) -> u32 {
        self.width
    }

    fn native_height(&self) -> u32 {
        self.height
    }

    fn stop(&mut self) {
        self.release();
    }
}

impl Drop for SyntheticStream {
    fn drop(&mut self) {
        self.release();
    }
}
