//! Input-mode state machine.
//!
//! Exactly one of two frame sources is active at any time: a still image or
//! a live camera stream. The controller owns the single stream slot, so the
//! at-most-one-live-stream invariant is structural: a new stream can only be
//! stored after the previous one has been taken out and stopped. Which
//! surface the host should show (image or video) follows `mode()` directly.
//!
//! The controller never draws and never runs detection; the session layers
//! those on top of the transitions here.

use anyhow::Result;

use crate::source::camera::{Camera, CameraStream, Facing};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Image,
    Video,
}

/// Display-space geometry of the active source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// `display_width / native_width` of the active source.
    pub scale: f32,
}

pub struct ModeController {
    mode: InputMode,
    facing: Facing,
    display_width: u32,
    image_native: Option<(u32, u32)>,
    stream: Option<Box<dyn CameraStream>>,
}

impl ModeController {
    /// Initial state: image mode, back camera preference, no sources live.
    pub fn new(display_width: u32) -> Self {
        Self {
            mode: InputMode::Image,
            facing: Facing::Back,
            display_width,
            image_native: None,
            stream: None,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    pub fn stream_mut(&mut self) -> Option<&mut (dyn CameraStream + 'static)> {
        self.stream.as_deref_mut()
    }

    /// Switch to video mode, acquiring a stream with the current facing
    /// preference. Idempotent: already in video mode is a no-op `Ok(false)`.
    ///
    /// On acquisition failure the controller stays in video mode with a blank
    /// (absent) stream; the caller decides how to surface the error.
    pub fn enter_video(&mut self, camera: &mut dyn Camera) -> Result<bool> {
        if self.mode == InputMode::Video {
            return Ok(false);
        }
        self.mode = InputMode::Video;
        self.acquire_stream(camera)?;
        Ok(true)
    }

    /// Switch to image mode, releasing any live stream first. Idempotent.
    pub fn enter_image(&mut self) -> bool {
        if self.mode == InputMode::Image {
            return false;
        }
        self.release_stream();
        self.mode = InputMode::Image;
        true
    }

    /// Flip the facing preference. In video mode the live stream is released
    /// in full before the opposite-facing stream is acquired; in image mode
    /// only the preference changes.
    pub fn toggle_facing(&mut self, camera: &mut dyn Camera) -> Result<()> {
        self.facing = self.facing.opposite();
        if self.mode != InputMode::Video {
            return Ok(());
        }
        self.release_stream();
        self.acquire_stream(camera)
    }

    /// Record the native dimensions of a freshly decoded still image.
    pub fn image_loaded(&mut self, native_width: u32, native_height: u32) {
        self.image_native = Some((native_width, native_height));
    }

    /// Adapt to a new display width. Does not change mode; the scale factor
    /// is recomputed exactly as `display_width / native_width` on the next
    /// `viewport()` read.
    pub fn resize(&mut self, display_width: u32) {
        self.display_width = display_width;
    }

    /// Display-space geometry of whichever source is currently active.
    pub fn viewport(&self) -> Viewport {
        let native = match self.mode {
            InputMode::Image => self.image_native,
            InputMode::Video => self
                .stream
                .as_ref()
                .map(|s| (s.native_width(), s.native_height())),
        };
        match native {
            Some((nw, nh)) if nw > 0 => {
                let scale = self.display_width as f32 / nw as f32;
                Viewport {
                    width: self.display_width as f32,
                    height: nh as f32 * scale,
                    scale,
                }
            }
            _ => Viewport {
                width: self.display_width as f32,
                height: 0.0,
                scale: 1.0,
            },
        }
    }

    /// Release the live stream, if any. Used on teardown.
    pub fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
    }

    fn acquire_stream(&mut self, camera: &mut dyn Camera) -> Result<()> {
        debug_assert!(self.stream.is_none());
        match camera.acquire(self.facing) {
            Ok(stream) => {
                self.stream = Some(stream);
                Ok(())
            }
            Err(e) => {
                log::warn!("camera acquisition failed, video surface stays blank: {e:#}");
                Err(e)
            }
        }
    }
}

impl Drop for ModeController {
    fn drop(&mut self) {
        self.release_stream();
    }
}
