//! Detection Overlay Kernel (DOK)
//!
//! This crate turns the raw per-box score and coordinate tensors of an
//! SSD-style object-detection head into a filtered, pixel-space list of
//! labeled bounding boxes, and keeps that list synchronized with a live
//! video or still-image input source.
//!
//! # Architecture
//!
//! The kernel holds four rules by construction:
//!
//! 1. **One live stream**: camera acquire/release pair 1:1 and release
//!    strictly precedes re-acquire; the single stream slot enforces it.
//! 2. **One pass in flight**: new detection requests are dropped while a
//!    pass is outstanding, and every pass is generation-tagged so a mode
//!    switch discards its result instead of rendering it stale.
//! 3. **Pass-scoped buffers**: raw inference output is owned by the pass
//!    that requested it and dropped before the pass returns.
//! 4. **Bracketed context switch**: suppression runs on the general-purpose
//!    execution context and the prior context is restored on every exit
//!    path.
//!
//! # Module Structure
//!
//! - `postprocess`: score reduction, greedy NMS, detection building
//! - `engine`: inference seam (stub engine; optional tract backend)
//! - `source`: still-image decoding and the camera seam
//! - `mode`: the Image/Video input-mode state machine
//! - `pipeline`: one end-to-end detection pass
//! - `render`: the drawing capability seam and overlay drawing
//! - Core type: `Session`, the host-owned context object

pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
pub mod labels;
pub mod mode;
pub mod pipeline;
pub mod postprocess;
pub mod render;
pub mod source;

pub use config::OverlayConfig;
pub use engine::{ExecutionContext, InferenceEngine, RawInferenceOutput, StubEngine};
#[cfg(feature = "engine-tract")]
pub use engine::TractEngine;
pub use error::KernelError;
pub use frame::Frame;
pub use labels::LabelTable;
pub use mode::{InputMode, Viewport};
pub use postprocess::{Detection, SuppressionParams};
pub use render::{RecordingSurface, RenderSurface};
pub use source::{Camera, CameraStream, Facing, SyntheticCamera, SyntheticCameraConfig};

use crate::mode::ModeController;
use crate::pipeline::DetectionPipeline;
use crate::source::decode_image;

/// Host-owned session context.
///
/// Owns the mode controller, the pipeline, and the three external seams
/// (engine, camera, render surface); every operation the host drives goes
/// through here, and every result comes back through the registered
/// callbacks. There is no ambient state: dropping the session releases the
/// camera stream and everything else with it.
pub struct Session {
    engine: Box<dyn InferenceEngine>,
    camera: Box<dyn Camera>,
    surface: Box<dyn RenderSurface>,
    labels: LabelTable,
    mode: ModeController,
    pipeline: DetectionPipeline,
    ready: bool,
    on_ready: Option<Box<dyn FnMut()>>,
    on_detection_result: Option<Box<dyn FnMut(&str)>>,
    on_error: Option<Box<dyn FnMut(&KernelError)>>,
}

impl Session {
    pub fn new(
        engine: Box<dyn InferenceEngine>,
        camera: Box<dyn Camera>,
        surface: Box<dyn RenderSurface>,
        config: &OverlayConfig,
    ) -> Self {
        Self {
            engine,
            camera,
            surface,
            labels: LabelTable::coco(),
            mode: ModeController::new(config.display_width),
            pipeline: DetectionPipeline::new(SuppressionParams::default()),
            ready: false,
            on_ready: None,
            on_detection_result: None,
            on_error: None,
        }
    }

    /// Replace the default COCO label table.
    pub fn set_label_table(&mut self, labels: LabelTable) {
        self.labels = labels;
    }

    /// Fired once after warm-up succeeds.
    pub fn set_on_ready(&mut self, callback: impl FnMut() + 'static) {
        self.on_ready = Some(Box::new(callback));
    }

    /// Fired once per completed pass with the serialized detection list.
    pub fn set_on_detection_result(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_detection_result = Some(Box::new(callback));
    }

    /// Fired for reportable failures (model load, camera acquisition,
    /// payload decode, label lookup).
    pub fn set_on_error(&mut self, callback: impl FnMut(&KernelError) + 'static) {
        self.on_error = Some(Box::new(callback));
    }

    /// Warm the engine up. On success the session becomes ready and
    /// `on_ready` fires; on failure `ModelLoad` is surfaced and a later
    /// `start` may retry.
    pub fn start(&mut self) {
        match self.engine.warm_up() {
            Ok(()) => {
                self.ready = true;
                log::info!("{} engine warmed up, session ready", self.engine.name());
                if let Some(callback) = self.on_ready.as_mut() {
                    callback();
                }
            }
            Err(e) => self.emit_error(KernelError::ModelLoad(e)),
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode.mode()
    }

    pub fn facing(&self) -> Facing {
        self.mode.facing()
    }

    pub fn viewport(&self) -> Viewport {
        self.mode.viewport()
    }

    /// Switch the active frame source. Idempotent against repeated identical
    /// requests; a real switch clears the overlay, invalidates outstanding
    /// passes, and swaps the live source (releasing any camera stream before
    /// the image surface comes back).
    pub fn set_input_mode(&mut self, target: InputMode) {
        if target == self.mode.mode() {
            log::debug!("already in {:?} mode", target);
            return;
        }
        self.pipeline.invalidate();
        self.surface.clear();
        match target {
            InputMode::Image => {
                self.mode.enter_image();
            }
            InputMode::Video => {
                if let Err(e) = self.mode.enter_video(self.camera.as_mut()) {
                    self.emit_error(KernelError::DeviceAcquisition(e));
                } else {
                    self.fit_surface_to_viewport();
                }
            }
        }
    }

    /// Flip the camera facing preference. In video mode the live stream is
    /// fully released before the opposite-facing stream is acquired.
    pub fn toggle_camera_facing(&mut self) {
        self.pipeline.invalidate();
        if let Err(e) = self.mode.toggle_facing(self.camera.as_mut()) {
            self.emit_error(KernelError::DeviceAcquisition(e));
        }
    }

    /// Decode a base64 PNG/JPEG payload and run one detection pass on it.
    /// Ignored outside image mode.
    pub fn submit_image(&mut self, encoded: &str) {
        if !self.ready {
            log::warn!("image submitted before the engine is ready, ignoring");
            return;
        }
        if self.mode.mode() != InputMode::Image {
            log::debug!("image submitted while in video mode, ignoring");
            return;
        }
        let frame = match decode_image(encoded) {
            Ok(frame) => frame,
            Err(e) => {
                self.emit_error(KernelError::Decode(e));
                return;
            }
        };
        self.surface.clear();
        self.mode.image_loaded(frame.width, frame.height);
        self.fit_surface_to_viewport();
        self.run_pass(frame);
    }

    /// Run one detection pass on the current video frame. Ignored outside
    /// video mode or while the video surface is blank.
    pub fn request_video_frame_detection(&mut self) {
        if !self.ready {
            log::warn!("video detection requested before the engine is ready, ignoring");
            return;
        }
        if self.mode.mode() != InputMode::Video {
            log::debug!("video detection requested while in image mode, ignoring");
            return;
        }
        let Some(stream) = self.mode.stream_mut() else {
            log::debug!("video detection requested with no live stream, ignoring");
            return;
        };
        let frame = match stream.frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("video frame capture failed: {e:#}");
                return;
            }
        };
        self.run_pass(frame);
    }

    /// Adapt to a new display width: the scale factor is recomputed exactly
    /// as `new_width / native_width` for the active source. Mode unchanged.
    pub fn on_viewport_resize(&mut self, display_width: u32) {
        self.mode.resize(display_width);
        self.fit_surface_to_viewport();
    }

    fn fit_surface_to_viewport(&mut self) {
        let viewport = self.mode.viewport();
        if viewport.height > 0.0 {
            self.surface
                .set_size(viewport.width as u32, viewport.height as u32);
        }
    }

    /// One pass: infer, post-process, emit. Inference failures are logged
    /// and the pipeline returns to idle; a stale result is discarded unseen.
    fn run_pass(&mut self, frame: Frame) {
        let Some(ticket) = self.pipeline.begin_pass() else {
            return;
        };
        let raw = match self
            .engine
            .infer(frame.pixels(), frame.width, frame.height)
        {
            Ok(raw) => raw,
            Err(e) => {
                self.pipeline.abort_pass(ticket);
                log::warn!("inference failed, pass dropped: {e:#}");
                return;
            }
        };
        let viewport = self.mode.viewport();
        match self
            .pipeline
            .complete_pass(ticket, raw, self.engine.as_mut(), viewport, &self.labels)
        {
            Ok(Some(detections)) => self.emit_detections(&detections),
            Ok(None) => {}
            Err(e) => self.emit_error(e),
        }
    }

    fn emit_detections(&mut self, detections: &[Detection]) {
        match serde_json::to_string(detections) {
            Ok(json) => {
                if let Some(callback) = self.on_detection_result.as_mut() {
                    callback(&json);
                }
            }
            Err(e) => log::warn!("failed to serialize detections: {e}"),
        }
        render::draw_overlay(self.surface.as_mut(), detections);
    }

    fn emit_error(&mut self, error: KernelError) {
        log::warn!("{error:#}");
        if let Some(callback) = self.on_error.as_mut() {
            callback(&error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use image::{ImageBuffer, Rgb};
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    use crate::render::DrawOp;

    /// Shared handles let tests observe state the session owns.
    struct SharedSurface(Rc<RefCell<RecordingSurface>>);

    impl RenderSurface for SharedSurface {
        fn clear(&mut self) {
            self.0.borrow_mut().clear();
        }
        fn set_size(&mut self, width: u32, height: u32) {
            self.0.borrow_mut().set_size(width, height);
        }
        fn stroke_rect(
            &mut self,
            x: f32,
            y: f32,
            width: f32,
            height: f32,
            color: render::Color,
            line_width: f32,
        ) {
            self.0
                .borrow_mut()
                .stroke_rect(x, y, width, height, color, line_width);
        }
        fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: render::Color) {
            self.0.borrow_mut().fill_rect(x, y, width, height, color);
        }
        fn fill_text(&mut self, text: &str, x: f32, y: f32, color: render::Color) {
            self.0.borrow_mut().fill_text(text, x, y, color);
        }
        fn text_width(&self, text: &str) -> f32 {
            self.0.borrow().text_width(text)
        }
    }

    struct SharedCamera(Rc<RefCell<SyntheticCamera>>);

    impl Camera for SharedCamera {
        fn acquire(&mut self, facing: Facing) -> anyhow::Result<Box<dyn CameraStream>> {
            self.0.borrow_mut().acquire(facing)
        }
    }

    struct Harness {
        session: Session,
        surface: Rc<RefCell<RecordingSurface>>,
        camera: Rc<RefCell<SyntheticCamera>>,
        reports: Rc<RefCell<Vec<String>>>,
        errors: Rc<RefCell<Vec<String>>>,
        ready: Rc<RefCell<bool>>,
    }

    fn harness_with_device(device: &str) -> Harness {
        let surface = Rc::new(RefCell::new(RecordingSurface::new()));
        let camera = Rc::new(RefCell::new(
            SyntheticCamera::new(SyntheticCameraConfig {
                device: device.to_string(),
                ..SyntheticCameraConfig::default()
            })
            .unwrap(),
        ));
        let mut session = Session::new(
            Box::new(StubEngine::new()),
            Box::new(SharedCamera(Rc::clone(&camera))),
            Box::new(SharedSurface(Rc::clone(&surface))),
            &OverlayConfig::default(),
        );
        let reports = Rc::new(RefCell::new(Vec::new()));
        let errors = Rc::new(RefCell::new(Vec::new()));
        let ready = Rc::new(RefCell::new(false));
        {
            let reports = Rc::clone(&reports);
            session.set_on_detection_result(move |json| reports.borrow_mut().push(json.to_string()));
        }
        {
            let errors = Rc::clone(&errors);
            session.set_on_error(move |e| errors.borrow_mut().push(e.to_string()));
        }
        {
            let ready = Rc::clone(&ready);
            session.set_on_ready(move || *ready.borrow_mut() = true);
        }
        Harness {
            session,
            surface,
            camera,
            reports,
            errors,
            ready,
        }
    }

    fn harness() -> Harness {
        let mut h = harness_with_device("stub://camera");
        h.session.start();
        assert!(*h.ready.borrow());
        h
    }

    fn encoded_png() -> String {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_fn(32, 24, |x, y| Rgb([x as u8, y as u8, 9]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        STANDARD.encode(&bytes)
    }

    #[test]
    fn ready_fires_after_warm_up() {
        let h = harness();
        assert!(*h.ready.borrow());
        assert!(h.errors.borrow().is_empty());
    }

    #[test]
    fn image_pass_reports_and_draws() {
        let mut h = harness();
        h.session.submit_image(&encoded_png());

        let reports = h.reports.borrow();
        assert_eq!(reports.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(&reports[0]).unwrap();
        let list = parsed.as_array().unwrap();
        assert_eq!(list.len(), 2); // stub: primary + disjoint survive
        for det in list {
            assert!(det["class"].is_string());
            assert!(det["score"].as_f64().unwrap() > 0.5);
            assert_eq!(det["bbox"].as_array().unwrap().len(), 4);
        }
        assert_eq!(h.surface.borrow().stroked_rects(), 2);
    }

    #[test]
    fn detection_requests_are_gated_by_mode() {
        let mut h = harness();
        h.session.request_video_frame_detection();
        assert!(h.reports.borrow().is_empty());

        h.session.set_input_mode(InputMode::Video);
        h.session.submit_image(&encoded_png());
        assert!(h.reports.borrow().is_empty());

        h.session.request_video_frame_detection();
        assert_eq!(h.reports.borrow().len(), 1);
    }

    #[test]
    fn repeated_video_mode_requests_hold_one_stream() {
        let mut h = harness();
        h.session.set_input_mode(InputMode::Video);
        h.session.set_input_mode(InputMode::Video);
        assert_eq!(h.camera.borrow().live_streams(), 1);
        h.session.set_input_mode(InputMode::Image);
        assert_eq!(h.camera.borrow().live_streams(), 0);
    }

    #[test]
    fn facing_toggle_keeps_a_single_stream() {
        let mut h = harness();
        h.session.set_input_mode(InputMode::Video);
        h.session.toggle_camera_facing();
        assert_eq!(h.session.facing(), Facing::Front);
        assert_eq!(h.camera.borrow().live_streams(), 1);
        assert!(h.errors.borrow().is_empty());
    }

    #[test]
    fn denied_camera_surfaces_device_acquisition() {
        let mut h = harness_with_device("stub://denied");
        h.session.start();
        h.session.set_input_mode(InputMode::Video);

        let errors = h.errors.borrow();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("camera acquisition failed"));
        drop(errors);

        // Video mode is active but blank: frame requests are quietly ignored.
        assert_eq!(h.session.mode(), InputMode::Video);
        h.session.request_video_frame_detection();
        assert!(h.reports.borrow().is_empty());
    }

    #[test]
    fn bad_image_payload_surfaces_decode_error() {
        let mut h = harness();
        h.session.submit_image("definitely not base64 []");
        assert!(h.reports.borrow().is_empty());
        assert_eq!(h.errors.borrow().len(), 1);
        assert!(h.errors.borrow()[0].contains("image decode failed"));
    }

    #[test]
    fn detection_before_ready_is_ignored() {
        let mut h = harness_with_device("stub://camera");
        h.session.submit_image(&encoded_png());
        assert!(h.reports.borrow().is_empty());
        assert!(h.errors.borrow().is_empty());
    }

    #[test]
    fn resize_rescales_the_active_surface() {
        let mut h = harness();
        h.session.submit_image(&encoded_png());
        h.session.on_viewport_resize(320);
        // 32px-wide test image: scale is exactly 320 / 32.
        assert_eq!(h.session.viewport().scale, 10.0);
        assert_eq!(h.session.mode(), InputMode::Image);
        let resized = h
            .surface
            .borrow()
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::SetSize { width: 320, .. }));
        assert!(resized);
    }

    #[test]
    fn mode_switch_clears_residual_overlay() {
        let mut h = harness();
        h.session.submit_image(&encoded_png());
        let ops_before = h.surface.borrow().ops.len();
        h.session.set_input_mode(InputMode::Video);
        let ops = h.surface.borrow();
        assert!(ops.ops[ops_before..].contains(&DrawOp::Clear));
    }
}
