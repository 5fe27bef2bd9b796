//! demo - end-to-end synthetic run for the Detection Overlay Kernel

use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::Parser;
use image::{ImageBuffer, Rgb};
use std::io::Cursor;

use overlay_kernel::render::Color;
use overlay_kernel::{
    InputMode, OverlayConfig, RenderSurface, Session, StubEngine, SyntheticCamera,
    SyntheticCameraConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of video frames to run detection on.
    #[arg(long, default_value_t = 5)]
    frames: u32,
    /// Display width in pixels (overrides config).
    #[arg(long)]
    display_width: Option<u32>,
    /// Synthetic camera device (stub://camera, or stub://denied to exercise
    /// the acquisition-failure path).
    #[arg(long)]
    camera: Option<String>,
}

/// Host-side render surface: prints draw calls instead of rasterizing.
struct ConsoleSurface;

impl RenderSurface for ConsoleSurface {
    fn clear(&mut self) {
        log::debug!("surface: clear");
    }
    fn set_size(&mut self, width: u32, height: u32) {
        log::debug!("surface: {}x{}", width, height);
    }
    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, _: Color, _: f32) {
        println!("  box   [{x:7.1} {y:7.1} {width:7.1} {height:7.1}]");
    }
    fn fill_rect(&mut self, _: f32, _: f32, _: f32, _: f32, _: Color) {}
    fn fill_text(&mut self, text: &str, _: f32, _: f32, _: Color) {
        println!("  label {text}");
    }
    fn text_width(&self, text: &str) -> f32 {
        text.len() as f32 * 7.0
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    if args.frames == 0 {
        return Err(anyhow!("frames must be >= 1"));
    }

    let mut config = OverlayConfig::load()?;
    if let Some(width) = args.display_width {
        config.display_width = width;
    }
    if let Some(device) = args.camera {
        config.camera_device = device;
    }

    let camera = SyntheticCamera::new(SyntheticCameraConfig {
        device: config.camera_device.clone(),
        ..SyntheticCameraConfig::default()
    })?;
    let mut session = Session::new(
        Box::new(StubEngine::new()),
        Box::new(camera),
        Box::new(ConsoleSurface),
        &config,
    );
    session.set_on_ready(|| println!("  session ready"));
    session.set_on_detection_result(|json| println!("  report: {json}"));
    session.set_on_error(|e| println!("  error: {e}"));

    stage("warm up engine");
    session.start();

    stage("still image pass");
    session.submit_image(&encoded_test_image());

    stage("switch to video");
    session.set_input_mode(InputMode::Video);

    stage("video passes");
    for _ in 0..args.frames {
        session.request_video_frame_detection();
    }

    stage("toggle camera facing");
    session.toggle_camera_facing();
    session.request_video_frame_detection();

    stage("viewport resize");
    session.on_viewport_resize((config.display_width / 2).max(1));
    session.request_video_frame_detection();

    stage("back to image mode");
    session.set_input_mode(InputMode::Image);

    Ok(())
}

fn stage(name: &str) {
    println!("\n== {name} ==");
}

/// A small in-memory gradient image, base64-encoded the way hosts submit it.
fn encoded_test_image() -> String {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_fn(96, 64, |x, y| Rgb([(x * 2) as u8, (y * 3) as u8, 64]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encoding an in-memory PNG cannot fail");
    STANDARD.encode(&bytes)
}
