use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

/// Maximum detections surviving suppression per pass.
pub const MAX_DETECTIONS: usize = 20;
/// Minimum reduced score for a box to be considered at all.
pub const SCORE_THRESHOLD: f32 = 0.5;
/// Overlap above which a lower-scoring box is suppressed.
pub const IOU_THRESHOLD: f32 = 0.5;
/// Warm-up inference frame dimensions (RGB, so 300*300*3 bytes).
pub const WARMUP_WIDTH: u32 = 300;
pub const WARMUP_HEIGHT: u32 = 300;

const DEFAULT_MODEL_PATH: &str = "models/ssdlite.onnx";
const DEFAULT_CAMERA_DEVICE: &str = "stub://camera";
const DEFAULT_DISPLAY_WIDTH: u32 = 640;

#[derive(Debug, Deserialize, Default)]
struct OverlayConfigFile {
    model_path: Option<String>,
    camera: Option<CameraConfigFile>,
    display_width: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
}

/// Ambient kernel configuration.
///
/// Detection behavior (cap, thresholds, warm-up size) is fixed by the consts
/// above; this carries only the knobs a deployment actually varies.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub model_path: String,
    pub camera_device: String,
    pub display_width: u32,
}

impl OverlayConfig {
    /// Load configuration: optional JSON file named by `OVERLAY_CONFIG`,
    /// then `OVERLAY_*` env overrides, then validation.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("OVERLAY_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: OverlayConfigFile) -> Self {
        Self {
            model_path: file
                .model_path
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()),
            camera_device: file
                .camera
                .and_then(|camera| camera.device)
                .unwrap_or_else(|| DEFAULT_CAMERA_DEVICE.to_string()),
            display_width: file.display_width.unwrap_or(DEFAULT_DISPLAY_WIDTH),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("OVERLAY_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model_path = path;
            }
        }
        if let Ok(device) = std::env::var("OVERLAY_CAMERA_DEVICE") {
            if !device.trim().is_empty() {
                self.camera_device = device;
            }
        }
        if let Ok(width) = std::env::var("OVERLAY_DISPLAY_WIDTH") {
            let width: u32 = width
                .parse()
                .map_err(|_| anyhow!("OVERLAY_DISPLAY_WIDTH must be an integer pixel width"))?;
            self.display_width = width;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.display_width == 0 {
            return Err(anyhow!("display_width must be greater than zero"));
        }
        if self.model_path.trim().is_empty() {
            return Err(anyhow!("model_path must not be empty"));
        }
        Ok(())
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self::from_file(OverlayConfigFile::default())
    }
}

fn read_config_file(path: &Path) -> Result<OverlayConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
