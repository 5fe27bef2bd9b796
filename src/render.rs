//! Overlay drawing.
//!
//! The core never touches a concrete drawing API; it hands the final
//! detection list to `draw_overlay`, which talks to a `RenderSurface`
//! capability implemented per host platform. `RecordingSurface` is the
//! in-tree implementation for tests and headless hosts.

use crate::postprocess::Detection;

/// RGB color for overlay drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const BOX_COLOR: Color = Color { r: 0, g: 255, b: 0 };
pub const LABEL_BAND_COLOR: Color = Color {
    r: 255,
    g: 255,
    b: 255,
};
pub const LABEL_TEXT_COLOR: Color = Color { r: 0, g: 0, b: 255 };

const BOX_LINE_WIDTH: f32 = 4.0;
const LABEL_BAND_HEIGHT: f32 = 12.0;

/// Clearable 2-D drawing surface.
///
/// Only rectangle stroke/fill and text placement; exactly what overlay
/// drawing needs and nothing the core could grow to depend on.
pub trait RenderSurface {
    fn clear(&mut self);
    fn set_size(&mut self, width: u32, height: u32);
    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color, line_width: f32);
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color);
    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Color);
    fn text_width(&self, text: &str) -> f32;
}

/// Draw one pass's detections: clear, then per detection a green box, a white
/// band sized to the caption, and the caption itself. Boxes near the top edge
/// get their band and caption pinned inside the surface.
pub fn draw_overlay(surface: &mut dyn RenderSurface, detections: &[Detection]) {
    surface.clear();
    for det in detections {
        let [x, y, w, h] = det.bbox;
        surface.stroke_rect(x, y, w, h, BOX_COLOR, BOX_LINE_WIDTH);

        let caption = format!("{:.3} {}", det.score, det.class_label);
        let band_width = surface.text_width(&caption);
        let band_y = if y > 10.0 { y - 17.0 } else { 0.0 };
        surface.fill_rect(x, band_y, band_width, LABEL_BAND_HEIGHT, LABEL_BAND_COLOR);
        let text_y = if y > 10.0 { y - 5.0 } else { 10.0 };
        surface.fill_text(&caption, x, text_y, LABEL_TEXT_COLOR);
    }
}

/// Recorded drawing operation.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Clear,
    SetSize { width: u32, height: u32 },
    StrokeRect { x: f32, y: f32, width: f32, height: f32 },
    FillRect { x: f32, y: f32, width: f32, height: f32 },
    FillText { text: String, x: f32, y: f32 },
}

/// Surface that records operations instead of rasterizing them.
#[derive(Default)]
pub struct RecordingSurface {
    pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stroked_rects(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::StrokeRect { .. }))
            .count()
    }
}

impl RenderSurface for RecordingSurface {
    fn clear(&mut self) {
        self.ops.push(DrawOp::Clear);
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.ops.push(DrawOp::SetSize { width, height });
    }

    fn stroke_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        _color: Color,
        _line_width: f32,
    ) {
        self.ops.push(DrawOp::StrokeRect {
            x,
            y,
            width,
            height,
        });
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, _color: Color) {
        self.ops.push(DrawOp::FillRect {
            x,
            y,
            width,
            height,
        });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, _color: Color) {
        self.ops.push(DrawOp::FillText {
            text: text.to_string(),
            x,
            y,
        });
    }

    fn text_width(&self, text: &str) -> f32 {
        // 12px monospace approximation, fine for band sizing in tests.
        text.len() as f32 * 7.0
    }
}
