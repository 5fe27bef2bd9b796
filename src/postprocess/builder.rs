//! Pixel-space detection building.

use serde::Serialize;

use crate::error::KernelError;
use crate::labels::LabelTable;
use crate::mode::Viewport;
use crate::postprocess::scores::ReducedScores;

/// One labeled, pixel-space detection. Immutable once built; recreated in
/// full on every pass.
#[derive(Clone, Debug, Serialize)]
pub struct Detection {
    /// `[x, y, width, height]` in display pixels.
    pub bbox: [f32; 4],
    #[serde(rename = "class")]
    pub class_label: String,
    pub score: f32,
}

/// Map surviving indices into pixel-space detections.
///
/// Normalized `[min_y, min_x, max_y, max_x]` corners are scaled by
/// `(h, w, h, w)` and converted to `(x, y, width, height)` rectangles. Output
/// order follows the suppressor's selection order. A class index past the
/// label table is a reportable error; no partial list is returned.
pub fn build_detections(
    keep: &[usize],
    boxes: &[f32],
    reduced: &ReducedScores,
    viewport: Viewport,
    labels: &LabelTable,
) -> Result<Vec<Detection>, KernelError> {
    let mut detections = Vec::with_capacity(keep.len());
    for &idx in keep {
        let min_y = boxes[idx * 4] * viewport.height;
        let min_x = boxes[idx * 4 + 1] * viewport.width;
        let max_y = boxes[idx * 4 + 2] * viewport.height;
        let max_x = boxes[idx * 4 + 3] * viewport.width;

        let label = labels.display_name(reduced.classes[idx])?;
        detections.push(Detection {
            bbox: [min_x, min_y, max_x - min_x, max_y - min_y],
            class_label: label.to_string(),
            score: reduced.scores[idx],
        });
    }
    Ok(detections)
}
