//! Greedy non-max suppression.

use crate::config::{IOU_THRESHOLD, MAX_DETECTIONS, SCORE_THRESHOLD};

/// Suppression limits. `Default` carries the fixed kernel constants.
#[derive(Clone, Copy, Debug)]
pub struct SuppressionParams {
    pub max_output: usize,
    pub score_threshold: f32,
    pub iou_threshold: f32,
}

impl Default for SuppressionParams {
    fn default() -> Self {
        Self {
            max_output: MAX_DETECTIONS,
            score_threshold: SCORE_THRESHOLD,
            iou_threshold: IOU_THRESHOLD,
        }
    }
}

/// Greedy NMS over normalized `[min_y, min_x, max_y, max_x]` boxes.
///
/// Repeatedly selects the remaining box with the highest score above the
/// score threshold (earliest index wins ties), emits its index, and discards
/// remaining boxes whose IoU with it exceeds the IoU threshold. Stops at the
/// output cap, on exhaustion, or when no candidate clears the threshold.
/// The returned order is selection order, not score order.
pub fn suppress(boxes: &[f32], scores: &[f32], params: SuppressionParams) -> Vec<usize> {
    let num_boxes = scores.len();
    debug_assert!(boxes.len() >= num_boxes * 4);

    let mut suppressed = vec![false; num_boxes];
    let mut keep = Vec::new();

    while keep.len() < params.max_output {
        // Strictly-greater scan keeps the earliest index on score ties.
        let mut best: Option<usize> = None;
        let mut best_score = params.score_threshold;
        for (idx, &score) in scores.iter().enumerate() {
            if !suppressed[idx] && score > best_score {
                best = Some(idx);
                best_score = score;
            }
        }
        let Some(selected) = best else {
            break;
        };

        keep.push(selected);
        suppressed[selected] = true;
        for idx in 0..num_boxes {
            if suppressed[idx] {
                continue;
            }
            if iou(corners(boxes, selected), corners(boxes, idx)) > params.iou_threshold {
                suppressed[idx] = true;
            }
        }
    }
    keep
}

fn corners(boxes: &[f32], idx: usize) -> [f32; 4] {
    [
        boxes[idx * 4],
        boxes[idx * 4 + 1],
        boxes[idx * 4 + 2],
        boxes[idx * 4 + 3],
    ]
}

/// IoU of two `[min_y, min_x, max_y, max_x]` boxes.
///
/// Degenerate (zero- or negative-area) boxes have IoU 0 with everything: the
/// union is clamped so the division is always defined.
fn iou(a: [f32; 4], b: [f32; 4]) -> f32 {
    let inter_min_y = a[0].max(b[0]);
    let inter_min_x = a[1].max(b[1]);
    let inter_max_y = a[2].min(b[2]);
    let inter_max_x = a[3].min(b[3]);

    let inter_h = (inter_max_y - inter_min_y).max(0.0);
    let inter_w = (inter_max_x - inter_min_x).max(0.0);
    let inter_area = inter_h * inter_w;

    let area_a = ((a[2] - a[0]).max(0.0)) * ((a[3] - a[1]).max(0.0));
    let area_b = ((b[2] - b[0]).max(0.0)) * ((b[3] - b[1]).max(0.0));
    let union = area_a + area_b - inter_area;
    if union <= 0.0 {
        return 0.0;
    }
    inter_area / union
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_output: usize, score_threshold: f32, iou_threshold: f32) -> SuppressionParams {
        SuppressionParams {
            max_output,
            score_threshold,
            iou_threshold,
        }
    }

    #[test]
    fn overlapping_low_scorer_is_suppressed() {
        // Two near-identical boxes; the second is both below threshold and
        // overlapped by the first.
        let boxes = [
            0.10, 0.10, 0.50, 0.50, //
            0.11, 0.11, 0.51, 0.51,
        ];
        let scores = [0.9, 0.4];
        let keep = suppress(&boxes, &scores, SuppressionParams::default());
        assert_eq!(keep, vec![0]);
    }

    #[test]
    fn disjoint_boxes_all_survive_in_score_order() {
        let boxes = [
            0.0, 0.0, 0.2, 0.2, //
            0.5, 0.5, 0.7, 0.7, //
            0.0, 0.8, 0.2, 1.0,
        ];
        let scores = [0.6, 0.9, 0.7];
        let keep = suppress(&boxes, &scores, SuppressionParams::default());
        assert_eq!(keep, vec![1, 2, 0]);
    }

    #[test]
    fn cap_bounds_the_output() {
        let mut boxes = Vec::new();
        let mut scores = Vec::new();
        for i in 0..10 {
            let off = i as f32 * 0.1;
            boxes.extend_from_slice(&[off, 0.0, off + 0.05, 0.05]);
            scores.push(0.9);
        }
        let keep = suppress(&boxes, &scores, params(3, 0.5, 0.5));
        assert_eq!(keep.len(), 3);
    }

    #[test]
    fn below_threshold_boxes_are_never_returned() {
        let boxes = [
            0.0, 0.0, 0.2, 0.2, //
            0.5, 0.5, 0.7, 0.7,
        ];
        let scores = [0.49, 0.51];
        let keep = suppress(&boxes, &scores, SuppressionParams::default());
        assert_eq!(keep, vec![1]);
    }

    #[test]
    fn score_ties_keep_the_earliest_index() {
        let boxes = [
            0.0, 0.0, 0.2, 0.2, //
            0.5, 0.5, 0.7, 0.7, //
            0.0, 0.8, 0.2, 1.0,
        ];
        let scores = [0.8, 0.8, 0.8];
        let keep = suppress(&boxes, &scores, SuppressionParams::default());
        assert_eq!(keep, vec![0, 1, 2]);
    }

    #[test]
    fn deterministic_across_runs() {
        let boxes = [
            0.1, 0.1, 0.4, 0.4, //
            0.12, 0.12, 0.42, 0.42, //
            0.6, 0.6, 0.9, 0.9, //
            0.61, 0.61, 0.91, 0.91,
        ];
        let scores = [0.7, 0.7, 0.9, 0.6];
        let first = suppress(&boxes, &scores, SuppressionParams::default());
        for _ in 0..10 {
            assert_eq!(suppress(&boxes, &scores, SuppressionParams::default()), first);
        }
    }

    #[test]
    fn zero_area_boxes_never_divide_by_zero() {
        let boxes = [
            0.3, 0.3, 0.3, 0.3, // zero area
            0.3, 0.3, 0.3, 0.3, // identical zero area
            0.2, 0.2, 0.6, 0.6,
        ];
        let scores = [0.9, 0.8, 0.7];
        let keep = suppress(&boxes, &scores, SuppressionParams::default());
        // Zero-area boxes have IoU 0 with everything, including each other,
        // so nothing here suppresses anything.
        assert_eq!(keep, vec![0, 1, 2]);
    }

    #[test]
    fn kept_pairs_never_exceed_the_iou_threshold() {
        let boxes = [
            0.0, 0.0, 0.5, 0.5, //
            0.1, 0.1, 0.6, 0.6, //
            0.05, 0.05, 0.55, 0.55, //
            0.7, 0.7, 0.9, 0.9,
        ];
        let scores = [0.9, 0.85, 0.8, 0.95];
        let keep = suppress(&boxes, &scores, SuppressionParams::default());
        for (i, &a) in keep.iter().enumerate() {
            for &b in keep.iter().skip(i + 1) {
                assert!(iou(corners(&boxes, a), corners(&boxes, b)) <= IOU_THRESHOLD);
            }
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(suppress(&[], &[], SuppressionParams::default()).is_empty());
    }
}
