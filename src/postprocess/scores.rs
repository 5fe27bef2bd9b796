//! Per-box best-class reduction.

/// Best score and class per box, parallel-indexed with the box matrix.
#[derive(Clone, Debug)]
pub struct ReducedScores {
    pub scores: Vec<f32>,
    pub classes: Vec<usize>,
}

/// Reduce a flat `num_boxes x num_classes` score buffer to the best class and
/// score per box.
///
/// The running maximum starts at negative infinity and only a strictly
/// greater score replaces it, so ties keep the earliest-seen class and every
/// box yields a defined pair even for all-zero or all-negative inputs.
/// Consumers (the suppressor, the builder) rely on that tie-break exactly.
pub fn reduce_scores(scores: &[f32], num_boxes: usize, num_classes: usize) -> ReducedScores {
    debug_assert_eq!(scores.len(), num_boxes * num_classes);

    let mut maxes = Vec::with_capacity(num_boxes);
    let mut classes = Vec::with_capacity(num_boxes);
    for box_idx in 0..num_boxes {
        let mut max = f32::NEG_INFINITY;
        let mut class = 0usize;
        for class_idx in 0..num_classes {
            let score = scores[box_idx * num_classes + class_idx];
            if score > max {
                max = score;
                class = class_idx;
            }
        }
        maxes.push(max);
        classes.push(class);
    }
    ReducedScores {
        scores: maxes,
        classes,
    }
}
