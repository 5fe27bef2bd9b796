//! Stub engine for tests and demos. Derives box geometry from a pixel hash.

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::engine::{ExecutionContext, InferenceEngine, RawInferenceOutput};

const STUB_NUM_BOXES: usize = 4;
const STUB_NUM_CLASSES: usize = 80;

/// Deterministic synthetic engine.
///
/// Emits four candidate boxes per frame: a confident primary box placed from
/// a sha256 digest of the pixels, a near-duplicate the suppressor should
/// remove, a weaker disjoint box, and one below the score threshold. The same
/// frame always produces the same output.
pub struct StubEngine {
    context: ExecutionContext,
}

impl StubEngine {
    pub fn new() -> Self {
        Self {
            context: ExecutionContext::Accelerated,
        }
    }
}

impl Default for StubEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceEngine for StubEngine {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn infer(&mut self, pixels: &[u8], _width: u32, _height: u32) -> Result<RawInferenceOutput> {
        let digest: [u8; 32] = Sha256::digest(pixels).into();

        // Primary box: up to 0.4 offset from the frame origin, 0.3 on a side.
        let min_y = digest[0] as f32 / 255.0 * 0.4;
        let min_x = digest[1] as f32 / 255.0 * 0.4;
        let primary = [min_y, min_x, min_y + 0.3, min_x + 0.3];
        let duplicate = [min_y + 0.02, min_x + 0.02, min_y + 0.32, min_x + 0.32];
        let disjoint = [0.7, 0.7, 0.95, 0.95];
        let weak = [0.0, 0.7, 0.2, 0.9];

        let primary_class = (digest[2] as usize) % STUB_NUM_CLASSES;
        let disjoint_class = (digest[3] as usize) % STUB_NUM_CLASSES;

        let mut scores = vec![0.01f32; STUB_NUM_BOXES * STUB_NUM_CLASSES];
        scores[primary_class] = 0.9;
        scores[STUB_NUM_CLASSES + primary_class] = 0.62;
        scores[2 * STUB_NUM_CLASSES + disjoint_class] = 0.55;
        scores[3 * STUB_NUM_CLASSES + disjoint_class] = 0.2;

        let mut boxes = Vec::with_capacity(STUB_NUM_BOXES * 4);
        for b in [primary, duplicate, disjoint, weak] {
            boxes.extend_from_slice(&b);
        }

        RawInferenceOutput::new(scores, boxes, STUB_NUM_BOXES, STUB_NUM_CLASSES)
    }

    fn context(&self) -> ExecutionContext {
        self.context
    }

    fn set_context(&mut self, context: ExecutionContext) {
        self.context = context;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_frame_same_output() {
        let mut engine = StubEngine::new();
        let a = engine.infer(b"frame", 1, 1).unwrap();
        let b = engine.infer(b"frame", 1, 1).unwrap();
        assert_eq!(a.scores, b.scores);
        assert_eq!(a.boxes, b.boxes);
    }

    #[test]
    fn different_frames_move_the_primary_box() {
        let mut engine = StubEngine::new();
        let a = engine.infer(b"frame-a", 1, 1).unwrap();
        let b = engine.infer(b"frame-b-unlike", 1, 1).unwrap();
        assert_ne!(a.boxes[..4], b.boxes[..4]);
    }

    #[test]
    fn buffers_match_the_declared_dimensions() {
        let mut engine = StubEngine::new();
        let out = engine.infer(b"frame", 1, 1).unwrap();
        assert_eq!(out.scores.len(), out.num_boxes * out.num_classes);
        assert_eq!(out.boxes.len(), out.num_boxes * 4);
    }
}
