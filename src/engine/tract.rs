#![cfg(feature = "engine-tract")]

//! Tract-based engine for SSD-head ONNX models.
//!
//! Expects a graph taking a `[1, H, W, 3]` u8 frame and producing the raw
//! detection-head outputs: class scores shaped `[1, N, C]` and box corners
//! holding `N x 4` values. The kernel's own postprocess does the rest; this
//! engine only flattens the tensors.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::engine::{ExecutionContext, InferenceEngine, RawInferenceOutput};

pub struct TractEngine {
    model: TypedSimplePlan<TypedModel>,
    input_width: u32,
    input_height: u32,
    context: ExecutionContext,
}

impl TractEngine {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn load<P: AsRef<Path>>(model_path: P, input_width: u32, input_height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    u8::datum_type(),
                    tvec!(1, input_height as usize, input_width as usize, 3),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_width,
            input_height,
            context: ExecutionContext::Accelerated,
        })
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        if width != self.input_width || height != self.input_height {
            return Err(anyhow!(
                "frame size {}x{} does not match model input {}x{}",
                width,
                height,
                self.input_width,
                self.input_height
            ));
        }
        let width = width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, height as usize, width, 3),
            |(_, y, x, channel)| pixels[(y * width + x) * 3 + channel],
        );
        Ok(input.into_tensor())
    }
}

impl InferenceEngine for TractEngine {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn infer(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<RawInferenceOutput> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;

        let scores = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no score output"))?
            .to_array_view::<f32>()
            .context("score tensor was not f32")?;
        let boxes = outputs
            .get(1)
            .ok_or_else(|| anyhow!("model produced no box output"))?
            .to_array_view::<f32>()
            .context("box tensor was not f32")?;

        let score_shape = scores.shape();
        if score_shape.len() != 3 {
            return Err(anyhow!(
                "score tensor has shape {:?}, expected [1, boxes, classes]",
                score_shape
            ));
        }
        let num_boxes = score_shape[1];
        let num_classes = score_shape[2];
        if boxes.len() != num_boxes * 4 {
            return Err(anyhow!(
                "box tensor holds {} values for {} boxes",
                boxes.len(),
                num_boxes
            ));
        }

        RawInferenceOutput::new(
            scores.iter().copied().collect(),
            boxes.iter().copied().collect(),
            num_boxes,
            num_classes,
        )
    }

    fn context(&self) -> ExecutionContext {
        self.context
    }

    fn set_context(&mut self, context: ExecutionContext) {
        self.context = context;
    }
}
