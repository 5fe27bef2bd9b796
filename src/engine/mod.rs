//! Inference engine seam.
//!
//! The kernel never executes tensor math itself; it consumes an
//! `InferenceEngine` through this narrow interface. Engines receive raw RGB
//! pixels and return the two flat output buffers of an SSD-style detection
//! head. Everything downstream (reduction, suppression, building) is the
//! kernel's job, not the engine's.
//!
//! Engines also expose their execution context. The suppression step runs on
//! the general-purpose context regardless of where inference ran; the
//! pipeline brackets it with a `ContextScope` so the prior context is
//! restored on every exit path.

pub mod stub;
#[cfg(feature = "engine-tract")]
pub mod tract;

pub use stub::StubEngine;
#[cfg(feature = "engine-tract")]
pub use tract::TractEngine;

use anyhow::{anyhow, Result};

use crate::config::{WARMUP_HEIGHT, WARMUP_WIDTH};

/// Raw output of one inference call: flat score and box buffers.
///
/// Owned by value by the pass that requested it and dropped before that pass
/// returns; nothing may retain these buffers across passes.
pub struct RawInferenceOutput {
    /// `num_boxes x num_classes`, row-major.
    pub scores: Vec<f32>,
    /// `num_boxes x 4`, normalized `[min_y, min_x, max_y, max_x]`.
    pub boxes: Vec<f32>,
    pub num_boxes: usize,
    pub num_classes: usize,
}

impl RawInferenceOutput {
    /// Build an output, validating buffer lengths against the dimensions.
    pub fn new(
        scores: Vec<f32>,
        boxes: Vec<f32>,
        num_boxes: usize,
        num_classes: usize,
    ) -> Result<Self> {
        if scores.len() != num_boxes * num_classes {
            return Err(anyhow!(
                "score buffer holds {} values, expected {} ({} boxes x {} classes)",
                scores.len(),
                num_boxes * num_classes,
                num_boxes,
                num_classes
            ));
        }
        if boxes.len() != num_boxes * 4 {
            return Err(anyhow!(
                "box buffer holds {} values, expected {} ({} boxes x 4)",
                boxes.len(),
                num_boxes * 4,
                num_boxes
            ));
        }
        Ok(Self {
            scores,
            boxes,
            num_boxes,
            num_classes,
        })
    }
}

/// Execution context an engine is currently bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionContext {
    /// The accelerated context inference normally runs on.
    Accelerated,
    /// The general-purpose context suppression must run on.
    General,
}

/// Inference engine seam.
///
/// Implementations own the loaded model. `infer` is synchronous and must not
/// retain the pixel slice beyond the call.
pub trait InferenceEngine {
    /// Engine identifier, used in log lines only.
    fn name(&self) -> &'static str;

    /// Run one inference pass over an RGB frame.
    fn infer(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<RawInferenceOutput>;

    /// The context the engine is currently bound to.
    fn context(&self) -> ExecutionContext;

    /// Rebind the engine to a context. Infallible: engines that only have one
    /// real context still track the setting so restoration is observable.
    fn set_context(&mut self, context: ExecutionContext);

    /// Warm-up hook: a throwaway inference on a zeroed frame so
    /// initialization costs land before real use.
    fn warm_up(&mut self) -> Result<()> {
        let zeros = vec![0u8; (WARMUP_WIDTH * WARMUP_HEIGHT * 3) as usize];
        self.infer(&zeros, WARMUP_WIDTH, WARMUP_HEIGHT).map(|_| ())
    }
}

/// RAII bracket around an execution-context switch.
///
/// Restores the previous context on drop, so every exit path out of the
/// bracketed step (including `?`) rebinds the engine correctly.
pub struct ContextScope<'a> {
    engine: &'a mut dyn InferenceEngine,
    prev: ExecutionContext,
}

impl<'a> ContextScope<'a> {
    pub fn enter(engine: &'a mut dyn InferenceEngine, context: ExecutionContext) -> Self {
        let prev = engine.context();
        engine.set_context(context);
        Self { engine, prev }
    }
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        self.engine.set_context(self.prev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_output_validates_buffer_lengths() {
        assert!(RawInferenceOutput::new(vec![0.0; 6], vec![0.0; 8], 2, 3).is_ok());
        assert!(RawInferenceOutput::new(vec![0.0; 5], vec![0.0; 8], 2, 3).is_err());
        assert!(RawInferenceOutput::new(vec![0.0; 6], vec![0.0; 7], 2, 3).is_err());
    }

    #[test]
    fn context_scope_restores_on_drop_and_on_early_exit() {
        let mut engine = StubEngine::new();
        assert_eq!(engine.context(), ExecutionContext::Accelerated);
        {
            let _scope = ContextScope::enter(&mut engine, ExecutionContext::General);
        }
        assert_eq!(engine.context(), ExecutionContext::Accelerated);

        let result: Result<()> = (|| {
            let _scope = ContextScope::enter(&mut engine, ExecutionContext::General);
            Err(anyhow!("bracketed step failed"))?;
            Ok(())
        })();
        assert!(result.is_err());
        assert_eq!(engine.context(), ExecutionContext::Accelerated);
    }

    #[test]
    fn warm_up_default_runs_a_zeroed_inference() {
        let mut engine = StubEngine::new();
        engine.warm_up().unwrap();
    }
}
