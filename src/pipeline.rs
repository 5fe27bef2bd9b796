//! One end-to-end detection pass.
//!
//! A pass is split-phase: `begin_pass` hands out a ticket (refusing while
//! another pass is outstanding), the caller runs inference, then
//! `complete_pass` post-processes the raw output or `abort_pass` gives the
//! slot back after an engine failure.
//!
//! Every ticket carries the generation current at begin time. Mode switches
//! and camera teardown call `invalidate`, so a pass that straddles such an
//! event completes quietly as `None` instead of being rendered against a
//! surface it no longer belongs to.

use crate::engine::{ContextScope, ExecutionContext, InferenceEngine, RawInferenceOutput};
use crate::error::KernelError;
use crate::labels::LabelTable;
use crate::mode::Viewport;
use crate::postprocess::{build_detections, reduce_scores, suppress, Detection, SuppressionParams};

/// Token for an in-flight pass.
#[derive(Debug)]
pub struct PassTicket {
    generation: u64,
}

pub struct DetectionPipeline {
    params: SuppressionParams,
    generation: u64,
    in_flight: bool,
}

impl DetectionPipeline {
    pub fn new(params: SuppressionParams) -> Self {
        Self {
            params,
            generation: 0,
            in_flight: false,
        }
    }

    /// Invalidate all outstanding passes. Call on every mode switch, facing
    /// change, and source teardown.
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Claim the single pass slot. Returns `None` (and logs) when a pass is
    /// already outstanding; the new request is dropped, not queued.
    pub fn begin_pass(&mut self) -> Option<PassTicket> {
        if self.in_flight {
            log::debug!("detection pass already in flight, dropping request");
            return None;
        }
        self.in_flight = true;
        Some(PassTicket {
            generation: self.generation,
        })
    }

    /// Give the pass slot back after an engine failure.
    pub fn abort_pass(&mut self, _ticket: PassTicket) {
        self.in_flight = false;
    }

    /// Post-process one raw inference output.
    ///
    /// Consumes the raw buffers; they are dropped before this returns
    /// regardless of outcome. Returns `Ok(None)` for a stale ticket.
    /// Suppression runs under a general-purpose `ContextScope`; the engine's
    /// prior context is restored on every exit path, including the
    /// out-of-range-label error return.
    pub fn complete_pass(
        &mut self,
        ticket: PassTicket,
        raw: RawInferenceOutput,
        engine: &mut dyn InferenceEngine,
        viewport: Viewport,
        labels: &LabelTable,
    ) -> Result<Option<Vec<Detection>>, KernelError> {
        self.in_flight = false;
        if ticket.generation != self.generation {
            log::debug!(
                "discarding stale detection pass (generation {} != {})",
                ticket.generation,
                self.generation
            );
            return Ok(None);
        }

        let reduced = reduce_scores(&raw.scores, raw.num_boxes, raw.num_classes);
        let keep = {
            let _general = ContextScope::enter(engine, ExecutionContext::General);
            suppress(&raw.boxes, &reduced.scores, self.params)
        };
        let detections = build_detections(&keep, &raw.boxes, &reduced, viewport, labels)?;
        log::debug!(
            "pass complete: {} of {} boxes survive suppression",
            detections.len(),
            raw.num_boxes
        );
        Ok(Some(detections))
    }
}
