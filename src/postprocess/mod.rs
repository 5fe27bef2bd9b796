//! Tensor post-processing: reduction, suppression, detection building.
//!
//! The three stages are pure functions over the raw inference buffers and run
//! in order on every pass:
//! - `scores::reduce_scores` — per-box best class + score
//! - `nms::suppress` — greedy overlap suppression over the reduced scores
//! - `builder::build_detections` — surviving indices → pixel-space detections
//!
//! Suppression is the only stage the pipeline wraps in an execution-context
//! switch; the stages themselves know nothing about engines or modes.

pub mod builder;
pub mod nms;
pub mod scores;

pub use builder::{build_detections, Detection};
pub use nms::{suppress, SuppressionParams};
pub use scores::{reduce_scores, ReducedScores};
