//! Frame sources.
//!
//! Two kinds of input feed the pipeline:
//! - Still images, submitted by the host as base64-encoded PNG/JPEG payloads
//!   and decoded here (`image`).
//! - Live camera streams, acquired through the `Camera` seam with a facing
//!   preference and released before any re-acquire (`camera`).
//!
//! Device APIs stay behind the `Camera` trait; the only in-tree
//! implementation is the synthetic `stub://` camera used by tests and the
//! demo binary.

pub mod camera;
pub mod image;

pub use camera::{Camera, CameraStream, Facing, SyntheticCamera, SyntheticCameraConfig};
pub use image::decode_image;
