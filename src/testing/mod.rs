//! Test Harness
//!
//! Helpers for exercising post-process stages:
//! - recording: CPU backend that records every backend call
//! - scene: offscreen scene driving stages, plus `create_scene` for wgpu

pub mod recording;
pub mod scene;

pub use recording::{DrawRecord, GpuEvent, RecordingBackend};
pub use scene::{OffscreenScene, SceneOptions, create_scene};
