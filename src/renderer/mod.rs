//! Rendering
//!
//! - core: GPU backend trait, resource handles, wgpu backend
//! - graph: passes, composer, viewport resources, stages
//! - pipeline: shader templates and pipeline caches
//! - settings: backend creation settings

pub mod core;
pub mod graph;
pub mod pipeline;
pub mod settings;

pub use settings::RenderSettings;
