//! Post-Process Graph
//!
//! Provides:
//! - FrameContext: per-frame backend access
//! - PostProcessPass: one fullscreen shader invocation
//! - PassComposer: ordered chain of passes with ping-pong intermediates
//! - ViewportResourceManager: viewport-sized output, framebuffer and composer
//! - PostProcessStage: the contract a scene drives effects through
//! - passes: concrete stages

pub mod composer;
pub mod context;
pub mod pass;
pub mod passes;
pub mod stage;
pub mod viewport;

pub use composer::{ComposerOptions, PassComposer};
pub use context::FrameContext;
pub use pass::{PostProcessPass, SubPassDesc};
pub use passes::{AmbientOcclusionStage, RandomTexture};
pub use stage::PostProcessStage;
pub use viewport::{ViewportResourceManager, ViewportResources};
