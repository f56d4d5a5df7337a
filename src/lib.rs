//! Umbra
//!
//! Screen-space ambient occlusion as a post-process stage: a noise texture
//! provider, a multi-pass composer (generate, blur X, blur Y), viewport-sized
//! resources rebuilt on demand, and the [`AmbientOcclusionStage`] that wires
//! them together behind the [`PostProcessStage`] contract.
//!
//! GPU work goes through the [`GpuBackend`] trait; [`WgpuBackend`] is the
//! wgpu implementation and [`testing::RecordingBackend`] a CPU one for tests.

pub mod errors;
pub mod renderer;
pub mod resources;
pub mod testing;

pub use errors::{Result, UmbraError};
pub use renderer::RenderSettings;
pub use renderer::core::{
    FramebufferHandle, GpuBackend, PixelFormat, TextureHandle, WgpuBackend,
};
pub use renderer::graph::{
    AmbientOcclusionStage, FrameContext, PassComposer, PostProcessStage, ViewportResourceManager,
};
pub use resources::{
    AmbientOcclusionSettings, AoBlurUniforms, AoCompositeUniforms, AoGenerateUniforms, BlurAxis,
    UniformBlock, UniformValue, UniformValues,
};
