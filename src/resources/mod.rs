//! Resource Definitions
//!
//! CPU-side data consumed by the post-process passes. Nothing here touches
//! the GPU:
//! - uniforms: named shader inputs and the `UniformBlock` trait
//! - ssao: ambient occlusion parameter sets, settings and noise generation

pub mod ssao;
pub mod uniforms;

pub use ssao::{
    AmbientOcclusionSettings, AoBlurUniforms, AoCompositeUniforms, AoGenerateUniforms, BlurAxis,
    generate_noise_bytes,
};
pub use uniforms::{UniformBlock, UniformValue, UniformValues};
