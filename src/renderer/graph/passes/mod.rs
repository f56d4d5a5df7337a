//! Post-Process Stage Implementations

pub mod ambient_occlusion;
mod noise;

pub use ambient_occlusion::AmbientOcclusionStage;
pub use noise::RandomTexture;
