//! GPU Backend Layer
//!
//! Provides:
//! - `GpuBackend`: texture / framebuffer lifecycle and fullscreen draws
//! - `WgpuBackend`: headless wgpu implementation
//! - resource handles and descriptors shared by every backend

pub mod backend;
pub mod context;
pub mod resources;

pub use backend::{FullscreenDraw, GpuBackend};
pub use context::{GpuTexture, WgpuBackend};
pub use resources::{
    FramebufferDesc, FramebufferHandle, PixelFormat, SamplerDesc, TextureDesc, TextureFilter,
    TextureHandle, TextureUsages, TextureWrap,
};
