//! GPU Resource Handles
//!
//! Stages never hold backend objects directly. They hold copyable handles
//! issued by a [`GpuBackend`](super::GpuBackend), which owns the objects in
//! slot maps until they are explicitly destroyed:
//!
//! - texture.rs: texture / sampler / framebuffer descriptors

mod texture;

use slotmap::new_key_type;

pub use texture::{
    FramebufferDesc, PixelFormat, SamplerDesc, TextureDesc, TextureFilter, TextureUsages,
    TextureWrap,
};

new_key_type! {
    /// Handle to a texture owned by a backend.
    pub struct TextureHandle;

    /// Handle to a framebuffer owned by a backend.
    pub struct FramebufferHandle;
}
