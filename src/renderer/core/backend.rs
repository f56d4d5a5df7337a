//! GPU Backend Trait
//!
//! Everything a post-process stage needs from the GPU: texture and
//! framebuffer lifecycle plus a single full-screen draw primitive. Objects
//! are owned by the backend and referenced through copyable handles, so a
//! stage can publish a texture to other stages without sharing ownership.
//!
//! Destruction is explicit and idempotent on every implementation:
//! destroying a handle that is no longer live is a silent no-op.

use glam::UVec2;

use super::resources::{FramebufferDesc, FramebufferHandle, TextureDesc, TextureHandle};
use crate::errors::Result;
use crate::renderer::pipeline::FragmentShader;
use crate::resources::uniforms::UniformValues;

/// One full-screen triangle draw.
#[derive(Debug, Clone, Copy)]
pub struct FullscreenDraw<'a> {
    /// Debug label (render pass label on wgpu).
    pub label: &'a str,
    pub shader: FragmentShader,
    /// Bound as `colorTexture`.
    pub color_texture: TextureHandle,
    /// Bound as `depthTexture`.
    pub depth_texture: TextureHandle,
    /// Remaining scalars and textures, in declaration order.
    pub uniforms: &'a UniformValues,
    pub target: FramebufferHandle,
    /// Alpha-blend over the target's current contents instead of replacing them.
    pub blend: bool,
}

impl FullscreenDraw<'_> {
    /// All shader inputs in binding order: `colorTexture`, `depthTexture`,
    /// then the draw's own uniforms.
    #[must_use]
    pub fn bound_values(&self) -> UniformValues {
        let mut values = UniformValues::new();
        values
            .set_texture("colorTexture", Some(self.color_texture))
            .set_texture("depthTexture", Some(self.depth_texture));
        for (name, value) in self.uniforms.iter() {
            values.set(name, value);
        }
        values
    }
}

/// GPU services consumed by post-process stages.
pub trait GpuBackend {
    /// Current drawing-buffer size in pixels.
    fn drawing_buffer_size(&self) -> UVec2;

    /// Changes the drawing-buffer size reported to stages.
    fn resize_drawing_buffer(&mut self, size: UVec2);

    /// Creates a 2D texture, optionally initialised with `data`
    /// (`desc.byte_len()` bytes, rows tightly packed).
    fn create_texture(&mut self, desc: &TextureDesc<'_>, data: Option<&[u8]>)
    -> Result<TextureHandle>;

    fn destroy_texture(&mut self, texture: TextureHandle);

    /// Size of a live texture.
    fn texture_size(&self, texture: TextureHandle) -> Option<UVec2>;

    /// Creates a framebuffer around an existing color texture.
    fn create_framebuffer(&mut self, desc: &FramebufferDesc<'_>) -> Result<FramebufferHandle>;

    /// Destroys a framebuffer, and its color texture when it was created
    /// with `destroy_attachments`.
    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle);

    /// Color texture of a live framebuffer.
    fn framebuffer_texture(&self, framebuffer: FramebufferHandle) -> Option<TextureHandle>;

    /// Runs a fragment shader over every pixel of `draw.target`.
    fn draw_fullscreen(&mut self, draw: &FullscreenDraw<'_>) -> Result<()>;

    /// Reads a texture back as tightly packed rows.
    fn read_texture(&mut self, texture: TextureHandle) -> Result<Vec<u8>>;
}
