//! Post-Process Pass
//!
//! A single full-screen fragment shader invocation. A pass owns no GPU
//! objects of its own: its inputs and target are supplied by the composer
//! that sequences it, and its parameters are flattened from a
//! [`UniformBlock`](crate::resources::UniformBlock) on every execution.

use crate::errors::{Result, UmbraError};
use crate::renderer::core::{FramebufferHandle, FullscreenDraw, GpuBackend, TextureHandle};
use crate::renderer::pipeline::FragmentShader;
use crate::resources::uniforms::UniformValues;

/// Static description of one sub-pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubPassDesc {
    pub label: &'static str,
    pub shader: FragmentShader,
}

#[derive(Debug, Clone)]
pub struct PostProcessPass {
    label: &'static str,
    shader: FragmentShader,
    /// Hidden passes are skipped by the composer.
    pub show: bool,
    destroyed: bool,
}

impl PostProcessPass {
    #[must_use]
    pub fn new(desc: &SubPassDesc) -> Self {
        Self {
            label: desc.label,
            shader: desc.shader,
            show: true,
            destroyed: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[inline]
    #[must_use]
    pub fn shader(&self) -> FragmentShader {
        self.shader
    }

    /// Draws the pass into `target`.
    pub fn execute<B: GpuBackend + ?Sized>(
        &self,
        gpu: &mut B,
        color: TextureHandle,
        depth: TextureHandle,
        target: FramebufferHandle,
        uniforms: &UniformValues,
        blend: bool,
    ) -> Result<()> {
        if self.destroyed {
            return Err(UmbraError::StageDestroyed(self.label));
        }

        gpu.draw_fullscreen(&FullscreenDraw {
            label: self.label,
            shader: self.shader,
            color_texture: color,
            depth_texture: depth,
            uniforms,
            target,
            blend,
        })
    }

    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    #[inline]
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}
