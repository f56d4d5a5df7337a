//! Viewport Resource Manager
//!
//! Owns the GPU objects whose size follows the drawing buffer: the effect's
//! output texture, the framebuffer wrapping it and the composer (with its
//! intermediates). They are released and reallocated together on every
//! rebuild, so at most one set is ever alive.
//!
//! The framebuffer is created with `destroy_attachments = false`: the output
//! texture is published to other stages and is released by the manager
//! itself, not through the framebuffer.

use glam::UVec2;

use super::composer::{ComposerOptions, PassComposer};
use super::pass::SubPassDesc;
use crate::errors::Result;
use crate::renderer::core::{
    FramebufferDesc, FramebufferHandle, GpuBackend, PixelFormat, SamplerDesc, TextureDesc,
    TextureFilter, TextureHandle, TextureUsages,
};

/// The viewport-sized resources of one effect.
pub struct ViewportResources {
    pub output_texture: TextureHandle,
    pub framebuffer: FramebufferHandle,
    pub composer: PassComposer,
    pub size: UVec2,
}

#[derive(Default)]
pub struct ViewportResourceManager {
    resources: Option<ViewportResources>,
}

impl ViewportResourceManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Releases the current resources and allocates a new set sized `size`.
    ///
    /// Returns the new output texture. If any allocation fails, everything
    /// this call allocated is released and the manager is left empty.
    pub fn rebuild<B: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut B,
        size: UVec2,
        passes: &[SubPassDesc],
        options: ComposerOptions,
    ) -> Result<TextureHandle> {
        self.release(gpu);

        let texture_label = format!("{} Output", options.label);
        let output_texture = gpu.create_texture(
            &TextureDesc {
                label: &texture_label,
                width: size.x,
                height: size.y,
                format: PixelFormat::Rgba8Unorm,
                usage: TextureUsages::RENDER_TARGET
                    | TextureUsages::SAMPLED
                    | TextureUsages::COPY_SRC,
                sampler: SamplerDesc::clamp_to_edge(TextureFilter::Linear),
            },
            None,
        )?;

        let framebuffer_label = format!("{} Framebuffer", options.label);
        let framebuffer = match gpu.create_framebuffer(&FramebufferDesc {
            label: &framebuffer_label,
            color_texture: output_texture,
            destroy_attachments: false,
        }) {
            Ok(framebuffer) => framebuffer,
            Err(e) => {
                gpu.destroy_texture(output_texture);
                return Err(e);
            }
        };

        let composer = match PassComposer::new(gpu, size, passes, options) {
            Ok(composer) => composer,
            Err(e) => {
                gpu.destroy_framebuffer(framebuffer);
                gpu.destroy_texture(output_texture);
                return Err(e);
            }
        };

        log::debug!(
            "Rebuilt '{}' viewport resources at {}x{}",
            options.label,
            size.x,
            size.y
        );

        self.resources = Some(ViewportResources {
            output_texture,
            framebuffer,
            composer,
            size,
        });
        Ok(output_texture)
    }

    /// Destroys the output texture, the framebuffer and the composer.
    /// Does nothing when no resources are held.
    pub fn release<B: GpuBackend + ?Sized>(&mut self, gpu: &mut B) {
        if let Some(mut resources) = self.resources.take() {
            gpu.destroy_texture(resources.output_texture);
            gpu.destroy_framebuffer(resources.framebuffer);
            resources.composer.destroy(gpu);
        }
    }

    #[inline]
    #[must_use]
    pub fn is_allocated(&self) -> bool {
        self.resources.is_some()
    }

    #[inline]
    #[must_use]
    pub fn resources(&self) -> Option<&ViewportResources> {
        self.resources.as_ref()
    }
}
