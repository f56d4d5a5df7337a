//! Pass Composer
//!
//! `PassComposer` chains an ordered list of [`PostProcessPass`]es into one
//! logical effect.
//!
//! # Chaining
//!
//! ```text
//! color ──▶ pass 0 ──▶ intermediate A ──▶ pass 1 ──▶ intermediate B ──▶ pass 2 ──▶ target
//!             ▲                              ▲                            ▲
//! depth ──────┴──────────────────────────────┴────────────────────────────┘
//! ```
//!
//! The first shown pass reads the caller's color input, every later pass
//! reads the previous pass's output, every pass reads the caller's depth
//! input, and the last shown pass writes the caller's target. Intermediates
//! alternate between at most two composer-owned targets sized like the
//! viewport. The composer never writes into its inputs.

use glam::UVec2;
use smallvec::SmallVec;

use super::pass::{PostProcessPass, SubPassDesc};
use crate::errors::{Result, UmbraError};
use crate::renderer::core::{
    FramebufferDesc, FramebufferHandle, GpuBackend, PixelFormat, SamplerDesc, TextureDesc,
    TextureFilter, TextureHandle, TextureUsages,
};
use crate::resources::uniforms::UniformBlock;

/// Construction options of a [`PassComposer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposerOptions {
    /// Prefix of intermediate texture / framebuffer labels.
    pub label: &'static str,
    /// Blend the final pass over the target instead of replacing it.
    pub blend_output: bool,
}

#[derive(Debug, Clone, Copy)]
struct Intermediate {
    texture: TextureHandle,
    framebuffer: FramebufferHandle,
}

pub struct PassComposer {
    passes: Vec<PostProcessPass>,
    intermediates: SmallVec<[Intermediate; 2]>,
    options: ComposerOptions,
    size: UVec2,
    destroyed: bool,
}

impl PassComposer {
    /// Creates the composer and its intermediate targets.
    ///
    /// If an intermediate allocation fails, the ones already created are
    /// destroyed before the error is returned.
    pub fn new<B: GpuBackend + ?Sized>(
        gpu: &mut B,
        size: UVec2,
        passes: &[SubPassDesc],
        options: ComposerOptions,
    ) -> Result<Self> {
        let mut composer = Self {
            passes: passes.iter().map(PostProcessPass::new).collect(),
            intermediates: SmallVec::new(),
            options,
            size,
            destroyed: false,
        };

        let count = passes.len().saturating_sub(1).min(2);
        for i in 0..count {
            match Self::create_intermediate(gpu, size, options.label, i) {
                Ok(intermediate) => composer.intermediates.push(intermediate),
                Err(e) => {
                    composer.destroy(gpu);
                    return Err(e);
                }
            }
        }

        Ok(composer)
    }

    fn create_intermediate<B: GpuBackend + ?Sized>(
        gpu: &mut B,
        size: UVec2,
        label: &str,
        index: usize,
    ) -> Result<Intermediate> {
        let texture_label = format!("{label} Intermediate {index}");
        let texture = gpu.create_texture(
            &TextureDesc {
                label: &texture_label,
                width: size.x,
                height: size.y,
                format: PixelFormat::Rgba8Unorm,
                usage: TextureUsages::RENDER_TARGET | TextureUsages::SAMPLED,
                sampler: SamplerDesc::clamp_to_edge(TextureFilter::Linear),
            },
            None,
        )?;

        let framebuffer_label = format!("{label} Intermediate Framebuffer {index}");
        let framebuffer = match gpu.create_framebuffer(&FramebufferDesc {
            label: &framebuffer_label,
            color_texture: texture,
            destroy_attachments: true,
        }) {
            Ok(framebuffer) => framebuffer,
            Err(e) => {
                gpu.destroy_texture(texture);
                return Err(e);
            }
        };

        Ok(Intermediate {
            texture,
            framebuffer,
        })
    }

    /// Runs every shown pass in order.
    ///
    /// `uniforms[i]` supplies the parameters of pass `i`; its values are read
    /// fresh on every call.
    pub fn execute<B: GpuBackend + ?Sized>(
        &self,
        gpu: &mut B,
        color: TextureHandle,
        depth: TextureHandle,
        target: FramebufferHandle,
        uniforms: &[&dyn UniformBlock],
    ) -> Result<()> {
        if self.destroyed {
            return Err(UmbraError::StageDestroyed("PassComposer"));
        }
        if uniforms.len() != self.passes.len() {
            return Err(UmbraError::PassCountMismatch {
                expected: self.passes.len(),
                actual: uniforms.len(),
            });
        }

        let active: SmallVec<[usize; 4]> = self
            .passes
            .iter()
            .enumerate()
            .filter(|(_, pass)| pass.show)
            .map(|(i, _)| i)
            .collect();

        let mut input = color;
        for (step, &index) in active.iter().enumerate() {
            let last = step + 1 == active.len();
            let values = uniforms[index].uniform_values();

            if last {
                self.passes[index].execute(
                    gpu,
                    input,
                    depth,
                    target,
                    &values,
                    self.options.blend_output,
                )?;
            } else {
                let intermediate = self.intermediates[step % self.intermediates.len()];
                self.passes[index].execute(
                    gpu,
                    input,
                    depth,
                    intermediate.framebuffer,
                    &values,
                    false,
                )?;
                input = intermediate.texture;
            }
        }

        Ok(())
    }

    /// Destroys every pass and intermediate target. Safe to call repeatedly.
    pub fn destroy<B: GpuBackend + ?Sized>(&mut self, gpu: &mut B) {
        for intermediate in self.intermediates.drain(..) {
            gpu.destroy_framebuffer(intermediate.framebuffer);
        }
        for pass in &mut self.passes {
            pass.destroy();
        }
        self.destroyed = true;
    }

    #[inline]
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    #[inline]
    #[must_use]
    pub fn passes(&self) -> &[PostProcessPass] {
        &self.passes
    }

    #[inline]
    pub fn passes_mut(&mut self) -> &mut [PostProcessPass] {
        &mut self.passes
    }

    #[inline]
    #[must_use]
    pub fn options(&self) -> ComposerOptions {
        self.options
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Textures of the composer-owned intermediate targets.
    pub fn intermediate_textures(&self) -> impl Iterator<Item = TextureHandle> + '_ {
        self.intermediates.iter().map(|i| i.texture)
    }
}
