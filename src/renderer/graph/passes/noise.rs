//! Random Noise Texture
//!
//! The 256×256 noise texture sampled by the occlusion generate pass. It is
//! created on first use, never modified, and independent of the viewport.

use rand::rngs::StdRng;

use crate::errors::Result;
use crate::renderer::core::{
    GpuBackend, PixelFormat, SamplerDesc, TextureDesc, TextureFilter, TextureHandle, TextureUsages,
};
use crate::resources::ssao::{NOISE_TEXTURE_SIZE, generate_noise_bytes};

#[derive(Debug, Default)]
pub struct RandomTexture {
    texture: Option<TextureHandle>,
}

impl RandomTexture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the noise texture, creating it on the first call.
    pub fn ensure<B: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut B,
        rng: &mut StdRng,
    ) -> Result<TextureHandle> {
        if let Some(texture) = self.texture {
            return Ok(texture);
        }

        let data = generate_noise_bytes(rng);
        let texture = gpu.create_texture(
            &TextureDesc {
                label: "Ambient Occlusion Random Texture",
                width: NOISE_TEXTURE_SIZE,
                height: NOISE_TEXTURE_SIZE,
                format: PixelFormat::Rgb8Unorm,
                usage: TextureUsages::SAMPLED,
                sampler: SamplerDesc::clamp_to_edge(TextureFilter::Nearest),
            },
            Some(&data),
        )?;

        self.texture = Some(texture);
        Ok(texture)
    }

    pub fn release<B: GpuBackend + ?Sized>(&mut self, gpu: &mut B) {
        if let Some(texture) = self.texture.take() {
            gpu.destroy_texture(texture);
        }
    }

    #[inline]
    #[must_use]
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }
}
