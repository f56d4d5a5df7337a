//! Ambient Occlusion Stage
//!
//! Screen-space ambient occlusion as three chained fullscreen passes:
//!
//! 1. **Generate**: raw occlusion from depth, rotated per pixel by a 256×256
//!    noise texture
//! 2. **Blur X**: horizontal Gaussian blur (`direction = 0`)
//! 3. **Blur Y**: vertical Gaussian blur (`direction = 1`) into the output texture
//!
//! The output texture is published as `aoTexture` in the composite
//! parameters, which the scene feeds to the `ambient_occlusion` shader to
//! darken its color buffer.
//!
//! # Resource lifecycle
//!
//! | Resource | Created | Released |
//! |----------|---------|----------|
//! | noise texture | first shown `execute` | `destroy` |
//! | output texture, framebuffer, composer | first shown `execute`, every dirty `execute` | next rebuild, `destroy` |
//!
//! A hidden stage touches nothing: `execute` returns before any backend call.

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::noise::RandomTexture;
use crate::errors::{Result, UmbraError};
use crate::renderer::core::{GpuBackend, TextureHandle};
use crate::renderer::graph::composer::ComposerOptions;
use crate::renderer::graph::context::FrameContext;
use crate::renderer::graph::pass::SubPassDesc;
use crate::renderer::graph::stage::PostProcessStage;
use crate::renderer::graph::viewport::ViewportResourceManager;
use crate::renderer::pipeline::{
    AMBIENT_OCCLUSION, AMBIENT_OCCLUSION_GENERATE, FragmentShader, GAUSSIAN_BLUR_1D_AO,
};
use crate::resources::ssao::{
    AmbientOcclusionSettings, AoBlurUniforms, AoCompositeUniforms, AoGenerateUniforms,
};
use crate::resources::uniforms::{UniformBlock, UniformValues};

const STAGE_NAME: &str = "Ambient Occlusion";

/// Generate → blur X → blur Y.
pub const SUB_PASSES: [SubPassDesc; 3] = [
    SubPassDesc {
        label: "Ambient Occlusion Generate",
        shader: AMBIENT_OCCLUSION_GENERATE,
    },
    SubPassDesc {
        label: "Ambient Occlusion Blur X",
        shader: GAUSSIAN_BLUR_1D_AO,
    },
    SubPassDesc {
        label: "Ambient Occlusion Blur Y",
        shader: GAUSSIAN_BLUR_1D_AO,
    },
];

const COMPOSER_OPTIONS: ComposerOptions = ComposerOptions {
    label: STAGE_NAME,
    blend_output: false,
};

pub struct AmbientOcclusionStage {
    /// Whether the effect runs. Off by default.
    pub show: bool,

    generate: AoGenerateUniforms,
    blur_x: AoBlurUniforms,
    blur_y: AoBlurUniforms,
    composite: AoCompositeUniforms,

    random_texture: RandomTexture,
    viewport: ViewportResourceManager,
    rng: StdRng,
    destroyed: bool,
}

impl Default for AmbientOcclusionStage {
    fn default() -> Self {
        Self::new()
    }
}

impl AmbientOcclusionStage {
    /// Creates a hidden stage whose noise is seeded from the thread RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Creates a hidden stage with reproducible noise.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            show: false,
            generate: AoGenerateUniforms::default(),
            blur_x: AoBlurUniforms::horizontal(),
            blur_y: AoBlurUniforms::vertical(),
            composite: AoCompositeUniforms::default(),
            random_texture: RandomTexture::new(),
            viewport: ViewportResourceManager::new(),
            rng: StdRng::seed_from_u64(seed),
            destroyed: false,
        }
    }

    /// Creates a stage configured from `settings`.
    #[must_use]
    pub fn from_settings(settings: &AmbientOcclusionSettings) -> Self {
        let mut stage = Self::new();
        stage.apply_settings(settings);
        stage
    }

    // === Parameter sets ===

    #[inline]
    #[must_use]
    pub fn generate(&self) -> &AoGenerateUniforms {
        &self.generate
    }

    #[inline]
    pub fn generate_mut(&mut self) -> &mut AoGenerateUniforms {
        &mut self.generate
    }

    #[inline]
    #[must_use]
    pub fn blur_x(&self) -> &AoBlurUniforms {
        &self.blur_x
    }

    #[inline]
    pub fn blur_x_mut(&mut self) -> &mut AoBlurUniforms {
        &mut self.blur_x
    }

    #[inline]
    #[must_use]
    pub fn blur_y(&self) -> &AoBlurUniforms {
        &self.blur_y
    }

    #[inline]
    pub fn blur_y_mut(&mut self) -> &mut AoBlurUniforms {
        &mut self.blur_y
    }

    #[inline]
    #[must_use]
    pub fn composite(&self) -> &AoCompositeUniforms {
        &self.composite
    }

    /// Shows the occlusion term alone instead of the darkened scene.
    pub fn set_ao_only(&mut self, ao_only: bool) {
        self.composite.ao_only = ao_only;
    }

    // === Settings ===

    /// Copies every tunable value from `settings`. Published textures and
    /// blur directions are kept.
    pub fn apply_settings(&mut self, settings: &AmbientOcclusionSettings) {
        self.show = settings.show;
        self.composite.ao_only = settings.ao_only;
        self.generate = AoGenerateUniforms {
            random_texture: self.generate.random_texture,
            ..settings.generate
        };
        self.blur_x.tune_from(&settings.blur_x);
        self.blur_y.tune_from(&settings.blur_y);
    }

    /// Snapshot of the current tunable values.
    #[must_use]
    pub fn settings(&self) -> AmbientOcclusionSettings {
        AmbientOcclusionSettings {
            show: self.show,
            ao_only: self.composite.ao_only,
            generate: AoGenerateUniforms {
                random_texture: None,
                ..self.generate
            },
            blur_x: self.blur_x,
            blur_y: self.blur_y,
        }
    }

    // === Stage surface ===

    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        STAGE_NAME
    }

    /// Always `true`: nothing is compiled asynchronously at this layer.
    #[inline]
    #[must_use]
    pub fn ready(&self) -> bool {
        true
    }

    #[inline]
    #[must_use]
    pub fn fragment_shader(&self) -> FragmentShader {
        AMBIENT_OCCLUSION
    }

    /// Composite shader inputs (`aoTexture`, `aoOnly`).
    #[must_use]
    pub fn uniform_values(&self) -> UniformValues {
        self.composite.uniform_values()
    }

    #[inline]
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The noise texture, once created.
    #[inline]
    #[must_use]
    pub fn random_texture(&self) -> Option<TextureHandle> {
        self.random_texture.texture()
    }

    /// The viewport-sized resources, once created.
    #[inline]
    #[must_use]
    pub fn viewport(&self) -> &ViewportResourceManager {
        &self.viewport
    }

    /// Runs the effect. See [`PostProcessStage::execute`].
    pub fn execute<B: GpuBackend + ?Sized>(
        &mut self,
        ctx: &mut FrameContext<'_, B>,
        color: TextureHandle,
        depth: TextureHandle,
        dirty: bool,
    ) -> Result<()> {
        if self.destroyed {
            return Err(UmbraError::StageDestroyed(STAGE_NAME));
        }
        if !self.show {
            return Ok(());
        }

        let noise = self.random_texture.ensure(&mut *ctx.gpu, &mut self.rng)?;
        self.generate.random_texture = Some(noise);

        if dirty || !self.viewport.is_allocated() {
            self.composite.ao_texture = None;
            let size = ctx.drawing_buffer_size();
            let output = self
                .viewport
                .rebuild(&mut *ctx.gpu, size, &SUB_PASSES, COMPOSER_OPTIONS)?;
            self.composite.ao_texture = Some(output);
        }

        log::trace!("Executing '{STAGE_NAME}' (frame {})", ctx.frame_number);

        if let Some(resources) = self.viewport.resources() {
            let uniforms: [&dyn UniformBlock; 3] = [&self.generate, &self.blur_x, &self.blur_y];
            resources.composer.execute(
                &mut *ctx.gpu,
                color,
                depth,
                resources.framebuffer,
                &uniforms,
            )?;
        }
        Ok(())
    }

    /// Releases the viewport resources and the noise texture. Safe to call
    /// repeatedly.
    pub fn destroy<B: GpuBackend + ?Sized>(&mut self, gpu: &mut B) {
        self.viewport.release(gpu);
        self.random_texture.release(gpu);
        self.generate.random_texture = None;
        self.composite.ao_texture = None;
        self.destroyed = true;
    }
}

impl<B: GpuBackend + ?Sized> PostProcessStage<B> for AmbientOcclusionStage {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    fn show(&self) -> bool {
        self.show
    }

    fn set_show(&mut self, show: bool) {
        self.show = show;
    }

    fn ready(&self) -> bool {
        true
    }

    fn fragment_shader(&self) -> FragmentShader {
        AMBIENT_OCCLUSION
    }

    fn uniform_values(&self) -> UniformValues {
        self.composite.uniform_values()
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_, B>,
        color: TextureHandle,
        depth: TextureHandle,
        dirty: bool,
    ) -> Result<()> {
        AmbientOcclusionStage::execute(self, ctx, color, depth, dirty)
    }

    fn destroy(&mut self, gpu: &mut B) {
        AmbientOcclusionStage::destroy(self, gpu);
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}
