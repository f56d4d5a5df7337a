//! Shader Pipeline
//!
//! Fragment shader identity, template rendering and wgpu object caches:
//! - shader_manager: minijinja environment + `ShaderModule` cache
//! - shader_gen: binding code generation and template rendering
//! - cache: fullscreen `RenderPipeline` cache

pub mod cache;
pub mod shader_gen;
pub mod shader_manager;

pub use cache::{FullscreenPipelineKey, PipelineCache};
pub use shader_gen::ShaderGenerator;
pub use shader_manager::ShaderManager;

/// Identity of a full-screen fragment shader: a template under
/// `shaders/passes/` plus the defines it is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FragmentShader {
    pub name: &'static str,
    pub defines: &'static [&'static str],
}

impl FragmentShader {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name, defines: &[] }
    }

    #[must_use]
    pub const fn with_defines(name: &'static str, defines: &'static [&'static str]) -> Self {
        Self { name, defines }
    }

    /// Template path relative to the shader root.
    #[must_use]
    pub fn template_name(&self) -> String {
        format!("passes/{}", self.name)
    }
}

/// Raw occlusion from depth and the noise texture.
pub const AMBIENT_OCCLUSION_GENERATE: FragmentShader =
    FragmentShader::new("ambient_occlusion_generate");

/// One direction of the separable Gaussian blur, tuned for the occlusion term.
pub const GAUSSIAN_BLUR_1D_AO: FragmentShader =
    FragmentShader::with_defines("gaussian_blur_1d", &["AMBIENT_OCCLUSION"]);

/// Applies the blurred occlusion to the scene color (or shows it alone).
pub const AMBIENT_OCCLUSION: FragmentShader = FragmentShader::new("ambient_occlusion");
