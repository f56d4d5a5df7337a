//! Ambient Occlusion Parameters
//!
//! Pure data for the screen-space ambient occlusion stage. The stage owns one
//! instance of each parameter set and hands them to its composer on every
//! execution, so edits made between frames take effect without a rebuild:
//!
//! - [`AoGenerateUniforms`]: raw occlusion pass (noise texture, intensity, ...)
//! - [`AoBlurUniforms`]: one direction of the separable Gaussian blur
//! - [`AoCompositeUniforms`]: final mask/composite shader inputs
//!
//! Field names map onto camelCase parameter names, which are also the WGSL
//! uniform names and the JSON keys of [`AmbientOcclusionSettings`].
//!
//! # Usage
//!
//! ```rust,ignore
//! let ao = &mut stage;
//! ao.show = true;
//! ao.generate_mut().set_intensity(8.0);
//! ao.blur_x_mut().set_parameter("sigma", 3.0)?;
//! ```

use rand::RngExt;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::renderer::core::TextureHandle;
use crate::resources::uniforms::{UniformBlock, UniformValues, unknown_parameter};

/// Edge length of the square noise texture sampled by the generate pass.
pub const NOISE_TEXTURE_SIZE: u32 = 256;

/// Channels per noise texel.
pub const NOISE_CHANNELS: usize = 3;

// ============================================================================
// Generate Pass
// ============================================================================

/// Parameters of the occlusion generation pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AoGenerateUniforms {
    /// Noise texture, published by the stage once it exists.
    #[serde(skip)]
    pub random_texture: Option<TextureHandle>,
    pub intensity: f32,
    pub bias: f32,
    pub len_cap: f32,
    pub step_size: f32,
    pub frustum_length: f32,
}

impl Default for AoGenerateUniforms {
    fn default() -> Self {
        Self {
            random_texture: None,
            intensity: 4.0,
            bias: 0.0,
            len_cap: 0.25,
            step_size: 2.0,
            frustum_length: 1000.0,
        }
    }
}

impl AoGenerateUniforms {
    /// Sets the occlusion exponent.
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
    }

    /// Sets the angle bias subtracted before accumulating occlusion.
    pub fn set_bias(&mut self, bias: f32) {
        self.bias = bias;
    }

    /// Sets the maximum sample distance that still occludes.
    pub fn set_len_cap(&mut self, len_cap: f32) {
        self.len_cap = len_cap;
    }

    /// Sets the ray-march step size in pixels.
    pub fn set_step_size(&mut self, step_size: f32) {
        self.step_size = step_size;
    }

    /// Sets the far-minus-near distance used to linearise depth.
    pub fn set_frustum_length(&mut self, frustum_length: f32) {
        self.frustum_length = frustum_length;
    }
}

impl UniformBlock for AoGenerateUniforms {
    fn owner(&self) -> &'static str {
        "AmbientOcclusionGenerate"
    }

    fn write_uniforms(&self, out: &mut UniformValues) {
        out.set_texture("randomTexture", self.random_texture)
            .set_float("intensity", self.intensity)
            .set_float("bias", self.bias)
            .set_float("lenCap", self.len_cap)
            .set_float("stepSize", self.step_size)
            .set_float("frustumLength", self.frustum_length);
    }

    fn set_parameter(&mut self, name: &str, value: f32) -> Result<()> {
        match name {
            "intensity" => self.intensity = value,
            "bias" => self.bias = value,
            "lenCap" => self.len_cap = value,
            "stepSize" => self.step_size = value,
            "frustumLength" => self.frustum_length = value,
            _ => return Err(unknown_parameter(self.owner(), name)),
        }
        Ok(())
    }
}

// ============================================================================
// Blur Passes
// ============================================================================

/// Image axis a blur pass runs along.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlurAxis {
    #[default]
    X,
    Y,
}

impl BlurAxis {
    /// Value of the `direction` uniform: `0.0` for X, `1.0` for Y.
    #[must_use]
    pub const fn direction(self) -> f32 {
        match self {
            Self::X => 0.0,
            Self::Y => 1.0,
        }
    }
}

/// Parameters of one direction of the separable Gaussian blur.
///
/// The axis is fixed by the pass. It is not a named parameter and is not
/// part of the JSON settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AoBlurUniforms {
    pub delta: f32,
    pub sigma: f32,
    #[serde(skip)]
    pub axis: BlurAxis,
    pub kernel_size: f32,
}

impl Default for AoBlurUniforms {
    fn default() -> Self {
        Self::horizontal()
    }
}

impl AoBlurUniforms {
    /// Default parameters for the blur-X pass.
    #[must_use]
    pub const fn horizontal() -> Self {
        Self {
            delta: 1.0,
            sigma: 2.0,
            axis: BlurAxis::X,
            kernel_size: 1.0,
        }
    }

    /// Default parameters for the blur-Y pass.
    #[must_use]
    pub const fn vertical() -> Self {
        Self {
            axis: BlurAxis::Y,
            ..Self::horizontal()
        }
    }

    /// Copies the tunable values of `other`, keeping this pass's axis.
    pub fn tune_from(&mut self, other: &Self) {
        self.delta = other.delta;
        self.sigma = other.sigma;
        self.kernel_size = other.kernel_size;
    }
}

impl UniformBlock for AoBlurUniforms {
    fn owner(&self) -> &'static str {
        match self.axis {
            BlurAxis::X => "AmbientOcclusionBlurX",
            BlurAxis::Y => "AmbientOcclusionBlurY",
        }
    }

    fn write_uniforms(&self, out: &mut UniformValues) {
        out.set_float("delta", self.delta)
            .set_float("sigma", self.sigma)
            .set_float("direction", self.axis.direction())
            .set_float("kernelSize", self.kernel_size);
    }

    fn set_parameter(&mut self, name: &str, value: f32) -> Result<()> {
        match name {
            "delta" => self.delta = value,
            "sigma" => self.sigma = value,
            "kernelSize" => self.kernel_size = value,
            _ => return Err(unknown_parameter(self.owner(), name)),
        }
        Ok(())
    }
}

// ============================================================================
// Composite
// ============================================================================

/// Inputs of the composite shader that applies the occlusion to the scene.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AoCompositeUniforms {
    /// Output of the blur-Y pass, published after each rebuild.
    pub ao_texture: Option<TextureHandle>,
    /// Output the occlusion term alone instead of modulating the color.
    pub ao_only: bool,
}

impl UniformBlock for AoCompositeUniforms {
    fn owner(&self) -> &'static str {
        "AmbientOcclusion"
    }

    fn write_uniforms(&self, out: &mut UniformValues) {
        out.set_texture("aoTexture", self.ao_texture)
            .set_bool("aoOnly", self.ao_only);
    }

    fn set_parameter(&mut self, name: &str, value: f32) -> Result<()> {
        match name {
            "aoOnly" => self.ao_only = value != 0.0,
            _ => return Err(unknown_parameter(self.owner(), name)),
        }
        Ok(())
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Serializable snapshot of every tunable value of the stage.
///
/// Missing keys fall back to the defaults, so a config file only needs the
/// values it overrides:
///
/// ```json
/// { "show": true, "generate": { "intensity": 6.0 }, "blurY": { "sigma": 3.0 } }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AmbientOcclusionSettings {
    pub show: bool,
    pub ao_only: bool,
    pub generate: AoGenerateUniforms,
    pub blur_x: AoBlurUniforms,
    pub blur_y: AoBlurUniforms,
}

impl Default for AmbientOcclusionSettings {
    fn default() -> Self {
        Self {
            show: false,
            ao_only: false,
            generate: AoGenerateUniforms::default(),
            blur_x: AoBlurUniforms::horizontal(),
            blur_y: AoBlurUniforms::vertical(),
        }
    }
}

impl AmbientOcclusionSettings {
    /// Parses settings from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.blur_x.axis = BlurAxis::X;
        settings.blur_y.axis = BlurAxis::Y;

        for (key, blur) in [("blurX", &settings.blur_x), ("blurY", &settings.blur_y)] {
            if blur.sigma <= 0.0 {
                log::warn!("{key}.sigma is {}, blur weights will be undefined", blur.sigma);
            }
        }
        if settings.generate.frustum_length <= 0.0 {
            log::warn!(
                "generate.frustumLength is {}, every pixel will be treated as background",
                settings.generate.frustum_length
            );
        }
        Ok(settings)
    }

    /// Serializes settings to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// Noise Generation
// ============================================================================

/// Generates the texel bytes of the 256×256 RGB noise texture.
///
/// Only the first channel of each texel is filled, with a uniform value in
/// `0..=254`; the other two channels stay zero. The generate shader reads the
/// red channel only.
#[must_use]
pub fn generate_noise_bytes(rng: &mut StdRng) -> Vec<u8> {
    let len = (NOISE_TEXTURE_SIZE * NOISE_TEXTURE_SIZE) as usize * NOISE_CHANNELS;
    let mut data = vec![0u8; len];
    for texel in data.chunks_exact_mut(NOISE_CHANNELS) {
        texel[0] = rng.random_range(0..255u8);
    }
    data
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn noise_fills_only_red_channel() {
        let mut rng = StdRng::seed_from_u64(7);
        let data = generate_noise_bytes(&mut rng);

        assert_eq!(data.len(), 256 * 256 * 3);
        assert!(data.chunks_exact(3).all(|t| t[1] == 0 && t[2] == 0));
        assert!(data.chunks_exact(3).any(|t| t[0] != 0));
        assert!(data.iter().all(|&b| b < 255));
    }

    #[test]
    fn noise_is_deterministic_for_a_seed() {
        let a = generate_noise_bytes(&mut StdRng::seed_from_u64(1));
        let b = generate_noise_bytes(&mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn generate_uniform_order() {
        let names: Vec<_> = AoGenerateUniforms::default()
            .uniform_values()
            .iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(
            names,
            ["randomTexture", "intensity", "bias", "lenCap", "stepSize", "frustumLength"]
        );
    }

    #[test]
    fn blur_directions() {
        assert_eq!(AoBlurUniforms::horizontal().parameter("direction"), Some(0.0));
        assert_eq!(AoBlurUniforms::vertical().parameter("direction"), Some(1.0));
        assert_eq!(AoBlurUniforms::vertical().owner(), "AmbientOcclusionBlurY");
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let mut blur = AoBlurUniforms::horizontal();
        assert!(blur.set_parameter("intensity", 1.0).is_err());
        assert_eq!(blur, AoBlurUniforms::horizontal());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings =
            AmbientOcclusionSettings::from_json(r#"{ "blurY": { "sigma": 3.0 } }"#).unwrap();
        assert_eq!(settings.blur_y.sigma, 3.0);
        assert_eq!(settings.blur_y.axis, BlurAxis::Y);
        assert_eq!(settings.blur_y.delta, 1.0);
        assert_eq!(settings.generate, AoGenerateUniforms::default());
        assert!(!settings.show);
    }
}
