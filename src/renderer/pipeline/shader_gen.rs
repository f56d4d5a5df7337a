//! Shader Code Generator
//!
//! Renders a pass template into final WGSL. The binding block is generated
//! from the draw's [`UniformValues`] so uniform names in Rust and WGSL can
//! never drift apart:
//!
//! ```wgsl
//! struct Uniforms {
//!     intensity: f32,
//!     _pad0: f32,
//! };
//! @group(0) @binding(0) var<uniform> u: Uniforms;
//! @group(0) @binding(1) var colorTexture: texture_2d<f32>;
//! @group(0) @binding(2) var colorTexture_sampler: sampler;
//! ```

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use super::FragmentShader;
use super::shader_manager::get_env;
use crate::errors::Result;
use crate::resources::uniforms::UniformValues;

/// Binding slot of the scalar uniform buffer.
pub const UNIFORM_BINDING: u32 = 0;

/// Binding slot of the `index`-th texture; its sampler follows at `+1`.
#[inline]
#[must_use]
pub const fn texture_binding(index: u32) -> u32 {
    1 + index * 2
}

#[derive(Serialize)]
struct ShaderContext<'a> {
    #[serde(flatten)]
    defines: BTreeMap<&'static str, bool>,
    binding_code: &'a str,
}

pub struct ShaderGenerator;

impl ShaderGenerator {
    /// WGSL declarations for the scalar block and every texture of `values`.
    #[must_use]
    pub fn binding_code(values: &UniformValues) -> String {
        let mut code = String::from("struct Uniforms {\n");
        for name in values.scalar_names() {
            let _ = writeln!(code, "    {name}: f32,");
        }
        for i in 0..values.padding_count() {
            let _ = writeln!(code, "    _pad{i}: f32,");
        }
        code.push_str("};\n");
        let _ = writeln!(
            code,
            "@group(0) @binding({UNIFORM_BINDING}) var<uniform> u: Uniforms;"
        );

        for (i, (name, _)) in values.textures().enumerate() {
            let binding = texture_binding(i as u32);
            let _ = writeln!(
                code,
                "@group(0) @binding({binding}) var {name}: texture_2d<f32>;"
            );
            let _ = writeln!(
                code,
                "@group(0) @binding({}) var {name}_sampler: sampler;",
                binding + 1
            );
        }
        code
    }

    /// Renders `shader`'s template with the binding block for `values`.
    pub fn generate_shader(shader: FragmentShader, values: &UniformValues) -> Result<String> {
        let binding_code = Self::binding_code(values);
        let ctx = ShaderContext {
            defines: shader.defines.iter().map(|d| (*d, true)).collect(),
            binding_code: &binding_code,
        };

        let template = get_env().get_template(&shader.template_name())?;
        let source = template.render(&ctx)?;

        Ok(format!("// === Auto-generated Fullscreen Shader ===\n{source}"))
    }
}
