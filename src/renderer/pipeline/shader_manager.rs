//! Shader Template Manager
//!
//! Manages WGSL shaders using the minijinja template engine and caches the
//! compiled `ShaderModule`s by a hash of their final source.

use std::borrow::Cow;
use std::path::Path;
use std::sync::OnceLock;

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, Error, ErrorKind, UndefinedBehavior};
use rust_embed::RustEmbed;
use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_128;

/// Directory that `{$ include $}` names resolve against.
const CHUNK_DIR: &str = "chunks";

#[derive(RustEmbed)]
#[folder = "src/renderer/pipeline/shaders"]
struct EmbeddedShaders;

/// The shared template environment.
///
/// Blocks use `{$ $}` and line statements `$$` so they cannot collide with
/// WGSL braces; undefined defines render as false.
pub fn get_env() -> &'static Environment<'static> {
    static ENV: OnceLock<Environment<'static>> = OnceLock::new();
    ENV.get_or_init(|| {
        let syntax = SyntaxConfig::builder()
            .block_delimiters("{$", "$}")
            .variable_delimiters("{{", "}}")
            .line_statement_prefix("$$")
            .build()
            .expect("Failed to configure Jinja2 syntax");

        let mut env = Environment::new();
        env.set_syntax(syntax);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(UndefinedBehavior::Lenient);
        env.set_path_join_callback(|name, _parent| format!("{CHUNK_DIR}/{name}").into());
        env.set_loader(load_template);
        env
    })
}

/// `passes/gaussian_blur_1d` → `passes/gaussian_blur_1d.wgsl`.
fn template_file(name: &str) -> Cow<'_, str> {
    match Path::new(name).extension() {
        Some(ext) if ext.eq_ignore_ascii_case("wgsl") => Cow::Borrowed(name),
        _ => Cow::Owned(format!("{name}.wgsl")),
    }
}

/// Debug builds prefer the on-disk template; release builds read the
/// embedded copy.
fn load_template(name: &str) -> Result<Option<String>, Error> {
    let file = template_file(name);

    #[cfg(debug_assertions)]
    {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("src/renderer/pipeline/shaders")
            .join(file.as_ref());
        if path.is_file() {
            return std::fs::read_to_string(&path).map(Some).map_err(|e| {
                Error::new(
                    ErrorKind::TemplateNotFound,
                    format!("cannot read {}: {e}", path.display()),
                )
            });
        }
    }

    Ok(EmbeddedShaders::get(&file)
        .and_then(|embedded| String::from_utf8(embedded.data.into_owned()).ok()))
}

/// Shader module cache.
///
/// Deduplicates compiled `wgpu::ShaderModule`s by hashing the final WGSL
/// source with xxh3-128.
#[derive(Default)]
pub struct ShaderManager {
    /// xxh3-128 of final WGSL → compiled module.
    module_cache: FxHashMap<u128, wgpu::ShaderModule>,
}

impl ShaderManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles final WGSL source (or returns the cached module).
    ///
    /// Returns `(module_ref, source_hash)`.
    pub fn get_or_compile(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        source: &str,
    ) -> (&wgpu::ShaderModule, u128) {
        let hash = xxh3_128(source.as_bytes());

        let module = self.module_cache.entry(hash).or_insert_with(|| {
            log::debug!("Compiling shader module '{label}'");
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("Shader Module {label}")),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        });

        (module, hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_names_gain_extension_once() {
        assert_eq!(template_file("passes/ambient_occlusion"), "passes/ambient_occlusion.wgsl");
        assert_eq!(template_file("chunks/fullscreen_vertex.wgsl"), "chunks/fullscreen_vertex.wgsl");
    }

    #[test]
    fn loads_templates_by_name() {
        let source = load_template("chunks/fullscreen_vertex").unwrap().unwrap();
        assert!(source.contains("fn vs_main"));
        assert!(load_template("passes/missing").unwrap().is_none());
    }
}
