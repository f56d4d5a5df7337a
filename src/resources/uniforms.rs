//! Uniform Values
//!
//! Post-process passes receive their parameters as an ordered list of named
//! values. Scalars are packed, in declaration order, into one uniform buffer
//! whose WGSL struct is generated from the same names; textures are bound as
//! texture/sampler pairs in declaration order.
//!
//! Typed parameter sets implement [`UniformBlock`] and are flattened into a
//! fresh [`UniformValues`] on every execution, so edits between frames are
//! always observed.

use smallvec::SmallVec;

use crate::errors::{Result, UmbraError};
use crate::renderer::core::TextureHandle;

/// Scalars per WGSL `vec4` row; the packed block is padded to whole rows.
const SCALARS_PER_ROW: usize = 4;

// ============================================================================
// UniformValue
// ============================================================================

/// A single named shader input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    /// Packed as `0.0` / `1.0`.
    Bool(bool),
    /// `None` until the owning stage publishes a texture.
    Texture(Option<TextureHandle>),
}

impl UniformValue {
    /// Scalar value as it will be packed into the uniform buffer.
    #[inline]
    #[must_use]
    pub fn as_scalar(self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(v),
            Self::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
            Self::Texture(_) => None,
        }
    }
}

// ============================================================================
// UniformValues
// ============================================================================

/// Ordered name → value list for one pass invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformValues {
    entries: SmallVec<[(&'static str, UniformValue); 8]>,
}

impl UniformValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing an existing entry in place so order is stable.
    pub fn set(&mut self, name: &'static str, value: UniformValue) -> &mut Self {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
        self
    }

    #[inline]
    pub fn set_float(&mut self, name: &'static str, value: f32) -> &mut Self {
        self.set(name, UniformValue::Float(value))
    }

    #[inline]
    pub fn set_bool(&mut self, name: &'static str, value: bool) -> &mut Self {
        self.set(name, UniformValue::Bool(value))
    }

    #[inline]
    pub fn set_texture(&mut self, name: &'static str, texture: Option<TextureHandle>) -> &mut Self {
        self.set(name, UniformValue::Texture(texture))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    /// Scalar value of `name`, if it exists and is not a texture.
    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(UniformValue::as_scalar)
    }

    /// Texture bound to `name`, if it exists and is set.
    #[must_use]
    pub fn texture(&self, name: &str) -> Option<TextureHandle> {
        match self.get(name) {
            Some(UniformValue::Texture(t)) => t,
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, UniformValue)> + '_ {
        self.entries.iter().copied()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of scalar entries, in packing order.
    pub fn scalar_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries
            .iter()
            .filter(|(_, v)| v.as_scalar().is_some())
            .map(|(n, _)| *n)
    }

    /// Texture entries, in binding order.
    pub fn textures(&self) -> impl Iterator<Item = (&'static str, Option<TextureHandle>)> + '_ {
        self.entries.iter().filter_map(|(n, v)| match v {
            UniformValue::Texture(t) => Some((*n, *t)),
            _ => None,
        })
    }

    /// Scalars packed for upload, padded with zeros to whole `vec4` rows
    /// (at least one row, since WGSL forbids empty structs).
    #[must_use]
    pub fn packed_scalars(&self) -> SmallVec<[f32; 8]> {
        let mut packed: SmallVec<[f32; 8]> =
            self.entries.iter().filter_map(|(_, v)| v.as_scalar()).collect();
        let rows = packed.len().div_ceil(SCALARS_PER_ROW).max(1);
        packed.resize(rows * SCALARS_PER_ROW, 0.0);
        packed
    }

    /// Number of zero padding scalars appended by [`packed_scalars`](Self::packed_scalars).
    #[must_use]
    pub fn padding_count(&self) -> usize {
        let scalars = self.scalar_names().count();
        scalars.div_ceil(SCALARS_PER_ROW).max(1) * SCALARS_PER_ROW - scalars
    }
}

// ============================================================================
// UniformBlock
// ============================================================================

/// A typed parameter set that can be flattened into [`UniformValues`].
///
/// Parameter names are shared by the shader, `set_parameter` and the JSON
/// settings format.
pub trait UniformBlock {
    /// Name of the parameter set (used in error messages).
    fn owner(&self) -> &'static str;

    /// Appends this block's values to `out`.
    fn write_uniforms(&self, out: &mut UniformValues);

    /// Sets a scalar parameter by name.
    fn set_parameter(&mut self, name: &str, value: f32) -> Result<()>;

    /// Flattens the block into a new value list.
    fn uniform_values(&self) -> UniformValues {
        let mut values = UniformValues::new();
        self.write_uniforms(&mut values);
        values
    }

    /// Reads a scalar parameter by name.
    fn parameter(&self, name: &str) -> Option<f32> {
        self.uniform_values().scalar(name)
    }
}

/// Error for a name the block does not own.
pub(crate) fn unknown_parameter(owner: &'static str, name: &str) -> UmbraError {
    UmbraError::UnknownParameter {
        owner,
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place() {
        let mut values = UniformValues::new();
        values.set_float("a", 1.0).set_float("b", 2.0).set_float("a", 3.0);

        let names: Vec<_> = values.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(values.scalar("a"), Some(3.0));
    }

    #[test]
    fn packing_pads_to_vec4_rows() {
        let mut values = UniformValues::new();
        values
            .set_texture("t", None)
            .set_float("a", 1.0)
            .set_bool("b", true)
            .set_float("c", 0.5)
            .set_float("d", 2.0)
            .set_float("e", 4.0);

        let packed = values.packed_scalars();
        assert_eq!(packed.as_slice(), &[1.0, 1.0, 0.5, 2.0, 4.0, 0.0, 0.0, 0.0]);
        assert_eq!(values.padding_count(), 3);
    }

    #[test]
    fn empty_block_still_packs_one_row() {
        let mut values = UniformValues::new();
        values.set_texture("t", None);
        assert_eq!(values.packed_scalars().len(), 4);
        assert_eq!(values.padding_count(), 4);
    }
}
