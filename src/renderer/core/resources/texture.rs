//! Texture, Sampler and Framebuffer Descriptors
//!
//! Backend-agnostic descriptions of the GPU objects a post-process stage
//! allocates. Backends translate them into their native objects:
//!
//! - `PixelFormat`: texel layout of a texture
//! - `SamplerDesc`: wrap and filter state baked into a texture
//! - `TextureDesc`: size, format, usage and sampler of a 2D texture
//! - `FramebufferDesc`: a render target wrapping one color texture

use bitflags::bitflags;
use glam::UVec2;

use super::TextureHandle;

// ============================================================================
// Pixel Format
// ============================================================================

/// Texel layout of a 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Three 8-bit unsigned normalized channels.
    Rgb8Unorm,
    /// Four 8-bit unsigned normalized channels.
    Rgba8Unorm,
    /// One 32-bit float channel (linear depth, masks).
    R32Float,
    /// 32-bit float depth.
    Depth32Float,
}

impl PixelFormat {
    /// Size of one texel in bytes as supplied by the caller.
    #[inline]
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb8Unorm => 3,
            Self::Rgba8Unorm | Self::R32Float | Self::Depth32Float => 4,
        }
    }

    /// Whether the format may be sampled with linear filtering.
    #[inline]
    #[must_use]
    pub const fn is_filterable(self) -> bool {
        matches!(self, Self::Rgb8Unorm | Self::Rgba8Unorm)
    }

    /// Whether the format can be the color attachment of a framebuffer.
    #[inline]
    #[must_use]
    pub const fn is_color_renderable(self) -> bool {
        matches!(self, Self::Rgba8Unorm | Self::R32Float)
    }
}

// ============================================================================
// Sampler State
// ============================================================================

/// Texture coordinate wrapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureWrap {
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

/// Minification / magnification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFilter {
    #[default]
    Nearest,
    Linear,
}

/// Sampler state attached to a texture at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerDesc {
    pub wrap_s: TextureWrap,
    pub wrap_t: TextureWrap,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
}

impl SamplerDesc {
    /// Clamp-to-edge on both axes with the same min/mag filter.
    #[must_use]
    pub const fn clamp_to_edge(filter: TextureFilter) -> Self {
        Self {
            wrap_s: TextureWrap::ClampToEdge,
            wrap_t: TextureWrap::ClampToEdge,
            min_filter: filter,
            mag_filter: filter,
        }
    }
}

// ============================================================================
// Texture
// ============================================================================

bitflags! {
    /// How a texture will be used by the backend.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsages: u32 {
        /// Can be sampled by a fragment shader.
        const SAMPLED       = 1 << 0;
        /// Can be the color attachment of a framebuffer.
        const RENDER_TARGET = 1 << 1;
        /// Can be read back to the CPU.
        const COPY_SRC      = 1 << 2;
        /// Can receive texel uploads.
        const COPY_DST      = 1 << 3;
    }
}

/// Descriptor for a 2D texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub usage: TextureUsages,
    pub sampler: SamplerDesc,
}

impl TextureDesc<'_> {
    /// Texture dimensions as a vector.
    #[inline]
    #[must_use]
    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    /// Number of bytes initial texel data must contain.
    #[inline]
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

// ============================================================================
// Framebuffer
// ============================================================================

/// Descriptor for a framebuffer wrapping a single color texture.
#[derive(Debug, Clone, PartialEq)]
pub struct FramebufferDesc<'a> {
    pub label: &'a str,
    pub color_texture: TextureHandle,
    /// When `true`, destroying the framebuffer also destroys `color_texture`.
    pub destroy_attachments: bool,
}
