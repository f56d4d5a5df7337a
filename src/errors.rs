//! Error Types
//!
//! This module defines the error type shared by the GPU backends, the pass
//! composer and the post-process stages.
//!
//! # Overview
//!
//! The stages themselves perform no validation: every failure below is raised
//! by a collaborator (a [`GpuBackend`](crate::renderer::core::GpuBackend)
//! implementation, the shader templating layer, the settings loader) and is
//! propagated unmodified through `?`.
//!
//! ```rust,ignore
//! use umbra::errors::Result;
//!
//! fn render(stage: &mut AmbientOcclusionStage, ctx: &mut FrameContext<'_, WgpuBackend>) -> Result<()> {
//!     stage.execute(ctx, color, depth, false)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::renderer::core::{FramebufferHandle, PixelFormat, TextureHandle};

/// The main error type for the crate.
#[derive(Error, Debug)]
pub enum UmbraError {
    // ========================================================================
    // GPU & Device Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// Reading a texture back to the CPU failed.
    #[error("Texture readback failed: {0}")]
    ReadbackFailed(String),

    /// The backend refused an allocation.
    #[error("GPU allocation failed for '{label}'")]
    AllocationFailed {
        /// Label of the resource that could not be created
        label: String,
    },

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// A texture handle does not refer to a live texture.
    #[error("Invalid texture handle: {0:?}")]
    InvalidTexture(TextureHandle),

    /// A framebuffer handle does not refer to a live framebuffer.
    #[error("Invalid framebuffer handle: {0:?}")]
    InvalidFramebuffer(FramebufferHandle),

    /// A texture was requested with a zero dimension.
    #[error("Invalid texture size {width}x{height} for '{label}'")]
    InvalidTextureSize {
        /// Label of the texture
        label: String,
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Initial texel data does not match the texture descriptor.
    #[error("Texel data for '{label}' has {actual} bytes, expected {expected}")]
    InvalidTextureData {
        /// Label of the texture
        label: String,
        /// Byte length implied by the descriptor
        expected: usize,
        /// Byte length that was supplied
        actual: usize,
    },

    /// The texture format cannot be used for the requested operation.
    #[error("Unsupported texture format {format:?} for {operation}")]
    UnsupportedFormat {
        /// Offending format
        format: PixelFormat,
        /// Operation that was attempted
        operation: &'static str,
    },

    // ========================================================================
    // Pass & Stage Errors
    // ========================================================================
    /// A texture uniform was bound without a texture.
    #[error("Uniform texture '{name}' is not set")]
    MissingTexture {
        /// Uniform name
        name: &'static str,
    },

    /// `set_parameter` was called with a name the parameter set does not own.
    #[error("Unknown parameter '{name}' for {owner}")]
    UnknownParameter {
        /// Parameter set that rejected the name
        owner: &'static str,
        /// Rejected parameter name
        name: String,
    },

    /// The composer received a different number of uniform sets than it has passes.
    #[error("Expected {expected} uniform sets, got {actual}")]
    PassCountMismatch {
        /// Number of sub-passes
        expected: usize,
        /// Number of uniform sets supplied
        actual: usize,
    },

    /// A stage was used after `destroy()`.
    #[error("Post-process stage '{0}' has been destroyed")]
    StageDestroyed(&'static str),

    // ========================================================================
    // Shader & Configuration Errors
    // ========================================================================
    /// Shader template rendering failed.
    #[error("Shader template error: {0}")]
    ShaderTemplate(#[from] minijinja::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Alias for `Result<T, UmbraError>`.
pub type Result<T> = std::result::Result<T, UmbraError>;
