//! Backend Settings
//!
//! Device-level configuration for the headless wgpu backend.
//!
//! ```rust,ignore
//! use umbra::renderer::{RenderSettings, core::WgpuBackend};
//!
//! let gpu = WgpuBackend::headless(&RenderSettings {
//!     width: 640,
//!     height: 480,
//!     ..Default::default()
//! })?;
//! ```

/// Configuration used when creating a [`WgpuBackend`](super::core::WgpuBackend).
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// GPU adapter preference.
    pub power_preference: wgpu::PowerPreference,
    /// Features the device must support.
    pub required_features: wgpu::Features,
    /// Limits the device must satisfy.
    pub required_limits: wgpu::Limits,
    /// Initial drawing-buffer width in pixels.
    pub width: u32,
    /// Initial drawing-buffer height in pixels.
    pub height: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            width: 1,
            height: 1,
        }
    }
}
