//! Frame Context
//!
//! Per-frame state handed to every post-process stage.

use glam::UVec2;

use crate::renderer::core::GpuBackend;

/// Backend access plus the frame counter for one `execute` call.
pub struct FrameContext<'a, B: GpuBackend + ?Sized> {
    pub gpu: &'a mut B,
    pub frame_number: u64,
}

impl<'a, B: GpuBackend + ?Sized> FrameContext<'a, B> {
    #[must_use]
    pub fn new(gpu: &'a mut B, frame_number: u64) -> Self {
        Self { gpu, frame_number }
    }

    /// Current drawing-buffer size reported by the backend.
    #[inline]
    #[must_use]
    pub fn drawing_buffer_size(&self) -> UVec2 {
        self.gpu.drawing_buffer_size()
    }
}
