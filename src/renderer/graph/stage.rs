//! Post-Process Stage Contract
//!
//! `PostProcessStage` is the interface a scene uses to drive screen-space
//! effects. A stage renders into resources it owns; the scene then runs the
//! stage's composite shader (`fragment_shader` + `uniform_values`) over its
//! color buffer.
//!
//! # Example
//!
//! ```ignore
//! let mut ctx = FrameContext::new(&mut gpu, frame);
//! for stage in &mut stages {
//!     if stage.show() {
//!         stage.execute(&mut ctx, color, depth, resized)?;
//!     }
//! }
//! ```

use super::context::FrameContext;
use crate::errors::Result;
use crate::renderer::core::{GpuBackend, TextureHandle};
use crate::renderer::pipeline::FragmentShader;
use crate::resources::uniforms::UniformValues;

pub trait PostProcessStage<B: GpuBackend + ?Sized> {
    fn name(&self) -> &'static str;

    /// Hidden stages are not executed.
    fn show(&self) -> bool;

    fn set_show(&mut self, show: bool);

    /// Whether the stage can execute this frame.
    fn ready(&self) -> bool;

    /// Composite shader applied by the scene after `execute`.
    fn fragment_shader(&self) -> FragmentShader;

    /// Inputs of the composite shader.
    fn uniform_values(&self) -> UniformValues;

    /// Renders the stage. `dirty` requests a rebuild of viewport-sized
    /// resources before rendering.
    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_, B>,
        color: TextureHandle,
        depth: TextureHandle,
        dirty: bool,
    ) -> Result<()>;

    /// Releases every GPU object owned by the stage. Safe to call repeatedly.
    fn destroy(&mut self, gpu: &mut B);

    fn is_destroyed(&self) -> bool;
}
