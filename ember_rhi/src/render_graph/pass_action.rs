/// Subpass actions
///
/// An action records the draw or dispatch work of one subpass into the
/// encoder the backend handed out for it.

use crate::backend::{ComputeCommandEncoder, RenderCommandEncoder};
use crate::context::RhiContext;
use crate::error::Result;
use crate::program::Program;
use crate::engine_bail;

/// Encoder of the subpass being executed
pub enum PassEncoder<'a> {
    Render(&'a mut dyn RenderCommandEncoder),
    Compute(&'a mut dyn ComputeCommandEncoder),
}

/// What an action can see while it runs
pub struct SubpassContext<'a> {
    pub name: &'a str,
    pub index: usize,
    /// Frame-in-flight slot the backend is recording
    pub frame: usize,
    pub program: Option<&'a Program>,
    pub rhi: &'a RhiContext,
}

/// Action executed by a subpass
pub trait PassAction: Send + Sync {
    fn execute(&mut self, encoder: PassEncoder<'_>, ctx: &SubpassContext<'_>) -> Result<()>;
}

/// Fullscreen triangle
///
/// Binds the subpass program and the descriptor sets of the current frame
/// slot, then draws 3 vertices. Used for post-processing subpasses.
#[derive(Debug, Default)]
pub struct FullscreenAction;

impl FullscreenAction {
    pub fn new() -> Self {
        Self
    }
}

impl PassAction for FullscreenAction {
    fn execute(&mut self, encoder: PassEncoder<'_>, ctx: &SubpassContext<'_>) -> Result<()> {
        let PassEncoder::Render(encoder) = encoder else {
            engine_bail!("ember::FullscreenAction",
                "Subpass '{}' is not a fragment subpass", ctx.name);
        };
        let Some(program) = ctx.program else {
            engine_bail!("ember::FullscreenAction",
                "Subpass '{}' has no program", ctx.name);
        };
        program.bind_render(encoder, ctx.frame)?;
        encoder.draw(3, 0)
    }
}

/// Closure-based action for full control over recording
pub struct CustomAction {
    callback: Box<dyn FnMut(PassEncoder<'_>, &SubpassContext<'_>) -> Result<()> + Send + Sync>,
}

impl CustomAction {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut(PassEncoder<'_>, &SubpassContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self { callback: Box::new(callback) }
    }
}

impl PassAction for CustomAction {
    fn execute(&mut self, encoder: PassEncoder<'_>, ctx: &SubpassContext<'_>) -> Result<()> {
        (self.callback)(encoder, ctx)
    }
}
