/// Native pass compiler interface
///
/// One implementation per backend. A platform object belongs to exactly one
/// [`Renderpass`]: `upload` compiles it into native objects, then every frame
/// the renderpass drives `make_final_pass`, `begin_renderpass`,
/// `next_subpass`, the encoders and `end_renderpass` in that order.

use crate::context::RhiContext;
use crate::error::Result;
use crate::program::DescriptorAllocator;
use crate::render_graph::Renderpass;
use super::encoder::{ComputeCommandEncoder, RenderCommandEncoder};

pub trait PlatformRenderpass {
    /// Command recording target for one frame
    type CommandBuffer;
    /// Presentable image of the current frame
    type Surface;

    /// Compile `renderpass` into native objects
    fn upload(&mut self, renderpass: &Renderpass, ctx: &RhiContext) -> Result<()>;

    /// Number of native render pass objects produced by `upload`
    fn platform_renderpass_count(&self) -> usize;

    /// Frame-in-flight slot being recorded, selects the per-frame binding
    /// group copies of subpass programs
    fn frame_index(&self) -> usize;

    /// Rebind the final subpass' color attachment 0 to `surface`
    fn make_final_pass(&mut self, surface: &Self::Surface, subpass: usize) -> Result<()>;

    fn begin_renderpass(&mut self, cmd: &mut Self::CommandBuffer, renderpass: &Renderpass) -> Result<()>;

    /// Advance to `subpass`, called before every subpass except the first
    fn next_subpass(&mut self, cmd: &mut Self::CommandBuffer, subpass: usize) -> Result<()>;

    fn end_renderpass(&mut self, cmd: &mut Self::CommandBuffer) -> Result<()>;

    fn render_encoder<'a>(
        &'a mut self,
        cmd: &'a mut Self::CommandBuffer,
        subpass: usize,
    ) -> Result<Box<dyn RenderCommandEncoder + 'a>>;

    /// `None` when the backend cannot represent compute subpasses
    fn compute_encoder<'a>(
        &'a mut self,
        cmd: &'a mut Self::CommandBuffer,
        subpass: usize,
    ) -> Result<Option<Box<dyn ComputeCommandEncoder + 'a>>>;

    /// Registers program binding groups with the backend's descriptor caches
    fn descriptor_allocator(&self) -> &dyn DescriptorAllocator;
}
