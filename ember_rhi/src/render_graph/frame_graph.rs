/// Frame graph
///
/// Ordered renderpasses of one frame. Parents are listed before their
/// children and exactly one subpass of the whole graph draws into the
/// presentable surface.

use crate::backend::PlatformRenderpass;
use crate::context::RhiContext;
use crate::error::Result;
use crate::resource_table::ResourceTable;
use crate::engine_contract;
use super::renderpass::Renderpass;

#[derive(Debug, Default)]
pub struct FrameGraph {
    renderpasses: Vec<Renderpass>,
}

impl FrameGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a renderpass, returns its id
    pub fn add_renderpass(&mut self, renderpass: Renderpass) -> usize {
        self.renderpasses.push(renderpass);
        self.renderpasses.len() - 1
    }

    pub fn renderpass(&self, id: usize) -> Option<&Renderpass> {
        self.renderpasses.get(id)
    }

    pub fn renderpass_mut(&mut self, id: usize) -> Option<&mut Renderpass> {
        self.renderpasses.get_mut(id)
    }

    pub fn renderpasses(&self) -> &[Renderpass] {
        &self.renderpasses
    }

    pub fn renderpass_count(&self) -> usize {
        self.renderpasses.len()
    }

    /// `(renderpass id, subpass index)` of the final subpass
    pub fn final_subpass(&self) -> Option<(usize, usize)> {
        self.renderpasses
            .iter()
            .enumerate()
            .find_map(|(id, pass)| pass.final_subpass().map(|subpass| (id, subpass)))
    }

    pub fn validate(&self, resources: &ResourceTable) -> Result<()> {
        let mut finals = 0;
        for (id, pass) in self.renderpasses.iter().enumerate() {
            pass.validate(resources)?;
            for &parent in pass.parent_ids() {
                if parent >= id {
                    engine_contract!("ember::FrameGraph",
                        "Renderpass '{}' ({}) depends on {} which is not ordered before it",
                        pass.name(), id, parent);
                }
            }
            finals += pass.subpasses().iter().filter(|s| s.is_final()).count();
        }
        if finals != 1 {
            engine_contract!("ember::FrameGraph",
                "Frame graph needs exactly one final subpass, found {}", finals);
        }
        Ok(())
    }

    /// Upload every renderpass with its own platform object
    pub fn upload<P: PlatformRenderpass>(&mut self, platforms: &mut [P], ctx: &RhiContext) -> Result<()> {
        self.validate(ctx.resources())?;
        self.check_platform_count(platforms.len())?;
        for (pass, platform) in self.renderpasses.iter_mut().zip(platforms.iter_mut()) {
            pass.upload(platform, ctx)?;
        }
        Ok(())
    }

    /// Encode every renderpass in order
    pub fn execute<P: PlatformRenderpass>(
        &mut self,
        platforms: &mut [P],
        cmd: &mut P::CommandBuffer,
        surface: &P::Surface,
        ctx: &RhiContext,
    ) -> Result<()> {
        self.check_platform_count(platforms.len())?;
        for (pass, platform) in self.renderpasses.iter_mut().zip(platforms.iter_mut()) {
            pass.execute(platform, cmd, surface, ctx)?;
        }
        Ok(())
    }

    pub fn invalidate(&mut self) {
        for pass in &mut self.renderpasses {
            pass.invalidate();
        }
    }

    fn check_platform_count(&self, count: usize) -> Result<()> {
        if count != self.renderpasses.len() {
            engine_contract!("ember::FrameGraph",
                "{} platform objects for {} renderpasses", count, self.renderpasses.len());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "frame_graph_tests.rs"]
mod tests;
