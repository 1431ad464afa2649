/// Renderpass
///
/// Ordered subpasses sharing a set of render targets and render buffers.
/// A platform object compiles it (`upload`) and drives its per-frame
/// encoding (`execute`).

use glam::{UVec2, Vec4};
use crate::backend::{PlatformRenderpass, Viewport};
use crate::context::RhiContext;
use crate::error::Result;
use crate::resource_table::{ResourceTable, TextureId};
use crate::types::{RenderTargetType, RenderpassTechnique};
use crate::{engine_contract, engine_critical, engine_debug, engine_info};
use super::pass_action::{PassEncoder, SubpassContext};
use super::render_target::{RenderBuffer, RenderTarget};
use super::rendersubpass::Rendersubpass;

pub const DEFAULT_BACKGROUND: Vec4 = Vec4::new(0.14, 0.14, 0.14, 1.0);
pub const DEFAULT_DIMENSIONS: UVec2 = UVec2::new(1024, 768);

#[derive(Debug)]
pub struct Renderpass {
    name: String,
    subpasses: Vec<Rendersubpass>,
    render_targets: Vec<RenderTarget>,
    render_buffers: Vec<RenderBuffer>,
    background: Vec4,
    dimensions: UVec2,
    viewport: Viewport,
    parent_ids: Vec<usize>,
}

impl Renderpass {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subpasses: Vec::new(),
            render_targets: Vec::new(),
            render_buffers: Vec::new(),
            background: DEFAULT_BACKGROUND,
            dimensions: DEFAULT_DIMENSIONS,
            viewport: Viewport::new(0.0, 0.0, DEFAULT_DIMENSIONS.x as f32, DEFAULT_DIMENSIONS.y as f32),
            parent_ids: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a render target, returns its index
    pub fn add_render_target(&mut self, target: RenderTarget) -> u32 {
        self.render_targets.push(target);
        (self.render_targets.len() - 1) as u32
    }

    /// Add a render buffer, returns its index
    pub fn add_render_buffer(&mut self, buffer: RenderBuffer) -> u32 {
        self.render_buffers.push(buffer);
        (self.render_buffers.len() - 1) as u32
    }

    /// Append a subpass, returns its index
    pub fn add_subpass(&mut self, subpass: Rendersubpass) -> usize {
        self.subpasses.push(subpass);
        self.subpasses.len() - 1
    }

    pub fn subpasses(&self) -> &[Rendersubpass] {
        &self.subpasses
    }

    pub fn subpass(&self, index: usize) -> Option<&Rendersubpass> {
        self.subpasses.get(index)
    }

    pub fn subpass_mut(&mut self, index: usize) -> Option<&mut Rendersubpass> {
        self.subpasses.get_mut(index)
    }

    pub fn render_targets(&self) -> &[RenderTarget] {
        &self.render_targets
    }

    pub fn render_target(&self, index: u32) -> Option<&RenderTarget> {
        self.render_targets.get(index as usize)
    }

    pub fn render_buffers(&self) -> &[RenderBuffer] {
        &self.render_buffers
    }

    pub fn background(&self) -> Vec4 {
        self.background
    }

    pub fn set_background(&mut self, background: Vec4) {
        self.background = background;
    }

    pub fn dimensions(&self) -> UVec2 {
        self.dimensions
    }

    /// Resize the pass, the viewport follows
    pub fn set_dimensions(&mut self, dimensions: UVec2) {
        self.dimensions = dimensions;
        self.viewport = Viewport::new(0.0, 0.0, dimensions.x as f32, dimensions.y as f32);
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn parent_ids(&self) -> &[usize] {
        &self.parent_ids
    }

    pub fn add_parent(&mut self, parent: usize) {
        if !self.parent_ids.contains(&parent) {
            self.parent_ids.push(parent);
        }
    }

    /// Index of the subpass drawing into the presentable surface
    pub fn final_subpass(&self) -> Option<usize> {
        self.subpasses.iter().position(|s| s.is_final())
    }

    /// Schedule every transient subpass again
    pub fn invalidate(&mut self) {
        for subpass in &mut self.subpasses {
            subpass.invalidate();
        }
    }

    /// Check the topology against the resource table
    ///
    /// Every failure is a contract violation.
    pub fn validate(&self, resources: &ResourceTable) -> Result<()> {
        const SOURCE: &str = "ember::Renderpass";

        if self.subpasses.is_empty() {
            engine_contract!(SOURCE, "Renderpass '{}' has no subpass", self.name);
        }
        if self.dimensions.x == 0 || self.dimensions.y == 0 {
            engine_contract!(SOURCE, "Renderpass '{}' has zero dimensions", self.name);
        }

        for (index, target) in self.render_targets.iter().enumerate() {
            let desc = resources.require_texture(target.texture())?;
            let is_depth_type = target.target_type() == RenderTargetType::Depth;
            if desc.format.is_depth_format() != is_depth_type {
                engine_contract!(SOURCE,
                    "Renderpass '{}' target {} ('{}'): format {:?} does not match type {:?}",
                    self.name, index, desc.name, desc.format, target.target_type());
            }
        }
        for buffer in &self.render_buffers {
            resources.require_buffer(buffer.buffer())?;
        }

        let target_count = self.render_targets.len() as u32;
        let mut written = vec![false; self.render_targets.len()];
        let mut finals = 0;

        for subpass in &self.subpasses {
            let name = subpass.name();

            let all_targets = subpass
                .render_targets()
                .iter()
                .chain(subpass.input_attachments())
                .chain(subpass.rendered_inputs());
            for &target in all_targets {
                if target >= target_count {
                    engine_contract!(SOURCE,
                        "Subpass '{}' refers to target {} but the pass has {}", name, target, target_count);
                }
            }
            for &buffer in subpass.buffer_inputs() {
                if buffer as usize >= self.render_buffers.len() {
                    engine_contract!(SOURCE,
                        "Subpass '{}' refers to buffer {} but the pass has {}",
                        name, buffer, self.render_buffers.len());
                }
            }

            for &input in subpass.input_attachments() {
                if !written[input as usize] {
                    engine_contract!(SOURCE,
                        "Subpass '{}' reads input attachment {} before any subpass wrote it", name, input);
                }
            }

            let depth_count = subpass
                .render_targets()
                .iter()
                .filter(|&&t| self.render_targets[t as usize].target_type() == RenderTargetType::Depth)
                .count();
            if depth_count > 1 {
                engine_contract!(SOURCE, "Subpass '{}' writes {} depth targets", name, depth_count);
            }
            if subpass.has_depth() != (depth_count == 1) {
                engine_contract!(SOURCE,
                    "Subpass '{}' has_depth is {} but it writes {} depth targets",
                    name, subpass.has_depth(), depth_count);
            }

            if subpass.technique() == RenderpassTechnique::Compute && !subpass.render_targets().is_empty() {
                engine_contract!(SOURCE, "Compute subpass '{}' cannot write render targets", name);
            }

            if subpass.is_final() {
                finals += 1;
                let first_is_color = subpass
                    .render_targets()
                    .first()
                    .map(|&t| self.render_targets[t as usize].target_type() == RenderTargetType::Color)
                    .unwrap_or(false);
                if subpass.technique() != RenderpassTechnique::Fragment || !first_is_color {
                    engine_contract!(SOURCE,
                        "Final subpass '{}' must be a fragment subpass with a color attachment 0", name);
                }
            }

            for &target in subpass.render_targets() {
                written[target as usize] = true;
            }
        }

        if finals > 1 {
            engine_contract!(SOURCE, "Renderpass '{}' has {} final subpasses", self.name, finals);
        }

        Ok(())
    }

    /// Compile into native objects and allocate program binding groups
    ///
    /// The textures behind each subpass' input attachments are bound in set 0
    /// of its program before allocation. Must be called before the first `execute` and after every topology
    /// change. Transient subpasses become pending again.
    pub fn upload<P: PlatformRenderpass>(&mut self, platform: &mut P, ctx: &RhiContext) -> Result<()> {
        self.validate(ctx.resources())?;
        platform.upload(self, ctx)?;

        let allocator = platform.descriptor_allocator();
        let targets = &self.render_targets;
        for subpass in &mut self.subpasses {
            let inputs: Vec<TextureId> = subpass
                .input_attachments()
                .iter()
                .filter_map(|&t| targets.get(t as usize).map(RenderTarget::texture))
                .collect();
            if let Some(program) = subpass.program_mut() {
                program.set_input_attachments(&inputs);
                program.allocate_descriptor(allocator)?;
            }
        }

        self.invalidate();

        engine_info!("ember::Renderpass", "Renderpass '{}' uploaded: {} subpasses, {} native passes",
            self.name, self.subpasses.len(), platform.platform_renderpass_count());
        Ok(())
    }

    /// Encode one frame
    ///
    /// A failing subpass action is logged and its subpass abandoned for this
    /// frame, the walk continues.
    pub fn execute<P: PlatformRenderpass>(
        &mut self,
        platform: &mut P,
        cmd: &mut P::CommandBuffer,
        surface: &P::Surface,
        ctx: &RhiContext,
    ) -> Result<()> {
        if self.subpasses.is_empty() {
            engine_contract!("ember::Renderpass", "Renderpass '{}' has no subpass", self.name);
        }

        if let Some(final_index) = self.final_subpass() {
            platform.make_final_pass(surface, final_index)?;
        }

        platform.begin_renderpass(cmd, self)?;

        let viewport = self.viewport;
        let frame = platform.frame_index();
        for (index, subpass) in self.subpasses.iter_mut().enumerate() {
            if index > 0 {
                platform.next_subpass(cmd, index)?;
            }
            if !subpass.should_execute() {
                continue;
            }

            match encode_subpass(platform, cmd, subpass, index, frame, viewport, ctx) {
                Ok(true) => subpass.mark_executed(),
                Ok(false) => {}
                Err(e) => {
                    engine_critical!("ember::Renderpass",
                        "Subpass '{}' of '{}' abandoned: {}", subpass.name(), self.name, e);
                }
            }
        }

        platform.end_renderpass(cmd)
    }
}

/// Encode one subpass, `Ok(false)` when the backend has no encoder for it
fn encode_subpass<P: PlatformRenderpass>(
    platform: &mut P,
    cmd: &mut P::CommandBuffer,
    subpass: &mut Rendersubpass,
    index: usize,
    frame: usize,
    viewport: Viewport,
    rhi: &RhiContext,
) -> Result<bool> {
    match subpass.technique() {
        RenderpassTechnique::Fragment => {
            let mut encoder = platform.render_encoder(cmd, index)?;
            encoder.set_viewport(viewport)?;
            let (action, program, name) = subpass.action_parts();
            let result = match action {
                Some(action) => {
                    let ctx = SubpassContext { name, index, frame, program, rhi };
                    action.execute(PassEncoder::Render(encoder.as_mut()), &ctx)
                }
                None => Ok(()),
            };
            let ended = encoder.end_encoding();
            result.and(ended).map(|_| true)
        }
        RenderpassTechnique::Compute => {
            let Some(mut encoder) = platform.compute_encoder(cmd, index)? else {
                engine_debug!("ember::Renderpass", "Compute subpass '{}' skipped by backend", subpass.name());
                return Ok(false);
            };
            let (action, program, name) = subpass.action_parts();
            let result = match action {
                Some(action) => {
                    let ctx = SubpassContext { name, index, frame, program, rhi };
                    action.execute(PassEncoder::Compute(encoder.as_mut()), &ctx)
                }
                None => Ok(()),
            };
            let ended = encoder.end_encoding();
            result.and(ended).map(|_| true)
        }
    }
}

#[cfg(test)]
#[path = "renderpass_tests.rs"]
mod tests;
