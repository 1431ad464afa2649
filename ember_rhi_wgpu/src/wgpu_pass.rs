/// Renderpass compiler for wgpu
///
/// wgpu has no subpasses: every subpass of a `Renderpass` becomes an
/// independent native pass, in graph order. `WgpuPassLayout::compile` reads
/// each subpass's render target indices into attachment descriptions
/// without touching the device; `WgpuRenderpass` begins one
/// `wgpu::RenderPass` or `wgpu::ComputePass` per subpass while encoding.
/// Hazards between passes are tracked by wgpu itself.

use std::sync::Arc;
use ember_rhi::backend::{ComputeCommandEncoder, NativePass, PlatformRenderpass, RenderCommandEncoder};
use ember_rhi::ember::{Result, RhiContext};
use ember_rhi::glam::Vec4;
use ember_rhi::program::DescriptorAllocator;
use ember_rhi::render_graph::{Renderpass, Rendersubpass};
use ember_rhi::resource_table::{ResourceTable, TextureId};
use ember_rhi::types::{LoadAction, RenderTargetType, RenderpassTechnique, StoreAction};
use ember_rhi::{engine_contract, engine_debug, engine_trace, engine_warn};

use crate::wgpu_command_encoder::{WgpuCommandBuffer, WgpuComputeEncoder, WgpuRenderEncoder};
use crate::wgpu_device::WgpuDevice;
use crate::wgpu_format::{clear_color, has_stencil, load_op, store_op};

const SOURCE: &str = "ember::wgpu::Renderpass";

/// Presentable image the final subpass draws into this frame
#[derive(Debug, Clone)]
pub struct WgpuSurfaceImage {
    pub view: wgpu::TextureView,
}

// ============================================================================
// Pass descriptions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ColorAttachment {
    /// Render target index in the renderpass
    pub target: u32,
    pub texture: TextureId,
    pub resolve: Option<TextureId>,
    pub load: LoadAction,
    pub store: StoreAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepthAttachment {
    pub target: u32,
    pub texture: TextureId,
    pub load: LoadAction,
    pub store: StoreAction,
    pub stencil: bool,
}

/// Native render pass of one fragment subpass
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPassDesc {
    pub name: String,
    pub colors: Vec<ColorAttachment>,
    pub depth: Option<DepthAttachment>,
    pub clear: Vec4,
    /// Color 0 is replaced by the surface image every frame
    pub is_final: bool,
}

/// Native compute pass of one compute subpass
#[derive(Debug, Clone, PartialEq)]
pub struct ComputePassDesc {
    pub name: String,
}

pub type WgpuNativePass = NativePass<RenderPassDesc, ComputePassDesc>;

/// One native pass per subpass, in graph order
#[derive(Debug, Clone, Default)]
pub struct WgpuPassLayout {
    pub passes: Vec<WgpuNativePass>,
}

impl WgpuPassLayout {
    pub fn compile(renderpass: &Renderpass, resources: &ResourceTable) -> Result<Self> {
        let targets = renderpass.render_targets();
        let final_subpass = renderpass.final_subpass();

        let mut passes = Vec::with_capacity(renderpass.subpasses().len());
        for (index, subpass) in renderpass.subpasses().iter().enumerate() {
            if let Some(&target) = subpass.render_targets().iter().find(|&&t| t as usize >= targets.len()) {
                engine_contract!(SOURCE,
                    "Subpass '{}' of '{}' refers to target {} but the pass has {}",
                    subpass.name(), renderpass.name(), target, targets.len());
            }

            let pass = match subpass.technique() {
                RenderpassTechnique::Compute => {
                    NativePass::Compute(ComputePassDesc { name: subpass.name().to_string() })
                }
                RenderpassTechnique::Fragment => NativePass::Render(Self::render_pass(
                    renderpass,
                    subpass,
                    resources,
                    final_subpass == Some(index),
                )?),
            };
            passes.push(pass);
        }

        Ok(Self { passes })
    }

    fn render_pass(
        renderpass: &Renderpass,
        subpass: &Rendersubpass,
        resources: &ResourceTable,
        is_final: bool,
    ) -> Result<RenderPassDesc> {
        let targets = renderpass.render_targets();
        let of_type = |ty: RenderTargetType| {
            subpass
                .render_targets()
                .iter()
                .copied()
                .filter(move |&t| targets[t as usize].target_type() == ty)
        };

        let resolves: Vec<TextureId> = of_type(RenderTargetType::Resolve)
            .map(|t| targets[t as usize].texture())
            .collect();
        let mut colors: Vec<ColorAttachment> = Vec::new();
        for t in of_type(RenderTargetType::Color) {
            let target = &targets[t as usize];
            resources.require_texture(target.texture())?;
            colors.push(ColorAttachment {
                target: t,
                texture: target.texture(),
                resolve: resolves.get(colors.len()).copied(),
                load: target.load_action(),
                store: target.store_action(),
            });
        }

        if !resolves.is_empty() && resolves.len() != colors.len() {
            engine_contract!(SOURCE,
                "Subpass '{}' has {} resolve targets for {} color targets",
                subpass.name(), resolves.len(), colors.len());
        }

        let depth = match of_type(RenderTargetType::Depth).next() {
            Some(t) => {
                let target = &targets[t as usize];
                let desc = resources.require_texture(target.texture())?;
                Some(DepthAttachment {
                    target: t,
                    texture: target.texture(),
                    load: target.load_action(),
                    store: target.store_action(),
                    stencil: has_stencil(desc.format),
                })
            }
            None => None,
        };

        if is_final && colors.is_empty() {
            engine_warn!(SOURCE, "Final subpass '{}' has no color target for the surface", subpass.name());
        }

        Ok(RenderPassDesc {
            name: subpass.name().to_string(),
            colors,
            depth,
            clear: renderpass.background(),
            is_final,
        })
    }

    pub fn render_pass_count(&self) -> usize {
        self.passes.iter().filter(|p| p.is_render()).count()
    }

    pub fn compute_pass_count(&self) -> usize {
        self.passes.iter().filter(|p| p.is_compute()).count()
    }
}

// ============================================================================
// WgpuRenderpass
// ============================================================================

pub struct WgpuRenderpass {
    device: Arc<WgpuDevice>,
    layout: WgpuPassLayout,
    /// Bound by `make_final_pass`, once per frame
    surface: Option<wgpu::TextureView>,
}

impl WgpuRenderpass {
    pub fn new(device: Arc<WgpuDevice>) -> Self {
        Self { device, layout: WgpuPassLayout::default(), surface: None }
    }

    pub fn layout(&self) -> &WgpuPassLayout {
        &self.layout
    }

    fn color_view(&self, desc: &RenderPassDesc, slot: usize, color: &ColorAttachment) -> Result<wgpu::TextureView> {
        if desc.is_final && slot == 0 {
            match &self.surface {
                Some(view) => return Ok(view.clone()),
                None => engine_contract!(SOURCE,
                    "Final pass '{}' has no surface image, call make_final_pass first", desc.name),
            }
        }
        self.device.texture_view(color.texture)
    }
}

impl PlatformRenderpass for WgpuRenderpass {
    type CommandBuffer = WgpuCommandBuffer;
    type Surface = WgpuSurfaceImage;

    fn upload(&mut self, renderpass: &Renderpass, ctx: &RhiContext) -> Result<()> {
        self.device.sync_resources(ctx)?;
        self.layout = WgpuPassLayout::compile(renderpass, ctx.resources())?;
        self.surface = None;

        engine_debug!(SOURCE, "'{}' compiled: {} render passes, {} compute passes",
            renderpass.name(), self.layout.render_pass_count(), self.layout.compute_pass_count());
        Ok(())
    }

    /// Native render passes; compute passes are not counted
    fn platform_renderpass_count(&self) -> usize {
        self.layout.render_pass_count()
    }

    fn frame_index(&self) -> usize {
        self.device.frame_index()
    }

    fn make_final_pass(&mut self, surface: &WgpuSurfaceImage, subpass: usize) -> Result<()> {
        engine_trace!(SOURCE, "Surface bound to subpass {}", subpass);
        self.surface = Some(surface.view.clone());
        Ok(())
    }

    fn begin_renderpass(&mut self, _cmd: &mut WgpuCommandBuffer, _renderpass: &Renderpass) -> Result<()> {
        Ok(())
    }

    fn next_subpass(&mut self, _cmd: &mut WgpuCommandBuffer, _subpass: usize) -> Result<()> {
        Ok(())
    }

    fn end_renderpass(&mut self, _cmd: &mut WgpuCommandBuffer) -> Result<()> {
        Ok(())
    }

    fn render_encoder<'a>(
        &'a mut self,
        cmd: &'a mut WgpuCommandBuffer,
        subpass: usize,
    ) -> Result<Box<dyn RenderCommandEncoder + 'a>> {
        let this: &'a Self = self;
        let Some(NativePass::Render(desc)) = this.layout.passes.get(subpass) else {
            engine_contract!(SOURCE, "Subpass {} has no render pass", subpass);
        };

        let mut views = Vec::with_capacity(desc.colors.len());
        let mut resolves = Vec::with_capacity(desc.colors.len());
        for (slot, color) in desc.colors.iter().enumerate() {
            views.push(this.color_view(desc, slot, color)?);
            resolves.push(color.resolve.map(|texture| this.device.texture_view(texture)).transpose()?);
        }
        let depth_view = desc.depth.as_ref().map(|d| this.device.texture_view(d.texture)).transpose()?;

        let clear = clear_color(desc.clear);
        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = desc
            .colors
            .iter()
            .zip(&views)
            .zip(&resolves)
            .map(|((color, view), resolve)| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target: resolve.as_ref(),
                    ops: wgpu::Operations { load: load_op(color.load, clear), store: store_op(color.store) },
                })
            })
            .collect();

        let depth_stencil_attachment = desc.depth.as_ref().zip(depth_view.as_ref()).map(|(depth, view)| {
            wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations { load: load_op(depth.load, 1.0), store: store_op(depth.store) }),
                stencil_ops: depth.stencil.then(|| wgpu::Operations {
                    load: load_op(depth.load, 0),
                    store: store_op(depth.store),
                }),
            }
        });

        let pass = cmd.encoder_mut()?.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(desc.name.as_str()),
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        Ok(Box::new(WgpuRenderEncoder::new(pass, &this.device, &desc.name)))
    }

    fn compute_encoder<'a>(
        &'a mut self,
        cmd: &'a mut WgpuCommandBuffer,
        subpass: usize,
    ) -> Result<Option<Box<dyn ComputeCommandEncoder + 'a>>> {
        let this: &'a Self = self;
        let Some(NativePass::Compute(desc)) = this.layout.passes.get(subpass) else {
            return Ok(None);
        };

        let pass = cmd.encoder_mut()?.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(desc.name.as_str()),
            timestamp_writes: None,
        });

        Ok(Some(Box::new(WgpuComputeEncoder::new(pass, &this.device, &desc.name))))
    }

    fn descriptor_allocator(&self) -> &dyn DescriptorAllocator {
        self.device.as_ref()
    }
}

#[cfg(test)]
#[path = "wgpu_pass_tests.rs"]
mod tests;
