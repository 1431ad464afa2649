/// Renderpass compiler for Vulkan
///
/// A whole `Renderpass` becomes a single `VkRenderPass` with one Vulkan
/// subpass per fragment subpass. `RenderpassLayout::compile` builds the
/// attachment, reference, subpass and dependency tables without touching
/// the device; `VulkanRenderpass` turns them into native objects and
/// records the per-frame commands.

use ash::vk;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use ember_rhi::backend::{ComputeCommandEncoder, PlatformRenderpass, RenderCommandEncoder};
use ember_rhi::ember::{Result, RhiContext};
use ember_rhi::program::DescriptorAllocator;
use ember_rhi::render_graph::{Renderpass, Rendersubpass};
use ember_rhi::resource_table::{ResourceTable, TextureId, TextureUsage};
use ember_rhi::types::{LoadAction, RenderTargetType, RenderpassTechnique, TextureFormat};
use ember_rhi::{engine_contract, engine_critical, engine_debug, engine_err, engine_trace};

use crate::vulkan_command_encoder::{VulkanCommandBuffer, VulkanRenderEncoder};
use crate::vulkan_device::VulkanDevice;
use crate::vulkan_format::{load_action_to_vk, store_action_to_vk, texture_format_to_vk};

const SOURCE: &str = "ember::vulkan::Renderpass";

/// Presentable image the final subpass draws into this frame
#[derive(Debug, Clone, Copy)]
pub struct VulkanSurfaceImage {
    pub view: vk::ImageView,
    pub extent: vk::Extent2D,
}

// ============================================================================
// Layout tables
// ============================================================================

/// Attachment references of one Vulkan subpass
#[derive(Debug, Clone, Default)]
pub struct SubpassRefs {
    pub name: String,
    pub color: Vec<vk::AttachmentReference>,
    pub depth: Option<vk::AttachmentReference>,
    pub resolve: Vec<vk::AttachmentReference>,
    pub input: Vec<vk::AttachmentReference>,
}

/// Device-independent description of the native render pass
#[derive(Debug, Clone, Default)]
pub struct RenderpassLayout {
    /// One per distinct render target used by a fragment subpass
    pub attachments: Vec<vk::AttachmentDescription>,
    /// Render target index of every attachment, ascending
    pub attachment_targets: Vec<u32>,
    /// One per fragment subpass, in graph order
    pub subpasses: Vec<SubpassRefs>,
    /// Graph subpass index -> Vulkan subpass index, `None` for skipped subpasses
    pub subpass_map: Vec<Option<u32>>,
    /// Internal chain `k -> k + 1`
    pub dependencies: Vec<vk::SubpassDependency>,
    /// `VK_SUBPASS_EXTERNAL -> 0`, orders the first attachment writes after
    /// the swapchain acquire and earlier frames
    pub external_dependency: Option<vk::SubpassDependency>,
    /// Attachment rebound to the swapchain image every frame
    pub surface_attachment: Option<u32>,
}

fn has_stencil(format: TextureFormat) -> bool {
    matches!(format, TextureFormat::D24_UNORM_S8_UINT | TextureFormat::D32_FLOAT_S8_UINT)
}

impl RenderpassLayout {
    /// Build the native tables of `renderpass`
    ///
    /// Compute subpasses have no Vulkan subpass: they are logged as critical
    /// and left out of the tables.
    pub fn compile(renderpass: &Renderpass, resources: &ResourceTable) -> Result<Self> {
        let subpasses = renderpass.subpasses();
        let targets = renderpass.render_targets();

        let mut subpass_map = Vec::with_capacity(subpasses.len());
        let mut fragment: Vec<&Rendersubpass> = Vec::new();
        for subpass in subpasses {
            match subpass.technique() {
                RenderpassTechnique::Fragment => {
                    subpass_map.push(Some(fragment.len() as u32));
                    fragment.push(subpass);
                }
                RenderpassTechnique::Compute => {
                    engine_critical!(SOURCE,
                        "Compute subpass '{}' of '{}' cannot be part of a Vulkan render pass, skipped",
                        subpass.name(), renderpass.name());
                    subpass_map.push(None);
                }
            }
        }

        let mut attachment_targets: Vec<u32> = fragment
            .iter()
            .flat_map(|s| s.render_targets().iter().chain(s.input_attachments()))
            .copied()
            .collect();
        attachment_targets.sort_unstable();
        attachment_targets.dedup();

        if let Some(&target) = attachment_targets.iter().find(|&&t| t as usize >= targets.len()) {
            engine_contract!(SOURCE,
                "Renderpass '{}' refers to target {} but has {}", renderpass.name(), target, targets.len());
        }

        let read_as_input = |target: u32| subpasses.iter().any(|s| s.input_attachments().contains(&target));
        let sampled = |target: u32| subpasses.iter().any(|s| s.rendered_inputs().contains(&target));

        let surface_target = renderpass
            .final_subpass()
            .map(|i| &subpasses[i])
            .filter(|s| s.technique() == RenderpassTechnique::Fragment)
            .and_then(|s| s.render_targets().first().copied());

        let mut attachments = Vec::with_capacity(attachment_targets.len());
        for &index in &attachment_targets {
            let target = &targets[index as usize];
            let desc = resources.require_texture(target.texture())?;
            let is_depth = desc.format.is_depth_format();

            let final_layout = if surface_target == Some(index) {
                vk::ImageLayout::PRESENT_SRC_KHR
            } else if read_as_input(index) || sampled(index) || desc.usage == TextureUsage::SampledAndRenderTarget {
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
            } else if is_depth {
                vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
            } else {
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL
            };

            // Content of an input attachment is not kept across frames
            let initial_layout = if !read_as_input(index) && target.load_action() == LoadAction::Load {
                final_layout
            } else {
                vk::ImageLayout::UNDEFINED
            };

            let load_op = load_action_to_vk(target.load_action());
            let store_op = store_action_to_vk(target.store_action());
            let (stencil_load_op, stencil_store_op) = if has_stencil(desc.format) {
                (load_op, store_op)
            } else {
                (vk::AttachmentLoadOp::DONT_CARE, vk::AttachmentStoreOp::DONT_CARE)
            };

            attachments.push(vk::AttachmentDescription {
                format: texture_format_to_vk(desc.format),
                samples: vk::SampleCountFlags::TYPE_1,
                load_op,
                store_op,
                stencil_load_op,
                stencil_store_op,
                initial_layout,
                final_layout,
                ..Default::default()
            });
        }

        let slot = |target: u32| -> u32 {
            attachment_targets.binary_search(&target).map(|i| i as u32).unwrap_or(vk::ATTACHMENT_UNUSED)
        };
        let reference = |target: u32, layout: vk::ImageLayout| vk::AttachmentReference { attachment: slot(target), layout };

        let mut refs = Vec::with_capacity(fragment.len());
        for subpass in &fragment {
            let written = subpass.render_targets();
            let of_type = move |ty: RenderTargetType| {
                written
                    .iter()
                    .copied()
                    .filter(move |&t| targets[t as usize].target_type() == ty)
            };

            let color: Vec<_> = of_type(RenderTargetType::Color)
                .map(|t| reference(t, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL))
                .collect();
            let depth = of_type(RenderTargetType::Depth)
                .next()
                .map(|t| reference(t, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL));
            let resolve: Vec<_> = of_type(RenderTargetType::Resolve)
                .map(|t| reference(t, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL))
                .collect();
            let input: Vec<_> = subpass
                .input_attachments()
                .iter()
                .map(|&t| reference(t, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL))
                .collect();

            if !resolve.is_empty() && resolve.len() != color.len() {
                engine_contract!(SOURCE,
                    "Subpass '{}' has {} resolve targets for {} color targets",
                    subpass.name(), resolve.len(), color.len());
            }

            refs.push(SubpassRefs { name: subpass.name().to_string(), color, depth, resolve, input });
        }

        let dependencies = Self::dependencies(&refs);
        let external_dependency = (!refs.is_empty()).then(Self::external_dependency);
        let surface_attachment = surface_target.map(slot);

        Ok(Self {
            attachments,
            surface_attachment,
            attachment_targets,
            subpasses: refs,
            subpass_map,
            dependencies,
            external_dependency,
        })
    }

    fn external_dependency() -> vk::SubpassDependency {
        let stages = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
            | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
            | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS;
        vk::SubpassDependency {
            src_subpass: vk::SUBPASS_EXTERNAL,
            dst_subpass: 0,
            src_stage_mask: stages,
            dst_stage_mask: stages,
            src_access_mask: vk::AccessFlags::empty(),
            dst_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            dependency_flags: vk::DependencyFlags::empty(),
        }
    }

    /// External dependency followed by the internal chain
    pub fn all_dependencies(&self) -> Vec<vk::SubpassDependency> {
        self.external_dependency.iter().chain(&self.dependencies).copied().collect()
    }

    /// Chain `k -> k + 1` over the Vulkan subpasses
    ///
    /// The first hop waits on every attachment write. Later hops only feed
    /// input attachments to the fragment shader.
    fn dependencies(subpasses: &[SubpassRefs]) -> Vec<vk::SubpassDependency> {
        let attachment_stages = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
            | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
            | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS;
        let attachment_writes =
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;

        (1..subpasses.len())
            .map(|dst| {
                let (dst_stage_mask, dst_access_mask) = if dst == 1 {
                    let mut stages = attachment_stages;
                    let mut access = vk::AccessFlags::COLOR_ATTACHMENT_READ
                        | vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                        | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                        | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;
                    if !subpasses[dst].input.is_empty() {
                        stages |= vk::PipelineStageFlags::FRAGMENT_SHADER;
                        access |= vk::AccessFlags::INPUT_ATTACHMENT_READ;
                    }
                    (stages, access)
                } else {
                    (vk::PipelineStageFlags::FRAGMENT_SHADER, vk::AccessFlags::INPUT_ATTACHMENT_READ)
                };

                vk::SubpassDependency {
                    src_subpass: (dst - 1) as u32,
                    dst_subpass: dst as u32,
                    src_stage_mask: attachment_stages,
                    dst_stage_mask,
                    src_access_mask: attachment_writes,
                    dst_access_mask,
                    dependency_flags: vk::DependencyFlags::BY_REGION,
                }
            })
            .collect()
    }

    /// Vulkan subpass of graph subpass `subpass`
    pub fn native_subpass(&self, subpass: usize) -> Option<u32> {
        self.subpass_map.get(subpass).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.subpasses.is_empty()
    }
}

// ============================================================================
// VulkanRenderpass
// ============================================================================

pub struct VulkanRenderpass {
    device: Arc<VulkanDevice>,
    layout: RenderpassLayout,
    render_pass: vk::RenderPass,
    /// Texture behind every attachment
    attachment_textures: Vec<TextureId>,
    clear_values: Vec<vk::ClearValue>,
    extent: vk::Extent2D,
    /// Keyed by the surface view, null when the pass has no final subpass
    framebuffers: FxHashMap<vk::ImageView, vk::Framebuffer>,
    surface_view: vk::ImageView,
}

impl VulkanRenderpass {
    pub fn new(device: Arc<VulkanDevice>) -> Self {
        Self {
            device,
            layout: RenderpassLayout::default(),
            render_pass: vk::RenderPass::null(),
            attachment_textures: Vec::new(),
            clear_values: Vec::new(),
            extent: vk::Extent2D::default(),
            framebuffers: FxHashMap::default(),
            surface_view: vk::ImageView::null(),
        }
    }

    /// Native render pass, for pipeline creation
    pub fn raw(&self) -> vk::RenderPass {
        self.render_pass
    }

    pub fn layout(&self) -> &RenderpassLayout {
        &self.layout
    }

    fn destroy_native(&mut self) {
        let device = self.device.raw();
        unsafe {
            for (_, framebuffer) in self.framebuffers.drain() {
                device.destroy_framebuffer(framebuffer, None);
            }
            if self.render_pass != vk::RenderPass::null() {
                device.destroy_render_pass(self.render_pass, None);
                self.render_pass = vk::RenderPass::null();
            }
        }
    }

    fn create_render_pass(&self) -> Result<vk::RenderPass> {
        let descriptions: Vec<vk::SubpassDescription> = self
            .layout
            .subpasses
            .iter()
            .map(|refs| {
                let mut description = vk::SubpassDescription::default()
                    .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                    .color_attachments(&refs.color)
                    .input_attachments(&refs.input);
                if let Some(depth) = refs.depth.as_ref() {
                    description = description.depth_stencil_attachment(depth);
                }
                if !refs.resolve.is_empty() {
                    description = description.resolve_attachments(&refs.resolve);
                }
                description
            })
            .collect();

        let dependencies = self.layout.all_dependencies();
        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&self.layout.attachments)
            .subpasses(&descriptions)
            .dependencies(&dependencies);

        unsafe {
            self.device
                .raw()
                .create_render_pass(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create render pass: {:?}", e))
        }
    }

    fn framebuffer(&mut self) -> Result<vk::Framebuffer> {
        if let Some(&framebuffer) = self.framebuffers.get(&self.surface_view) {
            return Ok(framebuffer);
        }

        let mut views = Vec::with_capacity(self.attachment_textures.len());
        for (slot, &texture) in self.attachment_textures.iter().enumerate() {
            if self.layout.surface_attachment == Some(slot as u32) {
                if self.surface_view == vk::ImageView::null() {
                    engine_contract!(SOURCE, "Final attachment has no surface image, call make_final_pass first");
                }
                views.push(self.surface_view);
            } else {
                views.push(self.device.texture_view(texture)?);
            }
        }

        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(self.render_pass)
            .attachments(&views)
            .width(self.extent.width)
            .height(self.extent.height)
            .layers(1);

        let framebuffer = unsafe {
            self.device
                .raw()
                .create_framebuffer(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create framebuffer: {:?}", e))?
        };
        self.framebuffers.insert(self.surface_view, framebuffer);
        engine_trace!(SOURCE, "Framebuffer created ({} cached)", self.framebuffers.len());
        Ok(framebuffer)
    }
}

impl PlatformRenderpass for VulkanRenderpass {
    type CommandBuffer = VulkanCommandBuffer;
    type Surface = VulkanSurfaceImage;

    fn upload(&mut self, renderpass: &Renderpass, ctx: &RhiContext) -> Result<()> {
        self.destroy_native();
        self.device.sync_resources(ctx)?;

        let layout = RenderpassLayout::compile(renderpass, ctx.resources())?;

        self.attachment_textures = layout
            .attachment_targets
            .iter()
            .filter_map(|&t| renderpass.render_target(t).map(|target| target.texture()))
            .collect();

        let background = renderpass.background();
        self.clear_values = self
            .attachment_textures
            .iter()
            .map(|&texture| {
                let depth = ctx
                    .resources()
                    .texture(texture)
                    .map(|desc| desc.format.is_depth_format())
                    .unwrap_or(false);
                if depth {
                    vk::ClearValue {
                        depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
                    }
                } else {
                    vk::ClearValue {
                        color: vk::ClearColorValue { float32: background.to_array() },
                    }
                }
            })
            .collect();

        let dimensions = renderpass.dimensions();
        self.extent = vk::Extent2D { width: dimensions.x, height: dimensions.y };
        self.layout = layout;

        if !self.layout.is_empty() {
            self.render_pass = self.create_render_pass()?;
        }

        engine_debug!(SOURCE, "'{}' compiled: {} attachments, {} subpasses, {} dependencies",
            renderpass.name(), self.layout.attachments.len(), self.layout.subpasses.len(),
            self.layout.all_dependencies().len());
        Ok(())
    }

    fn platform_renderpass_count(&self) -> usize {
        usize::from(self.render_pass != vk::RenderPass::null())
    }

    fn frame_index(&self) -> usize {
        self.device.frame_index()
    }

    fn make_final_pass(&mut self, surface: &VulkanSurfaceImage, _subpass: usize) -> Result<()> {
        if surface.extent != self.extent {
            engine_debug!(SOURCE, "Surface extent {}x{} differs from pass extent {}x{}",
                surface.extent.width, surface.extent.height, self.extent.width, self.extent.height);
        }
        self.surface_view = surface.view;
        Ok(())
    }

    fn begin_renderpass(&mut self, cmd: &mut VulkanCommandBuffer, _renderpass: &Renderpass) -> Result<()> {
        if self.render_pass == vk::RenderPass::null() {
            return Ok(());
        }

        let framebuffer = self.framebuffer()?;
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(self.render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D { offset: vk::Offset2D { x: 0, y: 0 }, extent: self.extent })
            .clear_values(&self.clear_values);

        unsafe {
            self.device.raw().cmd_begin_render_pass(cmd.raw(), &begin_info, vk::SubpassContents::INLINE);
        }
        Ok(())
    }

    fn next_subpass(&mut self, cmd: &mut VulkanCommandBuffer, subpass: usize) -> Result<()> {
        if let Some(native) = self.layout.native_subpass(subpass) {
            if native > 0 {
                unsafe {
                    self.device.raw().cmd_next_subpass(cmd.raw(), vk::SubpassContents::INLINE);
                }
            }
        }
        Ok(())
    }

    fn end_renderpass(&mut self, cmd: &mut VulkanCommandBuffer) -> Result<()> {
        if self.render_pass != vk::RenderPass::null() {
            unsafe { self.device.raw().cmd_end_render_pass(cmd.raw()); }
        }
        Ok(())
    }

    fn render_encoder<'a>(
        &'a mut self,
        cmd: &'a mut VulkanCommandBuffer,
        subpass: usize,
    ) -> Result<Box<dyn RenderCommandEncoder + 'a>> {
        let Some(native) = self.layout.native_subpass(subpass) else {
            engine_contract!(SOURCE, "Subpass {} has no Vulkan subpass", subpass);
        };
        Ok(Box::new(VulkanRenderEncoder::new(&self.device, cmd.raw(), native)))
    }

    fn compute_encoder<'a>(
        &'a mut self,
        _cmd: &'a mut VulkanCommandBuffer,
        _subpass: usize,
    ) -> Result<Option<Box<dyn ComputeCommandEncoder + 'a>>> {
        Ok(None)
    }

    fn descriptor_allocator(&self) -> &dyn DescriptorAllocator {
        self.device.as_ref()
    }
}

impl Drop for VulkanRenderpass {
    fn drop(&mut self) {
        self.destroy_native();
    }
}

#[cfg(test)]
#[path = "vulkan_render_pass_tests.rs"]
mod tests;
