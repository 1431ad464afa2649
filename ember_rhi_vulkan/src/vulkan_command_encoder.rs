/// Command buffer and subpass encoder for Vulkan

use ash::vk;
use std::sync::Arc;
use ember_rhi::backend::{IndexType, RenderCommandEncoder, Viewport};
use ember_rhi::descriptor::DescriptorSetId;
use ember_rhi::ember::{Error, Result};
use ember_rhi::resource_table::{BufferId, PipelineId};
use ember_rhi::{engine_err, engine_trace};

use crate::vulkan_context::GpuContext;
use crate::vulkan_device::VulkanDevice;
use crate::vulkan_format::index_type_to_vk;

/// Primary command buffer with its own pool
///
/// Recorded once per frame between `begin` and `end`.
pub struct VulkanCommandBuffer {
    ctx: Arc<GpuContext>,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    is_recording: bool,
}

impl VulkanCommandBuffer {
    pub fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        unsafe {
            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = ctx.device.create_command_pool(&pool_info, None)
                .map_err(|e| engine_err!("ember::vulkan::CommandBuffer", "Failed to create command pool: {:?}", e))?;

            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = match ctx.device.allocate_command_buffers(&allocate_info) {
                Ok(buffers) if !buffers.is_empty() => buffers[0],
                result => {
                    ctx.device.destroy_command_pool(command_pool, None);
                    return Err(engine_err!("ember::vulkan::CommandBuffer",
                        "Failed to allocate command buffer: {:?}", result.err()));
                }
            };

            Ok(Self { ctx, command_pool, command_buffer, is_recording: false })
        }
    }

    pub fn raw(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(Error::BackendError("Command buffer already recording".to_string()));
        }

        unsafe {
            self.ctx.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| Error::BackendError(format!("Failed to reset command buffer: {:?}", e)))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.ctx.device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| Error::BackendError(format!("Failed to begin command buffer: {:?}", e)))?;
        }

        self.is_recording = true;
        Ok(())
    }

    pub fn end(&mut self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command buffer not recording".to_string()));
        }

        unsafe {
            self.ctx.device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| Error::BackendError(format!("Failed to end command buffer: {:?}", e)))?;
        }

        self.is_recording = false;
        Ok(())
    }
}

impl Drop for VulkanCommandBuffer {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.free_command_buffers(self.command_pool, &[self.command_buffer]);
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}

/// Encoder of one Vulkan subpass
///
/// Commands go straight into the frame's command buffer; resources are
/// resolved through the device's tables.
pub struct VulkanRenderEncoder<'a> {
    device: &'a VulkanDevice,
    cmd: vk::CommandBuffer,
    subpass: u32,
}

impl<'a> VulkanRenderEncoder<'a> {
    pub fn new(device: &'a VulkanDevice, cmd: vk::CommandBuffer, subpass: u32) -> Self {
        Self { device, cmd, subpass }
    }
}

impl RenderCommandEncoder for VulkanRenderEncoder<'_> {
    fn bind_pipeline(&mut self, pipeline: PipelineId) -> Result<()> {
        let pipeline = self.device.pipeline(pipeline)?;
        unsafe {
            self.device.raw().cmd_bind_pipeline(self.cmd, pipeline.bind_point, pipeline.pipeline);
        }
        Ok(())
    }

    fn bind_descriptor_set(&mut self, pipeline: PipelineId, set_index: u32, set: DescriptorSetId) -> Result<()> {
        let pipeline = self.device.pipeline(pipeline)?;
        let descriptor_set = self.device.descriptor_set(set)?;
        unsafe {
            self.device.raw().cmd_bind_descriptor_sets(
                self.cmd,
                pipeline.bind_point,
                pipeline.layout,
                set_index,
                &[descriptor_set],
                &[],
            );
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, binding: u32, buffer_index: u32, offset: u64) -> Result<()> {
        let buffer = self.device.pack_buffer(buffer_index as usize)?;
        unsafe {
            self.device.raw().cmd_bind_vertex_buffers(self.cmd, binding, &[buffer], &[offset]);
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: BufferId, offset: u64, index_type: IndexType) -> Result<()> {
        let buffer = self.device.buffer_handle(buffer)?;
        unsafe {
            self.device.raw().cmd_bind_index_buffer(self.cmd, buffer, offset, index_type_to_vk(index_type));
        }
        Ok(())
    }

    /// Sets the scissor to the same rectangle
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        let vk_viewport = vk::Viewport::default()
            .x(viewport.x)
            .y(viewport.y)
            .width(viewport.width)
            .height(viewport.height)
            .min_depth(viewport.min_depth)
            .max_depth(viewport.max_depth);

        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: viewport.x as i32, y: viewport.y as i32 },
            extent: vk::Extent2D { width: viewport.width as u32, height: viewport.height as u32 },
        };

        unsafe {
            self.device.raw().cmd_set_viewport(self.cmd, 0, &[vk_viewport]);
            self.device.raw().cmd_set_scissor(self.cmd, 0, &[scissor]);
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        unsafe {
            self.device.raw().cmd_draw(self.cmd, vertex_count, 1, first_vertex, 0);
        }
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        unsafe {
            self.device.raw().cmd_draw_indexed(self.cmd, index_count, 1, first_index, vertex_offset, 0);
        }
        Ok(())
    }

    fn end_encoding(&mut self) -> Result<()> {
        engine_trace!("ember::vulkan::RenderEncoder", "Subpass {} encoded", self.subpass);
        Ok(())
    }
}
