/// Command buffer and pass encoders for wgpu
///
/// Each subpass is its own `wgpu::RenderPass` or `wgpu::ComputePass`,
/// recorded into the frame's `wgpu::CommandEncoder` and ended when the
/// encoder object is dropped.

use ember_rhi::backend::{ComputeCommandEncoder, IndexType, RenderCommandEncoder, Viewport};
use ember_rhi::descriptor::DescriptorSetId;
use ember_rhi::ember::{Error, Result};
use ember_rhi::resource_table::{BufferId, PipelineId};
use ember_rhi::{engine_bail, engine_trace};

use crate::wgpu_device::{WgpuDevice, WgpuPipeline};
use crate::wgpu_format::index_format_to_wgpu;

/// Frame command recording, consumed by `WgpuDevice::submit`
pub struct WgpuCommandBuffer {
    encoder: Option<wgpu::CommandEncoder>,
}

impl WgpuCommandBuffer {
    pub fn new(device: &WgpuDevice) -> Self {
        Self { encoder: Some(device.create_command_encoder("ember frame")) }
    }

    pub fn is_recording(&self) -> bool {
        self.encoder.is_some()
    }

    pub(crate) fn encoder_mut(&mut self) -> Result<&mut wgpu::CommandEncoder> {
        self.encoder
            .as_mut()
            .ok_or_else(|| Error::BackendError("Command buffer already finished".to_string()))
    }

    /// Close recording
    pub fn finish(&mut self) -> Result<wgpu::CommandBuffer> {
        self.encoder
            .take()
            .map(wgpu::CommandEncoder::finish)
            .ok_or_else(|| Error::BackendError("Command buffer already finished".to_string()))
    }
}

// ============================================================================
// Render
// ============================================================================

pub struct WgpuRenderEncoder<'a> {
    pass: wgpu::RenderPass<'a>,
    device: &'a WgpuDevice,
    name: &'a str,
}

impl<'a> WgpuRenderEncoder<'a> {
    pub fn new(pass: wgpu::RenderPass<'a>, device: &'a WgpuDevice, name: &'a str) -> Self {
        Self { pass, device, name }
    }
}

impl RenderCommandEncoder for WgpuRenderEncoder<'_> {
    fn bind_pipeline(&mut self, pipeline: PipelineId) -> Result<()> {
        match self.device.pipeline(pipeline)? {
            WgpuPipeline::Render(pipeline) => self.pass.set_pipeline(&pipeline),
            WgpuPipeline::Compute(_) => {
                engine_bail!("ember::wgpu::RenderEncoder",
                    "Compute pipeline {:?} bound in render pass '{}'", pipeline, self.name);
            }
        }
        Ok(())
    }

    /// The layout comes from the pipeline already bound
    fn bind_descriptor_set(&mut self, _pipeline: PipelineId, set_index: u32, set: DescriptorSetId) -> Result<()> {
        let bind_group = self.device.bind_group(set)?;
        self.pass.set_bind_group(set_index, bind_group.as_ref(), &[]);
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, binding: u32, buffer_index: u32, offset: u64) -> Result<()> {
        let buffer = self.device.pack_buffer(buffer_index as usize)?;
        self.pass.set_vertex_buffer(binding, buffer.slice(offset..));
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: BufferId, offset: u64, index_type: IndexType) -> Result<()> {
        let buffer = self.device.buffer(buffer)?;
        self.pass.set_index_buffer(buffer.slice(offset..), index_format_to_wgpu(index_type));
        Ok(())
    }

    /// Sets the scissor to the same rectangle
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.pass.set_viewport(
            viewport.x,
            viewport.y,
            viewport.width,
            viewport.height,
            viewport.min_depth,
            viewport.max_depth,
        );
        self.pass.set_scissor_rect(
            viewport.x.max(0.0) as u32,
            viewport.y.max(0.0) as u32,
            viewport.width as u32,
            viewport.height as u32,
        );
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.pass.draw(first_vertex..first_vertex + vertex_count, 0..1);
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.pass.draw_indexed(first_index..first_index + index_count, vertex_offset, 0..1);
        Ok(())
    }

    fn end_encoding(&mut self) -> Result<()> {
        engine_trace!("ember::wgpu::RenderEncoder", "Render pass '{}' encoded", self.name);
        Ok(())
    }
}

// ============================================================================
// Compute
// ============================================================================

pub struct WgpuComputeEncoder<'a> {
    pass: wgpu::ComputePass<'a>,
    device: &'a WgpuDevice,
    name: &'a str,
}

impl<'a> WgpuComputeEncoder<'a> {
    pub fn new(pass: wgpu::ComputePass<'a>, device: &'a WgpuDevice, name: &'a str) -> Self {
        Self { pass, device, name }
    }
}

impl ComputeCommandEncoder for WgpuComputeEncoder<'_> {
    fn bind_pipeline(&mut self, pipeline: PipelineId) -> Result<()> {
        match self.device.pipeline(pipeline)? {
            WgpuPipeline::Compute(pipeline) => self.pass.set_pipeline(&pipeline),
            WgpuPipeline::Render(_) => {
                engine_bail!("ember::wgpu::ComputeEncoder",
                    "Render pipeline {:?} bound in compute pass '{}'", pipeline, self.name);
            }
        }
        Ok(())
    }

    fn bind_descriptor_set(&mut self, _pipeline: PipelineId, set_index: u32, set: DescriptorSetId) -> Result<()> {
        let bind_group = self.device.bind_group(set)?;
        self.pass.set_bind_group(set_index, bind_group.as_ref(), &[]);
        Ok(())
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        self.pass.dispatch_workgroups(x, y, z);
        Ok(())
    }

    fn end_encoding(&mut self) -> Result<()> {
        engine_trace!("ember::wgpu::ComputeEncoder", "Compute pass '{}' encoded", self.name);
        Ok(())
    }
}
