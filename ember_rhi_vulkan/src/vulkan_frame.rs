/// Frames in flight for Vulkan
///
/// Each slot owns a primary command buffer and the fence signalled when its
/// last submission completes. `begin_frame` waits on the fence of the slot
/// it is about to reuse, so per-frame buffers and descriptor set copies of
/// that slot are free to be rewritten once it returns.

use ash::vk;
use std::sync::Arc;
use ember_rhi::ember::Result;
use ember_rhi::frame::FrameRing;
use ember_rhi::{engine_contract, engine_err, engine_trace};

use crate::vulkan_command_encoder::VulkanCommandBuffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_device::VulkanDevice;

const SOURCE: &str = "ember::vulkan::Frames";

pub struct VulkanFrame {
    ctx: Arc<GpuContext>,
    cmd: VulkanCommandBuffer,
    /// Created signaled so the first wait on every slot returns at once
    fence: vk::Fence,
}

impl VulkanFrame {
    fn new(ctx: &Arc<GpuContext>, slot: usize) -> Result<Self> {
        let cmd = VulkanCommandBuffer::new(Arc::clone(ctx))?;
        let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
        let fence = unsafe { ctx.device.create_fence(&fence_info, None) }
            .map_err(|e| engine_err!(SOURCE, "Failed to create fence of frame {}: {:?}", slot, e))?;
        Ok(Self { ctx: Arc::clone(ctx), cmd, fence })
    }

    pub fn command_buffer(&self) -> &VulkanCommandBuffer {
        &self.cmd
    }

    pub fn fence(&self) -> vk::Fence {
        self.fence
    }
}

impl Drop for VulkanFrame {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_fence(self.fence, None);
        }
    }
}

pub struct VulkanFrames {
    device: Arc<VulkanDevice>,
    ring: FrameRing<VulkanFrame>,
}

impl VulkanFrames {
    pub fn new(device: Arc<VulkanDevice>) -> Result<Self> {
        let ctx = Arc::clone(device.context());
        let ring = FrameRing::new(|slot| VulkanFrame::new(&ctx, slot))?;
        Ok(Self { device, ring })
    }

    pub fn index(&self) -> usize {
        self.ring.index()
    }

    pub fn current(&self) -> &VulkanFrame {
        self.ring.current()
    }

    pub fn frames(&self) -> impl Iterator<Item = &VulkanFrame> {
        self.ring.iter()
    }

    /// Advance to the next slot, wait until the GPU released it and start
    /// recording its command buffer
    pub fn begin_frame(&mut self) -> Result<&mut VulkanCommandBuffer> {
        let index = self.ring.begin_frame();
        let frame = self.ring.current_mut();

        unsafe {
            frame.ctx.device
                .wait_for_fences(&[frame.fence], true, u64::MAX)
                .map_err(|e| engine_err!(SOURCE, "Failed to wait for frame {}: {:?}", index, e))?;
        }

        self.device.set_frame_index(index);
        frame.cmd.begin()?;
        engine_trace!(SOURCE, "Frame slot {} begun", index);
        Ok(&mut frame.cmd)
    }

    /// Command buffer of the current slot
    pub fn command_buffer(&mut self) -> &mut VulkanCommandBuffer {
        &mut self.ring.current_mut().cmd
    }

    /// End the current command buffer and submit it, signalling the slot's
    /// fence on completion
    ///
    /// `wait` and `wait_stages` pair up, typically the swapchain acquire
    /// semaphore at `COLOR_ATTACHMENT_OUTPUT`.
    pub fn submit_frame(
        &mut self,
        wait: &[vk::Semaphore],
        wait_stages: &[vk::PipelineStageFlags],
        signal: &[vk::Semaphore],
    ) -> Result<()> {
        if wait.len() != wait_stages.len() {
            engine_contract!(SOURCE, "{} wait semaphores but {} wait stages", wait.len(), wait_stages.len());
        }

        let index = self.ring.index();
        let frame = self.ring.current_mut();
        frame.cmd.end()?;

        let command_buffers = [frame.cmd.raw()];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(wait)
            .wait_dst_stage_mask(wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(signal);

        unsafe {
            let device = &frame.ctx.device;
            device
                .reset_fences(&[frame.fence])
                .map_err(|e| engine_err!(SOURCE, "Failed to reset fence of frame {}: {:?}", index, e))?;
            device
                .queue_submit(frame.ctx.graphics_queue, &[submit_info], frame.fence)
                .map_err(|e| engine_err!(SOURCE, "Failed to submit frame {}: {:?}", index, e))?;
        }
        Ok(())
    }
}

impl Drop for VulkanFrames {
    fn drop(&mut self) {
        // Command buffers still executing cannot be freed
        let fences: Vec<vk::Fence> = self.ring.iter().map(VulkanFrame::fence).collect();
        unsafe {
            self.device.raw().wait_for_fences(&fences, true, u64::MAX).ok();
        }
    }
}
