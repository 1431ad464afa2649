/// Frames in flight for wgpu
///
/// Each slot records whether its last submission finished. `begin_frame`
/// blocks on the device until it has before handing the slot out again, so
/// recording never runs more than `FRAMES_IN_FLIGHT` frames ahead of the GPU
/// and the slot's descriptor set copies are the ones bound.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use ember_rhi::ember::Result;
use ember_rhi::frame::FrameRing;
use ember_rhi::{engine_err, engine_trace};

use crate::wgpu_command_encoder::WgpuCommandBuffer;
use crate::wgpu_device::WgpuDevice;

const SOURCE: &str = "ember::wgpu::Frames";

pub struct WgpuFrame {
    /// Set by the queue once the slot's last submission completed
    done: Arc<AtomicBool>,
}

impl WgpuFrame {
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

pub struct WgpuFrames {
    device: Arc<WgpuDevice>,
    ring: FrameRing<WgpuFrame>,
}

impl WgpuFrames {
    pub fn new(device: Arc<WgpuDevice>) -> Result<Self> {
        let ring = FrameRing::new(|_| Ok(WgpuFrame { done: Arc::new(AtomicBool::new(true)) }))?;
        Ok(Self { device, ring })
    }

    pub fn index(&self) -> usize {
        self.ring.index()
    }

    pub fn current(&self) -> &WgpuFrame {
        self.ring.current()
    }

    /// Advance to the next slot, wait until the GPU released it and open a
    /// command buffer for it
    pub fn begin_frame(&mut self) -> Result<WgpuCommandBuffer> {
        let index = self.ring.begin_frame();

        if !self.ring.current().is_done() {
            engine_trace!(SOURCE, "Waiting for frame slot {}", index);
            self.device
                .raw()
                .poll(wgpu::PollType::wait_indefinitely())
                .map_err(|e| engine_err!(SOURCE, "Failed to wait for frame {}: {:?}", index, e))?;
        }

        self.device.set_frame_index(index);
        Ok(WgpuCommandBuffer::new(&self.device))
    }

    /// Submit `cmd` as the current slot's work
    pub fn submit_frame(&mut self, cmd: &mut WgpuCommandBuffer) -> Result<()> {
        let done = Arc::clone(&self.ring.current().done);
        done.store(false, Ordering::Release);

        self.device.submit(cmd)?;
        self.device
            .queue()
            .on_submitted_work_done(move || done.store(true, Ordering::Release));
        Ok(())
    }
}
