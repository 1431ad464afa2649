/*!
# Ember RHI - wgpu backend

Native pass compiler for `wgpu`.

wgpu has no subpasses, so every subpass of a `Renderpass` becomes its own
render or compute pass, encoded in graph order. The final subpass draws
into the surface image bound for the current frame. `WgpuFrames` rotates
the frames in flight and selects which per-frame descriptor set copies the
passes bind.

```no_run
use std::sync::Arc;
use ember_rhi_wgpu::{WgpuDevice, WgpuRenderpass};

let device = Arc::new(pollster::block_on(WgpuDevice::headless())?);
let platform = WgpuRenderpass::new(device);
# Ok::<(), ember_rhi::ember::Error>(())
```
*/

mod wgpu_format;
mod wgpu_command_encoder;
mod wgpu_device;
mod wgpu_frame;
mod wgpu_pass;

pub use wgpu_format::{
    texture_format_to_wgpu, texture_usage_to_wgpu, buffer_usage_to_wgpu, vertex_format_to_wgpu,
    vertex_buffer_layouts, step_function_to_wgpu, index_format_to_wgpu, load_op, store_op,
    stage_flags_to_wgpu, layout_entries, sampler_descriptor, WgpuVertexLayout, SAMPLER_BINDING_OFFSET,
};
pub use wgpu_command_encoder::{WgpuCommandBuffer, WgpuRenderEncoder, WgpuComputeEncoder};
pub use wgpu_device::{WgpuDevice, WgpuPipeline};
pub use wgpu_frame::{WgpuFrame, WgpuFrames};
pub use wgpu_pass::{
    ColorAttachment, ComputePassDesc, DepthAttachment, RenderPassDesc, WgpuNativePass, WgpuPassLayout,
    WgpuRenderpass, WgpuSurfaceImage,
};
