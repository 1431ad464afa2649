/*!
# Ember RHI - Vulkan backend

Native pass compiler for Vulkan, built on `ash` and `gpu-allocator`.

A `Renderpass` compiles into one `VkRenderPass` whose Vulkan subpasses are
the fragment subpasses of the graph, linked by a linear dependency chain.
Compute subpasses cannot live inside a Vulkan render pass and are skipped.
`VulkanFrames` owns the command buffer and fence of each frame in flight and
selects which per-frame descriptor set copies the passes bind.

```no_run
use std::sync::Arc;
use ember_rhi_vulkan::{GpuContext, VulkanDevice, VulkanDeviceConfig, VulkanRenderpass};

let ctx = GpuContext::headless()?;
let device = Arc::new(VulkanDevice::new(ctx, VulkanDeviceConfig::default()));
let platform = VulkanRenderpass::new(device);
# Ok::<(), ember_rhi::ember::Error>(())
```
*/

mod vulkan_context;
mod vulkan_format;
mod vulkan_descriptor;
mod vulkan_buffer;
mod vulkan_texture;
mod vulkan_sampler;
mod vulkan_command_encoder;
mod vulkan_device;
mod vulkan_frame;
mod vulkan_render_pass;

#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan_context::GpuContext;
pub use vulkan_format::{
    texture_format_to_vk, vertex_format_to_vk, vertex_input_descriptions, step_function_to_vk,
    load_action_to_vk, store_action_to_vk, binding_type_to_vk, stage_flags_to_vk, index_type_to_vk,
};
pub use vulkan_buffer::Buffer;
pub use vulkan_texture::{Texture, texture_usage_to_vk};
pub use vulkan_command_encoder::{VulkanCommandBuffer, VulkanRenderEncoder};
pub use vulkan_device::{VulkanDevice, VulkanDeviceConfig, VulkanPipeline};
pub use vulkan_frame::{VulkanFrame, VulkanFrames};
pub use vulkan_render_pass::{RenderpassLayout, SubpassRefs, VulkanRenderpass, VulkanSurfaceImage};

#[cfg(feature = "vulkan-validation")]
pub use debug::{ValidationStats, validation_stats, print_validation_stats_report};
