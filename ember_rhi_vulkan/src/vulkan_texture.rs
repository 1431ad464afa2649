/// Render target and sampled textures

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;
use ember_rhi::ember::{Error, Result};
use ember_rhi::resource_table::{TextureDesc, TextureUsage};
use ember_rhi::types::TextureFormat;
use ember_rhi::{engine_err, engine_error};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::texture_format_to_vk;

/// Image usage of a texture; attachments may also be read as input attachments
pub fn texture_usage_to_vk(usage: TextureUsage) -> vk::ImageUsageFlags {
    match usage {
        TextureUsage::Sampled => vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
        TextureUsage::RenderTarget => {
            vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::INPUT_ATTACHMENT
        }
        TextureUsage::SampledAndRenderTarget => {
            vk::ImageUsageFlags::COLOR_ATTACHMENT
                | vk::ImageUsageFlags::INPUT_ATTACHMENT
                | vk::ImageUsageFlags::SAMPLED
        }
        TextureUsage::DepthStencil => {
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
                | vk::ImageUsageFlags::INPUT_ATTACHMENT
                | vk::ImageUsageFlags::SAMPLED
        }
    }
}

pub fn aspect_mask(format: TextureFormat) -> vk::ImageAspectFlags {
    if format.is_depth_format() {
        vk::ImageAspectFlags::DEPTH
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

pub struct Texture {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    allocation: Option<Allocation>,
    pub(crate) format: TextureFormat,
}

impl Texture {
    /// Create a device-local 2D image and its view
    pub fn new(ctx: Arc<GpuContext>, desc: &TextureDesc) -> Result<Self> {
        if desc.format.is_depth_format() != matches!(desc.usage, TextureUsage::DepthStencil) {
            engine_error!("ember::vulkan::Texture",
                "Texture '{}': format {:?} does not match usage {:?}", desc.name, desc.format, desc.usage);
            return Err(Error::InvalidResource(format!(
                "texture '{}' format {:?} does not match usage {:?}", desc.name, desc.format, desc.usage)));
        }

        let format = texture_format_to_vk(desc.format);

        unsafe {
            let image_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D { width: desc.width, height: desc.height, depth: 1 })
                .mip_levels(1)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(texture_usage_to_vk(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = ctx.device.create_image(&image_info, None)
                .map_err(|e| engine_err!("ember::vulkan::Texture",
                    "Failed to create image '{}': {:?}", desc.name, e))?;

            let requirements = ctx.device.get_image_memory_requirements(image);
            let allocation = match ctx.allocator()?.allocate(&AllocationCreateDesc {
                name: &desc.name,
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            }) {
                Ok(allocation) => allocation,
                Err(_) => {
                    ctx.device.destroy_image(image, None);
                    engine_error!("ember::vulkan::Texture",
                        "Out of GPU memory for texture '{}' ({}x{})", desc.name, desc.width, desc.height);
                    return Err(Error::OutOfMemory);
                }
            };

            let bound = ctx.device.bind_image_memory(image, allocation.memory(), allocation.offset());

            let view = bound.and_then(|_| {
                let view_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(format)
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: aspect_mask(desc.format),
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });
                ctx.device.create_image_view(&view_info, None)
            });

            let view = match view {
                Ok(view) => view,
                Err(e) => {
                    ctx.allocator()?.free(allocation).ok();
                    ctx.device.destroy_image(image, None);
                    return Err(engine_err!("ember::vulkan::Texture",
                        "Failed to bind or view image '{}': {:?}", desc.name, e));
                }
            };

            Ok(Self { ctx, image, view, allocation: Some(allocation), format: desc.format })
        }
    }

    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_image(self.image, None);
        }
    }
}
