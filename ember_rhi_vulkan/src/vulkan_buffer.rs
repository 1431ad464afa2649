/// Host-visible Vulkan buffer backed by gpu-allocator

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;
use ember_rhi::ember::{Error, Result};
use ember_rhi::resource_table::GpuBufferUsage;
use ember_rhi::{engine_err, engine_error};

use crate::vulkan_context::GpuContext;

pub fn buffer_usage_to_vk(usage: GpuBufferUsage) -> vk::BufferUsageFlags {
    match usage {
        GpuBufferUsage::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
        GpuBufferUsage::Index => vk::BufferUsageFlags::INDEX_BUFFER,
        GpuBufferUsage::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
        GpuBufferUsage::Storage => vk::BufferUsageFlags::STORAGE_BUFFER,
    }
}

pub struct Buffer {
    ctx: Arc<GpuContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
}

impl Buffer {
    /// Create a CPU-writable buffer of `size` bytes
    pub fn new(ctx: Arc<GpuContext>, name: &str, size: u64, usage: vk::BufferUsageFlags) -> Result<Self> {
        unsafe {
            let create_info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(usage | vk::BufferUsageFlags::TRANSFER_DST)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = ctx.device.create_buffer(&create_info, None)
                .map_err(|e| engine_err!("ember::vulkan::Buffer",
                    "Failed to create buffer '{}' of {} bytes: {:?}", name, size, e))?;

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);

            let allocation = ctx.allocator()?.allocate(&AllocationCreateDesc {
                name,
                requirements,
                location: MemoryLocation::CpuToGpu,
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(_) => {
                    ctx.device.destroy_buffer(buffer, None);
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!("ember::vulkan::Buffer",
                        "Out of GPU memory for buffer '{}' (required: {:.2} MB)", name, size_mb);
                    return Err(Error::OutOfMemory);
                }
            };

            if let Err(e) = ctx.device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) {
                ctx.allocator()?.free(allocation).ok();
                ctx.device.destroy_buffer(buffer, None);
                return Err(engine_err!("ember::vulkan::Buffer", "Failed to bind buffer memory: {:?}", e));
            }

            Ok(Self { ctx, buffer, allocation: Some(allocation), size })
        }
    }

    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Copy `data` into the mapped memory at `offset`
    pub fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        if offset + data.len() as u64 > self.size {
            return Err(Error::InvalidResource(format!(
                "write of {} bytes at {} overflows buffer of {} bytes", data.len(), offset, self.size)));
        }

        let allocation = self.allocation.as_ref()
            .ok_or_else(|| Error::BackendError("Buffer has no allocation".to_string()))?;
        let mapped_ptr = allocation
            .mapped_ptr()
            .ok_or_else(|| Error::BackendError("Buffer is not CPU-accessible".to_string()))?
            .as_ptr() as *mut u8;

        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr.add(offset as usize), data.len());
        }
        Ok(())
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
