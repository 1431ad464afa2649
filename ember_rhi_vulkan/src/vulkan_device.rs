/// VulkanDevice - Native resources of the resource table
///
/// Holds the native textures and buffers registered under the ids of the
/// `ResourceTable`, the GPU copies of the buffer pack, the pipelines and
/// the descriptor caches. Implements `DescriptorAllocator` so program
/// binding groups become cached `VkDescriptorSet`s.

use ash::vk;
use slotmap::{SecondaryMap, SlotMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use ember_rhi::buffers::BuffersPack;
use ember_rhi::descriptor::{
    DescriptorLayoutCache, DescriptorPool, DescriptorResource, DescriptorSet, DescriptorSetCache,
    DescriptorSetId,
};
use ember_rhi::ember::{Error, Result, RhiContext};
use ember_rhi::frame::FRAMES_IN_FLIGHT;
use ember_rhi::program::DescriptorAllocator;
use ember_rhi::resource_table::{BufferId, GpuBufferDesc, PipelineId, SamplerType, TextureDesc, TextureId};
use ember_rhi::{engine_debug, engine_err, engine_info};

use crate::vulkan_buffer::{buffer_usage_to_vk, Buffer};
use crate::vulkan_command_encoder::VulkanCommandBuffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_descriptor::{VulkanLayoutFactory, VulkanPoolFactory};
use crate::vulkan_format::binding_type_to_vk;
use crate::vulkan_sampler::SamplerCache;
use crate::vulkan_texture::Texture;

const SOURCE: &str = "ember::vulkan::Device";

#[derive(Debug, Clone, Copy)]
pub struct VulkanDeviceConfig {
    /// Sets per descriptor pool, and descriptors of each type per pool
    pub descriptor_pool_size: u32,
}

impl Default for VulkanDeviceConfig {
    fn default() -> Self {
        Self { descriptor_pool_size: 1024 }
    }
}

/// Pipeline registered with the device, destroyed with it
#[derive(Debug, Clone, Copy)]
pub struct VulkanPipeline {
    pub pipeline: vk::Pipeline,
    pub layout: vk::PipelineLayout,
    pub bind_point: vk::PipelineBindPoint,
}

fn poisoned(what: &str) -> Error {
    Error::BackendError(format!("VulkanDevice {} lock poisoned", what))
}

pub struct VulkanDevice {
    ctx: Arc<GpuContext>,
    layout_factory: VulkanLayoutFactory,
    pool_factory: VulkanPoolFactory,
    layouts: DescriptorLayoutCache<vk::DescriptorSetLayout>,
    pools: DescriptorPool<vk::DescriptorPool>,
    sets: DescriptorSetCache<vk::DescriptorSet>,
    samplers: Mutex<SamplerCache>,
    textures: RwLock<SecondaryMap<TextureId, Texture>>,
    buffers: RwLock<SecondaryMap<BufferId, Buffer>>,
    pack_buffers: RwLock<Vec<Buffer>>,
    pipelines: RwLock<SlotMap<PipelineId, VulkanPipeline>>,
    /// Slot selected by the last `VulkanFrames::begin_frame`
    frame: AtomicUsize,
}

impl VulkanDevice {
    pub fn new(ctx: Arc<GpuContext>, config: VulkanDeviceConfig) -> Self {
        engine_info!(SOURCE, "Device created (descriptor pool size {})", config.descriptor_pool_size);
        Self {
            layout_factory: VulkanLayoutFactory { device: ctx.device.clone() },
            pool_factory: VulkanPoolFactory {
                device: ctx.device.clone(),
                pool_size: config.descriptor_pool_size,
            },
            layouts: DescriptorLayoutCache::new(),
            pools: DescriptorPool::new(),
            sets: DescriptorSetCache::new(),
            samplers: Mutex::new(SamplerCache::new(Arc::clone(&ctx))),
            textures: RwLock::new(SecondaryMap::new()),
            buffers: RwLock::new(SecondaryMap::new()),
            pack_buffers: RwLock::new(Vec::new()),
            pipelines: RwLock::new(SlotMap::with_key()),
            frame: AtomicUsize::new(0),
            ctx,
        }
    }

    pub fn context(&self) -> &Arc<GpuContext> {
        &self.ctx
    }

    pub(crate) fn raw(&self) -> &ash::Device {
        &self.ctx.device
    }

    /// Frame-in-flight slot being recorded
    pub fn frame_index(&self) -> usize {
        self.frame.load(Ordering::Acquire)
    }

    pub(crate) fn set_frame_index(&self, index: usize) {
        self.frame.store(index, Ordering::Release);
    }

    fn textures(&self) -> Result<RwLockReadGuard<'_, SecondaryMap<TextureId, Texture>>> {
        self.textures.read().map_err(|_| poisoned("texture"))
    }

    fn textures_mut(&self) -> Result<RwLockWriteGuard<'_, SecondaryMap<TextureId, Texture>>> {
        self.textures.write().map_err(|_| poisoned("texture"))
    }

    fn buffers(&self) -> Result<RwLockReadGuard<'_, SecondaryMap<BufferId, Buffer>>> {
        self.buffers.read().map_err(|_| poisoned("buffer"))
    }

    fn buffers_mut(&self) -> Result<RwLockWriteGuard<'_, SecondaryMap<BufferId, Buffer>>> {
        self.buffers.write().map_err(|_| poisoned("buffer"))
    }

    // ===== TEXTURES =====

    /// Create the native texture of `id`, replacing any previous one
    pub fn create_texture(&self, id: TextureId, desc: &TextureDesc) -> Result<()> {
        let texture = Texture::new(Arc::clone(&self.ctx), desc)?;
        self.textures_mut()?.insert(id, texture);
        engine_debug!(SOURCE, "Texture '{}' created ({}x{} {:?})", desc.name, desc.width, desc.height, desc.format);
        Ok(())
    }

    pub fn texture_view(&self, id: TextureId) -> Result<vk::ImageView> {
        self.textures()?
            .get(id)
            .map(Texture::view)
            .ok_or_else(|| Error::InvalidResource(format!("texture {:?} has no native image", id)))
    }

    // ===== BUFFERS =====

    pub fn create_buffer(&self, id: BufferId, desc: &GpuBufferDesc) -> Result<()> {
        let buffer = Buffer::new(Arc::clone(&self.ctx), &desc.name, desc.size, buffer_usage_to_vk(desc.usage))?;
        self.buffers_mut()?.insert(id, buffer);
        Ok(())
    }

    pub fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<()> {
        self.buffers()?
            .get(id)
            .ok_or_else(|| Error::InvalidResource(format!("buffer {:?} has no native buffer", id)))?
            .write(offset, data)
    }

    /// Write the copy of a per-frame buffer owned by the current slot
    pub fn write_frame_buffer(&self, buffers: &[BufferId; FRAMES_IN_FLIGHT], offset: u64, data: &[u8]) -> Result<()> {
        self.write_buffer(buffers[self.frame_index() % FRAMES_IN_FLIGHT], offset, data)
    }

    pub fn buffer_handle(&self, id: BufferId) -> Result<vk::Buffer> {
        self.buffers()?
            .get(id)
            .map(Buffer::handle)
            .ok_or_else(|| Error::InvalidResource(format!("buffer {:?} has no native buffer", id)))
    }

    /// Copy the CPU bytes of the buffer pack into vertex buffers
    ///
    /// GPU buffers are recreated when their pack buffer has grown. A pack
    /// already on the GPU is only rewritten once the device is idle.
    pub fn upload_buffers_pack(&self, pack: &BuffersPack) -> Result<()> {
        let mut gpu = self.pack_buffers.write().map_err(|_| poisoned("buffer pack"))?;
        if !gpu.is_empty() {
            // Host writes below must not race frames still reading the pack
            self.ctx.wait_idle()?;
        }
        gpu.truncate(pack.buffer_count());

        for (index, buffer) in pack.buffers().iter().enumerate() {
            let size = buffer.size()?;
            if gpu.get(index).map_or(true, |b| b.size() < size) {
                let name = format!("{}#{}", pack.name(), index);
                let created = Buffer::new(
                    Arc::clone(&self.ctx),
                    &name,
                    size,
                    vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::INDEX_BUFFER,
                )?;
                if index < gpu.len() {
                    gpu[index] = created;
                } else {
                    gpu.push(created);
                }
            }
            buffer.with_data(|bytes| gpu[index].write(0, bytes))??;
        }

        engine_debug!(SOURCE, "Buffer pack '{}' uploaded ({} buffers)", pack.name(), gpu.len());
        Ok(())
    }

    pub fn pack_buffer(&self, index: usize) -> Result<vk::Buffer> {
        self.pack_buffers
            .read()
            .map_err(|_| poisoned("buffer pack"))?
            .get(index)
            .map(Buffer::handle)
            .ok_or_else(|| Error::InvalidResource(format!("buffer pack has no buffer {}", index)))
    }

    /// Mirror the resource table: release native objects whose id left the
    /// table, create the ones not yet registered and refresh the buffer pack
    pub fn sync_resources(&self, ctx: &RhiContext) -> Result<()> {
        let resources = ctx.resources();

        let stale_textures: Vec<TextureId> = self
            .textures()?
            .keys()
            .filter(|&id| resources.texture(id).is_none())
            .collect();
        let stale_buffers: Vec<BufferId> = self
            .buffers()?
            .keys()
            .filter(|&id| resources.buffer(id).is_none())
            .collect();

        if !stale_textures.is_empty() || !stale_buffers.is_empty() {
            // Earlier frames may still sample or read them
            self.ctx.wait_idle()?;
            {
                let mut textures = self.textures_mut()?;
                for &id in &stale_textures {
                    textures.remove(id);
                }
            }
            {
                let mut buffers = self.buffers_mut()?;
                for &id in &stale_buffers {
                    buffers.remove(id);
                }
            }
            engine_debug!(SOURCE, "{} stale textures and {} stale buffers released",
                stale_textures.len(), stale_buffers.len());
        }

        let missing: Vec<TextureId> = {
            let textures = self.textures()?;
            resources.textures().map(|(id, _)| id).filter(|&id| !textures.contains_key(id)).collect()
        };
        for id in missing {
            self.create_texture(id, resources.require_texture(id)?)?;
        }

        let missing: Vec<BufferId> = {
            let buffers = self.buffers()?;
            resources.buffers().map(|(id, _)| id).filter(|&id| !buffers.contains_key(id)).collect()
        };
        for id in missing {
            self.create_buffer(id, resources.require_buffer(id)?)?;
        }

        self.upload_buffers_pack(ctx.buffers_pack())
    }

    // ===== PIPELINES =====

    /// Hand a pipeline over to the device
    pub fn register_pipeline(&self, pipeline: VulkanPipeline) -> Result<PipelineId> {
        let mut pipelines = self.pipelines.write().map_err(|_| poisoned("pipeline"))?;
        Ok(pipelines.insert(pipeline))
    }

    pub fn pipeline(&self, id: PipelineId) -> Result<VulkanPipeline> {
        self.pipelines
            .read()
            .map_err(|_| poisoned("pipeline"))?
            .get(id)
            .copied()
            .ok_or_else(|| Error::InvalidResource(format!("pipeline {:?} not registered", id)))
    }

    // ===== DESCRIPTORS =====

    /// Cached layouts of `sets`, in order, for pipeline layout creation
    pub fn set_layouts(&self, sets: &[DescriptorSet]) -> Result<Vec<vk::DescriptorSetLayout>> {
        sets.iter()
            .map(|set| self.layouts.make_layout(&self.layout_factory, set.bindings()))
            .collect()
    }

    pub fn descriptor_set(&self, id: DescriptorSetId) -> Result<vk::DescriptorSet> {
        self.sets.get(id)
    }

    pub fn layout_count(&self) -> usize {
        self.layouts.len()
    }

    pub fn pool_count(&self) -> usize {
        self.pools.pool_count()
    }

    pub fn sampler_count(&self) -> usize {
        self.samplers.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Reset every descriptor pool; cached set ids become invalid
    pub fn reset_descriptor_pools(&self) -> Result<()> {
        self.pools.reset(&self.pool_factory)
    }

    fn sampler(&self, sampler_type: SamplerType) -> Result<vk::Sampler> {
        self.samplers.lock().map_err(|_| poisoned("sampler"))?.get(sampler_type)
    }

    fn write_descriptor_set(&self, native: vk::DescriptorSet, set: &DescriptorSet) -> Result<()> {
        enum Info {
            Buffer(usize),
            Image(usize),
        }

        let mut buffer_infos = Vec::new();
        let mut image_infos = Vec::new();
        let mut kinds = Vec::with_capacity(set.writes().len());

        for write in set.writes() {
            match write.resource {
                DescriptorResource::Buffer { buffer, offset, range } => {
                    buffer_infos.push(vk::DescriptorBufferInfo {
                        buffer: self.buffer_handle(buffer)?,
                        offset,
                        range: if range == u64::MAX { vk::WHOLE_SIZE } else { range },
                    });
                    kinds.push(Info::Buffer(buffer_infos.len() - 1));
                }
                DescriptorResource::Image { texture, sampler } => {
                    image_infos.push(vk::DescriptorImageInfo {
                        sampler: self.sampler(sampler)?,
                        image_view: self.texture_view(texture)?,
                        image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                    });
                    kinds.push(Info::Image(image_infos.len() - 1));
                }
                DescriptorResource::InputAttachment { texture } => {
                    image_infos.push(vk::DescriptorImageInfo {
                        sampler: vk::Sampler::null(),
                        image_view: self.texture_view(texture)?,
                        image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                    });
                    kinds.push(Info::Image(image_infos.len() - 1));
                }
            }
        }

        let writes: Vec<vk::WriteDescriptorSet> = set
            .writes()
            .iter()
            .zip(&kinds)
            .map(|(write, kind)| {
                let base = vk::WriteDescriptorSet::default()
                    .dst_set(native)
                    .dst_binding(write.binding)
                    .descriptor_type(binding_type_to_vk(write.binding_type));
                match *kind {
                    Info::Buffer(i) => base.buffer_info(std::slice::from_ref(&buffer_infos[i])),
                    Info::Image(i) => base.image_info(std::slice::from_ref(&image_infos[i])),
                }
            })
            .collect();

        unsafe { self.ctx.device.update_descriptor_sets(&writes, &[]); }
        Ok(())
    }

    // ===== SUBMISSION =====

    /// Submit a recorded command buffer and wait for it to finish
    pub fn submit_and_wait(&self, cmd: &VulkanCommandBuffer) -> Result<()> {
        if cmd.is_recording() {
            return Err(Error::BackendError("Command buffer still recording".to_string()));
        }

        unsafe {
            let fence = self.ctx.device
                .create_fence(&vk::FenceCreateInfo::default(), None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create fence: {:?}", e))?;

            let command_buffers = [cmd.raw()];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

            let result = self.ctx.device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], fence)
                .and_then(|_| self.ctx.device.wait_for_fences(&[fence], true, u64::MAX));
            self.ctx.device.destroy_fence(fence, None);

            result.map_err(|e| engine_err!(SOURCE, "Failed to submit command buffer: {:?}", e))
        }
    }
}

impl DescriptorAllocator for VulkanDevice {
    fn allocate_descriptor_set(&self, set: &DescriptorSet) -> Result<DescriptorSetId> {
        set.validate()?;
        let layout = self.layouts.make_layout(&self.layout_factory, set.bindings())?;
        let native = self.pools.allocate(&self.pool_factory, &layout)?;
        self.write_descriptor_set(native, set)?;
        self.sets.emplace(native)
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        self.ctx.wait_idle().ok();

        if let Ok(mut pipelines) = self.pipelines.write() {
            for (_, pipeline) in pipelines.drain() {
                unsafe {
                    self.ctx.device.destroy_pipeline(pipeline.pipeline, None);
                    self.ctx.device.destroy_pipeline_layout(pipeline.layout, None);
                }
            }
        }

        self.pools.destroy(&self.pool_factory).ok();
        self.layouts.destroy(&self.layout_factory).ok();
    }
}
