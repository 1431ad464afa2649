/// WgpuDevice - Native resources of the resource table
///
/// Owns the `wgpu::Device`/`wgpu::Queue` pair, the textures and buffers
/// registered under `ResourceTable` ids, the GPU copies of the buffer pack
/// and the pipelines. Bind groups are created from program descriptor sets
/// through the shared layout cache; wgpu has no descriptor pools, so every
/// set becomes its own `wgpu::BindGroup`.

use rustc_hash::FxHashMap;
use slotmap::{SecondaryMap, SlotMap};
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use ember_rhi::buffers::BuffersPack;
use ember_rhi::descriptor::{
    DescriptorBinding, DescriptorLayoutCache, DescriptorResource, DescriptorSet, DescriptorSetCache,
    DescriptorSetId, LayoutFactory,
};
use ember_rhi::ember::{Error, Result, RhiContext};
use ember_rhi::frame::FRAMES_IN_FLIGHT;
use ember_rhi::program::DescriptorAllocator;
use ember_rhi::resource_table::{BufferId, GpuBufferDesc, PipelineId, SamplerType, TextureDesc, TextureId, TextureUsage};
use ember_rhi::{engine_debug, engine_err, engine_error, engine_info};

use crate::wgpu_command_encoder::WgpuCommandBuffer;
use crate::wgpu_format::{
    buffer_usage_to_wgpu, layout_entries, sampler_descriptor, texture_format_to_wgpu, texture_usage_to_wgpu,
    SAMPLER_BINDING_OFFSET,
};

const SOURCE: &str = "ember::wgpu::Device";

fn poisoned(what: &str) -> Error {
    Error::BackendError(format!("WgpuDevice {} lock poisoned", what))
}

/// Pipeline registered with the device
#[derive(Debug, Clone)]
pub enum WgpuPipeline {
    Render(wgpu::RenderPipeline),
    Compute(wgpu::ComputePipeline),
}

struct WgpuTexture {
    view: wgpu::TextureView,
    // Keeps the image alive behind its view
    _texture: wgpu::Texture,
}

#[derive(Clone)]
struct WgpuBuffer {
    buffer: wgpu::Buffer,
    size: u64,
}

/// Layouts of the shared cache, dropped with their last reference
struct WgpuLayoutFactory {
    device: wgpu::Device,
}

impl LayoutFactory for WgpuLayoutFactory {
    type Layout = Arc<wgpu::BindGroupLayout>;

    fn create_layout(&self, bindings: &[DescriptorBinding]) -> Result<Arc<wgpu::BindGroupLayout>> {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = bindings.iter().flat_map(layout_entries).collect();
        let layout = self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ember bind group layout"),
            entries: &entries,
        });
        Ok(Arc::new(layout))
    }

    fn destroy_layout(&self, _layout: Arc<wgpu::BindGroupLayout>) {}
}

/// Resource bound at one bind group entry
enum BoundResource {
    Buffer(wgpu::Buffer, u64, Option<NonZeroU64>),
    View(wgpu::TextureView),
    Sampler(wgpu::Sampler),
}

pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    layout_factory: WgpuLayoutFactory,
    layouts: DescriptorLayoutCache<Arc<wgpu::BindGroupLayout>>,
    bind_groups: DescriptorSetCache<Arc<wgpu::BindGroup>>,
    samplers: Mutex<FxHashMap<SamplerType, wgpu::Sampler>>,
    textures: RwLock<SecondaryMap<TextureId, WgpuTexture>>,
    buffers: RwLock<SecondaryMap<BufferId, WgpuBuffer>>,
    pack_buffers: RwLock<Vec<WgpuBuffer>>,
    pipelines: RwLock<SlotMap<PipelineId, WgpuPipeline>>,
    /// Slot selected by the last `WgpuFrames::begin_frame`
    frame: AtomicUsize,
}

impl WgpuDevice {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            layout_factory: WgpuLayoutFactory { device: device.clone() },
            layouts: DescriptorLayoutCache::new(),
            bind_groups: DescriptorSetCache::new(),
            samplers: Mutex::new(FxHashMap::default()),
            textures: RwLock::new(SecondaryMap::new()),
            buffers: RwLock::new(SecondaryMap::new()),
            pack_buffers: RwLock::new(Vec::new()),
            pipelines: RwLock::new(SlotMap::with_key()),
            frame: AtomicUsize::new(0),
            device,
            queue,
        }
    }

    /// Device on the default adapter, without a surface
    pub async fn headless() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::new_without_display_handle());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .map_err(|e| Error::InitializationFailed(format!("No suitable adapter: {}", e)))?;

        let info = adapter.get_info();
        engine_info!(SOURCE, "Using adapter \"{}\" ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("ember device"),
                ..Default::default()
            })
            .await
            .map_err(|e| Error::InitializationFailed(format!("Failed to create device: {}", e)))?;

        device.on_uncaptured_error(std::sync::Arc::new(|e| {
            engine_error!("ember::wgpu::Validation", "{}", e);
        }));

        Ok(Self::new(device, queue))
    }

    pub fn raw(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Frame-in-flight slot being recorded
    pub fn frame_index(&self) -> usize {
        self.frame.load(Ordering::Acquire)
    }

    pub(crate) fn set_frame_index(&self, index: usize) {
        self.frame.store(index, Ordering::Release);
    }

    pub(crate) fn create_command_encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }

    fn textures(&self) -> Result<RwLockReadGuard<'_, SecondaryMap<TextureId, WgpuTexture>>> {
        self.textures.read().map_err(|_| poisoned("texture"))
    }

    fn textures_mut(&self) -> Result<RwLockWriteGuard<'_, SecondaryMap<TextureId, WgpuTexture>>> {
        self.textures.write().map_err(|_| poisoned("texture"))
    }

    fn buffers(&self) -> Result<RwLockReadGuard<'_, SecondaryMap<BufferId, WgpuBuffer>>> {
        self.buffers.read().map_err(|_| poisoned("buffer"))
    }

    fn buffers_mut(&self) -> Result<RwLockWriteGuard<'_, SecondaryMap<BufferId, WgpuBuffer>>> {
        self.buffers.write().map_err(|_| poisoned("buffer"))
    }

    // ===== TEXTURES =====

    /// Create the native texture of `id`, replacing any previous one
    pub fn create_texture(&self, id: TextureId, desc: &TextureDesc) -> Result<()> {
        if desc.format.is_depth_format() != (desc.usage == TextureUsage::DepthStencil) {
            return Err(Error::InvalidResource(format!(
                "Texture '{}': format {:?} does not match usage {:?}", desc.name, desc.format, desc.usage)));
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.name.as_str()),
            size: wgpu::Extent3d { width: desc.width, height: desc.height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture_format_to_wgpu(desc.format),
            usage: texture_usage_to_wgpu(desc.usage),
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.textures_mut()?.insert(id, WgpuTexture { view, _texture: texture });
        engine_debug!(SOURCE, "Texture '{}' created ({}x{} {:?})", desc.name, desc.width, desc.height, desc.format);
        Ok(())
    }

    pub fn texture_view(&self, id: TextureId) -> Result<wgpu::TextureView> {
        self.textures()?
            .get(id)
            .map(|texture| texture.view.clone())
            .ok_or_else(|| Error::InvalidResource(format!("texture {:?} has no native texture", id)))
    }

    // ===== BUFFERS =====

    fn allocate_buffer(&self, label: &str, size: u64, usage: wgpu::BufferUsages) -> WgpuBuffer {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: wgpu::util::align_to(size.max(1), wgpu::COPY_BUFFER_ALIGNMENT),
            usage,
            mapped_at_creation: false,
        });
        WgpuBuffer { buffer, size }
    }

    pub fn create_buffer(&self, id: BufferId, desc: &GpuBufferDesc) -> Result<()> {
        let buffer = self.allocate_buffer(&desc.name, desc.size, buffer_usage_to_wgpu(desc.usage));
        self.buffers_mut()?.insert(id, buffer);
        Ok(())
    }

    /// Queue a write; offset and length must be multiples of 4
    pub fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<()> {
        let buffers = self.buffers()?;
        let buffer = buffers
            .get(id)
            .ok_or_else(|| Error::InvalidResource(format!("buffer {:?} has no native buffer", id)))?;

        if offset + data.len() as u64 > buffer.size {
            return Err(Error::InvalidResource(format!(
                "Write of {} bytes at {} exceeds buffer size {}", data.len(), offset, buffer.size)));
        }
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 || data.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(Error::InvalidResource(format!(
                "Write of {} bytes at {} is not 4-byte aligned", data.len(), offset)));
        }

        self.queue.write_buffer(&buffer.buffer, offset, data);
        Ok(())
    }

    /// Write the copy of a per-frame buffer owned by the current slot
    pub fn write_frame_buffer(&self, buffers: &[BufferId; FRAMES_IN_FLIGHT], offset: u64, data: &[u8]) -> Result<()> {
        self.write_buffer(buffers[self.frame_index() % FRAMES_IN_FLIGHT], offset, data)
    }

    pub fn buffer(&self, id: BufferId) -> Result<wgpu::Buffer> {
        self.buffers()?
            .get(id)
            .map(|b| b.buffer.clone())
            .ok_or_else(|| Error::InvalidResource(format!("buffer {:?} has no native buffer", id)))
    }

    /// Copy the CPU bytes of the buffer pack into vertex buffers
    ///
    /// GPU buffers are recreated when their pack buffer has grown. Trailing
    /// bytes are zero-padded to the copy alignment.
    pub fn upload_buffers_pack(&self, pack: &BuffersPack) -> Result<()> {
        let mut gpu = self.pack_buffers.write().map_err(|_| poisoned("buffer pack"))?;
        gpu.truncate(pack.buffer_count());

        for (index, buffer) in pack.buffers().iter().enumerate() {
            let size = buffer.size()?;
            if gpu.get(index).map_or(true, |b| b.size < size) {
                let created = self.allocate_buffer(
                    &format!("{}#{}", pack.name(), index),
                    size,
                    wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                );
                if index < gpu.len() {
                    gpu[index] = created;
                } else {
                    gpu.push(created);
                }
            }

            let target = &gpu[index].buffer;
            buffer.with_data(|bytes| {
                let aligned = wgpu::util::align_to(bytes.len() as u64, wgpu::COPY_BUFFER_ALIGNMENT) as usize;
                if aligned == bytes.len() {
                    self.queue.write_buffer(target, 0, bytes);
                } else {
                    let mut padded = bytes.to_vec();
                    padded.resize(aligned, 0);
                    self.queue.write_buffer(target, 0, &padded);
                }
            })?;
        }

        engine_debug!(SOURCE, "Buffer pack '{}' uploaded ({} buffers)", pack.name(), gpu.len());
        Ok(())
    }

    pub fn pack_buffer(&self, index: usize) -> Result<wgpu::Buffer> {
        self.pack_buffers
            .read()
            .map_err(|_| poisoned("buffer pack"))?
            .get(index)
            .map(|b| b.buffer.clone())
            .ok_or_else(|| Error::InvalidResource(format!("buffer pack has no buffer {}", index)))
    }

    /// Mirror the resource table: drop native objects whose id left the
    /// table, create the ones not yet registered and refresh the buffer pack
    pub fn sync_resources(&self, ctx: &RhiContext) -> Result<()> {
        let resources = ctx.resources();

        let released_textures = {
            let mut textures = self.textures_mut()?;
            let before = textures.len();
            textures.retain(|id, _| resources.texture(id).is_some());
            before - textures.len()
        };
        let released_buffers = {
            let mut buffers = self.buffers_mut()?;
            let before = buffers.len();
            buffers.retain(|id, _| resources.buffer(id).is_some());
            before - buffers.len()
        };
        if released_textures + released_buffers > 0 {
            engine_debug!(SOURCE, "{} stale textures and {} stale buffers released",
                released_textures, released_buffers);
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

    pub fn register_pipeline(&self, pipeline: WgpuPipeline) -> Result<PipelineId> {
        let mut pipelines = self.pipelines.write().map_err(|_| poisoned("pipeline"))?;
        Ok(pipelines.insert(pipeline))
    }

    pub fn pipeline(&self, id: PipelineId) -> Result<WgpuPipeline> {
        self.pipelines
            .read()
            .map_err(|_| poisoned("pipeline"))?
            .get(id)
            .cloned()
            .ok_or_else(|| Error::InvalidResource(format!("pipeline {:?} not registered", id)))
    }

    // ===== BIND GROUPS =====

    /// Cached layouts of `sets`, in order, for pipeline layout creation
    pub fn bind_group_layouts(&self, sets: &[DescriptorSet]) -> Result<Vec<Arc<wgpu::BindGroupLayout>>> {
        sets.iter()
            .map(|set| self.layouts.make_layout(&self.layout_factory, set.bindings()))
            .collect()
    }

    pub fn bind_group(&self, id: DescriptorSetId) -> Result<Arc<wgpu::BindGroup>> {
        self.bind_groups.get(id)
    }

    pub fn layout_count(&self) -> usize {
        self.layouts.len()
    }

    pub fn bind_group_count(&self) -> usize {
        self.bind_groups.len()
    }

    pub fn sampler_count(&self) -> usize {
        self.samplers.lock().map(|s| s.len()).unwrap_or(0)
    }

    fn sampler(&self, sampler_type: SamplerType) -> Result<wgpu::Sampler> {
        let mut samplers = self.samplers.lock().map_err(|_| poisoned("sampler"))?;
        let sampler = samplers
            .entry(sampler_type)
            .or_insert_with(|| {
                engine_debug!(SOURCE, "Sampler {:?} created", sampler_type);
                self.device.create_sampler(&sampler_descriptor(sampler_type))
            })
            .clone();
        Ok(sampler)
    }

    fn bound_resources(&self, set: &DescriptorSet) -> Result<Vec<(u32, BoundResource)>> {
        let mut bound = Vec::with_capacity(set.writes().len());
        for write in set.writes() {
            match write.resource {
                DescriptorResource::Buffer { buffer, offset, range } => {
                    let size = if range == u64::MAX { None } else { NonZeroU64::new(range) };
                    bound.push((write.binding, BoundResource::Buffer(self.buffer(buffer)?, offset, size)));
                }
                DescriptorResource::Image { texture, sampler } => {
                    bound.push((write.binding, BoundResource::View(self.texture_view(texture)?)));
                    bound.push((write.binding + SAMPLER_BINDING_OFFSET, BoundResource::Sampler(self.sampler(sampler)?)));
                }
                DescriptorResource::InputAttachment { texture } => {
                    bound.push((write.binding, BoundResource::View(self.texture_view(texture)?)));
                }
            }
        }
        Ok(bound)
    }

    // ===== SUBMISSION =====

    /// Finish `cmd` and submit it
    pub fn submit(&self, cmd: &mut WgpuCommandBuffer) -> Result<()> {
        let command_buffer = cmd.finish()?;
        self.queue.submit(std::iter::once(command_buffer));
        Ok(())
    }

    /// Submit and block until the queue is idle
    pub fn submit_and_wait(&self, cmd: &mut WgpuCommandBuffer) -> Result<()> {
        self.submit(cmd)?;
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map(|_| ())
            .map_err(|e| engine_err!(SOURCE, "Failed to wait for queue: {:?}", e))
    }
}

impl DescriptorAllocator for WgpuDevice {
    fn allocate_descriptor_set(&self, set: &DescriptorSet) -> Result<DescriptorSetId> {
        set.validate()?;
        let layout = self.layouts.make_layout(&self.layout_factory, set.bindings())?;
        let bound = self.bound_resources(set)?;

        let entries: Vec<wgpu::BindGroupEntry> = bound
            .iter()
            .map(|(binding, resource)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: match resource {
                    BoundResource::Buffer(buffer, offset, size) => {
                        wgpu::BindingResource::Buffer(wgpu::BufferBinding { buffer, offset: *offset, size: *size })
                    }
                    BoundResource::View(view) => wgpu::BindingResource::TextureView(view),
                    BoundResource::Sampler(sampler) => wgpu::BindingResource::Sampler(sampler),
                },
            })
            .collect();

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ember bind group"),
            layout: layout.as_ref(),
            entries: &entries,
        });
        self.bind_groups.emplace(Arc::new(bind_group))
    }
}
