use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};
use crate::frame::FRAMES_IN_FLIGHT;
use crate::types::TextureFormat;

new_key_type! {
    /// Key of a texture in the resource table
    pub struct TextureId;
    /// Key of a GPU buffer in the resource table
    pub struct BufferId;
    /// Key of a backend pipeline (owned by the backend)
    pub struct PipelineId;
}

/// Texture usage flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureUsage {
    /// Texture can be sampled in shaders
    Sampled,
    /// Texture can be used as render target
    RenderTarget,
    /// Render target later sampled or read as input attachment
    SampledAndRenderTarget,
    /// Depth/stencil attachment
    DepthStencil,
}

/// Sampler presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerType {
    LinearRepeat,
    LinearClamp,
    NearestRepeat,
    NearestClamp,
    /// Depth comparison sampler for shadow maps
    Shadow,
    Anisotropic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuBufferUsage {
    Uniform,
    Storage,
    Vertex,
    Index,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpuBufferDesc {
    pub name: String,
    pub size: u64,
    pub usage: GpuBufferUsage,
}

/// Descriptions of the textures and GPU buffers the render graph refers to
#[derive(Debug, Default)]
pub struct ResourceTable {
    textures: SlotMap<TextureId, TextureDesc>,
    buffers: SlotMap<BufferId, GpuBufferDesc>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_texture(&mut self, desc: TextureDesc) -> Result<TextureId> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidResource(format!(
                "texture '{}' has zero extent {}x{}", desc.name, desc.width, desc.height)));
        }
        Ok(self.textures.insert(desc))
    }

    pub fn texture(&self, id: TextureId) -> Option<&TextureDesc> {
        self.textures.get(id)
    }

    /// Look a texture up, failing with `InvalidResource` when it was removed
    pub fn require_texture(&self, id: TextureId) -> Result<&TextureDesc> {
        self.textures
            .get(id)
            .ok_or_else(|| Error::InvalidResource(format!("texture {:?} not found", id)))
    }

    pub fn remove_texture(&mut self, id: TextureId) -> Option<TextureDesc> {
        self.textures.remove(id)
    }

    pub fn textures(&self) -> impl Iterator<Item = (TextureId, &TextureDesc)> {
        self.textures.iter()
    }

    pub fn create_buffer(&mut self, desc: GpuBufferDesc) -> Result<BufferId> {
        if desc.size == 0 {
            return Err(Error::InvalidResource(format!("buffer '{}' has zero size", desc.name)));
        }
        Ok(self.buffers.insert(desc))
    }

    /// One buffer per frame in flight, named `name#slot`
    ///
    /// Per-frame uniforms live in these so the CPU writes one copy while the
    /// GPU may still read the others.
    pub fn create_frame_buffers(&mut self, desc: GpuBufferDesc) -> Result<[BufferId; FRAMES_IN_FLIGHT]> {
        if desc.size == 0 {
            return Err(Error::InvalidResource(format!("buffer '{}' has zero size", desc.name)));
        }
        Ok(std::array::from_fn(|slot| {
            self.buffers.insert(GpuBufferDesc { name: format!("{}#{}", desc.name, slot), ..desc.clone() })
        }))
    }

    pub fn buffer(&self, id: BufferId) -> Option<&GpuBufferDesc> {
        self.buffers.get(id)
    }

    pub fn require_buffer(&self, id: BufferId) -> Result<&GpuBufferDesc> {
        self.buffers
            .get(id)
            .ok_or_else(|| Error::InvalidResource(format!("buffer {:?} not found", id)))
    }

    pub fn remove_buffer(&mut self, id: BufferId) -> Option<GpuBufferDesc> {
        self.buffers.remove(id)
    }

    pub fn buffers(&self) -> impl Iterator<Item = (BufferId, &GpuBufferDesc)> {
        self.buffers.iter()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }
}

#[cfg(test)]
#[path = "resource_table_tests.rs"]
mod tests;
