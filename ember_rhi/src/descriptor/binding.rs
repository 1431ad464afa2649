/// Descriptor bindings and CPU-side descriptor sets
///
/// A `DescriptorSet` is an ordered list of bindings (the layout signature)
/// plus the writes that fill a native set allocated for that layout.

use bitflags::bitflags;
use crate::error::Result;
use crate::resource_table::{BufferId, TextureId, SamplerType};

/// Type of resource bound at a given slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingType {
    /// Uniform buffer (read-only structured data)
    UniformBuffer,
    /// Storage buffer (read/write)
    StorageBuffer,
    /// Combined image sampler (texture + sampler in one binding)
    CombinedImageSampler,
    /// Subpass input attachment
    InputAttachment,
}

bitflags! {
    /// Shader stage visibility flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 0x01;
        const FRAGMENT = 0x02;
        const COMPUTE = 0x04;
        const VERTEX_FRAGMENT = Self::VERTEX.bits() | Self::FRAGMENT.bits();
        const ALL = Self::VERTEX.bits() | Self::FRAGMENT.bits() | Self::COMPUTE.bits();
    }
}

/// Description of a single binding slot
///
/// Two layouts are the same layout exactly when their ordered binding lists
/// compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorBinding {
    /// Binding number (corresponds to `layout(binding = N)` in GLSL)
    pub binding: u32,
    pub binding_type: BindingType,
    /// Number of descriptors at this binding (>1 for arrays)
    pub count: u32,
    pub stage_flags: ShaderStageFlags,
}

/// Resource a write points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorResource {
    Buffer { buffer: BufferId, offset: u64, range: u64 },
    Image { texture: TextureId, sampler: SamplerType },
    InputAttachment { texture: TextureId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorWrite {
    pub binding: u32,
    pub binding_type: BindingType,
    pub resource: DescriptorResource,
}

/// Bindings and writes of one binding group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorSet {
    set_index: u32,
    bindings: Vec<DescriptorBinding>,
    writes: Vec<DescriptorWrite>,
}

impl DescriptorSet {
    pub fn new(set_index: u32) -> Self {
        Self { set_index, bindings: Vec::new(), writes: Vec::new() }
    }

    pub fn set_index(&self) -> u32 {
        self.set_index
    }

    pub fn bindings(&self) -> &[DescriptorBinding] {
        &self.bindings
    }

    pub fn writes(&self) -> &[DescriptorWrite] {
        &self.writes
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Next free binding number
    pub fn next_binding(&self) -> u32 {
        self.bindings.last().map_or(0, |b| b.binding + 1)
    }

    /// Add a layout-only binding, its write pushed later with `push_write`
    pub fn push_binding(&mut self, binding: u32, binding_type: BindingType, stage_flags: ShaderStageFlags) {
        self.bindings.push(DescriptorBinding { binding, binding_type, count: 1, stage_flags });
    }

    pub fn push_write(&mut self, binding: u32, binding_type: BindingType, resource: DescriptorResource) {
        self.writes.push(DescriptorWrite { binding, binding_type, resource });
    }

    pub fn push_buffer(
        &mut self,
        binding: u32,
        buffer: BufferId,
        binding_type: BindingType,
        stage_flags: ShaderStageFlags,
    ) {
        self.push_binding(binding, binding_type, stage_flags);
        self.push_write(binding, binding_type, DescriptorResource::Buffer {
            buffer,
            offset: 0,
            range: u64::MAX,
        });
    }

    pub fn push_image(
        &mut self,
        binding: u32,
        texture: TextureId,
        sampler: SamplerType,
        stage_flags: ShaderStageFlags,
    ) {
        self.push_binding(binding, BindingType::CombinedImageSampler, stage_flags);
        self.push_write(binding, BindingType::CombinedImageSampler, DescriptorResource::Image {
            texture,
            sampler,
        });
    }

    pub fn push_input_attachment(&mut self, binding: u32, texture: TextureId) {
        self.push_binding(binding, BindingType::InputAttachment, ShaderStageFlags::FRAGMENT);
        self.push_write(binding, BindingType::InputAttachment, DescriptorResource::InputAttachment { texture });
    }

    /// Every binding has exactly one write of the same type
    pub fn validate(&self) -> Result<()> {
        if self.bindings.len() != self.writes.len() {
            crate::engine_contract!("ember::DescriptorSet",
                "Set {} has {} bindings but {} writes",
                self.set_index, self.bindings.len(), self.writes.len());
        }
        for binding in &self.bindings {
            let matching = self
                .writes
                .iter()
                .filter(|w| w.binding == binding.binding && w.binding_type == binding.binding_type)
                .count();
            if matching != 1 {
                crate::engine_contract!("ember::DescriptorSet",
                    "Set {} binding {} has {} matching writes", self.set_index, binding.binding, matching);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "binding_tests.rs"]
mod tests;
