/// Conversions from RHI enums to Vulkan enums

use ash::vk;
use ember_rhi::backend::IndexType;
use ember_rhi::descriptor::{BindingType, ShaderStageFlags};
use ember_rhi::types::{LoadAction, StepFunction, StoreAction, TextureFormat, VertexFormat};
use ember_rhi::vertex::VertexDescriptor;

pub fn texture_format_to_vk(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        TextureFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        TextureFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        TextureFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        TextureFormat::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
        TextureFormat::R32_SFLOAT => vk::Format::R32_SFLOAT,
        TextureFormat::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
        TextureFormat::D16_UNORM => vk::Format::D16_UNORM,
        TextureFormat::D32_FLOAT => vk::Format::D32_SFLOAT,
        TextureFormat::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
        TextureFormat::D32_FLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
    }
}

/// Vertex attribute format, `UNDEFINED` for `Struct0` and matrix formats
///
/// Matrices span several locations and are declared one column at a time,
/// see [`vertex_format_column`].
pub fn vertex_format_to_vk(format: VertexFormat) -> vk::Format {
    use VertexFormat::*;
    match format {
        Int8_1 => vk::Format::R8_SINT,
        Int8_2 => vk::Format::R8G8_SINT,
        Int8_3 => vk::Format::R8G8B8_SINT,
        Int8_4 => vk::Format::R8G8B8A8_SINT,
        Int16_1 => vk::Format::R16_SINT,
        Int16_2 => vk::Format::R16G16_SINT,
        Int16_3 => vk::Format::R16G16B16_SINT,
        Int16_4 => vk::Format::R16G16B16A16_SINT,
        Int32_1 => vk::Format::R32_SINT,
        Int32_2 => vk::Format::R32G32_SINT,
        Int32_3 => vk::Format::R32G32B32_SINT,
        Int32_4 => vk::Format::R32G32B32A32_SINT,
        Half16_1 => vk::Format::R16_SFLOAT,
        Half16_2 => vk::Format::R16G16_SFLOAT,
        Half16_3 => vk::Format::R16G16B16_SFLOAT,
        Half16_4 => vk::Format::R16G16B16A16_SFLOAT,
        Float32_1 => vk::Format::R32_SFLOAT,
        Float32_2 => vk::Format::R32G32_SFLOAT,
        Float32_3 => vk::Format::R32G32B32_SFLOAT,
        Float32_4 => vk::Format::R32G32B32A32_SFLOAT,
        Uint8_1 => vk::Format::R8_UINT,
        Uint8_2 => vk::Format::R8G8_UINT,
        Uint8_3 => vk::Format::R8G8B8_UINT,
        Uint8_4 => vk::Format::R8G8B8A8_UINT,
        Uint16_1 => vk::Format::R16_UINT,
        Uint16_2 => vk::Format::R16G16_UINT,
        Uint16_3 => vk::Format::R16G16B16_UINT,
        Uint16_4 => vk::Format::R16G16B16A16_UINT,
        Uint32_1 => vk::Format::R32_UINT,
        Uint32_2 => vk::Format::R32G32_UINT,
        Uint32_3 => vk::Format::R32G32B32_UINT,
        Uint32_4 => vk::Format::R32G32B32A32_UINT,
        Int8_4Norm => vk::Format::R8G8B8A8_SNORM,
        Int16_2Norm => vk::Format::R16G16_SNORM,
        Int16_4Norm => vk::Format::R16G16B16A16_SNORM,
        Uint8_4Norm => vk::Format::R8G8B8A8_UNORM,
        Uint16_2Norm => vk::Format::R16G16_UNORM,
        Uint16_4Norm => vk::Format::R16G16B16A16_UNORM,
        Int1010102Norm => vk::Format::A2B10G10R10_SNORM_PACK32,
        Uint64_1 => vk::Format::R64_UINT,
        Uint64_2 => vk::Format::R64G64_UINT,
        Uint64_3 => vk::Format::R64G64B64_UINT,
        Uint64_4 => vk::Format::R64G64B64A64_UINT,
        Float64_1 => vk::Format::R64_SFLOAT,
        Float64_2 => vk::Format::R64G64_SFLOAT,
        Float64_3 => vk::Format::R64G64B64_SFLOAT,
        Float64_4 => vk::Format::R64G64B64A64_SFLOAT,
        Float32_2x2 | Float32_2x3 | Float32_2x4
        | Float32_3x2 | Float32_3x3 | Float32_3x4
        | Float32_4x2 | Float32_4x3 | Float32_4x4
        | Float64_2x2 | Float64_3x3 | Float64_4x4
        | Struct0 => vk::Format::UNDEFINED,
    }
}

/// Per-location format and byte size of one matrix column
pub fn vertex_format_column(format: VertexFormat) -> (vk::Format, u32) {
    use VertexFormat::*;
    match format {
        Float32_2x2 | Float32_3x2 | Float32_4x2 => (vk::Format::R32G32_SFLOAT, 8),
        Float32_2x3 | Float32_3x3 | Float32_4x3 => (vk::Format::R32G32B32_SFLOAT, 12),
        Float32_2x4 | Float32_3x4 | Float32_4x4 => (vk::Format::R32G32B32A32_SFLOAT, 16),
        Float64_2x2 => (vk::Format::R64G64_SFLOAT, 16),
        Float64_3x3 => (vk::Format::R64G64B64_SFLOAT, 24),
        Float64_4x4 => (vk::Format::R64G64B64A64_SFLOAT, 32),
        other => (vertex_format_to_vk(other), other.bytes()),
    }
}

/// Constant-step attributes have no Vulkan rate and read per instance
pub fn step_function_to_vk(step: StepFunction) -> vk::VertexInputRate {
    match step {
        StepFunction::Vertex => vk::VertexInputRate::VERTEX,
        StepFunction::Instance | StepFunction::Constant => vk::VertexInputRate::INSTANCE,
    }
}

pub fn load_action_to_vk(action: LoadAction) -> vk::AttachmentLoadOp {
    match action {
        LoadAction::Clear => vk::AttachmentLoadOp::CLEAR,
        LoadAction::Load => vk::AttachmentLoadOp::LOAD,
        LoadAction::DontCare => vk::AttachmentLoadOp::DONT_CARE,
    }
}

pub fn store_action_to_vk(action: StoreAction) -> vk::AttachmentStoreOp {
    match action {
        StoreAction::Store => vk::AttachmentStoreOp::STORE,
        StoreAction::Discard | StoreAction::DontCare => vk::AttachmentStoreOp::DONT_CARE,
    }
}

pub fn binding_type_to_vk(binding_type: BindingType) -> vk::DescriptorType {
    match binding_type {
        BindingType::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        BindingType::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        BindingType::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        BindingType::InputAttachment => vk::DescriptorType::INPUT_ATTACHMENT,
    }
}

pub fn stage_flags_to_vk(flags: ShaderStageFlags) -> vk::ShaderStageFlags {
    let mut vk_flags = vk::ShaderStageFlags::empty();
    if flags.contains(ShaderStageFlags::VERTEX) { vk_flags |= vk::ShaderStageFlags::VERTEX; }
    if flags.contains(ShaderStageFlags::FRAGMENT) { vk_flags |= vk::ShaderStageFlags::FRAGMENT; }
    if flags.contains(ShaderStageFlags::COMPUTE) { vk_flags |= vk::ShaderStageFlags::COMPUTE; }
    vk_flags
}

pub fn index_type_to_vk(index_type: IndexType) -> vk::IndexType {
    match index_type {
        IndexType::U16 => vk::IndexType::UINT16,
        IndexType::U32 => vk::IndexType::UINT32,
    }
}

/// Vertex input bindings and attributes of a complete vertex descriptor
///
/// Matrix attributes expand into one attribute per column on consecutive
/// locations.
pub fn vertex_input_descriptions(
    descriptor: &VertexDescriptor,
) -> (Vec<vk::VertexInputBindingDescription>, Vec<vk::VertexInputAttributeDescription>) {
    let bindings = descriptor
        .layouts()
        .iter()
        .map(|layout| vk::VertexInputBindingDescription {
            binding: layout.binding,
            stride: layout.stride,
            input_rate: step_function_to_vk(layout.step_function),
        })
        .collect();

    let mut attributes = Vec::with_capacity(descriptor.attributes().len());
    for attribute in descriptor.attributes() {
        let (format, column_bytes) = vertex_format_column(attribute.format);
        let columns = (attribute.format.bytes() / column_bytes.max(1)).max(1);
        let locations_per_column = (attribute.format.location_count() / columns).max(1);
        for column in 0..columns {
            attributes.push(vk::VertexInputAttributeDescription {
                location: attribute.location + column * locations_per_column,
                binding: attribute.binding,
                format,
                offset: attribute.offset + column * column_bytes,
            });
        }
    }

    (bindings, attributes)
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
