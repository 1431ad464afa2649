/// Conversions from RHI enums to wgpu types

use std::num::NonZeroU32;
use ember_rhi::backend::IndexType;
use ember_rhi::descriptor::{BindingType, DescriptorBinding, ShaderStageFlags};
use ember_rhi::ember::{Error, Result};
use ember_rhi::glam::Vec4;
use ember_rhi::resource_table::{GpuBufferUsage, SamplerType, TextureUsage};
use ember_rhi::types::{LoadAction, StepFunction, StoreAction, TextureFormat, VertexFormat};
use ember_rhi::vertex::VertexDescriptor;

/// Offset of the sampler half of a combined image sampler
///
/// wgpu has no combined image sampler: binding `b` holds the texture and
/// binding `b + SAMPLER_BINDING_OFFSET` holds its sampler.
pub const SAMPLER_BINDING_OFFSET: u32 = 16;

pub fn texture_format_to_wgpu(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::R8G8B8A8_SRGB => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureFormat::R8G8B8A8_UNORM => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::B8G8R8A8_SRGB => wgpu::TextureFormat::Bgra8UnormSrgb,
        TextureFormat::B8G8R8A8_UNORM => wgpu::TextureFormat::Bgra8Unorm,
        TextureFormat::R16G16B16A16_SFLOAT => wgpu::TextureFormat::Rgba16Float,
        TextureFormat::R32_SFLOAT => wgpu::TextureFormat::R32Float,
        TextureFormat::R32G32B32A32_SFLOAT => wgpu::TextureFormat::Rgba32Float,
        TextureFormat::D16_UNORM => wgpu::TextureFormat::Depth16Unorm,
        TextureFormat::D32_FLOAT => wgpu::TextureFormat::Depth32Float,
        TextureFormat::D24_UNORM_S8_UINT => wgpu::TextureFormat::Depth24PlusStencil8,
        TextureFormat::D32_FLOAT_S8_UINT => wgpu::TextureFormat::Depth32FloatStencil8,
    }
}

pub fn texture_usage_to_wgpu(usage: TextureUsage) -> wgpu::TextureUsages {
    match usage {
        TextureUsage::Sampled => wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        TextureUsage::RenderTarget => wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        TextureUsage::SampledAndRenderTarget | TextureUsage::DepthStencil => {
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
        }
    }
}

pub fn buffer_usage_to_wgpu(usage: GpuBufferUsage) -> wgpu::BufferUsages {
    let usages = match usage {
        GpuBufferUsage::Uniform => wgpu::BufferUsages::UNIFORM,
        GpuBufferUsage::Storage => wgpu::BufferUsages::STORAGE,
        GpuBufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
        GpuBufferUsage::Index => wgpu::BufferUsages::INDEX,
    };
    usages | wgpu::BufferUsages::COPY_DST
}

/// Single-location vertex format, `None` where wgpu has no equivalent
///
/// wgpu has no three-component 8/16-bit formats, no 64-bit integers and no
/// signed 10:10:10:2 format.
pub fn vertex_format_to_wgpu(format: VertexFormat) -> Option<wgpu::VertexFormat> {
    use VertexFormat::*;
    let converted = match format {
        Int8_1 => wgpu::VertexFormat::Sint8,
        Int8_2 => wgpu::VertexFormat::Sint8x2,
        Int8_4 => wgpu::VertexFormat::Sint8x4,
        Int16_1 => wgpu::VertexFormat::Sint16,
        Int16_2 => wgpu::VertexFormat::Sint16x2,
        Int16_4 => wgpu::VertexFormat::Sint16x4,
        Int32_1 => wgpu::VertexFormat::Sint32,
        Int32_2 => wgpu::VertexFormat::Sint32x2,
        Int32_3 => wgpu::VertexFormat::Sint32x3,
        Int32_4 => wgpu::VertexFormat::Sint32x4,
        Half16_1 => wgpu::VertexFormat::Float16,
        Half16_2 => wgpu::VertexFormat::Float16x2,
        Half16_4 => wgpu::VertexFormat::Float16x4,
        Float32_1 => wgpu::VertexFormat::Float32,
        Float32_2 => wgpu::VertexFormat::Float32x2,
        Float32_3 => wgpu::VertexFormat::Float32x3,
        Float32_4 => wgpu::VertexFormat::Float32x4,
        Uint8_1 => wgpu::VertexFormat::Uint8,
        Uint8_2 => wgpu::VertexFormat::Uint8x2,
        Uint8_4 => wgpu::VertexFormat::Uint8x4,
        Uint16_1 => wgpu::VertexFormat::Uint16,
        Uint16_2 => wgpu::VertexFormat::Uint16x2,
        Uint16_4 => wgpu::VertexFormat::Uint16x4,
        Uint32_1 => wgpu::VertexFormat::Uint32,
        Uint32_2 => wgpu::VertexFormat::Uint32x2,
        Uint32_3 => wgpu::VertexFormat::Uint32x3,
        Uint32_4 => wgpu::VertexFormat::Uint32x4,
        Int8_4Norm => wgpu::VertexFormat::Snorm8x4,
        Int16_2Norm => wgpu::VertexFormat::Snorm16x2,
        Int16_4Norm => wgpu::VertexFormat::Snorm16x4,
        Uint8_4Norm => wgpu::VertexFormat::Unorm8x4,
        Uint16_2Norm => wgpu::VertexFormat::Unorm16x2,
        Uint16_4Norm => wgpu::VertexFormat::Unorm16x4,
        Float64_1 => wgpu::VertexFormat::Float64,
        Float64_2 => wgpu::VertexFormat::Float64x2,
        Float64_3 => wgpu::VertexFormat::Float64x3,
        Float64_4 => wgpu::VertexFormat::Float64x4,
        Int8_3 | Int16_3 | Half16_3 | Uint8_3 | Uint16_3
        | Int1010102Norm
        | Uint64_1 | Uint64_2 | Uint64_3 | Uint64_4
        | Float32_2x2 | Float32_2x3 | Float32_2x4
        | Float32_3x2 | Float32_3x3 | Float32_3x4
        | Float32_4x2 | Float32_4x3 | Float32_4x4
        | Float64_2x2 | Float64_3x3 | Float64_4x4
        | Struct0 => return None,
    };
    Some(converted)
}

/// Per-location format and byte size of one matrix column
fn vertex_format_column(format: VertexFormat) -> Option<(wgpu::VertexFormat, u32)> {
    use VertexFormat::*;
    match format {
        Float32_2x2 | Float32_3x2 | Float32_4x2 => Some((wgpu::VertexFormat::Float32x2, 8)),
        Float32_2x3 | Float32_3x3 | Float32_4x3 => Some((wgpu::VertexFormat::Float32x3, 12)),
        Float32_2x4 | Float32_3x4 | Float32_4x4 => Some((wgpu::VertexFormat::Float32x4, 16)),
        Float64_2x2 => Some((wgpu::VertexFormat::Float64x2, 16)),
        Float64_3x3 => Some((wgpu::VertexFormat::Float64x3, 24)),
        Float64_4x4 => Some((wgpu::VertexFormat::Float64x4, 32)),
        other => vertex_format_to_wgpu(other).map(|f| (f, other.bytes())),
    }
}

/// Constant-step attributes have no wgpu step mode and read per instance
pub fn step_function_to_wgpu(step: StepFunction) -> wgpu::VertexStepMode {
    match step {
        StepFunction::Vertex => wgpu::VertexStepMode::Vertex,
        StepFunction::Instance | StepFunction::Constant => wgpu::VertexStepMode::Instance,
    }
}

/// Owned vertex buffer layout; borrow it with [`WgpuVertexLayout::as_wgpu`]
#[derive(Debug, Clone, PartialEq)]
pub struct WgpuVertexLayout {
    pub binding: u32,
    pub array_stride: u64,
    pub step_mode: wgpu::VertexStepMode,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

impl WgpuVertexLayout {
    pub fn as_wgpu(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: self.step_mode,
            attributes: &self.attributes,
        }
    }
}

/// Vertex buffer layouts of a complete vertex descriptor, one per binding
///
/// Matrix attributes expand into one attribute per column on consecutive
/// locations. Formats wgpu cannot express are a configuration error.
pub fn vertex_buffer_layouts(descriptor: &VertexDescriptor) -> Result<Vec<WgpuVertexLayout>> {
    let mut layouts: Vec<WgpuVertexLayout> = descriptor
        .layouts()
        .iter()
        .map(|layout| WgpuVertexLayout {
            binding: layout.binding,
            array_stride: u64::from(layout.stride),
            step_mode: step_function_to_wgpu(layout.step_function),
            attributes: Vec::new(),
        })
        .collect();

    for attribute in descriptor.attributes() {
        let (format, column_bytes) = vertex_format_column(attribute.format).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "Vertex format {:?} of {:?} has no wgpu equivalent", attribute.format, attribute.semantic))
        })?;
        let layout = layouts
            .iter_mut()
            .find(|layout| layout.binding == attribute.binding)
            .ok_or_else(|| Error::InvalidConfig(format!(
                "Attribute {:?} uses binding {} without layout", attribute.semantic, attribute.binding)))?;

        let columns = (attribute.format.bytes() / column_bytes.max(1)).max(1);
        let locations_per_column = (attribute.format.location_count() / columns).max(1);
        for column in 0..columns {
            layout.attributes.push(wgpu::VertexAttribute {
                format,
                offset: u64::from(attribute.offset + column * column_bytes),
                shader_location: attribute.location + column * locations_per_column,
            });
        }
    }

    Ok(layouts)
}

pub fn index_format_to_wgpu(index_type: IndexType) -> wgpu::IndexFormat {
    match index_type {
        IndexType::U16 => wgpu::IndexFormat::Uint16,
        IndexType::U32 => wgpu::IndexFormat::Uint32,
    }
}

// ============================================================================
// Attachment operations
// ============================================================================

pub fn clear_color(background: Vec4) -> wgpu::Color {
    wgpu::Color {
        r: f64::from(background.x),
        g: f64::from(background.y),
        b: f64::from(background.z),
        a: f64::from(background.w),
    }
}

/// `DontCare` clears: wgpu only leaves content undefined through `Clear`
pub fn load_op<V>(action: LoadAction, clear_value: V) -> wgpu::LoadOp<V> {
    match action {
        LoadAction::Load => wgpu::LoadOp::Load,
        LoadAction::Clear | LoadAction::DontCare => wgpu::LoadOp::Clear(clear_value),
    }
}

pub fn store_op(action: StoreAction) -> wgpu::StoreOp {
    match action {
        StoreAction::Store => wgpu::StoreOp::Store,
        StoreAction::Discard | StoreAction::DontCare => wgpu::StoreOp::Discard,
    }
}

pub fn has_stencil(format: TextureFormat) -> bool {
    matches!(format, TextureFormat::D24_UNORM_S8_UINT | TextureFormat::D32_FLOAT_S8_UINT)
}

// ============================================================================
// Bindings
// ============================================================================

pub fn stage_flags_to_wgpu(flags: ShaderStageFlags) -> wgpu::ShaderStages {
    let mut stages = wgpu::ShaderStages::empty();
    if flags.contains(ShaderStageFlags::VERTEX) { stages |= wgpu::ShaderStages::VERTEX; }
    if flags.contains(ShaderStageFlags::FRAGMENT) { stages |= wgpu::ShaderStages::FRAGMENT; }
    if flags.contains(ShaderStageFlags::COMPUTE) { stages |= wgpu::ShaderStages::COMPUTE; }
    stages
}

fn sampled_texture(filterable: bool) -> wgpu::BindingType {
    wgpu::BindingType::Texture {
        sample_type: wgpu::TextureSampleType::Float { filterable },
        view_dimension: wgpu::TextureViewDimension::D2,
        multisampled: false,
    }
}

/// Bind group layout entries of one descriptor binding
///
/// A combined image sampler yields a texture entry and a sampler entry, see
/// [`SAMPLER_BINDING_OFFSET`]. Input attachments are read with `textureLoad`
/// from a non-filterable texture.
pub fn layout_entries(binding: &DescriptorBinding) -> Vec<wgpu::BindGroupLayoutEntry> {
    let visibility = stage_flags_to_wgpu(binding.stage_flags);
    let count = if binding.count > 1 { NonZeroU32::new(binding.count) } else { None };
    let entry = |binding: u32, ty: wgpu::BindingType| wgpu::BindGroupLayoutEntry { binding, visibility, ty, count };

    match binding.binding_type {
        BindingType::UniformBuffer => vec![entry(binding.binding, wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        })],
        BindingType::StorageBuffer => vec![entry(binding.binding, wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: false },
            has_dynamic_offset: false,
            min_binding_size: None,
        })],
        BindingType::CombinedImageSampler => vec![
            entry(binding.binding, sampled_texture(true)),
            entry(
                binding.binding + SAMPLER_BINDING_OFFSET,
                wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            ),
        ],
        BindingType::InputAttachment => vec![entry(binding.binding, sampled_texture(false))],
    }
}

/// Sampler of one preset
///
/// Layout entries declare filtering samplers, so the shadow preset is a
/// linear clamp sampler on this backend.
pub fn sampler_descriptor(sampler_type: SamplerType) -> wgpu::SamplerDescriptor<'static> {
    let (filter, address) = match sampler_type {
        SamplerType::LinearRepeat | SamplerType::Anisotropic => (wgpu::FilterMode::Linear, wgpu::AddressMode::Repeat),
        SamplerType::LinearClamp | SamplerType::Shadow => (wgpu::FilterMode::Linear, wgpu::AddressMode::ClampToEdge),
        SamplerType::NearestRepeat => (wgpu::FilterMode::Nearest, wgpu::AddressMode::Repeat),
        SamplerType::NearestClamp => (wgpu::FilterMode::Nearest, wgpu::AddressMode::ClampToEdge),
    };
    let mipmap_filter = match filter {
        wgpu::FilterMode::Linear if sampler_type != SamplerType::Shadow => wgpu::MipmapFilterMode::Linear,
        _ => wgpu::MipmapFilterMode::Nearest,
    };

    wgpu::SamplerDescriptor {
        label: Some("ember sampler"),
        address_mode_u: address,
        address_mode_v: address,
        address_mode_w: address,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter,
        anisotropy_clamp: if sampler_type == SamplerType::Anisotropic { 16 } else { 1 },
        ..Default::default()
    }
}

#[cfg(test)]
#[path = "wgpu_format_tests.rs"]
mod tests;
