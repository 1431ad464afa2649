//! Unit tests for wgpu conversion functions
//!
//! Pure mappings, no GPU required.

use super::*;
use ember_rhi::buffers::{BuffersFormat, BuffersPack};
use ember_rhi::types::Semantic;
use ember_rhi::vertex::VertexInput;

const PACK_CONFIG: &str = r#"{
    "buffer_pack_current": "static",
    "buffer_packs": [
        {
            "name": "static",
            "buffers": [
                { "size": 64, "semantic": [ { "vertex_position": 64 } ] },
                { "size": 64, "interleaved": "global",
                  "semantic": [ { "vertex_normal": 32 }, { "vertex_texture_coord_0": 32 } ] },
                { "size": 256 }
            ]
        }
    ]
}"#;

fn pack() -> BuffersPack {
    BuffersPack::new(&BuffersFormat::from_json(PACK_CONFIG).unwrap()).unwrap()
}

// ============================================================================
// TEXTURE TESTS
// ============================================================================

#[test]
fn test_texture_formats() {
    assert_eq!(texture_format_to_wgpu(TextureFormat::R8G8B8A8_SRGB), wgpu::TextureFormat::Rgba8UnormSrgb);
    assert_eq!(texture_format_to_wgpu(TextureFormat::B8G8R8A8_UNORM), wgpu::TextureFormat::Bgra8Unorm);
    assert_eq!(texture_format_to_wgpu(TextureFormat::D32_FLOAT), wgpu::TextureFormat::Depth32Float);
    assert_eq!(texture_format_to_wgpu(TextureFormat::D24_UNORM_S8_UINT), wgpu::TextureFormat::Depth24PlusStencil8);
}

#[test]
fn test_render_targets_are_attachments_and_sampleable() {
    let usage = texture_usage_to_wgpu(TextureUsage::RenderTarget);
    assert!(usage.contains(wgpu::TextureUsages::RENDER_ATTACHMENT));
    assert!(usage.contains(wgpu::TextureUsages::TEXTURE_BINDING));
    assert!(!texture_usage_to_wgpu(TextureUsage::Sampled).contains(wgpu::TextureUsages::RENDER_ATTACHMENT));
}

#[test]
fn test_buffers_accept_queue_writes() {
    for usage in [GpuBufferUsage::Uniform, GpuBufferUsage::Storage, GpuBufferUsage::Vertex, GpuBufferUsage::Index] {
        assert!(buffer_usage_to_wgpu(usage).contains(wgpu::BufferUsages::COPY_DST));
    }
}

// ============================================================================
// VERTEX TESTS
// ============================================================================

#[test]
fn test_vertex_formats() {
    assert_eq!(vertex_format_to_wgpu(VertexFormat::Float32_3), Some(wgpu::VertexFormat::Float32x3));
    assert_eq!(vertex_format_to_wgpu(VertexFormat::Uint8_4Norm), Some(wgpu::VertexFormat::Unorm8x4));
    assert_eq!(vertex_format_to_wgpu(VertexFormat::Half16_2), Some(wgpu::VertexFormat::Float16x2));
}

#[test]
fn test_vertex_formats_without_equivalent() {
    assert_eq!(vertex_format_to_wgpu(VertexFormat::Uint8_3), None);
    assert_eq!(vertex_format_to_wgpu(VertexFormat::Uint64_1), None);
    assert_eq!(vertex_format_to_wgpu(VertexFormat::Float32_4x4), None);
}

#[test]
fn test_step_functions() {
    assert_eq!(step_function_to_wgpu(StepFunction::Vertex), wgpu::VertexStepMode::Vertex);
    assert_eq!(step_function_to_wgpu(StepFunction::Constant), wgpu::VertexStepMode::Instance);
}

#[test]
fn test_vertex_buffer_layouts() {
    let pack = pack();
    let descriptor = VertexDescriptor::new([
        (Semantic::VertexPosition, VertexFormat::Float32_3),
        (Semantic::VertexNormal, VertexFormat::Float32_3),
        (Semantic::VertexTextureCoord0, VertexFormat::Float32_2),
    ], &pack).unwrap();

    let layouts = vertex_buffer_layouts(&descriptor).unwrap();

    assert_eq!(layouts.len(), 3);
    assert_eq!(layouts[0].array_stride, 12);
    assert_eq!(layouts[2].array_stride, 20);
    let uv = layouts.iter().flat_map(|l| &l.attributes).find(|a| a.shader_location == 2).unwrap();
    assert_eq!(uv.format, wgpu::VertexFormat::Float32x2);
    assert_eq!(uv.offset, 12);
    assert_eq!(layouts[0].as_wgpu().attributes.len(), 1);
}

#[test]
fn test_matrix_attribute_expands_per_column() {
    let pack = pack();
    let descriptor = VertexDescriptor::new([
        VertexInput::new(Semantic::VertexPosition),
        VertexInput::new(Semantic::InstanceTransform)
            .with_format(VertexFormat::Float32_4x4)
            .with_step_function(StepFunction::Instance),
    ], &pack).unwrap();

    let layouts = vertex_buffer_layouts(&descriptor).unwrap();

    assert_eq!(layouts[1].step_mode, wgpu::VertexStepMode::Instance);
    let columns: Vec<(u32, u64)> = layouts[1].attributes.iter().map(|a| (a.shader_location, a.offset)).collect();
    assert_eq!(columns, vec![(1, 0), (2, 16), (3, 32), (4, 48)]);
}

#[test]
fn test_unsupported_vertex_format_is_a_config_error() {
    let pack = pack();
    let descriptor = VertexDescriptor::new([
        (Semantic::VertexPosition, VertexFormat::Uint16_3),
    ], &pack).unwrap();

    assert!(matches!(vertex_buffer_layouts(&descriptor), Err(Error::InvalidConfig(_))));
}

// ============================================================================
// ATTACHMENT TESTS
// ============================================================================

#[test]
fn test_dont_care_load_clears() {
    assert_eq!(load_op(LoadAction::Load, 1.0f32), wgpu::LoadOp::Load);
    assert_eq!(load_op(LoadAction::Clear, 1.0f32), wgpu::LoadOp::Clear(1.0));
    assert_eq!(load_op(LoadAction::DontCare, 0.5f32), wgpu::LoadOp::Clear(0.5));
}

#[test]
fn test_discard_and_dont_care_store_nothing() {
    assert_eq!(store_op(StoreAction::Store), wgpu::StoreOp::Store);
    assert_eq!(store_op(StoreAction::Discard), wgpu::StoreOp::Discard);
    assert_eq!(store_op(StoreAction::DontCare), wgpu::StoreOp::Discard);
}

#[test]
fn test_clear_color() {
    let color = clear_color(Vec4::new(0.25, 0.5, 0.75, 1.0));
    assert_eq!(color, wgpu::Color { r: 0.25, g: 0.5, b: 0.75, a: 1.0 });
}

// ============================================================================
// BINDING TESTS
// ============================================================================

fn binding(binding_type: BindingType) -> DescriptorBinding {
    DescriptorBinding { binding: 2, binding_type, count: 1, stage_flags: ShaderStageFlags::FRAGMENT }
}

#[test]
fn test_stage_flags() {
    assert_eq!(stage_flags_to_wgpu(ShaderStageFlags::VERTEX_FRAGMENT),
        wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT);
    assert_eq!(stage_flags_to_wgpu(ShaderStageFlags::COMPUTE), wgpu::ShaderStages::COMPUTE);
}

#[test]
fn test_buffer_layout_entries() {
    let uniform = layout_entries(&binding(BindingType::UniformBuffer));
    assert_eq!(uniform.len(), 1);
    assert!(matches!(uniform[0].ty,
        wgpu::BindingType::Buffer { ty: wgpu::BufferBindingType::Uniform, .. }));

    let storage = layout_entries(&binding(BindingType::StorageBuffer));
    assert!(matches!(storage[0].ty,
        wgpu::BindingType::Buffer { ty: wgpu::BufferBindingType::Storage { read_only: false }, .. }));
}

#[test]
fn test_combined_image_sampler_splits() {
    let entries = layout_entries(&binding(BindingType::CombinedImageSampler));

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].binding, 2);
    assert!(matches!(entries[0].ty, wgpu::BindingType::Texture { .. }));
    assert_eq!(entries[1].binding, 2 + SAMPLER_BINDING_OFFSET);
    assert!(matches!(entries[1].ty, wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)));
    assert_eq!(entries[1].visibility, wgpu::ShaderStages::FRAGMENT);
}

#[test]
fn test_input_attachment_is_unfiltered_texture() {
    let entries = layout_entries(&binding(BindingType::InputAttachment));
    assert!(matches!(entries[0].ty, wgpu::BindingType::Texture {
        sample_type: wgpu::TextureSampleType::Float { filterable: false }, .. }));
}

#[test]
fn test_arrays_carry_count() {
    let mut array = binding(BindingType::UniformBuffer);
    array.count = 4;
    assert_eq!(layout_entries(&array)[0].count, NonZeroU32::new(4));
    assert_eq!(layout_entries(&binding(BindingType::UniformBuffer))[0].count, None);
}

// ============================================================================
// SAMPLER TESTS
// ============================================================================

#[test]
fn test_sampler_presets() {
    let nearest = sampler_descriptor(SamplerType::NearestClamp);
    assert_eq!(nearest.mag_filter, wgpu::FilterMode::Nearest);
    assert_eq!(nearest.address_mode_u, wgpu::AddressMode::ClampToEdge);

    let anisotropic = sampler_descriptor(SamplerType::Anisotropic);
    assert_eq!(anisotropic.anisotropy_clamp, 16);
    assert_eq!(anisotropic.address_mode_v, wgpu::AddressMode::Repeat);

    let shadow = sampler_descriptor(SamplerType::Shadow);
    assert_eq!(shadow.compare, None);
    assert_eq!(shadow.mipmap_filter, wgpu::MipmapFilterMode::Nearest);
}
