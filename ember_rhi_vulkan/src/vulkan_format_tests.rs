//! Unit tests for Vulkan format conversion functions
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
// TEXTURE FORMAT TESTS
// ============================================================================

#[test]
fn test_color_formats() {
    assert_eq!(texture_format_to_vk(TextureFormat::R8G8B8A8_UNORM), vk::Format::R8G8B8A8_UNORM);
    assert_eq!(texture_format_to_vk(TextureFormat::B8G8R8A8_SRGB), vk::Format::B8G8R8A8_SRGB);
    assert_eq!(texture_format_to_vk(TextureFormat::R16G16B16A16_SFLOAT), vk::Format::R16G16B16A16_SFLOAT);
}

#[test]
fn test_depth_formats() {
    assert_eq!(texture_format_to_vk(TextureFormat::D32_FLOAT), vk::Format::D32_SFLOAT);
    assert_eq!(texture_format_to_vk(TextureFormat::D24_UNORM_S8_UINT), vk::Format::D24_UNORM_S8_UINT);
    assert_eq!(texture_format_to_vk(TextureFormat::D32_FLOAT_S8_UINT), vk::Format::D32_SFLOAT_S8_UINT);
}

// ============================================================================
// VERTEX FORMAT TESTS
// ============================================================================

#[test]
fn test_vertex_scalar_formats() {
    assert_eq!(vertex_format_to_vk(VertexFormat::Float32_3), vk::Format::R32G32B32_SFLOAT);
    assert_eq!(vertex_format_to_vk(VertexFormat::Uint16_4), vk::Format::R16G16B16A16_UINT);
    assert_eq!(vertex_format_to_vk(VertexFormat::Uint8_4Norm), vk::Format::R8G8B8A8_UNORM);
    assert_eq!(vertex_format_to_vk(VertexFormat::Int1010102Norm), vk::Format::A2B10G10R10_SNORM_PACK32);
}

#[test]
fn test_matrix_formats_have_no_single_format() {
    assert_eq!(vertex_format_to_vk(VertexFormat::Float32_4x4), vk::Format::UNDEFINED);
    assert_eq!(vertex_format_column(VertexFormat::Float32_4x4), (vk::Format::R32G32B32A32_SFLOAT, 16));
    assert_eq!(vertex_format_column(VertexFormat::Float32_3x3), (vk::Format::R32G32B32_SFLOAT, 12));
}

#[test]
fn test_step_functions() {
    assert_eq!(step_function_to_vk(StepFunction::Vertex), vk::VertexInputRate::VERTEX);
    assert_eq!(step_function_to_vk(StepFunction::Instance), vk::VertexInputRate::INSTANCE);
    assert_eq!(step_function_to_vk(StepFunction::Constant), vk::VertexInputRate::INSTANCE);
}

// ============================================================================
// PASS ACTION TESTS
// ============================================================================

#[test]
fn test_load_actions() {
    assert_eq!(load_action_to_vk(LoadAction::Clear), vk::AttachmentLoadOp::CLEAR);
    assert_eq!(load_action_to_vk(LoadAction::Load), vk::AttachmentLoadOp::LOAD);
    assert_eq!(load_action_to_vk(LoadAction::DontCare), vk::AttachmentLoadOp::DONT_CARE);
}

#[test]
fn test_discard_and_dont_care_store_nothing() {
    assert_eq!(store_action_to_vk(StoreAction::Store), vk::AttachmentStoreOp::STORE);
    assert_eq!(store_action_to_vk(StoreAction::Discard), vk::AttachmentStoreOp::DONT_CARE);
    assert_eq!(store_action_to_vk(StoreAction::DontCare), vk::AttachmentStoreOp::DONT_CARE);
}

// ============================================================================
// DESCRIPTOR TESTS
// ============================================================================

#[test]
fn test_binding_types() {
    assert_eq!(binding_type_to_vk(BindingType::UniformBuffer), vk::DescriptorType::UNIFORM_BUFFER);
    assert_eq!(binding_type_to_vk(BindingType::StorageBuffer), vk::DescriptorType::STORAGE_BUFFER);
    assert_eq!(binding_type_to_vk(BindingType::CombinedImageSampler), vk::DescriptorType::COMBINED_IMAGE_SAMPLER);
    assert_eq!(binding_type_to_vk(BindingType::InputAttachment), vk::DescriptorType::INPUT_ATTACHMENT);
}

#[test]
fn test_stage_flags() {
    assert_eq!(stage_flags_to_vk(ShaderStageFlags::VERTEX_FRAGMENT),
        vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT);
    assert_eq!(stage_flags_to_vk(ShaderStageFlags::COMPUTE), vk::ShaderStageFlags::COMPUTE);
    assert_eq!(stage_flags_to_vk(ShaderStageFlags::empty()), vk::ShaderStageFlags::empty());
}

#[test]
fn test_index_types() {
    assert_eq!(index_type_to_vk(IndexType::U16), vk::IndexType::UINT16);
    assert_eq!(index_type_to_vk(IndexType::U32), vk::IndexType::UINT32);
}

// ============================================================================
// VERTEX INPUT TESTS
// ============================================================================

#[test]
fn test_vertex_input_descriptions() {
    let pack = pack();
    let descriptor = VertexDescriptor::new([
        (Semantic::VertexPosition, VertexFormat::Float32_3),
        (Semantic::VertexNormal, VertexFormat::Float32_3),
        (Semantic::VertexTextureCoord0, VertexFormat::Float32_2),
    ], &pack).unwrap();

    let (bindings, attributes) = vertex_input_descriptions(&descriptor);

    assert_eq!(bindings.len(), 3);
    assert_eq!(bindings[0].stride, 12);
    assert_eq!(bindings[1].stride, 20);
    assert_eq!(bindings[2].stride, 20);
    assert!(bindings.iter().all(|b| b.input_rate == vk::VertexInputRate::VERTEX));

    let uv = attributes.iter().find(|a| a.location == 2).unwrap();
    assert_eq!(uv.format, vk::Format::R32G32_SFLOAT);
    assert_eq!(uv.offset, 12);
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

    let (bindings, attributes) = vertex_input_descriptions(&descriptor);

    assert_eq!(bindings[1].input_rate, vk::VertexInputRate::INSTANCE);
    let columns: Vec<(u32, u32)> = attributes.iter()
        .filter(|a| a.binding == 1)
        .map(|a| (a.location, a.offset))
        .collect();
    assert_eq!(columns, vec![(1, 0), (2, 16), (3, 32), (4, 48)]);
}
