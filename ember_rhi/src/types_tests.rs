use super::*;

// ============================================================================
// Tests: Semantic
// ============================================================================

#[test]
fn test_semantic_all_is_dense_and_ordered() {
    for (i, semantic) in Semantic::ALL.iter().enumerate() {
        assert_eq!(semantic.index(), i);
    }
}

#[test]
fn test_semantic_json_names() {
    let s: Semantic = serde_json::from_str("\"vertex_texture_coord_0\"").unwrap();
    assert_eq!(s, Semantic::VertexTextureCoord0);
    let s: Semantic = serde_json::from_str("\"instance_trs\"").unwrap();
    assert_eq!(s, Semantic::InstanceTrs);
}

#[test]
fn test_semantic_json_aliases() {
    let w: Semantic = serde_json::from_str("\"vertex_weight\"").unwrap();
    let b: Semantic = serde_json::from_str("\"vertex_bone_id\"").unwrap();
    assert_eq!(w, Semantic::VertexWeight0);
    assert_eq!(b, Semantic::VertexBoneId0);
}

// ============================================================================
// Tests: VertexFormat
// ============================================================================

#[test]
fn test_vertex_format_default_is_float3() {
    assert_eq!(VertexFormat::default(), VertexFormat::Float32_3);
    assert_eq!(VertexFormat::default().bytes(), 12);
}

#[test]
fn test_vertex_format_bytes() {
    assert_eq!(VertexFormat::Uint8_1.bytes(), 1);
    assert_eq!(VertexFormat::Half16_3.bytes(), 6);
    assert_eq!(VertexFormat::Float32_4.bytes(), 16);
    assert_eq!(VertexFormat::Float32_3x3.bytes(), 36);
    assert_eq!(VertexFormat::Float32_4x4.bytes(), 64);
    assert_eq!(VertexFormat::Float64_4x4.bytes(), 128);
}

#[test]
fn test_vertex_format_location_count() {
    assert_eq!(VertexFormat::Float32_4.location_count(), 1);
    assert_eq!(VertexFormat::Float64_4.location_count(), 2);
    assert_eq!(VertexFormat::Float32_3x3.location_count(), 3);
    assert_eq!(VertexFormat::Float32_4x4.location_count(), 4);
}

// ============================================================================
// Tests: rate multiplier
// ============================================================================

#[test]
fn test_rate_multiplier_packing() {
    let packed = make_rate_multiplier(1, 4);
    assert_eq!(packed, 1 | (4 << 16));
    assert_eq!(split_rate_multiplier(packed), (1, 4));
}

#[test]
fn test_rate_without_multiplier_defaults_to_one() {
    assert_eq!(split_rate_multiplier(3), (3, 1));
}

// ============================================================================
// Tests: TextureFormat
// ============================================================================

#[test]
fn test_depth_formats() {
    assert!(TextureFormat::D32_FLOAT.is_depth_format());
    assert!(TextureFormat::D24_UNORM_S8_UINT.is_depth_format());
    assert!(!TextureFormat::R8G8B8A8_SRGB.is_depth_format());
    assert!(!TextureFormat::R16G16B16A16_SFLOAT.is_depth_format());
}
