//! Shared RHI enumerations
//!
//! Semantics, vertex formats, pass actions and texture formats consumed by
//! the buffer pack, the vertex descriptor builder and both pass compilers.

use serde::{Deserialize, Serialize};

// ============================================================================
// Buffer semantics
// ============================================================================

/// Logical data stream stored somewhere in the buffer pack
///
/// JSON names are the snake_case variant names, with slot numbers split
/// off (`vertex_texture_coord_0`). `vertex_weight` and
/// `vertex_bone_id` are accepted as aliases of the first weight/bone slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Semantic {
    VertexPosition,
    #[serde(rename = "vertex_texture_coord_0")]
    VertexTextureCoord0,
    #[serde(rename = "vertex_texture_coord_1")]
    VertexTextureCoord1,
    #[serde(rename = "vertex_texture_coord_2")]
    VertexTextureCoord2,
    VertexNormal,
    VertexBentNormal,
    VertexTangent,
    #[serde(rename = "vertex_color_0")]
    VertexColor0,
    #[serde(rename = "vertex_color_1")]
    VertexColor1,
    #[serde(rename = "vertex_bone_id_0", alias = "vertex_bone_id")]
    VertexBoneId0,
    #[serde(rename = "vertex_bone_id_1")]
    VertexBoneId1,
    #[serde(rename = "vertex_weight_0", alias = "vertex_weight")]
    VertexWeight0,
    #[serde(rename = "vertex_weight_1")]
    VertexWeight1,
    VertexMorphTarget,
    VertexMorphWeight,
    VertexIndex,
    InstanceTranslation,
    InstanceRotation,
    InstanceScale,
    InstanceTransform,
    MeshIndex,
    MeshletData,
    DrawcallData,
    TextureImageData,
    TextureSamplerData,
    TextureData,
    MaterialData,
    MeshData,
    SkinData,
    NodeData,
    NodeSuplementoryData,
    AnimationSamplerData,
    AnimationChannelData,
    AnimationInputData,
    AnimationOutputData,
    AnimationData,
    BoundingBoxData,
    IndexData,
    JointIndexData,
    InstanceTrs,
    #[serde(rename = "gltf_bin_buffer")]
    GltfBinBuffer,
    Custom,
}

impl Semantic {
    /// Every semantic known to the engine, in declaration order
    pub const ALL: [Semantic; 42] = [
        Semantic::VertexPosition,
        Semantic::VertexTextureCoord0,
        Semantic::VertexTextureCoord1,
        Semantic::VertexTextureCoord2,
        Semantic::VertexNormal,
        Semantic::VertexBentNormal,
        Semantic::VertexTangent,
        Semantic::VertexColor0,
        Semantic::VertexColor1,
        Semantic::VertexBoneId0,
        Semantic::VertexBoneId1,
        Semantic::VertexWeight0,
        Semantic::VertexWeight1,
        Semantic::VertexMorphTarget,
        Semantic::VertexMorphWeight,
        Semantic::VertexIndex,
        Semantic::InstanceTranslation,
        Semantic::InstanceRotation,
        Semantic::InstanceScale,
        Semantic::InstanceTransform,
        Semantic::MeshIndex,
        Semantic::MeshletData,
        Semantic::DrawcallData,
        Semantic::TextureImageData,
        Semantic::TextureSamplerData,
        Semantic::TextureData,
        Semantic::MaterialData,
        Semantic::MeshData,
        Semantic::SkinData,
        Semantic::NodeData,
        Semantic::NodeSuplementoryData,
        Semantic::AnimationSamplerData,
        Semantic::AnimationChannelData,
        Semantic::AnimationInputData,
        Semantic::AnimationOutputData,
        Semantic::AnimationData,
        Semantic::BoundingBoxData,
        Semantic::IndexData,
        Semantic::JointIndexData,
        Semantic::InstanceTrs,
        Semantic::GltfBinBuffer,
        Semantic::Custom,
    ];

    /// Dense index of this semantic within `Semantic::ALL`
    pub fn index(self) -> usize {
        self as usize
    }
}

// ============================================================================
// Vertex formats
// ============================================================================

/// Format of one vertex attribute element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexFormat {
    Int8_1, Int8_2, Int8_3, Int8_4,
    Int16_1, Int16_2, Int16_3, Int16_4,
    Int32_1, Int32_2, Int32_3, Int32_4,
    Half16_1, Half16_2, Half16_3, Half16_4,
    Float32_1, Float32_2, Float32_3, Float32_4,
    Uint8_1, Uint8_2, Uint8_3, Uint8_4,
    Uint16_1, Uint16_2, Uint16_3, Uint16_4,
    Uint32_1, Uint32_2, Uint32_3, Uint32_4,
    Int8_4Norm, Int16_2Norm, Int16_4Norm,
    Uint8_4Norm, Uint16_2Norm, Uint16_4Norm,
    Int1010102Norm,
    Uint64_1, Uint64_2, Uint64_3, Uint64_4,
    Float64_1, Float64_2, Float64_3, Float64_4,
    Float32_2x2, Float32_2x3, Float32_2x4,
    Float32_3x2, Float32_3x3, Float32_3x4,
    Float32_4x2, Float32_4x3, Float32_4x4,
    Float64_2x2, Float64_3x3, Float64_4x4,
    Struct0,
}

impl Default for VertexFormat {
    fn default() -> Self {
        VertexFormat::Float32_3
    }
}

impl VertexFormat {
    /// Size of one element in bytes
    pub fn bytes(self) -> u32 {
        use VertexFormat::*;
        match self {
            Struct0 => 0,
            Int8_1 | Uint8_1 => 1,
            Int8_2 | Uint8_2 | Int16_1 | Uint16_1 | Half16_1 => 2,
            Int8_3 | Uint8_3 => 3,
            Int8_4 | Uint8_4 | Int8_4Norm | Uint8_4Norm | Int16_2 | Uint16_2
            | Int16_2Norm | Uint16_2Norm | Int32_1 | Uint32_1 | Half16_2
            | Float32_1 | Int1010102Norm => 4,
            Int16_3 | Uint16_3 | Half16_3 => 6,
            Int16_4 | Uint16_4 | Int16_4Norm | Uint16_4Norm | Int32_2 | Uint32_2
            | Uint64_1 | Half16_4 | Float32_2 | Float64_1 => 8,
            Int32_3 | Uint32_3 | Float32_3 => 12,
            Int32_4 | Uint32_4 | Uint64_2 | Float32_4 | Float64_2 | Float32_2x2 => 16,
            Float64_3 | Uint64_3 | Float32_2x3 | Float32_3x2 => 24,
            Float64_4 | Uint64_4 | Float32_2x4 | Float32_4x2 | Float64_2x2 => 32,
            Float32_3x3 => 36,
            Float32_3x4 | Float32_4x3 => 48,
            Float32_4x4 => 64,
            Float64_3x3 => 72,
            Float64_4x4 => 128,
        }
    }

    /// Number of shader input locations one element consumes
    pub fn location_count(self) -> u32 {
        use VertexFormat::*;
        match self {
            Uint64_3 | Uint64_4 | Float64_3 | Float64_4
            | Float32_2x2 | Float32_2x3 | Float32_2x4 => 2,
            Float32_3x2 | Float32_3x3 | Float32_3x4 => 3,
            Float32_4x2 | Float32_4x3 | Float32_4x4 => 4,
            Float64_2x2 | Float64_3x3 | Float64_4x4 => 8,
            _ => 1,
        }
    }
}

/// How often a vertex attribute advances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepFunction {
    #[default]
    Vertex,
    Instance,
    Constant,
}

/// Pack a step rate and a stride multiplier into one value
///
/// The rate sits in the low 16 bits and the multiplier in the high 16 bits.
pub fn make_rate_multiplier(rate: u32, multiplier: u32) -> u32 {
    debug_assert!(rate <= 0xFFFF && multiplier <= 0xFFFF, "rate and multiplier must fit in 16 bits");
    (rate & 0xFFFF) | ((multiplier & 0xFFFF) << 16)
}

/// Split a packed rate into `(rate, multiplier)`, the multiplier being at least 1
pub fn split_rate_multiplier(packed: u32) -> (u32, u32) {
    (packed & 0xFFFF, (packed >> 16).max(1))
}

// ============================================================================
// Render pass enums
// ============================================================================

/// What happens to an attachment's content when a pass begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadAction {
    Load,
    #[default]
    Clear,
    DontCare,
}

/// What happens to an attachment's content when a pass ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StoreAction {
    #[default]
    Store,
    Discard,
    DontCare,
}

/// Pipeline kind a subpass runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderpassTechnique {
    #[default]
    Fragment,
    Compute,
}

/// Whether a subpass re-executes every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderpassState {
    /// Executes on the first frame and after each invalidation
    Transient,
    /// Executes every frame
    #[default]
    Persistent,
}

/// Role of a subpass in the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderpassType {
    Lut,
    #[default]
    Main,
    Depth,
    Shadow,
    LightBin,
    Reflection,
    Refraction,
    PreProcess,
    PostProcess,
    ToneMapping,
    ForwardLight,
    NodeTransform,
    DeferredGbuffer,
    ReflectionProbes,
    ImageBasedLight,
    AmbientOcclusion,
    SkeletalTransform,
    DeferredClustered,
    ImageBasedLightLut,
}

/// Role of a render target within its pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTargetType {
    Color,
    Depth,
    Resolve,
}

// ============================================================================
// Texture formats
// ============================================================================

/// Pixel format of a texture used as a render target or sampled input
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    R16G16B16A16_SFLOAT,
    R32_SFLOAT,
    R32G32B32A32_SFLOAT,
    D16_UNORM,
    D32_FLOAT,
    D24_UNORM_S8_UINT,
    D32_FLOAT_S8_UINT,
}

impl TextureFormat {
    /// True for formats bound as depth/stencil attachments
    pub fn is_depth_format(self) -> bool {
        matches!(
            self,
            TextureFormat::D16_UNORM
                | TextureFormat::D32_FLOAT
                | TextureFormat::D24_UNORM_S8_UINT
                | TextureFormat::D32_FLOAT_S8_UINT
        )
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
