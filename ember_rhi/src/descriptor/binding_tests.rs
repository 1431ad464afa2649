use super::*;
use slotmap::SlotMap;
use crate::error::Error;

fn ids() -> (BufferId, TextureId) {
    let mut buffers: SlotMap<BufferId, ()> = SlotMap::with_key();
    let mut textures: SlotMap<TextureId, ()> = SlotMap::with_key();
    (buffers.insert(()), textures.insert(()))
}

#[test]
fn test_shader_stage_flags_combinations() {
    assert_eq!(ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT, ShaderStageFlags::VERTEX_FRAGMENT);
    assert!(ShaderStageFlags::ALL.contains(ShaderStageFlags::COMPUTE));
    assert!(!ShaderStageFlags::VERTEX_FRAGMENT.contains(ShaderStageFlags::COMPUTE));
}

#[test]
fn test_push_buffer_and_image_keep_bindings_and_writes_paired() {
    let (buffer, texture) = ids();
    let mut set = DescriptorSet::new(3);
    set.push_buffer(0, buffer, BindingType::UniformBuffer, ShaderStageFlags::FRAGMENT);
    set.push_image(1, texture, SamplerType::LinearRepeat, ShaderStageFlags::FRAGMENT);

    assert_eq!(set.set_index(), 3);
    assert_eq!(set.bindings().len(), 2);
    assert_eq!(set.writes().len(), 2);
    assert_eq!(set.bindings()[1].binding_type, BindingType::CombinedImageSampler);
    assert_eq!(set.next_binding(), 2);
    assert!(set.validate().is_ok());
}

#[test]
fn test_binding_without_write_fails_validation() {
    let mut set = DescriptorSet::new(0);
    set.push_binding(0, BindingType::UniformBuffer, ShaderStageFlags::VERTEX);
    assert!(matches!(set.validate(), Err(Error::ContractViolation(_))));
}

#[test]
fn test_write_type_mismatch_fails_validation() {
    let (buffer, _) = ids();
    let mut set = DescriptorSet::new(0);
    set.push_binding(0, BindingType::UniformBuffer, ShaderStageFlags::VERTEX);
    set.push_write(0, BindingType::StorageBuffer, DescriptorResource::Buffer { buffer, offset: 0, range: 16 });
    assert!(set.validate().is_err());
}

#[test]
fn test_binding_equality_includes_stage_mask() {
    let a = DescriptorBinding {
        binding: 0,
        binding_type: BindingType::UniformBuffer,
        count: 1,
        stage_flags: ShaderStageFlags::VERTEX,
    };
    let b = DescriptorBinding { stage_flags: ShaderStageFlags::VERTEX_FRAGMENT, ..a };
    assert_ne!(a, b);
    assert_eq!(a, DescriptorBinding { ..a });
}
