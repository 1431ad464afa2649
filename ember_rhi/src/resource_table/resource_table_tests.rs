use super::*;

fn color_desc(name: &str) -> TextureDesc {
    TextureDesc {
        name: name.to_string(),
        width: 1024,
        height: 768,
        format: TextureFormat::R8G8B8A8_UNORM,
        usage: TextureUsage::RenderTarget,
    }
}

#[test]
fn test_create_and_get_texture() {
    let mut table = ResourceTable::new();
    let id = table.create_texture(color_desc("albedo")).unwrap();
    assert_eq!(table.texture(id).unwrap().name, "albedo");
    assert_eq!(table.texture_count(), 1);
}

#[test]
fn test_zero_extent_texture_rejected() {
    let mut table = ResourceTable::new();
    let mut desc = color_desc("bad");
    desc.height = 0;
    assert!(matches!(table.create_texture(desc), Err(Error::InvalidResource(_))));
}

#[test]
fn test_removed_texture_id_is_stale() {
    let mut table = ResourceTable::new();
    let id = table.create_texture(color_desc("tmp")).unwrap();
    table.remove_texture(id);
    assert!(table.texture(id).is_none());
    assert!(table.require_texture(id).is_err());

    // a new texture never reuses the stale key
    let other = table.create_texture(color_desc("tmp2")).unwrap();
    assert_ne!(id, other);
}

#[test]
fn test_create_buffer() {
    let mut table = ResourceTable::new();
    let id = table.create_buffer(GpuBufferDesc {
        name: "per_frame".to_string(),
        size: 256,
        usage: GpuBufferUsage::Uniform,
    }).unwrap();
    assert_eq!(table.require_buffer(id).unwrap().size, 256);
    assert!(table.create_buffer(GpuBufferDesc {
        name: "empty".to_string(),
        size: 0,
        usage: GpuBufferUsage::Storage,
    }).is_err());
}

#[test]
fn test_create_frame_buffers_one_per_slot() {
    let mut table = ResourceTable::new();
    let ids = table.create_frame_buffers(GpuBufferDesc {
        name: "per_frame".to_string(),
        size: 256,
        usage: GpuBufferUsage::Uniform,
    }).unwrap();

    assert_eq!(table.buffer_count(), 3);
    assert_ne!(ids[0], ids[1]);
    assert_ne!(ids[1], ids[2]);
    assert_eq!(table.require_buffer(ids[2]).unwrap().name, "per_frame#2");
    assert_eq!(table.require_buffer(ids[0]).unwrap().size, 256);

    assert!(table.create_frame_buffers(GpuBufferDesc {
        name: "empty".to_string(),
        size: 0,
        usage: GpuBufferUsage::Uniform,
    }).is_err());
    assert_eq!(table.buffer_count(), 3);
}
