use super::*;
use crate::buffers::EXAMPLE_CONFIG;
use crate::types::Semantic;

#[test]
fn test_from_format_builds_current_pack() {
    let format = BuffersFormat::from_json(EXAMPLE_CONFIG).unwrap();
    let ctx = RhiContext::from_format(&format).unwrap();

    assert_eq!(ctx.buffers_pack().name(), "skinned");
    assert_eq!(ctx.buffers_pack().attribute_buffer_index(Semantic::VertexPosition), 0);
    assert_eq!(ctx.resources().texture_count(), 0);
}

#[test]
fn test_frame_counting() {
    let format = BuffersFormat::from_json(EXAMPLE_CONFIG).unwrap();
    let mut ctx = RhiContext::from_format(&format).unwrap();

    assert!(ctx.is_first_frame());
    assert_eq!(ctx.end_frame(), 1);
    assert!(!ctx.is_first_frame());
    assert_eq!(ctx.frame_number(), 1);
}
