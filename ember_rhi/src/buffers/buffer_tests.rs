use super::*;

fn local_buffer() -> Buffer {
    let mut buffer = Buffer::new(1024, false, 256);
    buffer.emplace_semantic(Semantic::VertexPosition, 512);
    buffer.emplace_semantic(Semantic::VertexNormal, 256);
    buffer.emplace_semantic(Semantic::VertexTangent, 256);
    buffer
}

// ============================================================================
// Tests: align8
// ============================================================================

#[test]
fn test_align8() {
    assert_eq!(align8(0), 0);
    assert_eq!(align8(1), 8);
    assert_eq!(align8(8), 8);
    assert_eq!(align8(13), 16);
}

// ============================================================================
// Tests: Local buffers
// ============================================================================

#[test]
fn test_local_sub_ranges_are_contiguous() {
    let buffer = local_buffer();
    assert_eq!(buffer.semantic_range(Semantic::VertexPosition), Some((0, 512)));
    assert_eq!(buffer.semantic_range(Semantic::VertexNormal), Some((512, 256)));
    assert_eq!(buffer.semantic_range(Semantic::VertexTangent), Some((768, 256)));
}

#[test]
fn test_local_offsets_bump_within_sub_range() {
    let buffer = local_buffer();
    assert_eq!(buffer.offset(Semantic::VertexNormal, 12).unwrap(), 512);
    assert_eq!(buffer.offset(Semantic::VertexNormal, 12).unwrap(), 512 + 16);
    assert_eq!(buffer.offset(Semantic::VertexPosition, 36).unwrap(), 0);
    assert_eq!(buffer.offset(Semantic::VertexPosition, 4).unwrap(), 40);
}

#[test]
fn test_local_sub_range_overflow_is_out_of_memory() {
    let buffer = local_buffer();
    assert!(buffer.offset(Semantic::VertexTangent, 256).is_ok());
    assert_eq!(buffer.offset(Semantic::VertexTangent, 1), Err(Error::OutOfMemory));
    assert_eq!(buffer.size().unwrap(), 1024);
}

#[test]
fn test_local_unknown_semantic_is_invalid() {
    let buffer = local_buffer();
    assert!(matches!(
        buffer.offset(Semantic::VertexColor0, 4),
        Err(Error::InvalidResource(_))
    ));
}

// ============================================================================
// Tests: Interleaved buffers
// ============================================================================

#[test]
fn test_interleaved_offsets_share_one_cursor() {
    let mut buffer = Buffer::new(256, true, 64);
    buffer.emplace_semantic(Semantic::VertexNormal, 128);
    buffer.emplace_semantic(Semantic::VertexTangent, 128);

    assert_eq!(buffer.offset(Semantic::VertexNormal, 20).unwrap(), 0);
    assert_eq!(buffer.offset(Semantic::VertexTangent, 20).unwrap(), 24);
    assert_eq!(buffer.filled().unwrap(), 48);
    assert_eq!(buffer.semantic_range(Semantic::VertexNormal), None);
}

#[test]
fn test_interleaved_grows_when_full() {
    let buffer = Buffer::new(64, true, 32);
    assert_eq!(buffer.offset(Semantic::VertexNormal, 64).unwrap(), 0);
    assert_eq!(buffer.offset(Semantic::VertexNormal, 8).unwrap(), 64);
    assert_eq!(buffer.size().unwrap(), 96);
}

#[test]
fn test_interleaved_grows_by_request_when_larger_than_increment() {
    let buffer = Buffer::new(16, true, 8);
    assert_eq!(buffer.offset(Semantic::VertexNormal, 100).unwrap(), 0);
    assert_eq!(buffer.size().unwrap(), 100);
}

#[test]
fn test_interleaved_growth_covers_aligned_cursor() {
    let buffer = Buffer::new(10, true, 8);
    assert_eq!(buffer.offset(Semantic::VertexNormal, 10).unwrap(), 0);
    assert_eq!(buffer.offset(Semantic::VertexNormal, 70).unwrap(), 16);
    assert_eq!(buffer.size().unwrap(), 86);
    assert!(buffer.upload(16, &[1u8; 70]).is_ok());
}

#[test]
fn test_zero_byte_request_is_rejected() {
    let buffer = Buffer::new(16, true, 8);
    assert!(buffer.offset(Semantic::VertexNormal, 0).is_err());
}

// ============================================================================
// Tests: Upload
// ============================================================================

#[test]
fn test_upload_and_read_back() {
    let buffer = Buffer::new(16, true, 8);
    buffer.upload_pod(4, &[1.0f32, 2.0]).unwrap();
    let read = buffer.with_data(|d| d[4..12].to_vec()).unwrap();
    let mut expected = 1.0f32.to_ne_bytes().to_vec();
    expected.extend_from_slice(&2.0f32.to_ne_bytes());
    assert_eq!(read, expected);
}

#[test]
fn test_upload_overflow_is_error() {
    let buffer = Buffer::new(8, true, 8);
    assert!(buffer.upload(4, &[0u8; 8]).is_err());
}

#[test]
fn test_concurrent_offsets_never_overlap() {
    use std::sync::Arc;
    let buffer = Arc::new(Buffer::new(4096, true, 4096));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let buffer = buffer.clone();
            std::thread::spawn(move || {
                (0..32).map(|_| buffer.offset(Semantic::VertexNormal, 8).unwrap()).collect::<Vec<_>>()
            })
        })
        .collect();

    let mut offsets: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
    offsets.sort_unstable();
    offsets.dedup();
    assert_eq!(offsets.len(), 128);
}
