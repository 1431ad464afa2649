use super::*;
use crate::buffers::EXAMPLE_CONFIG;


// ============================================================================
// Tests: Parsing
// ============================================================================

#[test]
fn test_example_pack_sizes_and_shares() {
    let format = BuffersFormat::from_json(EXAMPLE_CONFIG).unwrap();
    let pack = format.current_pack();
    assert_eq!(pack.name, "skinned");

    let b0 = &pack.buffers[0];
    assert_eq!(b0.size, 150 * 1024);
    assert!(!b0.interleaved);
    assert_eq!(b0.semantics, vec![
        (Semantic::VertexPosition, 100 * 1024),
        (Semantic::VertexWeight0, 25 * 1024),
        (Semantic::VertexBoneId0, 25 * 1024),
    ]);

    let b1 = &pack.buffers[1];
    assert_eq!(b1.size, 200 * 1024);
    assert!(b1.interleaved);
    assert_eq!(b1.semantics.len(), 3);
}

#[test]
fn test_catch_all_splits_evenly() {
    let format = BuffersFormat::from_json(EXAMPLE_CONFIG).unwrap();
    let catch_all = &format.current_pack().buffers[2];

    let remaining = Semantic::ALL.len() - 6;
    assert_eq!(catch_all.semantics.len(), remaining);
    let expected = (390 * 1024) / remaining as u64;
    assert!(catch_all.semantics.iter().all(|(_, bytes)| *bytes == expected));
}

#[test]
fn test_every_semantic_assigned_exactly_once() {
    let format = BuffersFormat::from_json(EXAMPLE_CONFIG).unwrap();
    let mut seen = vec![0u32; Semantic::ALL.len()];
    for buffer in &format.current_pack().buffers {
        for (semantic, _) in &buffer.semantics {
            seen[semantic.index()] += 1;
        }
    }
    assert!(seen.iter().all(|count| *count == 1));
}

#[test]
fn test_defaults_applied() {
    let json = r#"{ "buffer_packs": [ { "name": "only", "buffers": [ { "size": 4 } ] } ] }"#;
    let format = BuffersFormat::from_json(json).unwrap();
    assert_eq!(format.unit, DEFAULT_UNIT);
    assert_eq!(format.increment, DEFAULT_INCREMENT * DEFAULT_UNIT);
    assert!(!format.current_pack().buffers[0].interleaved);
}

#[test]
fn test_unknown_current_pack_falls_back_to_first() {
    let json = r#"{
        "buffer_pack_current": "missing",
        "buffer_packs": [
            { "name": "a", "buffers": [ { "size": 1 } ] },
            { "name": "b", "buffers": [ { "size": 1 } ] }
        ]
    }"#;
    let format = BuffersFormat::from_json(json).unwrap();
    assert_eq!(format.current, 0);
}

#[test]
fn test_selects_named_current_pack() {
    let json = r#"{
        "buffer_pack_current": "b",
        "buffer_packs": [
            { "name": "a", "buffers": [ { "size": 1 } ] },
            { "name": "b", "buffers": [ { "size": 2 } ] }
        ]
    }"#;
    let format = BuffersFormat::from_json(json).unwrap();
    assert_eq!(format.current_pack().name, "b");
}

// ============================================================================
// Tests: Errors
// ============================================================================

#[test]
fn test_missing_catch_all_is_error() {
    let json = r#"{
        "buffer_packs": [
            { "name": "a", "buffers": [ { "size": 8, "semantic": [ { "vertex_position": 8 } ] } ] }
        ]
    }"#;
    let result = BuffersFormat::from_json(json);
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn test_duplicate_semantic_is_error() {
    let json = r#"{
        "buffer_packs": [ { "name": "a", "buffers": [
            { "size": 8, "semantic": [ { "vertex_normal": 1 } ] },
            { "size": 8, "semantic": [ { "vertex_normal": 1 } ] },
            { "size": 8 }
        ] } ]
    }"#;
    assert!(matches!(BuffersFormat::from_json(json), Err(Error::InvalidConfig(_))));
}

#[test]
fn test_local_shares_exceeding_size_is_error() {
    let json = r#"{
        "buffer_packs": [ { "name": "a", "buffers": [
            { "size": 8, "semantic": [ { "vertex_normal": 6 }, { "vertex_tangent": 6 } ] },
            { "size": 8 }
        ] } ]
    }"#;
    assert!(matches!(BuffersFormat::from_json(json), Err(Error::InvalidConfig(_))));
}

#[test]
fn test_malformed_json_is_error() {
    assert!(matches!(BuffersFormat::from_json("{"), Err(Error::InvalidConfig(_))));
}

#[test]
fn test_unknown_semantic_is_error() {
    let json = r#"{ "buffer_packs": [ { "name": "a", "buffers": [
        { "size": 8, "semantic": [ { "vertex_sparkle": 1 } ] }, { "size": 8 } ] } ] }"#;
    assert!(BuffersFormat::from_json(json).is_err());
}

#[test]
fn test_load_missing_file_is_error() {
    let result = BuffersFormat::load("/nonexistent/buffers_format.json");
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}
