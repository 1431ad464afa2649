use super::*;

#[test]
fn test_vertex_input_defaults() {
    let input = VertexInput::new(Semantic::VertexPosition);
    assert_eq!(input.format, VertexFormat::Float32_3);
    assert_eq!(input.step_function, StepFunction::Vertex);
    assert_eq!(input.rate, 1);
    assert_eq!(input.multiplier(), 1);
    assert_eq!(input.step_bytes(), 12);
}

#[test]
fn test_vertex_input_multiplier() {
    let input = VertexInput::new(Semantic::VertexMorphTarget)
        .with_format(VertexFormat::Float32_4)
        .with_rate(1, 3);
    assert_eq!(input.multiplier(), 3);
    assert_eq!(input.step_bytes(), 48);
}

#[test]
fn test_vertex_input_from_pair() {
    let input: VertexInput = (Semantic::VertexNormal, VertexFormat::Float32_4).into();
    assert_eq!(input.format, VertexFormat::Float32_4);
}

#[test]
fn test_unassigned_records_are_incomplete() {
    assert!(!VertexAttribute::unassigned(Semantic::VertexNormal, VertexFormat::Float32_3).complete());
    assert!(!VertexLayout::unassigned(Semantic::VertexNormal).complete());
}

#[test]
fn test_struct_format_attribute_is_incomplete() {
    let mut attribute = VertexAttribute::unassigned(Semantic::Custom, VertexFormat::Struct0);
    attribute.location = 0;
    attribute.binding = 0;
    attribute.buffer_index = 0;
    assert!(!attribute.complete());
    attribute.format = VertexFormat::Uint32_1;
    assert!(attribute.complete());
}
