//! Vertex descriptor builder
//!
//! Turns `(semantic, format, step function, rate)` requests into vertex
//! attributes and layouts placed inside the buffer pack.

mod vertex_attribute;
mod vertex_descriptor;

pub use vertex_attribute::{VertexInput, VertexAttribute, VertexLayout, INVALID_INDEX};
pub use vertex_descriptor::{VertexDescriptor, AttributeData};
