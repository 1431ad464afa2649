/// Command encoders handed to subpass actions

use crate::descriptor::DescriptorSetId;
use crate::error::Result;
use crate::resource_table::{BufferId, PipelineId};

/// Viewport rectangle and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height, min_depth: 0.0, max_depth: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

/// Draw commands inside one fragment subpass
pub trait RenderCommandEncoder {
    fn bind_pipeline(&mut self, pipeline: PipelineId) -> Result<()>;

    /// Bind a cached descriptor set at `set_index` of the pipeline layout
    fn bind_descriptor_set(&mut self, pipeline: PipelineId, set_index: u32, set: DescriptorSetId) -> Result<()>;

    /// Bind buffer `buffer_index` of the buffer pack to vertex `binding`
    fn bind_vertex_buffer(&mut self, binding: u32, buffer_index: u32, offset: u64) -> Result<()>;

    fn bind_index_buffer(&mut self, buffer: BufferId, offset: u64, index_type: IndexType) -> Result<()>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()>;

    /// Close the subpass encoding
    fn end_encoding(&mut self) -> Result<()>;
}

/// Dispatch commands inside one compute subpass
pub trait ComputeCommandEncoder {
    fn bind_pipeline(&mut self, pipeline: PipelineId) -> Result<()>;

    fn bind_descriptor_set(&mut self, pipeline: PipelineId, set_index: u32, set: DescriptorSetId) -> Result<()>;

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()>;

    fn end_encoding(&mut self) -> Result<()>;
}
