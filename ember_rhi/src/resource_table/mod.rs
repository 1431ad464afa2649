//! Resource tables
//!
//! Render targets, descriptor writes and encoders refer to GPU resources by
//! slotmap key. Backends keep their native objects in secondary maps keyed
//! by the same ids, so render graph lifetime and resource lifetime stay
//! independent.

mod resource_table;

pub use resource_table::{
    ResourceTable, TextureDesc, TextureUsage, GpuBufferDesc, GpuBufferUsage, SamplerType,
    TextureId, BufferId, PipelineId,
};
