/// Explicit RHI context
///
/// Constructed once at startup and passed to every component that needs the
/// buffer pack or the resource table.

use std::sync::Arc;
use crate::buffers::{BuffersFormat, BuffersPack};
use crate::error::Result;
use crate::resource_table::ResourceTable;

pub struct RhiContext {
    buffers_pack: Arc<BuffersPack>,
    resources: ResourceTable,
    frame_number: u64,
}

impl RhiContext {
    pub fn new(buffers_pack: Arc<BuffersPack>) -> Self {
        Self {
            buffers_pack,
            resources: ResourceTable::new(),
            frame_number: 0,
        }
    }

    /// Build the buffer pack of the format's current pack
    pub fn from_format(format: &BuffersFormat) -> Result<Self> {
        Ok(Self::new(Arc::new(BuffersPack::new(format)?)))
    }

    pub fn buffers_pack(&self) -> &Arc<BuffersPack> {
        &self.buffers_pack
    }

    pub fn resources(&self) -> &ResourceTable {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceTable {
        &mut self.resources
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn is_first_frame(&self) -> bool {
        self.frame_number == 0
    }

    /// Count a finished frame
    pub fn end_frame(&mut self) -> u64 {
        self.frame_number += 1;
        self.frame_number
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
