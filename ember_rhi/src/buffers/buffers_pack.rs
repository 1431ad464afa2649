/// The active buffer pack
///
/// Built once from a resolved `BuffersFormat`. The semantic to buffer mapping
/// is immutable afterwards; only the per-buffer cursors move.

use crate::error::{Error, Result};
use crate::types::Semantic;
use super::buffer::Buffer;
use super::buffers_format::{BuffersFormat, BufferPackFormat};

#[derive(Debug)]
pub struct BuffersPack {
    name: String,
    buffers: Vec<Buffer>,
    indices: [usize; Semantic::ALL.len()],
}

impl BuffersPack {
    /// Build the format's current pack variant
    pub fn new(format: &BuffersFormat) -> Result<Self> {
        Self::from_pack(format.current_pack(), format.increment)
    }

    /// Build one specific pack variant
    pub fn from_pack(pack: &BufferPackFormat, increment: u64) -> Result<Self> {
        let mut indices = [usize::MAX; Semantic::ALL.len()];
        let mut buffers = Vec::with_capacity(pack.buffers.len());

        for (index, format) in pack.buffers.iter().enumerate() {
            let mut buffer = Buffer::new(format.size, format.interleaved, increment);
            for &(semantic, bytes) in &format.semantics {
                if indices[semantic.index()] != usize::MAX {
                    crate::engine_contract!("ember::BuffersPack",
                        "{:?} assigned to buffers {} and {}", semantic, indices[semantic.index()], index);
                }
                indices[semantic.index()] = index;
                buffer.emplace_semantic(semantic, bytes);
            }
            buffers.push(buffer);
        }

        if let Some(missing) = Semantic::ALL.iter().find(|s| indices[s.index()] == usize::MAX) {
            crate::engine_contract!("ember::BuffersPack",
                "Pack '{}' leaves {:?} without a buffer", pack.name, missing);
        }

        crate::engine_debug!("ember::BuffersPack",
            "Buffer pack '{}' created with {} buffers", pack.name, buffers.len());

        Ok(Self { name: pack.name.clone(), buffers, indices })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn buffer(&self, index: usize) -> Option<&Buffer> {
        self.buffers.get(index)
    }

    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    /// Index of the buffer holding `semantic`
    pub fn attribute_buffer_index(&self, semantic: Semantic) -> usize {
        self.indices[semantic.index()]
    }

    /// The buffer holding `semantic`
    pub fn attribute_buffer(&self, semantic: Semantic) -> &Buffer {
        &self.buffers[self.attribute_buffer_index(semantic)]
    }

    /// Reserve `bytes` for `semantic` and return its offset in the buffer
    pub fn attribute_buffer_offset(&self, semantic: Semantic, bytes: u64) -> Result<u64> {
        self.attribute_buffer(semantic).offset(semantic, bytes)
    }

    /// Whether `semantic` lives in a globally interleaved buffer
    pub fn attribute_buffer_interleaved(&self, semantic: Semantic) -> bool {
        self.attribute_buffer(semantic).interleaved()
    }

    /// Copy bytes into the buffer holding `semantic`
    pub fn upload(&self, semantic: Semantic, offset: u64, bytes: &[u8]) -> Result<()> {
        self.attribute_buffer(semantic).upload(offset, bytes)
    }

    /// Copy bytes into buffer `index`
    pub fn upload_to(&self, index: usize, offset: u64, bytes: &[u8]) -> Result<()> {
        self.buffers
            .get(index)
            .ok_or_else(|| Error::InvalidResource(format!("buffer index {} out of range", index)))?
            .upload(offset, bytes)
    }
}

#[cfg(test)]
#[path = "buffers_pack_tests.rs"]
mod tests;
