/// Physical buffer of the buffer pack
///
/// Owns CPU-side bytes and a bump allocator. Interleaved buffers hand out
/// offsets from one buffer-wide cursor and grow when full; local buffers keep
/// one cursor per semantic inside that semantic's fixed sub-range.

use std::sync::{Mutex, MutexGuard};
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::types::Semantic;

/// Round up to the next multiple of 8
pub fn align8(value: u64) -> u64 {
    (value + 7) & !7
}

/// Fixed sub-range of a local buffer owned by one semantic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SubRange {
    start: u64,
    len: u64,
}

#[derive(Debug)]
struct BufferState {
    data: Vec<u8>,
    filled: u64,
    cursors: FxHashMap<Semantic, u64>,
}

#[derive(Debug)]
pub struct Buffer {
    interleaved: bool,
    increment: u64,
    semantics: Vec<(Semantic, u64)>,
    ranges: FxHashMap<Semantic, SubRange>,
    state: Mutex<BufferState>,
}

impl Buffer {
    /// Create a zero-filled buffer of `size` bytes
    pub fn new(size: u64, interleaved: bool, increment: u64) -> Self {
        Self {
            interleaved,
            increment: increment.max(8),
            semantics: Vec::new(),
            ranges: FxHashMap::default(),
            state: Mutex::new(BufferState {
                data: vec![0; size as usize],
                filled: 0,
                cursors: FxHashMap::default(),
            }),
        }
    }

    /// Register a semantic and its share in bytes
    ///
    /// Local buffers carve the share out right after the previous semantic's.
    pub fn emplace_semantic(&mut self, semantic: Semantic, bytes: u64) {
        if !self.interleaved {
            let start = self.ranges.values().map(|r| r.start + r.len).max().unwrap_or(0);
            self.ranges.insert(semantic, SubRange { start, len: bytes });
        }
        self.semantics.push((semantic, bytes));
    }

    fn state(&self) -> Result<MutexGuard<'_, BufferState>> {
        self.state.lock()
            .map_err(|_| Error::BackendError("Buffer lock poisoned".to_string()))
    }

    pub fn interleaved(&self) -> bool {
        self.interleaved
    }

    pub fn semantics(&self) -> &[(Semantic, u64)] {
        &self.semantics
    }

    /// `(start, len)` of a local semantic's sub-range
    pub fn semantic_range(&self, semantic: Semantic) -> Option<(u64, u64)> {
        self.ranges.get(&semantic).map(|r| (r.start, r.len))
    }

    /// Current size in bytes
    pub fn size(&self) -> Result<u64> {
        Ok(self.state()?.data.len() as u64)
    }

    /// Bytes handed out so far by the buffer-wide cursor
    pub fn filled(&self) -> Result<u64> {
        Ok(self.state()?.filled)
    }

    /// Reserve `bytes` for `semantic` and return the start offset
    ///
    /// Offsets are 8-byte aligned after the first. Interleaved buffers grow
    /// by at least `increment`; a full local sub-range is `OutOfMemory`.
    pub fn offset(&self, semantic: Semantic, bytes: u64) -> Result<u64> {
        if bytes == 0 {
            return Err(Error::InvalidResource(format!("zero-byte request for {:?}", semantic)));
        }

        let mut state = self.state()?;

        if self.interleaved {
            let needed = state.filled + bytes;
            let len = state.data.len() as u64;
            if needed > len {
                let grow = self.increment.max(needed - len);
                let new_size = state.data.len() + grow as usize;
                state.data.resize(new_size, 0);
                crate::engine_info!("ember::Buffer",
                    "Interleaved buffer grown by {} bytes to {} bytes", grow, new_size);
            }
            let offset = state.filled;
            state.filled = align8(offset + bytes);
            return Ok(offset);
        }

        let Some(range) = self.ranges.get(&semantic).copied() else {
            return Err(Error::InvalidResource(format!("{:?} is not stored in this buffer", semantic)));
        };

        let cursor = state.cursors.get(&semantic).copied().unwrap_or(0);
        if cursor + bytes > range.len {
            crate::engine_error!("ember::Buffer",
                "Sub-range of {:?} exhausted: {} + {} > {} bytes", semantic, cursor, bytes, range.len);
            return Err(Error::OutOfMemory);
        }
        state.cursors.insert(semantic, align8(cursor + bytes));
        state.filled = state.filled.max(range.start + align8(cursor + bytes));
        Ok(range.start + cursor)
    }

    /// Copy `bytes` into the CPU copy at `offset`
    pub fn upload(&self, offset: u64, bytes: &[u8]) -> Result<()> {
        let mut state = self.state()?;
        let start = offset as usize;
        let end = start + bytes.len();
        if end > state.data.len() {
            return Err(Error::InvalidResource(format!(
                "upload of {} bytes at {} overflows buffer of {} bytes",
                bytes.len(), offset, state.data.len())));
        }
        state.data[start..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Copy any `Pod` slice into the CPU copy at `offset`
    pub fn upload_pod<T: bytemuck::Pod>(&self, offset: u64, values: &[T]) -> Result<()> {
        self.upload(offset, bytemuck::cast_slice(values))
    }

    /// Run `f` over the CPU copy
    pub fn with_data<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let state = self.state()?;
        Ok(f(&state.data))
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
