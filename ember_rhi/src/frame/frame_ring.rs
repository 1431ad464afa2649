/// Frame-in-flight ring
///
/// Owns one copy of per-frame GPU-visible state per frame in flight.
/// `begin_frame` advances to the next slot; the caller must have waited for
/// the GPU to release that slot (fence) before writing to it.

use crate::error::Result;
use crate::engine_bail;

pub const FRAMES_IN_FLIGHT: usize = 3;

#[derive(Debug)]
pub struct FrameRing<T> {
    frames: Vec<T>,
    index: usize,
}

impl<T> FrameRing<T> {
    /// Build the ring, calling `make` once per slot
    pub fn new<F>(mut make: F) -> Result<Self>
    where
        F: FnMut(usize) -> Result<T>,
    {
        let frames = (0..FRAMES_IN_FLIGHT).map(&mut make).collect::<Result<Vec<_>>>()?;
        Ok(Self { frames, index: 0 })
    }

    pub fn from_frames(frames: Vec<T>) -> Result<Self> {
        if frames.len() != FRAMES_IN_FLIGHT {
            engine_bail!("ember::FrameRing",
                "Expected {} frames, got {}", FRAMES_IN_FLIGHT, frames.len());
        }
        Ok(Self { frames, index: 0 })
    }

    /// Advance to the next slot and return its index
    pub fn begin_frame(&mut self) -> usize {
        self.index = (self.index + 1) % FRAMES_IN_FLIGHT;
        self.index
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &T {
        &self.frames[self.index]
    }

    pub fn current_mut(&mut self) -> &mut T {
        &mut self.frames[self.index]
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.frames.iter()
    }
}

#[cfg(test)]
#[path = "frame_ring_tests.rs"]
mod tests;
