/// Vertex attribute and layout records
///
/// One attribute and one layout exist per semantic. They are linked by the
/// binding number.

use crate::types::{Semantic, StepFunction, VertexFormat, make_rate_multiplier, split_rate_multiplier};

/// Marks a location, binding or buffer index not yet assigned
pub const INVALID_INDEX: u32 = u32::MAX;

// ============================================================================
// VertexInput
// ============================================================================

/// One requested vertex stream
///
/// Unspecified fields default to `Float32_3`, per-vertex stepping, rate 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexInput {
    pub semantic: Semantic,
    pub format: VertexFormat,
    pub step_function: StepFunction,
    /// Step rate in the low 16 bits, stride multiplier in the high 16 bits
    pub rate: u32,
}

impl VertexInput {
    pub fn new(semantic: Semantic) -> Self {
        Self {
            semantic,
            format: VertexFormat::default(),
            step_function: StepFunction::default(),
            rate: 1,
        }
    }

    pub fn with_format(mut self, format: VertexFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_step_function(mut self, step_function: StepFunction) -> Self {
        self.step_function = step_function;
        self
    }

    /// Set the step rate and how many consecutive `format` elements form one step
    pub fn with_rate(mut self, rate: u32, multiplier: u32) -> Self {
        self.rate = make_rate_multiplier(rate, multiplier);
        self
    }

    pub fn multiplier(&self) -> u32 {
        split_rate_multiplier(self.rate).1
    }

    /// Bytes of one step: format size times multiplier
    pub fn step_bytes(&self) -> u32 {
        self.format.bytes() * self.multiplier()
    }
}

impl From<Semantic> for VertexInput {
    fn from(semantic: Semantic) -> Self {
        Self::new(semantic)
    }
}

impl From<(Semantic, VertexFormat)> for VertexInput {
    fn from((semantic, format): (Semantic, VertexFormat)) -> Self {
        Self::new(semantic).with_format(format)
    }
}

// ============================================================================
// VertexAttribute
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub semantic: Semantic,
    /// First shader input location
    pub location: u32,
    /// Byte offset inside one interleaved element (0 for local buffers)
    pub offset: u32,
    pub binding: u32,
    pub buffer_index: u32,
    pub format: VertexFormat,
    /// Elements uploaded (set by `VertexDescriptor::upload`)
    pub count: u64,
    /// Start of this attribute's data in its buffer (set by upload)
    pub buffer_offset: u64,
}

impl VertexAttribute {
    /// An attribute with nothing assigned yet
    pub fn unassigned(semantic: Semantic, format: VertexFormat) -> Self {
        Self {
            semantic,
            location: INVALID_INDEX,
            offset: 0,
            binding: INVALID_INDEX,
            buffer_index: INVALID_INDEX,
            format,
            count: 0,
            buffer_offset: 0,
        }
    }

    pub fn complete(&self) -> bool {
        self.location != INVALID_INDEX
            && self.binding != INVALID_INDEX
            && self.buffer_index != INVALID_INDEX
            && self.format.bytes() > 0
    }
}

// ============================================================================
// VertexLayout
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub semantic: Semantic,
    pub binding: u32,
    pub stride: u32,
    /// Step rate without the multiplier bits
    pub rate: u32,
    pub multiplier: u32,
    pub step_function: StepFunction,
    pub buffer_index: u32,
}

impl VertexLayout {
    pub fn unassigned(semantic: Semantic) -> Self {
        Self {
            semantic,
            binding: INVALID_INDEX,
            stride: 0,
            rate: 1,
            multiplier: 1,
            step_function: StepFunction::Vertex,
            buffer_index: INVALID_INDEX,
        }
    }

    pub fn complete(&self) -> bool {
        self.binding != INVALID_INDEX && self.buffer_index != INVALID_INDEX && self.stride > 0
    }
}

#[cfg(test)]
#[path = "vertex_attribute_tests.rs"]
mod tests;
