/// Vertex descriptor
///
/// Attributes and layouts for one draw-call class. Built from the buffer pack
/// so strides and offsets match where each semantic physically lives.

use rustc_hash::FxHashMap;
use crate::buffers::BuffersPack;
use crate::error::{Error, Result};
use crate::types::{Semantic, split_rate_multiplier};
use super::vertex_attribute::{VertexAttribute, VertexInput, VertexLayout};

/// CPU data of one semantic: raw bytes and the source element stride
#[derive(Debug, Clone, Copy)]
pub struct AttributeData<'a> {
    pub bytes: &'a [u8],
    pub stride: u32,
}

#[derive(Debug, Clone, Default)]
pub struct VertexDescriptor {
    attributes: Vec<VertexAttribute>,
    layouts: Vec<VertexLayout>,
    mapping: FxHashMap<Semantic, usize>,
}

impl VertexDescriptor {
    /// Build a descriptor from an ordered list of inputs
    pub fn new<I>(inputs: I, pack: &BuffersPack) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<VertexInput>,
    {
        let mut descriptor = Self::default();
        descriptor.add(inputs, pack)?;
        Ok(descriptor)
    }

    /// Append inputs after the existing ones
    ///
    /// Bindings and locations continue from the last layout and attribute.
    /// Earlier layouts on a shared interleaved buffer get the widened stride.
    pub fn add<I>(&mut self, inputs: I, pack: &BuffersPack) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<VertexInput>,
    {
        let inputs: Vec<VertexInput> = inputs.into_iter().map(Into::into).collect();

        for (i, input) in inputs.iter().enumerate() {
            if self.mapping.contains_key(&input.semantic)
                || inputs[..i].iter().any(|other| other.semantic == input.semantic)
            {
                crate::engine_contract!("ember::VertexDescriptor",
                    "{:?} requested twice in one vertex descriptor", input.semantic);
            }
        }

        let mut binding = self.layouts.last().map_or(0, |l| l.binding + 1);
        let mut location = self
            .attributes
            .last()
            .map_or(0, |a| a.location + a.format.location_count());

        let previous = self.attributes.len();
        for input in &inputs {
            let buffer_index = pack.attribute_buffer_index(input.semantic) as u32;
            let interleaved = pack.attribute_buffer_interleaved(input.semantic);
            let (rate, multiplier) = split_rate_multiplier(input.rate);

            let (stride, offset) = if interleaved {
                let same_buffer = |a: &&VertexAttribute| a.buffer_index == buffer_index;
                let existing: u32 = self.attributes[..previous]
                    .iter()
                    .zip(&self.layouts)
                    .filter(|(a, _)| same_buffer(a))
                    .map(|(a, l)| a.format.bytes() * l.multiplier)
                    .sum();
                let batch: u32 = inputs
                    .iter()
                    .filter(|other| pack.attribute_buffer_index(other.semantic) as u32 == buffer_index)
                    .map(VertexInput::step_bytes)
                    .sum();
                let stride = existing + batch;
                let offset: u32 = self
                    .attributes
                    .iter()
                    .zip(&self.layouts)
                    .filter(|(a, _)| same_buffer(a))
                    .map(|(a, l)| a.format.bytes() * l.multiplier)
                    .sum();

                for (attribute, layout) in self.attributes.iter().zip(self.layouts.iter_mut()) {
                    if attribute.buffer_index == buffer_index {
                        layout.stride = stride;
                    }
                }
                (stride, offset)
            } else {
                (input.step_bytes(), 0)
            };

            self.layouts.push(VertexLayout {
                semantic: input.semantic,
                binding,
                stride,
                rate,
                multiplier,
                step_function: input.step_function,
                buffer_index,
            });
            self.attributes.push(VertexAttribute {
                semantic: input.semantic,
                location,
                offset,
                binding,
                buffer_index,
                format: input.format,
                count: 0,
                buffer_offset: 0,
            });
            self.mapping.insert(input.semantic, self.attributes.len() - 1);

            binding += 1;
            location += input.format.location_count();
        }

        Ok(())
    }

    /// True when non-empty and every attribute and layout is fully assigned
    pub fn complete(&self) -> bool {
        !self.attributes.is_empty()
            && self.attributes.iter().all(VertexAttribute::complete)
            && self.layouts.iter().all(VertexLayout::complete)
    }

    /// Fail with a contract violation unless `complete()`
    pub fn ensure_complete(&self) -> Result<()> {
        if !self.complete() {
            crate::engine_contract!("ember::VertexDescriptor",
                "Incomplete vertex descriptor used for drawing ({} attributes)", self.attributes.len());
        }
        Ok(())
    }

    pub fn attribute(&self, semantic: Semantic) -> Option<&VertexAttribute> {
        self.mapping.get(&semantic).map(|&i| &self.attributes[i])
    }

    pub fn layout(&self, semantic: Semantic) -> Option<&VertexLayout> {
        self.mapping.get(&semantic).map(|&i| &self.layouts[i])
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn layouts(&self) -> &[VertexLayout] {
        &self.layouts
    }

    /// Copy per-semantic CPU data into the buffer pack
    ///
    /// Space is reserved once per interleaved buffer and once per local
    /// semantic, then each element is written at its destination stride.
    /// Every attribute must receive data.
    pub fn upload(&mut self, data: &FxHashMap<Semantic, AttributeData<'_>>, pack: &BuffersPack) -> Result<()> {
        if data.len() != self.attributes.len() || self.attributes.iter().any(|a| !data.contains_key(&a.semantic)) {
            crate::engine_contract!("ember::VertexDescriptor",
                "Partial upload: {} data streams for {} attributes", data.len(), self.attributes.len());
        }

        let mut counts = Vec::with_capacity(self.attributes.len());
        for (attribute, layout) in self.attributes.iter().zip(&self.layouts) {
            let source = &data[&attribute.semantic];
            let element_bytes = attribute.format.bytes() * layout.multiplier;
            if source.stride < element_bytes || element_bytes == 0 {
                return Err(Error::InvalidResource(format!(
                    "{:?}: source stride {} smaller than element size {}",
                    attribute.semantic, source.stride, element_bytes)));
            }
            counts.push(source.bytes.len() as u64 / source.stride as u64);
        }

        // Interleaved buffers: one region sized for the longest stream
        let mut interleaved_regions: FxHashMap<u32, u64> = FxHashMap::default();
        for ((attribute, layout), &count) in self.attributes.iter().zip(&self.layouts).zip(&counts) {
            if pack.attribute_buffer_interleaved(attribute.semantic) {
                let bytes = count * layout.stride as u64;
                let entry = interleaved_regions.entry(attribute.buffer_index).or_insert(0);
                *entry = (*entry).max(bytes);
            }
        }
        let mut interleaved_offsets: FxHashMap<u32, u64> = FxHashMap::default();
        for (attribute, _) in self.attributes.iter().zip(&counts) {
            if let Some(&bytes) = interleaved_regions.get(&attribute.buffer_index) {
                if bytes > 0 && !interleaved_offsets.contains_key(&attribute.buffer_index) {
                    let offset = pack.attribute_buffer_offset(attribute.semantic, bytes)?;
                    interleaved_offsets.insert(attribute.buffer_index, offset);
                }
            }
        }

        for ((attribute, layout), &count) in self.attributes.iter_mut().zip(&self.layouts).zip(&counts) {
            let source = &data[&attribute.semantic];
            let element_bytes = (attribute.format.bytes() * layout.multiplier) as usize;
            let stride = layout.stride as u64;

            // Empty stream: nothing to reserve
            if count == 0 {
                attribute.count = 0;
                continue;
            }

            let base = match interleaved_offsets.get(&attribute.buffer_index) {
                Some(&offset) => offset,
                None => pack.attribute_buffer_offset(attribute.semantic, count * stride)?,
            };
            attribute.buffer_offset = base;
            attribute.count = count;

            let destination = base + attribute.offset as u64;
            if stride as usize == element_bytes && source.stride as usize == element_bytes {
                pack.upload(attribute.semantic, destination, &source.bytes[..count as usize * element_bytes])?;
            } else {
                for i in 0..count as usize {
                    let src = i * source.stride as usize;
                    pack.upload(
                        attribute.semantic,
                        destination + i as u64 * stride,
                        &source.bytes[src..src + element_bytes],
                    )?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "vertex_descriptor_tests.rs"]
mod tests;
