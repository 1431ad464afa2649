/// Program descriptor building
///
/// Binding groups:
/// - set 0: per-frame constants, lights, shadow map, environment maps, morph weights
/// - set 1: per-view camera constants
/// - set 2: skin joint matrices
/// - set 3: material constants and material textures
///
/// A set is only produced when one of its resources is present. Bindings
/// inside a set are numbered in the order above. Subpass input attachments
/// are appended to set 0.
///
/// Groups are either shared by every frame in flight (`build_descriptor`) or
/// built once per frame slot (`build_frame_descriptors`), in which case the
/// set bound at draw time follows the backend's current frame.

use crate::backend::{ComputeCommandEncoder, RenderCommandEncoder};
use crate::descriptor::{BindingType, DescriptorBinding, DescriptorSet, DescriptorSetId, ShaderStageFlags};
use crate::error::Result;
use crate::frame::FRAMES_IN_FLIGHT;
use crate::engine_contract;
use crate::resource_table::{BufferId, PipelineId, SamplerType, TextureId};
use crate::types::RenderpassTechnique;
use crate::vertex::VertexDescriptor;

pub const SET_PER_FRAME: u32 = 0;
pub const SET_PER_VIEW: u32 = 1;
pub const SET_SKIN: u32 = 2;
pub const SET_MATERIAL: u32 = 3;

/// Image-based lighting inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentMaps {
    pub irradiance: TextureId,
    pub radiance: TextureId,
    pub brdf_lut: TextureId,
}

/// Per-draw resources, all optional
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramResources<'a> {
    pub per_frame: Option<BufferId>,
    pub lights: &'a [BufferId],
    pub shadow_map: Option<TextureId>,
    pub environment: Option<EnvironmentMaps>,
    pub morph_weights: Option<BufferId>,
    pub per_view: Option<BufferId>,
    pub skin: Option<BufferId>,
    pub material: Option<BufferId>,
    pub material_textures: &'a [(TextureId, SamplerType)],
}

/// Backend hook turning a CPU-side set into a cached native set
///
/// Implementations look the layout up in their layout cache, allocate from
/// their descriptor pool, apply the writes and store the native set in their
/// set cache.
pub trait DescriptorAllocator {
    fn allocate_descriptor_set(&self, set: &DescriptorSet) -> Result<DescriptorSetId>;
}

/// Pipeline plus the binding groups of one draw-call class
#[derive(Debug, Clone, Default)]
pub struct Program {
    pipeline: Option<PipelineId>,
    vertex_descriptor: VertexDescriptor,
    /// Groups built from resources, one entry when shared by every frame
    built: Vec<Vec<DescriptorSet>>,
    input_attachments: Vec<TextureId>,
    /// `built` with the input attachments merged in
    frames: Vec<Vec<DescriptorSet>>,
    allocated: Vec<Vec<(u32, DescriptorSetId)>>,
}

impl Program {
    pub fn new(pipeline: Option<PipelineId>, vertex_descriptor: VertexDescriptor) -> Self {
        Self {
            pipeline,
            vertex_descriptor,
            built: Vec::new(),
            input_attachments: Vec::new(),
            frames: Vec::new(),
            allocated: Vec::new(),
        }
    }

    pub fn pipeline(&self) -> Option<PipelineId> {
        self.pipeline
    }

    pub fn set_pipeline(&mut self, pipeline: PipelineId) {
        self.pipeline = Some(pipeline);
    }

    pub fn vertex_descriptor(&self) -> &VertexDescriptor {
        &self.vertex_descriptor
    }

    /// Sets of frame slot 0
    pub fn descriptor_sets(&self) -> &[DescriptorSet] {
        self.frame_descriptor_sets(0)
    }

    /// Sets bound while `frame` is the current slot
    pub fn frame_descriptor_sets(&self, frame: usize) -> &[DescriptorSet] {
        match self.frames.len() {
            0 => &[],
            copies => &self.frames[frame % copies],
        }
    }

    /// Distinct copies of the binding groups, 1 when shared by every frame
    pub fn frame_copies(&self) -> usize {
        self.frames.len()
    }

    /// `(set index, native set)` pairs of frame slot 0 from the last `allocate_descriptor`
    pub fn allocated_sets(&self) -> &[(u32, DescriptorSetId)] {
        self.allocated_frame_sets(0)
    }

    pub fn allocated_frame_sets(&self, frame: usize) -> &[(u32, DescriptorSetId)] {
        match self.allocated.len() {
            0 => &[],
            copies => &self.allocated[frame % copies],
        }
    }

    pub fn input_attachments(&self) -> &[TextureId] {
        &self.input_attachments
    }

    /// Rebuild the binding groups from `resources`, shared by every frame
    pub fn build_descriptor(&mut self, resources: &ProgramResources<'_>, technique: RenderpassTechnique) -> &[DescriptorSet] {
        self.built = vec![build_groups(resources, technique)];
        self.compose();
        self.descriptor_sets()
    }

    /// Rebuild one copy of the binding groups per frame slot
    ///
    /// Every slot must produce the same layouts; only the bound resources
    /// may differ.
    pub fn build_frame_descriptors(
        &mut self,
        frames: &[ProgramResources<'_>; FRAMES_IN_FLIGHT],
        technique: RenderpassTechnique,
    ) -> Result<&[DescriptorSet]> {
        let built: Vec<Vec<DescriptorSet>> = frames.iter().map(|r| build_groups(r, technique)).collect();

        fn layout(sets: &[DescriptorSet]) -> Vec<(u32, &[DescriptorBinding])> {
            sets.iter().map(|s| (s.set_index(), s.bindings())).collect()
        }
        let first = layout(&built[0]);
        if let Some(slot) = built.iter().position(|sets| layout(sets) != first) {
            engine_contract!("ember::Program",
                "Frame slot {} builds different binding layouts than slot 0", slot);
        }

        self.built = built;
        self.compose();
        Ok(self.descriptor_sets())
    }

    /// Replace the subpass input attachments read through set 0
    pub fn set_input_attachments(&mut self, textures: &[TextureId]) {
        self.input_attachments = textures.to_vec();
        self.compose();
    }

    fn compose(&mut self) {
        let shared = [Vec::new()];
        let built: &[Vec<DescriptorSet>] = if self.built.is_empty() { &shared } else { &self.built };

        self.frames = built
            .iter()
            .map(|sets| merge_input_attachments(sets, &self.input_attachments))
            .collect();
        self.allocated.clear();
    }

    /// Register every built set of every frame copy with the backend
    pub fn allocate_descriptor<A: DescriptorAllocator + ?Sized>(&mut self, allocator: &A) -> Result<()> {
        let mut allocated = Vec::with_capacity(self.frames.len());
        for sets in &self.frames {
            let mut slot = Vec::with_capacity(sets.len());
            for set in sets {
                set.validate()?;
                slot.push((set.set_index(), allocator.allocate_descriptor_set(set)?));
            }
            allocated.push(slot);
        }
        self.allocated = allocated;
        Ok(())
    }

    fn require_pipeline(&self) -> Result<PipelineId> {
        match self.pipeline {
            Some(pipeline) => Ok(pipeline),
            None => {
                engine_contract!("ember::Program", "Program has no pipeline");
            }
        }
    }

    /// Bind the pipeline and the sets of frame slot `frame` for drawing
    pub fn bind_render(&self, encoder: &mut dyn RenderCommandEncoder, frame: usize) -> Result<()> {
        let pipeline = self.require_pipeline()?;
        encoder.bind_pipeline(pipeline)?;
        for &(set_index, set) in self.allocated_frame_sets(frame) {
            encoder.bind_descriptor_set(pipeline, set_index, set)?;
        }
        Ok(())
    }

    /// Bind the pipeline and the sets of frame slot `frame` for dispatching
    pub fn bind_compute(&self, encoder: &mut dyn ComputeCommandEncoder, frame: usize) -> Result<()> {
        let pipeline = self.require_pipeline()?;
        encoder.bind_pipeline(pipeline)?;
        for &(set_index, set) in self.allocated_frame_sets(frame) {
            encoder.bind_descriptor_set(pipeline, set_index, set)?;
        }
        Ok(())
    }
}

fn build_groups(resources: &ProgramResources<'_>, technique: RenderpassTechnique) -> Vec<DescriptorSet> {
    let (vertex, fragment, both) = match technique {
        RenderpassTechnique::Fragment => (
            ShaderStageFlags::VERTEX,
            ShaderStageFlags::FRAGMENT,
            ShaderStageFlags::VERTEX_FRAGMENT,
        ),
        RenderpassTechnique::Compute => (
            ShaderStageFlags::COMPUTE,
            ShaderStageFlags::COMPUTE,
            ShaderStageFlags::COMPUTE,
        ),
    };

    let mut per_frame = DescriptorSet::new(SET_PER_FRAME);
    if let Some(buffer) = resources.per_frame {
        per_frame.push_buffer(per_frame.next_binding(), buffer, BindingType::UniformBuffer, both);
    }
    for &light in resources.lights {
        per_frame.push_buffer(per_frame.next_binding(), light, BindingType::UniformBuffer, fragment);
    }
    if let Some(shadow_map) = resources.shadow_map {
        per_frame.push_image(per_frame.next_binding(), shadow_map, SamplerType::Shadow, fragment);
    }
    if let Some(environment) = resources.environment {
        for texture in [environment.irradiance, environment.radiance, environment.brdf_lut] {
            per_frame.push_image(per_frame.next_binding(), texture, SamplerType::LinearClamp, fragment);
        }
    }
    if let Some(weights) = resources.morph_weights {
        per_frame.push_buffer(per_frame.next_binding(), weights, BindingType::StorageBuffer, vertex);
    }

    let mut per_view = DescriptorSet::new(SET_PER_VIEW);
    if let Some(buffer) = resources.per_view {
        per_view.push_buffer(0, buffer, BindingType::UniformBuffer, both);
    }

    let mut skin = DescriptorSet::new(SET_SKIN);
    if let Some(joints) = resources.skin {
        skin.push_buffer(0, joints, BindingType::StorageBuffer, vertex);
    }

    let mut material = DescriptorSet::new(SET_MATERIAL);
    if let Some(buffer) = resources.material {
        material.push_buffer(0, buffer, BindingType::UniformBuffer, fragment);
    }
    for &(texture, sampler) in resources.material_textures {
        material.push_image(material.next_binding(), texture, sampler, fragment);
    }

    [per_frame, per_view, skin, material]
        .into_iter()
        .filter(|set| !set.is_empty())
        .collect()
}

/// Append input attachments after the bindings of set 0, creating it if needed
fn merge_input_attachments(sets: &[DescriptorSet], inputs: &[TextureId]) -> Vec<DescriptorSet> {
    let mut merged = sets.to_vec();
    if inputs.is_empty() {
        return merged;
    }

    if merged.first().map_or(true, |set| set.set_index() != SET_PER_FRAME) {
        merged.insert(0, DescriptorSet::new(SET_PER_FRAME));
    }
    let set = &mut merged[0];
    for &texture in inputs {
        set.push_input_attachment(set.next_binding(), texture);
    }
    merged
}

#[cfg(test)]
#[path = "program_tests.rs"]
mod tests;
