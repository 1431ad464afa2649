//! Recording backend for unit tests (no GPU required)

use crate::context::RhiContext;
use crate::descriptor::mock::{MockLayoutFactory, MockPoolFactory};
use crate::descriptor::{DescriptorLayoutCache, DescriptorPool, DescriptorSet, DescriptorSetCache, DescriptorSetId};
use crate::error::Result;
use crate::program::DescriptorAllocator;
use crate::render_graph::Renderpass;
use crate::resource_table::{BufferId, PipelineId};
use crate::types::RenderpassTechnique;
use crate::{engine_bail, engine_critical};
use super::encoder::{ComputeCommandEncoder, IndexType, RenderCommandEncoder, Viewport};
use super::native_pass::NativePass;
use super::platform::PlatformRenderpass;

// ============================================================================
// Mock Descriptor Allocator
// ============================================================================

/// Layout cache, pool and set cache chained over the mock factories
pub(crate) struct MockDescriptorAllocator {
    pub layout_factory: MockLayoutFactory,
    pub pool_factory: MockPoolFactory,
    pub layouts: DescriptorLayoutCache<u32>,
    pub pool: DescriptorPool<usize>,
    pub sets: DescriptorSetCache<(usize, u32)>,
}

impl MockDescriptorAllocator {
    pub fn new(capacity: u32) -> Self {
        Self {
            layout_factory: MockLayoutFactory::default(),
            pool_factory: MockPoolFactory::new(capacity),
            layouts: DescriptorLayoutCache::new(),
            pool: DescriptorPool::new(),
            sets: DescriptorSetCache::new(),
        }
    }
}

impl DescriptorAllocator for MockDescriptorAllocator {
    fn allocate_descriptor_set(&self, set: &DescriptorSet) -> Result<DescriptorSetId> {
        let layout = self.layouts.make_layout(&self.layout_factory, set.bindings())?;
        let native = self.pool.allocate(&self.pool_factory, &layout)?;
        self.sets.emplace(native)
    }
}

// ============================================================================
// Mock Platform
// ============================================================================

#[derive(Debug, Default)]
pub(crate) struct MockCommandBuffer {
    pub commands: Vec<String>,
}

pub(crate) struct MockPlatform {
    pub supports_compute: bool,
    pub uploads: u32,
    pub passes: Vec<Option<NativePass<String, String>>>,
    pub final_surface: Option<(String, usize)>,
    pub allocator: MockDescriptorAllocator,
    /// Slot reported by `frame_index`
    pub frame: usize,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            supports_compute: true,
            uploads: 0,
            passes: Vec::new(),
            final_surface: None,
            allocator: MockDescriptorAllocator::new(16),
            frame: 0,
        }
    }

    /// Backend without compute subpasses
    pub fn render_only() -> Self {
        Self { supports_compute: false, ..Self::new() }
    }
}

impl PlatformRenderpass for MockPlatform {
    type CommandBuffer = MockCommandBuffer;
    type Surface = String;

    fn upload(&mut self, renderpass: &Renderpass, _ctx: &RhiContext) -> Result<()> {
        self.passes = renderpass
            .subpasses()
            .iter()
            .map(|subpass| match subpass.technique() {
                RenderpassTechnique::Fragment => Some(NativePass::Render(subpass.name().to_string())),
                RenderpassTechnique::Compute if self.supports_compute => {
                    Some(NativePass::Compute(subpass.name().to_string()))
                }
                RenderpassTechnique::Compute => {
                    engine_critical!("ember::mock::Renderpass",
                        "Compute subpass '{}' is not supported", subpass.name());
                    None
                }
            })
            .collect();
        self.uploads += 1;
        Ok(())
    }

    fn platform_renderpass_count(&self) -> usize {
        self.passes.iter().flatten().count()
    }

    fn frame_index(&self) -> usize {
        self.frame
    }

    fn make_final_pass(&mut self, surface: &String, subpass: usize) -> Result<()> {
        self.final_surface = Some((surface.clone(), subpass));
        Ok(())
    }

    fn begin_renderpass(&mut self, cmd: &mut MockCommandBuffer, renderpass: &Renderpass) -> Result<()> {
        cmd.commands.push(format!("begin_renderpass {}", renderpass.name()));
        Ok(())
    }

    fn next_subpass(&mut self, cmd: &mut MockCommandBuffer, subpass: usize) -> Result<()> {
        cmd.commands.push(format!("next_subpass {}", subpass));
        Ok(())
    }

    fn end_renderpass(&mut self, cmd: &mut MockCommandBuffer) -> Result<()> {
        cmd.commands.push("end_renderpass".to_string());
        Ok(())
    }

    fn render_encoder<'a>(
        &'a mut self,
        cmd: &'a mut MockCommandBuffer,
        subpass: usize,
    ) -> Result<Box<dyn RenderCommandEncoder + 'a>> {
        match self.passes.get(subpass) {
            Some(Some(NativePass::Render(_))) => {}
            _ => engine_bail!("ember::mock::Renderpass", "No render pass for subpass {}", subpass),
        }
        Ok(Box::new(MockEncoder { commands: &mut cmd.commands, subpass }))
    }

    fn compute_encoder<'a>(
        &'a mut self,
        cmd: &'a mut MockCommandBuffer,
        subpass: usize,
    ) -> Result<Option<Box<dyn ComputeCommandEncoder + 'a>>> {
        match self.passes.get(subpass) {
            Some(Some(NativePass::Compute(_))) => {
                Ok(Some(Box::new(MockEncoder { commands: &mut cmd.commands, subpass })))
            }
            _ => Ok(None),
        }
    }

    fn descriptor_allocator(&self) -> &dyn DescriptorAllocator {
        &self.allocator
    }
}

// ============================================================================
// Mock Encoder
// ============================================================================

pub(crate) struct MockEncoder<'a> {
    commands: &'a mut Vec<String>,
    subpass: usize,
}

impl<'a> MockEncoder<'a> {
    pub fn new(commands: &'a mut Vec<String>, subpass: usize) -> Self {
        Self { commands, subpass }
    }

    fn record(&mut self, command: String) -> Result<()> {
        self.commands.push(command);
        Ok(())
    }
}

impl RenderCommandEncoder for MockEncoder<'_> {
    fn bind_pipeline(&mut self, _pipeline: PipelineId) -> Result<()> {
        self.record("bind_pipeline".to_string())
    }

    fn bind_descriptor_set(&mut self, _pipeline: PipelineId, set_index: u32, set: DescriptorSetId) -> Result<()> {
        self.record(format!("bind_descriptor_set {} {}", set_index, set.0))
    }

    fn bind_vertex_buffer(&mut self, binding: u32, buffer_index: u32, offset: u64) -> Result<()> {
        self.record(format!("bind_vertex_buffer {} {} {}", binding, buffer_index, offset))
    }

    fn bind_index_buffer(&mut self, _buffer: BufferId, offset: u64, index_type: IndexType) -> Result<()> {
        self.record(format!("bind_index_buffer {} {:?}", offset, index_type))
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.record(format!("set_viewport {}x{}", viewport.width, viewport.height))
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.record(format!("draw {} {}", vertex_count, first_vertex))
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.record(format!("draw_indexed {} {} {}", index_count, first_index, vertex_offset))
    }

    fn end_encoding(&mut self) -> Result<()> {
        let subpass = self.subpass;
        self.record(format!("end_encoding {}", subpass))
    }
}

impl ComputeCommandEncoder for MockEncoder<'_> {
    fn bind_pipeline(&mut self, _pipeline: PipelineId) -> Result<()> {
        self.record("bind_compute_pipeline".to_string())
    }

    fn bind_descriptor_set(&mut self, _pipeline: PipelineId, set_index: u32, set: DescriptorSetId) -> Result<()> {
        self.record(format!("bind_compute_descriptor_set {} {}", set_index, set.0))
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        self.record(format!("dispatch {} {} {}", x, y, z))
    }

    fn end_encoding(&mut self) -> Result<()> {
        let subpass = self.subpass;
        self.record(format!("end_encoding {}", subpass))
    }
}
