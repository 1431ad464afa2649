/// Rendersubpass
///
/// One stage of a renderpass. Refers to its renderpass' render targets and
/// render buffers by index. Transient subpasses run once and then only after
/// `invalidate`; persistent subpasses run every frame.

use crate::program::Program;
use crate::types::{RenderpassState, RenderpassTechnique, RenderpassType};
use super::pass_action::PassAction;

pub struct Rendersubpass {
    name: String,
    technique: RenderpassTechnique,
    pass_type: RenderpassType,
    state: RenderpassState,
    render_targets: Vec<u32>,
    input_attachments: Vec<u32>,
    rendered_inputs: Vec<u32>,
    buffer_inputs: Vec<u32>,
    has_depth: bool,
    debug_output: bool,
    is_final: bool,
    pending: bool,
    program: Option<Program>,
    action: Option<Box<dyn PassAction>>,
}

impl Rendersubpass {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            technique: RenderpassTechnique::default(),
            pass_type: RenderpassType::default(),
            state: RenderpassState::default(),
            render_targets: Vec::new(),
            input_attachments: Vec::new(),
            rendered_inputs: Vec::new(),
            buffer_inputs: Vec::new(),
            has_depth: false,
            debug_output: false,
            is_final: false,
            pending: true,
            program: None,
            action: None,
        }
    }

    pub fn with_technique(mut self, technique: RenderpassTechnique) -> Self {
        self.technique = technique;
        self
    }

    pub fn with_type(mut self, pass_type: RenderpassType) -> Self {
        self.pass_type = pass_type;
        self
    }

    pub fn with_state(mut self, state: RenderpassState) -> Self {
        self.state = state;
        self
    }

    /// Targets written by this subpass, color attachments in order
    pub fn with_render_targets(mut self, targets: &[u32]) -> Self {
        self.render_targets = targets.to_vec();
        self
    }

    /// Targets read as input attachments, written by an earlier subpass
    pub fn with_input_attachments(mut self, targets: &[u32]) -> Self {
        self.input_attachments = targets.to_vec();
        self
    }

    /// Targets sampled as textures, e.g. a shadow map
    pub fn with_rendered_inputs(mut self, targets: &[u32]) -> Self {
        self.rendered_inputs = targets.to_vec();
        self
    }

    pub fn with_buffer_inputs(mut self, buffers: &[u32]) -> Self {
        self.buffer_inputs = buffers.to_vec();
        self
    }

    pub fn with_depth(mut self, has_depth: bool) -> Self {
        self.has_depth = has_depth;
        self
    }

    pub fn with_debug_output(mut self, debug_output: bool) -> Self {
        self.debug_output = debug_output;
        self
    }

    /// Mark as the subpass drawing into the presentable surface
    pub fn as_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn with_program(mut self, program: Program) -> Self {
        self.program = Some(program);
        self
    }

    pub fn with_action<A: PassAction + 'static>(mut self, action: A) -> Self {
        self.action = Some(Box::new(action));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn technique(&self) -> RenderpassTechnique {
        self.technique
    }

    pub fn pass_type(&self) -> RenderpassType {
        self.pass_type
    }

    pub fn state(&self) -> RenderpassState {
        self.state
    }

    pub fn render_targets(&self) -> &[u32] {
        &self.render_targets
    }

    pub fn input_attachments(&self) -> &[u32] {
        &self.input_attachments
    }

    pub fn rendered_inputs(&self) -> &[u32] {
        &self.rendered_inputs
    }

    pub fn buffer_inputs(&self) -> &[u32] {
        &self.buffer_inputs
    }

    pub fn has_depth(&self) -> bool {
        self.has_depth
    }

    pub fn debug_output(&self) -> bool {
        self.debug_output
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    pub fn program_mut(&mut self) -> Option<&mut Program> {
        self.program.as_mut()
    }

    pub fn set_program(&mut self, program: Program) {
        self.program = Some(program);
    }

    pub fn set_state(&mut self, state: RenderpassState) {
        self.state = state;
    }

    pub fn set_action<A: PassAction + 'static>(&mut self, action: A) {
        self.action = Some(Box::new(action));
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub(crate) fn action_parts(&mut self) -> (Option<&mut Box<dyn PassAction>>, Option<&Program>, &str) {
        (self.action.as_mut(), self.program.as_ref(), &self.name)
    }

    /// Schedule a transient subpass for the next execution
    pub fn invalidate(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub(crate) fn mark_executed(&mut self) {
        self.pending = false;
    }

    /// Persistent subpasses always run, transient ones only while pending
    pub fn should_execute(&self) -> bool {
        match self.state {
            RenderpassState::Persistent => true,
            RenderpassState::Transient => self.pending,
        }
    }
}

impl std::fmt::Debug for Rendersubpass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rendersubpass")
            .field("name", &self.name)
            .field("technique", &self.technique)
            .field("state", &self.state)
            .field("render_targets", &self.render_targets)
            .field("input_attachments", &self.input_attachments)
            .field("is_final", &self.is_final)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}
