//! Render graph description
//!
//! Backend-neutral topology consumed by the native pass compilers:
//! renderpasses own render targets and ordered subpasses, a frame graph
//! orders renderpasses, and a manager keeps named frame graphs.

mod render_target;
mod rendersubpass;
mod renderpass;
mod frame_graph;
mod frame_graph_manager;
mod pass_action;

pub use render_target::{RenderTarget, RenderBuffer};
pub use rendersubpass::Rendersubpass;
pub use renderpass::{Renderpass, DEFAULT_BACKGROUND, DEFAULT_DIMENSIONS};
pub use frame_graph::FrameGraph;
pub use frame_graph_manager::FrameGraphManager;
pub use pass_action::{PassAction, PassEncoder, SubpassContext, FullscreenAction, CustomAction};

#[cfg(test)]
pub(crate) mod fixtures;
