/*!
# Ember RHI

Backend-neutral pass and resource compilation layer.

A frame is described once as renderpasses of ordered subpasses sharing
render targets. Native pass compilers (`ember_rhi_vulkan`, `ember_rhi_wgpu`)
implement [`backend::PlatformRenderpass`] to turn that description into
native objects and to encode it every frame.

## Architecture

- **BuffersPack**: packs vertex semantics into a few physical buffers
- **VertexDescriptor**: attribute/layout records built from the buffer pack
- **DescriptorLayoutCache / DescriptorPool / DescriptorSetCache**: binding tables
- **Program**: the four numbered binding groups of a draw-call class
- **Renderpass / FrameGraph**: the render graph description
- **FrameRing**: triple-buffered per-frame state
*/

// Internal modules
mod error;
mod engine;
mod context;
pub mod log;
pub mod types;
pub mod buffers;
pub mod vertex;
pub mod descriptor;
pub mod resource_table;
pub mod program;
pub mod backend;
pub mod render_graph;
pub mod frame;

// Main ember namespace module
pub mod ember {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging hub
    pub use crate::engine::Engine;

    // Explicit context threaded through the RHI
    pub use crate::context::RhiContext;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, LogFacadeLogger};
    }
}

// Re-export math library at crate root
pub use glam;
