//! Shader program binding groups
//!
//! Builds the four numbered descriptor sets of a draw-call class from
//! optional per-draw resources and registers them with a backend.

mod program;

pub use program::{
    Program, ProgramResources, DescriptorAllocator, EnvironmentMaps,
    SET_PER_FRAME, SET_PER_VIEW, SET_SKIN, SET_MATERIAL,
};
