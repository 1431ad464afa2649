//! Backend seam
//!
//! Native pass compilers implement [`PlatformRenderpass`] and hand out
//! [`RenderCommandEncoder`]/[`ComputeCommandEncoder`] objects while a
//! renderpass walks its subpasses.

mod platform;
mod encoder;
mod native_pass;

#[cfg(test)]
pub(crate) mod mock;

pub use platform::PlatformRenderpass;
pub use encoder::{RenderCommandEncoder, ComputeCommandEncoder, IndexType, Viewport};
pub use native_pass::NativePass;
