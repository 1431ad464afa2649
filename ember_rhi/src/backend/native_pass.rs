/// Native pass storage
///
/// One entry per compiled subpass: either a render pass object or a
/// compute pass object of the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum NativePass<R, C> {
    Render(R),
    Compute(C),
}

impl<R, C> NativePass<R, C> {
    pub fn is_render(&self) -> bool {
        matches!(self, NativePass::Render(_))
    }

    pub fn is_compute(&self) -> bool {
        matches!(self, NativePass::Compute(_))
    }

    pub fn as_render(&self) -> Option<&R> {
        match self {
            NativePass::Render(pass) => Some(pass),
            NativePass::Compute(_) => None,
        }
    }

    pub fn as_render_mut(&mut self) -> Option<&mut R> {
        match self {
            NativePass::Render(pass) => Some(pass),
            NativePass::Compute(_) => None,
        }
    }

    pub fn as_compute(&self) -> Option<&C> {
        match self {
            NativePass::Render(_) => None,
            NativePass::Compute(pass) => Some(pass),
        }
    }
}

#[cfg(test)]
#[path = "native_pass_tests.rs"]
mod tests;
