/// Render targets and render buffers
///
/// A render target names a texture of the resource table plus how the
/// attachment is used and how its content is loaded and stored. Subpasses
/// refer to targets by index into their renderpass.

use crate::resource_table::{BufferId, TextureId};
use crate::types::{LoadAction, RenderTargetType, StoreAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    texture: TextureId,
    target_type: RenderTargetType,
    load_action: LoadAction,
    store_action: StoreAction,
}

impl RenderTarget {
    pub fn new(texture: TextureId, target_type: RenderTargetType) -> Self {
        Self {
            texture,
            target_type,
            load_action: LoadAction::default(),
            store_action: StoreAction::default(),
        }
    }

    pub fn color(texture: TextureId) -> Self {
        Self::new(texture, RenderTargetType::Color)
    }

    pub fn depth(texture: TextureId) -> Self {
        Self::new(texture, RenderTargetType::Depth)
    }

    pub fn with_load_action(mut self, load_action: LoadAction) -> Self {
        self.load_action = load_action;
        self
    }

    pub fn with_store_action(mut self, store_action: StoreAction) -> Self {
        self.store_action = store_action;
        self
    }

    pub fn texture(&self) -> TextureId {
        self.texture
    }

    pub fn target_type(&self) -> RenderTargetType {
        self.target_type
    }

    pub fn load_action(&self) -> LoadAction {
        self.load_action
    }

    pub fn store_action(&self) -> StoreAction {
        self.store_action
    }
}

/// Storage buffer written by a subpass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderBuffer {
    buffer: BufferId,
    load_action: LoadAction,
    store_action: StoreAction,
}

impl RenderBuffer {
    pub fn new(buffer: BufferId) -> Self {
        Self {
            buffer,
            load_action: LoadAction::Load,
            store_action: StoreAction::Store,
        }
    }

    pub fn with_load_action(mut self, load_action: LoadAction) -> Self {
        self.load_action = load_action;
        self
    }

    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    pub fn load_action(&self) -> LoadAction {
        self.load_action
    }

    pub fn store_action(&self) -> StoreAction {
        self.store_action
    }
}
