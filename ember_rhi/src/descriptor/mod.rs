//! Descriptor layout cache, descriptor pool and descriptor set cache
//!
//! Backend-neutral machinery shared by both compilers. Native objects are
//! created through small factory traits implemented by each backend.

mod binding;
mod layout_cache;
mod pool;
mod set_cache;

pub use binding::{
    BindingType, ShaderStageFlags, DescriptorBinding, DescriptorResource, DescriptorWrite,
    DescriptorSet,
};
pub use layout_cache::{DescriptorLayoutCache, LayoutFactory};
pub use pool::{DescriptorPool, PoolFactory, PoolError};
pub use set_cache::{DescriptorSetCache, DescriptorSetId};

#[cfg(test)]
pub(crate) mod mock;
