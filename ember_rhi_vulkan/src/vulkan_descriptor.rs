/// Vulkan factories behind the shared descriptor caches
///
/// `VulkanLayoutFactory` creates `VkDescriptorSetLayout` objects for the
/// layout cache, `VulkanPoolFactory` creates fixed-capacity pools for the
/// growable descriptor pool.

use ash::vk;
use ember_rhi::descriptor::{DescriptorBinding, LayoutFactory, PoolError, PoolFactory};
use ember_rhi::ember::{Error, Result};
use ember_rhi::engine_err;

use crate::vulkan_format::{binding_type_to_vk, stage_flags_to_vk};

/// Descriptor types every pool reserves room for
const POOL_DESCRIPTOR_TYPES: [vk::DescriptorType; 11] = [
    vk::DescriptorType::SAMPLER,
    vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
    vk::DescriptorType::SAMPLED_IMAGE,
    vk::DescriptorType::STORAGE_IMAGE,
    vk::DescriptorType::UNIFORM_TEXEL_BUFFER,
    vk::DescriptorType::STORAGE_TEXEL_BUFFER,
    vk::DescriptorType::UNIFORM_BUFFER,
    vk::DescriptorType::STORAGE_BUFFER,
    vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC,
    vk::DescriptorType::STORAGE_BUFFER_DYNAMIC,
    vk::DescriptorType::INPUT_ATTACHMENT,
];

/// `pool_size` descriptors of every type
pub(crate) fn pool_sizes(pool_size: u32) -> Vec<vk::DescriptorPoolSize> {
    POOL_DESCRIPTOR_TYPES
        .iter()
        .map(|&ty| vk::DescriptorPoolSize { ty, descriptor_count: pool_size })
        .collect()
}

/// Exhaustion and fragmentation trigger a new pool, anything else is fatal
pub(crate) fn pool_error(result: vk::Result) -> PoolError {
    match result {
        vk::Result::ERROR_OUT_OF_POOL_MEMORY => PoolError::OutOfPoolMemory,
        vk::Result::ERROR_FRAGMENTED_POOL => PoolError::FragmentedPool,
        other => PoolError::Failed(Error::BackendError(format!(
            "Failed to allocate descriptor set: {:?}", other))),
    }
}

pub(crate) struct VulkanLayoutFactory {
    pub(crate) device: ash::Device,
}

impl LayoutFactory for VulkanLayoutFactory {
    type Layout = vk::DescriptorSetLayout;

    fn create_layout(&self, bindings: &[DescriptorBinding]) -> Result<vk::DescriptorSetLayout> {
        let vk_bindings: Vec<vk::DescriptorSetLayoutBinding> = bindings
            .iter()
            .map(|b| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(b.binding)
                    .descriptor_type(binding_type_to_vk(b.binding_type))
                    .descriptor_count(b.count)
                    .stage_flags(stage_flags_to_vk(b.stage_flags))
            })
            .collect();

        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&vk_bindings);

        unsafe {
            self.device
                .create_descriptor_set_layout(&create_info, None)
                .map_err(|e| engine_err!("ember::vulkan::DescriptorLayout",
                    "Failed to create descriptor set layout ({} bindings): {:?}", bindings.len(), e))
        }
    }

    fn destroy_layout(&self, layout: vk::DescriptorSetLayout) {
        unsafe { self.device.destroy_descriptor_set_layout(layout, None); }
    }
}

pub(crate) struct VulkanPoolFactory {
    pub(crate) device: ash::Device,
    pub(crate) pool_size: u32,
}

impl PoolFactory for VulkanPoolFactory {
    type Pool = vk::DescriptorPool;
    type Layout = vk::DescriptorSetLayout;
    type Set = vk::DescriptorSet;

    fn create_pool(&self) -> Result<vk::DescriptorPool> {
        let sizes = pool_sizes(self.pool_size);
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(self.pool_size)
            .pool_sizes(&sizes);

        unsafe {
            self.device
                .create_descriptor_pool(&create_info, None)
                .map_err(|e| engine_err!("ember::vulkan::DescriptorPool",
                    "Failed to create descriptor pool: {:?}", e))
        }
    }

    fn allocate_set(
        &self,
        pool: &vk::DescriptorPool,
        layout: &vk::DescriptorSetLayout,
    ) -> std::result::Result<vk::DescriptorSet, PoolError> {
        let layouts = [*layout];
        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(*pool)
            .set_layouts(&layouts);

        let sets = unsafe { self.device.allocate_descriptor_sets(&allocate_info) }.map_err(pool_error)?;
        sets.into_iter()
            .next()
            .ok_or_else(|| PoolError::Failed(Error::BackendError("Descriptor pool returned no set".to_string())))
    }

    fn reset_pool(&self, pool: &vk::DescriptorPool) -> Result<()> {
        unsafe {
            self.device
                .reset_descriptor_pool(*pool, vk::DescriptorPoolResetFlags::empty())
                .map_err(|e| engine_err!("ember::vulkan::DescriptorPool",
                    "Failed to reset descriptor pool: {:?}", e))
        }
    }

    fn destroy_pool(&self, pool: vk::DescriptorPool) {
        unsafe { self.device.destroy_descriptor_pool(pool, None); }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_sizes_cover_every_type() {
        let sizes = pool_sizes(1024);
        assert_eq!(sizes.len(), 11);
        assert!(sizes.iter().all(|s| s.descriptor_count == 1024));
        assert!(sizes.iter().any(|s| s.ty == vk::DescriptorType::INPUT_ATTACHMENT));
        assert!(sizes.iter().any(|s| s.ty == vk::DescriptorType::COMBINED_IMAGE_SAMPLER));
    }

    #[test]
    fn test_pool_error_retries_on_exhaustion() {
        assert_eq!(pool_error(vk::Result::ERROR_OUT_OF_POOL_MEMORY), PoolError::OutOfPoolMemory);
        assert_eq!(pool_error(vk::Result::ERROR_FRAGMENTED_POOL), PoolError::FragmentedPool);
    }

    #[test]
    fn test_pool_error_propagates_other_failures() {
        match pool_error(vk::Result::ERROR_DEVICE_LOST) {
            PoolError::Failed(Error::BackendError(message)) => assert!(message.contains("DEVICE_LOST")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
