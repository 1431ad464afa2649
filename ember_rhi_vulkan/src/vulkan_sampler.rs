/// SamplerCache - VkSampler objects created on first use
///
/// An engine only needs a handful of sampler presets, so samplers are never
/// evicted before shutdown.

use ash::vk;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use ember_rhi::ember::Result;
use ember_rhi::engine_err;
use ember_rhi::resource_table::SamplerType;

use crate::vulkan_context::GpuContext;

/// Filtering and addressing of one preset
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SamplerPreset {
    pub filter: vk::Filter,
    pub mipmap: vk::SamplerMipmapMode,
    pub address: vk::SamplerAddressMode,
    pub anisotropy: Option<f32>,
    pub border: vk::BorderColor,
    pub compare: bool,
}

pub(crate) fn sampler_preset(sampler_type: SamplerType) -> SamplerPreset {
    let linear = |address, anisotropy| SamplerPreset {
        filter: vk::Filter::LINEAR,
        mipmap: vk::SamplerMipmapMode::LINEAR,
        address,
        anisotropy,
        border: vk::BorderColor::FLOAT_OPAQUE_BLACK,
        compare: false,
    };
    let nearest = |address| SamplerPreset {
        filter: vk::Filter::NEAREST,
        mipmap: vk::SamplerMipmapMode::NEAREST,
        address,
        anisotropy: None,
        border: vk::BorderColor::FLOAT_OPAQUE_BLACK,
        compare: false,
    };

    match sampler_type {
        SamplerType::LinearRepeat => linear(vk::SamplerAddressMode::REPEAT, None),
        SamplerType::LinearClamp => linear(vk::SamplerAddressMode::CLAMP_TO_EDGE, None),
        SamplerType::Anisotropic => linear(vk::SamplerAddressMode::REPEAT, Some(16.0)),
        SamplerType::NearestRepeat => nearest(vk::SamplerAddressMode::REPEAT),
        SamplerType::NearestClamp => nearest(vk::SamplerAddressMode::CLAMP_TO_EDGE),
        SamplerType::Shadow => SamplerPreset {
            filter: vk::Filter::LINEAR,
            mipmap: vk::SamplerMipmapMode::NEAREST,
            address: vk::SamplerAddressMode::CLAMP_TO_BORDER,
            anisotropy: None,
            border: vk::BorderColor::FLOAT_OPAQUE_WHITE,
            compare: true,
        },
    }
}

pub(crate) struct SamplerCache {
    ctx: Arc<GpuContext>,
    cache: FxHashMap<SamplerType, vk::Sampler>,
}

impl SamplerCache {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Self {
        Self { ctx, cache: FxHashMap::default() }
    }

    /// Get or create the sampler of `sampler_type`
    pub(crate) fn get(&mut self, sampler_type: SamplerType) -> Result<vk::Sampler> {
        if let Some(&sampler) = self.cache.get(&sampler_type) {
            return Ok(sampler);
        }

        let sampler = self.create(sampler_preset(sampler_type))?;
        self.cache.insert(sampler_type, sampler);
        Ok(sampler)
    }

    fn create(&self, preset: SamplerPreset) -> Result<vk::Sampler> {
        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(preset.filter)
            .min_filter(preset.filter)
            .mipmap_mode(preset.mipmap)
            .address_mode_u(preset.address)
            .address_mode_v(preset.address)
            .address_mode_w(preset.address)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE)
            .border_color(preset.border)
            .compare_enable(preset.compare)
            .compare_op(if preset.compare { vk::CompareOp::LESS_OR_EQUAL } else { vk::CompareOp::ALWAYS })
            .anisotropy_enable(preset.anisotropy.is_some())
            .max_anisotropy(preset.anisotropy.unwrap_or(1.0));

        unsafe {
            self.ctx.device.create_sampler(&create_info, None)
                .map_err(|e| engine_err!("ember::vulkan::SamplerCache", "Failed to create VkSampler: {:?}", e))
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.cache.len()
    }
}

impl Drop for SamplerCache {
    fn drop(&mut self) {
        for (_, sampler) in self.cache.drain() {
            unsafe { self.ctx.device.destroy_sampler(sampler, None); }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadow_sampler_compares() {
        let preset = sampler_preset(SamplerType::Shadow);
        assert!(preset.compare);
        assert_eq!(preset.address, vk::SamplerAddressMode::CLAMP_TO_BORDER);
        assert_eq!(preset.border, vk::BorderColor::FLOAT_OPAQUE_WHITE);
    }

    #[test]
    fn test_only_anisotropic_preset_enables_anisotropy() {
        assert_eq!(sampler_preset(SamplerType::Anisotropic).anisotropy, Some(16.0));
        assert_eq!(sampler_preset(SamplerType::LinearRepeat).anisotropy, None);
        assert_eq!(sampler_preset(SamplerType::NearestClamp).filter, vk::Filter::NEAREST);
    }
}
