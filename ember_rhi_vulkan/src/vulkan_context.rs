/// GpuContext - Shared Vulkan instance, device, allocator and queue
///
/// Every Vulkan object of this crate keeps an `Arc<GpuContext>`; the device
/// and instance are destroyed when the last one goes away.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, RawDisplayHandle};
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex, MutexGuard};
use ember_rhi::ember::{Error, Result};
use ember_rhi::{engine_error, engine_info};

pub struct GpuContext {
    _entry: ash::Entry,
    instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,

    /// Dropped before the device in `Drop`
    allocator: ManuallyDrop<Mutex<Allocator>>,

    pub(crate) graphics_queue: vk::Queue,
    pub(crate) graphics_queue_family: u32,

    /// Swapchain device extension enabled (context created for a display)
    presentable: bool,

    #[cfg(feature = "vulkan-validation")]
    debug_utils: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

fn init_error(what: &str, e: impl std::fmt::Debug) -> Error {
    engine_error!("ember::vulkan::GpuContext", "Failed to {}: {:?}", what, e);
    Error::InitializationFailed(format!("Failed to {}: {:?}", what, e))
}

impl GpuContext {
    /// Context without presentation support (offscreen rendering, tests)
    pub fn headless() -> Result<Arc<Self>> {
        Self::create(None)
    }

    /// Context whose instance carries the surface extensions of `display`
    pub fn with_display<D: HasDisplayHandle>(display: &D) -> Result<Arc<Self>> {
        let handle = display
            .display_handle()
            .map_err(|e| init_error("get display handle", e))?;
        Self::create(Some(handle.as_raw()))
    }

    fn create(display: Option<RawDisplayHandle>) -> Result<Arc<Self>> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| init_error("load Vulkan library", e))?;

            let app_info = vk::ApplicationInfo::default()
                .application_name(c"Ember")
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Ember RHI")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            #[allow(unused_mut)]
            let mut extension_names = match display {
                Some(raw) => ash_window::enumerate_required_extensions(raw)
                    .map_err(|e| init_error("get required surface extensions", e))?
                    .to_vec(),
                None => Vec::new(),
            };

            #[cfg(feature = "vulkan-validation")]
            extension_names.push(ash::ext::debug_utils::NAME.as_ptr());

            #[cfg(feature = "vulkan-validation")]
            let layer_names = vec![c"VK_LAYER_KHRONOS_validation".as_ptr()];
            #[cfg(not(feature = "vulkan-validation"))]
            let layer_names: Vec<*const std::ffi::c_char> = Vec::new();

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| init_error("create instance", e))?;

            #[cfg(feature = "vulkan-validation")]
            let debug_utils = Some(crate::debug::create_messenger(&entry, &instance)?);

            let physical_device = instance
                .enumerate_physical_devices()
                .map_err(|e| init_error("enumerate physical devices", e))?
                .into_iter()
                .next()
                .ok_or_else(|| init_error("find a GPU", "no Vulkan-capable device"))?;

            let graphics_queue_family = instance
                .get_physical_device_queue_family_properties(physical_device)
                .iter()
                .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE))
                .map(|i| i as u32)
                .ok_or_else(|| init_error("find a graphics queue family", "none"))?;

            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_queue_family)
                .queue_priorities(&queue_priorities)];

            let presentable = display.is_some();
            let device_extension_names = if presentable {
                vec![ash::khr::swapchain::NAME.as_ptr()]
            } else {
                Vec::new()
            };

            let device_features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(true);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .enabled_features(&device_features);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| init_error("create logical device", e))?;

            let graphics_queue = device.get_device_queue(graphics_queue_family, 0);

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| init_error("create GPU allocator", e))?;

            engine_info!("ember::vulkan::GpuContext",
                "Vulkan device ready (queue family {}, presentable: {})", graphics_queue_family, presentable);

            Ok(Arc::new(Self {
                _entry: entry,
                instance,
                physical_device,
                device,
                allocator: ManuallyDrop::new(Mutex::new(allocator)),
                graphics_queue,
                graphics_queue_family,
                presentable,
                #[cfg(feature = "vulkan-validation")]
                debug_utils,
            }))
        }
    }

    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    pub fn graphics_queue_family(&self) -> u32 {
        self.graphics_queue_family
    }

    pub fn is_presentable(&self) -> bool {
        self.presentable
    }

    pub(crate) fn allocator(&self) -> Result<MutexGuard<'_, Allocator>> {
        self.allocator
            .lock()
            .map_err(|_| Error::BackendError("GPU allocator lock poisoned".to_string()))
    }

    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device
                .device_wait_idle()
                .map_err(|e| ember_rhi::engine_err!("ember::vulkan::GpuContext", "Failed to wait idle: {:?}", e))
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // Allocator pages are freed while the device is alive
            ManuallyDrop::drop(&mut self.allocator);

            #[cfg(feature = "vulkan-validation")]
            if let Some((debug_utils, messenger)) = self.debug_utils.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}
