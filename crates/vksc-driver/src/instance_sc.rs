//! Instance wrapper for the safety-critical driver stack.

use std::ffi::CStr;

use vksc_core::DriverResult;
use vksc_core::handle::{Device, Instance, PhysicalDevice};
use vksc_core::info::DeviceCreateInfo;
use vksc_membrane::{ProcessMode, ResourceInterface};

use crate::interface::InstanceInterface;
use crate::library::RawFn;
use crate::platform::InstanceDriver;

/// Forwards every instance call; on a successful device creation in the
/// gathering pass, hands the device's enabled features to the collaborator.
pub struct InstanceDriverSc<'r, I: InstanceInterface = InstanceDriver> {
    vk: I,
    mode: ProcessMode,
    resources: &'r dyn ResourceInterface,
}

impl<'r, I: InstanceInterface> InstanceDriverSc<'r, I> {
    pub fn new(vk: I, resources: &'r dyn ResourceInterface) -> Self {
        Self {
            vk,
            mode: resources.process_mode(),
            resources,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> ProcessMode {
        self.mode
    }

    #[must_use]
    pub const fn inner(&self) -> &I {
        &self.vk
    }
}

impl<I: InstanceInterface> InstanceInterface for InstanceDriverSc<'_, I> {
    fn destroy_instance(&self, instance: Instance) {
        self.vk.destroy_instance(instance);
    }

    fn enumerate_physical_devices(&self, instance: Instance) -> DriverResult<Vec<PhysicalDevice>> {
        self.vk.enumerate_physical_devices(instance)
    }

    fn create_device(
        &self,
        physical_device: PhysicalDevice,
        info: &DeviceCreateInfo,
    ) -> DriverResult<Device> {
        let device = self.vk.create_device(physical_device, info)?;
        if self.mode.is_gathering() {
            self.resources.register_device_features(device, info);
        }
        Ok(device)
    }

    fn get_device_proc_addr(&self, device: Device, name: &CStr) -> Option<RawFn> {
        self.vk.get_device_proc_addr(device, name)
    }
}
