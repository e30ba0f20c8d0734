//! Platform- and instance-level call surfaces, plus the platform description.

use std::ffi::CStr;
use std::fmt;

use vksc_core::DriverResult;
use vksc_core::handle::{Device, Instance, PhysicalDevice};
use vksc_core::info::{DeviceCreateInfo, InstanceCreateInfo};

use crate::library::{FunctionLibrary, RawFn};

pub trait PlatformInterface: Send + Sync {
    /// `vkGetInstanceProcAddr`. A null instance resolves global entry points.
    fn get_instance_proc_addr(&self, instance: Instance, name: &CStr) -> Option<RawFn>;

    fn create_instance(&self, info: &InstanceCreateInfo) -> DriverResult<Instance>;

    fn enumerate_instance_version(&self) -> DriverResult<u32>;
}

pub trait InstanceInterface: Send + Sync {
    fn destroy_instance(&self, instance: Instance);

    fn enumerate_physical_devices(&self, instance: Instance) -> DriverResult<Vec<PhysicalDevice>>;

    fn create_device(
        &self,
        physical_device: PhysicalDevice,
        info: &DeviceCreateInfo,
    ) -> DriverResult<Device>;

    /// `vkGetDeviceProcAddr`.
    fn get_device_proc_addr(&self, device: Device, name: &CStr) -> Option<RawFn>;
}

/// A loaded driver: its function library and the platform driver built on it.
pub trait Library {
    fn platform_interface(&self) -> &dyn PlatformInterface;

    fn function_library(&self) -> &dyn FunctionLibrary;
}

/// Memory the tests of one platform must stay within.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformMemoryLimits {
    /// Bytes of system memory (heap plus host-local).
    pub total_system_memory: usize,
    /// Bytes of device-local memory, or 0 when it counts against system memory.
    pub total_device_local_memory: u64,
    pub device_memory_allocation_granularity: u64,
    pub device_page_size: u64,
    pub device_page_table_entry_size: u64,
    pub device_page_table_hierarchy_levels: usize,
}

/// Entry point of a platform port.
pub trait Platform {
    type Library: Library;

    fn create_library(&self) -> Result<Self::Library, crate::library::LibraryError>;

    fn memory_limits(&self) -> PlatformMemoryLimits;

    fn describe_platform(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str("platform description not available")
    }
}
