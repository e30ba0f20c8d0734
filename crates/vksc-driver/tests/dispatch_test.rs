#![allow(improper_ctypes_definitions)]

use std::ffi::{CStr, c_char};
use std::sync::atomic::{AtomicU64, Ordering};

use vksc_core::handle::{Device, ImageView, Instance, PhysicalDevice, RawHandle, Sampler};
use vksc_core::info::{
    DeviceCreateInfo, ImageViewCreateInfo, InstanceCreateInfo, SamplerCreateInfo,
};
use vksc_core::{DeviceInterface, DriverError, VkResult};
use vksc_driver::tables::Allocator;
use vksc_driver::{
    DeviceDriver, FunctionLibrary, InstanceDriver, InstanceInterface, Library, LibraryError,
    Platform, PlatformDriver, PlatformInterface, PlatformMemoryLimits, RawFn, StaticLibrary,
};

static IMAGE_VIEWS: AtomicU64 = AtomicU64::new(0);
static DESTROYED_VIEWS: AtomicU64 = AtomicU64::new(0);

unsafe extern "system" fn create_instance(
    _info: *const InstanceCreateInfo,
    _allocator: Allocator,
    out: *mut Instance,
) -> VkResult {
    // SAFETY: the driver passes a valid out pointer.
    unsafe { *out = Instance::from_raw(0x1000) };
    VkResult::SUCCESS
}

unsafe extern "system" fn enumerate_physical_devices(
    _instance: Instance,
    count: *mut u32,
    out: *mut PhysicalDevice,
) -> VkResult {
    // SAFETY: count is valid; out, when non-null, holds *count elements.
    unsafe {
        if out.is_null() {
            *count = 2;
            return VkResult::SUCCESS;
        }
        let n = (*count).min(2);
        for i in 0..n {
            *out.add(i as usize) = PhysicalDevice::from_raw(0x2000 + u64::from(i));
        }
        *count = n;
    }
    VkResult::SUCCESS
}

unsafe extern "system" fn create_device(
    _physical_device: PhysicalDevice,
    _info: *const DeviceCreateInfo,
    _allocator: Allocator,
    out: *mut Device,
) -> VkResult {
    // SAFETY: the driver passes a valid out pointer.
    unsafe { *out = Device::from_raw(0x3000) };
    VkResult::SUCCESS
}

unsafe extern "system" fn create_image_view(
    _device: Device,
    info: *const ImageViewCreateInfo,
    _allocator: Allocator,
    out: *mut ImageView,
) -> VkResult {
    // SAFETY: the driver passes valid pointers.
    let layers = unsafe { (*info).subresource_range.layer_count };
    if layers == 0 {
        return VkResult::ERROR_FORMAT_NOT_SUPPORTED;
    }
    let n = IMAGE_VIEWS.fetch_add(1, Ordering::SeqCst) + 1;
    // SAFETY: see above.
    unsafe { *out = ImageView::from_raw(0x4000 + n) };
    VkResult::SUCCESS
}

unsafe extern "system" fn destroy_image_view(_device: Device, _view: ImageView, _allocator: Allocator) {
    DESTROYED_VIEWS.fetch_add(1, Ordering::SeqCst);
}

fn raw<F: Copy>(f: F) -> RawFn {
    assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<RawFn>());
    // SAFETY: F is a function pointer type of the same size.
    unsafe { std::mem::transmute_copy::<F, RawFn>(&f) }
}

fn lookup(name: &CStr) -> Option<RawFn> {
    type CreateInstance = unsafe extern "system" fn(*const InstanceCreateInfo, Allocator, *mut Instance) -> VkResult;
    type Enumerate = unsafe extern "system" fn(Instance, *mut u32, *mut PhysicalDevice) -> VkResult;
    type CreateDevice =
        unsafe extern "system" fn(PhysicalDevice, *const DeviceCreateInfo, Allocator, *mut Device) -> VkResult;
    type CreateView =
        unsafe extern "system" fn(Device, *const ImageViewCreateInfo, Allocator, *mut ImageView) -> VkResult;
    type DestroyView = unsafe extern "system" fn(Device, ImageView, Allocator);
    type Gdpa = unsafe extern "system" fn(Device, *const c_char) -> Option<RawFn>;

    match name.to_bytes() {
        b"vkCreateInstance" => Some(raw(create_instance as CreateInstance)),
        b"vkEnumeratePhysicalDevices" => Some(raw(enumerate_physical_devices as Enumerate)),
        b"vkCreateDevice" => Some(raw(create_device as CreateDevice)),
        b"vkGetDeviceProcAddr" => Some(raw(get_device_proc_addr as Gdpa)),
        b"vkCreateImageView" => Some(raw(create_image_view as CreateView)),
        b"vkDestroyImageView" => Some(raw(destroy_image_view as DestroyView)),
        _ => None,
    }
}

unsafe extern "system" fn get_instance_proc_addr(_instance: Instance, name: *const c_char) -> Option<RawFn> {
    // SAFETY: the driver passes NUL-terminated names.
    lookup(unsafe { CStr::from_ptr(name) })
}

unsafe extern "system" fn get_device_proc_addr(_device: Device, name: *const c_char) -> Option<RawFn> {
    // SAFETY: the driver passes NUL-terminated names.
    lookup(unsafe { CStr::from_ptr(name) })
}

fn library() -> StaticLibrary {
    type Gipa = unsafe extern "system" fn(Instance, *const c_char) -> Option<RawFn>;
    StaticLibrary::new(&[(
        c"vkGetInstanceProcAddr",
        raw(get_instance_proc_addr as Gipa),
    )])
}

#[test]
fn full_stack_resolves_and_forwards() {
    let lib = library();
    // SAFETY: every fake matches its entry point's signature and reads the Rust descriptor layout.
    let platform = unsafe { PlatformDriver::new(&lib) };
    assert!(platform.functions().missing().contains(&"vkEnumerateInstanceVersion"));

    let instance = platform
        .create_instance(&InstanceCreateInfo::default())
        .unwrap();
    assert_eq!(instance.as_raw(), 0x1000);

    // SAFETY: as above.
    let instance_driver = unsafe { InstanceDriver::new(&platform, instance) };
    let physical = instance_driver.enumerate_physical_devices(instance).unwrap();
    assert_eq!(physical.len(), 2);
    let device = instance_driver
        .create_device(physical[0], &DeviceCreateInfo::default())
        .unwrap();

    // SAFETY: as above.
    let device_driver = unsafe { DeviceDriver::new(&platform, instance, device) };
    let mut info = ImageViewCreateInfo::default();
    info.subresource_range.layer_count = 1;
    let before = DESTROYED_VIEWS.load(Ordering::SeqCst);
    let view = device_driver.create_image_view(device, &info).unwrap();
    assert!(view.as_raw() > 0x4000);
    device_driver.destroy_image_view(device, view);
    assert!(DESTROYED_VIEWS.load(Ordering::SeqCst) > before);
}

#[test]
fn driver_results_are_propagated_verbatim() {
    let lib = library();
    // SAFETY: every fake matches its entry point's signature.
    let platform = unsafe { PlatformDriver::new(&lib) };
    // SAFETY: as above.
    let device_driver =
        unsafe { DeviceDriver::new(&platform, Instance::from_raw(1), Device::from_raw(2)) };
    let err = device_driver
        .create_image_view(Device::from_raw(2), &ImageViewCreateInfo::default())
        .unwrap_err();
    assert_eq!(err, DriverError::Vk(VkResult::ERROR_FORMAT_NOT_SUPPORTED));
}

#[test]
fn unresolved_entry_points_report_their_name() {
    let lib = library();
    // SAFETY: every fake matches its entry point's signature.
    let platform = unsafe { PlatformDriver::new(&lib) };
    // SAFETY: as above.
    let device_driver =
        unsafe { DeviceDriver::new(&platform, Instance::from_raw(1), Device::from_raw(2)) };
    let err = device_driver
        .create_sampler(Device::from_raw(2), &SamplerCreateInfo::default())
        .unwrap_err();
    assert_eq!(err, DriverError::MissingEntryPoint("vkCreateSampler"));
    // Destroys through a missing entry point are silent.
    device_driver.destroy_sampler(Device::from_raw(2), Sampler::from_raw(9));
}

#[test]
fn empty_library_yields_empty_tables() {
    let lib = StaticLibrary::default();
    // SAFETY: nothing resolves.
    let platform = unsafe { PlatformDriver::new(&lib) };
    assert!(platform.functions().get_instance_proc_addr.is_none());
    assert_eq!(
        platform.create_instance(&InstanceCreateInfo::default()),
        Err(DriverError::MissingEntryPoint("vkCreateInstance"))
    );
}

struct FakeLibrary {
    functions: StaticLibrary,
    platform: PlatformDriver,
}

impl Library for FakeLibrary {
    fn platform_interface(&self) -> &dyn PlatformInterface {
        &self.platform
    }

    fn function_library(&self) -> &dyn FunctionLibrary {
        &self.functions
    }
}

struct FakePlatform;

impl Platform for FakePlatform {
    type Library = FakeLibrary;

    fn create_library(&self) -> Result<FakeLibrary, LibraryError> {
        let functions = library();
        // SAFETY: every fake matches its entry point's signature.
        let platform = unsafe { PlatformDriver::new(&functions) };
        Ok(FakeLibrary { functions, platform })
    }

    fn memory_limits(&self) -> PlatformMemoryLimits {
        PlatformMemoryLimits {
            total_system_memory: 256 << 20,
            device_memory_allocation_granularity: 4096,
            ..Default::default()
        }
    }
}

#[test]
fn platform_port_hands_out_a_working_library() {
    let platform = FakePlatform;
    let lib = platform.create_library().unwrap();
    assert!(lib.function_library().get_function(c"vkGetInstanceProcAddr").is_some());
    assert!(lib.function_library().get_function(c"vkCreateInstance").is_none());
    let instance = lib
        .platform_interface()
        .create_instance(&InstanceCreateInfo::default())
        .unwrap();
    assert_eq!(instance.as_raw(), 0x1000);

    let limits = platform.memory_limits();
    assert_eq!(limits.total_device_local_memory, 0);
    assert_eq!(limits.device_memory_allocation_granularity, 4096);

    let mut description = String::new();
    platform.describe_platform(&mut description).unwrap();
    assert!(!description.is_empty());
}
