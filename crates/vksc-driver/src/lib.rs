//! Driver stack for the Vulkan SC conformance harness.
//!
//! - **Libraries** (`library`): `dlopen`-backed and static function libraries
//! - **Tables** (`tables`): typed entry-point signatures and resolved tables
//! - **Pass-through drivers** (`platform`): platform, instance and device drivers
//! - **Safety-critical wrappers** (`instance_sc`, `device_sc`): gathering/replay routing

mod macros;

pub mod device_sc;
pub mod instance_sc;
pub mod interface;
pub mod library;
pub mod platform;
pub mod tables;

pub use device_sc::DeviceDriverSc;
pub use instance_sc::InstanceDriverSc;
pub use interface::{
    InstanceInterface, Library, Platform, PlatformInterface, PlatformMemoryLimits,
};
pub use library::{DynamicLibrary, FunctionLibrary, LibraryError, RawFn, StaticLibrary};
pub use platform::{DeviceDriver, InstanceDriver, PlatformDriver};
pub use tables::{DeviceFunctions, InstanceFunctions, PlatformFunctions};
