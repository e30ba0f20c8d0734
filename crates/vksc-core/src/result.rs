//! Driver result codes.
//!
//! `VkResult` is a transparent `i32` so that any value a driver returns can be
//! represented, including codes this crate has no name for.

use std::fmt;

use crate::error::{DriverError, DriverResult};

/// Result code returned by driver entry points.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct VkResult(pub i32);

impl VkResult {
    pub const SUCCESS: Self = Self(0);
    pub const NOT_READY: Self = Self(1);
    pub const TIMEOUT: Self = Self(2);
    pub const INCOMPLETE: Self = Self(5);
    pub const ERROR_OUT_OF_HOST_MEMORY: Self = Self(-1);
    pub const ERROR_OUT_OF_DEVICE_MEMORY: Self = Self(-2);
    pub const ERROR_INITIALIZATION_FAILED: Self = Self(-3);
    pub const ERROR_DEVICE_LOST: Self = Self(-4);
    pub const ERROR_LAYER_NOT_PRESENT: Self = Self(-6);
    pub const ERROR_EXTENSION_NOT_PRESENT: Self = Self(-7);
    pub const ERROR_FEATURE_NOT_PRESENT: Self = Self(-8);
    pub const ERROR_INCOMPATIBLE_DRIVER: Self = Self(-9);
    pub const ERROR_TOO_MANY_OBJECTS: Self = Self(-10);
    pub const ERROR_FORMAT_NOT_SUPPORTED: Self = Self(-11);
    pub const ERROR_UNKNOWN: Self = Self(-13);
    pub const ERROR_OUT_OF_POOL_MEMORY: Self = Self(-1_000_069_000);
    pub const ERROR_INVALID_PIPELINE_CACHE_DATA: Self = Self(-1_000_298_000);
    pub const ERROR_NO_PIPELINE_MATCH: Self = Self(-1_000_298_001);

    /// Non-negative codes are successes (possibly partial).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 0
    }

    /// Convert into a `Result`, keeping the code verbatim on failure.
    pub fn result(self) -> DriverResult<()> {
        if self == Self::SUCCESS {
            Ok(())
        } else {
            Err(DriverError::Vk(self))
        }
    }

    /// Symbolic name for known codes.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        Some(match self.0 {
            0 => "VK_SUCCESS",
            1 => "VK_NOT_READY",
            2 => "VK_TIMEOUT",
            5 => "VK_INCOMPLETE",
            -1 => "VK_ERROR_OUT_OF_HOST_MEMORY",
            -2 => "VK_ERROR_OUT_OF_DEVICE_MEMORY",
            -3 => "VK_ERROR_INITIALIZATION_FAILED",
            -4 => "VK_ERROR_DEVICE_LOST",
            -6 => "VK_ERROR_LAYER_NOT_PRESENT",
            -7 => "VK_ERROR_EXTENSION_NOT_PRESENT",
            -8 => "VK_ERROR_FEATURE_NOT_PRESENT",
            -9 => "VK_ERROR_INCOMPATIBLE_DRIVER",
            -10 => "VK_ERROR_TOO_MANY_OBJECTS",
            -11 => "VK_ERROR_FORMAT_NOT_SUPPORTED",
            -13 => "VK_ERROR_UNKNOWN",
            -1_000_069_000 => "VK_ERROR_OUT_OF_POOL_MEMORY",
            -1_000_298_000 => "VK_ERROR_INVALID_PIPELINE_CACHE_DATA",
            -1_000_298_001 => "VK_ERROR_NO_PIPELINE_MATCH",
            _ => return None,
        })
    }
}

impl Default for VkResult {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl fmt::Debug for VkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "VkResult({})", self.0),
        }
    }
}

impl fmt::Display for VkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
