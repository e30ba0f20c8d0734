//! Error taxonomy shared by every driver layer.

use thiserror::Error;

use crate::result::VkResult;

/// Failure of an intercepted or forwarded driver call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The wrapped driver returned a non-success code. Propagated verbatim.
    #[error("driver call failed: {0}")]
    Vk(VkResult),
    /// The entry point was not resolved when the function table was loaded.
    #[error("entry point {0} is not loaded")]
    MissingEntryPoint(&'static str),
    /// An operation reserved for one process mode was invoked in the other.
    #[error("{operation} is not available in {mode} mode")]
    WrongMode {
        operation: &'static str,
        mode: &'static str,
    },
}

impl DriverError {
    /// The driver result code this error maps to when surfaced through a C-style API.
    #[must_use]
    pub const fn vk_result(&self) -> VkResult {
        match self {
            Self::Vk(code) => *code,
            Self::MissingEntryPoint(_) => VkResult::ERROR_INITIALIZATION_FAILED,
            Self::WrongMode { .. } => VkResult::ERROR_UNKNOWN,
        }
    }
}

impl From<VkResult> for DriverError {
    fn from(code: VkResult) -> Self {
        Self::Vk(code)
    }
}

/// Result alias for driver-facing operations.
pub type DriverResult<T> = Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        let err = DriverError::MissingEntryPoint("vkCreateSampler");
        assert_eq!(err.to_string(), "entry point vkCreateSampler is not loaded");
        let err = DriverError::WrongMode {
            operation: "increase_command_buffer_size",
            mode: "replaying",
        };
        assert_eq!(
            err.to_string(),
            "increase_command_buffer_size is not available in replaying mode"
        );
    }

    #[test]
    fn vk_result_mapping() {
        assert_eq!(
            DriverError::Vk(VkResult::ERROR_TOO_MANY_OBJECTS).vk_result(),
            VkResult::ERROR_TOO_MANY_OBJECTS
        );
        assert_eq!(
            DriverError::MissingEntryPoint("vkCreateImageView").vk_result(),
            VkResult::ERROR_INITIALIZATION_FAILED
        );
    }
}
