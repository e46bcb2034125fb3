//! Error types for the Linux CXL backend

use cxlmem_core::CxlError;
use std::io;
use thiserror::Error;

/// Linux CXL backend errors
#[derive(Debug, Error)]
pub enum LinuxCxlError {
    /// Memory device not present in sysfs
    #[error("CXL memory device not found: {0}")]
    DeviceNotFound(String),

    /// Failed to read sysfs attribute
    #[error("Failed to read sysfs attribute '{path}': {source}")]
    SysfsRead {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Failed to parse sysfs attribute
    #[error("Failed to parse sysfs attribute '{path}': {value}")]
    SysfsParse { path: String, value: String },

    /// Failed to stat the device node
    #[error("Failed to stat device node '{path}': {source}")]
    DeviceNode {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: &'static str, message: String },
}

/// Result type for the Linux CXL backend
pub type Result<T> = std::result::Result<T, LinuxCxlError>;

impl From<LinuxCxlError> for CxlError {
    fn from(e: LinuxCxlError) -> Self {
        CxlError::Backend(e.to_string())
    }
}
