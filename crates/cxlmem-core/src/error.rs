//! Error types for CXL mailbox operations

use crate::status::MboxStatus;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Core CXL mailbox errors
#[derive(Debug, Error)]
pub enum CxlError {
    /// A payload or catalog buffer could not be allocated
    #[error("Failed to allocate {size} bytes")]
    AllocationFailed {
        /// Requested size in bytes
        size: usize,
    },

    /// Generic invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Payload size negative or above the device's maximum
    #[error("Payload size {size} out of range (max {max})")]
    PayloadSize {
        /// Requested size
        size: i64,
        /// Device maximum payload size
        max: u32,
    },

    /// Raw opcode 0 is reserved
    #[error("Raw opcode 0 is reserved")]
    ReservedOpcode,

    /// The command's resolved id does not match the expected one
    #[error("Command id mismatch: expected {expected}, got {actual}")]
    CommandMismatch {
        /// Id the caller expected
        expected: u32,
        /// Id the command was built for
        actual: u32,
    },

    /// Operation not valid in the command's current state
    #[error("Invalid command state: {0}")]
    InvalidState(&'static str),

    /// The device's catalog does not contain the command
    #[error("Command {id} is not supported by the device")]
    Unsupported {
        /// Kernel command id
        id: u32,
    },

    /// OS level failure opening the device node or issuing an ioctl
    #[error("Transport error on '{}': {source}", path.display())]
    Transport {
        /// Device node path
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// The device node no longer matches the memdev's recorded identity
    #[error("Device node '{}' is not the expected character device", path.display())]
    DeviceNodeInvalid {
        /// Device node path
        path: PathBuf,
    },

    /// The device reported a failure status
    #[error("Device returned status {status}")]
    Device {
        /// Decoded device status
        status: MboxStatus,
    },

    /// Generic I/O failure carrying the device's status description
    #[error("I/O error (status {status}): {description}")]
    Io {
        /// Raw status code
        status: i32,
        /// Status table description
        description: &'static str,
    },

    /// A background operation was started; output is not final
    #[error("Background operation started, output is not yet available")]
    BackgroundStarted,

    /// Device output too short for the requested decoder
    #[error("Short payload: need {expected} bytes, got {actual}")]
    ShortPayload {
        /// Bytes required
        expected: usize,
        /// Bytes available
        actual: usize,
    },

    /// The discovery or transport backend failed
    #[error("Backend error: {0}")]
    Backend(String),
}

impl CxlError {
    /// Build an `Io` error from a device status
    pub fn io(status: MboxStatus) -> Self {
        CxlError::Io {
            status: status.code(),
            description: status.description(),
        }
    }
}

/// Result type for CXL mailbox operations
pub type Result<T> = std::result::Result<T, CxlError>;
