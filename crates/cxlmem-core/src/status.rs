//! Mailbox return codes
//!
//! The device reports the outcome of every mailbox command as a small
//! integer (the `retval` of the send ioctl). Codes 0-22 are defined by the
//! CXL specification; anything else is classified as [`MboxStatus::Unknown`].

use crate::error::{CxlError, Result};
use core::fmt;

/// Number of return codes defined by the CXL specification
pub const MBOX_STATUS_COUNT: usize = 23;

const DESCRIPTIONS: [&str; MBOX_STATUS_COUNT] = [
    "Success: The command completed successfully.",
    "Background Command Started: The background command started successfully. Refer to the Background Command Status register to retrieve the command result.",
    "Invalid Input: A command input was invalid.",
    "Unsupported: The command is not supported.",
    "Internal Error: The command was not completed due to an internal device error.",
    "Retry Required: The command was not completed due to a temporary error. An optional single retry may resolve the issue.",
    "Busy: The device is currently busy processing a background operation. Wait until background command completes and then retry the command.",
    "Media Disabled: The command could not be completed because it requires media access and media is disabled.",
    "FW Transfer in Progress: Only one FW package can be transferred at a time. Complete the current FW package transfer before starting a new one.",
    "FW Transfer Out of Order: The FW package transfer was aborted because the FW package content was transferred out of order.",
    "FW Authentication Failed: The FW package was not saved to the device because the FW package authentication failed.",
    "Invalid Slot: The FW slot specified is not supported or not valid for the requested operation.",
    "Activation Failed, FW Rolled Back: The new FW failed to activate and rolled back to the previous active FW.",
    "Activation Failed, Cold Reset Required: The new FW failed to activate. A cold reset is required.",
    "Invalid Handle: One or more Event Record Handles were invalid.",
    "Invalid Physical Address: The physical address specified is invalid.",
    "Inject Poison Limit Reached: The devices limit on allowed poison injection has been reached. Clear injected poison requests before attempting to inject more.",
    "Permanent Media Failure: The device could not clear poison due to a permanent issue with the media.",
    "Aborted: The background command was aborted by the device.",
    "Invalid Security State: The command is not valid in the current security state.",
    "Incorrect Passphrase: The passphrase does not match the currently set passphrase.",
    "Unsupported Mailbox: The command is not supported on the mailbox it was issued on. Used to indicate an unsupported command issued on the secondary mailbox.",
    "Invalid Payload Length: The payload length specified in the Command Register is not valid. The device is required to perform this check prior to processing any command defined in this specification.",
];

const UNKNOWN_DESCRIPTION: &str =
    "Unknown Status: The device returned a status code that is not defined by the CXL specification.";

/// Mailbox command return code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MboxStatus {
    /// The command completed successfully
    Success,
    /// A background command was started; poll for its result
    BackgroundCommandStarted,
    /// A command input was invalid
    InvalidInput,
    /// The command is not supported
    Unsupported,
    /// Internal device error
    InternalError,
    /// Temporary error, a single retry may succeed
    RetryRequired,
    /// A background operation is in progress
    Busy,
    /// Media access required but media is disabled
    MediaDisabled,
    /// Another firmware package transfer is in progress
    FwTransferInProgress,
    /// Firmware package transferred out of order
    FwTransferOutOfOrder,
    /// Firmware package authentication failed
    FwAuthenticationFailed,
    /// Firmware slot not valid for the operation
    InvalidSlot,
    /// Firmware activation failed and rolled back
    ActivationFailedRolledBack,
    /// Firmware activation failed, cold reset required
    ActivationFailedColdReset,
    /// Invalid event record handle
    InvalidHandle,
    /// Invalid physical address
    InvalidPhysicalAddress,
    /// Poison injection limit reached
    InjectPoisonLimitReached,
    /// Poison could not be cleared due to a permanent media failure
    PermanentMediaFailure,
    /// The background command was aborted
    Aborted,
    /// Command not valid in the current security state
    InvalidSecurityState,
    /// Passphrase mismatch
    IncorrectPassphrase,
    /// Command not supported on this mailbox
    UnsupportedMailbox,
    /// Payload length not valid
    InvalidPayloadLength,
    /// Any code outside 0-22, including negative values
    Unknown(i32),
}

/// Non-failure outcome of a submitted command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The command finished and its output is final
    Complete,
    /// The device started a background operation; output is not final
    BackgroundStarted,
}

impl MboxStatus {
    /// Classify a raw return code
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::BackgroundCommandStarted,
            2 => Self::InvalidInput,
            3 => Self::Unsupported,
            4 => Self::InternalError,
            5 => Self::RetryRequired,
            6 => Self::Busy,
            7 => Self::MediaDisabled,
            8 => Self::FwTransferInProgress,
            9 => Self::FwTransferOutOfOrder,
            10 => Self::FwAuthenticationFailed,
            11 => Self::InvalidSlot,
            12 => Self::ActivationFailedRolledBack,
            13 => Self::ActivationFailedColdReset,
            14 => Self::InvalidHandle,
            15 => Self::InvalidPhysicalAddress,
            16 => Self::InjectPoisonLimitReached,
            17 => Self::PermanentMediaFailure,
            18 => Self::Aborted,
            19 => Self::InvalidSecurityState,
            20 => Self::IncorrectPassphrase,
            21 => Self::UnsupportedMailbox,
            22 => Self::InvalidPayloadLength,
            other => Self::Unknown(other),
        }
    }

    /// The raw return code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::BackgroundCommandStarted => 1,
            Self::InvalidInput => 2,
            Self::Unsupported => 3,
            Self::InternalError => 4,
            Self::RetryRequired => 5,
            Self::Busy => 6,
            Self::MediaDisabled => 7,
            Self::FwTransferInProgress => 8,
            Self::FwTransferOutOfOrder => 9,
            Self::FwAuthenticationFailed => 10,
            Self::InvalidSlot => 11,
            Self::ActivationFailedRolledBack => 12,
            Self::ActivationFailedColdReset => 13,
            Self::InvalidHandle => 14,
            Self::InvalidPhysicalAddress => 15,
            Self::InjectPoisonLimitReached => 16,
            Self::PermanentMediaFailure => 17,
            Self::Aborted => 18,
            Self::InvalidSecurityState => 19,
            Self::IncorrectPassphrase => 20,
            Self::UnsupportedMailbox => 21,
            Self::InvalidPayloadLength => 22,
            Self::Unknown(code) => code,
        }
    }

    /// Human readable description from the CXL specification
    pub fn description(self) -> &'static str {
        match self {
            Self::Unknown(_) => UNKNOWN_DESCRIPTION,
            known => usize::try_from(known.code())
                .ok()
                .and_then(|idx| DESCRIPTIONS.get(idx))
                .copied()
                .unwrap_or(UNKNOWN_DESCRIPTION),
        }
    }

    /// True for code 0
    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// True for code 1
    pub fn is_background_started(self) -> bool {
        self == Self::BackgroundCommandStarted
    }

    /// True for every code other than 0 and 1
    pub fn is_failure(self) -> bool {
        !self.is_success() && !self.is_background_started()
    }

    /// True for codes after which the caller may reasonably retry
    ///
    /// Nothing in this crate retries on its own.
    pub fn is_retry_advised(self) -> bool {
        matches!(self, Self::RetryRequired | Self::Busy)
    }

    /// Map the status onto a completion, or a device failure
    pub fn completion(self) -> Result<Completion> {
        match self {
            Self::Success => Ok(Completion::Complete),
            Self::BackgroundCommandStarted => Ok(Completion::BackgroundStarted),
            status => Err(CxlError::Device { status }),
        }
    }
}

impl fmt::Display for MboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
