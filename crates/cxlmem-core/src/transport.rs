//! Backend traits
//!
//! A backend supplies two things: the list of memory devices present on
//! the system ([`Discovery`]) and the two mailbox operations against a
//! device's node ([`Transport`]).
//!
//! Transports must verify, before touching the device, that the node still
//! refers to the device recorded in [`MemdevInfo`] (matching major/minor)
//! and fail with [`CxlError::DeviceNodeInvalid`](crate::CxlError) otherwise.
//! OS level failures are reported as `CxlError::Transport`; the device's own
//! return code is never an error at this layer and is passed back in
//! [`SendCommand::retval`].

use crate::error::Result;
use crate::memdev::MemdevInfo;
use crate::uapi::{QueryCommands, SendCommand};

/// Mailbox ioctl surface of a memory device
pub trait Transport {
    /// Fetch the command catalog
    ///
    /// With `n_commands() == 0` the backend writes the total number of
    /// commands into the header. Otherwise it fills up to `n_commands()`
    /// entries and leaves the header unchanged.
    fn query_commands(&self, memdev: &MemdevInfo, query: &mut QueryCommands) -> Result<()>;

    /// Submit one mailbox command, blocking until the device responds
    fn send_command(&self, memdev: &MemdevInfo, send: &mut SendCommand<'_>) -> Result<()>;
}

/// Enumeration of memory devices
pub trait Discovery {
    /// All memory devices, in discovery order
    ///
    /// Entries that cannot be read are skipped by the backend.
    fn discover(&self) -> Vec<MemdevInfo>;
}
