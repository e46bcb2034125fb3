//! Kernel mailbox ABI
//!
//! Command identifiers and the two structures exchanged with the CXL
//! memory device driver: the command catalog returned by the query
//! operation, and the send descriptor whose status is written back by the
//! device. The byte-exact `#[repr(C)]` layouts live in the Linux backend;
//! the types here are what the core state machine works with.

use crate::error::{CxlError, Result};
use bitflags::bitflags;

/// Kernel command identifiers
pub mod id {
    #![allow(missing_docs)]
    pub const INVALID: u32 = 0;
    pub const IDENTIFY: u32 = 1;
    pub const RAW: u32 = 2;
    pub const GET_SUPPORTED_LOGS: u32 = 3;
    pub const GET_FW_INFO: u32 = 4;
    pub const GET_PARTITION_INFO: u32 = 5;
    pub const GET_LSA: u32 = 6;
    pub const GET_HEALTH_INFO: u32 = 7;
    pub const GET_LOG: u32 = 8;
    pub const SET_PARTITION_INFO: u32 = 9;
    pub const SET_LSA: u32 = 10;
    pub const GET_ALERT_CONFIG: u32 = 11;
    pub const SET_ALERT_CONFIG: u32 = 12;
    pub const GET_SHUTDOWN_STATE: u32 = 13;
    pub const SET_SHUTDOWN_STATE: u32 = 14;
    pub const GET_POISON: u32 = 15;
    pub const INJECT_POISON: u32 = 16;
    pub const CLEAR_POISON: u32 = 17;
    pub const GET_SCAN_MEDIA_CAPS: u32 = 18;
    pub const SCAN_MEDIA: u32 = 19;
    pub const GET_SCAN_MEDIA: u32 = 20;
    pub const MAX: u32 = 21;
}

const COMMAND_NAMES: [&str; id::MAX as usize] = [
    "Invalid Command",
    "Identify Command",
    "Raw device command",
    "Get Supported Logs",
    "Get FW Info",
    "Get Partition Information",
    "Get Label Storage Area",
    "Get Health Info",
    "Get Log",
    "Set Partition Information",
    "Set Label Storage Area",
    "Get Alert Configuration",
    "Set Alert Configuration",
    "Get Shutdown State",
    "Set Shutdown State",
    "Get Poison List",
    "Inject Poison",
    "Clear Poison",
    "Get Scan Media Capabilities",
    "Scan Media",
    "Get Scan Media Results",
];

/// Human readable name of a kernel command id
pub fn command_name(id: u32) -> &'static str {
    COMMAND_NAMES
        .get(id as usize)
        .copied()
        .unwrap_or("Unknown Command")
}

/// Declared payload size meaning "variable, up to the device maximum"
pub const VARIABLE_PAYLOAD: i32 = -1;

bitflags! {
    /// Capability flags reported per catalog entry
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CommandFlags: u32 {
        /// The driver will pass this command through
        const ENABLED = 1 << 0;
        /// The command is reserved for exclusive kernel use
        const EXCLUSIVE = 1 << 1;
    }
}

/// One catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandInfo {
    /// Kernel command id
    pub id: u32,
    /// Capability flags
    pub flags: CommandFlags,
    /// Declared input size, `-1` for variable
    pub size_in: i32,
    /// Declared output size, `-1` for variable
    pub size_out: i32,
}

impl CommandInfo {
    /// Construct an enabled catalog entry
    pub const fn new(id: u32, size_in: i32, size_out: i32) -> Self {
        Self {
            id,
            flags: CommandFlags::ENABLED,
            size_in,
            size_out,
        }
    }
}

/// Catalog fetch buffer
///
/// Mirrors the kernel's length-prefixed query structure: `n_commands` is
/// both the capacity the caller offers and, when zero, the slot the driver
/// writes the total command count into. Entries beyond `n_commands` are
/// never reported.
#[derive(Debug, Clone, Default)]
pub struct QueryCommands {
    n_commands: u32,
    entries: Vec<CommandInfo>,
}

impl QueryCommands {
    /// Buffer with room for `n` entries and `n_commands` set to `n`
    pub fn with_capacity(n: u32) -> Result<Self> {
        let count = n as usize;
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(count)
            .map_err(|_| CxlError::AllocationFailed {
                size: count * core::mem::size_of::<CommandInfo>(),
            })?;
        entries.resize(count, CommandInfo::default());
        Ok(Self {
            n_commands: n,
            entries,
        })
    }

    /// Header value: requested capacity, or total count after a zero query
    pub fn n_commands(&self) -> u32 {
        self.n_commands
    }

    /// Overwrite the header value
    pub fn set_n_commands(&mut self, n: u32) {
        self.n_commands = n;
    }

    /// Number of entry slots available
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Header value to hand the driver, never more than the slots available
    pub fn requested(&self) -> u32 {
        let capacity = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
        self.n_commands.min(capacity)
    }

    /// Mutable entry slots, for the transport to fill
    pub fn slots_mut(&mut self) -> &mut [CommandInfo] {
        &mut self.entries
    }

    /// Entries reported by the driver
    pub fn entries(&self) -> &[CommandInfo] {
        let n = (self.n_commands as usize).min(self.entries.len());
        &self.entries[..n]
    }

    /// Consume into the reported entries
    pub fn into_entries(mut self) -> Vec<CommandInfo> {
        let n = (self.n_commands as usize).min(self.entries.len());
        self.entries.truncate(n);
        self.entries
    }
}

/// Send descriptor
///
/// The transport copies `input` to the device and the device's response
/// into `output`. On return `out_size` holds the byte count the device
/// actually produced and `retval` holds the mailbox return code.
#[derive(Debug)]
pub struct SendCommand<'a> {
    /// Kernel command id
    pub id: u32,
    /// Mailbox opcode, only meaningful for [`id::RAW`]
    pub raw_opcode: u16,
    /// Input payload
    pub input: &'a [u8],
    /// Output payload
    pub output: &'a mut [u8],
    /// Bytes of output produced
    pub out_size: u32,
    /// Device return code
    pub retval: u32,
}

impl<'a> SendCommand<'a> {
    /// Build a descriptor; `out_size` starts at the output capacity
    pub fn new(id: u32, raw_opcode: u16, input: &'a [u8], output: &'a mut [u8]) -> Self {
        let out_size = u32::try_from(output.len()).unwrap_or(u32::MAX);
        Self {
            id,
            raw_opcode,
            input,
            output,
            out_size,
            retval: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names() {
        assert_eq!(command_name(id::GET_LSA), "Get Label Storage Area");
        assert_eq!(command_name(id::GET_SCAN_MEDIA), "Get Scan Media Results");
        assert_eq!(command_name(id::MAX), "Unknown Command");
        assert_eq!(command_name(u32::MAX), "Unknown Command");
    }

    #[test]
    fn test_query_entries_bounded_by_header() {
        let mut q = QueryCommands::with_capacity(4).unwrap();
        q.slots_mut()[0] = CommandInfo::new(id::IDENTIFY, 0, 67);
        q.slots_mut()[1] = CommandInfo::new(id::GET_LSA, 8, -1);
        q.set_n_commands(2);
        assert_eq!(q.capacity(), 4);
        assert_eq!(q.entries().len(), 2);
        assert_eq!(q.entries()[1].size_out, VARIABLE_PAYLOAD);

        // A header larger than the buffer never reads past it
        q.set_n_commands(40);
        assert_eq!(q.entries().len(), 4);
        assert_eq!(q.requested(), 4);
    }

    #[test]
    fn test_requested_clamped_to_capacity() {
        let mut q = QueryCommands::with_capacity(0).unwrap();
        q.set_n_commands(64);
        assert_eq!(q.n_commands(), 64);
        assert_eq!(q.requested(), 0);

        let mut q = QueryCommands::with_capacity(8).unwrap();
        q.set_n_commands(3);
        assert_eq!(q.requested(), 3);
    }

    #[test]
    fn test_zero_capacity_query() {
        let q = QueryCommands::with_capacity(0).unwrap();
        assert_eq!(q.n_commands(), 0);
        assert!(q.entries().is_empty());
    }

    #[test]
    fn test_send_out_size_starts_at_capacity() {
        let mut out = [0u8; 16];
        let send = SendCommand::new(id::RAW, 0x300, &[], &mut out);
        assert_eq!(send.out_size, 16);
        assert_eq!(send.retval, 0);
    }
}
