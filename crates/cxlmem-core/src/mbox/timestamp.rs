//! Get / Set Timestamp
//!
//! The device timestamp is nanoseconds since the Unix epoch.

use super::{opcode, run, Reader};
use crate::command::Command;
use crate::error::Result;
use crate::memdev::Memdev;
use crate::status::Completion;

const TIMESTAMP_SIZE: usize = 8;

/// Read the device timestamp
pub fn get_timestamp(memdev: &Memdev) -> Result<u64> {
    let mut cmd = Command::new_raw(memdev, opcode::GET_TIMESTAMP)?;
    cmd.set_output_payload(None, TIMESTAMP_SIZE as i64)?;
    run(&mut cmd, &[])?;
    Reader::new(cmd.raw_output_for(opcode::GET_TIMESTAMP)?, TIMESTAMP_SIZE)?.u64()
}

/// Set the device timestamp
pub fn set_timestamp(memdev: &Memdev, timestamp: u64) -> Result<Completion> {
    let mut cmd = Command::new_raw(memdev, opcode::SET_TIMESTAMP)?;
    cmd.set_output_payload(None, 0)?;
    run(&mut cmd, &timestamp.to_le_bytes())
}
