//! Background operation status and triggers
//!
//! Vendor opcodes. The status word is read on demand; nothing here polls.

use super::{opcode, run, Reader};
use crate::command::Command;
use crate::error::Result;
use crate::memdev::Memdev;
use crate::status::{Completion, MboxStatus};
use std::fmt;

const BACKGROUND_STATUS_SIZE: usize = 8;

/// Decoded background operation status word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundStatus {
    /// Opcode of the last background command
    pub opcode: u16,
    /// Percent complete, 0-100
    pub percent_complete: u8,
    /// A background command is running
    pub running: bool,
    /// Return code of the finished command
    pub return_code: MboxStatus,
    /// Vendor extended status
    pub extended_status: u16,
}

impl BackgroundStatus {
    /// Split the 64-bit status word into its fields
    pub fn from_word(word: u64) -> Self {
        Self {
            opcode: (word & 0xffff) as u16,
            percent_complete: ((word >> 16) & 0x7f) as u8,
            running: (word >> 23) & 0x1 != 0,
            return_code: MboxStatus::from_code(((word >> 32) & 0xffff) as i32),
            extended_status: ((word >> 48) & 0xffff) as u16,
        }
    }

    /// Pack the fields back into a status word
    pub fn to_word(&self) -> u64 {
        u64::from(self.opcode)
            | (u64::from(self.percent_complete & 0x7f) << 16)
            | (u64::from(self.running) << 23)
            | ((self.return_code.code() as u64 & 0xffff) << 32)
            | (u64::from(self.extended_status) << 48)
    }
}

impl fmt::Display for BackgroundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "opcode {:#06x} {}% {} (return {}, extended {:#06x})",
            self.opcode,
            self.percent_complete,
            if self.running { "running" } else { "idle" },
            self.return_code.code(),
            self.extended_status
        )
    }
}

/// Read the background operation status
pub fn get_background_status(memdev: &Memdev) -> Result<BackgroundStatus> {
    let mut cmd = Command::new_raw(memdev, opcode::BACKGROUND_STATUS)?;
    cmd.set_output_payload(None, BACKGROUND_STATUS_SIZE as i64)?;
    run(&mut cmd, &[])?;
    let word = Reader::new(
        cmd.raw_output_for(opcode::BACKGROUND_STATUS)?,
        BACKGROUND_STATUS_SIZE,
    )?
    .u64()?;
    log::debug!("{}: background status {:#018x}", memdev.devname(), word);
    Ok(BackgroundStatus::from_word(word))
}

fn trigger(memdev: &Memdev, opcode: u16) -> Result<Completion> {
    let mut cmd = Command::new_raw(memdev, opcode)?;
    cmd.set_output_payload(None, 0)?;
    let completion = run(&mut cmd, &[])?;
    if completion == Completion::BackgroundStarted {
        log::info!("{}: background operation {:#06x} started", memdev.devname(), opcode);
    }
    Ok(completion)
}

/// Start a background firmware transfer
pub fn transfer_fw(memdev: &Memdev) -> Result<Completion> {
    trigger(memdev, opcode::BACKGROUND_TRANSFER_FW)
}

/// Start a background firmware activation
pub fn activate_fw(memdev: &Memdev) -> Result<Completion> {
    trigger(memdev, opcode::BACKGROUND_ACTIVATE_FW)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_word_fields() {
        let word = 0x0012_0006_00b2_cd01u64;
        let st = BackgroundStatus::from_word(word);
        assert_eq!(st.opcode, 0xcd01);
        assert_eq!(st.percent_complete, 0x32);
        assert!(st.running);
        assert_eq!(st.return_code, MboxStatus::Busy);
        assert_eq!(st.extended_status, 0x0012);
        assert_eq!(st.to_word(), word);
    }

    #[test]
    fn test_idle_word() {
        let st = BackgroundStatus::from_word(0x64 << 16);
        assert_eq!(st.percent_complete, 100);
        assert!(!st.running);
        assert_eq!(st.return_code, MboxStatus::Success);
    }
}
