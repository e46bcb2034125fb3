//! Get FW Info

use super::{fixed_str, opcode, run, to_fixed, Reader, Writer};
use crate::command::Command;
use crate::error::Result;
use crate::memdev::Memdev;

/// Payload size of the FW info output
pub const FW_INFO_SIZE: usize = 80;

/// Number of revision slots in the payload
pub const FW_SLOTS: usize = 4;

/// Get FW Info output
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FwInfo {
    /// Number of slots the device supports
    pub slots_supported: u8,
    /// Bits 0-2 active slot, bits 3-5 slot staged for next activation
    pub slot_info: u8,
    /// Bit 0: online activation supported
    pub activation_caps: u8,
    /// Revision string per slot, NUL padded
    pub revisions: [[u8; 16]; FW_SLOTS],
}

impl FwInfo {
    /// Decode from device output
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf, FW_INFO_SIZE)?;
        let slots_supported = r.u8()?;
        let slot_info = r.u8()?;
        let activation_caps = r.u8()?;
        r.skip(13)?;
        let mut revisions = [[0u8; 16]; FW_SLOTS];
        for rev in revisions.iter_mut() {
            *rev = r.bytes()?;
        }
        Ok(Self {
            slots_supported,
            slot_info,
            activation_caps,
            revisions,
        })
    }

    /// Encode to the wire layout
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(FW_INFO_SIZE);
        w.u8(self.slots_supported)
            .u8(self.slot_info)
            .u8(self.activation_caps)
            .bytes(&[0u8; 13]);
        for rev in &self.revisions {
            w.bytes(rev);
        }
        w.finish()
    }

    /// Active slot number (1-based, 0 if none)
    pub fn active_slot(&self) -> u8 {
        self.slot_info & 0x7
    }

    /// Slot staged for the next activation (0 if none)
    pub fn staged_slot(&self) -> u8 {
        (self.slot_info >> 3) & 0x7
    }

    /// Whether firmware can be activated without a reset
    pub fn online_activation(&self) -> bool {
        self.activation_caps & 0x1 != 0
    }

    /// Revision text for a 1-based slot number
    pub fn revision(&self, slot: u8) -> Option<String> {
        let idx = usize::from(slot).checked_sub(1)?;
        self.revisions.get(idx).map(|rev| fixed_str(rev))
    }

    /// Set the revision text of a 1-based slot number
    pub fn set_revision(&mut self, slot: u8, revision: &str) {
        if let Some(rev) = usize::from(slot)
            .checked_sub(1)
            .and_then(|idx| self.revisions.get_mut(idx))
        {
            *rev = to_fixed(revision);
        }
    }
}

/// Issue Get FW Info and decode the result
pub fn get_fw_info(memdev: &Memdev) -> Result<FwInfo> {
    let mut cmd = Command::new_raw(memdev, opcode::GET_FW_INFO)?;
    cmd.set_output_payload(None, FW_INFO_SIZE as i64)?;
    run(&mut cmd, &[])?;
    FwInfo::decode(cmd.raw_output_for(opcode::GET_FW_INFO)?)
}
