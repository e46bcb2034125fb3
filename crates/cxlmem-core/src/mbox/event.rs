//! Get / Set Event Interrupt Policy
//!
//! One settings byte per event log: bits 0-1 select the interrupt mode,
//! bits 4-7 the interrupt message number.

use super::{opcode, run, Reader};
use crate::command::Command;
use crate::error::Result;
use crate::memdev::Memdev;
use crate::status::Completion;

/// Payload size of the policy, both directions
pub const EVENT_INTERRUPT_POLICY_SIZE: usize = 4;

/// Interrupt mode of one event log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptMode {
    /// No interrupts
    None,
    /// MSI/MSI-X
    Msi,
    /// Firmware interrupt (EFN VDM)
    Firmware,
    /// Reserved encoding
    Reserved,
}

/// Pack a mode and message number into a settings byte
pub fn settings(mode: InterruptMode, vector: u8) -> u8 {
    let mode = match mode {
        InterruptMode::None => 0,
        InterruptMode::Msi => 1,
        InterruptMode::Firmware => 2,
        InterruptMode::Reserved => 3,
    };
    mode | ((vector & 0x0f) << 4)
}

/// Mode bits of a settings byte
pub fn mode(settings: u8) -> InterruptMode {
    match settings & 0x3 {
        0 => InterruptMode::None,
        1 => InterruptMode::Msi,
        2 => InterruptMode::Firmware,
        _ => InterruptMode::Reserved,
    }
}

/// Message number of a settings byte
pub fn vector(settings: u8) -> u8 {
    settings >> 4
}

/// Event interrupt settings per log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventInterruptPolicy {
    /// Informational event log
    pub info: u8,
    /// Warning event log
    pub warning: u8,
    /// Failure event log
    pub failure: u8,
    /// Fatal event log
    pub fatal: u8,
}

impl EventInterruptPolicy {
    /// Decode from a payload
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf, EVENT_INTERRUPT_POLICY_SIZE)?;
        Ok(Self {
            info: r.u8()?,
            warning: r.u8()?,
            failure: r.u8()?,
            fatal: r.u8()?,
        })
    }

    /// Encode to the wire layout
    pub fn encode(&self) -> Vec<u8> {
        vec![self.info, self.warning, self.failure, self.fatal]
    }
}

/// Read the event interrupt policy
pub fn get_event_interrupt_policy(memdev: &Memdev) -> Result<EventInterruptPolicy> {
    let mut cmd = Command::new_raw(memdev, opcode::GET_EVENT_INTERRUPT_POLICY)?;
    cmd.set_output_payload(None, EVENT_INTERRUPT_POLICY_SIZE as i64)?;
    run(&mut cmd, &[])?;
    EventInterruptPolicy::decode(cmd.raw_output_for(opcode::GET_EVENT_INTERRUPT_POLICY)?)
}

/// Write the event interrupt policy
pub fn set_event_interrupt_policy(
    memdev: &Memdev,
    policy: &EventInterruptPolicy,
) -> Result<Completion> {
    let mut cmd = Command::new_raw(memdev, opcode::SET_EVENT_INTERRUPT_POLICY)?;
    cmd.set_output_payload(None, 0)?;
    run(&mut cmd, &policy.encode())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_byte() {
        let s = settings(InterruptMode::Msi, 3);
        assert_eq!(s, 0x31);
        assert_eq!(mode(s), InterruptMode::Msi);
        assert_eq!(vector(s), 3);
        assert_eq!(mode(settings(InterruptMode::Firmware, 0)), InterruptMode::Firmware);
    }

    #[test]
    fn test_policy_order() {
        let policy = EventInterruptPolicy {
            info: 1,
            warning: 2,
            failure: 3,
            fatal: 4,
        };
        assert_eq!(policy.encode(), [1, 2, 3, 4]);
        assert_eq!(EventInterruptPolicy::decode(&[1, 2, 3, 4]).unwrap(), policy);
    }
}
