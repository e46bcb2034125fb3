//! Identify Memory Device

use super::{fixed_str, run, to_fixed, Reader, Writer};
use crate::command::Command;
use crate::error::Result;
use crate::memdev::Memdev;
use crate::uapi::id;

/// Payload size of the identify output
pub const IDENTIFY_SIZE: usize = 67;

/// Capacity fields are reported in multiples of 256 MiB
pub const CAPACITY_MULTIPLIER: u64 = 256 * 1024 * 1024;

/// Identify output
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Identify {
    pub fw_revision: [u8; 16],
    pub total_capacity: u64,
    pub volatile_capacity: u64,
    pub persistent_capacity: u64,
    pub partition_align: u64,
    pub info_event_log_size: u16,
    pub warning_event_log_size: u16,
    pub failure_event_log_size: u16,
    pub fatal_event_log_size: u16,
    pub lsa_size: u32,
    /// 24-bit maximum poison list record count
    pub poison_list_max_mer: u32,
    pub inject_poison_limit: u16,
    pub poison_caps: u8,
    pub qos_telemetry_caps: u8,
}

impl Identify {
    /// Decode from device output
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf, IDENTIFY_SIZE)?;
        let fw_revision = r.bytes::<16>()?;
        let total_capacity = r.u64()?;
        let volatile_capacity = r.u64()?;
        let persistent_capacity = r.u64()?;
        let partition_align = r.u64()?;
        let info_event_log_size = r.u16()?;
        let warning_event_log_size = r.u16()?;
        let failure_event_log_size = r.u16()?;
        let fatal_event_log_size = r.u16()?;
        let lsa_size = r.u32()?;
        let mer = r.bytes::<3>()?;
        Ok(Self {
            fw_revision,
            total_capacity,
            volatile_capacity,
            persistent_capacity,
            partition_align,
            info_event_log_size,
            warning_event_log_size,
            failure_event_log_size,
            fatal_event_log_size,
            lsa_size,
            poison_list_max_mer: u32::from_le_bytes([mer[0], mer[1], mer[2], 0]),
            inject_poison_limit: r.u16()?,
            poison_caps: r.u8()?,
            qos_telemetry_caps: r.u8()?,
        })
    }

    /// Encode to the wire layout
    pub fn encode(&self) -> Vec<u8> {
        let mer = self.poison_list_max_mer.to_le_bytes();
        Writer::with_capacity(IDENTIFY_SIZE)
            .bytes(&self.fw_revision)
            .u64(self.total_capacity)
            .u64(self.volatile_capacity)
            .u64(self.persistent_capacity)
            .u64(self.partition_align)
            .u16(self.info_event_log_size)
            .u16(self.warning_event_log_size)
            .u16(self.failure_event_log_size)
            .u16(self.fatal_event_log_size)
            .u32(self.lsa_size)
            .bytes(&mer[..3])
            .u16(self.inject_poison_limit)
            .u8(self.poison_caps)
            .u8(self.qos_telemetry_caps)
            .finish()
    }

    /// Set the firmware revision text
    pub fn with_fw_revision(mut self, revision: &str) -> Self {
        self.fw_revision = to_fixed(revision);
        self
    }

    /// Firmware revision as text
    pub fn fw_revision_str(&self) -> String {
        fixed_str(&self.fw_revision)
    }

    /// Total capacity in bytes
    pub fn total_capacity_bytes(&self) -> u64 {
        self.total_capacity.saturating_mul(CAPACITY_MULTIPLIER)
    }

    /// Volatile-only capacity in bytes
    pub fn volatile_capacity_bytes(&self) -> u64 {
        self.volatile_capacity.saturating_mul(CAPACITY_MULTIPLIER)
    }

    /// Persistent-only capacity in bytes
    pub fn persistent_capacity_bytes(&self) -> u64 {
        self.persistent_capacity.saturating_mul(CAPACITY_MULTIPLIER)
    }

    /// Partition alignment in bytes
    pub fn partition_align_bytes(&self) -> u64 {
        self.partition_align.saturating_mul(CAPACITY_MULTIPLIER)
    }
}

/// Issue Identify and decode the result
pub fn identify(memdev: &Memdev) -> Result<Identify> {
    let mut cmd = Command::new(memdev, id::IDENTIFY)?;
    run(&mut cmd, &[])?;
    Identify::decode(cmd.output_for(id::IDENTIFY)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_layout() {
        let ident = Identify {
            total_capacity: 4,
            persistent_capacity: 4,
            lsa_size: 0x400,
            poison_list_max_mer: 0x00ab_cdef,
            inject_poison_limit: 0x1234,
            qos_telemetry_caps: 0x5a,
            ..Default::default()
        }
        .with_fw_revision("BWFW 1.0");
        let raw = ident.encode();
        assert_eq!(raw.len(), IDENTIFY_SIZE);
        // lsa_size at 16 + 4 * 8 + 4 * 2
        assert_eq!(&raw[56..60], &[0x00, 0x04, 0x00, 0x00]);
        assert_eq!(&raw[60..63], &[0xef, 0xcd, 0xab]);
        assert_eq!(raw[66], 0x5a);

        let back = Identify::decode(&raw).unwrap();
        assert_eq!(back, ident);
        assert_eq!(back.fw_revision_str(), "BWFW 1.0");
        assert_eq!(back.total_capacity_bytes(), 1 << 30);
    }

    #[test]
    fn test_identify_short() {
        assert!(Identify::decode(&[0u8; IDENTIFY_SIZE - 1]).is_err());
    }
}
