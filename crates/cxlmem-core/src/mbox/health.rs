//! Get Health Info

use super::{run, Reader, Writer};
use crate::command::Command;
use crate::error::Result;
use crate::memdev::Memdev;
use crate::uapi::id;
use bitflags::bitflags;

/// Payload size of the health info output
pub const HEALTH_INFO_SIZE: usize = 18;

/// Life used value meaning "not implemented"
pub const LIFE_USED_NOT_IMPLEMENTED: u8 = 0xff;
/// Temperature value meaning "not implemented"
pub const TEMPERATURE_NOT_IMPLEMENTED: u16 = 0xffff;

bitflags! {
    /// Health status bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HealthStatus: u8 {
        /// Maintenance needed
        const MAINTENANCE_NEEDED = 1 << 0;
        /// Performance degraded
        const PERFORMANCE_DEGRADED = 1 << 1;
        /// Hardware replacement needed
        const HW_REPLACEMENT_NEEDED = 1 << 2;
    }
}

/// Media status values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaStatus {
    /// Media is operating normally
    Normal,
    /// Media is not ready
    NotReady,
    /// Persistence lost on write
    WritePersistencyLost,
    /// All data lost
    AllDataLost,
    /// Persistence loss imminent on power loss
    PowerLossPersistencyLoss,
    /// Persistence loss imminent on shutdown
    ShutdownPersistencyLoss,
    /// Persistence loss imminent
    PersistencyLossImminent,
    /// Data loss imminent on power loss
    PowerLossDataLoss,
    /// Data loss imminent on shutdown
    ShutdownDataLoss,
    /// Data loss imminent
    DataLossImminent,
    /// Reserved value
    Reserved(u8),
}

impl From<u8> for MediaStatus {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Normal,
            1 => Self::NotReady,
            2 => Self::WritePersistencyLost,
            3 => Self::AllDataLost,
            4 => Self::PowerLossPersistencyLoss,
            5 => Self::ShutdownPersistencyLoss,
            6 => Self::PersistencyLossImminent,
            7 => Self::PowerLossDataLoss,
            8 => Self::ShutdownDataLoss,
            9 => Self::DataLossImminent,
            other => Self::Reserved(other),
        }
    }
}

/// Get Health Info output
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HealthInfo {
    pub health_status: u8,
    pub media_status: u8,
    pub ext_status: u8,
    pub life_used: u8,
    pub temperature: u16,
    pub dirty_shutdowns: u32,
    pub volatile_errors: u32,
    pub pmem_errors: u32,
}

impl HealthInfo {
    /// Decode from device output
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf, HEALTH_INFO_SIZE)?;
        Ok(Self {
            health_status: r.u8()?,
            media_status: r.u8()?,
            ext_status: r.u8()?,
            life_used: r.u8()?,
            temperature: r.u16()?,
            dirty_shutdowns: r.u32()?,
            volatile_errors: r.u32()?,
            pmem_errors: r.u32()?,
        })
    }

    /// Encode to the wire layout
    pub fn encode(&self) -> Vec<u8> {
        Writer::with_capacity(HEALTH_INFO_SIZE)
            .u8(self.health_status)
            .u8(self.media_status)
            .u8(self.ext_status)
            .u8(self.life_used)
            .u16(self.temperature)
            .u32(self.dirty_shutdowns)
            .u32(self.volatile_errors)
            .u32(self.pmem_errors)
            .finish()
    }

    /// Health status bits
    pub fn status(&self) -> HealthStatus {
        HealthStatus::from_bits_truncate(self.health_status)
    }

    /// Media status
    pub fn media(&self) -> MediaStatus {
        MediaStatus::from(self.media_status)
    }

    /// Percentage of device life used, if reported
    pub fn life_used_percent(&self) -> Option<u8> {
        (self.life_used != LIFE_USED_NOT_IMPLEMENTED).then_some(self.life_used)
    }

    /// Device temperature in degrees Celsius, if reported
    pub fn temperature_celsius(&self) -> Option<i16> {
        (self.temperature != TEMPERATURE_NOT_IMPLEMENTED).then_some(self.temperature as i16)
    }

    /// Life used alert state (ext status bits 0-1)
    pub fn life_used_state(&self) -> u8 {
        self.ext_status & 0x3
    }

    /// Temperature alert state (ext status bits 2-3)
    pub fn temperature_state(&self) -> u8 {
        (self.ext_status >> 2) & 0x3
    }

    /// Corrected volatile error count over threshold (ext status bit 4)
    pub fn volatile_errors_over_threshold(&self) -> bool {
        self.ext_status & (1 << 4) != 0
    }

    /// Corrected persistent error count over threshold (ext status bit 5)
    pub fn pmem_errors_over_threshold(&self) -> bool {
        self.ext_status & (1 << 5) != 0
    }
}

/// Issue Get Health Info and decode the result
pub fn get_health_info(memdev: &Memdev) -> Result<HealthInfo> {
    let mut cmd = Command::new(memdev, id::GET_HEALTH_INFO)?;
    run(&mut cmd, &[])?;
    HealthInfo::decode(cmd.output_for(id::GET_HEALTH_INFO)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_decode() {
        let raw = [
            0x05, 0x00, 0x31, 42, 0xe8, 0xff, 1, 0, 0, 0, 2, 0, 0, 0, 0x00, 0x01, 0, 0,
        ];
        let info = HealthInfo::decode(&raw).unwrap();
        assert_eq!(
            info.status(),
            HealthStatus::MAINTENANCE_NEEDED | HealthStatus::HW_REPLACEMENT_NEEDED
        );
        assert_eq!(info.media(), MediaStatus::Normal);
        assert_eq!(info.life_used_percent(), Some(42));
        assert_eq!(info.temperature_celsius(), Some(-24));
        assert_eq!(info.life_used_state(), 1);
        assert!(info.pmem_errors_over_threshold());
        assert!(info.volatile_errors_over_threshold());
        assert_eq!(info.dirty_shutdowns, 1);
        assert_eq!(info.pmem_errors, 0x100);
        assert_eq!(info.encode(), raw);
    }

    #[test]
    fn test_health_not_implemented_fields() {
        let info = HealthInfo {
            life_used: LIFE_USED_NOT_IMPLEMENTED,
            temperature: TEMPERATURE_NOT_IMPLEMENTED,
            media_status: 12,
            ..Default::default()
        };
        assert_eq!(info.life_used_percent(), None);
        assert_eq!(info.temperature_celsius(), None);
        assert_eq!(info.media(), MediaStatus::Reserved(12));
    }
}
