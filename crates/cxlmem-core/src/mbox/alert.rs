//! Get / Set Alert Configuration
//!
//! The setter takes typed fields and writes each multi-byte threshold
//! little-endian in its own slot.

use super::{run, Reader, Writer};
use crate::command::Command;
use crate::error::Result;
use crate::memdev::Memdev;
use crate::status::Completion;
use crate::uapi::id;
use bitflags::bitflags;

/// Payload size of the get output
pub const GET_ALERT_CONFIG_SIZE: usize = 16;
/// Payload size of the set input
pub const SET_ALERT_CONFIG_SIZE: usize = 12;

bitflags! {
    /// Programmable warning alerts
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AlertFlags: u8 {
        /// Life used warning
        const LIFE_USED = 1 << 0;
        /// Device over-temperature warning
        const OVER_TEMPERATURE = 1 << 1;
        /// Device under-temperature warning
        const UNDER_TEMPERATURE = 1 << 2;
        /// Corrected volatile memory error warning
        const CORRECTED_VOLATILE_ERROR = 1 << 3;
        /// Corrected persistent memory error warning
        const CORRECTED_PERSISTENT_ERROR = 1 << 4;
    }
}

/// Get Alert Configuration output
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlertConfig {
    pub valid_alerts: AlertFlags,
    pub programmable_alerts: AlertFlags,
    pub life_used_critical_threshold: u8,
    pub life_used_warning_threshold: u8,
    pub over_temperature_critical_threshold: u16,
    pub under_temperature_critical_threshold: u16,
    pub over_temperature_warning_threshold: u16,
    pub under_temperature_warning_threshold: u16,
    pub corrected_volatile_error_warning_threshold: u16,
    pub corrected_persistent_error_warning_threshold: u16,
}

impl AlertConfig {
    /// Decode from device output
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf, GET_ALERT_CONFIG_SIZE)?;
        Ok(Self {
            valid_alerts: AlertFlags::from_bits_retain(r.u8()?),
            programmable_alerts: AlertFlags::from_bits_retain(r.u8()?),
            life_used_critical_threshold: r.u8()?,
            life_used_warning_threshold: r.u8()?,
            over_temperature_critical_threshold: r.u16()?,
            under_temperature_critical_threshold: r.u16()?,
            over_temperature_warning_threshold: r.u16()?,
            under_temperature_warning_threshold: r.u16()?,
            corrected_volatile_error_warning_threshold: r.u16()?,
            corrected_persistent_error_warning_threshold: r.u16()?,
        })
    }

    /// Encode to the wire layout
    pub fn encode(&self) -> Vec<u8> {
        Writer::with_capacity(GET_ALERT_CONFIG_SIZE)
            .u8(self.valid_alerts.bits())
            .u8(self.programmable_alerts.bits())
            .u8(self.life_used_critical_threshold)
            .u8(self.life_used_warning_threshold)
            .u16(self.over_temperature_critical_threshold)
            .u16(self.under_temperature_critical_threshold)
            .u16(self.over_temperature_warning_threshold)
            .u16(self.under_temperature_warning_threshold)
            .u16(self.corrected_volatile_error_warning_threshold)
            .u16(self.corrected_persistent_error_warning_threshold)
            .finish()
    }
}

/// Set Alert Configuration input
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetAlertConfig {
    /// Alerts whose threshold and enable bit are being written
    pub valid_alert_actions: AlertFlags,
    /// Alerts to enable among the valid ones
    pub enable_alert_actions: AlertFlags,
    pub life_used_warning_threshold: u8,
    pub over_temperature_warning_threshold: u16,
    pub under_temperature_warning_threshold: u16,
    pub corrected_volatile_error_warning_threshold: u16,
    pub corrected_persistent_error_warning_threshold: u16,
}

impl SetAlertConfig {
    /// Decode from a command input
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf, SET_ALERT_CONFIG_SIZE)?;
        let valid_alert_actions = AlertFlags::from_bits_retain(r.u8()?);
        let enable_alert_actions = AlertFlags::from_bits_retain(r.u8()?);
        let life_used_warning_threshold = r.u8()?;
        r.skip(1)?;
        Ok(Self {
            valid_alert_actions,
            enable_alert_actions,
            life_used_warning_threshold,
            over_temperature_warning_threshold: r.u16()?,
            under_temperature_warning_threshold: r.u16()?,
            corrected_volatile_error_warning_threshold: r.u16()?,
            corrected_persistent_error_warning_threshold: r.u16()?,
        })
    }

    /// Encode to the wire layout
    pub fn encode(&self) -> Vec<u8> {
        Writer::with_capacity(SET_ALERT_CONFIG_SIZE)
            .u8(self.valid_alert_actions.bits())
            .u8(self.enable_alert_actions.bits())
            .u8(self.life_used_warning_threshold)
            .u8(0)
            .u16(self.over_temperature_warning_threshold)
            .u16(self.under_temperature_warning_threshold)
            .u16(self.corrected_volatile_error_warning_threshold)
            .u16(self.corrected_persistent_error_warning_threshold)
            .finish()
    }
}

/// Issue Get Alert Configuration and decode the result
pub fn get_alert_config(memdev: &Memdev) -> Result<AlertConfig> {
    let mut cmd = Command::new(memdev, id::GET_ALERT_CONFIG)?;
    run(&mut cmd, &[])?;
    AlertConfig::decode(cmd.output_for(id::GET_ALERT_CONFIG)?)
}

/// Issue Set Alert Configuration
pub fn set_alert_config(memdev: &Memdev, config: &SetAlertConfig) -> Result<Completion> {
    let mut cmd = Command::new(memdev, id::SET_ALERT_CONFIG)?;
    run(&mut cmd, &config.encode())
}
