//! Emulated memory device mailbox

use crate::DummyConfig;
use cxlmem_core::mbox::alert::{AlertConfig, AlertFlags, SetAlertConfig};
use cxlmem_core::mbox::background::BackgroundStatus;
use cxlmem_core::mbox::event::{self, EventInterruptPolicy, InterruptMode};
use cxlmem_core::mbox::firmware::FwInfo;
use cxlmem_core::mbox::health::HealthInfo;
use cxlmem_core::mbox::identify::{Identify, CAPACITY_MULTIPLIER};
use cxlmem_core::mbox::logs::{self, CelEntry, GetLogRequest, SupportedLog, CEL_UUID};
use cxlmem_core::mbox::opcode;
use cxlmem_core::uapi::{id, QueryCommands, SendCommand};
use cxlmem_core::MboxStatus;
use log::debug;

/// Mailbox opcodes of the commands listed in the emulated CEL
const CEL_OPCODES: [(u16, u16); 13] = [
    (0x0102, 0),
    (0x0103, 0x0001),
    (0x0200, 0),
    (0x0300, 0),
    (0x0301, 0x0001),
    (0x0400, 0),
    (0x0401, 0),
    (0x4000, 0),
    (0x4102, 0),
    (0x4103, 0x0001),
    (0x4200, 0),
    (0x4201, 0),
    (0x4202, 0x0001),
];

/// State of one emulated memory device
#[derive(Debug, Clone)]
pub struct EmulatedDevice {
    /// Static configuration
    pub config: DummyConfig,
    /// Label storage area contents
    pub lsa: Vec<u8>,
    /// Identify response
    pub identify: Identify,
    /// Health info response
    pub health: HealthInfo,
    /// Current alert configuration
    pub alert: AlertConfig,
    /// Current event interrupt policy
    pub event_policy: EventInterruptPolicy,
    /// Device clock
    pub timestamp: u64,
    /// Firmware slots
    pub fw_info: FwInfo,
    /// Background operation status
    pub background: BackgroundStatus,
    /// Status returned for every command instead of executing it
    pub forced_status: Option<u32>,
    /// Cap on the output size reported for every command
    pub output_limit: Option<u32>,
    /// Current minor number of the node; differs from the config once replaced
    pub node_minor: u64,
    /// Executed query ioctls
    pub query_calls: usize,
    /// Executed send ioctls
    pub send_calls: usize,
}

impl EmulatedDevice {
    /// Create a device in its power-on state
    pub fn new(config: DummyConfig) -> Self {
        let identify = Identify {
            total_capacity: (config.pmem_size + config.ram_size) / CAPACITY_MULTIPLIER,
            volatile_capacity: config.ram_size / CAPACITY_MULTIPLIER,
            persistent_capacity: config.pmem_size / CAPACITY_MULTIPLIER,
            partition_align: 0,
            info_event_log_size: 32,
            warning_event_log_size: 32,
            failure_event_log_size: 32,
            fatal_event_log_size: 32,
            lsa_size: config.lsa_size,
            poison_list_max_mer: 256,
            inject_poison_limit: 8,
            ..Default::default()
        }
        .with_fw_revision(&config.firmware_version);

        let mut fw_info = FwInfo {
            slots_supported: 2,
            slot_info: 1,
            activation_caps: 1,
            ..Default::default()
        };
        fw_info.set_revision(1, &config.firmware_version);

        let alert = AlertConfig {
            valid_alerts: AlertFlags::empty(),
            programmable_alerts: AlertFlags::all(),
            life_used_critical_threshold: 100,
            over_temperature_critical_threshold: 100,
            under_temperature_critical_threshold: (-20i16) as u16,
            ..Default::default()
        };

        let info_settings = event::settings(InterruptMode::Msi, 0);
        Self {
            lsa: vec![0u8; config.lsa_size as usize],
            identify,
            health: HealthInfo {
                temperature: 35,
                ..Default::default()
            },
            alert,
            event_policy: EventInterruptPolicy {
                info: info_settings,
                ..Default::default()
            },
            timestamp: 0,
            fw_info,
            background: BackgroundStatus::from_word(0),
            forced_status: None,
            output_limit: None,
            node_minor: config.minor,
            query_calls: 0,
            send_calls: 0,
            config,
        }
    }

    /// Emulated CXL_MEM_QUERY_COMMANDS
    pub fn query(&mut self, query: &mut QueryCommands) {
        self.query_calls += 1;
        let catalog = &self.config.catalog;
        let requested = query.requested();
        if requested == 0 {
            query.set_n_commands(catalog.len() as u32);
            return;
        }
        let n = (requested as usize).min(catalog.len());
        for (slot, info) in query.slots_mut().iter_mut().zip(&catalog[..n]) {
            *slot = *info;
        }
    }

    /// Emulated CXL_MEM_SEND_COMMAND; `Err` mirrors a driver-level rejection
    pub fn send(&mut self, send: &mut SendCommand<'_>) -> Result<(), &'static str> {
        self.send_calls += 1;

        let info = self
            .config
            .catalog
            .iter()
            .find(|info| info.id == send.id)
            .copied()
            .ok_or("command not in catalog")?;
        if info.size_in >= 0 && send.input.len() != info.size_in as usize {
            return Err("input size does not match declared size");
        }
        if info.size_out >= 0 && send.output.len() < info.size_out as usize {
            return Err("output buffer smaller than declared size");
        }
        if send.id == id::RAW && send.raw_opcode == 0 {
            return Err("raw opcode 0");
        }

        if let Some(retval) = self.forced_status {
            send.out_size = 0;
            send.retval = retval;
            return Ok(());
        }

        let (status, response) = self.execute(send.id, send.raw_opcode, send.input);
        let status = match response {
            Some(data) if data.len() > send.output.len() => MboxStatus::InvalidPayloadLength,
            Some(data) => {
                let len = match self.output_limit {
                    Some(limit) => data.len().min(limit as usize),
                    None => data.len(),
                };
                send.output[..len].copy_from_slice(&data[..len]);
                send.out_size = len as u32;
                status
            }
            None => {
                send.out_size = 0;
                status
            }
        };
        debug!(
            "{}: emulated id {} opcode {:#06x}: status {}",
            self.config.devname,
            send.id,
            send.raw_opcode,
            status.code()
        );
        send.retval = status.code() as u32;
        Ok(())
    }

    fn execute(&mut self, cmd_id: u32, raw_opcode: u16, input: &[u8]) -> (MboxStatus, Option<Vec<u8>>) {
        match cmd_id {
            id::IDENTIFY => ok(self.identify.encode()),
            id::GET_HEALTH_INFO => ok(self.health.encode()),
            id::GET_ALERT_CONFIG => ok(self.alert.encode()),
            id::SET_ALERT_CONFIG => self.set_alert(input),
            id::GET_LSA => self.get_lsa(input),
            id::SET_LSA => self.set_lsa(input),
            id::GET_SUPPORTED_LOGS => ok(logs::encode_supported_logs(&[SupportedLog {
                uuid: CEL_UUID,
                size: (CEL_OPCODES.len() * 4) as u32,
            }])),
            id::GET_LOG => self.get_log(input),
            id::RAW => self.execute_raw(raw_opcode, input),
            _ => (MboxStatus::Unsupported, None),
        }
    }

    fn execute_raw(&mut self, raw_opcode: u16, input: &[u8]) -> (MboxStatus, Option<Vec<u8>>) {
        match raw_opcode {
            opcode::GET_EVENT_INTERRUPT_POLICY => ok(self.event_policy.encode()),
            opcode::SET_EVENT_INTERRUPT_POLICY => match EventInterruptPolicy::decode(input) {
                Ok(policy) => {
                    self.event_policy = policy;
                    (MboxStatus::Success, None)
                }
                Err(_) => (MboxStatus::InvalidPayloadLength, None),
            },
            opcode::GET_FW_INFO => ok(self.fw_info.encode()),
            opcode::GET_TIMESTAMP => ok(self.timestamp.to_le_bytes().to_vec()),
            opcode::SET_TIMESTAMP => match <[u8; 8]>::try_from(input) {
                Ok(raw) => {
                    self.timestamp = u64::from_le_bytes(raw);
                    (MboxStatus::Success, None)
                }
                Err(_) => (MboxStatus::InvalidPayloadLength, None),
            },
            opcode::BACKGROUND_STATUS => ok(self.background.to_word().to_le_bytes().to_vec()),
            opcode::BACKGROUND_TRANSFER_FW | opcode::BACKGROUND_ACTIVATE_FW => {
                if self.background.running {
                    return (MboxStatus::Busy, None);
                }
                self.background = BackgroundStatus {
                    opcode: raw_opcode,
                    percent_complete: 0,
                    running: true,
                    return_code: MboxStatus::Success,
                    extended_status: 0,
                };
                (MboxStatus::BackgroundCommandStarted, None)
            }
            _ => (MboxStatus::Unsupported, None),
        }
    }

    fn lsa_range(&self, offset: u32, length: usize) -> Option<std::ops::Range<usize>> {
        let start = offset as usize;
        let end = start.checked_add(length)?;
        (end <= self.lsa.len()).then_some(start..end)
    }

    fn get_lsa(&self, input: &[u8]) -> (MboxStatus, Option<Vec<u8>>) {
        let Ok(raw) = <[u8; 8]>::try_from(input) else {
            return (MboxStatus::InvalidPayloadLength, None);
        };
        let offset = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let length = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]) as usize;
        match self.lsa_range(offset, length) {
            Some(range) => ok(self.lsa[range].to_vec()),
            None => (MboxStatus::InvalidInput, None),
        }
    }

    fn set_lsa(&mut self, input: &[u8]) -> (MboxStatus, Option<Vec<u8>>) {
        if input.len() < 8 {
            return (MboxStatus::InvalidPayloadLength, None);
        }
        let offset = u32::from_le_bytes([input[0], input[1], input[2], input[3]]);
        let data = &input[8..];
        match self.lsa_range(offset, data.len()) {
            Some(range) => {
                self.lsa[range].copy_from_slice(data);
                (MboxStatus::Success, None)
            }
            None => (MboxStatus::InvalidInput, None),
        }
    }

    fn set_alert(&mut self, input: &[u8]) -> (MboxStatus, Option<Vec<u8>>) {
        let Ok(req) = SetAlertConfig::decode(input) else {
            return (MboxStatus::InvalidPayloadLength, None);
        };
        if !self.alert.programmable_alerts.contains(req.valid_alert_actions) {
            return (MboxStatus::InvalidInput, None);
        }
        let valid = req.valid_alert_actions;
        let a = &mut self.alert;
        if valid.contains(AlertFlags::LIFE_USED) {
            a.life_used_warning_threshold = req.life_used_warning_threshold;
        }
        if valid.contains(AlertFlags::OVER_TEMPERATURE) {
            a.over_temperature_warning_threshold = req.over_temperature_warning_threshold;
        }
        if valid.contains(AlertFlags::UNDER_TEMPERATURE) {
            a.under_temperature_warning_threshold = req.under_temperature_warning_threshold;
        }
        if valid.contains(AlertFlags::CORRECTED_VOLATILE_ERROR) {
            a.corrected_volatile_error_warning_threshold =
                req.corrected_volatile_error_warning_threshold;
        }
        if valid.contains(AlertFlags::CORRECTED_PERSISTENT_ERROR) {
            a.corrected_persistent_error_warning_threshold =
                req.corrected_persistent_error_warning_threshold;
        }
        a.valid_alerts = (a.valid_alerts - valid) | (req.enable_alert_actions & valid);
        (MboxStatus::Success, None)
    }

    fn get_log(&self, input: &[u8]) -> (MboxStatus, Option<Vec<u8>>) {
        let Ok(req) = GetLogRequest::decode(input) else {
            return (MboxStatus::InvalidPayloadLength, None);
        };
        if req.uuid != CEL_UUID {
            return (MboxStatus::InvalidInput, None);
        }
        let entries: Vec<CelEntry> = CEL_OPCODES
            .iter()
            .map(|&(opcode, effect)| CelEntry { opcode, effect })
            .collect();
        let cel = logs::encode_cel(&entries);
        let start = (req.offset as usize).min(cel.len());
        let end = start.saturating_add(req.length as usize).min(cel.len());
        ok(cel[start..end].to_vec())
    }
}

fn ok(data: Vec<u8>) -> (MboxStatus, Option<Vec<u8>>) {
    (MboxStatus::Success, Some(data))
}
