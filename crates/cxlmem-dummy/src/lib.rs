//! cxlmem-dummy - In-memory CXL memory device emulator for testing
//!
//! This crate provides a backend that emulates one or more CXL memory
//! devices in memory: a command catalog, a label storage area, and the
//! state behind the typed mailbox commands. It's useful for testing the
//! mailbox pipeline without hardware, and counts the ioctls it executes so
//! tests can assert exactly when the device was touched.
//!
//! Faults can be injected per device: a forced status code returned for
//! every command, or a replaced device node that fails identity checks.

use cxlmem_core::uapi::{id, CommandInfo, QueryCommands, SendCommand, VARIABLE_PAYLOAD};
use cxlmem_core::{CxlError, Discovery, MemdevInfo, Result, Transport};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;

mod device;

pub use device::EmulatedDevice;

/// Catalog of the default emulated device
pub fn default_catalog() -> Vec<CommandInfo> {
    vec![
        CommandInfo::new(id::IDENTIFY, 0, 67),
        CommandInfo::new(id::RAW, VARIABLE_PAYLOAD, VARIABLE_PAYLOAD),
        CommandInfo::new(id::GET_SUPPORTED_LOGS, 0, VARIABLE_PAYLOAD),
        CommandInfo::new(id::GET_FW_INFO, 0, 80),
        CommandInfo::new(id::GET_LSA, 8, VARIABLE_PAYLOAD),
        CommandInfo::new(id::GET_HEALTH_INFO, 0, 18),
        CommandInfo::new(id::GET_LOG, 24, VARIABLE_PAYLOAD),
        CommandInfo::new(id::SET_LSA, VARIABLE_PAYLOAD, 0),
        CommandInfo::new(id::GET_ALERT_CONFIG, 0, 16),
        CommandInfo::new(id::SET_ALERT_CONFIG, 12, 0),
    ]
}

/// Configuration for one emulated memory device
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Device number
    pub id: u32,
    /// Device name
    pub devname: String,
    /// Node major number
    pub major: u64,
    /// Node minor number
    pub minor: u64,
    /// Persistent capacity in bytes
    pub pmem_size: u64,
    /// Volatile capacity in bytes
    pub ram_size: u64,
    /// Maximum mailbox payload in bytes
    pub payload_max: u32,
    /// Label storage area size in bytes
    pub lsa_size: u32,
    /// Firmware version string
    pub firmware_version: String,
    /// Commands the device reports
    pub catalog: Vec<CommandInfo>,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            id: 0,
            devname: "mem0".to_string(),
            major: 250,
            minor: 0,
            pmem_size: 1 << 30,
            ram_size: 0,
            payload_max: 4096,
            lsa_size: 1024,
            firmware_version: "DUMMY 1.0".to_string(),
            catalog: default_catalog(),
        }
    }
}

impl DummyConfig {
    /// Default device renamed to `memN`
    pub fn with_id(id: u32) -> Self {
        Self {
            id,
            devname: format!("mem{}", id),
            minor: u64::from(id),
            ..Default::default()
        }
    }

    /// Override the label storage size
    pub fn lsa_size(mut self, lsa_size: u32) -> Self {
        self.lsa_size = lsa_size;
        self
    }

    /// Override the maximum payload size
    pub fn payload_max(mut self, payload_max: u32) -> Self {
        self.payload_max = payload_max;
        self
    }

    /// Override the command catalog
    pub fn catalog(mut self, catalog: Vec<CommandInfo>) -> Self {
        self.catalog = catalog;
        self
    }

    fn info(&self) -> MemdevInfo {
        MemdevInfo {
            id: self.id,
            devname: self.devname.clone(),
            major: self.major,
            minor: self.minor,
            pmem_size: self.pmem_size,
            ram_size: self.ram_size,
            payload_max: self.payload_max,
            lsa_size: self.lsa_size,
            firmware_version: self.firmware_version.clone(),
            sysfs_path: PathBuf::from("/sys/bus/cxl/devices").join(&self.devname),
            dev_path: PathBuf::from("/dev/cxl").join(&self.devname),
        }
    }
}

/// Emulated backend
///
/// Devices are looked up by id; when ids repeat the first device wins,
/// matching how a context coalesces them.
pub struct DummyCxl {
    devices: RefCell<Vec<EmulatedDevice>>,
    discover_calls: Cell<usize>,
}

impl DummyCxl {
    /// Backend with one device
    pub fn new(config: DummyConfig) -> Self {
        Self::with_devices(vec![config])
    }

    /// Backend with one default device
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Backend with several devices, discovered in the given order
    pub fn with_devices(configs: Vec<DummyConfig>) -> Self {
        Self {
            devices: RefCell::new(configs.into_iter().map(EmulatedDevice::new).collect()),
            discover_calls: Cell::new(0),
        }
    }

    /// Inspect or modify the device with `id`
    pub fn with_device<R>(&self, id: u32, f: impl FnOnce(&mut EmulatedDevice) -> R) -> Option<R> {
        let mut devices = self.devices.borrow_mut();
        devices.iter_mut().find(|d| d.config.id == id).map(f)
    }

    /// Number of times discovery ran
    pub fn discover_calls(&self) -> usize {
        self.discover_calls.get()
    }

    /// Query ioctls executed against device `id`
    pub fn query_calls(&self, id: u32) -> usize {
        self.with_device(id, |d| d.query_calls).unwrap_or(0)
    }

    /// Send ioctls executed against device `id`
    pub fn send_calls(&self, id: u32) -> usize {
        self.with_device(id, |d| d.send_calls).unwrap_or(0)
    }

    /// Return `status` for every command on device `id`, or stop doing so
    pub fn force_status(&self, id: u32, status: Option<u32>) {
        self.with_device(id, |d| d.forced_status = status);
    }

    /// Report at most `limit` output bytes for every command on device `id`
    pub fn limit_output(&self, id: u32, limit: Option<u32>) {
        self.with_device(id, |d| d.output_limit = limit);
    }

    /// Make the node of device `id` refer to a different device
    pub fn replace_node(&self, id: u32) {
        self.with_device(id, |d| d.node_minor = d.config.minor + 1000);
    }

    /// Copy of the label storage area of device `id`
    pub fn lsa(&self, id: u32) -> Vec<u8> {
        self.with_device(id, |d| d.lsa.clone()).unwrap_or_default()
    }

    fn node_for<R>(
        &self,
        memdev: &MemdevInfo,
        f: impl FnOnce(&mut EmulatedDevice) -> Result<R>,
    ) -> Result<R> {
        let mut devices = self.devices.borrow_mut();
        let device = devices
            .iter_mut()
            .find(|d| d.config.id == memdev.id)
            .ok_or_else(|| CxlError::Transport {
                path: memdev.dev_path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such device"),
            })?;
        if device.config.major != memdev.major || device.node_minor != memdev.minor {
            log::error!(
                "{}: node is {}:{}, expected {}:{}",
                memdev.devname,
                device.config.major,
                device.node_minor,
                memdev.major,
                memdev.minor
            );
            return Err(CxlError::DeviceNodeInvalid {
                path: memdev.dev_path.clone(),
            });
        }
        f(device)
    }
}

impl Discovery for DummyCxl {
    fn discover(&self) -> Vec<MemdevInfo> {
        self.discover_calls.set(self.discover_calls.get() + 1);
        self.devices.borrow().iter().map(|d| d.config.info()).collect()
    }
}

impl Transport for DummyCxl {
    fn query_commands(&self, memdev: &MemdevInfo, query: &mut QueryCommands) -> Result<()> {
        self.node_for(memdev, |device| {
            device.query(query);
            Ok(())
        })
    }

    fn send_command(&self, memdev: &MemdevInfo, send: &mut SendCommand<'_>) -> Result<()> {
        self.node_for(memdev, |device| {
            device.send(send).map_err(|reason| CxlError::Transport {
                path: memdev.dev_path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, reason),
            })
        })
    }
}

#[cfg(test)]
mod tests;
