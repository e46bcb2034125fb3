//! Memory device handles

use crate::transport::Transport;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Static attributes of one memory device, as reported by discovery
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemdevInfo {
    /// Device number (`N` in `memN`)
    pub id: u32,
    /// Device name, e.g. `mem0`
    pub devname: String,
    /// Device node major number
    pub major: u64,
    /// Device node minor number
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
    /// Sysfs directory of the device
    pub sysfs_path: PathBuf,
    /// Device node, e.g. `/dev/cxl/mem0`
    pub dev_path: PathBuf,
}

/// A memory device owned by a [`Context`](crate::Context)
///
/// Attributes are fixed at creation. Commands borrow the handle and never
/// outlive it.
pub struct Memdev {
    info: MemdevInfo,
    transport: Rc<dyn Transport>,
}

impl Memdev {
    pub(crate) fn new(info: MemdevInfo, transport: Rc<dyn Transport>) -> Self {
        Self { info, transport }
    }

    /// All static attributes
    pub fn info(&self) -> &MemdevInfo {
        &self.info
    }

    /// Device number
    pub fn id(&self) -> u32 {
        self.info.id
    }

    /// Device name, e.g. `mem0`
    pub fn devname(&self) -> &str {
        &self.info.devname
    }

    /// Device node major number
    pub fn major(&self) -> u64 {
        self.info.major
    }

    /// Device node minor number
    pub fn minor(&self) -> u64 {
        self.info.minor
    }

    /// Persistent capacity in bytes
    pub fn pmem_size(&self) -> u64 {
        self.info.pmem_size
    }

    /// Volatile capacity in bytes
    pub fn ram_size(&self) -> u64 {
        self.info.ram_size
    }

    /// Maximum mailbox payload in bytes
    pub fn payload_max(&self) -> u32 {
        self.info.payload_max
    }

    /// Label storage area size in bytes
    pub fn lsa_size(&self) -> u32 {
        self.info.lsa_size
    }

    /// Firmware version string
    pub fn firmware_version(&self) -> &str {
        &self.info.firmware_version
    }

    /// Sysfs directory of the device
    pub fn sysfs_path(&self) -> &Path {
        &self.info.sysfs_path
    }

    /// Device node path
    pub fn dev_path(&self) -> &Path {
        &self.info.dev_path
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

impl fmt::Debug for Memdev {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memdev").field("info", &self.info).finish()
    }
}
