//! cxlmem-linux - Linux backend for CXL memory device mailboxes
//!
//! Memory devices are discovered under `/sys/bus/cxl/devices/memN`, where
//! the kernel's CXL driver publishes their capacities, maximum mailbox
//! payload, label storage size and firmware version. Mailbox commands are
//! issued through the `CXL_MEM_QUERY_COMMANDS` and `CXL_MEM_SEND_COMMAND`
//! ioctls on `/dev/cxl/memN`.
//!
//! # Example
//!
//! ```ignore
//! use cxlmem_core::Context;
//! use cxlmem_linux::{LinuxCxl, LinuxCxlConfig};
//! use std::rc::Rc;
//!
//! let ctx = Context::with_backend(Rc::new(LinuxCxl::new(LinuxCxlConfig::new())));
//! for memdev in ctx.memdevs() {
//!     println!("{}: {} bytes pmem", memdev.devname(), memdev.pmem_size());
//! }
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with `CONFIG_CXL_MEM`
//! - Read/write access to `/dev/cxl/memN` (usually root)
//! - Raw mailbox commands additionally need `CONFIG_CXL_MEM_RAW_COMMANDS`

pub mod device;
pub mod error;
mod ioctl;

pub use device::{parse_options, LinuxCxl, LinuxCxlConfig};
pub use error::{LinuxCxlError, Result};

/// Build a Linux backend from `key=value` options
///
/// # Example Options
///
/// - `sysfs=/sys/bus/cxl/devices`
/// - `dev=/dev/cxl`
pub fn open_linux_cxl(options: &[(&str, &str)]) -> Result<LinuxCxl> {
    let config = parse_options(options)?;
    log::info!(
        "Using CXL sysfs root {} and device root {}",
        config.sysfs_root.display(),
        config.dev_root.display()
    );
    Ok(LinuxCxl::new(config))
}
