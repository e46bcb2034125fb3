//! Memory device discovery from sysfs

use crate::error::{LinuxCxlError, Result};
use cxlmem_core::{Discovery, MemdevInfo};
use log::{debug, warn};
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

/// Sysfs directory holding `memN` entries
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/bus/cxl/devices";

/// Directory holding the `memN` character devices
pub const DEFAULT_DEV_ROOT: &str = "/dev/cxl";

/// Configuration for the Linux backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxCxlConfig {
    /// Sysfs directory holding `memN` entries
    pub sysfs_root: PathBuf,
    /// Directory holding the device nodes
    pub dev_root: PathBuf,
}

impl Default for LinuxCxlConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            dev_root: PathBuf::from(DEFAULT_DEV_ROOT),
        }
    }
}

impl LinuxCxlConfig {
    /// Configuration with the standard paths
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different sysfs root
    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    /// Use a different device node root
    pub fn with_dev_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.dev_root = root.into();
        self
    }
}

/// Linux CXL backend
///
/// Discovers memory devices under the sysfs root and issues mailbox
/// ioctls on their nodes under the device root.
#[derive(Debug, Clone, Default)]
pub struct LinuxCxl {
    config: LinuxCxlConfig,
}

impl LinuxCxl {
    /// Create a backend
    pub fn new(config: LinuxCxlConfig) -> Self {
        Self { config }
    }

    /// Backend configuration
    pub fn config(&self) -> &LinuxCxlConfig {
        &self.config
    }

    /// Read the attributes of one memory device, e.g. `mem0`
    pub fn probe(&self, devname: &str) -> Result<MemdevInfo> {
        let id = parse_memdev_name(devname)
            .ok_or_else(|| LinuxCxlError::DeviceNotFound(devname.to_string()))?;
        let sysfs_path = self.config.sysfs_root.join(devname);
        if !sysfs_path.is_dir() {
            return Err(LinuxCxlError::DeviceNotFound(format!(
                "{} ({})",
                devname,
                sysfs_path.display()
            )));
        }

        let dev_path = self.config.dev_root.join(devname);
        let (major, minor) = node_numbers(&dev_path)?;

        let info = MemdevInfo {
            id,
            devname: devname.to_string(),
            major,
            minor,
            pmem_size: read_sysfs_int(&sysfs_path, "pmem/size")?,
            ram_size: read_sysfs_int(&sysfs_path, "ram/size")?,
            payload_max: read_sysfs_u32(&sysfs_path, "payload_max")?,
            lsa_size: read_sysfs_u32(&sysfs_path, "label_storage_size")?,
            firmware_version: read_sysfs_string(&sysfs_path, "firmware_version")?,
            sysfs_path,
            dev_path,
        };
        debug!(
            "{}: node {}:{}, firmware '{}'",
            info.devname, info.major, info.minor, info.firmware_version
        );
        Ok(info)
    }
}

impl Discovery for LinuxCxl {
    fn discover(&self) -> Vec<MemdevInfo> {
        let root = &self.config.sysfs_root;
        let entries = match std::fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read {}: {}", root.display(), e);
                return Vec::new();
            }
        };

        let mut names: Vec<(u32, String)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter_map(|name| parse_memdev_name(&name).map(|id| (id, name)))
            .collect();
        names.sort();

        names
            .into_iter()
            .filter_map(|(_, name)| match self.probe(&name) {
                Ok(info) => Some(info),
                Err(e) => {
                    warn!("Skipping {}: {}", name, e);
                    None
                }
            })
            .collect()
    }
}

/// Id of a `memN` name
fn parse_memdev_name(name: &str) -> Option<u32> {
    let digits = name.strip_prefix("mem")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Major and minor numbers of a character device node
pub(crate) fn node_numbers(path: &Path) -> Result<(u64, u64)> {
    let meta = std::fs::metadata(path).map_err(|e| LinuxCxlError::DeviceNode {
        path: path.display().to_string(),
        source: e,
    })?;
    if !meta.file_type().is_char_device() {
        return Err(LinuxCxlError::DeviceNode {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a character device"),
        });
    }
    let rdev = meta.rdev() as libc::dev_t;
    Ok((
        u64::from(nix::sys::stat::major(rdev)),
        u64::from(nix::sys::stat::minor(rdev)),
    ))
}

/// Read a string from a sysfs file and sanitize it
fn read_sysfs_string(sysfs_path: &Path, filename: &str) -> Result<String> {
    let path = sysfs_path.join(filename);
    let content = std::fs::read_to_string(&path).map_err(|e| LinuxCxlError::SysfsRead {
        path: path.display().to_string(),
        source: e,
    })?;

    // Sanitize: remove non-printable characters and trailing whitespace
    let sanitized: String = content
        .chars()
        .take_while(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();
    Ok(sanitized.trim_end().to_string())
}

/// Read an integer from a sysfs file
fn read_sysfs_int(sysfs_path: &Path, filename: &str) -> Result<u64> {
    let value_str = read_sysfs_string(sysfs_path, filename)?;
    parse_int(&value_str).ok_or_else(|| LinuxCxlError::SysfsParse {
        path: sysfs_path.join(filename).display().to_string(),
        value: value_str,
    })
}

fn read_sysfs_u32(sysfs_path: &Path, filename: &str) -> Result<u32> {
    let value = read_sysfs_int(sysfs_path, filename)?;
    u32::try_from(value).map_err(|_| LinuxCxlError::SysfsParse {
        path: sysfs_path.join(filename).display().to_string(),
        value: value.to_string(),
    })
}

/// Hex (`0x`), octal (leading `0`) or decimal
fn parse_int(value: &str) -> Option<u64> {
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if value.len() > 1 && value.starts_with('0') {
        u64::from_str_radix(&value[1..], 8).ok()
    } else {
        value.parse().ok()
    }
}

/// Parse backend options from key-value pairs
///
/// # Supported options
/// - `sysfs=PATH` - sysfs root (default `/sys/bus/cxl/devices`)
/// - `dev=PATH` - device node root (default `/dev/cxl`)
///
/// # Example
/// ```ignore
/// let config = parse_options(&[("dev", "/tmp/cxl")])?;
/// ```
pub fn parse_options(options: &[(&str, &str)]) -> Result<LinuxCxlConfig> {
    let mut config = LinuxCxlConfig::new();

    for (key, value) in options {
        match *key {
            "sysfs" | "dev" if value.is_empty() => {
                return Err(LinuxCxlError::InvalidParameter {
                    name: if *key == "sysfs" { "sysfs" } else { "dev" },
                    message: "path must not be empty".to_string(),
                });
            }
            "sysfs" => config.sysfs_root = PathBuf::from(value),
            "dev" => config.dev_root = PathBuf::from(value),
            _ => {
                warn!("Unknown linux_cxl option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_attr(dir: &Path, name: &str, value: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, format!("{}\n", value)).unwrap();
    }

    fn fake_memdev(sysfs: &Path, name: &str) {
        let dir = sysfs.join(name);
        fs::create_dir_all(&dir).unwrap();
        write_attr(&dir, "pmem/size", "0x10000000");
        write_attr(&dir, "ram/size", "0");
        write_attr(&dir, "payload_max", "4096");
        write_attr(&dir, "label_storage_size", "0x400");
        write_attr(&dir, "firmware_version", "BWFW 1.2");
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("4096"), Some(4096));
        assert_eq!(parse_int("0x400"), Some(0x400));
        assert_eq!(parse_int("010"), Some(8));
        assert_eq!(parse_int("0"), Some(0));
        assert_eq!(parse_int("bogus"), None);
    }

    #[test]
    fn test_memdev_names() {
        assert_eq!(parse_memdev_name("mem0"), Some(0));
        assert_eq!(parse_memdev_name("mem12"), Some(12));
        assert_eq!(parse_memdev_name("mem"), None);
        assert_eq!(parse_memdev_name("decoder0.0"), None);
        assert_eq!(parse_memdev_name("mem1a"), None);
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("sysfs", "/tmp/sys"), ("bogus", "1")]).unwrap();
        assert_eq!(config.sysfs_root, PathBuf::from("/tmp/sys"));
        assert_eq!(config.dev_root, PathBuf::from(DEFAULT_DEV_ROOT));
        assert!(matches!(
            parse_options(&[("dev", "")]),
            Err(LinuxCxlError::InvalidParameter { name: "dev", .. })
        ));
    }

    #[test]
    fn test_sysfs_attributes() {
        let sysfs = tempfile::tempdir().unwrap();
        fake_memdev(sysfs.path(), "mem0");
        let dir = sysfs.path().join("mem0");
        assert_eq!(read_sysfs_int(&dir, "pmem/size").unwrap(), 0x1000_0000);
        assert_eq!(read_sysfs_u32(&dir, "label_storage_size").unwrap(), 0x400);
        assert_eq!(read_sysfs_string(&dir, "firmware_version").unwrap(), "BWFW 1.2");

        write_attr(&dir, "payload_max", "lots");
        assert!(matches!(
            read_sysfs_int(&dir, "payload_max"),
            Err(LinuxCxlError::SysfsParse { .. })
        ));
    }

    #[test]
    fn test_discover_skips_entries_without_node() {
        let sysfs = tempfile::tempdir().unwrap();
        let dev = tempfile::tempdir().unwrap();
        fake_memdev(sysfs.path(), "mem0");
        fake_memdev(sysfs.path(), "mem1");
        fs::create_dir_all(sysfs.path().join("port1")).unwrap();
        // A regular file is not an acceptable device node
        fs::write(dev.path().join("mem1"), b"").unwrap();

        let cxl = LinuxCxl::new(
            LinuxCxlConfig::new()
                .with_sysfs_root(sysfs.path())
                .with_dev_root(dev.path()),
        );
        assert!(cxl.discover().is_empty());
        assert!(matches!(
            cxl.probe("mem1"),
            Err(LinuxCxlError::DeviceNode { .. })
        ));
        assert!(matches!(
            cxl.probe("mem7"),
            Err(LinuxCxlError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn test_discover_with_char_device() {
        // /dev/null stands in for the memdev node
        let sysfs = tempfile::tempdir().unwrap();
        fake_memdev(sysfs.path(), "mem0");
        let dev = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink("/dev/null", dev.path().join("mem0")).unwrap();

        let cxl = LinuxCxl::new(
            LinuxCxlConfig::new()
                .with_sysfs_root(sysfs.path())
                .with_dev_root(dev.path()),
        );
        let found = cxl.discover();
        assert_eq!(found.len(), 1);
        let info = &found[0];
        assert_eq!(info.id, 0);
        assert_eq!(info.devname, "mem0");
        assert_eq!((info.major, info.minor), (1, 3));
        assert_eq!(info.pmem_size, 0x1000_0000);
        assert_eq!(info.payload_max, 4096);
        assert_eq!(info.lsa_size, 0x400);
        assert_eq!(info.firmware_version, "BWFW 1.2");
    }
}
