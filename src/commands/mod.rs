//! CLI command implementations
//!
//! Every command resolves a memory device by name through the shared
//! [`Context`] and then drives one or more mailbox commands on it.

mod info;
mod labels;
mod list;
mod raw;

pub use info::{
    cmd_bo_status, cmd_fw_info, cmd_health, cmd_identify, cmd_supported_logs, cmd_timestamp_get,
    cmd_timestamp_set,
};
pub use labels::{cmd_read_labels, cmd_write_labels, cmd_zero_labels};
pub use list::list_memdevs;
pub use raw::cmd_raw;

use cxlmem_core::{Context, Memdev};
use thiserror::Error;

/// Errors raised by the CLI itself
#[derive(Debug, Error)]
pub enum CliError {
    /// No memdev matches the name given
    #[error("No CXL memory device matching '{0}'")]
    MemdevNotFound(String),

    /// Backend not compiled in or misspelled
    #[error("Unknown backend '{0}'")]
    UnknownBackend(String),

    /// Backend parameter without `=`
    #[error("Invalid parameter format: '{0}' (expected key=value)")]
    InvalidParameter(String),

    /// Hex payload does not parse
    #[error("Invalid hex payload: {0}")]
    InvalidHex(String),

    /// Payload does not fit a 32-bit length
    #[error("Payload of {0} bytes is too large")]
    PayloadTooLarge(usize),
}

/// Look up a memdev as `memN` or `N`
pub fn find_memdev<'a>(ctx: &'a Context, name: &str) -> Result<&'a Memdev, CliError> {
    ctx.find(name)
        .ok_or_else(|| CliError::MemdevNotFound(name.to_string()))
}

pub(crate) fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 * 1024 {
        format!("{} GiB", bytes / (1024 * 1024 * 1024))
    } else if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}

/// Print `data` as a hex dump, 16 bytes per line, addresses from `base`
pub(crate) fn hex_dump(data: &[u8], base: u32) {
    for (i, chunk) in data.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        println!("{:08x}: {}", base as usize + i * 16, hex.join(" "));
    }
}

/// Parse "01 02 ff", "0102ff" or "0x01,0x02" into bytes
pub(crate) fn parse_hex_bytes(s: &str) -> Result<Vec<u8>, CliError> {
    let digits: String = s
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .map(|tok| {
            tok.strip_prefix("0x")
                .or_else(|| tok.strip_prefix("0X"))
                .unwrap_or(tok)
        })
        .collect();
    if digits.len() % 2 != 0 {
        return Err(CliError::InvalidHex(format!(
            "odd number of hex digits in '{}'",
            s
        )));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| CliError::InvalidHex(s.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_bytes() {
        assert_eq!(parse_hex_bytes("01 02 ff").unwrap(), [0x01, 0x02, 0xff]);
        assert_eq!(parse_hex_bytes("0102ff").unwrap(), [0x01, 0x02, 0xff]);
        assert_eq!(parse_hex_bytes("0x10,0x20").unwrap(), [0x10, 0x20]);
        assert!(parse_hex_bytes("").unwrap().is_empty());
        assert!(matches!(parse_hex_bytes("abc"), Err(CliError::InvalidHex(_))));
        assert!(matches!(parse_hex_bytes("zz"), Err(CliError::InvalidHex(_))));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(4096), "4 KiB");
        assert_eq!(format_size(256 << 20), "256 MiB");
        assert_eq!(format_size(1 << 30), "1 GiB");
    }
}
