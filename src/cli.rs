//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a mailbox opcode; bare digits are taken as hex
fn parse_opcode(s: &str) -> Result<u16, String> {
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(hex, 16).map_err(|e| format!("Invalid opcode: {}", e))
}

/// Generate help text for the backend argument
fn backend_help() -> String {
    let mut names = Vec::new();
    if cfg!(feature = "linux") {
        names.push("linux");
    }
    if cfg!(feature = "dummy") {
        names.push("dummy");
    }
    format!(
        "Backend to use, with optional key=value parameters [available: {}]",
        names.join(", ")
    )
}

#[derive(Parser)]
#[command(name = "cxlmem")]
#[command(author, version, about = "CXL memory device mailbox utility", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Backend to use, e.g. `linux` or `linux:sysfs=/tmp/cxl`
    #[arg(short, long, global = true, default_value = "linux", help = backend_help())]
    pub backend: String,

    /// Sysfs directory holding memN entries (linux backend)
    #[arg(long, global = true)]
    pub sysfs_root: Option<PathBuf>,

    /// Directory holding the memN device nodes (linux backend)
    #[arg(long, global = true)]
    pub dev_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Label area range shared by the label commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct LabelRange {
    /// Byte offset into the label storage area
    #[arg(short = 's', long, value_parser = parse_hex_u32, default_value = "0")]
    pub offset: u32,

    /// Number of bytes (0 = up to the end of the label area)
    #[arg(short, long, value_parser = parse_hex_u32, default_value = "0")]
    pub length: u32,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List CXL memory devices
    List {
        /// Print machine readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Read the label storage area
    ReadLabels {
        /// Memory device (memN or N)
        memdev: String,

        /// Output file (hex dump on stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        range: LabelRange,
    },

    /// Write a file into the label storage area
    WriteLabels {
        /// Memory device (memN or N)
        memdev: String,

        /// Input file
        #[arg(short, long)]
        input: PathBuf,

        /// Byte offset into the label storage area
        #[arg(short = 's', long, value_parser = parse_hex_u32, default_value = "0")]
        offset: u32,
    },

    /// Zero the label storage area
    ZeroLabels {
        /// Memory device (memN or N)
        memdev: String,

        #[command(flatten)]
        range: LabelRange,
    },

    /// Show the device identity
    Identify {
        /// Memory device (memN or N)
        memdev: String,
    },

    /// Show health information and alert configuration
    Health {
        /// Memory device (memN or N)
        memdev: String,
    },

    /// Device timestamp
    #[command(subcommand)]
    Timestamp(TimestampCommands),

    /// Show firmware slot information
    FwInfo {
        /// Memory device (memN or N)
        memdev: String,
    },

    /// Show background operation status
    BoStatus {
        /// Memory device (memN or N)
        memdev: String,
    },

    /// List supported logs
    SupportedLogs {
        /// Memory device (memN or N)
        memdev: String,

        /// Also dump the Command Effects Log
        #[arg(long)]
        cel: bool,
    },

    /// Send a raw mailbox command
    Raw {
        /// Memory device (memN or N)
        memdev: String,

        /// Mailbox opcode (hex)
        #[arg(value_parser = parse_opcode)]
        opcode: u16,

        /// Input payload as hex bytes, e.g. "01 02 ff" or "0102ff"
        #[arg(short, long)]
        input: Option<String>,

        /// Expected output size in bytes (defaults to the device maximum)
        #[arg(short = 'n', long, value_parser = parse_hex_u32)]
        output_size: Option<u32>,
    },
}

/// Timestamp subcommands
#[derive(Subcommand)]
pub enum TimestampCommands {
    /// Read the device timestamp
    Get {
        /// Memory device (memN or N)
        memdev: String,
    },

    /// Set the device timestamp
    Set {
        /// Memory device (memN or N)
        memdev: String,

        /// Nanoseconds since the Unix epoch (defaults to now)
        value: Option<u64>,
    },
}
