//! List command implementation

use super::format_size;
use cxlmem_core::{Context, Memdev};
use serde::Serialize;

#[derive(Serialize)]
struct MemdevEntry<'a> {
    memdev: &'a str,
    id: u32,
    major: u64,
    minor: u64,
    pmem_size: u64,
    ram_size: u64,
    payload_max: u32,
    label_storage_size: u32,
    firmware_version: &'a str,
}

impl<'a> From<&'a Memdev> for MemdevEntry<'a> {
    fn from(m: &'a Memdev) -> Self {
        Self {
            memdev: m.devname(),
            id: m.id(),
            major: m.major(),
            minor: m.minor(),
            pmem_size: m.pmem_size(),
            ram_size: m.ram_size(),
            payload_max: m.payload_max(),
            label_storage_size: m.lsa_size(),
            firmware_version: m.firmware_version(),
        }
    }
}

/// List all memory devices of the context
pub fn list_memdevs(ctx: &Context, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let entries: Vec<MemdevEntry<'_>> = ctx.memdevs().iter().map(MemdevEntry::from).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No CXL memory devices found");
        return Ok(());
    }

    println!(
        "{:<8} {:>8} {:>10} {:>10} {:>10} {:>10}  {}",
        "Memdev", "Node", "PMEM", "RAM", "Payload", "LSA", "Firmware"
    );
    println!("{}", "-".repeat(76));
    for e in &entries {
        println!(
            "{:<8} {:>8} {:>10} {:>10} {:>10} {:>10}  {}",
            e.memdev,
            format!("{}:{}", e.major, e.minor),
            format_size(e.pmem_size),
            format_size(e.ram_size),
            format_size(u64::from(e.payload_max)),
            format_size(u64::from(e.label_storage_size)),
            e.firmware_version
        );
    }
    Ok(())
}
