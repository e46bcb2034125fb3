//! Label storage area commands

use super::{hex_dump, CliError};
use cxlmem_core::{lsa, Memdev};
use std::fs;
use std::path::Path;

/// Bytes a label range covers, with 0 meaning "to the end"
fn range_len(memdev: &Memdev, offset: u32, length: u32) -> usize {
    if length == 0 {
        memdev.lsa_size().saturating_sub(offset) as usize
    } else {
        length as usize
    }
}

/// Read labels into a file, or dump them to stdout
pub fn cmd_read_labels(
    memdev: &Memdev,
    output: Option<&Path>,
    offset: u32,
    length: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut buf = vec![0u8; range_len(memdev, offset, length)];
    lsa::get_lsa(memdev, &mut buf, offset, length)?;

    match output {
        Some(path) => {
            fs::write(path, &buf)?;
            println!(
                "{}: read {} label bytes to {}",
                memdev.devname(),
                buf.len(),
                path.display()
            );
        }
        None => hex_dump(&buf, offset),
    }
    Ok(())
}

/// Write a file into the label area at `offset`
pub fn cmd_write_labels(
    memdev: &Memdev,
    input: &Path,
    offset: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    if data.is_empty() {
        log::warn!("{}: nothing to write", input.display());
        return Ok(());
    }
    let length = u32::try_from(data.len()).map_err(|_| CliError::PayloadTooLarge(data.len()))?;
    lsa::set_lsa(memdev, &data, offset, length)?;
    println!(
        "{}: wrote {} label bytes at offset {:#x}",
        memdev.devname(),
        length,
        offset
    );
    Ok(())
}

/// Zero a label range
pub fn cmd_zero_labels(
    memdev: &Memdev,
    offset: u32,
    length: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    lsa::zero_lsa(memdev, offset, length)?;
    println!(
        "{}: zeroed {} label bytes at offset {:#x}",
        memdev.devname(),
        range_len(memdev, offset, length),
        offset
    );
    Ok(())
}
