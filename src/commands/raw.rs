//! Raw mailbox command

use super::{hex_dump, parse_hex_bytes};
use cxlmem_core::{Command, Memdev};

/// Send `opcode` with an optional hex input payload and dump the reply
pub fn cmd_raw(
    memdev: &Memdev,
    opcode: u16,
    input: Option<&str>,
    output_size: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let payload = match input {
        Some(hex) => parse_hex_bytes(hex)?,
        None => Vec::new(),
    };

    let mut cmd = Command::new_raw(memdev, opcode)?;
    if !payload.is_empty() {
        cmd.set_input_payload(Some(payload.as_slice()), payload.len() as i64)?;
    }
    if let Some(size) = output_size {
        cmd.set_output_payload(None, i64::from(size))?;
    }

    let status = cmd.submit()?;
    println!("{}: opcode {:#06x}: status {}", memdev.devname(), opcode, status);
    if !status.is_failure() && cmd.out_size() > 0 {
        hex_dump(cmd.output(), 0);
    }
    Ok(())
}
