//! Label Storage Area access
//!
//! Get, set and zero share one dispatcher, [`lsa_op`]. A `length` of 0
//! covers everything from `offset` to the end of the label area. Any
//! non-zero device status is reported as [`CxlError::Io`] carrying the
//! status description.
//!
//! After a write the kernel may keep serving stale label data from its
//! own cache until the memdev is disabled and re-enabled; nothing here
//! performs that cycle.

use crate::command::{alloc_zeroed, Command};
use crate::error::{CxlError, Result};
use crate::memdev::Memdev;
use crate::uapi::id;

/// GET_LSA input: le32 offset, le32 length
const GET_LSA_IN_SIZE: usize = 8;
/// SET_LSA header: le32 offset, le32 reserved
const SET_LSA_HDR_SIZE: usize = 8;

/// Label operation
#[derive(Debug)]
pub enum LsaOp<'b> {
    /// Read into the buffer
    Get(&'b mut [u8]),
    /// Write from the buffer
    Set(&'b [u8]),
    /// Write zeroes
    Zero,
}

impl LsaOp<'_> {
    fn name(&self) -> &'static str {
        match self {
            LsaOp::Get(_) => "get",
            LsaOp::Set(_) => "set",
            LsaOp::Zero => "zero",
        }
    }
}

fn resolve_range(memdev: &Memdev, offset: u32, length: u32) -> Result<usize> {
    let lsa_size = memdev.lsa_size();
    let length = if length == 0 {
        if offset >= lsa_size {
            return Err(CxlError::InvalidArgument(format!(
                "offset {:#x} beyond label area of {:#x} bytes",
                offset, lsa_size
            )));
        }
        lsa_size - offset
    } else {
        length
    };
    if u64::from(offset) + u64::from(length) > u64::from(lsa_size) {
        return Err(CxlError::InvalidArgument(format!(
            "range {:#x}+{:#x} exceeds label area of {:#x} bytes",
            offset, length, lsa_size
        )));
    }
    Ok(length as usize)
}

fn check_status(cmd: &Command<'_>, op: &'static str) -> Result<()> {
    match cmd.mbox_status() {
        Some(status) if status.is_success() => Ok(()),
        Some(status) => {
            log::error!("{}: lsa {}: {}", cmd.devname(), op, status.description());
            Err(CxlError::io(status))
        }
        None => Err(CxlError::InvalidState("command not submitted")),
    }
}

fn get(memdev: &Memdev, buf: &mut [u8], offset: u32, length: usize) -> Result<()> {
    let dst = buf.get_mut(..length).ok_or_else(|| {
        CxlError::InvalidArgument(format!(
            "buffer too small: need {} bytes for label read",
            length
        ))
    })?;

    let mut cmd = Command::new(memdev, id::GET_LSA)?;
    let mut header = [0u8; GET_LSA_IN_SIZE];
    header[0..4].copy_from_slice(&offset.to_le_bytes());
    header[4..8].copy_from_slice(&(length as u32).to_le_bytes());
    cmd.set_input_payload(None, GET_LSA_IN_SIZE as i64)?;
    cmd.input_mut()?.copy_from_slice(&header);
    cmd.set_output_payload(Some(dst), length as i64)?;
    cmd.submit()?;
    check_status(&cmd, "get")?;

    let produced = cmd.out_size() as usize;
    if produced < length {
        log::error!(
            "{}: lsa get: device returned {} of {} bytes",
            memdev.devname(),
            produced,
            length
        );
        return Err(CxlError::ShortPayload {
            expected: length,
            actual: produced,
        });
    }
    Ok(())
}

fn set(memdev: &Memdev, data: &[u8], offset: u32, length: usize) -> Result<()> {
    let data = data.get(..length).ok_or_else(|| {
        CxlError::InvalidArgument(format!(
            "buffer too small: need {} bytes for label write",
            length
        ))
    })?;

    let mut cmd = Command::new(memdev, id::SET_LSA)?;
    cmd.set_input_payload(None, (SET_LSA_HDR_SIZE + length) as i64)?;
    let input = cmd.input_mut()?;
    input[0..4].copy_from_slice(&offset.to_le_bytes());
    input[SET_LSA_HDR_SIZE..].copy_from_slice(data);
    cmd.submit()?;
    check_status(&cmd, "set")
}

/// Run a label operation over `length` bytes at `offset`
pub fn lsa_op(memdev: &Memdev, op: LsaOp<'_>, offset: u32, length: u32) -> Result<()> {
    let length = resolve_range(memdev, offset, length)?;
    log::debug!(
        "{}: lsa {}: offset {:#x} length {:#x}",
        memdev.devname(),
        op.name(),
        offset,
        length
    );
    match op {
        LsaOp::Get(buf) => get(memdev, buf, offset, length),
        LsaOp::Set(buf) => set(memdev, buf, offset, length),
        LsaOp::Zero => {
            let zeroes = alloc_zeroed(length)?;
            set(memdev, &zeroes, offset, length)
        }
    }
}

/// Read label bytes; `length == 0` reads from `offset` to the end
pub fn get_lsa(memdev: &Memdev, buf: &mut [u8], offset: u32, length: u32) -> Result<()> {
    lsa_op(memdev, LsaOp::Get(buf), offset, length)
}

/// Write label bytes from `buf`
pub fn set_lsa(memdev: &Memdev, buf: &[u8], offset: u32, length: u32) -> Result<()> {
    lsa_op(memdev, LsaOp::Set(buf), offset, length)
}

/// Zero label bytes; `length == 0` zeroes from `offset` to the end
pub fn zero_lsa(memdev: &Memdev, offset: u32, length: u32) -> Result<()> {
    lsa_op(memdev, LsaOp::Zero, offset, length)
}
