//! Typed mailbox commands
//!
//! Thin codecs over [`Command`]: each module defines the packed
//! little-endian payload of one or two mailbox commands, with `decode` and
//! `encode` on both directions, plus functions that build, submit and
//! decode the command against a [`Memdev`](crate::Memdev).
//!
//! Getters require the device to report success. Setters and background
//! triggers return the [`Completion`] so that a started background
//! operation is visible to the caller.

use crate::command::Command;
use crate::error::{CxlError, Result};
use crate::status::Completion;

pub mod alert;
pub mod background;
pub mod event;
pub mod firmware;
pub mod health;
pub mod identify;
pub mod logs;
pub mod timestamp;

/// Raw mailbox opcodes used by the typed commands
pub mod opcode {
    #![allow(missing_docs)]
    pub const GET_EVENT_INTERRUPT_POLICY: u16 = 0x0102;
    pub const SET_EVENT_INTERRUPT_POLICY: u16 = 0x0103;
    pub const GET_FW_INFO: u16 = 0x0200;
    pub const GET_TIMESTAMP: u16 = 0x0300;
    pub const SET_TIMESTAMP: u16 = 0x0301;
    pub const BACKGROUND_STATUS: u16 = 0xCD00;
    pub const BACKGROUND_TRANSFER_FW: u16 = 0xCD01;
    pub const BACKGROUND_ACTIVATE_FW: u16 = 0xCD02;
}

/// Copy `input` into a command-owned input payload and submit
pub(crate) fn run(cmd: &mut Command<'_>, input: &[u8]) -> Result<Completion> {
    if !input.is_empty() {
        cmd.set_input_payload(None, input.len() as i64)?;
        cmd.input_mut()?.copy_from_slice(input);
    }
    let status = cmd.submit()?;
    if status.is_failure() {
        log::error!("{}: firmware status: {}", cmd.devname(), status);
    }
    status.completion()
}

/// Little-endian cursor over a device payload
pub(crate) struct Reader<'b> {
    buf: &'b [u8],
    pos: usize,
}

impl<'b> Reader<'b> {
    /// Reader over `buf`, which must hold at least `len` bytes
    pub(crate) fn new(buf: &'b [u8], len: usize) -> Result<Self> {
        if buf.len() < len {
            return Err(CxlError::ShortPayload {
                expected: len,
                actual: buf.len(),
            });
        }
        Ok(Self { buf, pos: 0 })
    }

    pub(crate) fn bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.pos + N;
        let chunk = self
            .buf
            .get(self.pos..end)
            .ok_or(CxlError::ShortPayload {
                expected: end,
                actual: self.buf.len(),
            })?;
        let mut out = [0u8; N];
        out.copy_from_slice(chunk);
        self.pos = end;
        Ok(out)
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<()> {
        let end = self.pos + n;
        if end > self.buf.len() {
            return Err(CxlError::ShortPayload {
                expected: end,
                actual: self.buf.len(),
            });
        }
        self.pos = end;
        Ok(())
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes::<1>()?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.bytes()?))
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.bytes()?))
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.bytes()?))
    }
}

/// Little-endian payload builder
#[derive(Default)]
pub(crate) struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub(crate) fn with_capacity(len: usize) -> Self {
        Self {
            buf: Vec::with_capacity(len),
        }
    }

    pub(crate) fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    pub(crate) fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub(crate) fn u16(&mut self, v: u16) -> &mut Self {
        self.bytes(&v.to_le_bytes())
    }

    pub(crate) fn u32(&mut self, v: u32) -> &mut Self {
        self.bytes(&v.to_le_bytes())
    }

    pub(crate) fn u64(&mut self, v: u64) -> &mut Self {
        self.bytes(&v.to_le_bytes())
    }

    pub(crate) fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

/// Text of a fixed-size, NUL padded revision field
pub(crate) fn fixed_str(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).trim().to_string()
}

/// NUL padded fixed-size field from text, truncating if too long
pub(crate) fn to_fixed<const N: usize>(text: &str) -> [u8; N] {
    let mut out = [0u8; N];
    let len = text.len().min(N);
    out[..len].copy_from_slice(&text.as_bytes()[..len]);
    out
}
