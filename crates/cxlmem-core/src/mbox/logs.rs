//! Get Supported Logs / Get Log
//!
//! Logs are addressed by UUID. The Command Effects Log (CEL) lists every
//! opcode the device implements together with its effect bits.

use super::{run, Reader, Writer};
use crate::command::Command;
use crate::error::{CxlError, Result};
use crate::memdev::Memdev;
use crate::uapi::id;
use uuid::Uuid;

/// Command Effects Log UUID
pub const CEL_UUID: Uuid = Uuid::from_u128(0x0da9c0b5_bf41_4b78_8f79_96b1623b3f17);

const SUPPORTED_LOGS_HDR_SIZE: usize = 8;
const SUPPORTED_LOG_ENTRY_SIZE: usize = 20;
const GET_LOG_IN_SIZE: usize = 24;
const CEL_ENTRY_SIZE: usize = 4;

/// One supported log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedLog {
    /// Log identifier
    pub uuid: Uuid,
    /// Log size in bytes
    pub size: u32,
}

impl SupportedLog {
    /// Whether this is the Command Effects Log
    pub fn is_cel(&self) -> bool {
        self.uuid == CEL_UUID
    }
}

/// Decode a Get Supported Logs output
pub fn decode_supported_logs(buf: &[u8]) -> Result<Vec<SupportedLog>> {
    let mut r = Reader::new(buf, SUPPORTED_LOGS_HDR_SIZE)?;
    let count = usize::from(r.u16()?);
    let needed = SUPPORTED_LOGS_HDR_SIZE + count * SUPPORTED_LOG_ENTRY_SIZE;
    let mut r = Reader::new(buf, needed)?;
    r.skip(SUPPORTED_LOGS_HDR_SIZE)?;
    (0..count)
        .map(|_| -> Result<SupportedLog> {
            Ok(SupportedLog {
                uuid: Uuid::from_bytes(r.bytes()?),
                size: r.u32()?,
            })
        })
        .collect()
}

/// Encode a Get Supported Logs output
pub fn encode_supported_logs(logs: &[SupportedLog]) -> Vec<u8> {
    let mut w = Writer::with_capacity(
        SUPPORTED_LOGS_HDR_SIZE + logs.len() * SUPPORTED_LOG_ENTRY_SIZE,
    );
    w.u16(logs.len() as u16).bytes(&[0u8; 6]);
    for log in logs {
        w.bytes(log.uuid.as_bytes()).u32(log.size);
    }
    w.finish()
}

/// Get Log input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetLogRequest {
    /// Log identifier
    pub uuid: Uuid,
    /// Byte offset into the log
    pub offset: u32,
    /// Bytes to read
    pub length: u32,
}

impl GetLogRequest {
    /// Decode from a command input
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf, GET_LOG_IN_SIZE)?;
        Ok(Self {
            uuid: Uuid::from_bytes(r.bytes()?),
            offset: r.u32()?,
            length: r.u32()?,
        })
    }

    /// Encode to the wire layout
    pub fn encode(&self) -> Vec<u8> {
        Writer::with_capacity(GET_LOG_IN_SIZE)
            .bytes(self.uuid.as_bytes())
            .u32(self.offset)
            .u32(self.length)
            .finish()
    }
}

/// One Command Effects Log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CelEntry {
    /// Mailbox opcode
    pub opcode: u16,
    /// Command effect bits
    pub effect: u16,
}

/// Decode CEL bytes into entries; a trailing partial entry is ignored
pub fn decode_cel(buf: &[u8]) -> Vec<CelEntry> {
    buf.chunks_exact(CEL_ENTRY_SIZE)
        .map(|e| CelEntry {
            opcode: u16::from_le_bytes([e[0], e[1]]),
            effect: u16::from_le_bytes([e[2], e[3]]),
        })
        .collect()
}

/// Encode CEL entries
pub fn encode_cel(entries: &[CelEntry]) -> Vec<u8> {
    let mut w = Writer::with_capacity(entries.len() * CEL_ENTRY_SIZE);
    for e in entries {
        w.u16(e.opcode).u16(e.effect);
    }
    w.finish()
}

/// List the logs the device supports
pub fn get_supported_logs(memdev: &Memdev) -> Result<Vec<SupportedLog>> {
    let mut cmd = Command::new(memdev, id::GET_SUPPORTED_LOGS)?;
    run(&mut cmd, &[])?;
    decode_supported_logs(cmd.output_for(id::GET_SUPPORTED_LOGS)?)
}

/// Read `length` bytes of a log starting at `offset`, in payload sized chunks
pub fn get_log(memdev: &Memdev, uuid: Uuid, offset: u32, length: u32) -> Result<Vec<u8>> {
    let chunk_max = memdev.payload_max();
    if chunk_max == 0 {
        return Err(CxlError::InvalidArgument("device payload size is 0".into()));
    }
    let mut data = Vec::new();
    data.try_reserve_exact(length as usize)
        .map_err(|_| CxlError::AllocationFailed {
            size: length as usize,
        })?;

    let mut done = 0u32;
    while done < length {
        let chunk = (length - done).min(chunk_max);
        let request = GetLogRequest {
            uuid,
            offset: offset + done,
            length: chunk,
        };
        let mut cmd = Command::new(memdev, id::GET_LOG)?;
        cmd.set_output_payload(None, i64::from(chunk))?;
        run(&mut cmd, &request.encode())?;
        let out = cmd.output_for(id::GET_LOG)?;
        if out.is_empty() {
            break;
        }
        data.extend_from_slice(out);
        done += out.len() as u32;
    }
    Ok(data)
}

/// Read and decode the whole Command Effects Log
pub fn get_cel(memdev: &Memdev) -> Result<Vec<CelEntry>> {
    let size = get_supported_logs(memdev)?
        .into_iter()
        .find(SupportedLog::is_cel)
        .map(|log| log.size)
        .ok_or_else(|| CxlError::InvalidArgument("device does not report a CEL".into()))?;
    Ok(decode_cel(&get_log(memdev, CEL_UUID, 0, size)?))
}
