//! Mailbox command state machine
//!
//! A [`Command`] is bound to one [`Memdev`] and goes through three steps
//! before it can be submitted:
//!
//! 1. **query** fetches the device's command catalog in two rounds (first
//!    the count, then the entries) and caches it in the command
//! 2. **validate** looks the requested id up in the catalog, resolving the
//!    command to [`QueryStatus::Ok`] or, permanently, to
//!    [`QueryStatus::Unsupported`]
//! 3. **alloc_send** sizes input and output payloads from the matched entry,
//!    resolving a declared size of `-1` to the device's maximum payload
//!
//! [`Command::new`] and [`Command::new_raw`] run all three. Payloads can be
//! replaced afterwards with [`Command::set_input_payload`] and
//! [`Command::set_output_payload`], either by an owned buffer the command
//! allocates or by a caller buffer it only borrows.
//!
//! # Example
//!
//! ```ignore
//! let mut cmd = Command::new(memdev, uapi::id::GET_HEALTH_INFO)?;
//! cmd.submit()?;
//! let out = cmd.output_for(uapi::id::GET_HEALTH_INFO)?;
//! ```

use crate::error::{CxlError, Result};
use crate::memdev::Memdev;
use crate::status::{Completion, MboxStatus};
use crate::uapi::{self, id, CommandInfo, QueryCommands, SendCommand};

/// Resolution of the command against the device catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Not validated yet
    NotRun,
    /// The command id is in the catalog
    Ok,
    /// The command id is not in the catalog; terminal for this command
    Unsupported,
}

#[derive(Debug)]
enum InPayload<'a> {
    None,
    Owned(Vec<u8>),
    Borrowed(&'a [u8]),
}

#[derive(Debug)]
enum OutPayload<'a> {
    None,
    Owned(Vec<u8>),
    Borrowed(&'a mut [u8]),
}

/// Allocate a zero filled buffer, reporting allocation failure
pub(crate) fn alloc_zeroed(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| CxlError::AllocationFailed { size: len })?;
    buf.resize(len, 0);
    Ok(buf)
}

/// One mailbox command invocation
#[derive(Debug)]
pub struct Command<'a> {
    memdev: &'a Memdev,
    query_status: QueryStatus,
    catalog: Option<Vec<CommandInfo>>,
    query_idx: Option<usize>,
    id: u32,
    raw_opcode: u16,
    input: InPayload<'a>,
    output: OutPayload<'a>,
    out_size: u32,
    status: Option<MboxStatus>,
}

impl<'a> Command<'a> {
    /// A command with no catalog and no id; drive the pipeline by hand
    pub fn unvalidated(memdev: &'a Memdev) -> Self {
        Self {
            memdev,
            query_status: QueryStatus::NotRun,
            catalog: None,
            query_idx: None,
            id: id::INVALID,
            raw_opcode: 0,
            input: InPayload::None,
            output: OutPayload::None,
            out_size: 0,
            status: None,
        }
    }

    /// Query, validate and allocate payloads for kernel command `id`
    pub fn new(memdev: &'a Memdev, id: u32) -> Result<Self> {
        let mut cmd = Self::unvalidated(memdev);
        cmd.query()?;
        cmd.validate(id)?;
        cmd.alloc_send(id)?;
        Ok(cmd)
    }

    /// Build a pass-through command for mailbox `opcode`
    ///
    /// Opcode 0 is reserved and rejected before the device is queried.
    pub fn new_raw(memdev: &'a Memdev, opcode: u16) -> Result<Self> {
        if opcode == 0 {
            return Err(CxlError::ReservedOpcode);
        }
        let mut cmd = Self::new(memdev, id::RAW)?;
        cmd.raw_opcode = opcode;
        Ok(cmd)
    }

    /// Fetch and cache the device's command catalog
    ///
    /// Runs the transport at most once per command. A command already
    /// resolved to unsupported stays that way.
    pub fn query(&mut self) -> Result<()> {
        match self.query_status {
            QueryStatus::Ok => return Ok(()),
            QueryStatus::Unsupported => return Err(CxlError::Unsupported { id: self.id }),
            QueryStatus::NotRun => {}
        }
        if self.catalog.is_some() {
            return Ok(());
        }

        let devname = self.memdev.devname();
        let transport = self.memdev.transport();

        let mut probe = QueryCommands::with_capacity(0)?;
        transport
            .query_commands(self.memdev.info(), &mut probe)
            .inspect_err(|e| log::error!("{}: query commands failed: {}", devname, e))?;
        let n_commands = probe.n_commands();
        log::debug!("{}: device supports {} commands", devname, n_commands);

        let mut query = QueryCommands::with_capacity(n_commands)?;
        transport
            .query_commands(self.memdev.info(), &mut query)
            .inspect_err(|e| log::error!("{}: query commands failed: {}", devname, e))?;

        self.catalog = Some(query.into_entries());
        Ok(())
    }

    /// Look `id` up in the cached catalog
    ///
    /// A resolved command is terminal: revalidating the same id is a no-op
    /// and any other id is refused.
    pub fn validate(&mut self, id: u32) -> Result<()> {
        match self.query_status {
            QueryStatus::Unsupported => return Err(CxlError::Unsupported { id: self.id }),
            QueryStatus::Ok if id == self.id => return Ok(()),
            QueryStatus::Ok => return Err(CxlError::InvalidState("command already validated")),
            QueryStatus::NotRun => {}
        }
        let catalog = self
            .catalog
            .as_deref()
            .ok_or(CxlError::InvalidState("catalog not queried"))?;

        self.id = id;
        match catalog.iter().position(|info| info.id == id) {
            Some(idx) => {
                let info = &catalog[idx];
                log::debug!(
                    "{}: {}: in: {}, out: {}, flags: {:#x}",
                    self.memdev.devname(),
                    uapi::command_name(id),
                    info.size_in,
                    info.size_out,
                    info.flags.bits()
                );
                self.query_idx = Some(idx);
                self.query_status = QueryStatus::Ok;
                Ok(())
            }
            None => {
                log::debug!(
                    "{}: {} not in catalog",
                    self.memdev.devname(),
                    uapi::command_name(id)
                );
                self.query_idx = None;
                self.query_status = QueryStatus::Unsupported;
                Err(CxlError::Unsupported { id })
            }
        }
    }

    /// Allocate payloads sized by the validated catalog entry for `id`
    pub fn alloc_send(&mut self, id: u32) -> Result<()> {
        let info = *self
            .command_info()
            .ok_or(CxlError::InvalidState("command not validated"))?;
        if info.id != id {
            return Err(CxlError::CommandMismatch {
                expected: id,
                actual: info.id,
            });
        }

        let payload_max = self.memdev.payload_max();
        if info.size_in > 0 {
            let size = self.check_payload_size(i64::from(info.size_in))?;
            self.input = InPayload::Owned(alloc_zeroed(size)?);
        }

        let size_out = if info.size_out < 0 {
            i64::from(payload_max)
        } else {
            i64::from(info.size_out)
        };
        if size_out > 0 {
            let size = self.check_payload_size(size_out)?;
            self.output = OutPayload::Owned(alloc_zeroed(size)?);
            self.out_size = size as u32;
        }
        Ok(())
    }

    fn check_payload_size(&self, size: i64) -> Result<usize> {
        let max = self.memdev.payload_max();
        if size < 0 || size > i64::from(max) {
            return Err(CxlError::PayloadSize { size, max });
        }
        Ok(size as usize)
    }

    /// Replace the input payload
    ///
    /// With `None` the command allocates and owns `size` zeroed bytes;
    /// with a buffer it borrows the first `size` bytes of it.
    pub fn set_input_payload(&mut self, buf: Option<&'a [u8]>, size: i64) -> Result<()> {
        let len = self.check_payload_size(size)?;
        self.input = match buf {
            None => InPayload::Owned(alloc_zeroed(len)?),
            Some(buf) => {
                let buf = buf.get(..len).ok_or_else(|| {
                    CxlError::InvalidArgument(format!(
                        "input buffer of {} bytes shorter than payload size {}",
                        buf.len(),
                        len
                    ))
                })?;
                InPayload::Borrowed(buf)
            }
        };
        Ok(())
    }

    /// Replace the output payload
    ///
    /// With `None` the command allocates and owns `size` zeroed bytes;
    /// with a buffer the device writes straight into its first `size` bytes.
    pub fn set_output_payload(&mut self, buf: Option<&'a mut [u8]>, size: i64) -> Result<()> {
        let len = self.check_payload_size(size)?;
        self.output = match buf {
            None => OutPayload::Owned(alloc_zeroed(len)?),
            Some(buf) => {
                let buf_len = buf.len();
                let buf = buf.get_mut(..len).ok_or_else(|| {
                    CxlError::InvalidArgument(format!(
                        "output buffer of {} bytes shorter than payload size {}",
                        buf_len, len
                    ))
                })?;
                OutPayload::Borrowed(buf)
            }
        };
        self.out_size = len as u32;
        Ok(())
    }

    /// Input payload bytes
    pub fn input(&self) -> &[u8] {
        match &self.input {
            InPayload::None => &[],
            InPayload::Owned(buf) => buf,
            InPayload::Borrowed(buf) => buf,
        }
    }

    /// Mutable access to a command-owned input payload
    pub fn input_mut(&mut self) -> Result<&mut [u8]> {
        match &mut self.input {
            InPayload::None => Ok(&mut []),
            InPayload::Owned(buf) => Ok(buf),
            InPayload::Borrowed(_) => Err(CxlError::InvalidState("input payload is borrowed")),
        }
    }

    fn output_capacity(&self) -> usize {
        match &self.output {
            OutPayload::None => 0,
            OutPayload::Owned(buf) => buf.len(),
            OutPayload::Borrowed(buf) => buf.len(),
        }
    }

    /// Output bytes, limited to what the device reported
    pub fn output(&self) -> &[u8] {
        let buf: &[u8] = match &self.output {
            OutPayload::None => &[],
            OutPayload::Owned(buf) => buf,
            OutPayload::Borrowed(buf) => buf,
        };
        let len = (self.out_size as usize).min(buf.len());
        &buf[..len]
    }

    /// Negotiated output size, updated by the device on submit
    pub fn out_size(&self) -> u32 {
        self.out_size
    }

    /// Send the command to the device
    ///
    /// Returns the device status once the transport succeeds, whatever that
    /// status is. Transport failures leave the previous status untouched.
    pub fn submit(&mut self) -> Result<MboxStatus> {
        match self.query_status {
            QueryStatus::NotRun => return Err(CxlError::InvalidState("command not validated")),
            QueryStatus::Unsupported => return Err(CxlError::Unsupported { id: self.id }),
            QueryStatus::Ok => {}
        }

        let memdev = self.memdev;
        let capacity = self.output_capacity();
        let input: &[u8] = match &self.input {
            InPayload::None => &[],
            InPayload::Owned(buf) => buf,
            InPayload::Borrowed(buf) => buf,
        };
        let output: &mut [u8] = match &mut self.output {
            OutPayload::None => &mut [],
            OutPayload::Owned(buf) => buf,
            OutPayload::Borrowed(buf) => buf,
        };
        let in_len = input.len();

        let mut send = SendCommand::new(self.id, self.raw_opcode, input, output);
        memdev
            .transport()
            .send_command(memdev.info(), &mut send)
            .inspect_err(|e| {
                log::error!(
                    "{}: {} failed: {}",
                    memdev.devname(),
                    uapi::command_name(self.id),
                    e
                )
            })?;
        let (out_size, retval) = (send.out_size, send.retval);

        self.out_size = out_size.min(capacity as u32);
        let status = MboxStatus::from_code(retval as i32);
        self.status = Some(status);
        log::debug!(
            "{}: {} (opcode {:#06x}): in: {}, out: {}, retval: {}",
            memdev.devname(),
            uapi::command_name(self.id),
            self.raw_opcode,
            in_len,
            self.out_size,
            status.code()
        );
        Ok(status)
    }

    /// Last status reported by the device, if submitted
    pub fn mbox_status(&self) -> Option<MboxStatus> {
        self.status
    }

    fn require_final(&self) -> Result<()> {
        let status = self
            .status
            .ok_or(CxlError::InvalidState("command not submitted"))?;
        match status.completion()? {
            Completion::Complete => Ok(()),
            Completion::BackgroundStarted => Err(CxlError::BackgroundStarted),
        }
    }

    /// Output of a completed generic command `id`
    pub fn output_for(&self, id: u32) -> Result<&[u8]> {
        if self.id != id {
            return Err(CxlError::CommandMismatch {
                expected: id,
                actual: self.id,
            });
        }
        self.require_final()?;
        Ok(self.output())
    }

    /// Output of a completed raw command with mailbox `opcode`
    pub fn raw_output_for(&self, opcode: u16) -> Result<&[u8]> {
        if self.id != id::RAW || self.raw_opcode != opcode {
            return Err(CxlError::CommandMismatch {
                expected: u32::from(opcode),
                actual: u32::from(self.raw_opcode),
            });
        }
        self.require_final()?;
        Ok(self.output())
    }

    /// Resolution against the catalog
    pub fn query_status(&self) -> QueryStatus {
        self.query_status
    }

    /// Cached catalog, empty until queried
    pub fn catalog(&self) -> &[CommandInfo] {
        self.catalog.as_deref().unwrap_or(&[])
    }

    /// Matched catalog entry
    pub fn command_info(&self) -> Option<&CommandInfo> {
        let idx = self.query_idx?;
        self.catalog.as_deref()?.get(idx)
    }

    /// Kernel command id
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Mailbox opcode of a raw command, 0 otherwise
    pub fn raw_opcode(&self) -> u16 {
        self.raw_opcode
    }

    /// Name of the bound device
    pub fn devname(&self) -> &str {
        self.memdev.devname()
    }

    /// Bound device
    pub fn memdev(&self) -> &'a Memdev {
        self.memdev
    }
}
