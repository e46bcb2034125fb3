//! Mailbox ioctls on `/dev/cxl/memN`
//!
//! Layouts match `include/uapi/linux/cxl_mem.h`. Every call opens the node,
//! checks that it is still the character device recorded at discovery and
//! closes it again when the file handle drops.

use crate::device::LinuxCxl;
use cxlmem_core::uapi::{CommandFlags, CommandInfo, QueryCommands, SendCommand};
use cxlmem_core::{CxlError, MemdevInfo, Result, Transport};
use log::{debug, error};
use std::fs::{File, OpenOptions};
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::os::unix::io::AsRawFd;

/// Header of struct cxl_mem_query_commands; entries follow it
#[repr(C)]
#[allow(dead_code)]
pub(crate) struct QueryCommandsHeader {
    n_commands: u32,
    rsvd: u32,
}

/// u32 words per struct cxl_command_info
const COMMAND_INFO_WORDS: usize = 4;
/// u32 words in the query header
const QUERY_HEADER_WORDS: usize = 2;

/// struct cxl_send_command
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default)]
pub(crate) struct RawSendCommand {
    id: u32,
    flags: u32,
    raw_opcode: u16,
    raw_rsvd: u16,
    retval: u32,
    in_size: u32,
    in_rsvd: u32,
    in_payload: u64,
    out_size: i32,
    out_rsvd: u32,
    out_payload: u64,
}

// CXL_MEM_QUERY_COMMANDS = _IOR(0xCE, 1, struct cxl_mem_query_commands)
nix::ioctl_read!(cxl_mem_query_commands, 0xCE, 1, QueryCommandsHeader);
// CXL_MEM_SEND_COMMAND = _IOWR(0xCE, 2, struct cxl_send_command)
nix::ioctl_readwrite!(cxl_mem_send_command, 0xCE, 2, RawSendCommand);

/// Open the memdev node and verify it is the recorded character device
pub(crate) fn open_verified(memdev: &MemdevInfo) -> Result<File> {
    let path = &memdev.dev_path;
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| CxlError::Transport {
            path: path.clone(),
            source: e,
        })?;
    let meta = file.metadata().map_err(|e| CxlError::Transport {
        path: path.clone(),
        source: e,
    })?;

    let rdev = meta.rdev() as libc::dev_t;
    let major = u64::from(nix::sys::stat::major(rdev));
    let minor = u64::from(nix::sys::stat::minor(rdev));
    if !meta.file_type().is_char_device() || major != memdev.major || minor != memdev.minor {
        error!(
            "{}: {} is {}:{} (char: {}), expected {}:{}",
            memdev.devname,
            path.display(),
            major,
            minor,
            meta.file_type().is_char_device(),
            memdev.major,
            memdev.minor
        );
        return Err(CxlError::DeviceNodeInvalid { path: path.clone() });
    }
    Ok(file)
}

/// Header plus entry space for a query; the header never exceeds the space
fn query_buffer(query: &QueryCommands) -> Result<Vec<u32>> {
    let n = query.requested();
    let words = QUERY_HEADER_WORDS + n as usize * COMMAND_INFO_WORDS;
    let mut buf: Vec<u32> = Vec::new();
    buf.try_reserve_exact(words)
        .map_err(|_| CxlError::AllocationFailed { size: words * 4 })?;
    buf.resize(words, 0);
    buf[0] = n;
    Ok(buf)
}

fn ioctl_error(memdev: &MemdevInfo, errno: nix::errno::Errno) -> CxlError {
    CxlError::Transport {
        path: memdev.dev_path.clone(),
        source: std::io::Error::from(errno),
    }
}

impl Transport for LinuxCxl {
    fn query_commands(&self, memdev: &MemdevInfo, query: &mut QueryCommands) -> Result<()> {
        let file = open_verified(memdev)?;

        let mut buf = query_buffer(query)?;

        // SAFETY: buf is u32 aligned and holds the header followed by room
        // for buf[0] entries, which is all the driver writes.
        unsafe {
            cxl_mem_query_commands(file.as_raw_fd(), buf.as_mut_ptr().cast())
                .map_err(|e| ioctl_error(memdev, e))?;
        }

        query.set_n_commands(buf[0]);
        let entries = buf[QUERY_HEADER_WORDS..].chunks_exact(COMMAND_INFO_WORDS);
        for (slot, raw) in query.slots_mut().iter_mut().zip(entries) {
            *slot = CommandInfo {
                id: raw[0],
                flags: CommandFlags::from_bits_retain(raw[1]),
                size_in: raw[2] as i32,
                size_out: raw[3] as i32,
            };
        }
        debug!("{}: query commands: n_commands {}", memdev.devname, buf[0]);
        Ok(())
    }

    fn send_command(&self, memdev: &MemdevInfo, send: &mut SendCommand<'_>) -> Result<()> {
        let file = open_verified(memdev)?;

        let in_size = u32::try_from(send.input.len())
            .map_err(|_| CxlError::InvalidArgument("input payload too large".into()))?;
        let out_size = i32::try_from(send.output.len())
            .map_err(|_| CxlError::InvalidArgument("output payload too large".into()))?;
        let mut raw = RawSendCommand {
            id: send.id,
            raw_opcode: send.raw_opcode,
            in_size,
            in_payload: send.input.as_ptr() as u64,
            out_size,
            out_payload: send.output.as_mut_ptr() as u64,
            ..Default::default()
        };

        // SAFETY: the payload pointers come from live slices of the sizes
        // given, and the driver only reads `in` and writes up to `out.size`.
        unsafe {
            cxl_mem_send_command(file.as_raw_fd(), &mut raw).map_err(|e| ioctl_error(memdev, e))?;
        }

        send.out_size = u32::try_from(raw.out_size).unwrap_or(0);
        send.retval = raw.retval;
        Ok(())
    }
}
