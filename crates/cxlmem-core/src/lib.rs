//! cxlmem-core - Core library for CXL memory device mailboxes
//!
//! This crate implements the user-space side of the Linux CXL memory
//! device mailbox interface: enumerating memory devices, negotiating the
//! set of commands the firmware supports, marshalling payloads, submitting
//! commands and decoding the status the device reports.
//!
//! The platform specific parts are reached through two traits:
//!
//! - [`Discovery`] enumerates memory devices and their static attributes
//! - [`Transport`] issues the two mailbox ioctls against a device node
//!
//! `cxlmem-linux` implements both on top of sysfs and `/dev/cxl`, and
//! `cxlmem-dummy` implements both in memory for testing.
//!
//! # Example
//!
//! ```ignore
//! use cxlmem_core::{lsa, Context};
//!
//! let ctx = Context::with_backend(backend);
//! for memdev in ctx.memdevs() {
//!     let mut labels = vec![0u8; memdev.lsa_size() as usize];
//!     lsa::get_lsa(memdev, &mut labels, 0, 0)?;
//!     println!("{}: {} label bytes", memdev.devname(), labels.len());
//! }
//! ```
//!
//! # Threading
//!
//! Contexts and commands are single-threaded: reference counts and the
//! cached command catalog are not synchronised. [`Context`] is built on
//! `Rc` and is neither `Send` nor `Sync`; share it across threads only
//! behind external locking of the whole backend.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod command;
pub mod context;
pub mod error;
pub mod lsa;
pub mod mbox;
pub mod memdev;
pub mod status;
pub mod transport;
pub mod uapi;

pub use command::{Command, QueryStatus};
pub use context::Context;
pub use error::{CxlError, Result};
pub use memdev::{Memdev, MemdevInfo};
pub use status::{Completion, MboxStatus};
pub use transport::{Discovery, Transport};
