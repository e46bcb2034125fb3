//! cxlmem - CXL memory device mailbox utility
//!
//! Lists CXL memory devices and drives their mailbox: label storage area
//! access, identity and health queries, timestamps, firmware slot and
//! background operation status, logs, and raw commands.
//!
//! # Backends
//!
//! - **linux** - sysfs discovery under `/sys/bus/cxl/devices` and mailbox
//!   ioctls on `/dev/cxl/memN`
//! - **dummy** - an in-memory emulated device, state lives for one
//!   invocation only

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, TimestampCommands};
use commands::{find_memdev, CliError};
use cxlmem_core::Context;
#[cfg(any(feature = "linux", feature = "dummy"))]
use std::rc::Rc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let ctx = open_context(&cli)?;

    let result = match &cli.command {
        Commands::List { json } => commands::list_memdevs(&ctx, *json),
        Commands::ReadLabels {
            memdev,
            output,
            range,
        } => commands::cmd_read_labels(
            find_memdev(&ctx, memdev)?,
            output.as_deref(),
            range.offset,
            range.length,
        ),
        Commands::WriteLabels {
            memdev,
            input,
            offset,
        } => commands::cmd_write_labels(find_memdev(&ctx, memdev)?, input, *offset),
        Commands::ZeroLabels { memdev, range } => {
            commands::cmd_zero_labels(find_memdev(&ctx, memdev)?, range.offset, range.length)
        }
        Commands::Identify { memdev } => commands::cmd_identify(find_memdev(&ctx, memdev)?),
        Commands::Health { memdev } => commands::cmd_health(find_memdev(&ctx, memdev)?),
        Commands::Timestamp(subcmd) => match subcmd {
            TimestampCommands::Get { memdev } => {
                commands::cmd_timestamp_get(find_memdev(&ctx, memdev)?)
            }
            TimestampCommands::Set { memdev, value } => {
                commands::cmd_timestamp_set(find_memdev(&ctx, memdev)?, *value)
            }
        },
        Commands::FwInfo { memdev } => commands::cmd_fw_info(find_memdev(&ctx, memdev)?),
        Commands::BoStatus { memdev } => commands::cmd_bo_status(find_memdev(&ctx, memdev)?),
        Commands::SupportedLogs { memdev, cel } => {
            commands::cmd_supported_logs(find_memdev(&ctx, memdev)?, *cel)
        }
        Commands::Raw {
            memdev,
            opcode,
            input,
            output_size,
        } => commands::cmd_raw(
            find_memdev(&ctx, memdev)?,
            *opcode,
            input.as_deref(),
            *output_size,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Split `name:key=value,...` into the backend name and its parameters
fn parse_backend_params(s: &str) -> Result<(&str, Vec<(&str, &str)>), CliError> {
    let (name, opts) = s.split_once(':').unwrap_or((s, ""));
    let mut params = Vec::new();
    for opt in opts.split(',').filter(|o| !o.is_empty()) {
        let (key, value) = opt
            .split_once('=')
            .ok_or_else(|| CliError::InvalidParameter(opt.to_string()))?;
        params.push((key, value));
    }
    Ok((name, params))
}

/// Build the context for the backend selected on the command line
fn open_context(cli: &Cli) -> Result<Context, Box<dyn std::error::Error>> {
    let (name, params) = parse_backend_params(&cli.backend)?;
    log::debug!("backend {} with {} parameters", name, params.len());

    match name {
        #[cfg(feature = "linux")]
        "linux" => {
            let sysfs = cli.sysfs_root.as_ref().map(|p| p.to_string_lossy());
            let dev = cli.dev_root.as_ref().map(|p| p.to_string_lossy());
            let mut params = params;
            if let Some(root) = sysfs.as_deref() {
                params.push(("sysfs", root));
            }
            if let Some(root) = dev.as_deref() {
                params.push(("dev", root));
            }
            let backend = cxlmem_linux::open_linux_cxl(&params)?;
            Ok(Context::with_backend(Rc::new(backend)))
        }
        #[cfg(feature = "dummy")]
        "dummy" => {
            if !params.is_empty() {
                log::warn!("dummy backend takes no parameters");
            }
            Ok(Context::with_backend(Rc::new(
                cxlmem_dummy::DummyCxl::new_default(),
            )))
        }
        other => Err(CliError::UnknownBackend(other.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend_params() {
        let (name, params) = parse_backend_params("linux").unwrap();
        assert_eq!(name, "linux");
        assert!(params.is_empty());

        let (name, params) = parse_backend_params("linux:sysfs=/tmp/cxl,dev=/tmp/dev").unwrap();
        assert_eq!(name, "linux");
        assert_eq!(params, [("sysfs", "/tmp/cxl"), ("dev", "/tmp/dev")]);

        assert!(matches!(
            parse_backend_params("linux:sysfs"),
            Err(CliError::InvalidParameter(_))
        ));
    }
}
