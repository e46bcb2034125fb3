//! Device information commands

use super::format_size;
use cxlmem_core::mbox::{alert, background, event, firmware, health, identify, logs, timestamp};
use cxlmem_core::{Completion, CxlError, Memdev};
use std::time::{SystemTime, UNIX_EPOCH};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Print the Identify payload
pub fn cmd_identify(memdev: &Memdev) -> CmdResult {
    let id = identify::identify(memdev)?;
    println!("{}:", memdev.devname());
    println!("  Firmware revision:   {}", id.fw_revision_str());
    println!("  Total capacity:      {}", format_size(id.total_capacity_bytes()));
    println!("  Volatile capacity:   {}", format_size(id.volatile_capacity_bytes()));
    println!("  Persistent capacity: {}", format_size(id.persistent_capacity_bytes()));
    println!("  Partition alignment: {}", format_size(id.partition_align_bytes()));
    println!(
        "  Event log sizes:     info {}, warning {}, failure {}, fatal {}",
        id.info_event_log_size,
        id.warning_event_log_size,
        id.failure_event_log_size,
        id.fatal_event_log_size
    );
    println!("  Label storage size:  {}", format_size(u64::from(id.lsa_size)));
    println!("  Poison list max:     {}", id.poison_list_max_mer);
    println!("  Inject poison limit: {}", id.inject_poison_limit);
    Ok(())
}

/// Print health information, alert configuration and event interrupt policy
pub fn cmd_health(memdev: &Memdev) -> CmdResult {
    let info = health::get_health_info(memdev)?;
    println!("{}:", memdev.devname());
    println!("  Health status:       {:?}", info.status());
    println!("  Media status:        {:?}", info.media());
    match info.life_used_percent() {
        Some(pct) => println!("  Life used:           {}%", pct),
        None => println!("  Life used:           not implemented"),
    }
    match info.temperature_celsius() {
        Some(t) => println!("  Temperature:         {} C", t),
        None => println!("  Temperature:         not implemented"),
    }
    println!("  Dirty shutdowns:     {}", info.dirty_shutdowns);
    println!("  Volatile errors:     {}", info.volatile_errors);
    println!("  Persistent errors:   {}", info.pmem_errors);

    // Alert and event configuration are optional on some devices
    match alert::get_alert_config(memdev) {
        Ok(cfg) => {
            println!("  Alerts valid:        {:?}", cfg.valid_alerts);
            println!("  Alerts programmable: {:?}", cfg.programmable_alerts);
            println!(
                "  Life used:           warn {}%, critical {}%",
                cfg.life_used_warning_threshold, cfg.life_used_critical_threshold
            );
            println!(
                "  Over temperature:    warn {} C, critical {} C",
                cfg.over_temperature_warning_threshold as i16,
                cfg.over_temperature_critical_threshold as i16
            );
            println!(
                "  Under temperature:   warn {} C, critical {} C",
                cfg.under_temperature_warning_threshold as i16,
                cfg.under_temperature_critical_threshold as i16
            );
        }
        Err(CxlError::Unsupported { .. }) => log::debug!("alert configuration unsupported"),
        Err(e) => return Err(e.into()),
    }

    match event::get_event_interrupt_policy(memdev) {
        Ok(policy) => {
            for (name, settings) in [
                ("info", policy.info),
                ("warning", policy.warning),
                ("failure", policy.failure),
                ("fatal", policy.fatal),
            ] {
                println!(
                    "  Event {:<8}        {:?} (vector {})",
                    name,
                    event::mode(settings),
                    event::vector(settings)
                );
            }
        }
        Err(CxlError::Unsupported { .. }) => log::debug!("raw commands unsupported"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Print the device timestamp
pub fn cmd_timestamp_get(memdev: &Memdev) -> CmdResult {
    let ts = timestamp::get_timestamp(memdev)?;
    println!("{}: {} ns", memdev.devname(), ts);
    Ok(())
}

/// Set the device timestamp, to the host clock when `value` is `None`
pub fn cmd_timestamp_set(memdev: &Memdev, value: Option<u64>) -> CmdResult {
    let ts = match value {
        Some(ts) => ts,
        None => {
            let now = SystemTime::now().duration_since(UNIX_EPOCH)?;
            u64::try_from(now.as_nanos())?
        }
    };
    let completion = timestamp::set_timestamp(memdev, ts)?;
    report_completion(memdev, "set timestamp", completion);
    println!("{}: timestamp set to {} ns", memdev.devname(), ts);
    Ok(())
}

/// Print firmware slot information
pub fn cmd_fw_info(memdev: &Memdev) -> CmdResult {
    let info = firmware::get_fw_info(memdev)?;
    println!("{}:", memdev.devname());
    println!("  Slots supported:     {}", info.slots_supported);
    println!("  Active slot:         {}", info.active_slot());
    match info.staged_slot() {
        0 => println!("  Staged slot:         none"),
        slot => println!("  Staged slot:         {}", slot),
    }
    println!(
        "  Online activation:   {}",
        if info.online_activation() { "yes" } else { "no" }
    );
    for slot in 1..=info.slots_supported.min(firmware::FW_SLOTS as u8) {
        if let Some(rev) = info.revision(slot) {
            println!("  Slot {} revision:     {}", slot, rev);
        }
    }
    Ok(())
}

/// Print background operation status
pub fn cmd_bo_status(memdev: &Memdev) -> CmdResult {
    let status = background::get_background_status(memdev)?;
    println!("{}: {}", memdev.devname(), status);
    if !status.running && status.opcode != 0 {
        println!("  Last result: {}", status.return_code);
    }
    Ok(())
}

/// List supported logs, optionally dumping the Command Effects Log
pub fn cmd_supported_logs(memdev: &Memdev, cel: bool) -> CmdResult {
    let supported = logs::get_supported_logs(memdev)?;
    println!("{}: {} supported logs", memdev.devname(), supported.len());
    for log in &supported {
        let tag = if log.is_cel() { " (CEL)" } else { "" };
        println!("  {} {} bytes{}", log.uuid, log.size, tag);
    }

    if cel {
        let entries = logs::get_cel(memdev)?;
        println!();
        println!("{:<8} {}", "Opcode", "Effect");
        for e in &entries {
            println!("{:#06x}   {:#06x}", e.opcode, e.effect);
        }
    }
    Ok(())
}

/// Report the outcome of a setter that may finish in the background
fn report_completion(memdev: &Memdev, what: &str, completion: Completion) {
    match completion {
        Completion::Complete => log::info!("{}: {} complete", memdev.devname(), what),
        Completion::BackgroundStarted => {
            println!("{}: {} started in the background", memdev.devname(), what)
        }
    }
}
