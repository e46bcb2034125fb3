use super::*;
use cxlmem_core::mbox::alert::{self, AlertFlags, SetAlertConfig};
use cxlmem_core::mbox::event::{self, EventInterruptPolicy, InterruptMode};
use cxlmem_core::mbox::{background, firmware, health, identify, logs, opcode, timestamp};
use cxlmem_core::{lsa, Command, Completion, Context, MboxStatus, QueryStatus};
use std::rc::Rc;

fn setup(config: DummyConfig) -> (Rc<DummyCxl>, Context) {
    let backend = Rc::new(DummyCxl::new(config));
    let ctx = Context::with_backend(Rc::clone(&backend));
    (backend, ctx)
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}

// Context

#[test]
fn test_context_enumerates_once_in_discovery_order() {
    let duplicate = DummyConfig {
        devname: "mem2-dup".to_string(),
        ..DummyConfig::with_id(2)
    };
    let backend = Rc::new(DummyCxl::with_devices(vec![
        DummyConfig::with_id(2),
        DummyConfig::with_id(0),
        duplicate,
    ]));
    let ctx = Context::with_backend(Rc::clone(&backend));
    assert_eq!(backend.discover_calls(), 0);

    let ids: Vec<u32> = ctx.memdevs().iter().map(|m| m.id()).collect();
    assert_eq!(ids, [2, 0]);
    assert_eq!(ctx.memdevs()[0].devname(), "mem2");

    let shared = ctx.clone();
    assert_eq!(shared.memdevs().len(), 2);
    assert_eq!(backend.discover_calls(), 1);
}

#[test]
fn test_context_lookup() {
    let backend = Rc::new(DummyCxl::with_devices(vec![
        DummyConfig::with_id(0),
        DummyConfig::with_id(3),
    ]));
    let ctx = Context::with_backend(backend);
    assert_eq!(ctx.find("mem3").map(|m| m.id()), Some(3));
    assert_eq!(ctx.find("0").map(|m| m.devname()), Some("mem0"));
    assert!(ctx.find("mem9").is_none());
    assert!(ctx.memdev_by_id(5).is_none());

    let mem3 = ctx.memdev_by_id(3).unwrap();
    assert_eq!(mem3.lsa_size(), 1024);
    assert_eq!(mem3.payload_max(), 4096);
    assert_eq!(mem3.dev_path(), std::path::Path::new("/dev/cxl/mem3"));
}

#[test]
fn test_context_ref_count() {
    let (_backend, ctx) = setup(DummyConfig::default());
    assert_eq!(ctx.ref_count(), 1);
    let other = ctx.clone();
    assert_eq!(ctx.ref_count(), 2);
    drop(other);
    assert_eq!(ctx.ref_count(), 1);
}

// Command state machine

#[test]
fn test_query_is_idempotent() {
    let (backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];

    let mut cmd = Command::new(mem, id::IDENTIFY).unwrap();
    assert_eq!(backend.query_calls(0), 2);
    assert_eq!(cmd.query_status(), QueryStatus::Ok);
    cmd.query().unwrap();
    cmd.query().unwrap();
    assert_eq!(backend.query_calls(0), 2);

    // Catalog caching is per command
    let mut fresh = Command::unvalidated(mem);
    fresh.query().unwrap();
    fresh.query().unwrap();
    assert_eq!(backend.query_calls(0), 4);
    assert_eq!(fresh.catalog().len(), default_catalog().len());
    assert_eq!(fresh.query_status(), QueryStatus::NotRun);
}

#[test]
fn test_unsupported_command_allocates_nothing() {
    let config = DummyConfig::default().catalog(vec![CommandInfo::new(id::IDENTIFY, 0, 67)]);
    let (backend, ctx) = setup(config);
    let mem = &ctx.memdevs()[0];

    assert!(matches!(
        Command::new(mem, id::GET_LSA),
        Err(CxlError::Unsupported { id: id::GET_LSA })
    ));

    let mut cmd = Command::unvalidated(mem);
    cmd.query().unwrap();
    assert!(matches!(
        cmd.validate(id::GET_LSA),
        Err(CxlError::Unsupported { .. })
    ));
    assert_eq!(cmd.query_status(), QueryStatus::Unsupported);
    assert!(cmd.input().is_empty());
    assert!(cmd.output().is_empty());
    assert_eq!(cmd.out_size(), 0);
    assert!(cmd.command_info().is_none());
    assert!(matches!(
        cmd.alloc_send(id::GET_LSA),
        Err(CxlError::InvalidState(_))
    ));

    // Terminal: neither a new id nor a re-query revives it
    assert!(cmd.validate(id::IDENTIFY).is_err());
    assert!(matches!(cmd.query(), Err(CxlError::Unsupported { .. })));
    assert!(matches!(cmd.submit(), Err(CxlError::Unsupported { .. })));
    assert_eq!(cmd.catalog().len(), 1);

    assert_eq!(backend.query_calls(0), 4);
    assert_eq!(backend.send_calls(0), 0);
}

#[test]
fn test_variable_output_resolves_to_payload_max() {
    for max in [256u32, 4096, 16384] {
        let (_backend, ctx) = setup(DummyConfig::default().payload_max(max));
        let mem = &ctx.memdevs()[0];
        let cmd = Command::new(mem, id::GET_LSA).unwrap();
        assert_eq!(cmd.output().len(), max as usize);
        assert_eq!(cmd.out_size(), max);
        assert_eq!(cmd.input().len(), 8);
    }
}

#[test]
fn test_declared_size_above_payload_max() {
    let (_backend, ctx) = setup(DummyConfig::default().payload_max(32));
    let mem = &ctx.memdevs()[0];
    assert!(matches!(
        Command::new(mem, id::IDENTIFY),
        Err(CxlError::PayloadSize { size: 67, max: 32 })
    ));
}

#[test]
fn test_payload_size_bounds() {
    for max in [0u32, 1, 64, 4096, 1 << 20] {
        let (_backend, ctx) = setup(DummyConfig::default().payload_max(max));
        let mem = &ctx.memdevs()[0];
        let mut cmd = Command::new_raw(mem, opcode::GET_TIMESTAMP).unwrap();

        for size in [-1i64, i64::MIN, i64::from(max) + 1, i64::MAX] {
            assert!(
                matches!(
                    cmd.set_input_payload(None, size),
                    Err(CxlError::PayloadSize { .. })
                ),
                "input size {} max {}",
                size,
                max
            );
            assert!(
                matches!(
                    cmd.set_output_payload(None, size),
                    Err(CxlError::PayloadSize { .. })
                ),
                "output size {} max {}",
                size,
                max
            );
        }

        cmd.set_input_payload(None, i64::from(max)).unwrap();
        assert_eq!(cmd.input().len(), max as usize);
        cmd.set_output_payload(None, i64::from(max)).unwrap();
        assert_eq!(cmd.out_size(), max);
        cmd.set_output_payload(None, 0).unwrap();
        assert_eq!(cmd.out_size(), 0);
    }
}

#[test]
fn test_borrowed_payloads() {
    let data = [1u8, 2, 3, 4];
    let mut out = [0u8; 8];
    let (_backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];

    let mut cmd = Command::new_raw(mem, opcode::SET_TIMESTAMP).unwrap();
    assert!(matches!(
        cmd.set_input_payload(Some(&data[..]), 5),
        Err(CxlError::InvalidArgument(_))
    ));
    cmd.set_input_payload(Some(&data[..]), 2).unwrap();
    assert_eq!(cmd.input(), &[1, 2]);
    assert!(matches!(cmd.input_mut(), Err(CxlError::InvalidState(_))));

    let mut cmd = Command::new_raw(mem, opcode::GET_TIMESTAMP).unwrap();
    cmd.set_output_payload(Some(&mut out[..]), 8).unwrap();
    assert_eq!(cmd.submit().unwrap(), MboxStatus::Success);
    assert_eq!(cmd.out_size(), 8);
    drop(cmd);
    assert_eq!(out, [0u8; 8]);
}

#[test]
fn test_raw_opcode_zero_rejected_before_query() {
    let (backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];
    assert!(matches!(
        Command::new_raw(mem, 0),
        Err(CxlError::ReservedOpcode)
    ));
    assert_eq!(backend.query_calls(0), 0);
}

#[test]
fn test_raw_unknown_opcode_reports_device_status() {
    let (_backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];
    let mut cmd = Command::new_raw(mem, 0x1234).unwrap();
    assert_eq!(cmd.raw_opcode(), 0x1234);
    assert_eq!(cmd.submit().unwrap(), MboxStatus::Unsupported);
    assert!(matches!(
        cmd.raw_output_for(0x1234),
        Err(CxlError::Device {
            status: MboxStatus::Unsupported
        })
    ));
}

#[test]
fn test_submit_requires_validation() {
    let (backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];
    let mut cmd = Command::unvalidated(mem);
    assert!(matches!(cmd.submit(), Err(CxlError::InvalidState(_))));
    assert!(matches!(
        cmd.validate(id::IDENTIFY),
        Err(CxlError::InvalidState(_))
    ));
    assert_eq!(backend.send_calls(0), 0);
}

#[test]
fn test_alloc_send_checks_id() {
    let (_backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];
    let mut cmd = Command::unvalidated(mem);
    cmd.query().unwrap();
    cmd.validate(id::IDENTIFY).unwrap();
    assert!(matches!(
        cmd.alloc_send(id::GET_HEALTH_INFO),
        Err(CxlError::CommandMismatch {
            expected: id::GET_HEALTH_INFO,
            actual: id::IDENTIFY
        })
    ));
    cmd.alloc_send(id::IDENTIFY).unwrap();
    assert_eq!(cmd.output().len(), 67);
}

#[test]
fn test_resolved_command_is_not_revalidated() {
    let (backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];
    let mut cmd = Command::new(mem, id::IDENTIFY).unwrap();

    // Same id is a no-op
    cmd.validate(id::IDENTIFY).unwrap();
    assert_eq!(cmd.id(), id::IDENTIFY);

    // Another id, known or not, leaves the command untouched
    assert!(matches!(
        cmd.validate(id::GET_HEALTH_INFO),
        Err(CxlError::InvalidState(_))
    ));
    assert!(matches!(
        cmd.validate(0xdead),
        Err(CxlError::InvalidState(_))
    ));
    assert_eq!(cmd.query_status(), QueryStatus::Ok);
    assert_eq!(cmd.id(), id::IDENTIFY);
    assert_eq!(cmd.command_info().map(|info| info.id), Some(id::IDENTIFY));
    assert_eq!(cmd.output().len(), 67);

    assert_eq!(cmd.submit().unwrap(), MboxStatus::Success);
    assert!(cmd.output_for(id::IDENTIFY).is_ok());
    assert_eq!(backend.send_calls(0), 1);
}

#[test]
fn test_typed_output_checks_id() {
    let (_backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];
    let mut cmd = Command::new(mem, id::GET_HEALTH_INFO).unwrap();
    assert!(matches!(
        cmd.output_for(id::GET_HEALTH_INFO),
        Err(CxlError::InvalidState(_))
    ));
    cmd.submit().unwrap();
    assert_eq!(cmd.output_for(id::GET_HEALTH_INFO).unwrap().len(), 18);
    assert!(matches!(
        cmd.output_for(id::IDENTIFY),
        Err(CxlError::CommandMismatch { .. })
    ));
    assert!(matches!(
        cmd.raw_output_for(opcode::GET_TIMESTAMP),
        Err(CxlError::CommandMismatch { .. })
    ));
}

// Status classification

#[test]
fn test_background_started_is_distinct() {
    let (backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];

    backend.force_status(0, Some(1));
    let mut cmd = Command::new(mem, id::GET_HEALTH_INFO).unwrap();
    let status = cmd.submit().unwrap();
    assert_eq!(status, MboxStatus::BackgroundCommandStarted);
    assert!(!status.is_failure());
    assert!(matches!(
        cmd.output_for(id::GET_HEALTH_INFO),
        Err(CxlError::BackgroundStarted)
    ));
    assert!(matches!(
        health::get_health_info(mem),
        Err(CxlError::BackgroundStarted)
    ));

    backend.force_status(0, None);
    let mut cmd = Command::new(mem, id::GET_HEALTH_INFO).unwrap();
    assert_eq!(cmd.submit().unwrap(), MboxStatus::Success);
    assert!(cmd.output_for(id::GET_HEALTH_INFO).is_ok());
}

#[test]
fn test_failure_status_is_not_a_submit_error() {
    let (backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];
    backend.force_status(0, Some(6));

    let mut cmd = Command::new(mem, id::GET_HEALTH_INFO).unwrap();
    assert_eq!(cmd.submit().unwrap(), MboxStatus::Busy);
    assert_eq!(cmd.mbox_status(), Some(MboxStatus::Busy));
    assert!(matches!(
        health::get_health_info(mem),
        Err(CxlError::Device {
            status: MboxStatus::Busy
        })
    ));
}

#[test]
fn test_out_of_range_status_is_unknown() {
    let (backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];

    for (raw, code) in [(23u32, 23i32), (0xffff_ffff, -1), (0x8000_0000, i32::MIN)] {
        backend.force_status(0, Some(raw));
        let mut cmd = Command::new(mem, id::GET_HEALTH_INFO).unwrap();
        let status = cmd.submit().unwrap();
        assert_eq!(status, MboxStatus::Unknown(code));
        assert!(status.description().starts_with("Unknown Status"));
    }
}

#[test]
fn test_replaced_node_fails_without_ioctl() {
    let (backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];

    let mut cmd = Command::new(mem, id::GET_HEALTH_INFO).unwrap();
    backend.replace_node(0);
    assert!(matches!(
        cmd.submit(),
        Err(CxlError::DeviceNodeInvalid { .. })
    ));
    assert_eq!(backend.send_calls(0), 0);
    assert_eq!(cmd.mbox_status(), None);

    assert!(matches!(
        Command::new(mem, id::IDENTIFY),
        Err(CxlError::DeviceNodeInvalid { .. })
    ));
    assert_eq!(backend.query_calls(0), 2);
}

// Label storage area

#[test]
fn test_lsa_round_trip() {
    let (backend, ctx) = setup(DummyConfig::default().lsa_size(128));
    let mem = &ctx.memdevs()[0];
    let data = pattern(128);

    lsa::set_lsa(mem, &data, 0, 128).unwrap();
    assert_eq!(backend.lsa(0), data);

    let mut out = vec![0u8; 128];
    lsa::get_lsa(mem, &mut out, 0, 0).unwrap();
    assert_eq!(out, data);
}

#[test]
fn test_lsa_partial_get() {
    let (_backend, ctx) = setup(DummyConfig::default().lsa_size(128));
    let mem = &ctx.memdevs()[0];
    let data = pattern(128);
    lsa::set_lsa(mem, &data, 0, 0).unwrap();

    let mut out = vec![0xaau8; 48];
    lsa::get_lsa(mem, &mut out, 64, 32).unwrap();
    assert_eq!(&out[..32], &data[64..96]);
    assert!(out[32..].iter().all(|&b| b == 0xaa));
}

#[test]
fn test_lsa_partial_set() {
    let (backend, ctx) = setup(DummyConfig::default().lsa_size(128));
    let mem = &ctx.memdevs()[0];

    lsa::set_lsa(mem, &[0x5a; 16], 100, 16).unwrap();
    let lsa = backend.lsa(0);
    assert!(lsa[..100].iter().all(|&b| b == 0));
    assert!(lsa[100..116].iter().all(|&b| b == 0x5a));
    assert!(lsa[116..].iter().all(|&b| b == 0));
}

#[test]
fn test_lsa_zero() {
    let (backend, ctx) = setup(DummyConfig::default().lsa_size(128));
    let mem = &ctx.memdevs()[0];
    lsa::set_lsa(mem, &pattern(128), 0, 128).unwrap();

    lsa::zero_lsa(mem, 0, 0).unwrap();
    let mut out = vec![0xffu8; 128];
    lsa::get_lsa(mem, &mut out, 0, 0).unwrap();
    assert_eq!(out, vec![0u8; 128]);
    assert_eq!(backend.lsa(0), vec![0u8; 128]);
}

#[test]
fn test_lsa_zero_tail() {
    let (backend, ctx) = setup(DummyConfig::default().lsa_size(128));
    let mem = &ctx.memdevs()[0];
    let data = pattern(128);
    lsa::set_lsa(mem, &data, 0, 128).unwrap();

    lsa::zero_lsa(mem, 96, 0).unwrap();
    let lsa = backend.lsa(0);
    assert_eq!(&lsa[..96], &data[..96]);
    assert!(lsa[96..].iter().all(|&b| b == 0));
}

#[test]
fn test_lsa_range_checked_before_device() {
    let (backend, ctx) = setup(DummyConfig::default().lsa_size(128));
    let mem = &ctx.memdevs()[0];
    let mut out = vec![0u8; 128];

    assert!(matches!(
        lsa::get_lsa(mem, &mut out, 120, 16),
        Err(CxlError::InvalidArgument(_))
    ));
    assert!(matches!(
        lsa::get_lsa(mem, &mut out, 128, 0),
        Err(CxlError::InvalidArgument(_))
    ));
    assert!(matches!(
        lsa::get_lsa(mem, &mut out[..8], 0, 16),
        Err(CxlError::InvalidArgument(_))
    ));
    assert!(matches!(
        lsa::set_lsa(mem, &[0u8; 4], 0, 16),
        Err(CxlError::InvalidArgument(_))
    ));
    assert_eq!(backend.query_calls(0), 0);
    assert_eq!(backend.send_calls(0), 0);
}

#[test]
fn test_lsa_device_failure_is_io_error() {
    let (backend, ctx) = setup(DummyConfig::default().lsa_size(128));
    let mem = &ctx.memdevs()[0];
    let mut out = vec![0u8; 128];

    backend.force_status(0, Some(4));
    match lsa::get_lsa(mem, &mut out, 0, 0) {
        Err(CxlError::Io {
            status,
            description,
        }) => {
            assert_eq!(status, 4);
            assert_eq!(description, MboxStatus::InternalError.description());
        }
        other => panic!("unexpected result: {:?}", other),
    }

    // Background started is still not a completed label write
    backend.force_status(0, Some(1));
    assert!(matches!(
        lsa::zero_lsa(mem, 0, 0),
        Err(CxlError::Io { status: 1, .. })
    ));

    backend.force_status(0, Some(200));
    assert!(matches!(
        lsa::set_lsa(mem, &[1u8; 8], 0, 8),
        Err(CxlError::Io { status: 200, .. })
    ));
}

#[test]
fn test_lsa_short_read_is_an_error() {
    let (backend, ctx) = setup(DummyConfig::default().lsa_size(128));
    let mem = &ctx.memdevs()[0];
    lsa::set_lsa(mem, &pattern(128), 0, 0).unwrap();

    backend.limit_output(0, Some(4));
    let mut out = vec![0u8; 128];
    assert!(matches!(
        lsa::get_lsa(mem, &mut out, 0, 0),
        Err(CxlError::ShortPayload {
            expected: 128,
            actual: 4
        })
    ));

    backend.limit_output(0, None);
    lsa::get_lsa(mem, &mut out, 0, 0).unwrap();
    assert_eq!(out, pattern(128));
}

// Typed commands

#[test]
fn test_identify() {
    let (_backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];
    let ident = identify::identify(mem).unwrap();
    assert_eq!(ident.fw_revision_str(), "DUMMY 1.0");
    assert_eq!(ident.persistent_capacity_bytes(), 1 << 30);
    assert_eq!(ident.volatile_capacity_bytes(), 0);
    assert_eq!(ident.lsa_size, 1024);
}

#[test]
fn test_health_info() {
    let (backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];
    backend.with_device(0, |d| d.health.dirty_shutdowns = 3);

    let info = health::get_health_info(mem).unwrap();
    assert_eq!(info.temperature_celsius(), Some(35));
    assert_eq!(info.dirty_shutdowns, 3);
    assert!(info.status().is_empty());
}

#[test]
fn test_alert_config() {
    let (_backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];

    let req = SetAlertConfig {
        valid_alert_actions: AlertFlags::OVER_TEMPERATURE | AlertFlags::LIFE_USED,
        enable_alert_actions: AlertFlags::OVER_TEMPERATURE,
        life_used_warning_threshold: 80,
        over_temperature_warning_threshold: 85,
        ..Default::default()
    };
    assert_eq!(
        alert::set_alert_config(mem, &req).unwrap(),
        Completion::Complete
    );

    let cfg = alert::get_alert_config(mem).unwrap();
    assert_eq!(cfg.over_temperature_warning_threshold, 85);
    assert_eq!(cfg.life_used_warning_threshold, 80);
    assert_eq!(cfg.valid_alerts, AlertFlags::OVER_TEMPERATURE);
}

#[test]
fn test_event_interrupt_policy() {
    let (_backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];

    let policy = event::get_event_interrupt_policy(mem).unwrap();
    assert_eq!(event::mode(policy.info), InterruptMode::Msi);

    let update = EventInterruptPolicy {
        info: event::settings(InterruptMode::None, 0),
        warning: event::settings(InterruptMode::Msi, 1),
        failure: event::settings(InterruptMode::Msi, 2),
        fatal: event::settings(InterruptMode::Firmware, 0),
    };
    event::set_event_interrupt_policy(mem, &update).unwrap();
    assert_eq!(event::get_event_interrupt_policy(mem).unwrap(), update);
}

#[test]
fn test_timestamp() {
    let (_backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];
    assert_eq!(timestamp::get_timestamp(mem).unwrap(), 0);
    let now = 1_700_000_000_123_456_789u64;
    assert_eq!(
        timestamp::set_timestamp(mem, now).unwrap(),
        Completion::Complete
    );
    assert_eq!(timestamp::get_timestamp(mem).unwrap(), now);
}

#[test]
fn test_fw_info() {
    let (_backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];
    let info = firmware::get_fw_info(mem).unwrap();
    assert_eq!(info.slots_supported, 2);
    assert_eq!(info.active_slot(), 1);
    assert_eq!(info.staged_slot(), 0);
    assert_eq!(info.revision(1).as_deref(), Some("DUMMY 1.0"));
}

#[test]
fn test_background_operation() {
    let (_backend, ctx) = setup(DummyConfig::default());
    let mem = &ctx.memdevs()[0];

    let idle = background::get_background_status(mem).unwrap();
    assert!(!idle.running);

    assert_eq!(
        background::transfer_fw(mem).unwrap(),
        Completion::BackgroundStarted
    );
    let busy = background::get_background_status(mem).unwrap();
    assert!(busy.running);
    assert_eq!(busy.opcode, opcode::BACKGROUND_TRANSFER_FW);

    assert!(matches!(
        background::activate_fw(mem),
        Err(CxlError::Device {
            status: MboxStatus::Busy
        })
    ));
}

#[test]
fn test_supported_logs_and_cel() {
    let (backend, ctx) = setup(DummyConfig::default().payload_max(32));
    let mem = &ctx.memdevs()[0];

    let supported = logs::get_supported_logs(mem).unwrap();
    assert_eq!(supported.len(), 1);
    assert!(supported[0].is_cel());
    assert_eq!(supported[0].size, 52);

    let before = backend.send_calls(0);
    let cel = logs::get_cel(mem).unwrap();
    assert_eq!(cel.len(), 13);
    assert!(cel.iter().any(|e| e.opcode == 0x4000));
    // One supported-logs call, then 52 bytes in 32 byte chunks
    assert_eq!(backend.send_calls(0) - before, 3);
}
