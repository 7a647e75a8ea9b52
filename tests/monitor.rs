//! End-to-end behaviour of the boot monitor against scripted hardware

mod common;

use cboot::arch::GPR_COUNT;
use cboot::config::{self, REBOOT_DELAY_CYCLES};
use cboot::monitor::ESC;
use cboot::{ExceptionLevel, RegisterSnapshot, Stage};

use common::{boot, monitor, monitor_with, type_keys, FakePlatform, BOOT_ORDER};

#[test]
fn test_uart_initialized_before_any_output() {
    let mut m = monitor();
    assert_eq!(m.stage(), Stage::Init);
    assert_eq!(m.step(), Stage::Banner);

    assert_eq!(m.serial().init_calls, 1);
    assert_eq!(m.serial().written_before_init, Some(0));
    assert!(m.serial().wire.is_empty());

    boot(&mut m);
    assert_eq!(m.serial().init_calls, 1);
}

#[test]
fn test_boot_output_sequence() {
    let mut m = monitor();
    m.step();
    let output = boot(&mut m);

    let expected_order = [
        "========================================\n\r",
        config::PRODUCT_NAME,
        "Author: ",
        "Build: ",
        "[SYSTEM] Initializing...\n\r",
        "[SYSTEM] Exception Level: EL2\n\r",
        "[MEMORY] BSS Section: start=0x00090000, end=0x00090100, size=256 bytes\n\r",
        "[MEMORY] Stack: top=0x000A0000, bottom=0x00091000\n\r",
        "[TEST] Testing memory functions...\n\r",
        "[TEST] memset: OK\n\r",
        "[TEST] memcpy: OK\n\r",
        "[TEST] String length: 22\n\r",
        "[TEST] String test: Hello, Raspberry Pi 3!\n\r",
        "[TEST] Hex test: 0xDEADBEEF\n\r",
        "[TEST] Decimal test: 123456789\n\r",
        "[ECHO] Type characters (ESC to exit, ? for help):\n\r",
    ];

    let mut cursor = 0;
    for needle in expected_order {
        let found = output[cursor..]
            .find(needle)
            .unwrap_or_else(|| panic!("missing {:?} after offset {}", needle, cursor));
        cursor += found + needle.len();
    }
    assert_eq!(&output[cursor..], config::PROMPT);
}

#[test]
fn test_every_newline_gets_carriage_return() {
    let mut m = monitor();
    m.step();
    let output = boot(&mut m);

    let bytes = output.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            assert_eq!(bytes.get(i + 1), Some(&b'\r'), "bare LF at offset {}", i);
        }
    }
}

#[test]
fn test_diagnostics_recorded() {
    let platform = FakePlatform {
        level: ExceptionLevel::El1,
        ..Default::default()
    };
    let mut m = monitor_with(platform);
    assert!(m.diagnostics().is_none());

    m.step();
    m.step();
    assert_eq!(m.step(), Stage::SelfTest);

    let diag = m.diagnostics().expect("diagnostics ran");
    assert_eq!(diag.exception_level, ExceptionLevel::El1);
    assert_eq!(diag.layout, common::sample_layout());
    assert!(m
        .serial_mut()
        .take_output()
        .contains("[SYSTEM] Exception Level: EL1\n\r"));
}

#[test]
fn test_idle_without_input_writes_nothing() {
    let mut m = monitor();
    m.step();
    boot(&mut m);

    for _ in 0..1000 {
        assert_eq!(m.step(), Stage::Interactive);
    }
    assert!(m.serial().wire.is_empty());
}

#[test]
fn test_echo_on_by_default() {
    let mut m = monitor();
    m.step();
    boot(&mut m);

    assert!(m.echo_enabled());
    assert_eq!(type_keys(&mut m, b"x"), "x");
    assert_eq!(type_keys(&mut m, b"hi"), "hi");
    assert_eq!(m.stage(), Stage::Interactive);
}

#[test]
fn test_echoed_newline_gets_carriage_return() {
    let mut m = monitor();
    m.step();
    boot(&mut m);

    assert_eq!(type_keys(&mut m, b"\n"), "\n\r");
}

#[test]
fn test_echo_off_swallows_input() {
    let mut m = monitor();
    m.step();
    boot(&mut m);

    let toggled = type_keys(&mut m, b"e");
    assert_eq!(toggled, format!("\n\r[ECHO] Echo OFF\n\r{}", config::PROMPT));
    assert!(!m.echo_enabled());

    assert_eq!(type_keys(&mut m, b"x"), "");

    let toggled = type_keys(&mut m, b"e");
    assert!(toggled.contains("[ECHO] Echo ON"));
    assert_eq!(type_keys(&mut m, b"x"), "x");
}

#[test]
fn test_toggle_help_then_exit() {
    let mut m = monitor();
    m.step();
    boot(&mut m);

    type_keys(&mut m, b"e");

    let help = type_keys(&mut m, b"?");
    assert!(help.starts_with("\n\r[HELP] Commands:\n\r"));
    assert!(help.contains("  ESC - Exit echo test\n\r"));
    assert!(help.contains("  ?   - This help\n\r"));
    assert!(help.contains("  d   - Dump registers\n\r"));
    assert!(help.contains("  r   - Reboot system\n\r"));
    assert!(help.contains("  e   - Toggle echo (OFF)\n\r"));
    assert!(help.ends_with(config::PROMPT));

    let exit = type_keys(&mut m, &[ESC]);
    assert_eq!(
        exit,
        "\n\r[SYSTEM] Exiting echo test\n\r\
         \n\r[SYSTEM] Bootloader completed successfully\n\r\
         [SYSTEM] Entering system halt...\n\r\
         \n\r[SYSTEM] Halting CPU...\n\r"
    );
    assert_eq!(m.stage(), Stage::Halted);
    assert!(m.platform().interrupts_disabled.get());
}

#[test]
fn test_halted_ignores_input() {
    let mut m = monitor();
    m.step();
    boot(&mut m);
    type_keys(&mut m, &[ESC]);
    assert_eq!(m.stage(), Stage::Halted);

    m.serial_mut().feed(b"d?e");
    for _ in 0..10 {
        assert_eq!(m.step(), Stage::Halted);
    }
    assert!(m.serial().wire.is_empty());
    assert_eq!(m.serial().rx.len(), 3);
    assert_eq!(m.platform().captures.get(), 0);
}

#[test]
fn test_register_dump_format() {
    let mut regs = [0u64; GPR_COUNT];
    for (i, r) in regs.iter_mut().enumerate() {
        *r = (i as u64) * 0x1111;
    }
    // Only the low 32 bits are shown
    regs[5] = 0x1234_5678_9ABC_DEF0;

    let platform = FakePlatform {
        registers: RegisterSnapshot::from_array(regs),
        ..Default::default()
    };
    let mut m = monitor_with(platform);
    m.step();
    boot(&mut m);

    let dump = type_keys(&mut m, b"d");
    assert_eq!(m.platform().captures.get(), 1);
    assert_eq!(m.stage(), Stage::Interactive);

    let body = dump
        .strip_prefix("\n\r[DEBUG] Register Dump:\n\r====================\n\r")
        .expect("dump header");
    let body = body.strip_suffix(config::PROMPT).expect("prompt after dump");

    let lines: Vec<&str> = body.split("\n\r").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), GPR_COUNT);
    assert_eq!(lines[0], "x00: 0x00000000");
    assert_eq!(lines[1], "x01: 0x00001111");
    assert_eq!(lines[5], "x05: 0x9ABCDEF0");
    assert_eq!(lines[9], "x09: 0x00009999");
    assert_eq!(lines[10], "x10: 0x0000AAAA");
    assert_eq!(lines[30], "x30: 0x0001FFFE");
}

#[test]
fn test_reboot_waits_then_restarts() {
    let mut m = monitor();
    m.step();
    boot(&mut m);

    let out = type_keys(&mut m, b"r");
    assert_eq!(out, "\n\r[SYSTEM] Rebooting system...\n\r");
    assert_eq!(m.stage(), Stage::Restarting);
    assert_eq!(m.platform().delayed.get(), REBOOT_DELAY_CYCLES);

    m.serial_mut().feed(b"x");
    assert_eq!(m.step(), Stage::Restarting);
    assert!(m.serial().wire.is_empty());
}

#[test]
fn test_uppercase_is_not_a_command() {
    let mut m = monitor();
    m.step();
    boot(&mut m);

    assert_eq!(type_keys(&mut m, b"DER"), "DER");
    assert_eq!(m.stage(), Stage::Interactive);
    assert_eq!(m.platform().captures.get(), 0);
}

#[test]
fn test_boot_from_init_visits_every_stage() {
    let mut m = monitor();
    let mut seen = vec![m.stage()];
    while m.stage() != Stage::Interactive {
        seen.push(m.step());
    }
    assert_eq!(seen, BOOT_ORDER);

    // Starting from Init or from a later boot stage ends in the same place
    let mut fresh = monitor();
    let from_init = boot(&mut fresh);
    let mut stepped = monitor();
    stepped.step();
    let from_banner = boot(&mut stepped);
    assert_eq!(from_init, from_banner);
    assert_eq!(stepped.stage(), Stage::Interactive);
}

#[test]
#[should_panic(expected = "core parked")]
fn test_run_parks_after_exit() {
    let mut m = monitor();
    m.serial_mut().feed(&[ESC]);
    m.run();
}

#[test]
#[should_panic(expected = "restart to 0x8000")]
fn test_run_restarts_at_entry_after_reboot() {
    let mut m = monitor();
    m.serial_mut().feed(b"r");
    m.run();
}
