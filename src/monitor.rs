//! Boot sequencer and interactive command loop
//!
//! The monitor walks a fixed sequence of stages:
//!
//! ```text
//! Init -> Banner -> Diagnostics -> SelfTest -> Interactive -> Halted
//!                                                  |  ^
//!                                                  +--+  (no byte / command)
//!                                                  |
//!                                                  +----> Restarting
//! ```
//!
//! [`Monitor::step`] performs the work of exactly one stage (or, in
//! `Interactive`, one poll of the UART) and returns the stage that follows.
//! [`Monitor::run`] drives it on hardware and never returns: `Halted` parks
//! the core, `Restarting` jumps back to the image entry point.

use crate::arch::{ExceptionLevel, Platform};
use crate::config;
use crate::drivers::Serial;
use crate::format::{write_decimal, write_hex};
use crate::layout::MemoryLayout;
use crate::mem;

/// ASCII escape
pub const ESC: u8 = 0x1B;

/// String the self-test copies around, NUL-terminated
const SELF_TEST_STRING: &[u8] = b"Hello, Raspberry Pi 3!\0";

/// Sample values printed by the self-test
const SELF_TEST_HEX: u64 = 0xDEAD_BEEF;
const SELF_TEST_DECIMAL: u64 = 123_456_789;

/// Where the monitor is in its boot sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Banner,
    Diagnostics,
    SelfTest,
    Interactive,
    /// Terminal: interrupts off, core parked
    Halted,
    /// Terminal: about to jump to the image entry point
    Restarting,
}

impl Stage {
    /// No further input is processed in this stage
    pub const fn is_terminal(self) -> bool {
        matches!(self, Stage::Halted | Stage::Restarting)
    }
}

/// Single-byte operator commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Exit,
    Help,
    DumpRegisters,
    ToggleEcho,
    Reboot,
    /// Anything else; echoed when echo is on
    Other(u8),
}

impl Command {
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            ESC => Command::Exit,
            b'?' => Command::Help,
            b'd' => Command::DumpRegisters,
            b'e' => Command::ToggleEcho,
            b'r' => Command::Reboot,
            other => Command::Other(other),
        }
    }
}

/// Facts gathered once in the Diagnostics stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootDiagnostics {
    pub exception_level: ExceptionLevel,
    pub layout: MemoryLayout,
}

/// The boot monitor
pub struct Monitor<S: Serial, P: Platform> {
    serial: S,
    platform: P,
    layout: MemoryLayout,
    stage: Stage,
    echo: bool,
    diagnostics: Option<BootDiagnostics>,
}

impl<S: Serial, P: Platform> Monitor<S, P> {
    /// Create a monitor in the `Init` stage with echo on
    pub fn new(serial: S, platform: P, layout: MemoryLayout) -> Self {
        Self {
            serial,
            platform,
            layout,
            stage: Stage::Init,
            echo: true,
            diagnostics: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn echo_enabled(&self) -> bool {
        self.echo
    }

    /// Diagnostics, once the Diagnostics stage has run
    pub fn diagnostics(&self) -> Option<&BootDiagnostics> {
        self.diagnostics.as_ref()
    }

    pub fn serial(&self) -> &S {
        &self.serial
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Run the current stage and advance
    pub fn step(&mut self) -> Stage {
        let next = match self.stage {
            Stage::Init => {
                self.serial.initialize();
                log::debug!("serial initialized");
                Stage::Banner
            }
            Stage::Banner => {
                self.print_banner();
                Stage::Diagnostics
            }
            Stage::Diagnostics => {
                self.report_diagnostics();
                Stage::SelfTest
            }
            Stage::SelfTest => {
                self.self_test();
                self.serial
                    .send_str("\n[ECHO] Type characters (ESC to exit, ? for help):\n");
                self.serial.send_str(config::PROMPT);
                Stage::Interactive
            }
            Stage::Interactive => self.poll(),
            terminal @ (Stage::Halted | Stage::Restarting) => terminal,
        };

        if next != self.stage {
            log::trace!("stage {:?} -> {:?}", self.stage, next);
            self.stage = next;
        }
        next
    }

    /// Drive the sequence forever
    pub fn run(mut self) -> ! {
        loop {
            match self.step() {
                Stage::Halted => self.platform.park(),
                Stage::Restarting => {
                    log::debug!("restarting at {:#x}", config::RESTART_ADDRESS);
                    self.platform.restart(config::RESTART_ADDRESS)
                }
                _ => {}
            }
        }
    }

    fn print_banner(&mut self) {
        let s = &mut self.serial;
        s.send_str("\n");
        s.send_str("========================================\n");
        s.send_str(config::PRODUCT_NAME);
        s.send_str("\n");
        s.send_str("Author: ");
        s.send_str(config::AUTHOR);
        s.send_str("\n");
        s.send_str("Build: ");
        s.send_str(config::BUILD_TIMESTAMP);
        s.send_str("\n");
        s.send_str("========================================\n\n");
    }

    fn report_diagnostics(&mut self) {
        let diag = BootDiagnostics {
            exception_level: self.platform.exception_level(),
            layout: self.layout,
        };

        let s = &mut self.serial;
        s.send_str("[SYSTEM] Initializing...\n");

        s.send_str("[SYSTEM] Exception Level: EL");
        s.send_byte(b'0' + diag.exception_level.as_u8());
        s.send_str("\n");

        s.send_str("[MEMORY] BSS Section: start=0x");
        write_hex(s, diag.layout.bss_start as u64, 8);
        s.send_str(", end=0x");
        write_hex(s, diag.layout.bss_end as u64, 8);
        s.send_str(", size=");
        write_decimal(s, diag.layout.bss_size as u64);
        s.send_str(" bytes\n");

        s.send_str("[MEMORY] Stack: top=0x");
        write_hex(s, diag.layout.stack_top as u64, 8);
        s.send_str(", bottom=0x");
        write_hex(s, diag.layout.stack_bottom as u64, 8);
        s.send_str("\n");

        self.diagnostics = Some(diag);
    }

    /// Exercise fill/copy/strlen on a stack buffer
    ///
    /// Nothing is verified; every step reports OK unconditionally.
    fn self_test(&mut self) {
        let s = &mut self.serial;
        s.send_str("\n[TEST] Testing memory functions...\n");

        let mut buffer = [0u8; 32];

        mem::fill(&mut buffer, 0);
        s.send_str("[TEST] memset: OK\n");

        let len = mem::c_strlen(SELF_TEST_STRING);
        mem::copy(&mut buffer, &SELF_TEST_STRING[..len + 1]);
        s.send_str("[TEST] memcpy: OK\n");

        s.send_str("[TEST] String length: ");
        write_decimal(s, len as u64);
        s.send_str("\n");

        s.send_str("[TEST] String test: ");
        s.send_cstr(&buffer);
        s.send_str("\n");

        s.send_str("[TEST] Hex test: 0x");
        write_hex(s, SELF_TEST_HEX, 8);
        s.send_str("\n");

        s.send_str("[TEST] Decimal test: ");
        write_decimal(s, SELF_TEST_DECIMAL);
        s.send_str("\n");
    }

    /// One iteration of the interactive loop
    fn poll(&mut self) -> Stage {
        if !self.serial.byte_available() {
            return Stage::Interactive;
        }
        let byte = self.serial.receive_byte();
        self.dispatch(Command::from_byte(byte))
    }

    fn dispatch(&mut self, command: Command) -> Stage {
        if !matches!(command, Command::Other(_)) {
            log::debug!("command {:?}", command);
        }

        match command {
            Command::Exit => {
                self.serial.send_str("\n[SYSTEM] Exiting echo test\n");
                self.enter_halt();
                Stage::Halted
            }
            Command::Help => {
                self.print_help();
                self.serial.send_str(config::PROMPT);
                Stage::Interactive
            }
            Command::DumpRegisters => {
                self.dump_registers();
                self.serial.send_str(config::PROMPT);
                Stage::Interactive
            }
            Command::ToggleEcho => {
                self.echo = !self.echo;
                self.serial.send_str("\n[ECHO] Echo ");
                self.serial.send_str(on_off(self.echo));
                self.serial.send_str("\n");
                self.serial.send_str(config::PROMPT);
                Stage::Interactive
            }
            Command::Reboot => {
                self.serial.send_str("\n[SYSTEM] Rebooting system...\n");
                self.platform.delay(config::REBOOT_DELAY_CYCLES);
                Stage::Restarting
            }
            Command::Other(byte) => {
                if self.echo {
                    self.serial.send_byte(byte);
                }
                Stage::Interactive
            }
        }
    }

    fn print_help(&mut self) {
        let s = &mut self.serial;
        s.send_str("\n[HELP] Commands:\n");
        s.send_str("  ESC - Exit echo test\n");
        s.send_str("  ?   - This help\n");
        s.send_str("  d   - Dump registers\n");
        s.send_str("  r   - Reboot system\n");
        s.send_str("  e   - Toggle echo (");
        s.send_str(on_off(self.echo));
        s.send_str(")\n");
    }

    /// Print x0..x30, one per line
    ///
    /// Labels are zero-padded decimal (`x00`..`x30`), not the `x0`..`x9`,
    /// `xA`..`xU` letter scheme older monitors used. Only the low 32 bits of
    /// each register are shown.
    fn dump_registers(&mut self) {
        let snapshot = self.platform.capture_registers();

        let s = &mut self.serial;
        s.send_str("\n[DEBUG] Register Dump:\n");
        s.send_str("====================\n");

        for (index, value) in snapshot.iter() {
            s.send_byte(b'x');
            if index < 10 {
                s.send_byte(b'0');
            }
            write_decimal(s, index as u64);
            s.send_str(": 0x");
            write_hex(s, value, 8);
            s.send_str("\n");
        }
    }

    /// Entry actions of the Halted stage
    fn enter_halt(&mut self) {
        self.serial
            .send_str("\n[SYSTEM] Bootloader completed successfully\n");
        self.serial.send_str("[SYSTEM] Entering system halt...\n");
        self.platform.disable_interrupts();
        self.serial.send_str("\n[SYSTEM] Halting CPU...\n");
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "ON"
    } else {
        "OFF"
    }
}
