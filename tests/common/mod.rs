//! Scripted doubles for driving the monitor on the host

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;

use cboot::arch::GPR_COUNT;
use cboot::{ExceptionLevel, MemoryLayout, Monitor, Platform, RegisterSnapshot, Serial, Stage};

/// UART double: bytes queued in `rx` arrive one per read, everything written
/// lands in `wire`
#[derive(Default)]
pub struct FakeSerial {
    pub rx: VecDeque<u8>,
    pub wire: Vec<u8>,
    pub init_calls: u32,
    /// Bytes already on the wire when `initialize` ran
    pub written_before_init: Option<usize>,
}

impl FakeSerial {
    pub fn feed(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Drain and return everything written so far
    pub fn take_output(&mut self) -> String {
        String::from_utf8(std::mem::take(&mut self.wire)).expect("console output is ASCII")
    }
}

impl Serial for FakeSerial {
    fn initialize(&mut self) {
        self.init_calls += 1;
        self.written_before_init.get_or_insert(self.wire.len());
    }

    fn tx_fifo_full(&self) -> bool {
        false
    }

    fn rx_fifo_empty(&self) -> bool {
        self.rx.is_empty()
    }

    fn write_data(&mut self, byte: u8) {
        self.wire.push(byte);
    }

    fn read_data(&mut self) -> u32 {
        self.rx.pop_front().map_or(0, u32::from)
    }
}

/// Processor double with fabricated state
pub struct FakePlatform {
    pub level: ExceptionLevel,
    pub registers: RegisterSnapshot,
    pub delayed: Cell<u64>,
    pub interrupts_disabled: Cell<bool>,
    pub captures: Cell<u32>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            level: ExceptionLevel::El2,
            registers: RegisterSnapshot::from_array([0; GPR_COUNT]),
            delayed: Cell::new(0),
            interrupts_disabled: Cell::new(false),
            captures: Cell::new(0),
        }
    }
}

impl Platform for FakePlatform {
    fn exception_level(&self) -> ExceptionLevel {
        self.level
    }

    fn capture_registers(&self) -> RegisterSnapshot {
        self.captures.set(self.captures.get() + 1);
        self.registers
    }

    fn delay(&self, cycles: u64) {
        self.delayed.set(self.delayed.get() + cycles);
    }

    fn disable_interrupts(&self) {
        self.interrupts_disabled.set(true);
    }

    fn park(&self) -> ! {
        panic!("core parked");
    }

    fn restart(&self, entry: usize) -> ! {
        panic!("restart to {:#x}", entry);
    }
}

pub fn sample_layout() -> MemoryLayout {
    MemoryLayout {
        bss_start: 0x0009_0000,
        bss_end: 0x0009_0100,
        bss_size: 0x100,
        stack_top: 0x000A_0000,
        stack_bottom: 0x0009_1000,
    }
}

pub type TestMonitor = Monitor<FakeSerial, FakePlatform>;

pub fn monitor() -> TestMonitor {
    Monitor::new(FakeSerial::default(), FakePlatform::default(), sample_layout())
}

pub fn monitor_with(platform: FakePlatform) -> TestMonitor {
    Monitor::new(FakeSerial::default(), platform, sample_layout())
}

/// Boot stages in the order the monitor must visit them
pub const BOOT_ORDER: [Stage; 5] = [
    Stage::Init,
    Stage::Banner,
    Stage::Diagnostics,
    Stage::SelfTest,
    Stage::Interactive,
];

/// Step from the current boot stage up to `Interactive`, checking every
/// transition, and return what was written on the way
pub fn boot(monitor: &mut TestMonitor) -> String {
    let mut at = BOOT_ORDER
        .iter()
        .position(|&s| s == monitor.stage())
        .expect("monitor is still booting");
    while monitor.stage() != Stage::Interactive {
        at += 1;
        assert_eq!(monitor.step(), BOOT_ORDER[at]);
    }
    monitor.serial_mut().take_output()
}

/// Feed `input` and step until it has all been consumed
pub fn type_keys(monitor: &mut TestMonitor, input: &[u8]) -> String {
    monitor.serial_mut().feed(input);
    while monitor.serial().byte_available() && !monitor.stage().is_terminal() {
        monitor.step();
    }
    monitor.serial_mut().take_output()
}
