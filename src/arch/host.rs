//! Host stand-ins for the AArch64 primitives
//!
//! Used for `cargo test` and any non-bare-metal build. Nothing here touches
//! system registers; `Cpu` reports EL1 and an all-zero register file.

use crate::arch::{ExceptionLevel, Platform, RegisterSnapshot, GPR_COUNT};

/// Stand-in CPU for hosted builds
pub struct Cpu;

impl Platform for Cpu {
    fn exception_level(&self) -> ExceptionLevel {
        current_exception_level()
    }

    fn capture_registers(&self) -> RegisterSnapshot {
        capture_registers()
    }

    fn delay(&self, cycles: u64) {
        spin_delay(cycles);
    }

    fn disable_interrupts(&self) {
        disable_interrupts();
    }

    fn park(&self) -> ! {
        halt()
    }

    fn restart(&self, _entry: usize) -> ! {
        // No soft reset on a hosted target
        halt()
    }
}

pub fn current_exception_level() -> ExceptionLevel {
    ExceptionLevel::El1
}

pub fn capture_registers() -> RegisterSnapshot {
    RegisterSnapshot::from_array([0; GPR_COUNT])
}

pub fn spin_delay(cycles: u64) {
    for _ in 0..cycles {
        core::hint::spin_loop();
    }
}

pub fn disable_interrupts() {}

pub fn wait_for_interrupt() {
    core::hint::spin_loop();
}

pub fn halt() -> ! {
    loop {
        wait_for_interrupt();
    }
}
