//! ARM64 (AArch64) architecture implementation

use core::arch::asm;

use aarch64_cpu::asm as cpu_asm;
use aarch64_cpu::registers::{CurrentEL, DAIF};
use tock_registers::interfaces::{Readable, Writeable};

use crate::arch::{ExceptionLevel, Platform, RegisterSnapshot, GPR_COUNT};

/// The boot CPU
pub struct Cpu;

impl Platform for Cpu {
    fn exception_level(&self) -> ExceptionLevel {
        current_exception_level()
    }

    #[inline(always)]
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

    fn restart(&self, entry: usize) -> ! {
        // SAFETY: `entry` is the image entry point, which re-runs the boot
        // stub from scratch (new stack, cleared BSS).
        unsafe { jump_to(entry) }
    }
}

/// Read CurrentEL
pub fn current_exception_level() -> ExceptionLevel {
    ExceptionLevel::from_current_el(CurrentEL.get())
}

/// Store x0..x30 into a snapshot
///
/// All 31 stores are issued from one asm block so nothing the compiler emits
/// can clobber a register between captures. The register holding the buffer
/// address is saved like any other, so its slot shows that address.
#[inline(always)]
pub fn capture_registers() -> RegisterSnapshot {
    let mut regs = [0u64; GPR_COUNT];
    // SAFETY: the block writes exactly 31 * 8 bytes into `regs`.
    unsafe {
        asm!(
            "stp x0, x1, [{buf}, #0]",
            "stp x2, x3, [{buf}, #16]",
            "stp x4, x5, [{buf}, #32]",
            "stp x6, x7, [{buf}, #48]",
            "stp x8, x9, [{buf}, #64]",
            "stp x10, x11, [{buf}, #80]",
            "stp x12, x13, [{buf}, #96]",
            "stp x14, x15, [{buf}, #112]",
            "stp x16, x17, [{buf}, #128]",
            "stp x18, x19, [{buf}, #144]",
            "stp x20, x21, [{buf}, #160]",
            "stp x22, x23, [{buf}, #176]",
            "stp x24, x25, [{buf}, #192]",
            "stp x26, x27, [{buf}, #208]",
            "stp x28, x29, [{buf}, #224]",
            "str x30, [{buf}, #240]",
            buf = in(reg) regs.as_mut_ptr(),
            options(nostack, preserves_flags),
        );
    }
    RegisterSnapshot::from_array(regs)
}

/// Busy-wait for `cycles` iterations
#[inline(never)]
pub fn spin_delay(cycles: u64) {
    for _ in 0..cycles {
        cpu_asm::nop();
    }
}

/// Mask all of D, A, I and F
pub fn disable_interrupts() {
    DAIF.write(DAIF::D::Masked + DAIF::A::Masked + DAIF::I::Masked + DAIF::F::Masked);
}

/// Wait for interrupt
#[inline]
pub fn wait_for_interrupt() {
    cpu_asm::wfi();
}

/// Park the core forever
pub fn halt() -> ! {
    loop {
        wait_for_interrupt();
    }
}

/// Branch to `entry` without linking
///
/// # Safety
/// `entry` must be the address of code that never expects to return here.
pub unsafe fn jump_to(entry: usize) -> ! {
    // SAFETY: upheld by caller
    unsafe {
        asm!("br {entry}", entry = in(reg) entry, options(noreturn, nostack));
    }
}
