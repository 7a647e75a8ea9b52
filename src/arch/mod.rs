//! Architecture-specific code for cboot
//!
//! The monitor only ever runs on bare-metal AArch64. Every other target (the
//! host running `cargo test`, or an AArch64 machine with an OS underneath)
//! gets the `host` stand-ins, which keep the crate buildable and never touch
//! privileged state.

#[cfg(all(target_arch = "aarch64", target_os = "none"))]
pub mod aarch64;

#[cfg(all(target_arch = "aarch64", target_os = "none"))]
pub use aarch64::*;

#[cfg(not(all(target_arch = "aarch64", target_os = "none")))]
pub mod host;

#[cfg(not(all(target_arch = "aarch64", target_os = "none")))]
pub use host::*;

use core::fmt;

/// Number of general-purpose registers captured by a dump (x0..x30)
pub const GPR_COUNT: usize = 31;

/// Capabilities the boot sequencer needs from the processor
///
/// Implemented by [`Cpu`] for the real machine and by test doubles.
pub trait Platform {
    /// Current exception level
    fn exception_level(&self) -> ExceptionLevel;

    /// Snapshot x0..x30 at the call site
    fn capture_registers(&self) -> RegisterSnapshot;

    /// Burn roughly `cycles` iterations
    fn delay(&self, cycles: u64);

    /// Mask D, A, I and F at the core
    fn disable_interrupts(&self);

    /// Park the core in a low-power wait, forever
    fn park(&self) -> !;

    /// Transfer control to `entry`; this is a soft restart, not a reset
    fn restart(&self, entry: usize) -> !;
}

/// AArch64 exception level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ExceptionLevel {
    El0 = 0,
    El1 = 1,
    El2 = 2,
    El3 = 3,
}

impl ExceptionLevel {
    /// Decode a raw CurrentEL value; the level lives in bits [3:2]
    pub const fn from_current_el(raw: u64) -> Self {
        match (raw >> 2) & 0x3 {
            0 => ExceptionLevel::El0,
            1 => ExceptionLevel::El1,
            2 => ExceptionLevel::El2,
            _ => ExceptionLevel::El3,
        }
    }

    /// Numeric level (0..=3)
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Returned when a number is not a valid exception level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidExceptionLevel(pub u8);

impl TryFrom<u8> for ExceptionLevel {
    type Error = InvalidExceptionLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ExceptionLevel::El0),
            1 => Ok(ExceptionLevel::El1),
            2 => Ok(ExceptionLevel::El2),
            3 => Ok(ExceptionLevel::El3),
            other => Err(InvalidExceptionLevel(other)),
        }
    }
}

impl fmt::Display for ExceptionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EL{}", self.as_u8())
    }
}

/// Values of x0..x30 at one instant
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSnapshot {
    regs: [u64; GPR_COUNT],
}

impl RegisterSnapshot {
    /// Build a snapshot from already-captured values
    pub const fn from_array(regs: [u64; GPR_COUNT]) -> Self {
        Self { regs }
    }

    /// Value of `xN`, or `None` past x30
    pub fn get(&self, index: usize) -> Option<u64> {
        self.regs.get(index).copied()
    }

    /// Registers in order, x0 first
    pub fn iter(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.regs.iter().copied().enumerate()
    }
}
